//! Device Protocol
//!
//! Line framing, command parsing and the per-connection state machine.

pub mod controller;
pub mod messages;

pub use controller::{ConnectionState, ProtocolConfig, ProtocolController, SessionEnd};
pub use messages::{AppSequenceKind, CommandError, DeviceMessage, VolumeCommand};
