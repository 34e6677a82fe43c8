//! Transport Layer for Host-Device Communication
//!
//! Provides the byte-stream side of the protocol:
//! - `DeviceLink`: an owned duplex stream with line reads, raw writes and
//!   chunked payload delivery
//! - `ChunkedSender`: bounded, paced payload writes for small receive buffers
//! - `Connector`: opens a fresh link (device node, TCP, Unix socket)
//!
//! # Design Philosophy
//!
//! The protocol controller never deals with how the stream was obtained.
//! Physical setup (baud rate, line discipline) happens before the stream is
//! handed over; everything here assumes a reliable, ordered byte stream.

pub mod chunked;
pub mod config;
pub mod error;
pub mod factory;
pub mod link;

// Re-exports for convenience
pub use chunked::ChunkedSender;
pub use config::{Endpoint, TransportConfig};
pub use error::TransportError;
pub use factory::{Connector, EndpointConnector};
pub use link::DeviceLink;
