//! Audio Mixer Collaborators
//!
//! The protocol controller needs three things from the host's audio mixer:
//! the list of apps currently producing sound with their volumes, a way to
//! set an app's volume, and a way to read it back. This module defines that
//! seam and ships two backends:
//!
//! - [`InMemoryMixer`]: a static, in-process mixer (device bring-up, tests)
//! - [`PactlMixer`]: PulseAudio / PipeWire sink inputs through `pactl`

pub mod memory;
pub mod pactl;
pub mod traits;

pub use memory::InMemoryMixer;
pub use pactl::PactlMixer;
pub use traits::{AudioMixer, MixerError};
