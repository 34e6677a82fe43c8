//! Wire Messages
//!
//! The protocol is line-based ASCII with one exception: the icon payload is
//! 2048 raw bytes with no terminator.
//!
//! | Direction | Frame | Meaning |
//! |---|---|---|
//! | device -> host | `READY` | device ready for handshake |
//! | host -> device | `OK` | handshake acknowledged |
//! | host -> device | `Initialising apps` | begin full sync |
//! | device -> host | `READY_TO_RECEIVE` | ready for app frames |
//! | host -> device | `Start_app` name volume icon `End_app` | one app (full sync) |
//! | host -> device | `New_app` name volume icon `End_app` | app appeared |
//! | host -> device | `Remove_app` name | app disappeared |
//! | host -> device | `Done` | full sync complete |
//! | device -> host | `name,percent` | volume request |
//! | host -> device | `name,percent` | confirmed volume |

use std::fmt;

use thiserror::Error;

use crate::apps::{AppKey, MAX_VOLUME_PERCENT};

/// Device is ready for the handshake
pub const READY: &str = "READY";
/// Handshake acknowledgment
pub const OK: &str = "OK";
/// Start of a full sync
pub const INITIALISING_APPS: &str = "Initialising apps";
/// Device is ready to receive app frames
pub const READY_TO_RECEIVE: &str = "READY_TO_RECEIVE";
/// Header of an app sequence during full sync
pub const START_APP: &str = "Start_app";
/// Header of an app sequence for an app that appeared
pub const NEW_APP: &str = "New_app";
/// Trailer of an app sequence
pub const END_APP: &str = "End_app";
/// Header of an app removal
pub const REMOVE_APP: &str = "Remove_app";
/// End of a full sync
pub const DONE: &str = "Done";

/// Separator between app name and value in volume commands
pub const COMMAND_SEPARATOR: char = ',';

/// Which header opens an app sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppSequenceKind {
    /// Part of a full sync
    Start,
    /// Incremental notification
    New,
}

impl AppSequenceKind {
    /// Header line
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::Start => START_APP,
            Self::New => NEW_APP,
        }
    }
}

/// Reasons a volume command is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Not exactly two comma-separated fields
    #[error("expected 'name,percent', got {0} fields")]
    FieldCount(usize),

    /// App name is empty
    #[error("app name is empty")]
    EmptyName,

    /// Value is empty
    #[error("volume is empty")]
    EmptyValue,

    /// Value is not an integer
    #[error("volume {0:?} is not an integer")]
    NotANumber(String),

    /// Value is outside `0..=100`
    #[error("volume {0} is outside 0..=100")]
    OutOfRange(i64),
}

/// A volume change requested by the device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeCommand {
    /// App name exactly as the device sent it
    pub app: String,
    /// Requested volume
    pub volume_percent: u8,
}

impl VolumeCommand {
    /// Parse `name,percent`
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing why the line is not a valid
    /// command.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let fields: Vec<&str> = line.split(COMMAND_SEPARATOR).collect();
        let [name, value] = fields.as_slice() else {
            return Err(CommandError::FieldCount(fields.len()));
        };

        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return Err(CommandError::EmptyName);
        }
        if value.is_empty() {
            return Err(CommandError::EmptyValue);
        }

        let parsed: i64 = value
            .parse()
            .map_err(|_| CommandError::NotANumber(value.to_string()))?;
        let volume_percent = u8::try_from(parsed)
            .ok()
            .filter(|v| *v <= MAX_VOLUME_PERCENT)
            .ok_or(CommandError::OutOfRange(parsed))?;

        Ok(Self {
            app: name.to_string(),
            volume_percent,
        })
    }

    /// Normalized key of the target app
    #[must_use]
    pub fn key(&self) -> AppKey {
        AppKey::new(&self.app)
    }
}

/// Line the host sends back after applying a command
#[must_use]
pub fn volume_echo(app: &str, confirmed_percent: u8) -> String {
    format!("{app}{COMMAND_SEPARATOR}{confirmed_percent}")
}

/// Classified inbound line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceMessage {
    /// `READY`
    Ready,
    /// `READY_TO_RECEIVE`
    ReadyToReceive,
    /// A well-formed volume command
    Volume(VolumeCommand),
    /// Looked like a command (contains a comma) but was rejected
    Malformed {
        /// The offending line
        line: String,
        /// Why it was rejected
        error: CommandError,
    },
    /// Anything else: device debug output
    Diagnostic(String),
}

impl DeviceMessage {
    /// Classify one line received from the device
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            READY => Self::Ready,
            READY_TO_RECEIVE => Self::ReadyToReceive,
            _ if trimmed.contains(COMMAND_SEPARATOR) => match VolumeCommand::parse(trimmed) {
                Ok(command) => Self::Volume(command),
                Err(error) => Self::Malformed {
                    line: trimmed.to_string(),
                    error,
                },
            },
            _ => Self::Diagnostic(trimmed.to_string()),
        }
    }
}

impl fmt::Display for DeviceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str(READY),
            Self::ReadyToReceive => f.write_str(READY_TO_RECEIVE),
            Self::Volume(cmd) => write!(f, "{}", volume_echo(&cmd.app, cmd.volume_percent)),
            Self::Malformed { line, .. } | Self::Diagnostic(line) => f.write_str(line),
        }
    }
}
