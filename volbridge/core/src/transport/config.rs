//! Transport Configuration
//!
//! Configuration types for selecting the device endpoint and tuning how
//! payloads are paced onto it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::chunked::{ChunkedSender, DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE};

/// Where the device is reached
///
/// String forms accepted by [`Endpoint::from_str`]:
/// - `tcp://host:port` for serial-over-network bridges
/// - `unix:///path/to.sock` for local relays
/// - anything else is a device node path (e.g. `/dev/ttyACM0`), which must
///   already be configured (baud rate, raw mode) by the OS
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// Character device or FIFO opened read/write
    Device {
        /// Path to the device node
        path: PathBuf,
    },

    /// TCP connection
    Tcp {
        /// `host:port`
        addr: String,
    },

    /// Unix domain socket
    #[cfg(unix)]
    UnixSocket {
        /// Socket path
        path: PathBuf,
    },
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::Device {
            path: PathBuf::from(default_device_path()),
        }
    }
}

/// Platform default device node
#[must_use]
pub fn default_device_path() -> &'static str {
    if cfg!(windows) {
        r"\\.\COM3"
    } else {
        "/dev/ttyACM0"
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("endpoint is empty".to_string());
        }

        if let Some(addr) = s.strip_prefix("tcp://") {
            if !addr.contains(':') {
                return Err(format!("tcp endpoint needs host:port, got {addr:?}"));
            }
            return Ok(Self::Tcp {
                addr: addr.to_string(),
            });
        }

        if let Some(path) = s.strip_prefix("unix://") {
            #[cfg(unix)]
            return Ok(Self::UnixSocket {
                path: PathBuf::from(path),
            });
            #[cfg(not(unix))]
            return Err(format!("unix sockets are not supported here: {path}"));
        }

        Ok(Self::Device {
            path: PathBuf::from(s),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device { path } => write!(f, "{}", path.display()),
            Self::Tcp { addr } => write!(f, "tcp://{addr}"),
            #[cfg(unix)]
            Self::UnixSocket { path } => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Transport configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Device endpoint
    pub endpoint: Endpoint,

    /// Connection timeout in milliseconds
    ///
    /// How long to wait when opening the endpoint.
    pub connect_timeout_ms: u64,

    /// Delay between reconnection attempts in milliseconds
    ///
    /// Retries are unbounded.
    pub reconnect_delay_ms: u64,

    /// Maximum bytes per write for raw payloads
    ///
    /// Must fit the device's receive buffer.
    pub chunk_size: usize,

    /// Pause between payload chunks in milliseconds
    pub chunk_delay_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            connect_timeout_ms: 5000,
            reconnect_delay_ms: 2000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay_ms: DEFAULT_CHUNK_DELAY.as_millis() as u64,
        }
    }
}

impl TransportConfig {
    /// Configuration for a specific endpoint with default tuning
    #[must_use]
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Default::default()
        }
    }

    /// Chunked sender built from this configuration
    #[must_use]
    pub fn chunked_sender(&self) -> ChunkedSender {
        ChunkedSender::new(self.chunk_size, Duration::from_millis(self.chunk_delay_ms))
    }

    /// Connection timeout
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Delay before reconnecting
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
