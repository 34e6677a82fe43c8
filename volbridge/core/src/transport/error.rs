//! Transport Errors
//!
//! Every variant is fatal to the current connection. The controller never
//! retries on its own; the supervisor reconnects.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur on the host-device link
#[derive(Debug, Error)]
pub enum TransportError {
    /// Opening the endpoint failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The device closed the stream (EOF)
    #[error("Connection closed")]
    ConnectionClosed,

    /// The device did not complete the handshake in time
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// IO error from the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
