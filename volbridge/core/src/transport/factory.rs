//! Transport Factory
//!
//! Opens a [`DeviceLink`] for the configured endpoint. The supervisor calls
//! the connector again after every connection failure.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::net::TcpStream;

use super::{
    config::{Endpoint, TransportConfig},
    DeviceLink, TransportError,
};

/// Something that can produce a fresh device link
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new link to the device
    async fn connect(&self) -> Result<DeviceLink, TransportError>;

    /// Human-readable description of the target, for logs
    fn describe(&self) -> String;
}

/// Connector driven by [`TransportConfig`]
#[derive(Clone, Debug)]
pub struct EndpointConnector {
    config: TransportConfig,
}

impl EndpointConnector {
    /// Create a connector for the given configuration
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn open(&self) -> Result<DeviceLink, TransportError> {
        let sender = self.config.chunked_sender();
        let peer = self.config.endpoint.to_string();

        let link = match &self.config.endpoint {
            Endpoint::Device { path } => {
                let (reader, writer) = open_device(path).await.map_err(|e| {
                    TransportError::ConnectionFailed(format!(
                        "Failed to open {}: {e}",
                        path.display()
                    ))
                })?;
                DeviceLink::new(reader, writer, sender)
            }

            Endpoint::Tcp { addr } => {
                let stream = TcpStream::connect(addr.as_str()).await.map_err(|e| {
                    TransportError::ConnectionFailed(format!("Failed to connect to {addr}: {e}"))
                })?;
                // Control lines are tiny; don't let Nagle hold them back
                stream.set_nodelay(true)?;
                DeviceLink::from_stream(stream, sender)
            }

            #[cfg(unix)]
            Endpoint::UnixSocket { path } => {
                let stream = tokio::net::UnixStream::connect(path).await.map_err(|e| {
                    TransportError::ConnectionFailed(format!(
                        "Failed to connect to {}: {e}",
                        path.display()
                    ))
                })?;
                DeviceLink::from_stream(stream, sender)
            }
        };

        Ok(link.with_peer(peer))
    }
}

/// Open a device node as separate read and write handles
///
/// A `tokio::fs::File` runs one blocking operation at a time and seeks back
/// over buffered reads before writing, which ttys and FIFOs reject. A read
/// abandoned by `read_line` must never sit in front of a write. The read
/// handle is opened read-write so opening a FIFO does not wait for a peer.
async fn open_device(path: &Path) -> std::io::Result<(File, File)> {
    let reader = OpenOptions::new().read(true).write(true).open(path).await?;
    let writer = OpenOptions::new().write(true).open(path).await?;
    Ok((reader, writer))
}

#[async_trait]
impl Connector for EndpointConnector {
    async fn connect(&self) -> Result<DeviceLink, TransportError> {
        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, self.open()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::ConnectionFailed(format!(
                "Timed out after {timeout:?} connecting to {}",
                self.config.endpoint
            ))),
        }
    }

    fn describe(&self) -> String {
        self.config.endpoint.to_string()
    }
}
