//! Device Link
//!
//! Owned duplex byte stream to one device. Control frames are `\n`-terminated
//! ASCII lines; icon payloads are raw bytes pushed through the
//! [`ChunkedSender`].
//!
//! `read_line` is cancel-safe: partially received lines are kept inside the
//! link, so it can be raced against timers and shutdown in `tokio::select!`
//! without losing bytes.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::{ChunkedSender, TransportError};

/// Inbound lines must be shorter than this; longer ones are dropped whole
pub const MAX_LINE_LENGTH: usize = 4096;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Exclusive handle to a device connection
pub struct DeviceLink {
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
    /// Bytes of the line currently being received
    pending: Vec<u8>,
    /// Inside an overlong line, skipping to its terminator
    discarding: bool,
    sender: ChunkedSender,
    peer: String,
}

impl std::fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("peer", &self.peer)
            .field("pending", &self.pending.len())
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl DeviceLink {
    /// Wrap separate read and write halves
    pub fn new<R, W>(reader: R, writer: W, sender: ChunkedSender) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: BufReader::new(Box::new(reader)),
            writer: Box::new(writer),
            pending: Vec::new(),
            discarding: false,
            sender,
            peer: "device".to_string(),
        }
    }

    /// Wrap a single duplex stream
    pub fn from_stream<S>(stream: S, sender: ChunkedSender) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(reader, writer, sender)
    }

    /// Label used in logs
    #[must_use]
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// Label used in logs
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Chunking parameters used for payloads
    #[must_use]
    pub fn sender(&self) -> &ChunkedSender {
        &self.sender
    }

    /// Read the next line, without the terminator
    ///
    /// Accepts `\n` and `\r\n`. Invalid UTF-8 is replaced rather than
    /// rejected since serial lines pick up noise on connect. A line reaching
    /// [`MAX_LINE_LENGTH`] is skipped up to its terminator and never returned,
    /// not even in part.
    ///
    /// # Errors
    ///
    /// `TransportError::ConnectionClosed` on EOF, `TransportError::Io` on
    /// read failure.
    pub async fn read_line(&mut self) -> Result<String, TransportError> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Err(TransportError::ConnectionClosed);
            }

            if self.discarding {
                let consumed = match available.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        self.discarding = false;
                        pos + 1
                    }
                    None => available.len(),
                };
                self.reader.consume(consumed);
                continue;
            }

            let room = MAX_LINE_LENGTH - self.pending.len();
            let window = &available[..available.len().min(room)];
            let (consumed, complete) = match window.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.pending.extend_from_slice(&window[..pos]);
                    (pos + 1, true)
                }
                None => {
                    self.pending.extend_from_slice(window);
                    (window.len(), false)
                }
            };
            self.reader.consume(consumed);

            if complete {
                let line = String::from_utf8_lossy(&self.pending)
                    .trim_end_matches('\r')
                    .to_string();
                self.pending.clear();
                return Ok(line);
            }

            if self.pending.len() >= MAX_LINE_LENGTH {
                tracing::warn!(
                    peer = %self.peer,
                    limit = MAX_LINE_LENGTH,
                    "Dropping overlong line from device"
                );
                self.pending.clear();
                self.discarding = true;
            }
        }
    }

    /// Write one control line followed by `\n` (not flushed)
    pub async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        self.writer.write_all(&frame).await?;
        Ok(())
    }

    /// Write several control lines and flush
    pub async fn send_lines(&mut self, lines: &[&str]) -> Result<(), TransportError> {
        for line in lines {
            self.write_line(line).await?;
        }
        self.flush().await
    }

    /// Deliver a raw payload in bounded, flushed chunks
    pub async fn write_payload(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        // Anything buffered must reach the device before the payload
        self.writer.flush().await?;
        let sender = self.sender;
        sender.send(&mut self.writer, payload).await
    }

    /// Flush buffered writes
    pub async fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the write side; the link is unusable afterwards
    pub async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            tracing::debug!(peer = %self.peer, error = %e, "Error while closing link");
        }
    }
}
