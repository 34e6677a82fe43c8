//! Chunked Payload Delivery
//!
//! The device has a small UART receive buffer and no per-chunk
//! acknowledgment, so large payloads (icon bitmaps) are written in bounded
//! slices with a short settle delay between them.
//!
//! ```text
//! payload: [ chunk 0 ][ chunk 1 ][ chunk 2 ][ tail ]
//!              write      write      write    write
//!              flush      flush      flush    flush
//!                   settle     settle    settle
//! ```
//!
//! There is no retry: a failed write is a transport failure.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::TransportError;

/// Default maximum bytes per write
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Largest accepted chunk size
pub const MAX_CHUNK_SIZE: usize = 4096;

/// Default pause between chunks
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(10);

/// Splits payloads into bounded chunks and paces the writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkedSender {
    chunk_size: usize,
    settle_delay: Duration,
}

impl Default for ChunkedSender {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_DELAY)
    }
}

impl ChunkedSender {
    /// Create a sender; a chunk size of zero is raised to one
    #[must_use]
    pub fn new(chunk_size: usize, settle_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            settle_delay,
        }
    }

    /// Maximum bytes per write
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Pause inserted between consecutive chunks
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Number of chunks a payload of `len` bytes is split into
    #[must_use]
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Write `payload` chunk by chunk, flushing after each one
    ///
    /// Returns the number of chunks written.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` on the first failed write or flush.
    pub async fn send<W>(&self, writer: &mut W, payload: &[u8]) -> Result<usize, TransportError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut written = 0;
        for (index, chunk) in payload.chunks(self.chunk_size).enumerate() {
            if index > 0 && !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }
            writer.write_all(chunk).await?;
            writer.flush().await?;
            written += 1;
        }

        tracing::trace!(
            bytes = payload.len(),
            chunks = written,
            chunk_size = self.chunk_size,
            "Payload sent"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Instant;

    /// Records every individual write call and flush
    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<Vec<u8>>,
        flushes: usize,
        fail_after: Option<usize>,
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if let Some(limit) = self.fail_after {
                if self.writes.len() >= limit {
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "device unplugged",
                    )));
                }
            }
            self.writes.push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.flushes += 1;
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_reassembly_5000_bytes_at_512() {
        let sender = ChunkedSender::new(512, Duration::ZERO);
        let data = payload(5000);
        let mut writer = RecordingWriter::default();

        let chunks = sender.send(&mut writer, &data).await.unwrap();

        assert_eq!(chunks, 10);
        assert_eq!(writer.writes.len(), 10);
        assert!(writer.writes.iter().all(|w| w.len() <= 512));
        assert_eq!(writer.writes.last().unwrap().len(), 5000 - 9 * 512);
        assert_eq!(writer.flushes, 10);
        assert_eq!(writer.writes.concat(), data);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_empty_tail() {
        let sender = ChunkedSender::new(256, Duration::ZERO);
        let mut writer = RecordingWriter::default();

        let chunks = sender.send(&mut writer, &payload(2048)).await.unwrap();
        assert_eq!(chunks, 8);
        assert_eq!(sender.chunk_count(2048), 8);
        assert!(writer.writes.iter().all(|w| w.len() == 256));
    }

    #[tokio::test]
    async fn test_empty_payload_writes_nothing() {
        let sender = ChunkedSender::default();
        let mut writer = RecordingWriter::default();

        assert_eq!(sender.send(&mut writer, &[]).await.unwrap(), 0);
        assert!(writer.writes.is_empty());
    }

    #[tokio::test]
    async fn test_settle_delay_between_chunks_only() {
        let sender = ChunkedSender::new(4, Duration::from_millis(20));
        let mut writer = RecordingWriter::default();

        let start = Instant::now();
        sender.send(&mut writer, &payload(12)).await.unwrap();
        // Three chunks, two gaps
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_write_failure_is_transport_error() {
        let sender = ChunkedSender::new(100, Duration::ZERO);
        let mut writer = RecordingWriter {
            fail_after: Some(2),
            ..Default::default()
        };

        let result = sender.send(&mut writer, &payload(1000)).await;
        assert!(matches!(result, Err(TransportError::Io(_))));
        assert_eq!(writer.writes.len(), 2);
    }

    #[test]
    fn test_zero_chunk_size_is_raised() {
        let sender = ChunkedSender::new(0, Duration::ZERO);
        assert_eq!(sender.chunk_size(), 1);
        assert_eq!(sender.chunk_count(3), 3);
    }
}
