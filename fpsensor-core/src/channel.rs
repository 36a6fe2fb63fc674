//! Byte channel abstraction (spec §2 item 1, §5.1).
//!
//! The engine never speaks to a concrete serial port; it speaks to anything
//! implementing [`ByteChannel`]. The real `tokio-serial`-backed
//! implementation lives in the `fpsensor-cli` crate, following spec.md's
//! framing of the platform serial driver as an external collaborator.

use std::io;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SensorError;

/// A full-duplex octet stream, the resource the command engine serializes
/// all traffic through (spec §5: "single-owner, not re-entrant").
#[async_trait]
pub trait ByteChannel: Send {
    /// Writes the entire buffer, blocking until it is accepted.
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flushes any buffered output to the wire.
    async fn flush(&mut self) -> io::Result<()>;

    /// Reads a single byte, waiting up to `timeout`. Returns `Ok(None)` on
    /// timeout rather than erroring, so callers can distinguish "nothing
    /// arrived yet" (e.g. `read_image` polling) from a real I/O failure.
    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, SensorError>;

    /// Discards any buffered input. Required after a framing error or
    /// timeout before the next command is issued (spec §5, §7).
    async fn reset_input(&mut self) -> io::Result<()>;
}

/// An in-memory duplex channel used by the test suite in place of a real
/// serial port, mirroring the teacher's practice of mocking the transport
/// boundary for protocol-level tests (`km003c-lib/tests/common/mod.rs`
/// provides hex-decoding helpers for the same purpose).
#[derive(Debug, Default)]
pub struct MockChannel {
    /// Bytes queued for the engine to read, in order.
    inbound: std::collections::VecDeque<u8>,
    /// Bytes the engine has written, in order.
    pub outbound: Vec<u8>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes that subsequent `read_byte` calls will return.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Drains and returns everything written so far.
    pub fn take_outbound(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }
}

#[async_trait]
impl ByteChannel for MockChannel {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.outbound.extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn read_byte(&mut self, _timeout: Duration) -> Result<Option<u8>, SensorError> {
        Ok(self.inbound.pop_front())
    }

    async fn reset_input(&mut self) -> io::Result<()> {
        self.inbound.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_channel_echoes_queued_bytes() {
        let mut chan = MockChannel::new();
        chan.push_inbound(&[1, 2, 3]);
        assert_eq!(chan.read_byte(Duration::from_millis(1)).await.unwrap(), Some(1));
        assert_eq!(chan.read_byte(Duration::from_millis(1)).await.unwrap(), Some(2));
        chan.write_all(&[9]).await.unwrap();
        assert_eq!(chan.take_outbound(), vec![9]);
    }
}
