//! Real `tokio-serial`-backed [`ByteChannel`], the external collaborator
//! `fpsensor-core` leaves unimplemented.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use fpsensor_core::{ByteChannel, SensorError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialStream};

pub struct SerialChannel {
    port: SerialStream,
}

impl SerialChannel {
    pub fn open(path: &str, baud_rate: u32) -> anyhow::Result<Self> {
        let port = tokio_serial::new(path, baud_rate).open_native_async()?;
        Ok(Self { port })
    }

    /// Reopens the underlying port at a new baud rate, used after
    /// `set_baud` succeeds (the engine cannot do this itself, per
    /// `BaudChangeHint`).
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> anyhow::Result<()> {
        self.port.set_baud_rate(baud_rate)?;
        Ok(())
    }
}

#[async_trait]
impl ByteChannel for SerialChannel {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(&mut self.port, buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(&mut self.port).await
    }

    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, SensorError> {
        let mut byte = [0u8; 1];
        match tokio::time::timeout(timeout, self.port.read_exact(&mut byte)).await {
            Ok(Ok(_)) => Ok(Some(byte[0])),
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn reset_input(&mut self) -> io::Result<()> {
        self.port.clear(tokio_serial::ClearBuffer::Input)
    }
}
