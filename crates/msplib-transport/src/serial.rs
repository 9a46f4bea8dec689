//! Serial port transport for MSP responder communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait on top of a `tokio-serial` stream.
//!
//! Flight controllers expose MSP either over a USB virtual COM port
//! (`/dev/ttyACM*`) or a hardware UART behind a USB adapter (`/dev/ttyUSB*`).
//! Either way the line discipline is the same: 115200 baud, 8 data bits, no
//! parity, 1 stop bit, no flow control, raw (non-canonical) mode. Per-read
//! timeouts are applied by the caller through the `timeout` argument of
//! [`Transport::receive`] rather than through termios `VTIME`.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

use msplib_core::error::{Error, Result};
use msplib_core::transport::Transport;

/// Baud rate used by MSP responders.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port configuration.
///
/// MSP fixes everything except the baud rate: the line is always 8N1 with no
/// flow control. The default baud rate of 115200 matches Betaflight, INAV,
/// and MultiWii out of the box.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. 115200 unless the responder was reconfigured.
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Serial port transport for MSP responder communication.
///
/// Implements the [`Transport`] trait for USB virtual COM ports and plain
/// UART connections to flight controllers.
#[derive(Debug)]
pub struct SerialTransport {
    /// The underlying serial port stream; `None` after `close()`.
    port: Option<SerialStream>,
    /// Port path for logging.
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the default MSP settings (115200 8N1).
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyACM0" on Linux, "COM3" on
    ///   Windows)
    pub async fn open(port: &str) -> Result<Self> {
        Self::open_with_config(port, SerialConfig::default()).await
    }

    /// Open a serial port with an explicit configuration.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Io(e.into())
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Get the path of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending frame"
        );

        // One write call, no partial-retry. A short write leaves the
        // responder with a truncated frame, so the transaction is abandoned
        // rather than patched up.
        let written = port.write(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Write failed");
            Error::Io(e)
        })?;

        if written != data.len() {
            tracing::error!(
                port = %self.port_name,
                written,
                expected = data.len(),
                "Short write"
            );
            return Err(Error::TxIncomplete {
                written,
                expected: data.len(),
            });
        }

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Read failed");
                Err(Error::Io(e))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for data"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        let n = port.bytes_to_read().map_err(|e| Error::Io(e.into()))?;
        Ok(n as usize)
    }

    async fn drain(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        // flush() on a POSIX serial stream is tcdrain: it blocks until the
        // OS output queue has gone out on the wire.
        port.flush().await.map_err(Error::Io)
    }

    async fn flush_io(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(port = %self.port_name, "Discarding queued input and output");
        port.clear(ClearBuffer::All).map_err(|e| Error::Io(e.into()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");
            drop(port);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}
