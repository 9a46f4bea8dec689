//! Transport implementations for msplib.
//!
//! This crate provides [`SerialTransport`], the concrete implementation of
//! the [`Transport`](msplib_core::Transport) trait for the serial links that
//! MSP responders actually hang off of: USB virtual COM ports on flight
//! controllers and plain UART adapters.
//!
//! # Example
//!
//! ```no_run
//! use msplib_transport::SerialTransport;
//! use msplib_core::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> msplib_core::Result<()> {
//! // MSP links run at 115200 8N1 by default.
//! let mut transport = SerialTransport::open("/dev/ttyACM0").await?;
//!
//! // MSP_IDENT request
//! transport.send(&[0x24, 0x4D, 0x3C, 0x00, 0x64, 0x64]).await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_millis(100)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{SerialConfig, SerialTransport};
