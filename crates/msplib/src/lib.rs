//! # msplib -- Multi-Wii Serial Protocol host library
//!
//! `msplib` is an asynchronous Rust library for talking to MSP responders --
//! the flight controllers running MultiWii, Cleanflight, Betaflight, or INAV
//! that expose telemetry and configuration over a serial port. It implements
//! the host (initiator) side only: it sends requests and decodes responses,
//! and never acts as a responder.
//!
//! ## Quick start
//!
//! Add `msplib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! msplib = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Read the attitude from a flight controller:
//!
//! ```no_run
//! use msplib::{commands, MspDevice};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let device = MspDevice::open("/dev/ttyACM0").await?;
//!
//!     let packet = device.get(commands::MSP_ATTITUDE).await?;
//!     println!("attitude payload: {:02X?}", packet.payload);
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                         |
//! |-----------------------|-------------------------------------------------|
//! | `msplib-core`         | [`MspPacket`], [`Transport`] trait, [`Error`]   |
//! | `msplib-transport`    | [`SerialTransport`] over tokio-serial           |
//! | `msplib-test-harness` | Mock transport for protocol tests               |
//! | **`msplib`**          | This crate: codec, parser, [`MspDevice`]        |
//!
//! ## Protocol support
//!
//! - **MSP V1**: 8-bit commands, XOR checksum, including the JUMBO escape
//!   for payloads longer than 254 bytes.
//! - **MSP V2**: 16-bit commands, flag byte, CRC8/DVB-S2 checksum.
//! - **V2-in-V1 tunneling**: accepted on receive (some firmwares answer V1
//!   requests this way); never emitted.
//!
//! Received payloads are capped at 1023 bytes by the fixed receive buffer;
//! larger frames fail with [`Error::PayloadTooLarge`] rather than
//! allocating.
//!
//! ## Concurrency
//!
//! [`MspDevice`] is safe to share across tasks and threads. The wire is a
//! single unmultiplexed resource, so the device serializes transactions on
//! an internal mutex: one `get`/`set` runs at a time, and other callers
//! block until it finishes. Callers needing an upper bound on latency bound
//! the per-device `read_retries` instead of cancelling mid-transaction.
//!
//! ## Errors
//!
//! All operations return [`Result`]. The per-transaction failures --
//! [`Error::NoResponse`], [`Error::SyncNotFound`], [`Error::BadChecksum`],
//! [`Error::Nack`] -- are distinguished by
//! [`Error::is_comm_error`]; they indicate one corrupted or missing
//! exchange, and retrying the whole request is safe. Checksum failures and
//! NACKs carry the decoded packet for inspection.

pub mod checksum;
pub mod codec;
pub mod commands;
pub mod device;
pub mod parser;

pub use msplib_core::{
    Direction, Error, MspPacket, MspVersion, Result, Transport, MAX_PAYLOAD_SIZE, RX_BUFFER_SIZE,
};
pub use msplib_transport::{SerialConfig, SerialTransport};

pub use device::{MspConfig, MspDevice, DEFAULT_READ_RETRIES};
