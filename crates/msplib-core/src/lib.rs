//! msplib-core: Core types, error definitions, and the Transport trait for msplib.
//!
//! This crate defines the protocol-agnostic abstractions the rest of the
//! workspace builds on. Applications normally depend on the `msplib` facade
//! crate rather than on this crate directly.
//!
//! # Key types
//!
//! - [`MspPacket`] -- a decoded MSP frame as received from a responder
//! - [`Transport`] -- byte-level communication channel to a responder
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod packet;
pub mod transport;

pub use error::{Error, Result};
pub use packet::{Direction, MspPacket, MspVersion, FRAME_SYNC, MAX_PAYLOAD_SIZE, RX_BUFFER_SIZE};
pub use transport::Transport;
