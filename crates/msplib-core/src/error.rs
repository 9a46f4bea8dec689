//! Error types for msplib.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, protocol decode
//! failures, and argument errors are all captured here; OS error numbers ride
//! along inside the wrapped [`std::io::Error`] rather than in an out-of-band
//! slot.

use crate::packet::MspPacket;

/// The error type for all msplib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An underlying OS I/O error (open, read, write, ioctl). The captured
    /// `errno` is available via [`std::io::Error::raw_os_error`].
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single write accepted fewer bytes than requested. The frame is not
    /// re-sent piecemeal; the whole transaction is abandoned.
    #[error("wrote only {written} of {expected} bytes to the transmit buffer")]
    TxIncomplete {
        /// Bytes the OS actually accepted.
        written: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// A single bounded read expired with no data.
    ///
    /// This is a transport-level event; the frame reader converts exhausted
    /// retries into [`Error::NoResponse`].
    #[error("timeout waiting for data")]
    Timeout,

    /// Read retries were exhausted before the expected bytes arrived.
    #[error("failed to read the expected number of bytes from the responder")]
    NoResponse,

    /// No frame sync byte (`'$'`) was found within the search window.
    #[error("could not find frame sync byte")]
    SyncNotFound,

    /// The received checksum does not match the one computed over the frame.
    /// The decoded packet is attached for inspection.
    #[error("received checksum does not match computed value {computed:#04x}")]
    BadChecksum {
        /// The packet as decoded, with the on-wire checksum.
        packet: MspPacket,
        /// The checksum computed over the received frame.
        computed: u8,
    },

    /// The responder answered with a negative acknowledgement (direction
    /// `'!'`). The decoded packet is attached.
    #[error("received a negative acknowledgement (NACK) from the responder")]
    Nack(MspPacket),

    /// An incoming payload would overflow the fixed receive buffer.
    #[error("payload of {size} bytes exceeds the {capacity}-byte receive buffer")]
    PayloadTooLarge {
        /// Declared payload size of the incoming frame.
        size: usize,
        /// Receive buffer capacity.
        capacity: usize,
    },

    /// An invalid argument was passed to a device operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The device has not been opened, or has already been closed.
    #[error("device is not open")]
    NotConnected,

    /// An unreachable branch was reached. This is a bug in msplib; please
    /// report it.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns `true` for the lighter class of per-transaction communication
    /// failures: no response, sync not found, checksum mismatch, and NACK.
    ///
    /// These indicate a corrupted or missing exchange on an otherwise healthy
    /// link and are reasonable to count and retry at the call site. All other
    /// variants are fatal for the current operation.
    pub fn is_comm_error(&self) -> bool {
        matches!(
            self,
            Error::NoResponse | Error::SyncNotFound | Error::BadChecksum { .. } | Error::Nack(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
