//! Transport trait for responder communication.
//!
//! The [`Transport`] trait abstracts over the physical link to an MSP
//! responder. The production implementation is the serial port transport in
//! `msplib-transport`; `msplib-test-harness` provides a scripted mock for
//! deterministic protocol tests.
//!
//! The frame reader and the transaction manager in the `msplib` crate operate
//! on a `Transport` rather than directly on a serial port, so the whole
//! protocol stack can be exercised without hardware.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to an MSP responder.
///
/// Implementations cover line configuration, buffering, and raw I/O.
/// Framing, checksums, and retry policy live in the protocol layer above.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the responder with a single underlying write.
    ///
    /// If the OS accepts fewer bytes than requested, implementations return
    /// [`Error::TxIncomplete`](crate::Error::TxIncomplete) without retrying
    /// the remainder; a syscall failure maps to
    /// [`Error::Io`](crate::Error::Io).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the responder into `buf`, waiting up to `timeout`.
    ///
    /// Returns the number of bytes read, which may be fewer than
    /// `buf.len()`. Returns [`Error::Timeout`](crate::Error::Timeout) if no
    /// byte arrives within the deadline. One call maps to at most one
    /// underlying read.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Number of bytes queued in the OS input buffer, without blocking.
    async fn bytes_available(&mut self) -> Result<usize>;

    /// Block until every byte handed to [`send`](Transport::send) has left
    /// the OS output queue.
    async fn drain(&mut self) -> Result<()>;

    /// Discard any queued input and any output not yet transmitted.
    ///
    /// The transaction layer calls this before issuing a request so that
    /// stale bytes from earlier failed exchanges or responder reboots cannot
    /// poison the next parse.
    async fn flush_io(&mut self) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After `close()`, subsequent operations return
    /// [`Error::NotConnected`](crate::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
