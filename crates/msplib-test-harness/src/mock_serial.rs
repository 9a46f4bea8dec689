//! Mock transport for deterministic testing of the MSP protocol stack.
//!
//! [`MockTransport`] implements the [`Transport`] trait with an in-memory
//! receive queue and optional pre-loaded request/response pairs. This lets
//! you test frame encoding, the parser state machine, and the transaction
//! layer byte-for-byte without real hardware.
//!
//! Two styles of scripting are supported and may be mixed:
//!
//! - [`expect`](MockTransport::expect): when the stack sends exactly the
//!   given request, the given response bytes are queued for reading.
//! - [`push_rx`](MockTransport::push_rx): queue raw bytes directly, e.g.
//!   line noise or a stale half-frame left over from a responder reboot.
//!
//! `flush_io` discards the receive queue, so flush-before-request behavior
//! is observable in tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use msplib_core::error::{Error, Result};
use msplib_core::transport::Transport;

/// A pre-loaded request/response pair.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes the stack is expected to send.
    request: Vec<u8>,
    /// The bytes queued for reading once the matching request is sent.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing the protocol stack without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// bytes are recorded and matched against the next expectation (if any); the
/// corresponding response bytes are appended to the receive queue.
/// `receive()` then serves the queue in order, timing out once it is empty.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be read.
    rx: VecDeque<u8>,
    /// Log of all bytes sent through this transport, one entry per `send()`.
    sent_log: Vec<Vec<u8>>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Number of `drain()` calls observed.
    drain_count: usize,
    /// Number of `flush_io()` calls observed.
    flush_count: usize,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            connected: true,
            ..Default::default()
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with bytes matching `request`, `response` is
    /// appended to the receive queue.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue raw bytes for reading, bypassing the expectation mechanism.
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// All bytes sent through this transport, one element per `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of bytes still waiting in the receive queue.
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Number of `drain()` calls observed.
    pub fn drain_count(&self) -> usize {
        self.drain_count
    }

    /// Number of `flush_io()` calls observed.
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Set the connected state.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Internal(format!(
                    "mock transport: expected {:02X?}, got {:02X?}",
                    expectation.request, data
                )));
            }
            self.rx.extend(expectation.response.iter().copied());
        }

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if self.rx.is_empty() {
            return Err(Error::Timeout);
        }

        let n = self.rx.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().expect("rx length checked above");
        }
        Ok(n)
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        Ok(self.rx.len())
    }

    async fn drain(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.drain_count += 1;
        Ok(())
    }

    async fn flush_io(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.flush_count += 1;
        self.rx.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.rx.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_send_receive() {
        let mut mock = MockTransport::new();
        let request = &[0x24, 0x4D, 0x3C, 0x00, 0x64, 0x64];
        let response = &[0x24, 0x4D, 0x3E, 0x00, 0x64, 0x64];

        mock.expect(request, response);
        mock.send(request).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], response);
    }

    #[tokio::test]
    async fn partial_receive_with_small_buffer() {
        let mut mock = MockTransport::new();
        mock.push_rx(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let mut buf = [0u8; 3];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB, 0xCC]);

        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], &[0xDD]);
    }

    #[tokio::test]
    async fn receive_empty_queue_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn flush_discards_queued_rx() {
        let mut mock = MockTransport::new();
        mock.push_rx(&[0x01, 0x02, 0x03]);
        assert_eq!(mock.bytes_available().await.unwrap(), 3);

        mock.flush_io().await.unwrap();
        assert_eq!(mock.flush_count(), 1);
        assert_eq!(mock.bytes_available().await.unwrap(), 0);

        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, Duration::from_millis(10)).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn tracks_sent_data_and_drains() {
        let mut mock = MockTransport::new();
        mock.send(&[0x01, 0x02]).await.unwrap();
        mock.send(&[0x03]).await.unwrap();
        mock.drain().await.unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[0], vec![0x01, 0x02]);
        assert_eq!(mock.sent_data()[1], vec![0x03]);
        assert_eq!(mock.drain_count(), 1);
    }

    #[tokio::test]
    async fn wrong_request_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let result = mock.send(&[0x99]).await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn expectations_consumed_in_order() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xAA]);
        mock.expect(&[0x02], &[0xBB]);
        assert_eq!(mock.remaining_expectations(), 2);

        mock.send(&[0x01]).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 1);
        mock.send(&[0x02]).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);

        let mut buf = [0u8; 2];
        let n = mock
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB]);
    }

    #[tokio::test]
    async fn disconnect_fails_operations() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        assert!(matches!(
            mock.send(&[0x01]).await,
            Err(Error::NotConnected)
        ));
        let mut buf = [0u8; 4];
        assert!(matches!(
            mock.receive(&mut buf, Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(mock.flush_io().await, Err(Error::NotConnected)));
    }
}
