//! MSP device handle and transaction management.
//!
//! [`MspDevice`] owns one link to one responder: the transport, the
//! configured protocol version and read-retry budget, and the fixed receive
//! buffer. Every public operation serializes on an internal mutex, because
//! the wire is a single shared resource with no multiplexing; interleaving
//! two requests would corrupt both parses. A second caller simply blocks
//! until the first transaction completes.
//!
//! Each transaction follows the same shape: flush stale input, encode and
//! send the request in one write, wait for the output queue to drain, then
//! parse exactly one response frame.

use tokio::sync::Mutex;

use msplib_core::error::{Error, Result};
use msplib_core::packet::{MspPacket, MspVersion, RX_BUFFER_SIZE};
use msplib_core::transport::Transport;
use msplib_transport::{SerialConfig, SerialTransport};

use crate::codec::{encode_v1, encode_v2};
use crate::parser::read_packet;

/// Default number of receive attempts per expected byte batch.
pub const DEFAULT_READ_RETRIES: u32 = 3;

/// Configuration for an MSP link.
#[derive(Debug, Clone)]
pub struct MspConfig {
    /// Protocol version used for outgoing requests. Defaults to V1, which
    /// every responder speaks; responses are decoded by their own header
    /// regardless of this setting.
    pub msp_version: MspVersion,
    /// Receive attempts per read before the transaction fails with
    /// [`Error::NoResponse`]. Each attempt waits up to 100 ms, so this also
    /// bounds the per-read wall-clock time. Must be positive.
    pub read_retries: u32,
}

impl Default for MspConfig {
    fn default() -> Self {
        Self {
            msp_version: MspVersion::V1,
            read_retries: DEFAULT_READ_RETRIES,
        }
    }
}

/// State guarded by the device mutex: the transport and the receive buffer
/// the parser decodes into.
struct Inner {
    /// `None` once the device has been closed.
    transport: Option<Box<dyn Transport>>,
    /// Fixed receive buffer; only the parser writes it.
    rx_buf: Box<[u8; RX_BUFFER_SIZE]>,
}

/// A handle to one MSP link.
///
/// Created open by [`MspDevice::open`] and usable from multiple tasks or
/// threads; operations on the same device are mutually exclusive. Dropping
/// the device closes the underlying port.
///
/// # Example
///
/// ```no_run
/// use msplib::MspDevice;
///
/// # async fn example() -> msplib::Result<()> {
/// let device = MspDevice::open("/dev/ttyACM0").await?;
///
/// // MSP_ATTITUDE: roll/pitch/yaw as three little-endian i16s.
/// let packet = device.get(msplib::commands::MSP_ATTITUDE).await?;
/// println!("attitude payload: {:02X?}", packet.payload);
///
/// device.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct MspDevice {
    config: MspConfig,
    /// Serial port path; `None` when built from a caller-supplied transport.
    path: Option<String>,
    inner: Mutex<Inner>,
}

impl MspDevice {
    /// Open an MSP link on the given serial port with default settings
    /// (V1 requests, 3 read retries, 115200 8N1).
    pub async fn open(path: &str) -> Result<Self> {
        Self::open_with_config(path, MspConfig::default()).await
    }

    /// Open an MSP link with an explicit configuration.
    pub async fn open_with_config(path: &str, config: MspConfig) -> Result<Self> {
        validate_config(&config)?;

        let transport = SerialTransport::open_with_config(path, SerialConfig::default()).await?;
        tracing::debug!(
            port = %path,
            version = ?config.msp_version,
            read_retries = config.read_retries,
            "MSP link opened"
        );

        Ok(Self {
            config,
            path: Some(path.to_string()),
            inner: Mutex::new(Inner {
                transport: Some(Box::new(transport)),
                rx_buf: Box::new([0u8; RX_BUFFER_SIZE]),
            }),
        })
    }

    /// Build a device over a caller-supplied transport.
    ///
    /// This is how the protocol stack is exercised against the mock
    /// transport in tests, and how exotic links (MSP over TCP bridges,
    /// pseudo-terminals) can reuse the transaction layer.
    pub fn from_transport(transport: Box<dyn Transport>, config: MspConfig) -> Result<Self> {
        validate_config(&config)?;

        Ok(Self {
            config,
            path: None,
            inner: Mutex::new(Inner {
                transport: Some(transport),
                rx_buf: Box::new([0u8; RX_BUFFER_SIZE]),
            }),
        })
    }

    /// The serial port path, if this device was opened on one.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The configuration this device was opened with.
    pub fn config(&self) -> &MspConfig {
        &self.config
    }

    /// Returns `true` until [`close`](MspDevice::close) has been called.
    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.transport.is_some()
    }

    /// Close the link.
    ///
    /// Closing an already-closed device is not an error; it only logs a
    /// warning, since it usually indicates confused teardown ordering in
    /// the caller.
    pub async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.transport.take() {
            Some(mut transport) => {
                tracing::debug!(port = ?self.path, "Closing MSP link");
                transport.close().await
            }
            None => {
                tracing::warn!(port = ?self.path, "Closing an already-closed MSP link");
                Ok(())
            }
        }
    }

    /// Request data from the responder.
    ///
    /// Sends an empty-payload request for `command` and returns the decoded
    /// response packet. The response payload layout is command-specific.
    pub async fn get(&self, command: u16) -> Result<MspPacket> {
        self.get_flagged(command, 0).await
    }

    /// [`get`](MspDevice::get) with an explicit V2 flag byte.
    ///
    /// The flag only appears on the wire for V2 requests; V1 frames have no
    /// flag field.
    pub async fn get_flagged(&self, command: u16, flag: u8) -> Result<MspPacket> {
        self.transact(command, flag, &[]).await
    }

    /// Send data to the responder and wait for its acknowledgement packet.
    ///
    /// Most responders answer a set with an empty-payload echo of the
    /// command, or a NACK (surfaced as [`Error::Nack`]) if they reject it.
    pub async fn set(&self, command: u16, payload: &[u8]) -> Result<MspPacket> {
        self.set_flagged(command, 0, payload).await
    }

    /// [`set`](MspDevice::set) with an explicit V2 flag byte.
    pub async fn set_flagged(&self, command: u16, flag: u8, payload: &[u8]) -> Result<MspPacket> {
        self.transact(command, flag, payload).await
    }

    /// Send data without waiting for the acknowledgement.
    ///
    /// Skipping the ack saves a round trip on high-rate command streams
    /// (e.g. RC overrides), but leaves the responder's answer queued; the
    /// flush at the start of the next transaction discards it.
    pub async fn set_no_ack(&self, command: u16, payload: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let transport = inner.transport.as_mut().ok_or(Error::NotConnected)?;

        let frame = self.build_frame(command, 0, payload)?;
        transport.flush_io().await?;
        transport.send(&frame).await
    }

    /// One full request/response transaction under the device mutex.
    async fn transact(&self, command: u16, flag: u8, payload: &[u8]) -> Result<MspPacket> {
        let mut inner = self.inner.lock().await;
        let Inner { transport, rx_buf } = &mut *inner;
        let transport = transport.as_mut().ok_or(Error::NotConnected)?;

        let frame = self.build_frame(command, flag, payload)?;

        tracing::debug!(command, payload_len = payload.len(), "MSP transaction");

        // Discard anything a previous failed exchange or a responder reboot
        // left in the input queue; it would desynchronize the parse below.
        transport.flush_io().await?;
        transport.send(&frame).await?;
        transport.drain().await?;

        read_packet(transport.as_mut(), rx_buf, self.config.read_retries).await
    }

    /// Validate the command/payload against the configured version and
    /// encode the request frame.
    fn build_frame(&self, command: u16, flag: u8, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > u16::MAX as usize {
            return Err(Error::InvalidParameter(format!(
                "payload of {} bytes exceeds the 16-bit frame length field",
                payload.len()
            )));
        }

        match self.config.msp_version {
            MspVersion::V1 => {
                if command > u8::MAX as u16 {
                    return Err(Error::InvalidParameter(format!(
                        "command {command} cannot be sent in an MSP V1 frame (maximum is 255)"
                    )));
                }
                Ok(encode_v1(command as u8, payload))
            }
            MspVersion::V2 => Ok(encode_v2(flag, command, payload)),
        }
    }
}

fn validate_config(config: &MspConfig) -> Result<()> {
    if config.read_retries == 0 {
        return Err(Error::InvalidParameter(format!(
            "read_retries must be positive (got 0, default is {DEFAULT_READ_RETRIES})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use msplib_core::packet::Direction;
    use msplib_test_harness::MockTransport;

    /// Keeps a [`MockTransport`] inspectable after the device has boxed it.
    #[derive(Clone)]
    struct SharedTransport(Arc<tokio::sync::Mutex<MockTransport>>);

    impl SharedTransport {
        fn new(mock: MockTransport) -> Self {
            Self(Arc::new(tokio::sync::Mutex::new(mock)))
        }
    }

    #[async_trait]
    impl Transport for SharedTransport {
        async fn send(&mut self, data: &[u8]) -> Result<()> {
            self.0.lock().await.send(data).await
        }

        async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            self.0.lock().await.receive(buf, timeout).await
        }

        async fn bytes_available(&mut self) -> Result<usize> {
            self.0.lock().await.bytes_available().await
        }

        async fn drain(&mut self) -> Result<()> {
            self.0.lock().await.drain().await
        }

        async fn flush_io(&mut self) -> Result<()> {
            self.0.lock().await.flush_io().await
        }

        async fn close(&mut self) -> Result<()> {
            self.0.lock().await.close().await
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn device_with(mock: MockTransport, config: MspConfig) -> (MspDevice, SharedTransport) {
        let shared = SharedTransport::new(mock);
        let device = MspDevice::from_transport(Box::new(shared.clone()), config)
            .expect("valid config");
        (device, shared)
    }

    #[tokio::test]
    async fn get_v1_transaction() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_v1(108, &[]),
            &[0x24, 0x4D, 0x3E, 0x03, 0x6C, 0x10, 0x20, 0x30, 0x6F],
        );

        let (device, shared) = device_with(mock, MspConfig::default());
        let pkt = device.get(108).await.unwrap();

        assert_eq!(pkt.version, MspVersion::V1);
        assert_eq!(pkt.direction, Direction::Response);
        assert_eq!(pkt.command, 108);
        assert_eq!(pkt.payload, vec![0x10, 0x20, 0x30]);

        let mock = shared.0.lock().await;
        assert_eq!(mock.sent_data().len(), 1);
        assert_eq!(mock.sent_data()[0], encode_v1(108, &[]));
        assert_eq!(mock.flush_count(), 1);
        assert_eq!(mock.drain_count(), 1);
    }

    #[tokio::test]
    async fn get_v2_transaction() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_v2(0, 0x1F40, &[]),
            &[0x24, 0x58, 0x3E, 0x00, 0x40, 0x1F, 0x00, 0x00, 0x1B],
        );

        let config = MspConfig {
            msp_version: MspVersion::V2,
            ..MspConfig::default()
        };
        let (device, _shared) = device_with(mock, config);

        let pkt = device.get(0x1F40).await.unwrap();
        assert_eq!(pkt.version, MspVersion::V2);
        assert_eq!(pkt.command, 0x1F40);
        assert!(pkt.payload.is_empty());
    }

    #[tokio::test]
    async fn set_waits_for_ack() {
        let payload = [0xDC, 0x05, 0xDC, 0x05];
        let mut mock = MockTransport::new();
        mock.expect(&encode_v1(200, &payload), &[0x24, 0x4D, 0x3E, 0x00, 0xC8, 0xC8]);

        let (device, _shared) = device_with(mock, MspConfig::default());
        let ack = device.set(200, &payload).await.unwrap();
        assert_eq!(ack.command, 200);
        assert!(ack.payload.is_empty());
    }

    #[tokio::test]
    async fn set_no_ack_skips_drain_and_parse() {
        let mock = MockTransport::new();
        let (device, shared) = device_with(mock, MspConfig::default());

        device.set_no_ack(200, &[0x01, 0x02]).await.unwrap();

        let mock = shared.0.lock().await;
        assert_eq!(mock.sent_data().len(), 1);
        assert_eq!(mock.sent_data()[0], encode_v1(200, &[0x01, 0x02]));
        assert_eq!(mock.flush_count(), 1);
        assert_eq!(mock.drain_count(), 0);
    }

    #[tokio::test]
    async fn v1_rejects_wide_commands() {
        let (device, shared) = device_with(MockTransport::new(), MspConfig::default());

        let result = device.get(300).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = device.set(0x1F40, &[]).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // Nothing went out on the wire.
        assert!(shared.0.lock().await.sent_data().is_empty());
    }

    #[tokio::test]
    async fn zero_read_retries_rejected() {
        let config = MspConfig {
            read_retries: 0,
            ..MspConfig::default()
        };
        let result = MspDevice::from_transport(Box::new(MockTransport::new()), config);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn closed_device_rejects_operations() {
        let (device, _shared) = device_with(MockTransport::new(), MspConfig::default());

        assert!(device.is_open().await);
        device.close().await.unwrap();
        assert!(!device.is_open().await);

        assert!(matches!(device.get(108).await, Err(Error::NotConnected)));
        assert!(matches!(
            device.set_no_ack(200, &[]).await,
            Err(Error::NotConnected)
        ));

        // Double close only warns.
        assert!(device.close().await.is_ok());
    }

    #[tokio::test]
    async fn stale_input_is_flushed_before_request() {
        let mut mock = MockTransport::new();
        // A half-frame left over from an aborted exchange. Without the
        // flush, the parser would sync on it and mis-read the response.
        mock.push_rx(&[0x24, 0x4D, 0x3E, 0x05]);
        mock.expect(
            &encode_v1(108, &[]),
            &[0x24, 0x4D, 0x3E, 0x00, 0x6C, 0x6C],
        );

        let (device, _shared) = device_with(mock, MspConfig::default());
        let pkt = device.get(108).await.unwrap();
        assert_eq!(pkt.command, 108);
        assert!(pkt.payload.is_empty());
    }

    #[tokio::test]
    async fn nack_reaches_the_caller() {
        let mut mock = MockTransport::new();
        mock.expect(&encode_v1(108, &[]), &[0x24, 0x4D, 0x21, 0x00, 0x6C, 0x6C]);

        let (device, _shared) = device_with(mock, MspConfig::default());
        match device.get(108).await {
            Err(Error::Nack(pkt)) => assert_eq!(pkt.command, 108),
            other => panic!("expected Nack, got {other:?}"),
        }
    }

    /// Transport that records how many of its operations overlap in time
    /// and answers every request with a canned V1 response.
    #[derive(Clone)]
    struct OverlapProbe {
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
        rx: Arc<std::sync::Mutex<VecDeque<u8>>>,
    }

    impl OverlapProbe {
        fn new() -> Self {
            Self {
                active: Arc::new(AtomicUsize::new(0)),
                max_active: Arc::new(AtomicUsize::new(0)),
                rx: Arc::new(std::sync::Mutex::new(VecDeque::new())),
            }
        }

        fn enter(&self) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Transport for OverlapProbe {
        async fn send(&mut self, _data: &[u8]) -> Result<()> {
            self.enter();
            tokio::time::sleep(Duration::from_millis(1)).await;
            self.rx
                .lock()
                .unwrap()
                .extend([0x24, 0x4D, 0x3E, 0x00, 0x6C, 0x6C]);
            self.exit();
            Ok(())
        }

        async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
            self.enter();
            tokio::time::sleep(Duration::from_millis(1)).await;
            let result = {
                let mut rx = self.rx.lock().unwrap();
                if rx.is_empty() {
                    Err(Error::Timeout)
                } else {
                    let n = rx.len().min(buf.len());
                    for slot in buf.iter_mut().take(n) {
                        *slot = rx.pop_front().expect("length checked");
                    }
                    Ok(n)
                }
            };
            self.exit();
            result
        }

        async fn bytes_available(&mut self) -> Result<usize> {
            Ok(self.rx.lock().unwrap().len())
        }

        async fn drain(&mut self) -> Result<()> {
            self.enter();
            tokio::time::sleep(Duration::from_millis(1)).await;
            self.exit();
            Ok(())
        }

        async fn flush_io(&mut self) -> Result<()> {
            self.enter();
            tokio::time::sleep(Duration::from_millis(1)).await;
            self.rx.lock().unwrap().clear();
            self.exit();
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_are_serialized() {
        let probe = OverlapProbe::new();
        let device = Arc::new(
            MspDevice::from_transport(Box::new(probe.clone()), MspConfig::default()).unwrap(),
        );

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let device = Arc::clone(&device);
            tasks.push(tokio::spawn(async move { device.get(108).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // The device mutex admits one transaction at a time, so transport
        // operations from different callers must never overlap.
        assert_eq!(probe.max_active.load(Ordering::SeqCst), 1);
    }
}

