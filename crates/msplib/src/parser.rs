//! MSP response frame parser.
//!
//! [`read_packet`] pulls one frame off a [`Transport`] and decodes it into an
//! [`MspPacket`]: locate the sync byte, read the two-character header,
//! dispatch on the version character, handle the V1 JUMBO size escape and
//! V2-in-V1 encapsulation, then read the payload into the caller's receive
//! buffer and validate the checksum.
//!
//! Reads are built on a bounded-retry `read_exact`: each underlying receive
//! call is limited to [`READ_TIMEOUT`], and a frame read that does not
//! complete within the device's configured retry count fails with
//! [`Error::NoResponse`]. Once a responder starts transmitting a frame it
//! keeps the inter-byte spacing well under the timeout, so retries only
//! accumulate while the line is actually idle.

use std::time::Duration;

use msplib_core::error::{Error, Result};
use msplib_core::packet::{Direction, MspPacket, MspVersion, FRAME_SYNC, MAX_PAYLOAD_SIZE, RX_BUFFER_SIZE};
use msplib_core::transport::Transport;

use crate::checksum::{crc8_dvb_s2, xor_checksum};
use crate::codec::{JUMBO_SIZE_MARKER, V2_TUNNEL_COMMAND};

/// Upper bound on a single transport receive, the async analogue of the
/// classic `VMIN=0, VTIME=1` termios setup.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Bytes scanned for the `'$'` sync before giving up.
///
/// Input is flushed before every request, so anything ahead of the sync byte
/// is line noise or responder boot chatter; there is never much to wade
/// through.
const MAX_SYNC_SEARCH_BYTES: usize = 50;

/// Read exactly `buf.len()` bytes, issuing at most `read_retries` receive
/// calls of [`READ_TIMEOUT`] each and accumulating partial reads.
///
/// Every receive call consumes a retry, whether it returned bytes or timed
/// out, so the wall-clock bound is `read_retries` timeouts in the worst
/// case. Exhausting the budget with bytes still missing yields
/// [`Error::NoResponse`]; transport failures propagate as-is.
async fn read_exact(
    transport: &mut dyn Transport,
    buf: &mut [u8],
    read_retries: u32,
) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }

    let mut filled = 0;
    for _ in 0..read_retries {
        match transport.receive(&mut buf[filled..], READ_TIMEOUT).await {
            Ok(n) => filled += n,
            Err(Error::Timeout) => {}
            Err(e) => return Err(e),
        }
        if filled == buf.len() {
            return Ok(());
        }
    }

    tracing::trace!(
        wanted = buf.len(),
        got = filled,
        "Read retries exhausted mid-frame"
    );
    Err(Error::NoResponse)
}

/// Scan for the frame sync byte, one byte at a time.
///
/// Fails with [`Error::SyncNotFound`] once [`MAX_SYNC_SEARCH_BYTES`]
/// non-sync bytes have been consumed, or [`Error::NoResponse`] if the line
/// goes quiet before a sync byte shows up.
async fn find_sync(transport: &mut dyn Transport, read_retries: u32) -> Result<()> {
    let mut byte = [0u8; 1];
    for _ in 0..MAX_SYNC_SEARCH_BYTES {
        read_exact(transport, &mut byte, read_retries).await?;
        if byte[0] == FRAME_SYNC {
            return Ok(());
        }
    }
    Err(Error::SyncNotFound)
}

/// Read and decode one MSP frame from the transport.
///
/// `rx_buf` is the device's fixed receive buffer; payloads land there before
/// being copied into the returned packet, and frames whose declared payload
/// exceeds [`MAX_PAYLOAD_SIZE`] are rejected with
/// [`Error::PayloadTooLarge`] without reading the body.
///
/// A structurally valid frame whose direction byte is `'!'` is returned as
/// [`Error::Nack`] with the decoded packet attached; a checksum failure is
/// returned as [`Error::BadChecksum`], likewise with the packet.
pub async fn read_packet(
    transport: &mut dyn Transport,
    rx_buf: &mut [u8; RX_BUFFER_SIZE],
    read_retries: u32,
) -> Result<MspPacket> {
    find_sync(transport, read_retries).await?;

    let mut head = [0u8; 2];
    read_exact(transport, &mut head, read_retries).await?;

    let version = MspVersion::from_wire(head[0]).ok_or_else(|| {
        Error::Internal(format!(
            "unrecognized version character {:#04x} after sync",
            head[0]
        ))
    })?;
    let direction = Direction::from_wire(head[1]).ok_or_else(|| {
        Error::Internal(format!(
            "unrecognized direction character {:#04x} after sync",
            head[1]
        ))
    })?;

    let packet = match version {
        MspVersion::V1 => parse_v1(transport, rx_buf, read_retries, direction).await?,
        MspVersion::V2 => {
            parse_v2(transport, rx_buf, read_retries, MspVersion::V2, direction).await?
        }
    };

    if packet.is_error() {
        return Err(Error::Nack(packet));
    }
    Ok(packet)
}

/// Parse a V1 frame body: size and command bytes, optional JUMBO length
/// escape, optional V2 tunnel, payload, XOR checksum.
async fn parse_v1(
    transport: &mut dyn Transport,
    rx_buf: &mut [u8; RX_BUFFER_SIZE],
    read_retries: u32,
    direction: Direction,
) -> Result<MspPacket> {
    let mut head = [0u8; 2];
    read_exact(transport, &mut head, read_retries).await?;

    let mut checksum = xor_checksum(&head, 0);
    let mut payload_size = head[0] as usize;
    let command = head[1];

    if head[0] == JUMBO_SIZE_MARKER {
        // JUMBO: the true 16-bit length sits right after the command byte.
        let mut len = [0u8; 2];
        read_exact(transport, &mut len, read_retries).await?;
        checksum = xor_checksum(&len, checksum);
        payload_size = u16::from_le_bytes(len) as usize;
    }

    if command == V2_TUNNEL_COMMAND {
        // The V1 frame is only a tunnel; the payload is a complete V2 frame
        // minus the preamble. The inner CRC covers integrity, so the wrapper
        // XOR is abandoned and the trailing wrapper checksum byte is
        // consumed without validation.
        let packet = parse_v2(transport, rx_buf, read_retries, MspVersion::V1, direction).await?;

        let mut wrapper_checksum = [0u8; 1];
        read_exact(transport, &mut wrapper_checksum, read_retries).await?;
        return Ok(packet);
    }

    if payload_size > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size: payload_size,
            capacity: RX_BUFFER_SIZE,
        });
    }

    let frame = &mut rx_buf[..payload_size + 1];
    read_exact(transport, frame, read_retries).await?;

    let received = frame[payload_size];
    let computed = xor_checksum(&frame[..payload_size], checksum);

    let packet = MspPacket {
        version: MspVersion::V1,
        direction,
        flag: 0,
        command: command as u16,
        payload: frame[..payload_size].to_vec(),
        checksum: received,
    };

    if received != computed {
        return Err(Error::BadChecksum { packet, computed });
    }
    Ok(packet)
}

/// Parse a V2 frame body: the five header bytes (flag, command, payload
/// length), payload, CRC8/DVB-S2.
///
/// `version` is the version of the outermost header: `V2` for a native
/// frame, `V1` when entered through the tunnel path.
async fn parse_v2(
    transport: &mut dyn Transport,
    rx_buf: &mut [u8; RX_BUFFER_SIZE],
    read_retries: u32,
    version: MspVersion,
    direction: Direction,
) -> Result<MspPacket> {
    let mut head = [0u8; 5];
    read_exact(transport, &mut head, read_retries).await?;

    let checksum_seed = crc8_dvb_s2(&head, 0);
    let flag = head[0];
    let command = u16::from_le_bytes([head[1], head[2]]);
    let payload_size = u16::from_le_bytes([head[3], head[4]]) as usize;

    if payload_size > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size: payload_size,
            capacity: RX_BUFFER_SIZE,
        });
    }

    let frame = &mut rx_buf[..payload_size + 1];
    read_exact(transport, frame, read_retries).await?;

    let received = frame[payload_size];
    let computed = crc8_dvb_s2(&frame[..payload_size], checksum_seed);

    let packet = MspPacket {
        version,
        direction,
        flag,
        command,
        payload: frame[..payload_size].to_vec(),
        checksum: received,
    };

    if received != computed {
        return Err(Error::BadChecksum { packet, computed });
    }
    Ok(packet)
}
