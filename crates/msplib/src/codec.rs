//! MSP request frame encoder.
//!
//! Builds complete V1 and V2 request frames ready for a single transport
//! write. Encoding is pure byte-pushing; checksums come from
//! [`crate::checksum`].
//!
//! # Frame formats
//!
//! ```text
//! V1:    '$' 'M' '<' SIZE CMD [LEN_LO LEN_HI] PAYLOAD... CHKSUM
//! V2:    '$' 'X' '<' FLAG CMD_LO CMD_HI LEN_LO LEN_HI PAYLOAD... CHKSUM
//! ```
//!
//! A V1 payload longer than 254 bytes is sent as a JUMBO frame: the size
//! byte is escaped to 255 and the true 16-bit length follows the command
//! byte, little-endian. The V1 checksum is an XOR over everything after the
//! 3-byte preamble; the V2 checksum is a CRC8/DVB-S2 over the same span.
//!
//! V2-in-V1 encapsulation is accepted on receive (see [`crate::parser`]) but
//! never emitted.

use bytes::{BufMut, BytesMut};

use msplib_core::packet::{Direction, MspVersion, FRAME_SYNC};

use crate::checksum::{crc8_dvb_s2, xor_checksum};

/// Largest V1 payload that fits the plain one-byte size field.
pub const V1_MAX_PLAIN_PAYLOAD: usize = 254;

/// V1 size byte marking a JUMBO frame with a 16-bit length following the
/// command byte.
pub const JUMBO_SIZE_MARKER: u8 = 255;

/// V1 command number reserved for tunneling a V2 frame in the V1 payload.
pub const V2_TUNNEL_COMMAND: u8 = 255;

/// Encode an MSP V1 request frame.
///
/// Payloads longer than [`V1_MAX_PLAIN_PAYLOAD`] bytes produce a JUMBO
/// frame. The checksum seeds from the size byte as emitted, so a JUMBO
/// frame folds 255 rather than the truncated length.
///
/// The payload length must fit the 16-bit JUMBO length field; the device
/// layer enforces this before calling.
///
/// # Example
///
/// ```
/// use msplib::codec::encode_v1;
///
/// // MSP_ATTITUDE (108) request with no payload.
/// assert_eq!(encode_v1(108, &[]), vec![0x24, 0x4D, 0x3C, 0x00, 0x6C, 0x6C]);
/// ```
pub fn encode_v1(command: u8, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= u16::MAX as usize);

    let jumbo = payload.len() > V1_MAX_PLAIN_PAYLOAD;
    let size_byte = if jumbo {
        JUMBO_SIZE_MARKER
    } else {
        payload.len() as u8
    };

    let mut buf = BytesMut::with_capacity(6 + if jumbo { 2 } else { 0 } + payload.len());
    buf.put_u8(FRAME_SYNC);
    buf.put_u8(MspVersion::V1.wire_char());
    buf.put_u8(Direction::Request.wire_char());
    buf.put_u8(size_byte);
    buf.put_u8(command);

    let mut checksum = size_byte ^ command;
    if jumbo {
        let len = payload.len() as u16;
        buf.put_u16_le(len);
        checksum = xor_checksum(&len.to_le_bytes(), checksum);
    }

    buf.put_slice(payload);
    checksum = xor_checksum(payload, checksum);
    buf.put_u8(checksum);

    buf.to_vec()
}

/// Encode an MSP V2 request frame.
///
/// The CRC8/DVB-S2 covers the five header bytes after the preamble (flag,
/// command, payload length) chained across the payload.
///
/// # Example
///
/// ```
/// use msplib::codec::encode_v2;
///
/// assert_eq!(
///     encode_v2(0, 0x1F40, &[]),
///     vec![0x24, 0x58, 0x3C, 0x00, 0x40, 0x1F, 0x00, 0x00, 0x1B]
/// );
/// ```
pub fn encode_v2(flag: u8, command: u16, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= u16::MAX as usize);

    let mut buf = BytesMut::with_capacity(9 + payload.len());
    buf.put_u8(FRAME_SYNC);
    buf.put_u8(MspVersion::V2.wire_char());
    buf.put_u8(Direction::Request.wire_char());
    buf.put_u8(flag);
    buf.put_u16_le(command);
    buf.put_u16_le(payload.len() as u16);
    buf.put_slice(payload);

    let checksum = crc8_dvb_s2(payload, crc8_dvb_s2(&buf[3..8], 0));
    buf.put_u8(checksum);

    buf.to_vec()
}
