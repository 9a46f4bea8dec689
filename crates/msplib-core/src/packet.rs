//! MSP packet and wire-level type definitions.
//!
//! An MSP frame on the wire starts with the sync byte `'$'`, a version
//! character (`'M'` for V1, `'X'` for V2), and a direction character, followed
//! by a version-specific header, the payload, and a one-byte checksum.
//! [`MspPacket`] is the decoded representation handed back to callers.

/// Sync byte marking the start of every MSP frame.
pub const FRAME_SYNC: u8 = b'$';

/// Size of the fixed receive buffer, in bytes.
pub const RX_BUFFER_SIZE: usize = 1024;

/// Largest payload a received frame may carry.
///
/// One byte of the receive buffer is reserved for the trailing checksum, so
/// the effective maximum is [`RX_BUFFER_SIZE`]` - 1`. Larger frames are
/// rejected with [`Error::PayloadTooLarge`](crate::Error::PayloadTooLarge)
/// rather than dynamically allocated.
pub const MAX_PAYLOAD_SIZE: usize = RX_BUFFER_SIZE - 1;

/// MSP protocol version, distinguished by the second header character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MspVersion {
    /// `'M'`: 8-bit command, 8-bit payload length (JUMBO-escapable), XOR checksum.
    V1,
    /// `'X'`: 16-bit command, 16-bit payload length, CRC8/DVB-S2 checksum.
    V2,
}

impl MspVersion {
    /// The version character as it appears on the wire.
    pub const fn wire_char(self) -> u8 {
        match self {
            MspVersion::V1 => b'M',
            MspVersion::V2 => b'X',
        }
    }

    /// Decode a wire version character. Returns `None` for anything other
    /// than `'M'` or `'X'`.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'M' => Some(MspVersion::V1),
            b'X' => Some(MspVersion::V2),
            _ => None,
        }
    }
}

/// Direction character of an MSP frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `'<'`: request, host to responder.
    Request,
    /// `'>'`: successful response, responder to host.
    Response,
    /// `'!'`: error response (NACK) from the responder.
    Error,
}

impl Direction {
    /// The direction character as it appears on the wire.
    pub const fn wire_char(self) -> u8 {
        match self {
            Direction::Request => b'<',
            Direction::Response => b'>',
            Direction::Error => b'!',
        }
    }

    /// Decode a wire direction character.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'<' => Some(Direction::Request),
            b'>' => Some(Direction::Response),
            b'!' => Some(Direction::Error),
            _ => None,
        }
    }
}

/// A decoded MSP packet.
///
/// Produced by the frame parser and returned from `get`/`set` transactions.
/// The payload is an owned copy of the bytes received; it stays valid after
/// the next receive operation on the same device.
///
/// For a V2 packet tunneled inside a V1 frame, `version` and `direction`
/// come from the V1 wrapper header while `flag`, `command`, `payload`, and
/// `checksum` come from the encapsulated V2 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MspPacket {
    /// Protocol version of the outermost frame header.
    pub version: MspVersion,
    /// Direction character of the frame.
    pub direction: Direction,
    /// V2 flag byte. Always zero for V1 frames, which have no flag field.
    pub flag: u8,
    /// Command (function) number. V1 commands occupy the 8-bit range.
    pub command: u16,
    /// Payload bytes, `0..=1023` of them.
    pub payload: Vec<u8>,
    /// Checksum byte as received on the wire.
    pub checksum: u8,
}

impl MspPacket {
    /// Payload length in bytes.
    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the responder flagged this packet as an error (NACK).
    pub fn is_error(&self) -> bool {
        self.direction == Direction::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_wire_chars_round_trip() {
        assert_eq!(MspVersion::V1.wire_char(), b'M');
        assert_eq!(MspVersion::V2.wire_char(), b'X');
        assert_eq!(MspVersion::from_wire(b'M'), Some(MspVersion::V1));
        assert_eq!(MspVersion::from_wire(b'X'), Some(MspVersion::V2));
        assert_eq!(MspVersion::from_wire(b'$'), None);
    }

    #[test]
    fn direction_wire_chars_round_trip() {
        for dir in [Direction::Request, Direction::Response, Direction::Error] {
            assert_eq!(Direction::from_wire(dir.wire_char()), Some(dir));
        }
        assert_eq!(Direction::from_wire(b'?'), None);
    }

    #[test]
    fn packet_error_flag() {
        let pkt = MspPacket {
            version: MspVersion::V1,
            direction: Direction::Error,
            flag: 0,
            command: 108,
            payload: vec![],
            checksum: 0x6C,
        };
        assert!(pkt.is_error());
        assert_eq!(pkt.payload_size(), 0);
    }

    #[test]
    fn buffer_capacity_constants() {
        assert_eq!(MAX_PAYLOAD_SIZE, RX_BUFFER_SIZE - 1);
    }
}
