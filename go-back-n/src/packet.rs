//! Wire format for data packets.
//!
//! Every frame on the data conduit is a [`Packet`] serialised as its payload
//! followed by a fixed-width sequence number:
//!
//! ```text
//! +--------------------------------------+-------------------------+
//! |  Payload (packet_capacity - width)   |  Sequence Number (width) |
//! +--------------------------------------+-------------------------+
//! ```
//!
//! The sequence number is **big-endian** and occupies exactly `width` bytes
//! (1..=4).  Only the final packet of a stream may carry a shorter payload.
//!
//! No I/O happens here; this is pure data transformation.

use crate::error::PacketError;

/// Sequence number assigned densely from 0 in production order.
pub type SeqNum = u32;

/// A unit of transmission: payload plus its sequence number.
///
/// Created once by [`crate::packetizer::split`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub seq: SeqNum,
    pub payload: Vec<u8>,
}

/// Largest sequence number representable in `width` bytes.
pub fn max_seq(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

impl Packet {
    pub fn new(seq: SeqNum, payload: Vec<u8>) -> Self {
        Self { seq, payload }
    }

    /// Serialise into `payload ‖ seq` with a `width`-byte trailer.
    ///
    /// Fails if `seq` does not fit in `width` bytes.
    pub fn encode(&self, width: usize) -> Result<Vec<u8>, PacketError> {
        if u64::from(self.seq) > max_seq(width) {
            return Err(PacketError::SequenceOverflow {
                seq: u64::from(self.seq),
                width,
            });
        }
        let seq_bytes = self.seq.to_be_bytes();
        let mut buf = Vec::with_capacity(self.payload.len() + width);
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&seq_bytes[seq_bytes.len() - width..]);
        Ok(buf)
    }

    /// Parse a frame produced by [`Packet::encode`] with the same `width`.
    pub fn decode(buf: &[u8], width: usize) -> Result<Self, PacketError> {
        if buf.len() < width {
            return Err(PacketError::TooShort {
                len: buf.len(),
                width,
            });
        }
        let (payload, trailer) = buf.split_at(buf.len() - width);
        let seq = trailer
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | SeqNum::from(b));
        Ok(Self {
            seq,
            payload: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_is_big_endian() {
        let bytes = Packet::new(0x0102, b"hi".to_vec()).encode(2).unwrap();
        assert_eq!(bytes, vec![b'h', b'i', 0x01, 0x02]);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let pkt = Packet::new(300, b"hello".to_vec());
        let decoded = Packet::decode(&pkt.encode(2).unwrap(), 2).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn empty_payload_frame_is_only_the_trailer() {
        let bytes = Packet::new(7, Vec::new()).encode(1).unwrap();
        assert_eq!(bytes, vec![7]);
        assert_eq!(Packet::decode(&bytes, 1).unwrap().payload, Vec::<u8>::new());
    }

    #[test]
    fn decode_short_frame_returns_error() {
        assert_eq!(
            Packet::decode(&[0x01], 2),
            Err(PacketError::TooShort { len: 1, width: 2 })
        );
    }

    #[test]
    fn encode_overflowing_seq_returns_error() {
        let err = Packet::new(256, vec![]).encode(1).unwrap_err();
        assert_eq!(err, PacketError::SequenceOverflow { seq: 256, width: 1 });
    }

    #[test]
    fn four_byte_field_holds_u32_max() {
        let pkt = Packet::new(u32::MAX, b"x".to_vec());
        let bytes = pkt.encode(4).unwrap();
        assert_eq!(&bytes[1..], &[0xff; 4]);
        assert_eq!(Packet::decode(&bytes, 4).unwrap(), pkt);
    }

    #[test]
    fn max_seq_per_width() {
        assert_eq!(max_seq(1), 0xff);
        assert_eq!(max_seq(2), 0xffff);
        assert_eq!(max_seq(4), 0xffff_ffff);
    }
}
