//! Splits a byte stream into numbered packets.

use crate::error::GbnError;
use crate::packet::{max_seq, Packet, SeqNum};

/// Split `data` into consecutive packets of `packet_capacity - seq_width`
/// payload bytes, numbered 0, 1, 2, … in order.
///
/// The final packet may be shorter.  An empty input yields no packets.
/// Fails with [`GbnError::Configuration`] if `packet_capacity` does not exceed
/// `seq_width`, or if the stream needs more packets than a `seq_width`-byte
/// counter can number.
pub fn split(data: &[u8], packet_capacity: usize, seq_width: usize) -> Result<Vec<Packet>, GbnError> {
    if packet_capacity <= seq_width {
        return Err(GbnError::config(format!(
            "packet capacity ({packet_capacity}) must exceed sequence field width ({seq_width})"
        )));
    }
    let chunk = packet_capacity - seq_width;
    let count = data.len().div_ceil(chunk);

    if count > 0 && (count - 1) as u64 > max_seq(seq_width).min(u64::from(SeqNum::MAX)) {
        return Err(GbnError::config(format!(
            "{count} packets exceed the range of a {seq_width}-byte sequence field"
        )));
    }

    Ok(data
        .chunks(chunk)
        .enumerate()
        .map(|(i, payload)| Packet::new(i as SeqNum, payload.to_vec()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(packets: &[Packet]) -> Vec<u8> {
        packets.iter().flat_map(|p| p.payload.iter().copied()).collect()
    }

    #[test]
    fn hello_one_byte_per_packet() {
        let packets = split(b"HELLO", 3, 2).unwrap();
        assert_eq!(packets.len(), 5);
        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.seq, i as SeqNum);
            assert_eq!(p.payload.len(), 1);
        }
        assert_eq!(reassemble(&packets), b"HELLO");
    }

    #[test]
    fn exact_multiple_has_no_short_packet() {
        let packets = split(&[0xAB; 12], 6, 2).unwrap();
        assert_eq!(packets.len(), 3);
        assert!(packets.iter().all(|p| p.payload.len() == 4));
    }

    #[test]
    fn one_extra_byte_yields_short_final_packet() {
        let data: Vec<u8> = (0..13).collect();
        let packets = split(&data, 6, 2).unwrap();
        assert_eq!(packets.len(), 4);
        assert_eq!(packets[3].payload, vec![12]);
        assert_eq!(reassemble(&packets), data);
    }

    #[test]
    fn empty_input_yields_no_packets() {
        assert!(split(b"", 8, 2).unwrap().is_empty());
    }

    #[test]
    fn capacity_not_exceeding_width_is_config_error() {
        assert!(matches!(split(b"abc", 2, 2), Err(GbnError::Configuration(_))));
        assert!(matches!(split(b"abc", 1, 2), Err(GbnError::Configuration(_))));
    }

    #[test]
    fn stream_longer_than_counter_range_rejected() {
        // 1-byte field numbers 256 packets (0..=255); 257 one-byte payloads overflow.
        assert!(split(&[0u8; 256], 2, 1).is_ok());
        assert!(matches!(
            split(&[0u8; 257], 2, 1),
            Err(GbnError::Configuration(_))
        ));
    }

    #[test]
    fn deterministic() {
        let data = b"the quick brown fox";
        assert_eq!(split(data, 5, 1).unwrap(), split(data, 5, 1).unwrap());
    }
}
