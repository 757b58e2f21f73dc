//! Frame checksum
//!
//! A single additive byte: the sum of every byte value, modulo 256.

/// Compute the checksum byte over `data`.
///
/// The caller decides what to include; the frame builder passes everything
/// after the leading `%` marker up to and including the line ending that
/// precedes the footer.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(checksum(b""), 0);
    }

    #[test]
    fn test_checksum_small_sum() {
        // 'A' + 'B' = 65 + 66
        assert_eq!(checksum(b"AB"), 131);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xff, 0x01]), 0);
        assert_eq!(checksum(&[0xff, 0xff, 0x03]), 0x01);
    }

    proptest! {
        #[test]
        fn prop_checksum_matches_sum_mod_256(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let expected = (data.iter().map(|&b| b as u64).sum::<u64>() % 256) as u8;
            prop_assert_eq!(checksum(&data), expected);
            prop_assert_eq!(checksum(&data), checksum(&data));
        }

        #[test]
        fn prop_checksum_is_order_independent(mut data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let before = checksum(&data);
            data.reverse();
            prop_assert_eq!(checksum(&data), before);
        }
    }
}
