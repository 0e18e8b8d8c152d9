//! Binary-coded decimal helpers.
//!
//! Every calendar and alarm register on the supported chips stores its value
//! as two packed decimal digits: tens in the high nibble, units in the low
//! nibble. Both conversions are only meaningful for 0-99; anything else
//! produces an unspecified byte rather than an error, so callers range-check
//! before encoding.

/// Converts a BCD byte (e.g. `0x59`) to its binary value (`59`).
#[must_use]
pub const fn to_binary(bcd: u8) -> u8 {
    bcd.wrapping_sub(6u8.wrapping_mul(bcd >> 4))
}

/// Converts a binary value (`59`) to its BCD byte (`0x59`).
#[must_use]
pub const fn to_bcd(value: u8) -> u8 {
    value.wrapping_add(6u8.wrapping_mul(value / 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcd_round_trip() {
        for value in 0..=99u8 {
            assert_eq!(to_binary(to_bcd(value)), value);
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(to_bcd(0), 0x00);
        assert_eq!(to_bcd(9), 0x09);
        assert_eq!(to_bcd(10), 0x10);
        assert_eq!(to_bcd(45), 0x45);
        assert_eq!(to_bcd(99), 0x99);

        assert_eq!(to_binary(0x00), 0);
        assert_eq!(to_binary(0x23), 23);
        assert_eq!(to_binary(0x59), 59);
        assert_eq!(to_binary(0x99), 99);
    }

    #[test]
    fn test_out_of_range_does_not_panic() {
        // Garbage in, garbage out.
        let _ = to_bcd(200);
        let _ = to_binary(0xFF);
    }
}
