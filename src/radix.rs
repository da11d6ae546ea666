//! Fixed-alphabet positional encodings for non-negative integers (N62/N36).

use crate::error::AppError;

/// Digits, upper case and lower case letters.
pub const N62_CHARS: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];

/// Digits and lower case letters.
pub const N36_CHARS: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// N62 length of the largest representable i64.
pub const LONG_N62_LEN: usize = 11;

/// N36 length of the largest representable i64.
pub const LONG_N36_LEN: usize = 13;

// Least-significant symbol first; caller reverses.
fn to_digits(mut n: i64, chars: &[char]) -> Vec<char> {
    let base = chars.len() as i64;
    let mut out = Vec::new();
    while n > 0 {
        out.push(chars[(n % base) as usize]);
        n /= base;
    }
    out
}

fn encode(n: i64, chars: &[char]) -> String {
    let mut digits = to_digits(n, chars);
    digits.reverse();
    digits.into_iter().collect()
}

fn encode_padded(n: i64, chars: &[char], min_len: usize) -> String {
    let mut digits = to_digits(n, chars);
    while digits.len() < min_len {
        digits.push('0');
    }
    digits.reverse();
    digits.into_iter().collect()
}

fn decode(s: &str, chars: &[char]) -> Result<i64, AppError> {
    let base = chars.len() as i64;
    let mut n: i64 = 0;
    for c in s.chars() {
        let idx = chars
            .iter()
            .position(|&d| d == c)
            .ok_or(AppError::InvalidDigit(c))?;
        n = n
            .checked_mul(base)
            .and_then(|n| n.checked_add(idx as i64))
            .ok_or_else(|| AppError::BadRequest("value out of range".into()))?;
    }
    Ok(n)
}

/// Encode as N62. Zero and negative values encode as the empty string.
pub fn to_n62(n: i64) -> String {
    encode(n, &N62_CHARS)
}

/// Encode as N62, left-padded with '0' up to `min_len` symbols.
pub fn to_n62_padded(n: i64, min_len: usize) -> String {
    encode_padded(n, &N62_CHARS, min_len)
}

/// Encode as N36. Zero and negative values encode as the empty string.
pub fn to_n36(n: i64) -> String {
    encode(n, &N36_CHARS)
}

/// Encode as N36, left-padded with '0' up to `min_len` symbols.
pub fn to_n36_padded(n: i64, min_len: usize) -> String {
    encode_padded(n, &N36_CHARS, min_len)
}

/// Decode an N62 string. A symbol outside the alphabet is an error, not a skip.
pub fn from_n62(s: &str) -> Result<i64, AppError> {
    decode(s, &N62_CHARS)
}

/// Decode an N36 string. A symbol outside the alphabet is an error, not a skip.
pub fn from_n36(s: &str) -> Result<i64, AppError> {
    decode(s, &N36_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_both_alphabets() {
        let samples: &[i64] = &[
            1,
            9,
            10,
            35,
            36,
            61,
            62,
            1000,
            123_456_789,
            1_000_000_000_000,
            i64::MAX,
        ];
        for &n in samples {
            assert_eq!(from_n62(&to_n62(n)).unwrap(), n, "n62 {}", n);
            assert_eq!(from_n36(&to_n36(n)).unwrap(), n, "n36 {}", n);
        }
    }

    #[test]
    fn round_trip_sweep() {
        for n in (0..2_000_000_i64).step_by(7919) {
            assert_eq!(from_n62(&to_n62_padded(n, 1)).unwrap(), n);
            assert_eq!(from_n36(&to_n36_padded(n, 1)).unwrap(), n);
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(to_n62(61), "z");
        assert_eq!(to_n62(62), "10");
        assert_eq!(to_n36(35), "z");
        assert_eq!(to_n36(36), "10");
        assert_eq!(from_n62("z").unwrap(), 61);
        assert_eq!(from_n36("10").unwrap(), 36);
    }

    // The unpadded encoding of zero is the empty string; callers wanting a
    // symbol for zero must request a minimum length.
    #[test]
    fn zero_encodes_empty_unless_padded() {
        assert_eq!(to_n62(0), "");
        assert_eq!(to_n36(0), "");
        assert_eq!(to_n62_padded(0, 1), "0");
        assert_eq!(from_n62("").unwrap(), 0);
        assert_eq!(from_n62("0").unwrap(), 0);
    }

    #[test]
    fn padding_is_most_significant_zeros() {
        let s = to_n62_padded(61, 4);
        assert_eq!(s, "000z");
        assert!(s.len() >= 4);
        assert_eq!(from_n62(&s).unwrap(), 61);
        assert_eq!(to_n36_padded(37, 4), "0011");
        // already long enough: no truncation
        assert_eq!(to_n62_padded(62 * 62, 2), "100");
    }

    #[test]
    fn max_length_constants_hold() {
        assert_eq!(to_n62(i64::MAX).len(), LONG_N62_LEN);
        assert_eq!(to_n36(i64::MAX).len(), LONG_N36_LEN);
    }

    #[test]
    fn decode_past_the_i64_range_is_an_error() {
        // one symbol longer than the longest representable value
        let err = from_n62(&"z".repeat(LONG_N62_LEN + 1)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = from_n36(&"z".repeat(LONG_N36_LEN + 1)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        // the largest valid value still round-trips
        assert_eq!(from_n62(&to_n62(i64::MAX)).unwrap(), i64::MAX);
        assert_eq!(from_n36(&to_n36(i64::MAX)).unwrap(), i64::MAX);
    }

    #[test]
    fn invalid_digit_is_an_error() {
        match from_n62("abc$") {
            Err(AppError::InvalidDigit(c)) => assert_eq!(c, '$'),
            other => panic!("expected InvalidDigit, got {:?}", other),
        }
        // upper case is not part of the 36-symbol alphabet
        match from_n36("aBc") {
            Err(AppError::InvalidDigit(c)) => assert_eq!(c, 'B'),
            other => panic!("expected InvalidDigit, got {:?}", other),
        }
    }
}
