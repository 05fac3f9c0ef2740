//! # Canonical Signed Digit Encoding
//!
//! Converts integers to and from canonical signed digit (CSD) strings
//! over the digits `+`, `0` and `-`, most significant digit first.
//! The canonical (non-adjacent) form never places two nonzero digits
//! next to each other and uses the minimum number of nonzero digits,
//! which is what makes it attractive for multiplierless filter
//! hardware: every nonzero digit costs one adder.

/// Errors from [`from_csd`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsdError {
    #[error("invalid CSD digit '{0}'")]
    Digit(char),
    #[error("empty CSD string")]
    Empty,
    #[error("CSD string exceeds the 64 bit integer range")]
    Range,
}

/// Encode an integer as a canonical signed digit string.
///
/// Zero encodes as `"0"`; all other values start with a nonzero digit.
pub fn to_csd(value: i64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut v = value as i128;
    let mut digits: Vec<i8> = Vec::new();
    while v != 0 {
        if v & 1 == 1 {
            // 2 - (v mod 4) is +1 or -1 and leaves v +- 1 divisible by 4,
            // which is what forces the next digit to zero.
            let d = 2 - v.rem_euclid(4) as i8;
            digits.push(d);
            v -= d as i128;
        } else {
            digits.push(0);
        }
        v /= 2;
    }
    digits
        .iter()
        .rev()
        .map(|d| match d {
            1 => '+',
            -1 => '-',
            _ => '0',
        })
        .collect()
}

/// Decode a signed digit string back to an integer.
///
/// Interior whitespace is ignored; any digit other than `+`, `0` or
/// `-` is rejected. The input does not have to be canonical, only the
/// encoder guarantees the non-adjacent form.
pub fn from_csd(s: &str) -> Result<i64, CsdError> {
    let mut acc: i128 = 0;
    let mut seen = false;
    for c in s.trim().chars() {
        let d: i128 = match c {
            '+' => 1,
            '-' => -1,
            '0' => 0,
            c if c.is_whitespace() => continue,
            other => return Err(CsdError::Digit(other)),
        };
        acc = acc * 2 + d;
        seen = true;
        if acc.unsigned_abs() > u64::MAX as u128 {
            return Err(CsdError::Range);
        }
    }
    if !seen {
        return Err(CsdError::Empty);
    }
    acc.try_into().map_err(|_| CsdError::Range)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_known_encodings() {
        assert_eq!(to_csd(0), "0");
        assert_eq!(to_csd(1), "+");
        assert_eq!(to_csd(2), "+0");
        assert_eq!(to_csd(3), "+0-");
        assert_eq!(to_csd(6), "+0-0");
        assert_eq!(to_csd(7), "+00-");
        assert_eq!(to_csd(-1), "-");
        assert_eq!(to_csd(-3), "-0+");
        assert_eq!(to_csd(-8), "-000");
    }

    #[test]
    fn test_canonical_property() {
        for v in -4096..=4096i64 {
            let s = to_csd(v);
            let digits: Vec<char> = s.chars().collect();
            for pair in digits.windows(2) {
                assert!(
                    pair[0] == '0' || pair[1] == '0',
                    "{v} encoded as '{s}' with adjacent nonzero digits"
                );
            }
        }
    }

    #[test]
    fn test_decode_inverts_encode() {
        for v in -4096..=4096i64 {
            assert_eq!(from_csd(&to_csd(v)), Ok(v));
        }
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let v: i64 = rng.gen();
            assert_eq!(from_csd(&to_csd(v)), Ok(v));
        }
    }

    #[test]
    fn test_decode_padding() {
        assert_eq!(from_csd("00+0-"), Ok(3));
        assert_eq!(from_csd("  +0- "), Ok(3));
        assert_eq!(from_csd("+ 0 -"), Ok(3));
    }

    #[test]
    fn test_decode_garbage() {
        assert_eq!(from_csd("+1-"), Err(CsdError::Digit('1')));
        assert_eq!(from_csd("abc"), Err(CsdError::Digit('a')));
        assert_eq!(from_csd(""), Err(CsdError::Empty));
        assert_eq!(from_csd("   "), Err(CsdError::Empty));
    }

    #[test]
    fn test_decode_overflow() {
        let huge = "+".to_string() + &"0".repeat(80);
        assert_eq!(from_csd(&huge), Err(CsdError::Range));
    }
}
