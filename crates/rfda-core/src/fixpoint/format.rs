//! # Fixed-Point Number Formatting
//!
//! Renders quantized values as decimal, two's-complement hexadecimal
//! or binary words, or canonical signed digit strings, and parses the
//! same formats back to real values. Rendering always quantizes first,
//! so the printed word is exactly the code the hardware would hold;
//! parsing is tolerant and turns malformed input into zero with a
//! warning instead of failing.

use tracing::warn;

use super::csd;
use super::quantizer::{NumBase, Quantizer};

impl Quantizer {
    /// Render a value in the configured base.
    pub fn format_value(&mut self, x: f64) -> String {
        self.to_base(x, self.config().base)
    }

    /// Parse a string in the configured base.
    pub fn parse_value(&mut self, s: &str) -> f64 {
        self.from_base(s, self.config().base)
    }

    /// Render a value in an explicit base.
    ///
    /// `Dec` prints the quantized value in real-world units; `Hex` and
    /// `Bin` print the two's-complement code zero-padded to the full
    /// wordlength; `Csd` prints the signed digit form of the code;
    /// `Float` prints the value as-is without quantization.
    pub fn to_base(&mut self, x: f64, base: NumBase) -> String {
        let w = self.total_bits();
        match base {
            NumBase::Dec => {
                let y = self.quantize(x);
                format_sig(y, digits_for(NumBase::Dec, w), self.wf())
            }
            NumBase::Float => format_sig(x, digits_for(NumBase::Float, w), self.wf()),
            NumBase::Hex => {
                let code = self.quantize_to_int(x);
                let word = (code as u64) & word_mask(w);
                format!("{word:0width$x}", width = digits_for(NumBase::Hex, w))
            }
            NumBase::Bin => {
                let code = self.quantize_to_int(x);
                let word = (code as u64) & word_mask(w);
                format!("{word:0width$b}", width = w as usize)
            }
            NumBase::Csd => {
                let code = self.quantize_to_int(x);
                format!("{:0>width$}", csd::to_csd(code), width = w as usize)
            }
        }
    }

    /// Parse a string in an explicit base back to a real value.
    ///
    /// Decimal input is re-quantized (and counts overflows like any
    /// quantization); hex, binary and CSD words are reinterpreted as
    /// two's-complement codes, wrapping words that are longer than the
    /// configured wordlength. Malformed input logs a warning and
    /// parses as zero.
    pub fn from_base(&mut self, s: &str, base: NumBase) -> f64 {
        match base {
            NumBase::Dec => {
                let v = parse_float_or_zero(s);
                self.quantize(v)
            }
            NumBase::Float => parse_float_or_zero(s),
            NumBase::Hex => self.code_to_value(parse_radix(s, 16)),
            NumBase::Bin => self.code_to_value(parse_radix(s, 2)),
            NumBase::Csd => {
                let code = match csd::from_csd(s) {
                    Ok(code) => Some(code as i128),
                    Err(e) => {
                        warn!(input = s, "{e}, using 0");
                        None
                    }
                };
                self.code_to_value(code)
            }
        }
    }

    /// Turn a raw integer code into the real-world value it represents,
    /// wrapping codes outside the configured word.
    fn code_to_value(&self, code: Option<i128>) -> f64 {
        match code {
            Some(code) => {
                let wrapped = wrap_to_word(code, self.total_bits());
                wrapped as f64 * self.lsb() / self.config().scale
            }
            None => 0.0,
        }
    }
}

/// Digit count used to render a word of `w` bits in `base`.
pub fn digits_for(base: NumBase, w: u32) -> usize {
    match base {
        NumBase::Dec | NumBase::Float => {
            (w as f64 * std::f64::consts::LOG10_2).ceil() as usize + 1
        }
        NumBase::Hex => ((w + 3) / 4) as usize,
        NumBase::Bin | NumBase::Csd => w as usize,
    }
}

fn word_mask(w: u32) -> u64 {
    if w >= 64 {
        u64::MAX
    } else {
        (1u64 << w) - 1
    }
}

/// Reinterpret an arbitrary integer as a `w` bit two's-complement code.
fn wrap_to_word(code: i128, w: u32) -> i64 {
    let span = 1i128 << w;
    let min = -(1i128 << (w - 1));
    ((code - min).rem_euclid(span) + min) as i64
}

fn parse_float_or_zero(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            warn!(input = s, "cannot parse as a number, using 0");
            0.0
        }
    }
}

fn parse_radix(s: &str, radix: u32) -> Option<i128> {
    match i128::from_str_radix(s.trim(), radix) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(input = s, radix, "cannot parse as an integer word, using 0");
            None
        }
    }
}

/// Format with `places` significant digits but never fewer fractional
/// digits than the grid needs, so on-grid values print exactly.
fn format_sig(v: f64, places: usize, wf: u32) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let places = places.max(1);
    let mag = v.abs().log10().floor() as i32;
    let decimals = (places as i32 - 1 - mag).max(0).max(wf as i32) as usize;
    let s = format!("{v:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::super::quantizer::{OverflowMode, QuantConfig, QuantMode, Quantizer};
    use super::*;

    fn quantizer(wi: u32, wf: u32) -> Quantizer {
        Quantizer::new(QuantConfig {
            wi,
            wf,
            ovfl: OverflowMode::Sat,
            quant: QuantMode::Round,
            ..QuantConfig::default()
        })
    }

    // -------------------------------------------------------------- rendering

    #[test]
    fn test_padded_twos_complement() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.to_base(0.875, NumBase::Hex), "7");
        assert_eq!(q.to_base(-1.0, NumBase::Hex), "8");
        assert_eq!(q.to_base(0.875, NumBase::Bin), "0111");
        assert_eq!(q.to_base(-0.125, NumBase::Bin), "1111");
        assert_eq!(q.to_base(0.125, NumBase::Bin), "0001");
    }

    #[test]
    fn test_digit_counts() {
        let mut q = quantizer(6, 1); // 8 bits -> 2 hex digits
        assert_eq!(q.to_base(1.0, NumBase::Hex), "02");
        assert_eq!(q.to_base(-1.0, NumBase::Hex), "fe");
        assert_eq!(q.to_base(0.5, NumBase::Bin), "00000001");
    }

    #[test]
    fn test_zero_in_every_base() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.to_base(0.0, NumBase::Dec), "0");
        assert_eq!(q.to_base(0.0, NumBase::Hex), "0");
        assert_eq!(q.to_base(0.0, NumBase::Bin), "0000");
        assert_eq!(q.to_base(0.0, NumBase::Csd), "0000");
        assert_eq!(q.to_base(0.0, NumBase::Float), "0");
    }

    #[test]
    fn test_render_quantizes() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.to_base(2.0, NumBase::Hex), "7", "saturates to the top code first");
        assert_eq!(q.overflow_count(), 1);
    }

    #[test]
    fn test_dec_exact_grid() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.to_base(0.875, NumBase::Dec), "0.875");
        assert_eq!(q.to_base(-0.5, NumBase::Dec), "-0.5");
        assert_eq!(q.to_base(1.1, NumBase::Dec), "0.875");
    }

    #[test]
    fn test_float_passthrough() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.to_base(0.3, NumBase::Float), "0.3");
        assert_eq!(q.overflow_count(), 0);
        assert_eq!(q.from_base("0.3", NumBase::Float), 0.3);
    }

    // -------------------------------------------------------------- round trips

    #[test]
    fn test_dec_round_trip() {
        let mut q = quantizer(1, 3);
        for code in q.int_min()..=q.int_max() {
            let v = code as f64 * q.lsb();
            let s = q.to_base(v, NumBase::Dec);
            assert_eq!(q.from_base(&s, NumBase::Dec), v, "code {code} via '{s}'");
        }
    }

    #[test]
    fn test_hex_round_trip() {
        let mut q = quantizer(1, 3);
        for code in q.int_min()..=q.int_max() {
            let v = code as f64 * q.lsb();
            let s = q.to_base(v, NumBase::Hex);
            assert_eq!(q.from_base(&s, NumBase::Hex), v, "code {code} via '{s}'");
        }
    }

    #[test]
    fn test_bin_round_trip() {
        let mut q = quantizer(1, 3);
        for code in q.int_min()..=q.int_max() {
            let v = code as f64 * q.lsb();
            let s = q.to_base(v, NumBase::Bin);
            assert_eq!(q.from_base(&s, NumBase::Bin), v, "code {code} via '{s}'");
        }
    }

    #[test]
    fn test_csd_round_trip() {
        let mut q = quantizer(1, 3);
        for code in q.int_min()..=q.int_max() {
            let v = code as f64 * q.lsb();
            let s = q.to_base(v, NumBase::Csd);
            for pair in s.chars().collect::<Vec<_>>().windows(2) {
                assert!(pair[0] == '0' || pair[1] == '0', "'{s}' is not canonical");
            }
            assert_eq!(q.from_base(&s, NumBase::Csd), v, "code {code} via '{s}'");
        }
    }

    #[test]
    fn test_scaled_round_trip() {
        let mut q = Quantizer::new(QuantConfig {
            wi: 0,
            wf: 4,
            scale: 2.0,
            ..QuantConfig::default()
        });
        for code in q.int_min()..=q.int_max() {
            let v = code as f64 * q.lsb() / 2.0;
            let s = q.to_base(v, NumBase::Hex);
            assert_eq!(q.from_base(&s, NumBase::Hex), v, "code {code} via '{s}'");
        }
    }

    // -------------------------------------------------------------- parsing

    #[test]
    fn test_overlong_wraps() {
        let mut q = quantizer(0, 3);
        // 0x1f = 31 wraps to -1 in a 4 bit word
        assert_eq!(q.from_base("1f", NumBase::Hex), -0.125);
        assert_eq!(q.from_base("10111", NumBase::Bin), 0.875);
    }

    #[test]
    fn test_signed_radix_input() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.from_base("-3", NumBase::Hex), -0.375);
    }

    #[test]
    fn test_malformed_to_zero() {
        let mut q = quantizer(0, 3);
        assert_eq!(q.from_base("zz", NumBase::Hex), 0.0);
        assert_eq!(q.from_base("12..3", NumBase::Dec), 0.0);
        assert_eq!(q.from_base("+1-", NumBase::Csd), 0.0);
        assert_eq!(q.from_base("", NumBase::Bin), 0.0);
    }

    #[test]
    fn test_configured_base() {
        let mut q = quantizer(0, 3);
        let update = crate::fixpoint::QuantUpdate {
            base: Some("hex".into()),
            ..Default::default()
        };
        q.set_options(&update);
        assert_eq!(q.format_value(0.875), "7");
        assert_eq!(q.parse_value("7"), 0.875);
    }
}
