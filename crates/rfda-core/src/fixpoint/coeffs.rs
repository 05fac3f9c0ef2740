//! Coefficient quantization for fixpoint filter realizations.

use serde::{Deserialize, Serialize};

use super::quantizer::{NumBase, Quantizer};
use crate::types::BaCoeffs;

/// A coefficient set quantized for a fixpoint realization.
///
/// Holds both the quantized real-world values (for response analysis)
/// and the raw integer codes on the `2^-wf` grid (for HDL export),
/// together with the word format they were quantized to. The leading
/// denominator coefficient is kept at its exact value: a normalized
/// `a[0] = 1` is structural in the difference equation and not a
/// stored hardware word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedCoeffs {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
    pub b_codes: Vec<i64>,
    pub a_codes: Vec<i64>,
    pub wi: u32,
    pub wf: u32,
    pub scale: f64,
    pub base: NumBase,
    /// Overflow events recorded while quantizing this set.
    pub overflows: u64,
}

/// Quantize a transfer function with the given quantizer settings.
pub fn quantize_coeffs(ba: &BaCoeffs, q: &mut Quantizer) -> QuantizedCoeffs {
    let before = q.overflow_count();
    let lsb = q.lsb();
    let scale = q.config().scale;

    let mut b = Vec::with_capacity(ba.b.len());
    let mut b_codes = Vec::with_capacity(ba.b.len());
    for &c in &ba.b {
        let code = q.quantize_to_int(c);
        b_codes.push(code);
        b.push(code as f64 * lsb / scale);
    }

    let mut a = Vec::with_capacity(ba.a.len());
    let mut a_codes = Vec::with_capacity(ba.a.len());
    for (i, &c) in ba.a.iter().enumerate() {
        if i == 0 {
            a.push(c);
            a_codes.push(c.round() as i64);
        } else {
            let code = q.quantize_to_int(c);
            a_codes.push(code);
            a.push(code as f64 * lsb / scale);
        }
    }

    let cfg = *q.config();
    QuantizedCoeffs {
        b,
        a,
        b_codes,
        a_codes,
        wi: cfg.wi,
        wf: cfg.wf,
        scale: cfg.scale,
        base: cfg.base,
        overflows: q.overflow_count() - before,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixpoint::{OverflowMode, QuantConfig, QuantMode};

    fn quantizer() -> Quantizer {
        Quantizer::new(QuantConfig {
            wi: 0,
            wf: 3,
            ovfl: OverflowMode::Sat,
            quant: QuantMode::Round,
            ..QuantConfig::default()
        })
    }

    #[test]
    fn test_codes_match_values() {
        let ba = BaCoeffs::fir(vec![0.2, 0.5, 0.2]);
        let mut q = quantizer();
        let qc = quantize_coeffs(&ba, &mut q);

        assert_eq!(qc.b_codes, vec![2, 4, 2]);
        assert_eq!(qc.b, vec![0.25, 0.5, 0.25]);
        for (&code, &v) in qc.b_codes.iter().zip(&qc.b) {
            assert_eq!(code as f64 * 0.125, v);
        }
        assert_eq!(qc.overflows, 0);
    }

    #[test]
    fn test_leading_a_untouched() {
        let ba = BaCoeffs::new(vec![0.25, 0.5, 0.25], vec![1.0, -0.4, 0.3]);
        let mut q = quantizer();
        let qc = quantize_coeffs(&ba, &mut q);

        assert_eq!(qc.a[0], 1.0, "a0 must not saturate to the top code");
        assert_eq!(qc.a_codes[0], 1);
        assert_eq!(qc.a[1], -0.375);
        assert_eq!(qc.a[2], 0.25);
        assert_eq!(qc.overflows, 0, "a0 must not count as an overflow either");
    }

    #[test]
    fn test_overflow_report() {
        let ba = BaCoeffs::fir(vec![1.5, -2.0, 0.5]);
        let mut q = quantizer();
        let qc = quantize_coeffs(&ba, &mut q);

        assert_eq!(qc.b, vec![0.875, -1.0, 0.5]);
        assert_eq!(qc.overflows, 2);
        assert_eq!(q.overflow_count(), 2, "events stay on the quantizer's counter too");
    }

    #[test]
    fn test_word_format() {
        let ba = BaCoeffs::fir(vec![0.5]);
        let mut q = quantizer();
        let qc = quantize_coeffs(&ba, &mut q);
        assert_eq!((qc.wi, qc.wf), (0, 3));
        assert_eq!(qc.scale, 1.0);
        assert_eq!(qc.base, NumBase::Dec);
    }
}
