//! # Frequency Response Analysis
//!
//! Direct evaluation of transfer functions on the unit circle. The
//! grid runs from DC up to (but excluding) Nyquist, which is enough to
//! inspect designed magnitude and phase responses and to verify specs
//! in tests without pulling in an FFT.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Evaluate `H(z) = B(z)/A(z)` at `n_points` frequencies uniformly
/// spaced over `[0, f_s/2)`.
///
/// An empty denominator is treated as `[1.0]` (FIR).
pub fn freqz(b: &[f64], a: &[f64], n_points: usize) -> Vec<Complex64> {
    (0..n_points)
        .map(|k| {
            let w = PI * k as f64 / n_points as f64;
            response_at(b, a, w)
        })
        .collect()
}

/// Evaluate the response at a single absolute frequency.
pub fn freqz_at(b: &[f64], a: &[f64], f: f64, f_s: f64) -> Complex64 {
    response_at(b, a, 2.0 * PI * f / f_s)
}

/// Frequency grid matching [`freqz`], in absolute units.
pub fn frequencies(n_points: usize, f_s: f64) -> Vec<f64> {
    (0..n_points)
        .map(|k| k as f64 * f_s / (2.0 * n_points as f64))
        .collect()
}

/// Magnitudes of a response in dB, floored to avoid `-inf` at exact
/// zeros.
pub fn magnitude_db(h: &[Complex64]) -> Vec<f64> {
    h.iter().map(|c| to_db(c.norm())).collect()
}

/// Convert an amplitude ratio to dB, floored at -300 dB.
pub fn to_db(x: f64) -> f64 {
    20.0 * x.max(1e-15).log10()
}

fn response_at(b: &[f64], a: &[f64], w: f64) -> Complex64 {
    let zinv = Complex64::from_polar(1.0, -w);
    let num = horner(b, zinv);
    let den = if a.is_empty() {
        Complex64::new(1.0, 0.0)
    } else {
        horner(a, zinv)
    };
    num / den
}

/// Polynomial in `z^-1` evaluated by Horner's rule.
fn horner(coeffs: &[f64], zinv: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * zinv + c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dc_gain() {
        let b = [0.25, 0.25, 0.25, 0.25];
        let h0 = freqz_at(&b, &[1.0], 0.0, 1.0);
        assert_relative_eq!(h0.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(h0.im, 0.0, epsilon = 1e-12);

        let h0 = freqz_at(&[1.0, 1.0], &[1.0, 0.5], 0.0, 1.0);
        assert_relative_eq!(h0.re, 2.0 / 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_nyquist_null() {
        let b = [0.25, 0.25, 0.25, 0.25];
        let h = freqz_at(&b, &[1.0], 0.5, 1.0);
        assert!(h.norm() < 1e-12, "4 tap average must null alternating input");
    }

    #[test]
    fn test_grid_lengths() {
        let h = freqz(&[1.0], &[1.0], 256);
        let f = frequencies(256, 48_000.0);
        assert_eq!(h.len(), 256);
        assert_eq!(f.len(), 256);
        assert_eq!(f[0], 0.0);
        assert!(f[255] < 24_000.0, "grid must stop short of Nyquist");
    }

    #[test]
    fn test_allpass_flat() {
        for c in freqz(&[1.0], &[1.0], 64) {
            assert_relative_eq!(c.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_db_floor() {
        assert_relative_eq!(to_db(1.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(to_db(0.1), -20.0, epsilon = 1e-9);
        assert!(to_db(0.0) <= -299.0);
        assert!(magnitude_db(&[Complex64::new(0.0, 0.0)])[0] <= -299.0);
    }
}
