//! # Built-in Design Classes
//!
//! The design classes shipped with the crate: moving average and
//! windowed-sinc FIR, Butterworth IIR, and manual coefficient entry.
//! Each implements [`FilterDesign`](crate::design::FilterDesign) and is
//! registered by name in the [registry](crate::registry).

pub mod butterworth;
pub mod fir_window;
pub mod manual;
pub mod moving_average;
pub mod windows;

pub use butterworth::Butterworth;
pub use fir_window::FirWindow;
pub use manual::Manual;
pub use moving_average::MovingAverage;
pub use windows::Window;

use crate::types::Complex;
use tracing::warn;

/// Multiply two polynomials given as coefficient slices (convolution).
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Expand a set of roots into monic polynomial coefficients.
///
/// Complex roots are expected in conjugate pairs so the product is
/// real; leftover imaginary parts are dropped with a warning.
pub fn poly_from_roots(roots: &[Complex]) -> Vec<f64> {
    let mut poly = vec![Complex::new(1.0, 0.0)];
    for r in roots {
        let mut next = vec![Complex::new(0.0, 0.0); poly.len() + 1];
        for (i, &c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * r;
        }
        poly = next;
    }
    let residue = poly.iter().map(|c| c.im.abs()).fold(0.0, f64::max);
    if residue > 1e-8 {
        warn!(residue, "roots are not in conjugate pairs, dropping imaginary parts");
    }
    poly.iter().map(|c| c.re).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_convolve() {
        // (1 + x)(1 - x) = 1 - x^2
        assert_eq!(convolve(&[1.0, 1.0], &[1.0, -1.0]), vec![1.0, 0.0, -1.0]);
        // (1 + 2x)(3) = 3 + 6x
        assert_eq!(convolve(&[1.0, 2.0], &[3.0]), vec![3.0, 6.0]);
        assert_eq!(convolve(&[], &[1.0]), Vec::<f64>::new());
    }

    #[test]
    fn test_conjugate_pair() {
        let roots = [Complex::new(0.5, 0.5), Complex::new(0.5, -0.5)];
        let poly = poly_from_roots(&roots);
        // (x - (0.5+0.5i))(x - (0.5-0.5i)) = x^2 - x + 0.5
        assert_eq!(poly.len(), 3);
        assert_abs_diff_eq!(poly[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(poly[1], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(poly[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_real_roots() {
        let roots = [Complex::new(1.0, 0.0), Complex::new(-1.0, 0.0)];
        let poly = poly_from_roots(&roots);
        assert_eq!(poly, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_empty_roots() {
        assert_eq!(poly_from_roots(&[]), vec![1.0]);
    }
}
