//! # Window Functions
//!
//! Tapering windows for FIR design: rectangular, Hamming, Hann,
//! Blackman and Kaiser, plus the standard Kaiser estimation formulas
//! linking stopband attenuation, transition width and filter order.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A window function, parameterized where the shape has a knob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Rectangular,
    Hamming,
    Hann,
    Blackman,
    /// Kaiser window with the given beta.
    Kaiser(f64),
}

impl Default for Window {
    fn default() -> Self {
        Window::Hamming
    }
}

impl Window {
    pub fn name(&self) -> &'static str {
        match self {
            Window::Rectangular => "rectangular",
            Window::Hamming => "hamming",
            Window::Hann => "hann",
            Window::Blackman => "blackman",
            Window::Kaiser(_) => "kaiser",
        }
    }

    /// Window coefficients of the given length.
    ///
    /// Windows are symmetric with the peak in the middle; a length of
    /// one degenerates to `[1.0]`.
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let m = (len - 1) as f64;
        (0..len)
            .map(|k| {
                let x = k as f64 / m;
                match self {
                    Window::Rectangular => 1.0,
                    Window::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
                    Window::Hann => 0.5 * (1.0 - (2.0 * PI * x).cos()),
                    Window::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
                    }
                    Window::Kaiser(beta) => {
                        let t = 2.0 * x - 1.0;
                        bessel_i0(beta * (1.0 - t * t).max(0.0).sqrt()) / bessel_i0(*beta)
                    }
                }
            })
            .collect()
    }
}

/// Kaiser beta for a target stopband attenuation in dB.
pub fn kaiser_beta(atten_db: f64) -> f64 {
    if atten_db > 50.0 {
        0.1102 * (atten_db - 8.7)
    } else if atten_db >= 21.0 {
        0.5842 * (atten_db - 21.0).powf(0.4) + 0.07886 * (atten_db - 21.0)
    } else {
        0.0
    }
}

/// Kaiser estimate of the FIR order needed for `atten_db` of stopband
/// attenuation over a normalized transition width `delta_f` (in units
/// of the sampling frequency).
pub fn kaiser_order(atten_db: f64, delta_f: f64) -> usize {
    (((atten_db - 7.95) / (14.36 * delta_f)).ceil()).max(1.0) as usize
}

/// Modified Bessel function of the first kind, order zero.
///
/// Series expansion, converged to machine precision for the argument
/// range window design uses.
pub fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..64 {
        term *= (half / k as f64) * (half / k as f64);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

// ============================================================================
// Tests
// ============================================================================
