//! # Butterworth Design
//!
//! Maximally-flat IIR lowpass and highpass via the bilinear transform.
//! The analog prototype poles sit on the Butterworth circle; each
//! conjugate pair maps to one digital biquad, with the cutoff
//! prewarped so the -3 dB point lands exactly on `f_c`. Minimum order
//! mode runs the standard `buttord` estimate on the warped band edges.
//!
//! # Example
//!
//! ```
//! use rfda_core::design::FilterDesign;
//! use rfda_core::designs::Butterworth;
//! use rfda_core::types::FilterState;
//!
//! let mut state = FilterState { order: 4, f_c: 0.1, ..FilterState::default() };
//! Butterworth::new().design("LPman".parse().unwrap(), &mut state).unwrap();
//! assert_eq!(state.ba.unwrap().order(), 4);
//! ```

use std::f64::consts::PI;

use crate::capability::{cap_map, CapMap, CapNode, FieldState};
use crate::design::FilterDesign;
use crate::types::{
    BaCoeffs, Complex, DesignError, DesignMethod, DesignStatus, FilterKind, FilterState,
    OrderMode, ResponseType, Zpk,
};

use super::convolve;

/// Beyond this order the cascaded polynomial coefficients lose too
/// much precision to be worth handing out.
const MAX_ORDER: usize = 20;

#[derive(Debug, Default)]
pub struct Butterworth;

impl Butterworth {
    pub fn new() -> Self {
        Butterworth
    }

    // ------------------------------------------------------------------ order

    /// `buttord` on the prewarped band edges: smallest order meeting
    /// both the passband ripple and the stopband attenuation, plus the
    /// matching -3 dB cutoff mapped back to a digital frequency.
    fn minimum_order(
        &self,
        response: ResponseType,
        state: &FilterState,
    ) -> Result<(usize, f64), DesignError> {
        state.validate_corner("F_PB", state.f_pb)?;
        state.validate_corner("F_SB", state.f_sb)?;
        match response {
            ResponseType::LP if state.f_pb >= state.f_sb => {
                return Err(DesignError::InvalidSpec(format!(
                    "lowpass needs F_PB ({}) below F_SB ({})",
                    state.f_pb, state.f_sb
                )))
            }
            ResponseType::HP if state.f_sb >= state.f_pb => {
                return Err(DesignError::InvalidSpec(format!(
                    "highpass needs F_SB ({}) below F_PB ({})",
                    state.f_sb, state.f_pb
                )))
            }
            _ => {}
        }
        if !(state.a_pb > 0.0 && state.a_sb > state.a_pb) {
            return Err(DesignError::InvalidSpec(format!(
                "ripple specs must satisfy 0 < A_PB ({}) < A_SB ({})",
                state.a_pb, state.a_sb
            )));
        }

        let wp = (PI * state.f_pb / state.f_s).tan();
        let ws = (PI * state.f_sb / state.f_s).tan();
        let nat = match response {
            ResponseType::HP => wp / ws,
            _ => ws / wp,
        };
        let gpass = 10f64.powf(state.a_pb / 10.0) - 1.0;
        let gstop = 10f64.powf(state.a_sb / 10.0) - 1.0;
        let order = (((gstop / gpass).ln() / (2.0 * nat.ln())).ceil() as usize).max(1);

        // Place the cutoff so the passband spec is met exactly; the
        // rounded-up order then overshoots the stopband spec.
        let margin = gpass.powf(1.0 / (2.0 * order as f64));
        let warped_c = match response {
            ResponseType::HP => wp * margin,
            _ => wp / margin,
        };
        Ok((order, warped_c.atan() * state.f_s / PI))
    }

    // ------------------------------------------------------------------ design
}

impl FilterDesign for Butterworth {
    fn name(&self) -> &'static str {
        "butterworth"
    }

    fn display_name(&self) -> &'static str {
        "Butterworth"
    }

    fn description(&self) -> &'static str {
        "maximally-flat IIR via bilinear transform"
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Iir
    }

    fn capabilities(&self) -> CapMap {
        let man = CapNode::map_of(&[
            ("fo", CapNode::entry(FieldState::Active, &["N"])),
            ("fspecs", CapNode::entry(FieldState::Active, &["F_C"])),
            (
                "tspecs",
                CapNode::map_of(&[
                    ("frq", CapNode::entry(FieldState::Unused, &["F_PB", "F_SB"])),
                    ("amp", CapNode::entry(FieldState::Unused, &["A_PB", "A_SB"])),
                ]),
            ),
        ]);
        let min = CapNode::map_of(&[
            ("fo", CapNode::entry(FieldState::Disabled, &["N"])),
            ("fspecs", CapNode::entry(FieldState::Disabled, &["F_C"])),
            (
                "tspecs",
                CapNode::map_of(&[
                    ("frq", CapNode::entry(FieldState::Active, &["F_PB", "F_SB"])),
                    ("amp", CapNode::entry(FieldState::Active, &["A_PB", "A_SB"])),
                ]),
            ),
        ]);
        cap_map(&[
            ("LP", CapNode::map_of(&[("man", man.clone()), ("min", min.clone())])),
            ("HP", CapNode::map_of(&[("man", man), ("min", min)])),
        ])
    }

    fn design(
        &mut self,
        method: DesignMethod,
        state: &mut FilterState,
    ) -> Result<DesignStatus, DesignError> {
        let highpass = match method.response {
            ResponseType::LP => false,
            ResponseType::HP => true,
            other => {
                return Err(DesignError::UnsupportedMethod(DesignMethod::new(
                    other,
                    method.mode,
                )))
            }
        };

        let (order, f_c) = match method.mode {
            OrderMode::Man => {
                if state.order == 0 {
                    return Err(DesignError::InvalidSpec(
                        "a Butterworth filter needs at least order 1".into(),
                    ));
                }
                state.validate_corner("F_C", state.f_c)?;
                (state.order, state.f_c)
            }
            OrderMode::Min => self.minimum_order(method.response, state)?,
        };
        if order > MAX_ORDER {
            return Err(DesignError::OrderTooHigh {
                order,
                max: MAX_ORDER,
            });
        }

        let k = 2.0 * state.f_s;
        let omega_c = k * (PI * f_c / state.f_s).tan();

        let mut sections: Vec<[f64; 6]> = Vec::with_capacity((order + 1) / 2);
        let mut poles: Vec<Complex> = Vec::with_capacity(order);
        let mut b_total = vec![1.0];
        let mut a_total = vec![1.0];
        let mut gain = 1.0;

        // One biquad per conjugate pole pair on the Butterworth circle.
        // The pole set is its own conjugate mirror, so lowpass and
        // highpass share denominators and differ only in numerators.
        for i in 0..order / 2 {
            let theta = PI * (2 * i + order + 1) as f64 / (2 * order) as f64;
            let p = omega_c * Complex::from_polar(1.0, theta);
            let d = k * k - 2.0 * k * p.re + p.norm_sqr();
            let a1 = 2.0 * (p.norm_sqr() - k * k) / d;
            let a2 = (k * k + 2.0 * k * p.re + p.norm_sqr()) / d;
            let (b0, b1, b2) = if highpass {
                (k * k / d, -2.0 * k * k / d, k * k / d)
            } else {
                (p.norm_sqr() / d, 2.0 * p.norm_sqr() / d, p.norm_sqr() / d)
            };
            if !(a2.abs() < 1.0 && a1.abs() < 1.0 + a2) {
                return Err(DesignError::Numeric(format!(
                    "unstable second-order section, a1 = {a1}, a2 = {a2}"
                )));
            }
            sections.push([b0, b1, b2, 1.0, a1, a2]);
            b_total = convolve(&b_total, &[b0, b1, b2]);
            a_total = convolve(&a_total, &[1.0, a1, a2]);
            gain *= b0;
            let zp = (k + p) / (k - p);
            poles.push(zp);
            poles.push(zp.conj());
        }

        // Odd orders leave one real pole at -omega_c.
        if order % 2 == 1 {
            let d = k + omega_c;
            let a1 = (omega_c - k) / d;
            let (b0, b1) = if highpass {
                (k / d, -k / d)
            } else {
                (omega_c / d, omega_c / d)
            };
            sections.push([b0, b1, 0.0, 1.0, a1, 0.0]);
            b_total = convolve(&b_total, &[b0, b1]);
            a_total = convolve(&a_total, &[1.0, a1]);
            gain *= b0;
            poles.push(Complex::new((k - omega_c) / (k + omega_c), 0.0));
        }

        let zero = if highpass { 1.0 } else { -1.0 };
        let zeros = vec![Complex::new(zero, 0.0); order];

        state.clear_results();
        state.order = order;
        state.f_c = f_c;
        state.ba = Some(BaCoeffs::new(b_total, a_total));
        state.zpk = Some(Zpk::new(zeros, poles, gain));
        state.sos = Some(sections);
        Ok(DesignStatus::Completed)
    }
}

// ============================================================================
// Tests
// ============================================================================
