//! # Moving Average Design
//!
//! The plainest FIR there is: average the last `N + 1` samples.
//! Lowpass sums with equal weights, highpass alternates the signs to
//! shift the response up to Nyquist. Minimum order mode sizes the
//! window so the sidelobe envelope stays below the requested stopband
//! attenuation.

use std::f64::consts::PI;

use crate::capability::{cap_map, CapMap, CapNode, FieldState};
use crate::design::FilterDesign;
use crate::types::{
    BaCoeffs, Complex, DesignError, DesignMethod, DesignStatus, FilterKind, FilterState,
    OrderMode, ResponseType, Zpk,
};

/// Longest supported average. Beyond this the design refuses rather
/// than producing an absurd tap count.
const MAX_LENGTH: usize = 4096;

#[derive(Debug, Default)]
pub struct MovingAverage;

impl MovingAverage {
    pub fn new() -> Self {
        MovingAverage
    }

    /// Smallest length whose sidelobe envelope `1 / (L sin(pi f))`
    /// stays at or below the target stopband gain.
    fn min_length(f_sb_norm: f64, a_sb_db: f64) -> usize {
        let target = 10f64.powf(-a_sb_db / 20.0);
        let envelope = (PI * f_sb_norm).sin();
        (1.0 / (target * envelope)).ceil().max(2.0) as usize
    }
}

impl FilterDesign for MovingAverage {
    fn name(&self) -> &'static str {
        "ma"
    }

    fn display_name(&self) -> &'static str {
        "Moving Average"
    }

    fn description(&self) -> &'static str {
        "equal-weight FIR average, lowpass or sign-alternating highpass"
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Fir
    }

    fn capabilities(&self) -> CapMap {
        let man = CapNode::map_of(&[
            ("fo", CapNode::entry(FieldState::Active, &["N"])),
            ("fspecs", CapNode::entry(FieldState::Disabled, &["F_C"])),
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
                    ("frq", CapNode::entry(FieldState::Active, &["F_SB"])),
                    ("amp", CapNode::entry(FieldState::Active, &["A_SB"])),
                ]),
            ),
        ]);
        cap_map(&[
            ("LP", CapNode::map_of(&[("man", man.clone()), ("min", min.clone())])),
            ("HP", CapNode::map_of(&[("man", man), ("min", min)])),
        ])
    }

    fn extra_capabilities(&self) -> Option<CapMap> {
        Some(cap_map(&[(
            "COM",
            CapNode::map_of(&[(
                "min",
                CapNode::map_of(&[(
                    "msg",
                    CapNode::entry(
                        FieldState::Active,
                        &["minimum length is estimated from the sidelobe envelope at F_SB"],
                    ),
                )]),
            )]),
        )]))
    }

    fn design(
        &mut self,
        method: DesignMethod,
        state: &mut FilterState,
    ) -> Result<DesignStatus, DesignError> {
        let length = match method.mode {
            OrderMode::Man => {
                if state.order == 0 {
                    return Err(DesignError::InvalidSpec(
                        "a moving average needs at least order 1".into(),
                    ));
                }
                state.order + 1
            }
            OrderMode::Min => {
                state.validate_corner("F_SB", state.f_sb)?;
                let length = Self::min_length(state.f_sb / state.f_s, state.a_sb);
                if length > MAX_LENGTH {
                    return Err(DesignError::OrderTooHigh {
                        order: length - 1,
                        max: MAX_LENGTH - 1,
                    });
                }
                length
            }
        };

        let weight = 1.0 / length as f64;
        let b: Vec<f64> = match method.response {
            ResponseType::LP => vec![weight; length],
            ResponseType::HP => (0..length)
                .map(|k| if k % 2 == 0 { weight } else { -weight })
                .collect(),
            other => {
                return Err(DesignError::UnsupportedMethod(DesignMethod::new(
                    other,
                    method.mode,
                )))
            }
        };

        // Zeros are the L-th roots of unity minus the passband root,
        // mirrored across the imaginary axis for the highpass.
        let zeros: Vec<Complex> = (1..length)
            .map(|k| {
                let z = Complex::from_polar(1.0, 2.0 * PI * k as f64 / length as f64);
                match method.response {
                    ResponseType::HP => -z,
                    _ => z,
                }
            })
            .collect();
        let poles = vec![Complex::new(0.0, 0.0); length - 1];

        state.clear_results();
        state.order = length - 1;
        state.ba = Some(BaCoeffs::fir(b));
        state.zpk = Some(Zpk::new(zeros, poles, weight));
        Ok(DesignStatus::Completed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::freqz_at;
    use approx::assert_relative_eq;

    fn run(method: &str, state: &mut FilterState) -> Result<DesignStatus, DesignError> {
        MovingAverage::new().design(method.parse().unwrap(), state)
    }

    #[test]
    fn test_lowpass_dc_gain() {
        let mut state = FilterState { order: 3, ..FilterState::default() };
        run("LPman", &mut state).unwrap();

        let ba = state.ba.as_ref().unwrap();
        assert_eq!(ba.b, vec![0.25; 4]);
        let dc = freqz_at(&ba.b, &ba.a, 0.0, 1.0);
        assert_relative_eq!(dc.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_highpass_nyquist_gain() {
        let mut state = FilterState { order: 4, ..FilterState::default() };
        run("HPman", &mut state).unwrap();

        let ba = state.ba.as_ref().unwrap();
        let nyq = freqz_at(&ba.b, &ba.a, 0.5, 1.0);
        assert_relative_eq!(nyq.norm(), 1.0, epsilon = 1e-12);
        let dc = freqz_at(&ba.b, &ba.a, 0.0, 1.0);
        assert!(dc.norm() < 0.21, "odd-length alternating sum leaves 1/L at DC");
    }

    #[test]
    fn test_min_stopband() {
        let mut state = FilterState {
            f_sb: 0.1,
            a_sb: 40.0,
            ..FilterState::default()
        };
        run("LPmin", &mut state).unwrap();

        let ba = state.ba.as_ref().unwrap();
        assert_eq!(state.order, ba.b.len() - 1);
        let h = freqz_at(&ba.b, &ba.a, 0.1, 1.0).norm();
        assert!(h <= 0.01 + 1e-9, "|H(f_sb)| = {h} misses the 40 dB spec");
    }

    #[test]
    fn test_min_order_over_cap() {
        let mut state = FilterState {
            f_sb: 0.01,
            a_sb: 120.0,
            ..FilterState::default()
        };
        let err = run("LPmin", &mut state).unwrap_err();
        assert!(matches!(err, DesignError::OrderTooHigh { .. }), "got {err:?}");
    }

    #[test]
    fn test_zero_order() {
        let mut state = FilterState { order: 0, ..FilterState::default() };
        assert!(matches!(
            run("LPman", &mut state),
            Err(DesignError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_bandpass_rejected() {
        let d = MovingAverage::new();
        assert!(!d.supports("BPman".parse().unwrap()));
        let mut state = FilterState::default();
        assert!(matches!(
            MovingAverage::new().design("BPman".parse().unwrap(), &mut state),
            Err(DesignError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_zero_placement() {
        let mut state = FilterState { order: 3, ..FilterState::default() };
        run("LPman", &mut state).unwrap();
        let zpk = state.zpk.as_ref().unwrap();
        assert_eq!(zpk.z.len(), 3);
        for z in &zpk.z {
            assert!((z - Complex::new(1.0, 0.0)).norm() > 1e-9, "z = 1 must stay a passband");
            assert_relative_eq!(z.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_com_overlay() {
        let extra = MovingAverage::new().extra_capabilities().unwrap();
        let com = extra["COM"].as_map().unwrap();
        assert!(com.contains_key("min"));
        assert!(!com.contains_key("man"));
    }
}
