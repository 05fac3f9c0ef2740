//! # Windowed FIR Design
//!
//! Classic window method: sample the ideal brick-wall impulse
//! response, taper it with the selected window and normalize the
//! passband gain. Highpass and bandstop responses are built by
//! spectral inversion, which pins them to even orders so the
//! inverting impulse lands on a whole tap.

use std::f64::consts::PI;

use crate::capability::{cap_map, CapMap, CapNode, FieldState};
use crate::design::FilterDesign;
use crate::types::{
    BaCoeffs, DesignError, DesignMethod, DesignStatus, FilterKind, FilterState, OrderMode,
    ResponseType,
};

use super::windows::Window;

#[derive(Debug, Default)]
pub struct FirWindow;

impl FirWindow {
    pub fn new() -> Self {
        FirWindow
    }

    /// Windowed-sinc lowpass prototype, normalized to unit DC gain.
    fn lowpass_taps(fc_norm: f64, order: usize, window: &Window) -> Vec<f64> {
        let len = order + 1;
        let center = order as f64 / 2.0;
        let w = window.coefficients(len);
        let mut h: Vec<f64> = (0..len)
            .map(|k| 2.0 * fc_norm * sinc(2.0 * fc_norm * (k as f64 - center)) * w[k])
            .collect();
        let sum: f64 = h.iter().sum();
        for tap in &mut h {
            *tap /= sum;
        }
        h
    }

    /// Unit impulse centered on the symmetric prototype, `order` even.
    fn delta(order: usize) -> Vec<f64> {
        let mut d = vec![0.0; order + 1];
        d[order / 2] = 1.0;
        d
    }

    fn require_even(order: usize, response: ResponseType) -> Result<(), DesignError> {
        if order % 2 != 0 {
            return Err(DesignError::InvalidSpec(format!(
                "{} by spectral inversion needs an even order, got {order}",
                response.label()
            )));
        }
        Ok(())
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

fn subtract(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    lhs.iter().zip(rhs).map(|(l, r)| l - r).collect()
}

impl FilterDesign for FirWindow {
    fn name(&self) -> &'static str {
        "fir_window"
    }

    fn display_name(&self) -> &'static str {
        "Windowed FIR"
    }

    fn description(&self) -> &'static str {
        "linear-phase FIR via the window method"
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Fir
    }

    fn capabilities(&self) -> CapMap {
        let man_single = CapNode::map_of(&[
            ("fo", CapNode::entry(FieldState::Active, &["N"])),
            ("fspecs", CapNode::entry(FieldState::Active, &["F_C"])),
            ("wspecs", CapNode::entry(FieldState::Active, &["W"])),
            (
                "tspecs",
                CapNode::map_of(&[
                    ("frq", CapNode::entry(FieldState::Unused, &["F_PB", "F_SB"])),
                    ("amp", CapNode::entry(FieldState::Unused, &["A_PB", "A_SB"])),
                ]),
            ),
        ]);
        let man_band = CapNode::map_of(&[
            ("fo", CapNode::entry(FieldState::Active, &["N"])),
            ("fspecs", CapNode::entry(FieldState::Active, &["F_C", "F_C2"])),
            ("wspecs", CapNode::entry(FieldState::Active, &["W"])),
            (
                "tspecs",
                CapNode::map_of(&[
                    (
                        "frq",
                        CapNode::entry(FieldState::Unused, &["F_PB", "F_SB", "F_SB2", "F_PB2"]),
                    ),
                    ("amp", CapNode::entry(FieldState::Unused, &["A_PB", "A_SB"])),
                ]),
            ),
        ]);
        cap_map(&[
            ("LP", CapNode::map_of(&[("man", man_single.clone())])),
            ("HP", CapNode::map_of(&[("man", man_single)])),
            ("BP", CapNode::map_of(&[("man", man_band.clone())])),
            ("BS", CapNode::map_of(&[("man", man_band)])),
        ])
    }

    fn extra_capabilities(&self) -> Option<CapMap> {
        let even_note = |msg: &str| {
            CapNode::map_of(&[(
                "man",
                CapNode::map_of(&[("msg", CapNode::entry(FieldState::Active, &[msg]))]),
            )])
        };
        Some(cap_map(&[
            ("HP", even_note("highpass responses require an even order")),
            ("BS", even_note("bandstop responses require an even order")),
        ]))
    }

    fn design(
        &mut self,
        method: DesignMethod,
        state: &mut FilterState,
    ) -> Result<DesignStatus, DesignError> {
        if method.mode == OrderMode::Min {
            return Err(DesignError::UnsupportedMethod(method));
        }
        if state.order == 0 {
            return Err(DesignError::InvalidSpec(
                "a windowed FIR needs at least order 1".into(),
            ));
        }

        let order = state.order;
        let window = state.window;
        let fc = state.f_c / state.f_s;

        let b = match method.response {
            ResponseType::LP => {
                state.validate_corner("F_C", state.f_c)?;
                Self::lowpass_taps(fc, order, &window)
            }
            ResponseType::HP => {
                state.validate_corner("F_C", state.f_c)?;
                Self::require_even(order, ResponseType::HP)?;
                subtract(&Self::delta(order), &Self::lowpass_taps(fc, order, &window))
            }
            ResponseType::BP => {
                state.validate_band("F_C .. F_C2", state.f_c, state.f_c2)?;
                let fc2 = state.f_c2 / state.f_s;
                subtract(
                    &Self::lowpass_taps(fc2, order, &window),
                    &Self::lowpass_taps(fc, order, &window),
                )
            }
            ResponseType::BS => {
                state.validate_band("F_C .. F_C2", state.f_c, state.f_c2)?;
                Self::require_even(order, ResponseType::BS)?;
                let fc2 = state.f_c2 / state.f_s;
                let bp = subtract(
                    &Self::lowpass_taps(fc2, order, &window),
                    &Self::lowpass_taps(fc, order, &window),
                );
                subtract(&Self::delta(order), &bp)
            }
            other => {
                return Err(DesignError::UnsupportedMethod(DesignMethod::new(
                    other,
                    method.mode,
                )))
            }
        };

        state.clear_results();
        state.ba = Some(BaCoeffs::fir(b));
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

    fn gain(state: &FilterState, f: f64) -> f64 {
        let ba = state.ba.as_ref().unwrap();
        freqz_at(&ba.b, &ba.a, f, 1.0).norm()
    }

    fn run(method: &str, state: &mut FilterState) -> Result<DesignStatus, DesignError> {
        FirWindow::new().design(method.parse().unwrap(), state)
    }

    #[test]
    fn test_lowpass_dc_and_stopband() {
        let mut state = FilterState {
            order: 32,
            f_c: 0.1,
            window: Window::Hamming,
            ..FilterState::default()
        };
        run("LPman", &mut state).unwrap();

        assert_relative_eq!(gain(&state, 0.0), 1.0, epsilon = 1e-12);
        let sb = gain(&state, 0.25);
        assert!(sb < 0.01, "|H(0.25)| = {sb} should be deep in the stopband");
    }

    #[test]
    fn test_highpass_inversion() {
        let mut state = FilterState {
            order: 32,
            f_c: 0.1,
            ..FilterState::default()
        };
        run("HPman", &mut state).unwrap();

        assert!(gain(&state, 0.0) < 1e-12, "unit-DC prototype must cancel exactly");
        assert_relative_eq!(gain(&state, 0.5), 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_highpass_odd_order() {
        let mut state = FilterState {
            order: 31,
            f_c: 0.1,
            ..FilterState::default()
        };
        assert!(matches!(
            run("HPman", &mut state),
            Err(DesignError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_bandpass_band() {
        let mut state = FilterState {
            order: 64,
            f_c: 0.1,
            f_c2: 0.2,
            ..FilterState::default()
        };
        run("BPman", &mut state).unwrap();

        assert!(gain(&state, 0.0) < 1e-12);
        assert_relative_eq!(gain(&state, 0.15), 1.0, epsilon = 0.05);
        assert!(gain(&state, 0.5) < 0.01);
    }

    #[test]
    fn test_bandstop_notch() {
        let mut state = FilterState {
            order: 64,
            f_c: 0.1,
            f_c2: 0.2,
            ..FilterState::default()
        };
        run("BSman", &mut state).unwrap();

        assert_relative_eq!(gain(&state, 0.0), 1.0, epsilon = 1e-12);
        assert!(gain(&state, 0.15) < 0.05, "band center must be notched out");
    }

    #[test]
    fn test_band_edge_order() {
        let mut state = FilterState {
            order: 64,
            f_c: 0.3,
            f_c2: 0.2,
            ..FilterState::default()
        };
        assert!(matches!(
            run("BPman", &mut state),
            Err(DesignError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_min_mode_rejected() {
        let d = FirWindow::new();
        assert!(!d.supports("LPmin".parse().unwrap()));
        let mut state = FilterState::default();
        assert!(matches!(
            FirWindow::new().design("LPmin".parse().unwrap(), &mut state),
            Err(DesignError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_window_attenuation() {
        let mut rect = FilterState {
            order: 32,
            f_c: 0.1,
            window: Window::Rectangular,
            ..FilterState::default()
        };
        run("LPman", &mut rect).unwrap();
        let mut blackman = FilterState {
            order: 32,
            f_c: 0.1,
            window: Window::Blackman,
            ..FilterState::default()
        };
        run("LPman", &mut blackman).unwrap();

        let r = gain(&rect, 0.2);
        let b = gain(&blackman, 0.2);
        assert!(r > 5.0 * b, "rectangular ({r}) should trail Blackman ({b}) here");
    }

    #[test]
    fn test_inversion_notes() {
        let extra = FirWindow::new().extra_capabilities().unwrap();
        assert!(extra.contains_key("HP"));
        assert!(extra.contains_key("BS"));
        assert!(!extra.contains_key("COM"));
    }
}
