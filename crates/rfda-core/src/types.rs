//! # Core Types
//!
//! Shared vocabulary for the filter design pipeline: response types,
//! filter kinds, order modes, design method names and the mutable
//! [`FilterState`] record that design routines read their specs from
//! and write their results into.
//!
//! All frequencies in [`FilterState`] are absolute and interpreted
//! against the sampling frequency `f_s`; with the default `f_s = 1.0`
//! they coincide with normalized frequencies in `(0, 0.5)`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::designs::windows::Window;
use crate::fixpoint::QuantConfig;

/// Complex sample type used for poles, zeros and frequency responses.
pub type Complex = Complex64;

// ----------------------------------------------------------------------------
// Response type / filter kind / order mode
// ----------------------------------------------------------------------------

/// Frequency response type of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    /// Lowpass
    LP,
    /// Highpass
    HP,
    /// Bandpass
    BP,
    /// Bandstop
    BS,
    /// Hilbert transformer
    HIL,
    /// Differentiator
    DIFF,
}

impl ResponseType {
    /// Short code used as a key in the capability tree, e.g. `"LP"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::LP => "LP",
            ResponseType::HP => "HP",
            ResponseType::BP => "BP",
            ResponseType::BS => "BS",
            ResponseType::HIL => "HIL",
            ResponseType::DIFF => "DIFF",
        }
    }

    /// Human-readable name for display purposes.
    pub fn label(&self) -> &'static str {
        match self {
            ResponseType::LP => "Lowpass",
            ResponseType::HP => "Highpass",
            ResponseType::BP => "Bandpass",
            ResponseType::BS => "Bandstop",
            ResponseType::HIL => "Hilbert",
            ResponseType::DIFF => "Differentiator",
        }
    }

    /// All response types in canonical order.
    pub fn all() -> &'static [ResponseType] {
        &[
            ResponseType::LP,
            ResponseType::HP,
            ResponseType::BP,
            ResponseType::BS,
            ResponseType::HIL,
            ResponseType::DIFF,
        ]
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = InvalidMethodName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LP" => Ok(ResponseType::LP),
            "HP" => Ok(ResponseType::HP),
            "BP" => Ok(ResponseType::BP),
            "BS" => Ok(ResponseType::BS),
            "HIL" => Ok(ResponseType::HIL),
            "DIFF" => Ok(ResponseType::DIFF),
            _ => Err(InvalidMethodName(s.to_string())),
        }
    }
}

/// Structural kind of a filter: finite or infinite impulse response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterKind {
    Fir,
    Iir,
}

impl FilterKind {
    /// Key used in the capability tree, `"FIR"` or `"IIR"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Fir => "FIR",
            FilterKind::Iir => "IIR",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the filter order is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    /// Order given explicitly by the caller.
    Man,
    /// Minimum order estimated from passband / stopband specs.
    Min,
}

impl OrderMode {
    /// Key used in the capability tree, `"man"` or `"min"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderMode::Man => "man",
            OrderMode::Min => "min",
        }
    }
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Design method names
// ----------------------------------------------------------------------------

/// Error returned when a design method name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid design method name: '{0}'")]
pub struct InvalidMethodName(pub String);

/// A design entry point, named by response type plus order mode.
///
/// The textual form is the concatenation of the two codes, e.g.
/// `"LPman"` or `"BSmin"`, which is also how methods are addressed
/// when dispatching through the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesignMethod {
    pub response: ResponseType,
    pub mode: OrderMode,
}

impl DesignMethod {
    pub fn new(response: ResponseType, mode: OrderMode) -> Self {
        DesignMethod { response, mode }
    }
}

impl fmt::Display for DesignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.response.as_str(), self.mode.as_str())
    }
}

impl FromStr for DesignMethod {
    type Err = InvalidMethodName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, mode) = if let Some(head) = s.strip_suffix("man") {
            (head, OrderMode::Man)
        } else if let Some(head) = s.strip_suffix("min") {
            (head, OrderMode::Min)
        } else {
            return Err(InvalidMethodName(s.to_string()));
        };
        let response = head
            .parse::<ResponseType>()
            .map_err(|_| InvalidMethodName(s.to_string()))?;
        Ok(DesignMethod { response, mode })
    }
}

// ----------------------------------------------------------------------------
// Design results and errors
// ----------------------------------------------------------------------------

/// Successful return of a design routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignStatus {
    /// The design ran to completion and wrote its results into the state.
    Completed,
    /// The design was cancelled before producing results.
    Cancelled,
}

impl DesignStatus {
    /// Numeric code: `0` for completed, `-1` for cancelled.
    pub fn code(&self) -> i32 {
        match self {
            DesignStatus::Completed => 0,
            DesignStatus::Cancelled => -1,
        }
    }
}

/// Errors raised by design routines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DesignError {
    /// The design class does not implement the requested method.
    #[error("method '{0}' is not implemented by this design class")]
    UnsupportedMethod(DesignMethod),
    /// The requested or estimated filter order exceeds what the
    /// algorithm can realize as a stable filter.
    #[error("filter order {order} is too high (maximum {max})")]
    OrderTooHigh { order: usize, max: usize },
    /// An iterative approximation failed to converge.
    #[error("failure to converge after {iterations} iterations")]
    NotConverging { iterations: usize },
    /// The frequency or amplitude specs are inconsistent or out of range.
    #[error("invalid specification: {0}")]
    InvalidSpec(String),
    /// Free-form failure reported by a numeric kernel. The message is
    /// classified further at the factory boundary.
    #[error("{0}")]
    Numeric(String),
}

// ----------------------------------------------------------------------------
// Coefficient containers
// ----------------------------------------------------------------------------

/// Transfer function coefficients `b` (numerator) and `a` (denominator).
///
/// For FIR filters `a` is the single coefficient `[1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaCoeffs {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl BaCoeffs {
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Self {
        BaCoeffs { b, a }
    }

    /// FIR constructor with an implicit denominator of `[1.0]`.
    pub fn fir(b: Vec<f64>) -> Self {
        BaCoeffs { b, a: vec![1.0] }
    }

    /// Filter order, the larger polynomial degree of the two.
    pub fn order(&self) -> usize {
        self.b.len().max(self.a.len()).saturating_sub(1)
    }

    /// True when the denominator reduces to a pure gain.
    pub fn is_fir(&self) -> bool {
        self.a.len() <= 1 || self.a.iter().skip(1).all(|&c| c == 0.0)
    }
}

/// Zero / pole / gain representation of a transfer function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zpk {
    pub z: Vec<Complex>,
    pub p: Vec<Complex>,
    pub k: f64,
}

impl Zpk {
    pub fn new(z: Vec<Complex>, p: Vec<Complex>, k: f64) -> Self {
        Zpk { z, p, k }
    }
}

// ----------------------------------------------------------------------------
// Filter state
// ----------------------------------------------------------------------------

/// The shared design record: target specs in, computed results out.
///
/// Design routines read the spec fields relevant to their response type
/// and order mode, then fill in `ba` (and `sos` / `zpk` where the
/// algorithm produces them) along with the actual `order` used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Selected response type.
    pub rt: ResponseType,
    /// Selected filter kind.
    pub ft: FilterKind,
    /// Name of the selected design class, empty if none.
    pub fc: String,
    /// Selected order mode.
    pub fo: OrderMode,
    /// Filter order (target in `man` mode, result in `min` mode).
    pub order: usize,
    /// Sampling frequency. All other frequencies are relative to this.
    pub f_s: f64,
    /// Cutoff frequency (lower edge for bandpass / bandstop).
    pub f_c: f64,
    /// Upper cutoff frequency for bandpass / bandstop.
    pub f_c2: f64,
    /// Passband edge frequency.
    pub f_pb: f64,
    /// Stopband edge frequency.
    pub f_sb: f64,
    /// Upper passband edge for bandpass / bandstop.
    pub f_pb2: f64,
    /// Upper stopband edge for bandpass / bandstop.
    pub f_sb2: f64,
    /// Maximum passband ripple in dB.
    pub a_pb: f64,
    /// Minimum stopband attenuation in dB.
    pub a_sb: f64,
    /// Window used by windowed FIR designs.
    pub window: Window,
    /// Designed transfer function coefficients.
    pub ba: Option<BaCoeffs>,
    /// Designed zeros / poles / gain, where the algorithm provides them.
    pub zpk: Option<Zpk>,
    /// Designed second-order sections `[b0, b1, b2, 1, a1, a2]`.
    pub sos: Option<Vec<[f64; 6]>>,
    /// Quantizer settings for coefficients.
    pub q_coeff: QuantConfig,
    /// Quantizer settings for the input word.
    pub q_input: QuantConfig,
    /// Quantizer settings for the output word.
    pub q_output: QuantConfig,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            rt: ResponseType::LP,
            ft: FilterKind::Fir,
            fc: String::new(),
            fo: OrderMode::Man,
            order: 10,
            f_s: 1.0,
            f_c: 0.1,
            f_c2: 0.3,
            f_pb: 0.1,
            f_sb: 0.2,
            f_pb2: 0.4,
            f_sb2: 0.3,
            a_pb: 1.0,
            a_sb: 60.0,
            window: Window::Hamming,
            ba: None,
            zpk: None,
            sos: None,
            q_coeff: QuantConfig::default(),
            q_input: QuantConfig::default(),
            q_output: QuantConfig::default(),
        }
    }
}

impl FilterState {
    /// Nyquist frequency `f_s / 2`.
    pub fn nyquist(&self) -> f64 {
        self.f_s / 2.0
    }

    /// Check that a corner frequency lies strictly inside `(0, f_s/2)`.
    pub fn validate_corner(&self, label: &str, f: f64) -> Result<(), DesignError> {
        if !(f > 0.0 && f < self.nyquist()) {
            return Err(DesignError::InvalidSpec(format!(
                "{label} = {f} must lie in (0, {})",
                self.nyquist()
            )));
        }
        Ok(())
    }

    /// Check that two band edges are ordered `lo < hi` and both valid.
    pub fn validate_band(&self, label: &str, lo: f64, hi: f64) -> Result<(), DesignError> {
        self.validate_corner(label, lo)?;
        self.validate_corner(label, hi)?;
        if lo >= hi {
            return Err(DesignError::InvalidSpec(format!(
                "{label}: lower edge {lo} must be below upper edge {hi}"
            )));
        }
        Ok(())
    }

    /// Clear previously computed results before running a new design.
    pub fn clear_results(&mut self) {
        self.ba = None;
        self.zpk = None;
        self.sos = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------- methods

    #[test]
    fn test_method_parse() {
        let m: DesignMethod = "LPmin".parse().unwrap();
        assert_eq!(m.response, ResponseType::LP);
        assert_eq!(m.mode, OrderMode::Min);

        let m: DesignMethod = "DIFFman".parse().unwrap();
        assert_eq!(m.response, ResponseType::DIFF);
        assert_eq!(m.mode, OrderMode::Man);
    }

    #[test]
    fn test_method_display() {
        for rt in ResponseType::all() {
            for mode in [OrderMode::Man, OrderMode::Min] {
                let m = DesignMethod::new(*rt, mode);
                let parsed: DesignMethod = m.to_string().parse().unwrap();
                assert_eq!(parsed, m);
            }
        }
    }

    #[test]
    fn test_method_malformed() {
        assert!("LP".parse::<DesignMethod>().is_err());
        assert!("XYman".parse::<DesignMethod>().is_err());
        assert!("LPmax".parse::<DesignMethod>().is_err());
        assert!("".parse::<DesignMethod>().is_err());
    }

    // -------------------------------------------------------------- status

    #[test]
    fn test_status_codes() {
        assert_eq!(DesignStatus::Completed.code(), 0);
        assert_eq!(DesignStatus::Cancelled.code(), -1);
    }

    // -------------------------------------------------------------- coeffs

    #[test]
    fn test_ba_order() {
        let fir = BaCoeffs::fir(vec![0.25; 4]);
        assert_eq!(fir.order(), 3);
        assert!(fir.is_fir());

        let iir = BaCoeffs::new(vec![1.0, 2.0, 1.0], vec![1.0, -0.5, 0.25]);
        assert_eq!(iir.order(), 2);
        assert!(!iir.is_fir());
    }

    // -------------------------------------------------------------- state

    #[test]
    fn test_default_state() {
        let state = FilterState::default();
        assert!(state.validate_corner("f_c", state.f_c).is_ok());
        assert!(state.validate_band("passband", state.f_pb, state.f_pb2).is_ok());
        assert!(state.f_pb < state.f_sb, "lowpass specs must leave a transition band");
    }

    #[test]
    fn test_corner_validation() {
        let state = FilterState::default();
        assert!(state.validate_corner("f_c", 0.0).is_err());
        assert!(state.validate_corner("f_c", 0.5).is_err());
        assert!(state.validate_corner("f_c", -0.1).is_err());
        assert!(state.validate_corner("f_c", 0.49).is_ok());
    }

    #[test]
    fn test_band_validation() {
        let state = FilterState::default();
        assert!(state.validate_band("band", 0.3, 0.1).is_err());
        assert!(state.validate_band("band", 0.1, 0.3).is_ok());
    }

    #[test]
    fn test_state_yaml() {
        let state = FilterState::default();
        let text = serde_yaml::to_string(&state).unwrap();
        let back: FilterState = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back.rt, state.rt);
        assert_eq!(back.order, state.order);
        assert_eq!(back.q_coeff.wf, state.q_coeff.wf);
    }
}
