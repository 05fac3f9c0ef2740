//! # Fixed-Point Quantizer
//!
//! Simulates two's-complement fixed-point arithmetic with `wi` integer
//! bits, `wf` fractional bits and one sign bit. Values are snapped to
//! the quantization grid (spacing `2^-wf`) with a selectable rounding
//! mode, then forced into the representable range with a selectable
//! overflow mode. Overflow events are counted cumulatively so a
//! simulation run can report how often it clipped.
//!
//! Reconfiguration goes through [`Quantizer::set_options`] with a
//! partial [`QuantUpdate`]: only the supplied fields change, malformed
//! fields log a warning and fall back to a safe value, and the call
//! itself never fails.
//!
//! # Example
//!
//! ```
//! use rfda_core::fixpoint::{OverflowMode, QuantConfig, Quantizer, QuantMode};
//!
//! let mut q = Quantizer::new(QuantConfig {
//!     wi: 0,
//!     wf: 3,
//!     ovfl: OverflowMode::Sat,
//!     quant: QuantMode::Round,
//!     ..QuantConfig::default()
//! });
//!
//! assert_eq!(q.quantize(0.2), 0.25);  // snapped to the nearest 1/8
//! assert_eq!(q.quantize(1.1), 0.875); // clipped to the largest code
//! assert_eq!(q.overflow_count(), 1);
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Largest total wordlength for which grid arithmetic stays exact in
/// `f64` / `i64`. Wider requests are clamped with a warning.
pub const MAX_TOTAL_BITS: u32 = 62;

// ----------------------------------------------------------------------------
// Mode enums
// ----------------------------------------------------------------------------

/// Rounding applied when a value is snapped to the quantization grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantMode {
    /// Round to nearest, halves toward +infinity.
    Round,
    /// Round toward -infinity.
    Floor,
    /// Round toward zero.
    Fix,
    /// No rounding; the value keeps its sub-grid precision.
    None,
}

impl FromStr for QuantMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "round" => Ok(QuantMode::Round),
            "floor" => Ok(QuantMode::Floor),
            "fix" => Ok(QuantMode::Fix),
            "none" => Ok(QuantMode::None),
            _ => Err(format!("unknown quantization mode '{s}'")),
        }
    }
}

/// What happens when a value falls outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowMode {
    /// Clamp to the most positive / most negative code.
    Sat,
    /// Two's-complement wrap-around.
    Wrap,
    /// Pass through unlimited.
    None,
}

impl FromStr for OverflowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sat" | "saturate" => Ok(OverflowMode::Sat),
            "wrap" => Ok(OverflowMode::Wrap),
            "none" => Ok(OverflowMode::None),
            _ => Err(format!("unknown overflow mode '{s}'")),
        }
    }
}

/// Numeric base used when rendering or parsing fixed-point words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumBase {
    /// Decimal, in real-world units.
    Dec,
    /// Two's-complement hexadecimal.
    Hex,
    /// Two's-complement binary.
    Bin,
    /// Canonical signed digit string over `+`, `0`, `-`.
    Csd,
    /// Floating point pass-through without quantization.
    Float,
}

impl FromStr for NumBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dec" => Ok(NumBase::Dec),
            "hex" => Ok(NumBase::Hex),
            "bin" => Ok(NumBase::Bin),
            "csd" => Ok(NumBase::Csd),
            "float" => Ok(NumBase::Float),
            _ => Err(format!("unknown number base '{s}'")),
        }
    }
}

/// How the configured scale factor is applied around quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scaling {
    /// Multiply by the scale on the way in, divide on the way out.
    #[default]
    Mult,
    /// Divide by the scale on the way in, multiply on the way out.
    Div,
    /// Ignore the scale.
    None,
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Static quantizer settings.
///
/// The total wordlength is `wi + wf + 1` including the sign bit, so the
/// representable integer codes run from `-2^(wi+wf)` to `2^(wi+wf)-1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantConfig {
    /// Integer bits (excluding the sign bit).
    pub wi: u32,
    /// Fractional bits.
    pub wf: u32,
    /// Overflow handling.
    pub ovfl: OverflowMode,
    /// Rounding mode.
    pub quant: QuantMode,
    /// Display / parse base.
    #[serde(alias = "frmt")]
    pub base: NumBase,
    /// Positive scale factor mapping real-world values onto the grid.
    pub scale: f64,
}

impl Default for QuantConfig {
    fn default() -> Self {
        QuantConfig {
            wi: 0,
            wf: 15,
            ovfl: OverflowMode::Sat,
            quant: QuantMode::Round,
            base: NumBase::Dec,
            scale: 1.0,
        }
    }
}

impl QuantConfig {
    /// Total wordlength `wi + wf + 1` including the sign bit.
    pub fn total_bits(&self) -> u32 {
        self.wi + self.wf + 1
    }
}

/// Partial update for [`Quantizer::set_options`].
///
/// Every field is optional; absent fields leave the current setting
/// untouched. `w` is a shortcut for an integer word (`wi = w - 1`,
/// `wf = 0`) and `q` sets both widths from a dotted `"wi.wf"` string.
/// Width fields are applied from least to most specific, so an
/// explicit `wi` or `wf` wins over `w` or `q` in the same update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantUpdate {
    pub wi: Option<u32>,
    pub wf: Option<u32>,
    pub w: Option<u32>,
    pub q: Option<String>,
    pub ovfl: Option<String>,
    pub quant: Option<String>,
    #[serde(alias = "frmt")]
    pub base: Option<String>,
    pub scale: Option<ScaleSpec>,
}

/// A scale factor, either numeric or symbolic.
///
/// `"norm"` resolves to `2^-wi` (normalize to the unit range) and
/// `"int"` to `2^wf` (integer-valued grid); both are resolved against
/// the wordlength of the same update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleSpec {
    Value(f64),
    Symbol(String),
}

// ----------------------------------------------------------------------------
// Quantizer
// ----------------------------------------------------------------------------

/// Fixed-point quantizer with a cumulative overflow counter.
#[derive(Debug, Clone)]
pub struct Quantizer {
    cfg: QuantConfig,
    overflow_count: u64,
    places: usize,
}

impl Quantizer {
    pub fn new(cfg: QuantConfig) -> Self {
        let mut q = Quantizer { cfg, overflow_count: 0, places: 0 };
        q.set_widths(q.cfg.wi, q.cfg.wf);
        if !(q.cfg.scale.is_finite() && q.cfg.scale > 0.0) {
            warn!(scale = q.cfg.scale, "scale must be a positive number, using 1.0");
            q.cfg.scale = 1.0;
        }
        q.update_places();
        q
    }

    // ------------------------------------------------------------------ access

    /// Current settings.
    pub fn config(&self) -> &QuantConfig {
        &self.cfg
    }

    /// Integer bits (excluding sign).
    pub fn wi(&self) -> u32 {
        self.cfg.wi
    }

    /// Fractional bits.
    pub fn wf(&self) -> u32 {
        self.cfg.wf
    }

    /// Total wordlength including the sign bit.
    pub fn total_bits(&self) -> u32 {
        self.cfg.total_bits()
    }

    /// Grid spacing `2^-wf`.
    pub fn lsb(&self) -> f64 {
        (-(self.cfg.wf as f64)).exp2()
    }

    /// Most negative integer code.
    pub fn int_min(&self) -> i64 {
        -(1i64 << (self.total_bits() - 1))
    }

    /// Most positive integer code.
    pub fn int_max(&self) -> i64 {
        (1i64 << (self.total_bits() - 1)) - 1
    }

    /// Number of digits used when rendering values in the current base.
    pub fn places(&self) -> usize {
        self.places
    }

    /// Overflow events since construction or the last reset.
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    /// Reset the overflow counter to zero.
    pub fn reset_overflow_count(&mut self) {
        self.overflow_count = 0;
    }

    // ------------------------------------------------------------------ update

    /// Apply a partial settings update.
    ///
    /// Unknown mode strings log a warning and fall back to a safe
    /// default (`floor` rounding, `wrap` overflow); a malformed base or
    /// scale keeps the current setting. The call never fails.
    pub fn set_options(&mut self, update: &QuantUpdate) {
        if let Some(q) = &update.q {
            match parse_q(q) {
                Some((wi, wf)) => self.set_widths(wi, wf),
                None => warn!("malformed quantization format '{q}', expected 'wi.wf'"),
            }
        }
        if let Some(w) = update.w {
            if w == 0 {
                warn!("total wordlength must be at least 1, ignoring W = 0");
            } else {
                self.set_widths(w - 1, 0);
            }
        }
        if let Some(wi) = update.wi {
            self.set_widths(wi, self.cfg.wf);
        }
        if let Some(wf) = update.wf {
            self.set_widths(self.cfg.wi, wf);
        }
        if let Some(s) = &update.quant {
            self.cfg.quant = s.parse().unwrap_or_else(|e: String| {
                warn!("{e}, falling back to floor");
                QuantMode::Floor
            });
        }
        if let Some(s) = &update.ovfl {
            self.cfg.ovfl = s.parse().unwrap_or_else(|e: String| {
                warn!("{e}, falling back to wrap");
                OverflowMode::Wrap
            });
        }
        if let Some(s) = &update.base {
            match s.parse::<NumBase>() {
                Ok(base) => self.cfg.base = base,
                Err(e) => warn!("{e}, keeping current base"),
            }
        }
        if let Some(spec) = &update.scale {
            self.apply_scale(spec);
        }
        self.update_places();
    }

    fn set_widths(&mut self, wi: u32, wf: u32) {
        let (mut wi, mut wf) = (wi, wf);
        if wi.saturating_add(wf).saturating_add(1) > MAX_TOTAL_BITS {
            warn!(wi, wf, "wordlength exceeds {} bits, clamping", MAX_TOTAL_BITS);
            wi = wi.min(MAX_TOTAL_BITS - 1);
            wf = MAX_TOTAL_BITS - 1 - wi;
        }
        self.cfg.wi = wi;
        self.cfg.wf = wf;
    }

    fn apply_scale(&mut self, spec: &ScaleSpec) {
        let resolved = match spec {
            ScaleSpec::Value(v) => Some(*v),
            ScaleSpec::Symbol(s) => match s.as_str() {
                "norm" => Some((-(self.cfg.wi as f64)).exp2()),
                "int" => Some((self.cfg.wf as f64).exp2()),
                other => other.parse::<f64>().ok(),
            },
        };
        match resolved {
            Some(v) if v.is_finite() && v > 0.0 => self.cfg.scale = v,
            _ => warn!(?spec, "scale must be positive, 'norm' or 'int'; keeping current scale"),
        }
    }

    fn update_places(&mut self) {
        self.places = super::format::digits_for(self.cfg.base, self.total_bits());
    }

    // ------------------------------------------------------------------ quantize

    /// Quantize a single value using the default [`Scaling::Mult`].
    pub fn quantize(&mut self, x: f64) -> f64 {
        self.quantize_scaled(x, Scaling::Mult)
    }

    /// Quantize a single value with explicit scale handling.
    pub fn quantize_scaled(&mut self, x: f64, scaling: Scaling) -> f64 {
        if !x.is_finite() {
            warn!(value = x, "non-finite input replaced by 0");
            return 0.0;
        }
        let code = self.to_lsb_units(x, scaling);
        let snapped = code * self.lsb();
        match scaling {
            Scaling::Mult => snapped / self.cfg.scale,
            Scaling::Div => snapped * self.cfg.scale,
            Scaling::None => snapped,
        }
    }

    /// Quantize a slice element-wise. Overflow events accumulate per
    /// element.
    pub fn quantize_slice(&mut self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.quantize(x)).collect()
    }

    /// Quantize the real part of a complex value. A nonzero imaginary
    /// part is discarded with a warning.
    pub fn quantize_complex(&mut self, x: Complex64) -> f64 {
        if x.im != 0.0 {
            warn!(im = x.im, "discarding imaginary part before quantization");
        }
        self.quantize(x.re)
    }

    /// Quantize a value given as text. Unparseable input is treated as
    /// zero with a warning rather than an error, since these strings
    /// typically come straight from user entry fields.
    pub fn quantize_str(&mut self, s: &str) -> f64 {
        match s.trim().parse::<f64>() {
            Ok(v) => self.quantize(v),
            Err(_) => {
                warn!(input = s, "cannot parse as a number, using 0");
                self.quantize(0.0)
            }
        }
    }

    /// Quantize to the integer code on the `2^-wf` grid.
    pub(crate) fn quantize_to_int(&mut self, x: f64) -> i64 {
        if !x.is_finite() {
            warn!(value = x, "non-finite input replaced by 0");
            return 0;
        }
        self.to_lsb_units(x, Scaling::Mult).round() as i64
    }

    /// Scale the input and snap it to LSB units, then apply overflow
    /// handling. The result is integral except under [`QuantMode::None`].
    fn to_lsb_units(&mut self, x: f64, scaling: Scaling) -> f64 {
        let scaled = match scaling {
            Scaling::Mult => x * self.cfg.scale,
            Scaling::Div => x / self.cfg.scale,
            Scaling::None => x,
        };
        let raw = scaled * (self.cfg.wf as f64).exp2();
        let snapped = match self.cfg.quant {
            QuantMode::Round => (raw + 0.5).floor(),
            QuantMode::Floor => raw.floor(),
            QuantMode::Fix => raw.trunc(),
            QuantMode::None => raw,
        };
        self.clip(snapped)
    }

    /// Force an LSB-domain value into the representable code range,
    /// counting each overflow event.
    fn clip(&mut self, code: f64) -> f64 {
        let min = self.int_min() as f64;
        let max = self.int_max() as f64;
        match self.cfg.ovfl {
            OverflowMode::Sat => {
                if code > max {
                    self.overflow_count += 1;
                    max
                } else if code < min {
                    self.overflow_count += 1;
                    min
                } else {
                    code
                }
            }
            OverflowMode::Wrap => {
                if code > max || code < min {
                    self.overflow_count += 1;
                    let span = (self.total_bits() as f64).exp2();
                    (code - min).rem_euclid(span) + min
                } else {
                    code
                }
            }
            OverflowMode::None => code,
        }
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Quantizer::new(QuantConfig::default())
    }
}

// ----------------------------------------------------------------------------
// Integer-domain requantization
// ----------------------------------------------------------------------------

/// Convert an integer code between fractional widths.
///
/// Widening left-shifts with zero fill. Narrowing applies the rounding
/// mode to the bits about to be dropped: `Round` adds half an output
/// LSB before the arithmetic shift, `Floor` and `None` shift directly
/// (truncating toward -infinity), `Fix` divides toward zero.
pub fn requantize(value: i64, wf_from: u32, wf_to: u32, mode: QuantMode) -> i64 {
    if wf_to >= wf_from {
        return value << (wf_to - wf_from).min(MAX_TOTAL_BITS);
    }
    let d = (wf_from - wf_to).min(MAX_TOTAL_BITS);
    match mode {
        QuantMode::Round => (value + (1i64 << (d - 1))) >> d,
        QuantMode::Floor | QuantMode::None => value >> d,
        QuantMode::Fix => value / (1i64 << d),
    }
}

fn parse_q(q: &str) -> Option<(u32, u32)> {
    let (wi, wf) = q.trim().split_once('.')?;
    Some((wi.parse().ok()?, wf.parse().ok()?))
}

// ============================================================================
// Tests
// ============================================================================
