//! # Fixed-Point Subsystem
//!
//! Everything needed to move between real-valued filter math and
//! finite-wordlength hardware: the [`Quantizer`] itself, base
//! conversion of quantized words (decimal, hex, binary, CSD), and
//! coefficient-set quantization for fixpoint realizations.
//!
//! The quantizer is deliberately forgiving at its edges. Settings
//! updates and string inputs come more or less straight from user
//! entry, so malformed pieces are logged and replaced by safe values
//! instead of surfacing as errors; only the arithmetic itself is
//! strict.

pub mod coeffs;
pub mod csd;
pub mod format;
pub mod quantizer;

pub use coeffs::{quantize_coeffs, QuantizedCoeffs};
pub use csd::{from_csd, to_csd, CsdError};
pub use format::digits_for;
pub use quantizer::{
    requantize, NumBase, OverflowMode, QuantConfig, QuantMode, QuantUpdate, Quantizer, ScaleSpec,
    Scaling, MAX_TOTAL_BITS,
};
