//! # rfda Core Filter Design Library
//!
//! This crate provides the computational core of a digital filter
//! design tool: classic design algorithms producing coefficients in
//! several representations, a fixed-point quantization engine, and the
//! session plumbing that ties the design classes together.
//!
//! ## Overview
//!
//! - **Design classes**: Butterworth IIR, windowed FIR, moving average
//!   and manual coefficient entry, all behind the
//!   [`FilterDesign`](design::FilterDesign) trait
//! - **Fixed-point**: two's-complement quantizer with selectable
//!   rounding and overflow handling, plus decimal / hex / binary / CSD
//!   conversion of quantized words
//! - **Session plumbing**: versioned configuration, explicit class
//!   registry, factory dispatch with stable status codes, and the
//!   frozen capability tree that tells a frontend which spec fields
//!   each design method uses
//! - **Analysis**: frequency response evaluation of the designed
//!   coefficients
//!
//! ## Data Flow
//!
//! ```text
//! config -> registry -> factory -> design class -> FilterState
//!                                                      |
//!                       quantizer / CSD / format  <----+
//! ```
//!
//! ## Example
//!
//! ```
//! use rfda_core::fixpoint::{QuantConfig, Quantizer};
//!
//! // Q0.3 format: one sign bit, three fractional bits
//! let mut q = Quantizer::new(QuantConfig { wi: 0, wf: 3, ..Default::default() });
//!
//! assert_eq!(q.quantize(0.2), 0.25);   // rounded to the nearest LSB
//! assert_eq!(q.quantize(1.7), 0.875);  // saturated at the positive rail
//! assert_eq!(q.overflow_count(), 1);
//! ```

pub mod analysis;
pub mod capability;
pub mod config;
pub mod design;
pub mod designs;
pub mod factory;
pub mod fixpoint;
pub mod frozen;
pub mod logging;
pub mod registry;
pub mod tree;
pub mod types;

// Re-export main types
pub use capability::{CapMap, CapNode, FieldState, FrozenNode, MergePolicy};
pub use config::{ConfigError, RfdaConfig, CONFIG_VERSION};
pub use design::FilterDesign;
pub use designs::{Butterworth, FirWindow, Manual, MovingAverage, Window};
pub use factory::{classify_design_failure, CreateStatus, FactoryError, FilterFactory};
pub use fixpoint::{NumBase, OverflowMode, QuantConfig, QuantMode, QuantUpdate, Quantizer};
pub use frozen::{Freeze, FrozenDict};
pub use registry::{DesignDescriptor, FilterRegistry};
pub use tree::{build_filter_tree, FilterTree};
pub use types::{
    BaCoeffs, Complex, DesignError, DesignMethod, DesignStatus, FilterKind, FilterState,
    OrderMode, ResponseType, Zpk,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::design::FilterDesign;
    pub use crate::factory::FilterFactory;
    pub use crate::fixpoint::{QuantConfig, Quantizer};
    pub use crate::registry::FilterRegistry;
    pub use crate::tree::build_filter_tree;
    pub use crate::types::{DesignMethod, FilterState, OrderMode, ResponseType};
}
