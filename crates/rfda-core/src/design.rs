//! # Filter Design Classes
//!
//! [`FilterDesign`] is the interface every design class implements:
//! static metadata (name, kind), a capability tree describing which
//! spec fields each response type and order mode uses, and the design
//! entry point itself. Classes are registered explicitly in the
//! [registry](crate::registry) rather than discovered dynamically, so
//! the full set of available designs is visible in one place.

use crate::capability::CapMap;
use crate::types::{DesignError, DesignMethod, DesignStatus, FilterKind, FilterState};

/// A filter design algorithm family, e.g. windowed FIR or Butterworth.
pub trait FilterDesign: std::fmt::Debug + Send {
    /// Registry key, e.g. `"butterworth"`.
    fn name(&self) -> &'static str;

    /// Human-readable name for menus and logs.
    fn display_name(&self) -> &'static str;

    /// One-line description of the method.
    fn description(&self) -> &'static str {
        ""
    }

    /// Whether the class produces FIR or IIR filters.
    fn kind(&self) -> FilterKind;

    /// Capability tree: response type -> order mode -> field specs.
    fn capabilities(&self) -> CapMap;

    /// Capability fragments merged on top of [`Self::capabilities`],
    /// including the shared `"COM"` section applied to every response
    /// type. `None` when the class has nothing to add.
    fn extra_capabilities(&self) -> Option<CapMap> {
        None
    }

    /// Whether a response type / order mode combination is offered.
    ///
    /// The default implementation consults the capability tree, which
    /// is also what the factory uses to reject dispatches to methods a
    /// class does not implement.
    fn supports(&self, method: DesignMethod) -> bool {
        self.capabilities()
            .get(method.response.as_str())
            .and_then(|node| node.as_map())
            .is_some_and(|modes| modes.contains_key(method.mode.as_str()))
    }

    /// Run the design, reading specs from and writing results into
    /// `state`.
    fn design(&mut self, method: DesignMethod, state: &mut FilterState)
        -> Result<DesignStatus, DesignError>;
}

// ============================================================================
// Tests
// ============================================================================
