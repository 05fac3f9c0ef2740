//! # Filter Factory
//!
//! Session-scoped dispatcher: holds the currently selected design
//! class instance and routes design method calls to it. Every failure
//! maps to a stable numeric code so embedding layers (GUIs, RPC
//! bridges) can react without parsing messages:
//!
//! | code | meaning                                   |
//! |-----:|-------------------------------------------|
//! |  -1  | new instance created                      |
//! |   0  | requested class was already current       |
//! |   1  | unknown class name                        |
//! |   2  | class configured but skipped at registry  |
//! |   3  | class has no builder                      |
//! |   4  | builder failed                            |
//! |  16  | method name does not parse                |
//! |  17  | class does not provide the method         |
//! |  18  | filter order too high                     |
//! |  19  | iteration failed to converge              |
//! |  99  | design failed for another reason          |
//!
//! # Example
//!
//! ```
//! use rfda_core::factory::FilterFactory;
//! use rfda_core::registry::FilterRegistry;
//! use rfda_core::types::FilterState;
//!
//! let registry = FilterRegistry::with_builtins();
//! let mut factory = FilterFactory::new();
//! let mut state = FilterState { order: 4, f_c: 0.1, ..FilterState::default() };
//!
//! factory
//!     .call_method("LPman", &mut state, Some("butterworth"), &registry)
//!     .unwrap();
//! assert_eq!(state.fc, "butterworth");
//! assert!(state.ba.is_some());
//! ```

use tracing::debug;

use crate::design::FilterDesign;
use crate::registry::{FilterRegistry, SkipReason};
use crate::types::{DesignError, DesignMethod, DesignStatus, FilterState};

/// Result of selecting a design class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    /// A new instance was created and selected.
    Created,
    /// The requested class was already the current one.
    Unchanged,
}

impl CreateStatus {
    /// Numeric code: `-1` for created, `0` for unchanged.
    pub fn code(&self) -> i32 {
        match self {
            CreateStatus::Created => -1,
            CreateStatus::Unchanged => 0,
        }
    }
}

/// Errors raised while selecting classes or dispatching methods.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    /// The name matches no registered or configured class.
    #[error("unknown filter class '{0}'")]
    UnknownClass(String),
    /// The class was configured but skipped when the registry built.
    #[error("filter class '{class}' is not available: {reason}")]
    Unavailable { class: String, reason: SkipReason },
    /// The class descriptor carries no builder.
    #[error("filter class '{0}' cannot be instantiated")]
    NotInstantiable(String),
    /// The class builder returned an error.
    #[error("constructing filter class '{class}' failed: {reason}")]
    ConstructorFailed { class: String, reason: String },
    /// The design method name did not parse.
    #[error("invalid design method name '{0}'")]
    InvalidMethod(String),
    /// The class does not provide the requested method.
    #[error("design class '{class}' does not provide method '{method}'")]
    MissingMethod { class: String, method: DesignMethod },
    /// The requested or estimated order is beyond the class limit.
    #[error("{0}")]
    OrderTooHigh(String),
    /// An iterative approximation did not converge.
    #[error("{0}")]
    NotConverging(String),
    /// The design failed for another reason.
    #[error("design failed: {0}")]
    DesignFailed(String),
}

impl FactoryError {
    /// Stable numeric code for embedding layers.
    pub fn code(&self) -> i32 {
        match self {
            FactoryError::UnknownClass(_) => 1,
            FactoryError::Unavailable { .. } => 2,
            FactoryError::NotInstantiable(_) => 3,
            FactoryError::ConstructorFailed { .. } => 4,
            FactoryError::InvalidMethod(_) => 16,
            FactoryError::MissingMethod { .. } => 17,
            FactoryError::OrderTooHigh(_) => 18,
            FactoryError::NotConverging(_) => 19,
            FactoryError::DesignFailed(_) => 99,
        }
    }
}

/// Classify a free-form numeric failure message.
///
/// Legacy numeric kernels report failures as prose. This adapter is
/// the single place such strings are sniffed; everything else in the
/// error path works on typed variants. Matching is case-insensitive
/// on substrings.
pub fn classify_design_failure(message: &str) -> FactoryError {
    let lower = message.to_lowercase();
    if lower.contains("order n is too high") {
        FactoryError::OrderTooHigh(message.to_string())
    } else if lower.contains("failure to converge") {
        FactoryError::NotConverging(message.to_string())
    } else {
        FactoryError::DesignFailed(message.to_string())
    }
}

/// Map a typed design error onto the factory's numeric code space.
fn map_design_error(class: &str, err: DesignError) -> FactoryError {
    match err {
        DesignError::UnsupportedMethod(method) => FactoryError::MissingMethod {
            class: class.to_string(),
            method,
        },
        e @ DesignError::OrderTooHigh { .. } => FactoryError::OrderTooHigh(e.to_string()),
        e @ DesignError::NotConverging { .. } => FactoryError::NotConverging(e.to_string()),
        e @ DesignError::InvalidSpec(_) => FactoryError::DesignFailed(e.to_string()),
        DesignError::Numeric(msg) => classify_design_failure(&msg),
    }
}

struct CurrentDesign {
    name: String,
    instance: Box<dyn FilterDesign>,
}

/// Session-scoped design dispatcher.
///
/// Owns at most one live design class instance at a time. Selecting
/// the class that is already current is a cheap no-op; a failed
/// selection keeps the previous instance usable.
#[derive(Default)]
pub struct FilterFactory {
    current: Option<CurrentDesign>,
    last_error: Option<FactoryError>,
}

impl FilterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the currently selected class, if any.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.name.as_str())
    }

    /// The most recent error, cleared by the next successful call.
    pub fn last_error(&self) -> Option<&FactoryError> {
        self.last_error.as_ref()
    }

    /// Select a design class, instantiating it through the registry.
    ///
    /// Selecting the current class again returns
    /// [`CreateStatus::Unchanged`] and keeps the live instance. On
    /// failure the previous selection stays current.
    pub fn create_design(
        &mut self,
        name: &str,
        registry: &FilterRegistry,
    ) -> Result<CreateStatus, FactoryError> {
        if self.current.as_ref().is_some_and(|c| c.name == name) {
            self.last_error = None;
            return Ok(CreateStatus::Unchanged);
        }

        match registry.instantiate(name) {
            Ok(instance) => {
                debug!(class = name, "created design class instance");
                self.current = Some(CurrentDesign {
                    name: name.to_string(),
                    instance,
                });
                self.last_error = None;
                Ok(CreateStatus::Created)
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Drop the current selection.
    pub fn clear(&mut self) {
        self.current = None;
        self.last_error = None;
    }

    /// Dispatch a design method on the current class.
    ///
    /// With `class` given, that class is selected first (as by
    /// [`Self::create_design`]). The method name is parsed, checked
    /// against the class capabilities and then run against `state`.
    /// On success the state records which class, response type, kind
    /// and order mode produced its results.
    pub fn call_method(
        &mut self,
        method: &str,
        state: &mut FilterState,
        class: Option<&str>,
        registry: &FilterRegistry,
    ) -> Result<DesignStatus, FactoryError> {
        if let Some(class) = class {
            self.create_design(class, registry)?;
        }

        let parsed: DesignMethod = match method.parse() {
            Ok(m) => m,
            Err(_) => {
                let e = FactoryError::InvalidMethod(method.to_string());
                self.last_error = Some(e.clone());
                return Err(e);
            }
        };

        let Some(current) = self.current.as_mut() else {
            let e = FactoryError::DesignFailed("no design class selected".to_string());
            self.last_error = Some(e.clone());
            return Err(e);
        };

        if !current.instance.supports(parsed) {
            let e = FactoryError::MissingMethod {
                class: current.name.clone(),
                method: parsed,
            };
            self.last_error = Some(e.clone());
            return Err(e);
        }

        match current.instance.design(parsed, state) {
            Ok(status) => {
                state.fc = current.name.clone();
                state.rt = parsed.response;
                state.fo = parsed.mode;
                state.ft = current.instance.kind();
                self.last_error = None;
                Ok(status)
            }
            Err(e) => {
                let e = map_design_error(&current.name, e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
