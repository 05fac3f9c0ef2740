//! # Design Class Registry
//!
//! Builds the set of available filter design classes for a session
//! from the configuration. Built-in classes live in a static builder
//! table; external classes can be registered programmatically through
//! the same [`FilterDesign`] trait.
//!
//! A bad configuration entry never aborts the build: the entry is
//! logged once and recorded in the skip list, and the remaining
//! classes come up normally. Only the factory's attempt to actually
//! instantiate a skipped or unknown class surfaces an error.

use std::collections::BTreeMap;

use tracing::warn;

use crate::capability::CapMap;
use crate::config::RfdaConfig;
use crate::design::FilterDesign;
use crate::designs::{Butterworth, FirWindow, Manual, MovingAverage};
use crate::factory::FactoryError;
use crate::types::FilterKind;

/// Constructor for a design class instance.
///
/// Builders may fail, e.g. when a class fronts a resource that is not
/// present at runtime; the registry probes each builder once while
/// building and reports later failures through
/// [`FactoryError::ConstructorFailed`].
pub type BuildFn = fn() -> Result<Box<dyn FilterDesign>, String>;

/// Why a configured class did not make it into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The name matches no built-in or registered class.
    UnknownName,
    /// The class was found but probing its builder failed.
    BuildFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnknownName => write!(f, "unknown class name"),
            SkipReason::BuildFailed(msg) => write!(f, "builder failed: {}", msg),
        }
    }
}

/// Metadata snapshot of a registered design class.
///
/// Captured once from a probe instance so the capability tree can be
/// assembled without instantiating classes again.
#[derive(Debug)]
pub struct DesignDescriptor {
    /// Registry name, e.g. `"butterworth"`.
    pub name: String,
    /// Human-readable name for display purposes.
    pub display_name: String,
    /// One-line description.
    pub description: String,
    /// FIR or IIR.
    pub kind: FilterKind,
    /// Capability tree fragment advertised by the class.
    pub capabilities: CapMap,
    /// Overlay fragment merged into the tree after the fact.
    pub extra_capabilities: Option<CapMap>,
    /// Fixpoint widgets this class can feed, filtered to the ones the
    /// session actually has.
    pub fixpoint: Vec<String>,
    build: Option<BuildFn>,
}

impl DesignDescriptor {
    /// Descriptor carrying metadata only. [`FilterRegistry::instantiate`]
    /// refuses such entries; attach a builder via [`Self::with_builder`]
    /// to make the class usable.
    pub fn metadata_only(
        name: &str,
        display_name: &str,
        kind: FilterKind,
        capabilities: CapMap,
    ) -> Self {
        DesignDescriptor {
            name: name.to_string(),
            display_name: display_name.to_string(),
            description: String::new(),
            kind,
            capabilities,
            extra_capabilities: None,
            fixpoint: Vec::new(),
            build: None,
        }
    }

    /// Attach a builder to a metadata-only descriptor.
    pub fn with_builder(mut self, build: BuildFn) -> Self {
        self.build = Some(build);
        self
    }
}

/// Builder table for the built-in design classes.
fn builtin(name: &str) -> Option<BuildFn> {
    match name {
        "butterworth" => Some(|| Ok(Box::new(Butterworth::new()) as Box<dyn FilterDesign>)),
        "fir_window" => Some(|| Ok(Box::new(FirWindow::new()) as Box<dyn FilterDesign>)),
        "ma" => Some(|| Ok(Box::new(MovingAverage::new()) as Box<dyn FilterDesign>)),
        "manual_fir" => Some(|| Ok(Box::new(Manual::fir()) as Box<dyn FilterDesign>)),
        "manual_iir" => Some(|| Ok(Box::new(Manual::iir()) as Box<dyn FilterDesign>)),
        _ => None,
    }
}

/// Names of all built-in design classes, in registry order.
pub fn builtin_names() -> &'static [&'static str] {
    &["butterworth", "fir_window", "ma", "manual_fir", "manual_iir"]
}

/// The set of design classes available to a session.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    /// Registered classes by name.
    descriptors: BTreeMap<String, DesignDescriptor>,
    /// Configured classes that failed to register, with the reason.
    skipped: BTreeMap<String, SkipReason>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in class with default options.
    pub fn with_builtins() -> Self {
        Self::from_config(&RfdaConfig::default())
    }

    /// Build the registry from a configuration.
    ///
    /// Bad entries are skipped with a single warning each; the
    /// remaining classes register normally.
    pub fn from_config(config: &RfdaConfig) -> Self {
        let mut registry = Self::new();

        for (name, opts) in &config.filter_designs {
            let Some(build) = builtin(name) else {
                warn!("unknown filter design class '{}', skipping", name);
                registry.skipped.insert(name.clone(), SkipReason::UnknownName);
                continue;
            };
            match probe(build) {
                Ok(mut descriptor) => {
                    descriptor.fixpoint =
                        checked_fixpoint(name, &opts.fixpoint, &config.fixpoint_widgets);
                    registry.descriptors.insert(name.clone(), descriptor);
                }
                Err(reason) => {
                    warn!("failed to probe filter design class '{}': {}", name, reason);
                    registry
                        .skipped
                        .insert(name.clone(), SkipReason::BuildFailed(reason));
                }
            }
        }

        registry
    }

    /// Register an external design class from its builder.
    ///
    /// The class is probed once; its reported name becomes the
    /// registry key. A previously recorded skip under that name is
    /// cleared.
    pub fn register(&mut self, build: BuildFn) -> Result<&DesignDescriptor, String> {
        let descriptor = probe(build)?;
        let name = descriptor.name.clone();
        self.skipped.remove(&name);
        self.descriptors.insert(name.clone(), descriptor);
        Ok(self.descriptors.get(&name).unwrap())
    }

    /// Register a pre-built descriptor, e.g. metadata for a class that
    /// cannot be constructed in this environment.
    pub fn register_descriptor(&mut self, descriptor: DesignDescriptor) {
        self.skipped.remove(&descriptor.name);
        self.descriptors
            .insert(descriptor.name.clone(), descriptor);
    }

    /// Create a fresh instance of a registered class.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn FilterDesign>, FactoryError> {
        let Some(descriptor) = self.descriptors.get(name) else {
            if let Some(reason) = self.skipped.get(name) {
                return Err(FactoryError::Unavailable {
                    class: name.to_string(),
                    reason: reason.clone(),
                });
            }
            return Err(FactoryError::UnknownClass(name.to_string()));
        };
        let Some(build) = descriptor.build else {
            return Err(FactoryError::NotInstantiable(name.to_string()));
        };
        build().map_err(|reason| FactoryError::ConstructorFailed {
            class: name.to_string(),
            reason,
        })
    }

    /// Get a class descriptor by name.
    pub fn descriptor(&self, name: &str) -> Option<&DesignDescriptor> {
        self.descriptors.get(name)
    }

    /// All registered descriptors in name order.
    pub fn list_classes(&self) -> Vec<&DesignDescriptor> {
        self.descriptors.values().collect()
    }

    /// All registered class names in order.
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }

    /// Configured classes that were skipped, with reasons.
    pub fn skipped(&self) -> &BTreeMap<String, SkipReason> {
        &self.skipped
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Run a builder once and capture the class metadata.
fn probe(build: BuildFn) -> Result<DesignDescriptor, String> {
    let instance = build()?;
    let capabilities = instance.capabilities();
    if capabilities.is_empty() {
        return Err("class advertises no capabilities".to_string());
    }
    Ok(DesignDescriptor {
        name: instance.name().to_string(),
        display_name: instance.display_name().to_string(),
        description: instance.description().to_string(),
        kind: instance.kind(),
        capabilities,
        extra_capabilities: instance.extra_capabilities(),
        fixpoint: Vec::new(),
        build: Some(build),
    })
}

/// Keep only fixpoint widget names the session actually provides.
fn checked_fixpoint(class: &str, wanted: &[String], available: &[String]) -> Vec<String> {
    let mut kept = Vec::new();
    for fx in wanted {
        if available.contains(fx) {
            kept.push(fx.clone());
        } else {
            warn!(
                "class '{}' lists unknown fixpoint widget '{}', dropping",
                class, fx
            );
        }
    }
    kept
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{cap_map, CapNode, FieldState};
    use crate::config::DesignOptions;
    use crate::types::{DesignError, DesignMethod, DesignStatus, FilterState};

    #[test]
    fn test_builtins_register() {
        let registry = FilterRegistry::with_builtins();
        assert_eq!(registry.len(), 5);
        assert!(registry.skipped().is_empty());

        let ma = registry.descriptor("ma").unwrap();
        assert_eq!(ma.display_name, "Moving Average");
        assert_eq!(ma.kind, FilterKind::Fir);
        assert!(ma.capabilities.contains_key("LP"));
    }

    #[test]
    fn test_bad_entry_skipped() {
        let mut config = RfdaConfig::default();
        config.filter_designs = BTreeMap::new();
        for name in ["butterworth", "frobnicator", "ma"] {
            config
                .filter_designs
                .insert(name.to_string(), DesignOptions::default());
        }

        let registry = FilterRegistry::from_config(&config);
        assert_eq!(registry.names(), vec!["butterworth", "ma"]);
        assert_eq!(
            registry.skipped().get("frobnicator"),
            Some(&SkipReason::UnknownName)
        );
    }

    #[test]
    fn test_skip_error_codes() {
        let mut config = RfdaConfig::default();
        config
            .filter_designs
            .insert("frobnicator".to_string(), DesignOptions::default());
        let registry = FilterRegistry::from_config(&config);

        let err = registry.instantiate("frobnicator").unwrap_err();
        assert_eq!(err.code(), 2, "configured but skipped: {err}");

        let err = registry.instantiate("never_mentioned").unwrap_err();
        assert_eq!(err.code(), 1, "never configured: {err}");
    }

    #[test]
    fn test_metadata_only() {
        let mut registry = FilterRegistry::new();
        registry.register_descriptor(DesignDescriptor::metadata_only(
            "vhdl_export",
            "VHDL Export",
            FilterKind::Fir,
            cap_map(&[(
                "LP",
                CapNode::map_of(&[("man", CapNode::entry(FieldState::Active, &["N"]))]),
            )]),
        ));

        assert!(registry.contains("vhdl_export"));
        let err = registry.instantiate("vhdl_export").unwrap_err();
        assert_eq!(err.code(), 3, "{err}");
    }

    #[test]
    fn test_builder_failure() {
        let mut registry = FilterRegistry::new();
        let descriptor = DesignDescriptor::metadata_only(
            "remote",
            "Remote Design",
            FilterKind::Iir,
            cap_map(&[(
                "LP",
                CapNode::map_of(&[("man", CapNode::entry(FieldState::Active, &["N"]))]),
            )]),
        )
        .with_builder(|| Err("design server unreachable".to_string()));
        registry.register_descriptor(descriptor);

        let err = registry.instantiate("remote").unwrap_err();
        assert_eq!(err.code(), 4, "{err}");
        assert!(err.to_string().contains("design server unreachable"));
    }

    #[test]
    fn test_fixpoint_check() {
        let mut config = RfdaConfig::default();
        if let Some(opts) = config.filter_designs.get_mut("ma") {
            opts.fixpoint = vec!["fir_df".to_string(), "bogus_widget".to_string()];
        }

        let registry = FilterRegistry::from_config(&config);
        assert_eq!(registry.descriptor("ma").unwrap().fixpoint, vec!["fir_df"]);
    }

    #[test]
    fn test_instantiate_and_design() {
        let registry = FilterRegistry::with_builtins();
        let mut design = registry.instantiate("butterworth").unwrap();

        let mut state = FilterState {
            order: 4,
            f_c: 0.1,
            ..FilterState::default()
        };
        let status = design.design("LPman".parse().unwrap(), &mut state).unwrap();
        assert_eq!(status, DesignStatus::Completed);
        assert!(state.ba.is_some());
    }

    // -------------------------------------------------------------- external

    #[derive(Debug)]
    struct Passthrough;

    impl FilterDesign for Passthrough {
        fn name(&self) -> &'static str {
            "passthrough"
        }

        fn display_name(&self) -> &'static str {
            "Passthrough"
        }

        fn kind(&self) -> FilterKind {
            FilterKind::Fir
        }

        fn capabilities(&self) -> CapMap {
            cap_map(&[(
                "LP",
                CapNode::map_of(&[("man", CapNode::entry(FieldState::Active, &["N"]))]),
            )])
        }

        fn design(
            &mut self,
            _method: DesignMethod,
            state: &mut FilterState,
        ) -> Result<DesignStatus, DesignError> {
            state.clear_results();
            state.ba = Some(crate::types::BaCoeffs::fir(vec![1.0]));
            Ok(DesignStatus::Completed)
        }
    }

    #[test]
    fn test_external_register() {
        let mut registry = FilterRegistry::with_builtins();
        let descriptor = registry
            .register(|| Ok(Box::new(Passthrough) as Box<dyn FilterDesign>))
            .unwrap();
        assert_eq!(descriptor.name, "passthrough");
        assert_eq!(registry.len(), 6);
        assert!(registry.instantiate("passthrough").is_ok());
    }
}
