//! # Filter Capability Tree
//!
//! [`build_filter_tree`] combines the capability fragments of every
//! registered design class into one nested map:
//!
//! ```text
//! response type -> filter kind -> class -> order mode -> field specs
//! ```
//!
//! Each class is instantiated through the factory first; classes that
//! cannot be created are left out with a warning instead of failing the
//! whole build. Per-response extras are concatenated onto the class
//! branch, and the shared `"COM"` fragment is merged after the
//! class-specific entries so specific values stay in front. The result
//! is frozen into a [`FilterTree`] offering lookups only.
//!
//! # Example
//!
//! ```
//! use rfda_core::factory::FilterFactory;
//! use rfda_core::registry::FilterRegistry;
//! use rfda_core::tree::build_filter_tree;
//!
//! let registry = FilterRegistry::with_builtins();
//! let mut factory = FilterFactory::new();
//! let tree = build_filter_tree(&registry, &mut factory);
//!
//! assert!(tree.classes("LP", "IIR").contains(&"butterworth"));
//! assert!(tree.get(&["LP", "FIR", "ma", "man"]).is_some());
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capability::{merge_caps, CapMap, CapNode, FrozenNode, MergePolicy};
use crate::factory::FilterFactory;
use crate::frozen::{Freeze, FrozenDict};
use crate::registry::FilterRegistry;

// ----------------------------------------------------------------------------
// The frozen tree
// ----------------------------------------------------------------------------

/// The assembled, read-only capability tree.
///
/// Level order is response type, filter kind, class name, order mode.
/// The tree is built once per session by [`build_filter_tree`] and
/// shared from then on; there is no mutating API, so widgets holding a
/// reference cannot corrupt each other's view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterTree {
    root: FrozenDict<String, FrozenNode>,
}

impl FilterTree {
    /// Top level of the tree, keyed by response type.
    pub fn root(&self) -> &FrozenDict<String, FrozenNode> {
        &self.root
    }

    /// Walk the tree along `path`, e.g. `["LP", "FIR", "ma", "min"]`.
    ///
    /// Returns `None` for an empty path or as soon as a key is absent
    /// or a leaf is reached early.
    pub fn get(&self, path: &[&str]) -> Option<&FrozenNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for key in rest {
            node = node.get(key)?;
        }
        Some(node)
    }

    /// Response types offered by at least one class, in key order.
    pub fn response_types(&self) -> Vec<&str> {
        self.root.keys().map(String::as_str).collect()
    }

    /// Class names under a response type / filter kind branch, in key
    /// order. Empty when the branch does not exist.
    pub fn classes(&self, response: &str, kind: &str) -> Vec<&str> {
        self.get(&[response, kind])
            .and_then(FrozenNode::as_map)
            .map(|classes| classes.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

// ----------------------------------------------------------------------------
// Building
// ----------------------------------------------------------------------------

/// Assemble the capability tree for every class in `registry`.
///
/// Classes are visited in name order. Each one is selected through the
/// factory, which proves the class can actually be instantiated; a
/// class that fails is logged and skipped, the rest of the tree builds
/// normally. The factory ends up with the last usable class selected.
pub fn build_filter_tree(registry: &FilterRegistry, factory: &mut FilterFactory) -> FilterTree {
    let mut root = CapMap::new();
    let mut built = 0usize;

    for name in registry.names() {
        if let Err(e) = factory.create_design(name, registry) {
            warn!(
                class = name,
                error = %e,
                "cannot instantiate design class, leaving it out of the filter tree"
            );
            continue;
        }
        let Some(descriptor) = registry.descriptor(name) else {
            continue;
        };
        let kind = descriptor.kind.as_str();

        for (response, modes) in &descriptor.capabilities {
            let classes = subtree(&mut root, &[response.as_str(), kind]);
            classes.insert(name.to_string(), modes.clone());
        }
        if let Some(extra) = &descriptor.extra_capabilities {
            apply_extras(&mut root, name, kind, &descriptor.capabilities, extra);
        }

        debug!(class = name, kind, "merged design class into the filter tree");
        built += 1;
    }

    info!(classes = built, "filter capability tree assembled");
    FilterTree { root: root.freeze() }
}

/// Descend (creating map levels as needed) and return the map at
/// `path`. A leaf squatting on the path is replaced by an empty map.
fn subtree<'a>(map: &'a mut CapMap, path: &[&str]) -> &'a mut CapMap {
    let mut current = map;
    for key in path {
        let node = current
            .entry((*key).to_string())
            .or_insert_with(CapNode::map);
        if node.as_map().is_none() {
            warn!(key = *key, "leaf found where a tree branch is needed, replacing it");
            *node = CapNode::map();
        }
        current = match node {
            CapNode::Map(m) => m,
            _ => unreachable!("node was just normalized to a map"),
        };
    }
    current
}

/// Merge a class's extra capability fragments into the tree.
///
/// Non-`"COM"` fragments are concatenated onto the matching response
/// branch of the class. The `"COM"` fragment is then merged into every
/// order mode the class already offers, after the specific entries, so
/// class-specific values keep precedence over shared ones.
fn apply_extras(root: &mut CapMap, class: &str, kind: &str, caps: &CapMap, extra: &CapMap) {
    for (response, fragment) in extra {
        if response == "COM" {
            continue;
        }
        if !caps.contains_key(response) {
            warn!(
                class,
                response = response.as_str(),
                "extra capabilities for a response type the class does not offer, ignoring"
            );
            continue;
        }
        let Some(fragment) = fragment.as_map() else {
            warn!(
                class,
                response = response.as_str(),
                "extra capabilities must be a mapping, ignoring"
            );
            continue;
        };
        let classes = subtree(root, &[response.as_str(), kind]);
        if let Some(CapNode::Map(modes)) = classes.get_mut(class) {
            merge_caps(modes, fragment, MergePolicy::Add1);
        }
    }

    let Some(common) = extra.get("COM").and_then(CapNode::as_map) else {
        return;
    };
    for response in caps.keys() {
        let classes = subtree(root, &[response.as_str(), kind]);
        let Some(CapNode::Map(modes)) = classes.get_mut(class) else {
            continue;
        };
        // Only modes the class already offers pick up the shared part.
        let offered: Vec<String> = modes.keys().cloned().collect();
        for mode in offered {
            let Some(overlay) = common.get(&mode).and_then(CapNode::as_map) else {
                continue;
            };
            if let Some(CapNode::Map(target)) = modes.get_mut(&mode) {
                merge_caps(target, overlay, MergePolicy::Add2);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{cap_map, FieldState};
    use crate::design::FilterDesign;
    use crate::registry::DesignDescriptor;
    use crate::types::{DesignError, DesignMethod, DesignStatus, FilterKind, FilterState};

    fn builtin_tree() -> FilterTree {
        let registry = FilterRegistry::with_builtins();
        let mut factory = FilterFactory::new();
        build_filter_tree(&registry, &mut factory)
    }

    // -------------------------------------------------------------- shape

    #[test]
    fn test_builtin_shape() {
        let tree = builtin_tree();
        assert_eq!(tree.classes("LP", "FIR"), ["fir_window", "ma", "manual_fir"]);
        assert_eq!(tree.classes("LP", "IIR"), ["butterworth", "manual_iir"]);
        assert_eq!(tree.classes("BP", "IIR"), ["manual_iir"]);
        assert_eq!(tree.response_types(), ["BP", "BS", "DIFF", "HIL", "HP", "LP"]);
    }

    #[test]
    fn test_branch_contents() {
        let registry = FilterRegistry::with_builtins();
        let mut factory = FilterFactory::new();
        let tree = build_filter_tree(&registry, &mut factory);

        let caps = &registry.descriptor("butterworth").unwrap().capabilities;
        let want = caps["LP"].as_map().unwrap()["man"].clone();
        assert_eq!(*tree.get(&["LP", "IIR", "butterworth", "man"]).unwrap(), want);
    }

    #[test]
    fn test_missing_lookups() {
        let tree = builtin_tree();
        assert!(tree.get(&[]).is_none());
        assert!(tree.get(&["XY"]).is_none());
        assert!(tree.get(&["LP", "FIR", "ma", "man", "fo", "too deep"]).is_none());
        assert!(tree.classes("LP", "XYZ").is_empty());
    }

    // -------------------------------------------------------------- extras

    #[test]
    fn test_com_note_placement() {
        let tree = builtin_tree();
        let msg = tree
            .get(&["LP", "FIR", "ma", "min", "msg"])
            .expect("shared note merged under min");
        assert!(matches!(msg, FrozenNode::Entry(FieldState::Active, _)));
        assert!(tree.get(&["LP", "FIR", "ma", "man", "msg"]).is_none());
        assert!(tree.get(&["HP", "FIR", "ma", "min", "msg"]).is_some());
    }

    #[test]
    fn test_extra_note_placement() {
        let tree = builtin_tree();
        assert!(tree.get(&["HP", "FIR", "fir_window", "man", "msg"]).is_some());
        assert!(tree.get(&["BS", "FIR", "fir_window", "man", "msg"]).is_some());
        assert!(tree.get(&["LP", "FIR", "fir_window", "man", "msg"]).is_none());
    }

    // A class exercising every merge direction at once: a per-response
    // extra colliding with a built-in entry, a shared fragment colliding
    // with a specific one, and an extra for a response it never offers.
    #[derive(Debug)]
    struct Annotated;

    impl FilterDesign for Annotated {
        fn name(&self) -> &'static str {
            "annotated"
        }

        fn display_name(&self) -> &'static str {
            "Annotated"
        }

        fn kind(&self) -> FilterKind {
            FilterKind::Fir
        }

        fn capabilities(&self) -> CapMap {
            cap_map(&[(
                "LP",
                CapNode::map_of(&[
                    (
                        "man",
                        CapNode::map_of(&[(
                            "msg",
                            CapNode::entry(FieldState::Active, &["built-in hint"]),
                        )]),
                    ),
                    (
                        "min",
                        CapNode::map_of(&[(
                            "msg",
                            CapNode::entry(FieldState::Active, &["specific hint"]),
                        )]),
                    ),
                ]),
            )])
        }

        fn extra_capabilities(&self) -> Option<CapMap> {
            Some(cap_map(&[
                (
                    "LP",
                    CapNode::map_of(&[(
                        "man",
                        CapNode::map_of(&[(
                            "msg",
                            CapNode::entry(FieldState::Disabled, &["added hint"]),
                        )]),
                    )]),
                ),
                (
                    "COM",
                    CapNode::map_of(&[(
                        "min",
                        CapNode::map_of(&[(
                            "msg",
                            CapNode::entry(FieldState::Disabled, &["common hint"]),
                        )]),
                    )]),
                ),
                ("BP", CapNode::map_of(&[("man", CapNode::map())])),
            ]))
        }

        fn design(
            &mut self,
            _method: DesignMethod,
            _state: &mut FilterState,
        ) -> Result<DesignStatus, DesignError> {
            Ok(DesignStatus::Completed)
        }
    }

    fn annotated_tree() -> FilterTree {
        let mut registry = FilterRegistry::new();
        registry
            .register(|| Ok(Box::new(Annotated) as Box<dyn FilterDesign>))
            .unwrap();
        let mut factory = FilterFactory::new();
        build_filter_tree(&registry, &mut factory)
    }

    #[test]
    fn test_extras_order() {
        let tree = annotated_tree();
        let msg = tree.get(&["LP", "FIR", "annotated", "man", "msg"]).unwrap();
        // existing flag wins, added payload comes first
        assert_eq!(
            *msg,
            CapNode::entry(FieldState::Active, &["added hint", "built-in hint"])
        );
    }

    #[test]
    fn test_com_order() {
        let tree = annotated_tree();
        let msg = tree.get(&["LP", "FIR", "annotated", "min", "msg"]).unwrap();
        assert_eq!(
            *msg,
            CapNode::entry(FieldState::Active, &["specific hint", "common hint"])
        );
    }

    #[test]
    fn test_unoffered_extras_dropped() {
        let tree = annotated_tree();
        assert!(tree.get(&["BP"]).is_none());
    }

    // -------------------------------------------------------------- failures

    #[test]
    fn test_failing_class_skipped() {
        let mut registry = FilterRegistry::with_builtins();
        registry.register_descriptor(DesignDescriptor::metadata_only(
            "ghost",
            "Ghost",
            FilterKind::Fir,
            cap_map(&[("LP", CapNode::map_of(&[("man", CapNode::map())]))]),
        ));
        let mut factory = FilterFactory::new();
        let tree = build_filter_tree(&registry, &mut factory);

        assert!(!tree.classes("LP", "FIR").contains(&"ghost"));
        assert!(tree.classes("LP", "FIR").contains(&"ma"));
    }

    // -------------------------------------------------------------- stability

    #[test]
    fn test_rebuild_identical() {
        let registry = FilterRegistry::with_builtins();
        let mut factory = FilterFactory::new();
        let first = build_filter_tree(&registry, &mut factory);
        let second = build_filter_tree(&registry, &mut factory);
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialize() {
        let tree = builtin_tree();
        let text = serde_yaml::to_string(&tree).unwrap();
        assert!(text.contains("butterworth"));
        assert!(text.contains("fir_window"));
    }
}
