//! # Capability Descriptions
//!
//! Filter design classes describe which specification fields apply to
//! each response type and order mode through a small tree of
//! [`CapNode`] values: nested maps with leaf entries carrying a
//! [`FieldState`] flag plus the affected field names.
//!
//! Trees from several sources are combined with [`merge_caps`], which
//! supports the four [`MergePolicy`] modes used when a class overlays
//! shared capability fragments onto its per-response entries. Once the
//! global tree is assembled it is frozen into read-only
//! [`FrozenNode`] / [`FrozenDict`] form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::frozen::{Freeze, FrozenDict};

/// A mutable capability tree level keyed by field or category name.
pub type CapMap = BTreeMap<String, CapNode>;

// ----------------------------------------------------------------------------
// Field state flags
// ----------------------------------------------------------------------------

/// Visibility / interactivity flag attached to a specification field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldState {
    /// Shown and editable.
    #[serde(rename = "a")]
    Active,
    /// Shown but read-only.
    #[serde(rename = "d")]
    Disabled,
    /// Shown greyed-out; the value is not used by the design.
    #[serde(rename = "u")]
    Unused,
    /// Not shown at all.
    #[serde(rename = "i")]
    Invisible,
}

impl FieldState {
    /// One-letter code as stored in capability entries.
    pub fn as_char(&self) -> char {
        match self {
            FieldState::Active => 'a',
            FieldState::Disabled => 'd',
            FieldState::Unused => 'u',
            FieldState::Invisible => 'i',
        }
    }
}

impl fmt::Display for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for FieldState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "active" => Ok(FieldState::Active),
            "d" | "disabled" => Ok(FieldState::Disabled),
            "u" | "unused" => Ok(FieldState::Unused),
            "i" | "invisible" => Ok(FieldState::Invisible),
            _ => Err(format!("unknown field state '{s}'")),
        }
    }
}

// ----------------------------------------------------------------------------
// Capability nodes
// ----------------------------------------------------------------------------

/// One node of a capability tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapNode {
    /// Nested level, e.g. a response type or an order mode.
    Map(CapMap),
    /// A field entry: state flag plus the field names it governs.
    Entry(FieldState, Vec<String>),
    /// A bare list of names.
    List(Vec<String>),
    /// Free text, e.g. a message shown alongside the design controls.
    Text(String),
}

impl CapNode {
    /// Empty nested map.
    pub fn map() -> CapNode {
        CapNode::Map(CapMap::new())
    }

    /// Nested map built from key / node pairs.
    pub fn map_of(entries: &[(&str, CapNode)]) -> CapNode {
        CapNode::Map(cap_map(entries))
    }

    /// Field entry from a flag and field names.
    pub fn entry(flag: FieldState, items: &[&str]) -> CapNode {
        CapNode::Entry(flag, items.iter().map(|s| s.to_string()).collect())
    }

    /// Bare list of names.
    pub fn list(items: &[&str]) -> CapNode {
        CapNode::List(items.iter().map(|s| s.to_string()).collect())
    }

    /// Free text node.
    pub fn text(s: &str) -> CapNode {
        CapNode::Text(s.to_string())
    }

    pub fn as_map(&self) -> Option<&CapMap> {
        match self {
            CapNode::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut CapMap> {
        match self {
            CapNode::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Build a [`CapMap`] from key / node pairs.
pub fn cap_map(entries: &[(&str, CapNode)]) -> CapMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ----------------------------------------------------------------------------
// Merging
// ----------------------------------------------------------------------------

/// How conflicting leaf values are combined by [`merge_caps`].
///
/// Nested maps always merge recursively and equal values are always
/// left alone; the policy only decides what happens when both sides
/// carry different non-map values for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the existing value.
    Keep1,
    /// Take the incoming value.
    Keep2,
    /// Concatenate payloads with the incoming content first.
    Add1,
    /// Concatenate payloads with the existing content first.
    Add2,
}

/// Merge `src` into `dst` key by key.
///
/// Keys missing from `dst` are inserted. For keys present on both
/// sides: equal values are kept as-is, two maps merge recursively, and
/// leaves combine according to `policy`. The replacing policies apply
/// regardless of value kind; only the concatenating policies can hit a
/// kind mismatch, which logs a merge conflict and keeps the existing
/// value. Entry leaves always keep the existing side's state flag;
/// only payloads are concatenated.
pub fn merge_caps(dst: &mut CapMap, src: &CapMap, policy: MergePolicy) {
    for (key, incoming) in src {
        match dst.get_mut(key) {
            None => {
                dst.insert(key.clone(), incoming.clone());
            }
            Some(existing) => merge_node(key, existing, incoming, policy),
        }
    }
}

fn merge_node(key: &str, existing: &mut CapNode, incoming: &CapNode, policy: MergePolicy) {
    if existing == incoming {
        return;
    }
    if let (CapNode::Map(d1), CapNode::Map(d2)) = (&mut *existing, incoming) {
        merge_caps(d1, d2, policy);
        return;
    }
    match policy {
        MergePolicy::Keep1 => {}
        MergePolicy::Keep2 => *existing = incoming.clone(),
        MergePolicy::Add1 => concat_leaf(key, existing, incoming, true),
        MergePolicy::Add2 => concat_leaf(key, existing, incoming, false),
    }
}

/// Concatenate two leaves of the same kind into `existing`. With
/// `incoming_first` the incoming payload precedes the existing one.
fn concat_leaf(key: &str, existing: &mut CapNode, incoming: &CapNode, incoming_first: bool) {
    let merged = match (&*existing, incoming) {
        (CapNode::List(a), CapNode::List(b)) => {
            Some(CapNode::List(join(a, b, incoming_first)))
        }
        (CapNode::Entry(flag, a), CapNode::Entry(_, b)) => {
            Some(CapNode::Entry(*flag, join(a, b, incoming_first)))
        }
        (CapNode::Text(a), CapNode::Text(b)) => {
            let text = if incoming_first {
                format!("{b}{a}")
            } else {
                format!("{a}{b}")
            };
            Some(CapNode::Text(text))
        }
        _ => None,
    };
    match merged {
        Some(node) => *existing = node,
        None => {
            warn!(key, "merge conflict: incompatible value kinds, keeping existing entry");
        }
    }
}

fn join(existing: &[String], incoming: &[String], incoming_first: bool) -> Vec<String> {
    let (first, second) = if incoming_first {
        (incoming, existing)
    } else {
        (existing, incoming)
    };
    let mut items = first.to_vec();
    items.extend(second.iter().cloned());
    items
}

// ----------------------------------------------------------------------------
// Frozen form
// ----------------------------------------------------------------------------

/// Read-only counterpart of [`CapNode`]: map levels become
/// [`FrozenDict`]s all the way down, leaves carry over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FrozenNode {
    Map(FrozenDict<String, FrozenNode>),
    Entry(FieldState, Vec<String>),
    List(Vec<String>),
    Text(String),
}

impl FrozenNode {
    pub fn as_map(&self) -> Option<&FrozenDict<String, FrozenNode>> {
        match self {
            FrozenNode::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a child by key when this node is a map level.
    pub fn get(&self, key: &str) -> Option<&FrozenNode> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl Freeze for CapNode {
    type Frozen = FrozenNode;

    fn freeze(self) -> FrozenNode {
        match self {
            CapNode::Map(m) => FrozenNode::Map(m.freeze()),
            CapNode::Entry(flag, items) => FrozenNode::Entry(flag, items),
            CapNode::List(items) => FrozenNode::List(items),
            CapNode::Text(text) => FrozenNode::Text(text),
        }
    }
}

impl PartialEq<CapNode> for FrozenNode {
    fn eq(&self, other: &CapNode) -> bool {
        match (self, other) {
            (FrozenNode::Map(a), CapNode::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            (FrozenNode::Entry(fa, pa), CapNode::Entry(fb, pb)) => fa == fb && pa == pb,
            (FrozenNode::List(a), CapNode::List(b)) => a == b,
            (FrozenNode::Text(a), CapNode::Text(b)) => a == b,
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
