//! # Frozen Maps
//!
//! [`FrozenDict`] is a read-only, cheaply clonable ordered map used for
//! data that is built once and then shared widely, such as the filter
//! capability tree. The API offers lookups and iteration only; there is
//! no way to insert, remove or overwrite entries through the wrapper,
//! so accidental mutation of shared data is rejected at compile time.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use rfda_core::frozen::FrozenDict;
//!
//! let mut caps = BTreeMap::new();
//! caps.insert("man", 4);
//! caps.insert("min", 8);
//! let frozen = FrozenDict::from(caps.clone());
//!
//! assert_eq!(frozen.get("man"), Some(&4));
//! assert_eq!(frozen, caps);          // content equality with plain maps
//! assert_eq!(frozen.to_map(), caps); // mutable escape hatch is a copy
//! ```
//!
//! Mutating calls do not exist and fail to compile:
//!
//! ```compile_fail
//! use std::collections::BTreeMap;
//! use rfda_core::frozen::FrozenDict;
//!
//! let frozen = FrozenDict::from(BTreeMap::from([("a", 1)]));
//! frozen.insert("b", 2);
//! ```

use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::Arc;

/// Recursive conversion of a mutable structure into its frozen form.
///
/// Implemented for [`BTreeMap`] (freezing values recursively) and for
/// leaf node types that freeze into themselves or a read-only variant.
pub trait Freeze {
    type Frozen;

    fn freeze(self) -> Self::Frozen;
}

impl<K: Ord, V: Freeze> Freeze for BTreeMap<K, V> {
    type Frozen = FrozenDict<K, V::Frozen>;

    fn freeze(self) -> Self::Frozen {
        FrozenDict::new(self.into_iter().map(|(k, v)| (k, v.freeze())).collect())
    }
}

/// An immutable ordered map sharing its storage between clones.
///
/// Equality is by content: two `FrozenDict`s compare equal when they
/// hold the same entries, and a `FrozenDict` compares equal to a plain
/// [`BTreeMap`] with the same entries. When the key and value types are
/// hashable the frozen map is too, so it can serve as a key itself.
pub struct FrozenDict<K: Ord, V> {
    inner: Arc<BTreeMap<K, V>>,
}

impl<K: Ord, V> FrozenDict<K, V> {
    /// Freeze an existing map. The map is moved, not copied.
    pub fn new(map: BTreeMap<K, V>) -> Self {
        FrozenDict { inner: Arc::new(map) }
    }

    /// Look up a value by key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key)
    }

    /// True when the key is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.inner.iter()
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.inner.keys()
    }

    /// Iterate over values in key order.
    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.inner.values()
    }

    /// Copy the contents into a fresh mutable map. Edits to the copy
    /// never affect the frozen original.
    pub fn to_map(&self) -> BTreeMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.inner.as_ref().clone()
    }
}

impl<K: Ord, V> Clone for FrozenDict<K, V> {
    fn clone(&self) -> Self {
        FrozenDict { inner: Arc::clone(&self.inner) }
    }
}

impl<K: Ord, V> Default for FrozenDict<K, V> {
    fn default() -> Self {
        FrozenDict::new(BTreeMap::new())
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for FrozenDict<K, V> {
    fn from(map: BTreeMap<K, V>) -> Self {
        FrozenDict::new(map)
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for FrozenDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FrozenDict::new(iter.into_iter().collect())
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a FrozenDict<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, Q, V> Index<&Q> for FrozenDict<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Panics when the key is absent, matching [`BTreeMap`] indexing.
    fn index(&self, key: &Q) -> &V {
        self.inner.get(key).expect("no entry found for key")
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for FrozenDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<K: Ord + PartialEq, V: PartialEq> PartialEq for FrozenDict<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl<K: Ord + Eq, V: Eq> Eq for FrozenDict<K, V> {}

impl<K: Ord + PartialEq, V: PartialEq> PartialEq<BTreeMap<K, V>> for FrozenDict<K, V> {
    fn eq(&self, other: &BTreeMap<K, V>) -> bool {
        self.inner.as_ref() == other
    }
}

impl<K: Ord + PartialEq, V: PartialEq> PartialEq<FrozenDict<K, V>> for BTreeMap<K, V> {
    fn eq(&self, other: &FrozenDict<K, V>) -> bool {
        self == other.inner.as_ref()
    }
}

impl<K: Ord + Hash, V: Hash> Hash for FrozenDict<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state)
    }
}

impl<K: Ord + Serialize, V: Serialize> Serialize for FrozenDict<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

// ============================================================================
// Tests
// ============================================================================
