//! Persistent (immutable) hash map based on HAMT.
//!
//! This module provides [`ImmutableMap`], an immutable hash map that uses
//! structural sharing for efficient updates.
//!
//! # Overview
//!
//! `ImmutableMap` is a Hash Array Mapped Trie: a 32-way branching trie
//! navigated by successive 5-bit chunks of a 32-bit folded key hash.
//!
//! - O(log32 N) get, set and delete (effectively O(1) for practical sizes)
//! - O(1) len and `is_empty`
//! - O(N) structural hash, computed once and cached
//!
//! Every update returns a new map. Untouched subtrees are shared between the
//! old and the new map, and no node reachable from a live map is ever
//! modified.
//!
//! # Examples
//!
//! ```rust
//! use hamt_map::persistent::ImmutableMap;
//!
//! let map = ImmutableMap::new()
//!     .set("one".to_string(), 1)
//!     .set("two".to_string(), 2);
//!
//! let updated = map.set("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```
//!
//! # Batch updates
//!
//! Many updates in a row are cheaper through a
//! [`MutationContext`](super::MutationContext), which edits the nodes it has
//! already copied in place instead of copying them again:
//!
//! ```rust
//! use hamt_map::persistent::ImmutableMap;
//!
//! let map: ImmutableMap<i32, i32> = ImmutableMap::new();
//! let mut context = map.mutate();
//! for index in 0..1000 {
//!     context.set(index, index * 2).unwrap();
//! }
//! let built = context.finish().unwrap();
//! assert_eq!(built.len(), 1000);
//! assert!(map.is_empty());
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use super::ReferenceCounter;
use super::bits;
use super::error::MapError;
use super::input::{self, IntoPair};
use super::mutation::MutationContext;
use super::node::{Assoc, Node, Without};
use super::owner::OwnerTag;
use super::structural_hash;
use super::view::{ItemsView, Iter, KeysView, ValuesView};

// =============================================================================
// ImmutableMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on HAMT.
///
/// # Time Complexity
///
/// | Operation          | Complexity        |
/// |--------------------|-------------------|
/// | `new`              | O(1)              |
/// | `get`              | O(log32 N)        |
/// | `set`              | O(log32 N)        |
/// | `delete`           | O(log32 N)        |
/// | `contains_key`     | O(log32 N)        |
/// | `len`              | O(1)              |
/// | `structural_hash`  | O(N) once, then O(1) |
///
/// # Examples
///
/// ```rust
/// use hamt_map::persistent::ImmutableMap;
///
/// let map = ImmutableMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
pub struct ImmutableMap<K, V> {
    /// Root node of the trie; always a bitmap node.
    root: ReferenceCounter<Node<K, V>>,
    /// Number of entries.
    length: usize,
    /// Structural hash, computed on first request.
    cached_hash: OnceLock<i64>,
}

impl<K, V> ImmutableMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map: ImmutableMap<String, i32> = ImmutableMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(ReferenceCounter::new(Node::empty(OwnerTag::NONE)), 0)
    }

    /// Freezes a trie into a map.
    pub(crate) const fn from_parts(root: ReferenceCounter<Node<K, V>>, length: usize) -> Self {
        Self {
            root,
            length,
            cached_hash: OnceLock::new(),
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new().set("a", 1).set("b", 2);
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns a lazy iterator over key-value pairs.
    ///
    /// The order is unrelated to key order and must not be relied upon.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.root, self.length)
    }

    /// Returns a sized, restartable view of the keys.
    #[must_use]
    pub fn keys(&self) -> KeysView<'_, K, V> {
        KeysView::new(&self.root, self.length)
    }

    /// Returns a sized, restartable view of the values.
    #[must_use]
    pub fn values(&self) -> ValuesView<'_, K, V> {
        ValuesView::new(&self.root, self.length)
    }

    /// Returns a sized, restartable view of the key-value pairs.
    #[must_use]
    pub fn items(&self) -> ItemsView<'_, K, V> {
        ItemsView::new(&self.root, self.length)
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// Sharing a root implies equality; the converse does not hold.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.root, &other.root)
    }
}

// =============================================================================
// Lookup
// =============================================================================

impl<K: Hash + Eq, V> ImmutableMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash` and
    /// `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new().set("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.find(0, bits::key_hash(key), key)
    }

    /// Returns the value for `key`, or `default` if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new().set("a", 1);
    /// assert_eq!(*map.get_or("a", &-1), 1);
    /// assert_eq!(*map.get_or("c", &-1), -1);
    /// ```
    #[must_use]
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value for `key`, failing if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyNotFound`] carrying the key if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::{ImmutableMap, MapError};
    ///
    /// let map = ImmutableMap::new().set("a".to_string(), 1);
    /// assert_eq!(map.lookup("a"), Ok(&1));
    /// assert_eq!(
    ///     map.lookup("b"),
    ///     Err(MapError::KeyNotFound { key: "b".to_string() })
    /// );
    /// ```
    pub fn lookup<Q>(&self, key: &Q) -> Result<&V, MapError<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        self.get(key).ok_or_else(|| MapError::KeyNotFound {
            key: key.to_owned(),
        })
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns the stored key and its value.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = bits::key_hash(key);
        self.root
            .find_key(0, hash, key)
            .zip(self.root.find(0, hash, key))
    }
}

// =============================================================================
// Updates
// =============================================================================

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> ImmutableMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().set(key, value)
    }

    /// Returns a map with `key` bound to `value`.
    ///
    /// If the key is already bound to an equal value, the returned map shares
    /// this map's root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map1 = ImmutableMap::new().set("key", 1);
    /// let map2 = map1.set("key", 2);
    ///
    /// assert_eq!(map1.get("key"), Some(&1)); // Original unchanged
    /// assert_eq!(map2.get("key"), Some(&2)); // New version
    /// ```
    #[must_use]
    pub fn set(&self, key: K, value: V) -> Self {
        let hash = bits::key_hash(&key);
        let mut root = ReferenceCounter::clone(&self.root);
        match Node::assoc(&mut root, 0, hash, key, value, OwnerTag::NONE) {
            Assoc::Unchanged => self.clone(),
            Assoc::Replaced => Self::from_parts(root, self.length),
            Assoc::Inserted => Self::from_parts(root, self.length + 1),
        }
    }

    /// Returns a map without `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyNotFound`] carrying the key if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new()
    ///     .set("a".to_string(), 1)
    ///     .set("b".to_string(), 2);
    /// let removed = map.delete("a").unwrap();
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert!(removed.delete("a").is_err());
    /// ```
    pub fn delete<Q>(&self, key: &Q) -> Result<Self, MapError<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let hash = bits::key_hash(key);
        let mut root = ReferenceCounter::clone(&self.root);
        match Node::without(&mut root, 0, hash, key, OwnerTag::NONE) {
            Without::NotFound => Err(MapError::KeyNotFound {
                key: key.to_owned(),
            }),
            Without::Empty => Ok(Self::new()),
            Without::Changed => Ok(Self::from_parts(root, self.length - 1)),
        }
    }

    /// Returns a map with every pair of `items` applied in order.
    ///
    /// Elements may be tuples or two-item sequences (see [`IntoPair`]).
    /// Later pairs win over earlier ones with the same key. The result is
    /// the same as calling [`set`](Self::set) once per pair, but nodes
    /// created during this call are reused instead of copied again.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ShapeMismatch`] naming the first element that is
    /// not a pair. The input is validated before anything is applied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::{ImmutableMap, MapError};
    ///
    /// let map = ImmutableMap::new().set(1, 10);
    /// let updated = map.update(vec![(2, 20), (3, 30), (1, 11)]).unwrap();
    /// assert_eq!(updated.len(), 3);
    /// assert_eq!(updated.get(&1), Some(&11));
    ///
    /// let malformed = map.update(vec![vec![4, 40], vec![5]]);
    /// assert_eq!(
    ///     malformed.unwrap_err(),
    ///     MapError::ShapeMismatch { position: 1, length: 1 }
    /// );
    /// ```
    pub fn update<I>(&self, items: I) -> Result<Self, MapError<K>>
    where
        I: IntoIterator,
        I::Item: IntoPair<K, V>,
    {
        let pairs = input::collect_pairs(items)?;
        if pairs.is_empty() {
            return Ok(self.clone());
        }

        let owner = OwnerTag::fresh();
        let mut root = ReferenceCounter::clone(&self.root);
        let mut length = self.length;
        for (key, value) in pairs {
            let hash = bits::key_hash(&key);
            if Node::assoc(&mut root, 0, hash, key, value, owner) == Assoc::Inserted {
                length += 1;
            }
        }
        Ok(Self::from_parts(root, length))
    }

    /// Merges two maps, with values from `other` taking precedence on key
    /// conflicts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map1 = ImmutableMap::new().set("a", 1).set("b", 2);
    /// let map2 = ImmutableMap::new().set("b", 20).set("c", 3);
    ///
    /// let merged = map1.merge(&map2);
    /// assert_eq!(merged.get("a"), Some(&1));
    /// assert_eq!(merged.get("b"), Some(&20));
    /// assert_eq!(merged.get("c"), Some(&3));
    /// ```
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        let owner = OwnerTag::fresh();
        let mut root = ReferenceCounter::clone(&self.root);
        let mut length = self.length;
        for (key, value) in other {
            let hash = bits::key_hash(key);
            if Node::assoc(&mut root, 0, hash, key.clone(), value.clone(), owner)
                == Assoc::Inserted
            {
                length += 1;
            }
        }
        Self::from_parts(root, length)
    }

    /// Opens a batch mutation session over this map.
    ///
    /// The context starts with this map's entries and shares its nodes; the
    /// map itself is never affected by anything done through the context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map: ImmutableMap<&str, i32> = ImmutableMap::new();
    /// let mut context = map.mutate();
    /// context.set("x", 1).unwrap();
    /// context.set("y", 2).unwrap();
    /// let map2 = context.finish().unwrap();
    ///
    /// assert_eq!(map.len(), 0);
    /// assert_eq!(map2.len(), 2);
    /// assert_eq!(map2.get("x"), Some(&1));
    /// ```
    #[must_use]
    pub fn mutate(&self) -> MutationContext<K, V> {
        MutationContext::new(ReferenceCounter::clone(&self.root), self.length)
    }
}

// =============================================================================
// Structural hash
// =============================================================================

impl<K: Hash, V: Hash> ImmutableMap<K, V> {
    /// Returns an order-independent hash of the map's contents.
    ///
    /// Equal maps always have equal hashes. The value is computed on first
    /// use and cached for the lifetime of this map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let forward = ImmutableMap::new().set(1, "a").set(2, "b");
    /// let backward = ImmutableMap::new().set(2, "b").set(1, "a");
    /// assert_eq!(forward.structural_hash(), backward.structural_hash());
    /// ```
    pub fn structural_hash(&self) -> i64 {
        *self
            .cached_hash
            .get_or_init(|| structural_hash::compute(self.length, self.iter()))
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

// Manual impl: cloning a map only bumps the root's reference count.
impl<K, V> Clone for ImmutableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: ReferenceCounter::clone(&self.root),
            length: self.length,
            cached_hash: self.cached_hash.clone(),
        }
    }
}

impl<K, V> Default for ImmutableMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> FromIterator<(K, V)> for ImmutableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new().mutate();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context.freeze()
    }
}

impl<'a, K, V> IntoIterator for &'a ImmutableMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone, V: Clone> IntoIterator for ImmutableMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for ImmutableMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }

        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|other_value| other_value == value))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for ImmutableMap<K, V> {}

impl<K: Hash, V: Hash> Hash for ImmutableMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.structural_hash());
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ImmutableMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
