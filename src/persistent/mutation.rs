//! Batch mutation sessions.
//!
//! A [`MutationContext`] starts from an existing map, applies any number of
//! updates, and is frozen back into an [`ImmutableMap`] by
//! [`finish`](MutationContext::finish).
//!
//! # Ownership
//!
//! Each context holds a fresh owner tag. Nodes the context creates carry that
//! tag and are edited in place by later calls; nodes shared with the source
//! map (or any other map) carry a different tag and are copied first. The
//! source map is therefore never affected, and finishing needs no extra copy.
//!
//! # Examples
//!
//! ```rust
//! use hamt_map::persistent::{ImmutableMap, MapError};
//!
//! let map: ImmutableMap<&str, i32> = ImmutableMap::new();
//! let mut context = map.mutate();
//! context.set("x", 1).unwrap();
//! context.set("y", 2).unwrap();
//! let map2 = context.finish().unwrap();
//!
//! assert_eq!(map.len(), 0);
//! assert_eq!(map2.len(), 2);
//! assert_eq!(map2.get("x"), Some(&1));
//!
//! // The session is over.
//! assert_eq!(context.set("z", 3), Err(MapError::ContextFinished));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;

use super::ReferenceCounter;
use super::bits;
use super::error::MapError;
use super::hashmap::ImmutableMap;
use super::input::{self, IntoPair};
use super::node::{Assoc, Node, Without};
use super::owner::OwnerTag;

// =============================================================================
// MutationContext Definition
// =============================================================================

/// A single-threaded session for applying many updates to a map.
///
/// Reads work for the whole lifetime of the context, including after
/// [`finish`](Self::finish). Mutating calls after `finish` fail with
/// [`MapError::ContextFinished`].
///
/// A context is a builder, not a value: it implements neither `Clone`,
/// `PartialEq` nor `Hash`, and it cannot cross threads (`!Send`, `!Sync`).
/// The only way to obtain a map from it is `finish`.
pub struct MutationContext<K, V> {
    root: ReferenceCounter<Node<K, V>>,
    length: usize,
    owner: OwnerTag,
    finished: bool,
    /// Marker to ensure `!Send` and `!Sync`
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(MutationContext<i32, i32>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(MutationContext<String, String>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(MutationContext<i32, i32>: Hash, PartialEq);
static_assertions::assert_not_impl_any!(ImmutableMap<i32, i32>: From<MutationContext<i32, i32>>);

impl<K, V> MutationContext<K, V> {
    pub(crate) fn new(root: ReferenceCounter<Node<K, V>>, length: usize) -> Self {
        let owner = OwnerTag::fresh();
        tracing::trace!(owner = owner.value(), length, "opening mutation context");
        Self {
            root,
            length,
            owner,
            finished: false,
            _marker: PhantomData,
        }
    }

    /// Returns the number of entries currently in the context.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the context currently holds no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` once [`finish`](Self::finish) has succeeded.
    #[inline]
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    fn ensure_live(&self) -> Result<(), MapError<K>> {
        if self.finished {
            tracing::debug!(owner = self.owner.value(), "mutation context used after finish");
            return Err(MapError::ContextFinished);
        }
        Ok(())
    }
}

impl<K: Hash + Eq, V> MutationContext<K, V> {
    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.find(0, bits::key_hash(key), key)
    }

    /// Returns the value for `key`, or `default` if the key is absent.
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
    pub fn lookup<Q>(&self, key: &Q) -> Result<&V, MapError<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        self.get(key).ok_or_else(|| MapError::KeyNotFound {
            key: key.to_owned(),
        })
    }

    /// Returns `true` if the context contains a value for the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> MutationContext<K, V> {
    /// Binds `key` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ContextFinished`] after [`finish`](Self::finish).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let mut context = ImmutableMap::new().mutate();
    /// context.set(1, "one").unwrap();
    /// context.set(1, "uno").unwrap();
    /// assert_eq!(context.len(), 1);
    /// assert_eq!(context.get(&1), Some(&"uno"));
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Result<(), MapError<K>> {
        self.ensure_live()?;
        self.insert(key, value);
        Ok(())
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ContextFinished`] after [`finish`](Self::finish),
    /// or [`MapError::KeyNotFound`] carrying the key if it is absent. The
    /// context is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::{ImmutableMap, MapError};
    ///
    /// let map = ImmutableMap::new().set("a".to_string(), 1);
    /// let mut context = map.mutate();
    /// context.delete("a").unwrap();
    /// assert!(context.is_empty());
    /// assert_eq!(
    ///     context.delete("a"),
    ///     Err(MapError::KeyNotFound { key: "a".to_string() })
    /// );
    /// ```
    pub fn delete<Q>(&mut self, key: &Q) -> Result<(), MapError<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        self.ensure_live()?;
        match Node::without(&mut self.root, 0, bits::key_hash(key), key, self.owner) {
            Without::NotFound => Err(MapError::KeyNotFound {
                key: key.to_owned(),
            }),
            Without::Empty => {
                self.root = ReferenceCounter::new(Node::empty(self.owner));
                self.length = 0;
                Ok(())
            }
            Without::Changed => {
                self.length -= 1;
                Ok(())
            }
        }
    }

    /// Applies every pair of `items` in order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ContextFinished`] after [`finish`](Self::finish),
    /// or [`MapError::ShapeMismatch`] naming the first element that is not a
    /// pair. Nothing is applied on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let mut context = ImmutableMap::<&str, &str>::new().mutate();
    /// context.update([["a", "1"], ["b", "2"]]).unwrap();
    /// assert_eq!(context.len(), 2);
    /// assert!(context.update(vec![vec!["c"]]).is_err());
    /// assert_eq!(context.len(), 2);
    /// ```
    pub fn update<I>(&mut self, items: I) -> Result<(), MapError<K>>
    where
        I: IntoIterator,
        I::Item: IntoPair<K, V>,
    {
        self.ensure_live()?;
        for (key, value) in input::collect_pairs(items)? {
            self.insert(key, value);
        }
        Ok(())
    }

    /// Freezes the context into a map and ends the session.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ContextFinished`] if the context was already
    /// finished.
    pub fn finish(&mut self) -> Result<ImmutableMap<K, V>, MapError<K>> {
        self.ensure_live()?;
        self.finished = true;
        tracing::trace!(
            owner = self.owner.value(),
            length = self.length,
            "finishing mutation context"
        );
        Ok(ImmutableMap::from_parts(
            ReferenceCounter::clone(&self.root),
            self.length,
        ))
    }

    /// Binds `key` to `value` without checking liveness.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        let hash = bits::key_hash(&key);
        if Node::assoc(&mut self.root, 0, hash, key, value, self.owner) == Assoc::Inserted {
            self.length += 1;
        }
    }

    /// Consumes a context that never left this crate.
    pub(crate) fn freeze(self) -> ImmutableMap<K, V> {
        ImmutableMap::from_parts(self.root, self.length)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MutationContext<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MutationContext")
            .field("owner", &self.owner)
            .field("length", &self.length)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
