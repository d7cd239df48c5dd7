//! Lazy traversals over a frozen trie.
//!
//! [`Iter`] walks the trie depth-first with an explicit, bounded stack and
//! yields entries on demand. The views ([`KeysView`], [`ValuesView`],
//! [`ItemsView`]) pair a root with its entry count: they are sized, and every
//! call to `iter` restarts from the beginning.
//!
//! Iteration order is deterministic for one map instance but is not related
//! to key order and may differ between maps holding the same entries.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::slice;

use arrayvec::ArrayVec;

use super::bits;
use super::node::{Node, Slot};

/// Deepest possible stack: seven bitmap levels (shifts 0..=30) plus one
/// collision node below the last of them.
const MAX_DEPTH: usize = 8;

enum Frame<'a, K, V> {
    Bitmap(slice::Iter<'a, Slot<K, V>>),
    Collision(slice::Iter<'a, (K, V)>),
}

impl<'a, K, V> Frame<'a, K, V> {
    fn of(node: &'a Node<K, V>) -> Self {
        match node {
            Node::Bitmap(bitmap) => Self::Bitmap(bitmap.entries.iter()),
            Node::Collision(collision) => Self::Collision(collision.entries.iter()),
        }
    }
}

impl<K, V> Clone for Frame<'_, K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Bitmap(entries) => Self::Bitmap(entries.clone()),
            Self::Collision(entries) => Self::Collision(entries.clone()),
        }
    }
}

// =============================================================================
// Iter
// =============================================================================

/// An iterator over the key-value pairs of a map.
///
/// Created by [`ImmutableMap::iter`](super::ImmutableMap::iter) and
/// [`ItemsView::iter`].
pub struct Iter<'a, K, V> {
    stack: ArrayVec<Frame<'a, K, V>, MAX_DEPTH>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(root: &'a Node<K, V>, length: usize) -> Self {
        let mut stack = ArrayVec::new();
        stack.push(Frame::of(root));
        Self {
            stack,
            remaining: length,
        }
    }
}

// Manual impl: `Clone` must not require `K: Clone` or `V: Clone`.
impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.stack.last_mut()? {
                Frame::Bitmap(entries) => match entries.next() {
                    Some(Slot::Leaf(key, value)) => Some((key, value)),
                    Some(Slot::Child(child)) => {
                        self.stack.push(Frame::of(child));
                        continue;
                    }
                    None => None,
                },
                Frame::Collision(entries) => entries.next().map(|(key, value)| (key, value)),
            };
            match entry {
                Some(entry) => {
                    self.remaining -= 1;
                    return Some(entry);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.clone()).finish()
    }
}

// =============================================================================
// Keys / Values
// =============================================================================

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a map.
pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

// =============================================================================
// Views
// =============================================================================

macro_rules! view {
    ($(#[$meta:meta])* $view:ident, $iter:ident, $wrap:expr) => {
        $(#[$meta])*
        pub struct $view<'a, K, V> {
            root: &'a Node<K, V>,
            length: usize,
        }

        impl<'a, K, V> $view<'a, K, V> {
            pub(crate) const fn new(root: &'a Node<K, V>, length: usize) -> Self {
                Self { root, length }
            }

            /// Returns the number of entries in the view.
            #[inline]
            #[must_use]
            pub const fn len(&self) -> usize {
                self.length
            }

            /// Returns `true` if the view has no entries.
            #[inline]
            #[must_use]
            pub const fn is_empty(&self) -> bool {
                self.length == 0
            }

            /// Returns a fresh iterator starting from the first entry.
            #[must_use]
            pub fn iter(&self) -> $iter<'a, K, V> {
                $wrap(Iter::new(self.root, self.length))
            }
        }

        impl<K, V> Clone for $view<'_, K, V> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<K, V> Copy for $view<'_, K, V> {}

        impl<'a, K, V> IntoIterator for $view<'a, K, V> {
            type Item = <$iter<'a, K, V> as Iterator>::Item;
            type IntoIter = $iter<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<'a, K, V> IntoIterator for &$view<'a, K, V> {
            type Item = <$iter<'a, K, V> as Iterator>::Item;
            type IntoIter = $iter<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

view!(
    /// A sized, restartable view of a map's keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new().set("a", 1).set("b", 2);
    /// let keys = map.keys();
    /// assert_eq!(keys.len(), 2);
    /// assert!(keys.contains("a"));
    ///
    /// let mut collected: Vec<_> = keys.iter().copied().collect();
    /// collected.sort_unstable();
    /// assert_eq!(collected, vec!["a", "b"]);
    /// // Iterating again starts over.
    /// assert_eq!(keys.iter().count(), 2);
    /// ```
    KeysView,
    Keys,
    Keys
);

view!(
    /// A sized, restartable view of a map's values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new().set("a", 1).set("b", 2);
    /// assert_eq!(map.values().iter().sum::<i32>(), 3);
    /// ```
    ValuesView,
    Values,
    Values
);

view!(
    /// A sized, restartable view of a map's key-value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_map::persistent::ImmutableMap;
    ///
    /// let map = ImmutableMap::new().set("a", 1);
    /// let items = map.items();
    /// assert!(items.contains("a", &1));
    /// assert!(!items.contains("a", &2));
    /// assert_eq!(items.iter().next(), Some((&"a", &1)));
    /// ```
    ItemsView,
    Iter,
    std::convert::identity
);

impl<K: Hash + Eq, V> KeysView<'_, K, V> {
    /// Returns `true` if the view contains `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.find(0, bits::key_hash(key), key).is_some()
    }
}

impl<K: Hash + Eq, V: PartialEq> ItemsView<'_, K, V> {
    /// Returns `true` if the view contains `key` mapped to `value`.
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root
            .find(0, bits::key_hash(key), key)
            .is_some_and(|found| found == value)
    }
}

impl<K: fmt::Debug, V> fmt::Debug for KeysView<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<K, V: fmt::Debug> fmt::Debug for ValuesView<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ItemsView<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}
