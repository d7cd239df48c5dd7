//! Persistent hash map with batch mutation.
//!
//! This module provides:
//!
//! - [`ImmutableMap`]: an immutable hash map (HAMT) whose updates return new
//!   maps that share untouched structure with the old one
//! - [`MutationContext`]: a single-threaded session that applies many
//!   updates in place and is then frozen back into an [`ImmutableMap`]
//! - [`KeysView`], [`ValuesView`], [`ItemsView`]: sized, restartable views
//!
//! # Structural Sharing
//!
//! No node reachable from a live map is ever modified. Every node carries an
//! owner tag naming the mutation session that created it; only that session
//! may edit it in place, and every other writer copies it first.
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
//! let mut context = map.mutate();
//! context.set("three".to_string(), 3).unwrap();
//! context.delete("one").unwrap();
//! let updated = context.finish().unwrap();
//!
//! assert_eq!(map.len(), 2);      // Original unchanged
//! assert_eq!(updated.len(), 2);  // New version
//! assert!(updated.contains_key("three"));
//! assert!(!updated.contains_key("one"));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (default), this is `std::sync::Arc`,
/// and frozen maps may be shared across threads.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod bits;
mod error;
mod hashmap;
mod input;
mod mutation;
mod node;
mod owner;
mod structural_hash;
mod view;

pub use error::MapError;
pub use hashmap::ImmutableMap;
pub use input::IntoPair;
pub use mutation::MutationContext;
pub use view::ItemsView;
pub use view::Iter;
pub use view::Keys;
pub use view::KeysView;
pub use view::Values;
pub use view::ValuesView;

/// Returns an empty map.
///
/// # Examples
///
/// ```rust
/// use hamt_map::persistent::{self, ImmutableMap};
///
/// let map: ImmutableMap<u8, u8> = persistent::empty();
/// assert!(map.is_empty());
/// assert_eq!(map, ImmutableMap::new());
/// ```
#[inline]
#[must_use]
pub fn empty<K, V>() -> ImmutableMap<K, V> {
    ImmutableMap::new()
}

// =============================================================================
// Tests
// =============================================================================
