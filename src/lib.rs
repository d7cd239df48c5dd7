//! # hamt-map
//!
//! A persistent (immutable, structurally shared) hash map built on a
//! hash-array-mapped trie, with an opt-in batch mutation mode.
//!
//! ## Overview
//!
//! - **[`ImmutableMap`](persistent::ImmutableMap)**: every update returns a new
//!   map; the original is never touched and unchanged subtrees are shared.
//! - **[`MutationContext`](persistent::MutationContext)**: a builder obtained
//!   from [`ImmutableMap::mutate`](persistent::ImmutableMap::mutate) that edits
//!   the nodes it owns in place and refreezes into an ordinary map on
//!   [`finish`](persistent::MutationContext::finish).
//! - **Views**: lazy, sized, restartable traversals over keys, values and items.
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes through `Arc` so maps are `Send + Sync`
//! - `fxhash`: hash keys with `rustc_hash::FxHasher`
//! - `ahash`: hash keys with `ahash::AHasher`
//!
//! ## Example
//!
//! ```rust
//! use hamt_map::prelude::*;
//!
//! let map = ImmutableMap::new().set("a", 1).set("b", 2);
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("a"), Some(&1));
//! assert_eq!(*map.get_or("c", &-1), -1);
//!
//! let mut context = map.mutate();
//! context.set("c", 3).unwrap();
//! let extended = context.finish().unwrap();
//! assert_eq!(map.len(), 2);
//! assert_eq!(extended.len(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use hamt_map::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
