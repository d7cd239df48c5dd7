//! Error types for map and mutation-context operations.

use thiserror::Error;

/// Errors produced by [`ImmutableMap`](super::ImmutableMap) and
/// [`MutationContext`](super::MutationContext).
///
/// # Examples
///
/// ```rust
/// use hamt_map::persistent::{ImmutableMap, MapError};
///
/// let map: ImmutableMap<String, i32> = ImmutableMap::new();
/// let error = map.delete("missing").unwrap_err();
/// assert_eq!(error, MapError::KeyNotFound { key: "missing".to_string() });
/// assert_eq!(format!("{error}"), "key not found: \"missing\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError<K> {
    /// The key is not present.
    #[error("key not found: {key:?}")]
    KeyNotFound {
        /// The offending key.
        key: K,
    },
    /// A mutating call was made on a context that has already been finished.
    #[error("mutation context has already been finished")]
    ContextFinished,
    /// A bulk-update element could not be read as a key/value pair.
    #[error("element #{position} has length {length}; 2 is required")]
    ShapeMismatch {
        /// Zero-based position of the element in the input.
        position: usize,
        /// Number of items the element actually had.
        length: usize,
    },
}

impl<K> MapError<K> {
    /// Returns `true` for errors caused by misuse of the API rather than by
    /// the data, i.e. [`MapError::ContextFinished`].
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::ContextFinished)
    }
}
