//! Input adapter for bulk updates.
//!
//! [`ImmutableMap::update`](super::ImmutableMap::update) and
//! [`MutationContext::update`](super::MutationContext::update) accept any
//! iterable whose elements can be read as a key/value pair. Tuples always
//! can; sequence-shaped elements (`[T; 2]`, `Vec<T>`, `&[T]`) are checked for
//! length and rejected with [`MapError::ShapeMismatch`] otherwise.

use super::error::MapError;

/// An element of a bulk update that can be read as a key/value pair.
///
/// # Examples
///
/// ```rust
/// use hamt_map::persistent::IntoPair;
///
/// assert_eq!(("a", 1).into_pair(), Ok(("a", 1)));
/// assert_eq!(vec![1, 2].into_pair(), Ok((1, 2)));
/// assert_eq!(vec![1, 2, 3].into_pair(), Err(3));
/// ```
pub trait IntoPair<K, V> {
    /// Converts `self` into a pair, or returns the number of items it
    /// actually holds.
    ///
    /// # Errors
    ///
    /// Returns the element's length if it does not hold exactly two items.
    fn into_pair(self) -> Result<(K, V), usize>;
}

impl<K, V> IntoPair<K, V> for (K, V) {
    #[inline]
    fn into_pair(self) -> Result<(K, V), usize> {
        Ok(self)
    }
}

impl<T> IntoPair<T, T> for [T; 2] {
    #[inline]
    fn into_pair(self) -> Result<(T, T), usize> {
        let [key, value] = self;
        Ok((key, value))
    }
}

impl<T> IntoPair<T, T> for Vec<T> {
    fn into_pair(mut self) -> Result<(T, T), usize> {
        if self.len() != 2 {
            return Err(self.len());
        }
        match (self.pop(), self.pop()) {
            (Some(value), Some(key)) => Ok((key, value)),
            _ => Err(self.len()),
        }
    }
}

impl<T: Clone> IntoPair<T, T> for &[T] {
    fn into_pair(self) -> Result<(T, T), usize> {
        match self {
            [key, value] => Ok((key.clone(), value.clone())),
            _ => Err(self.len()),
        }
    }
}

/// Reads every element of `items` as a pair, failing on the first malformed
/// one. Nothing is applied until the whole input has been validated.
pub fn collect_pairs<K, V, I>(items: I) -> Result<Vec<(K, V)>, MapError<K>>
where
    I: IntoIterator,
    I::Item: IntoPair<K, V>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            item.into_pair()
                .map_err(|length| MapError::ShapeMismatch { position, length })
        })
        .collect()
}
