//! Owner tags for batch mutation.
//!
//! A node records the tag of the session that created it. A session may edit
//! a node in place only when the node carries that session's own tag; every
//! other node is cloned first. The reserved tag [`OwnerTag::NONE`] never
//! authorizes in-place edits.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of fresh tags. Starts at 1 so that 0 stays reserved.
static NEXT_OWNER_TAG: AtomicU64 = AtomicU64::new(1);

/// Identifies one mutation session.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerTag(u64);

impl OwnerTag {
    /// The absent tag: nodes carrying it are always copied before writing.
    pub const NONE: Self = Self(0);

    /// Allocates a tag no other session in this process has been given.
    pub fn fresh() -> Self {
        Self(NEXT_OWNER_TAG.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns `true` if a node tagged `node_tag` may be edited in place by
    /// the holder of `self`.
    #[inline]
    pub fn may_edit(self, node_tag: Self) -> bool {
        self != Self::NONE && self == node_tag
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for OwnerTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            formatter.write_str("OwnerTag(none)")
        } else {
            write!(formatter, "OwnerTag({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_fresh_tags_are_unique_and_non_zero() {
        let first = OwnerTag::fresh();
        let second = OwnerTag::fresh();
        assert_ne!(first, second);
        assert_ne!(first, OwnerTag::NONE);
        assert_ne!(second, OwnerTag::NONE);
    }

    #[rstest]
    fn test_none_never_edits() {
        assert!(!OwnerTag::NONE.may_edit(OwnerTag::NONE));
    }

    #[rstest]
    fn test_only_matching_tag_edits() {
        let owner = OwnerTag::fresh();
        let other = OwnerTag::fresh();
        assert!(owner.may_edit(owner));
        assert!(!owner.may_edit(other));
        assert!(!owner.may_edit(OwnerTag::NONE));
    }

    #[rstest]
    fn test_fresh_tags_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| OwnerTag::fresh()).collect::<Vec<_>>()))
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .map(OwnerTag::value)
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
