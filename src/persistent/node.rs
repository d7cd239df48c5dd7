//! Trie nodes and the structural algorithms of the map.
//!
//! A trie is made of two node kinds:
//!
//! - [`BitmapNode`]: a 32-bit occupancy bitmap plus a compact array of slots
//!   in bit order. A slot is either a key/value leaf or a child node.
//! - [`CollisionNode`]: a flat list of entries whose keys share one folded
//!   hash, searched linearly.
//!
//! All writes go through [`Node::edit`]: a node carrying the caller's owner
//! tag is edited in place, any other node is shallow-cloned, the clone is
//! stamped with the caller's tag, and the clone is edited. Which path is
//! taken is never observable from the outside.

use std::borrow::Borrow;
use std::hash::Hash;

use smallvec::{SmallVec, smallvec};

use super::ReferenceCounter;
use super::bits::{self, BITS_PER_LEVEL, MAX_SHIFT};
use super::owner::OwnerTag;

// =============================================================================
// Node Definition
// =============================================================================

/// One position of a bitmap node.
#[derive(Clone)]
pub enum Slot<K, V> {
    /// A key-value entry stored inline.
    Leaf(K, V),
    /// A sub-trie one level deeper.
    Child(ReferenceCounter<Node<K, V>>),
}

/// Bitmap-indexed branch node.
///
/// Invariant: `entries.len() == bitmap.count_ones()`.
#[derive(Clone)]
pub struct BitmapNode<K, V> {
    pub bitmap: u32,
    pub entries: Vec<Slot<K, V>>,
    owner: OwnerTag,
}

/// Entries whose keys share the same folded hash.
///
/// Invariant: `entries.len() >= 2`.
#[derive(Clone)]
pub struct CollisionNode<K, V> {
    pub hash: u32,
    pub entries: SmallVec<[(K, V); 2]>,
    owner: OwnerTag,
}

#[derive(Clone)]
pub enum Node<K, V> {
    Bitmap(BitmapNode<K, V>),
    Collision(CollisionNode<K, V>),
}

/// Outcome of an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// The key was present with an equal value; nothing was written.
    Unchanged,
    /// The key was present and its value was replaced.
    Replaced,
    /// The key was new.
    Inserted,
}

/// Outcome of a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Without {
    /// The key was absent; nothing was written.
    NotFound,
    /// The removed key was the node's last entry.
    Empty,
    /// The key was removed and the node was rewritten.
    Changed,
}

impl<K, V> Node<K, V> {
    /// Creates a node with no entries.
    pub const fn empty(owner: OwnerTag) -> Self {
        Self::Bitmap(BitmapNode {
            bitmap: 0,
            entries: Vec::new(),
            owner,
        })
    }

    pub const fn owner(&self) -> OwnerTag {
        match self {
            Self::Bitmap(node) => node.owner,
            Self::Collision(node) => node.owner,
        }
    }

    const fn set_owner(&mut self, owner: OwnerTag) {
        match self {
            Self::Bitmap(node) => node.owner = owner,
            Self::Collision(node) => node.owner = owner,
        }
    }

    /// Returns the single inline entry of a bitmap node that holds nothing else.
    fn sole_leaf(&self) -> Option<(&K, &V)> {
        match self {
            Self::Bitmap(node) => match node.entries.as_slice() {
                [Slot::Leaf(key, value)] => Some((key, value)),
                _ => None,
            },
            Self::Collision(_) => None,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Finds the value stored under `key`.
    pub fn find<Q>(&self, shift: u32, hash: u32, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Self::Bitmap(node) => {
                let bit = bits::bit(hash, shift);
                if node.bitmap & bit == 0 {
                    return None;
                }
                match &node.entries[bits::index_below(node.bitmap, bit)] {
                    Slot::Leaf(entry_key, value) => (entry_key.borrow() == key).then_some(value),
                    Slot::Child(child) => child.find(shift + BITS_PER_LEVEL, hash, key),
                }
            }
            Self::Collision(node) if node.hash == hash => node
                .entries
                .iter()
                .find(|(entry_key, _)| entry_key.borrow() == key)
                .map(|(_, value)| value),
            Self::Collision(_) => None,
        }
    }

    /// Finds the stored key equal to `key`.
    pub fn find_key<Q>(&self, shift: u32, hash: u32, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Self::Bitmap(node) => {
                let bit = bits::bit(hash, shift);
                if node.bitmap & bit == 0 {
                    return None;
                }
                match &node.entries[bits::index_below(node.bitmap, bit)] {
                    Slot::Leaf(entry_key, _) => {
                        (entry_key.borrow() == key).then_some(entry_key)
                    }
                    Slot::Child(child) => child.find_key(shift + BITS_PER_LEVEL, hash, key),
                }
            }
            Self::Collision(node) if node.hash == hash => node
                .entries
                .iter()
                .map(|(entry_key, _)| entry_key)
                .find(|entry_key| (*entry_key).borrow() == key),
            Self::Collision(_) => None,
        }
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Returns a mutable reference to the node behind `this`, cloning it
    /// first unless `owner` already owns it.
    fn edit(this: &mut ReferenceCounter<Self>, owner: OwnerTag) -> &mut Self {
        if !owner.may_edit(this.owner()) {
            let mut copy = (**this).clone();
            copy.set_owner(owner);
            *this = ReferenceCounter::new(copy);
        }
        ReferenceCounter::make_mut(this)
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> Node<K, V> {
    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts or replaces `key` in the trie rooted at `this`.
    ///
    /// `this` is rebound to the written node unless the result is
    /// [`Assoc::Unchanged`]. An equal value already stored under `key`
    /// leaves every node on the path untouched.
    pub fn assoc(
        this: &mut ReferenceCounter<Self>,
        shift: u32,
        hash: u32,
        key: K,
        value: V,
        owner: OwnerTag,
    ) -> Assoc {
        if this
            .find(shift, hash, &key)
            .is_some_and(|existing| *existing == value)
        {
            return Assoc::Unchanged;
        }
        Self::assoc_at(this, shift, hash, key, value, owner)
    }

    /// Writes `key` below `this`; the value is known to differ or be absent.
    fn assoc_at(
        this: &mut ReferenceCounter<Self>,
        shift: u32,
        hash: u32,
        key: K,
        value: V,
        owner: OwnerTag,
    ) -> Assoc {
        if let Self::Collision(collision) = &**this
            && collision.hash != hash
        {
            // Reroute through a one-slot bitmap node so the new key can branch off.
            let wrapper = Self::Bitmap(BitmapNode {
                bitmap: bits::bit(collision.hash, shift),
                entries: vec![Slot::Child(ReferenceCounter::clone(this))],
                owner,
            });
            *this = ReferenceCounter::new(wrapper);
            return Self::assoc_at(this, shift, hash, key, value, owner);
        }

        match Self::edit(this, owner) {
            Self::Bitmap(node) => node.assoc(shift, hash, key, value, owner),
            Self::Collision(node) => node.assoc(key, value),
        }
    }

    /// Builds the smallest subtree holding two distinct keys, starting at `shift`.
    fn pair(shift: u32, first: (u32, K, V), second: (u32, K, V)) -> Self {
        let (first_hash, first_key, first_value) = first;
        let (second_hash, second_key, second_value) = second;

        if first_hash == second_hash || shift > MAX_SHIFT {
            tracing::trace!(hash = first_hash, shift, "creating collision node");
            return Self::Collision(CollisionNode {
                hash: first_hash,
                entries: smallvec![(first_key, first_value), (second_key, second_value)],
                owner: OwnerTag::NONE,
            });
        }

        let first_slot = bits::slot(first_hash, shift);
        let second_slot = bits::slot(second_hash, shift);

        if first_slot == second_slot {
            let child = Self::pair(
                shift + BITS_PER_LEVEL,
                (first_hash, first_key, first_value),
                (second_hash, second_key, second_value),
            );
            return Self::Bitmap(BitmapNode {
                bitmap: 1 << first_slot,
                entries: vec![Slot::Child(ReferenceCounter::new(child))],
                owner: OwnerTag::NONE,
            });
        }

        let first_leaf = Slot::Leaf(first_key, first_value);
        let second_leaf = Slot::Leaf(second_key, second_value);
        let entries = if first_slot < second_slot {
            vec![first_leaf, second_leaf]
        } else {
            vec![second_leaf, first_leaf]
        };
        Self::Bitmap(BitmapNode {
            bitmap: (1 << first_slot) | (1 << second_slot),
            entries,
            owner: OwnerTag::NONE,
        })
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes `key` from the trie rooted at `this`.
    ///
    /// `this` is rebound to the written node when the result is
    /// [`Without::Changed`]. On [`Without::Empty`] the caller must drop the
    /// node. A missing key leaves every node on the path untouched.
    pub fn without<Q>(
        this: &mut ReferenceCounter<Self>,
        shift: u32,
        hash: u32,
        key: &Q,
        owner: OwnerTag,
    ) -> Without
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if this.find(shift, hash, key).is_none() {
            return Without::NotFound;
        }
        Self::without_at(this, shift, hash, key, owner)
    }

    /// Removes `key` below `this`; the key is known to be present.
    fn without_at<Q>(
        this: &mut ReferenceCounter<Self>,
        shift: u32,
        hash: u32,
        key: &Q,
        owner: OwnerTag,
    ) -> Without
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let node = Self::edit(this, owner);
        let demoted = match &mut *node {
            Self::Bitmap(bitmap) => return bitmap.without(shift, hash, key, owner),
            Self::Collision(collision) => match collision.without(key) {
                CollisionWithout::Done(outcome) => return outcome,
                CollisionWithout::Demote(remaining_key, remaining_value) => {
                    // A lone survivor goes back to an ordinary slot; the parent inlines it.
                    tracing::trace!(hash = collision.hash, shift, "demoting collision node");
                    Self::Bitmap(BitmapNode {
                        bitmap: bits::bit(collision.hash, shift),
                        entries: vec![Slot::Leaf(remaining_key, remaining_value)],
                        owner: collision.owner,
                    })
                }
            },
        };
        *node = demoted;
        Without::Changed
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> BitmapNode<K, V> {
    fn assoc(&mut self, shift: u32, hash: u32, key: K, value: V, owner: OwnerTag) -> Assoc {
        let bit = bits::bit(hash, shift);
        let index = bits::index_below(self.bitmap, bit);

        if self.bitmap & bit == 0 {
            self.entries.insert(index, Slot::Leaf(key, value));
            self.bitmap |= bit;
            return Assoc::Inserted;
        }

        match &mut self.entries[index] {
            Slot::Child(child) => {
                Node::assoc_at(child, shift + BITS_PER_LEVEL, hash, key, value, owner)
            }
            Slot::Leaf(existing_key, existing_value) => {
                if *existing_key == key {
                    *existing_value = value;
                    return Assoc::Replaced;
                }
                let existing_hash = bits::key_hash(&*existing_key);
                let subtree = Node::pair(
                    shift + BITS_PER_LEVEL,
                    (existing_hash, existing_key.clone(), existing_value.clone()),
                    (hash, key, value),
                );
                self.entries[index] = Slot::Child(ReferenceCounter::new(subtree));
                Assoc::Inserted
            }
        }
    }

    fn without<Q>(&mut self, shift: u32, hash: u32, key: &Q, owner: OwnerTag) -> Without
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let bit = bits::bit(hash, shift);
        if self.bitmap & bit == 0 {
            return Without::NotFound;
        }
        let index = bits::index_below(self.bitmap, bit);

        let outcome = match &mut self.entries[index] {
            Slot::Leaf(existing_key, _) => {
                if (*existing_key).borrow() != key {
                    return Without::NotFound;
                }
                Without::Empty
            }
            Slot::Child(child) => {
                match Node::without_at(child, shift + BITS_PER_LEVEL, hash, key, owner) {
                    Without::Changed => {
                        // Path compression: a child reduced to one leaf is inlined.
                        let inlined = child.sole_leaf().map(|(leaf_key, leaf_value)| {
                            Slot::Leaf(leaf_key.clone(), leaf_value.clone())
                        });
                        if let Some(leaf) = inlined {
                            self.entries[index] = leaf;
                        }
                        return Without::Changed;
                    }
                    other => other,
                }
            }
        };

        if outcome == Without::NotFound {
            return Without::NotFound;
        }
        if self.entries.len() == 1 {
            return Without::Empty;
        }
        self.remove_slot(index, bit);
        Without::Changed
    }

    fn remove_slot(&mut self, index: usize, bit: u32) {
        self.entries.remove(index);
        self.bitmap &= !bit;
    }
}

/// Outcome of removing a key from a collision node.
enum CollisionWithout<K, V> {
    Done(Without),
    /// One entry remains and must leave the collision node.
    Demote(K, V),
}

impl<K: Clone + Eq, V: Clone> CollisionNode<K, V> {
    fn assoc(&mut self, key: K, value: V) -> Assoc {
        if let Some((_, existing_value)) = self
            .entries
            .iter_mut()
            .find(|(entry_key, _)| *entry_key == key)
        {
            *existing_value = value;
            Assoc::Replaced
        } else {
            self.entries.push((key, value));
            Assoc::Inserted
        }
    }

    fn without<Q>(&mut self, key: &Q) -> CollisionWithout<K, V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let Some(position) = self
            .entries
            .iter()
            .position(|(entry_key, _)| entry_key.borrow() == key)
        else {
            return CollisionWithout::Done(Without::NotFound);
        };

        match self.entries.len() {
            1 => CollisionWithout::Done(Without::Empty),
            2 => {
                let (remaining_key, remaining_value) = self.entries.swap_remove(1 - position);
                CollisionWithout::Demote(remaining_key, remaining_value)
            }
            _ => {
                self.entries.remove(position);
                CollisionWithout::Done(Without::Changed)
            }
        }
    }
}

// =============================================================================
// Invariant checking (tests only)
// =============================================================================

#[cfg(test)]
impl<K: Hash + Eq, V> Node<K, V> {
    /// Verifies the structural invariants below this node and returns the
    /// number of keys it holds.
    pub fn check_invariants(&self, shift: u32, is_root: bool) -> usize {
        match self {
            Self::Bitmap(node) => {
                assert_eq!(node.entries.len(), node.bitmap.count_ones() as usize);
                if !is_root {
                    assert!(
                        self.sole_leaf().is_none(),
                        "non-root node holding a single leaf must be inlined"
                    );
                }
                let mut expected_bits = node.bitmap;
                let mut total = 0;
                for slot in &node.entries {
                    let slot_bit = expected_bits & expected_bits.wrapping_neg();
                    expected_bits &= !slot_bit;
                    total += match slot {
                        Slot::Leaf(key, _) => {
                            assert_eq!(bits::bit(bits::key_hash(key), shift), slot_bit);
                            1
                        }
                        Slot::Child(child) => child.check_invariants(shift + BITS_PER_LEVEL, false),
                    };
                }
                total
            }
            Self::Collision(node) => {
                assert!(node.entries.len() >= 2);
                for (key, _) in &node.entries {
                    assert_eq!(bits::key_hash(key), node.hash);
                }
                node.entries.len()
            }
        }
    }

    /// Counts collision nodes below this node.
    pub fn collision_nodes(&self) -> usize {
        match self {
            Self::Bitmap(node) => node
                .entries
                .iter()
                .map(|slot| match slot {
                    Slot::Leaf(..) => 0,
                    Slot::Child(child) => child.collision_nodes(),
                })
                .sum(),
            Self::Collision(_) => 1,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
