//! Hash folding and bitmap indexing for the trie.
//!
//! Every key is hashed once with the native hasher (selected by Cargo
//! feature) and folded into a 32-bit working hash. Each trie level consumes
//! 5 bits of that hash, so levels use shifts `0, 5, ..., 30`.

use std::hash::{Hash, Hasher};

/// Bits per level in the trie.
pub const BITS_PER_LEVEL: u32 = 5;

/// Mask selecting one 5-bit slot.
const SLOT_MASK: u32 = (1 << BITS_PER_LEVEL) - 1;

/// Largest shift at which a bitmap node may still branch.
pub const MAX_SHIFT: u32 = 30;

#[cfg(feature = "fxhash")]
type NativeHasher = rustc_hash::FxHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
type NativeHasher = ahash::AHasher;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
type NativeHasher = std::collections::hash_map::DefaultHasher;

/// Computes the native 64-bit hash of a value.
///
/// The hasher is constructed with fixed keys, so the same value always
/// produces the same hash within (and across) processes.
pub fn native_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = NativeHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Folds a native hash into the 32-bit working hash (high half XOR low half).
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn fold(native: u64) -> u32 {
    ((native >> 32) ^ (native & 0xFFFF_FFFF)) as u32
}

/// Hashes a key and folds it in one step.
#[inline]
pub fn key_hash<T: Hash + ?Sized>(key: &T) -> u32 {
    fold(native_hash(key))
}

/// Extracts the 5-bit slot of `hash` at the given shift.
///
/// Shifts past the last level (where only collision nodes live) map to slot 0.
#[inline]
pub const fn slot(hash: u32, shift: u32) -> u32 {
    match hash.checked_shr(shift) {
        Some(shifted) => shifted & SLOT_MASK,
        None => 0,
    }
}

/// Returns the single-bit mask for `hash` at the given shift.
#[inline]
pub const fn bit(hash: u32, shift: u32) -> u32 {
    1 << slot(hash, shift)
}

/// Returns the compact array index of `bit` within `bitmap`.
#[inline]
pub const fn index_below(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}
