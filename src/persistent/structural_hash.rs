//! Order-independent hash of a whole map.
//!
//! Each key and value contributes through an XOR of a scrambled native hash,
//! so the result does not depend on traversal order and equal maps always
//! hash equal, whatever their internal shape.

use std::hash::Hash;

use super::bits::native_hash;

const SEED_MULTIPLIER: u64 = 1_927_868_237;
const SCRAMBLE_XOR: u64 = 89_869_747;
const SCRAMBLE_MULTIPLIER: u64 = 3_644_798_167;
const FINAL_MULTIPLIER: u64 = 69_069;
const FINAL_INCREMENT: u64 = 907_133_923;

/// Reserved result, never returned.
const RESERVED: i64 = -1;

/// Returned in place of [`RESERVED`].
const RESERVED_REPLACEMENT: i64 = 590_923_713;

#[inline]
const fn scramble(hash: u64) -> u64 {
    (hash ^ (hash << 16) ^ SCRAMBLE_XOR).wrapping_mul(SCRAMBLE_MULTIPLIER)
}

/// Mixes the accumulated bits once more and steers clear of [`RESERVED`].
#[inline]
#[allow(clippy::cast_possible_wrap)]
const fn finalize(accumulated: u64) -> i64 {
    let finished = accumulated
        .wrapping_mul(FINAL_MULTIPLIER)
        .wrapping_add(FINAL_INCREMENT) as i64;

    if finished == RESERVED {
        RESERVED_REPLACEMENT
    } else {
        finished
    }
}

/// Hashes `length` entries in any order.
pub fn compute<'a, K, V, I>(length: usize, entries: I) -> i64
where
    K: Hash + 'a,
    V: Hash + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let seed = SEED_MULTIPLIER.wrapping_mul((length as u64).wrapping_mul(2).wrapping_add(1));
    let accumulated = entries.into_iter().fold(seed, |accumulator, (key, value)| {
        accumulator ^ scramble(native_hash(key)) ^ scramble(native_hash(value))
    });
    finalize(accumulated)
}
