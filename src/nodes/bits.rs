// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bit twiddling for addressing trie levels.
//!
//! A key's hash is consumed `HASH_SHIFT` bits at a time, most significant
//! level last: the fragment at `shift` selects one of `HASH_WIDTH` slots.
//! Sparse nodes store a bitmap of occupied slots and a dense child list,
//! and `from_bitmap` turns a slot's bit into its position in that list.

use std::hash::{BuildHasher, Hash, Hasher};

pub(crate) use crate::config::HASH_LEVEL_SIZE as HASH_SHIFT;
pub(crate) const HASH_WIDTH: usize = 2_usize.pow(HASH_SHIFT as u32);
pub(crate) const HASH_MASK: HashBits = (HASH_WIDTH - 1) as HashBits;

/// The hash of a key, truncated to the bits the trie consumes.
pub(crate) type HashBits = u32;

/// Occupancy mask of a sparse node.
pub(crate) type Bitmap = bitmaps::Bitmap<HASH_WIDTH>;

/// Number of levels needed to consume every bit of a hash.
pub(crate) const MAX_DEPTH: usize = (HashBits::BITS as usize).div_ceil(HASH_SHIFT);

pub(crate) fn hash_key<K: Hash + ?Sized, S: BuildHasher>(bh: &S, key: &K) -> HashBits {
    let mut hasher = bh.build_hasher();
    key.hash(&mut hasher);
    hasher.finish() as HashBits
}

#[inline]
pub(crate) fn popcount(x: HashBits) -> usize {
    x.count_ones() as usize
}

/// The slot selected by `hash` at the level addressed by `shift`.
#[inline]
pub(crate) fn hash_fragment(shift: usize, hash: HashBits) -> usize {
    (hash.checked_shr(shift as u32).unwrap_or(0) & HASH_MASK) as usize
}

#[inline]
pub(crate) fn to_bitmap(fragment: usize) -> HashBits {
    1 << fragment
}

/// Dense index of the child whose slot bit is `bit`.
#[inline]
pub(crate) fn from_bitmap(mask: &Bitmap, bit: HashBits) -> usize {
    popcount(HashBits::from(*mask.as_value()) & bit.wrapping_sub(1))
}

#[cfg(test)]
mod test {
    use super::*;
    use ::proptest::{num::u32, proptest};

    fn naive_popcount(mut x: u32) -> usize {
        let mut count = 0;
        while x != 0 {
            count += (x & 1) as usize;
            x >>= 1;
        }
        count
    }

    #[test]
    fn fragments_cover_the_whole_hash() {
        let hash: HashBits = 0xdead_beef;
        let mut rebuilt: HashBits = 0;
        for level in 0..MAX_DEPTH {
            let shift = level * HASH_SHIFT;
            rebuilt |= (hash_fragment(shift, hash) as HashBits) << shift;
        }
        assert_eq!(hash, rebuilt);
        assert_eq!(0, hash_fragment(MAX_DEPTH * HASH_SHIFT, hash));
    }

    #[test]
    fn dense_index_counts_lower_slots() {
        let mut mask = Bitmap::new();
        for slot in [0, 2, 3] {
            mask.set(slot, true);
        }
        assert_eq!(0, from_bitmap(&mask, to_bitmap(0)));
        assert_eq!(1, from_bitmap(&mask, to_bitmap(1)));
        assert_eq!(1, from_bitmap(&mask, to_bitmap(2)));
        assert_eq!(2, from_bitmap(&mask, to_bitmap(3)));
    }

    proptest! {
        #[test]
        fn popcount_matches_naive(x in u32::ANY) {
            assert_eq!(naive_popcount(x), popcount(x));
        }

        #[test]
        fn fragment_is_in_range(hash in u32::ANY, level in 0..MAX_DEPTH) {
            let fragment = hash_fragment(level * HASH_SHIFT, hash);
            assert!(fragment < HASH_WIDTH);
        }
    }
}
