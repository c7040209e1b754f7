// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::hash::{BuildHasher, Hasher};

use metrohash::MetroHash64;

/// A hasher that just xors the key bytes into its state, so small integer
/// keys hash to themselves. Only the lowest `N` bits of the state are
/// returned: `LolHasher<0>` sends every key to the same hash.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LolHasher<const N: usize = 64> {
    state: u64,
    shift: usize,
}

impl<const N: usize> LolHasher<N> {
    fn feed_me(&mut self, byte: u8) {
        self.state ^= u64::from(byte) << self.shift;
        self.shift += 8;
        if self.shift >= 64 {
            self.shift = 0;
        }
    }
}

impl<const N: usize> Hasher for LolHasher<N> {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.feed_me(*byte)
        }
    }

    fn finish(&self) -> u64 {
        if N >= 64 {
            self.state
        } else {
            self.state & ((1 << N) - 1)
        }
    }
}

/// A seeded hasher, for shuffling the shape of a trie between runs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MetroHashBuilder {
    seed: u64,
}

impl MetroHashBuilder {
    pub(crate) fn new(seed: u64) -> Self {
        MetroHashBuilder { seed }
    }

    pub(crate) fn seed(&self) -> u64 {
        self.seed
    }
}

impl BuildHasher for MetroHashBuilder {
    type Hasher = MetroHash64;

    fn build_hasher(&self) -> Self::Hasher {
        MetroHash64::with_seed(self.seed)
    }
}
