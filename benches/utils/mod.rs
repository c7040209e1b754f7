#![allow(dead_code)]
use rand::seq::SliceRandom;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Distinct keys (or values) for a map of a given size.
pub trait TestData: Clone + Debug + Eq + Hash {
    fn generate(size: usize) -> Vec<Self>;
}

/// Draw from `next` until `size` distinct items have come up, keeping the
/// order they first appeared in.
fn distinct<A, F>(size: usize, mut next: F) -> Vec<A>
where
    A: Clone + Eq + Hash,
    F: FnMut(&mut SmallRng) -> A,
{
    let mut gen = SmallRng::seed_from_u64(1);
    let mut seen = HashSet::with_capacity(size);
    let mut out = Vec::with_capacity(size);
    while out.len() < size {
        let item = next(&mut gen);
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

impl TestData for i64 {
    fn generate(size: usize) -> Vec<Self> {
        distinct(size, |gen| gen.random::<i64>())
    }
}

impl TestData for String {
    fn generate(size: usize) -> Vec<Self> {
        distinct(size, |gen| {
            let len = gen.random_range(5..20);
            (0..len)
                .map(|_| gen.random_range(b'a'..=b'z') as char)
                .collect()
        })
    }
}

impl<T> TestData for Arc<T>
where
    T: TestData + 'static,
{
    fn generate(size: usize) -> Vec<Self> {
        T::generate(size).into_iter().map(Arc::new).collect()
    }
}

/// The same items in a shuffled order, so lookups don't follow insertion
/// order.
pub fn reorder<A: Clone>(vec: &[A]) -> Vec<A> {
    let mut gen = SmallRng::seed_from_u64(1);
    let mut out = vec.to_vec();
    out.shuffle(&mut gen);
    out
}
