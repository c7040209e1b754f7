// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Walking a trie one entry at a time.
//!
//! Both iterators keep an explicit stack instead of recursing, one frame
//! per trie level, so the state they hold is bounded by the depth of the
//! trie and every call to `next` resumes exactly where the last one left
//! off.

use std::iter::FusedIterator;
use std::slice::{self, Iter as SliceIter};

use archery::{SharedPointer, SharedPointerKind};

use crate::nodes::bits::MAX_DEPTH;
use crate::nodes::hamt::{LeafNode, Node};
use crate::util::clone_ref;

// Borrowing iterator

pub(crate) struct Iter<'a, K, V, P: SharedPointerKind> {
    count: usize,
    stack: Vec<SliceIter<'a, Node<K, V, P>>>,
    collision: Option<SliceIter<'a, SharedPointer<LeafNode<K, V>, P>>>,
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Iter {
            count: self.count,
            stack: self.stack.clone(),
            collision: self.collision.clone(),
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iter<'a, K, V, P> {
    pub(crate) fn new(root: &'a Node<K, V, P>, size: usize) -> Self {
        let mut stack = Vec::with_capacity(MAX_DEPTH + 1);
        stack.push(slice::from_ref(root).iter());
        Iter {
            count: size,
            stack,
            collision: None,
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        'outer: loop {
            if let Some(coll) = &mut self.collision {
                match coll.next() {
                    None => self.collision = None,
                    Some(leaf) => {
                        self.count -= 1;
                        return Some((&leaf.key, &leaf.value));
                    }
                }
            }

            while let Some(current) = self.stack.last_mut() {
                match current.next() {
                    Some(Node::Empty) => {}
                    Some(Node::Leaf(leaf)) => {
                        self.count -= 1;
                        return Some((&leaf.key, &leaf.value));
                    }
                    Some(Node::Collision(coll)) => {
                        self.collision = Some(coll.children.iter());
                        continue 'outer;
                    }
                    Some(Node::Indexed(node)) => self.stack.push(node.children.iter()),
                    Some(Node::Array(node)) => self.stack.push(node.children.iter()),
                    None => {
                        self.stack.pop();
                    }
                }
            }
            return None;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

// Consuming iterator

/// Takes a trie apart, moving entries out of nodes nobody else holds and
/// cloning them out of shared ones.
pub(crate) struct Drain<K, V, P: SharedPointerKind> {
    count: usize,
    stack: Vec<Node<K, V, P>>,
}

impl<K, V, P: SharedPointerKind> Drain<K, V, P> {
    pub(crate) fn new(root: Node<K, V, P>, size: usize) -> Self {
        let mut stack = Vec::with_capacity(MAX_DEPTH + 1);
        stack.push(root);
        Drain { count: size, stack }
    }
}

impl<K, V, P> Iterator for Drain<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Empty => {}
                Node::Leaf(leaf) => {
                    self.count -= 1;
                    let LeafNode { key, value, .. } = clone_ref(leaf);
                    return Some((key, value));
                }
                Node::Collision(coll) => {
                    let coll = clone_ref(coll);
                    self.stack.extend(coll.children.into_iter().map(Node::Leaf));
                }
                Node::Indexed(node) => {
                    let mut node = clone_ref(node);
                    self.stack.extend(node.children.drain());
                }
                Node::Array(node) => {
                    let node = clone_ref(node);
                    self.stack
                        .extend(node.children.into_iter().filter(|child| !child.is_empty()));
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<K: Clone, V: Clone, P: SharedPointerKind> ExactSizeIterator for Drain<K, V, P> {}

impl<K: Clone, V: Clone, P: SharedPointerKind> FusedIterator for Drain<K, V, P> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nodes::bits::hash_key;
    use crate::nodes::hamt::{Change, Outcome, Owned};
    use crate::test::LolHasher;
    use ::proptest::{collection, num::u16, proptest};
    use archery::RcK;
    use std::collections::BTreeSet;
    use std::hash::BuildHasherDefault;

    fn build<const N: usize>(keys: &[u16]) -> (Node<u16, u16, RcK>, usize) {
        let hasher = BuildHasherDefault::<LolHasher<N>>::default();
        let mut node = Node::Empty;
        let mut outcome = Outcome::new(false);
        for key in keys {
            node = node.modify(
                None,
                0,
                |_| Change::Set(*key),
                hash_key(&hasher, key),
                Owned(*key),
                &mut outcome,
            );
        }
        (node, outcome.apply(0))
    }

    #[test]
    fn empty_trie_yields_nothing() {
        let root: Node<u16, u16, RcK> = Node::Empty;
        let mut iter = Iter::new(&root, 0);
        assert_eq!(None, iter.next());
        assert_eq!(None, iter.next());
        assert_eq!(0, Drain::new(root, 0).count());
    }

    #[test]
    fn clones_resume_independently() {
        let (root, size) = build::<64>(&[1, 2, 3, 4]);
        let mut iter = Iter::new(&root, size);
        iter.next();
        let rest: Vec<_> = iter.clone().collect();
        assert_eq!(3, rest.len());
        assert_eq!(rest, iter.collect::<Vec<_>>());
    }

    #[test]
    fn shared_drain_leaves_original_intact() {
        let (root, size) = build::<64>(&[1, 2, 3, 4, 5]);
        let copy = root.clone();
        let drained: BTreeSet<_> = Drain::new(copy, size).map(|(k, _)| k).collect();
        assert_eq!((1..=5).collect::<BTreeSet<_>>(), drained);
        assert_eq!(size, Iter::new(&root, size).count());
    }

    proptest! {
        #[test]
        fn iterates_every_entry_once(keys in collection::btree_set(u16::ANY, 0..500)) {
            let keys: Vec<_> = keys.into_iter().collect();
            let (root, size) = build::<64>(&keys);
            assert_eq!(keys.len(), size);
            let iter = Iter::new(&root, size);
            assert_eq!(size, iter.len());
            let mut seen: Vec<u16> = iter.map(|(k, v)| { assert_eq!(k, v); *k }).collect();
            seen.sort_unstable();
            assert_eq!(keys, seen);
        }

        #[test]
        fn drains_colliding_entries(keys in collection::btree_set(u16::ANY, 0..50)) {
            let keys: Vec<_> = keys.into_iter().collect();
            let (root, size) = build::<0>(&keys);
            let mut drained: Vec<u16> = Drain::new(root, size).map(|(k, _)| k).collect();
            drained.sort_unstable();
            assert_eq!(keys, drained);
        }
    }
}
