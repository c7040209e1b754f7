// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Trie nodes.
//!
//! A trie is a tree of [`Node`]s. Sparse levels are [`IndexedNode`]s,
//! which keep a bitmap of occupied slots and a dense list of children,
//! and crowded levels are [`ArrayNode`]s with one slot per fragment.
//! Entries live in [`LeafNode`]s, and entries whose full hashes are
//! equal share a [`CollisionNode`].
//!
//! Every node records the [`Edit`] it was last written under. A node may
//! be changed in place only when the caller holds that same edit and the
//! node isn't shared with anyone else; in every other case it is copied
//! first, and the copy is stamped with the caller's edit.

use std::borrow::Borrow;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use archery::{SharedPointer, SharedPointerKind};
use imbl_sized_chunks::sized_chunk::Chunk;

use crate::config::{MAX_INDEXED_CHILDREN, MIN_ARRAY_CHILDREN};
use crate::nodes::bits::{from_bitmap, hash_fragment, to_bitmap, Bitmap, HashBits, HASH_SHIFT, HASH_WIDTH};
use crate::util::clone_ref;

static NEXT_EDIT: AtomicU64 = AtomicU64::new(1);

/// A mutation generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct Edit(u64);

impl Edit {
    /// An edit no existing node carries.
    pub(crate) fn fresh() -> Self {
        Edit(NEXT_EDIT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a node stamped with `node_edit` belongs to the mutation `edit`.
///
/// Nodes built outside of any mutation carry `None`, which no caller can
/// claim.
#[inline]
pub(crate) fn can_edit(edit: Option<Edit>, node_edit: Option<Edit>) -> bool {
    edit.is_some() && edit == node_edit
}

/// What a [`Node::modify`] callback wants done with an entry.
pub(crate) enum Change<V> {
    Keep,
    Set(V),
    Remove,
}

/// A key to look for during [`Node::modify`].
pub(crate) trait KeyLike<K> {
    fn matches(&self, stored: &K) -> bool;

    /// The key to store when a new entry is created, if this key can be
    /// stored at all.
    fn into_owned(self) -> Option<K>;
}

/// A key the caller owns and is willing to store.
pub(crate) struct Owned<K>(pub(crate) K);

impl<K: Eq> KeyLike<K> for Owned<K> {
    #[inline]
    fn matches(&self, stored: &K) -> bool {
        self.0 == *stored
    }

    #[inline]
    fn into_owned(self) -> Option<K> {
        Some(self.0)
    }
}

/// A borrowed key. It finds existing entries but never creates one.
pub(crate) struct Probe<'a, BK: ?Sized>(pub(crate) &'a BK);

impl<'a, K, BK> KeyLike<K> for Probe<'a, BK>
where
    BK: Eq + ?Sized,
    K: Borrow<BK>,
{
    #[inline]
    fn matches(&self, stored: &K) -> bool {
        stored.borrow() == self.0
    }

    #[inline]
    fn into_owned(self) -> Option<K> {
        None
    }
}

/// Bookkeeping for a single [`Node::modify`] call: how many entries it
/// added or removed, and the value it displaced.
pub(crate) struct Outcome<V> {
    delta: isize,
    displaced: Option<V>,
    capture: bool,
}

impl<V: Clone> Outcome<V> {
    /// With `capture` unset, displaced values are dropped instead of being
    /// cloned out of shared leaves.
    pub(crate) fn new(capture: bool) -> Self {
        Outcome {
            delta: 0,
            displaced: None,
            capture,
        }
    }

    fn grew(&mut self) {
        self.delta += 1;
    }

    fn shrank(&mut self) {
        self.delta -= 1;
    }

    fn displace(&mut self, value: V) {
        if self.capture {
            self.displaced = Some(value);
        }
    }

    fn displace_leaf<K: Clone, P: SharedPointerKind>(
        &mut self,
        leaf: SharedPointer<LeafNode<K, V>, P>,
    ) {
        if self.capture {
            self.displaced = Some(clone_ref(leaf).value);
        }
    }

    #[cfg(test)]
    pub(crate) fn changed_size(&self) -> bool {
        self.delta != 0
    }

    pub(crate) fn apply(&self, size: usize) -> usize {
        size.saturating_add_signed(self.delta)
    }

    pub(crate) fn into_displaced(self) -> Option<V> {
        self.displaced
    }
}

trait Generation {
    fn edit(&self) -> Option<Edit>;
    fn set_edit(&mut self, edit: Option<Edit>);
}

macro_rules! impl_generation {
    ($name:ident<$($gen:ident),*>) => {
        impl<$($gen),*> Generation for $name<$($gen),*>
        where
            P: SharedPointerKind,
        {
            #[inline]
            fn edit(&self) -> Option<Edit> {
                self.edit
            }

            #[inline]
            fn set_edit(&mut self, edit: Option<Edit>) {
                self.edit = edit;
            }
        }
    };
}

impl<K, V> Generation for LeafNode<K, V> {
    #[inline]
    fn edit(&self) -> Option<Edit> {
        self.edit
    }

    #[inline]
    fn set_edit(&mut self, edit: Option<Edit>) {
        self.edit = edit;
    }
}

impl_generation!(CollisionNode<K, V, P>);
impl_generation!(IndexedNode<K, V, P>);
impl_generation!(ArrayNode<K, V, P>);

/// The node behind `ptr`, if it may be changed in place under `edit`.
#[inline]
fn editable<T, P>(edit: Option<Edit>, ptr: &mut SharedPointer<T, P>) -> Option<&mut T>
where
    T: Generation,
    P: SharedPointerKind,
{
    if can_edit(edit, ptr.edit()) {
        SharedPointer::get_mut(ptr)
    } else {
        None
    }
}

/// A pointer to a node that may be changed in place under `edit`: either
/// `ptr` itself, or a copy of its node stamped with `edit`.
fn writable<T, P>(edit: Option<Edit>, mut ptr: SharedPointer<T, P>) -> SharedPointer<T, P>
where
    T: Clone + Generation,
    P: SharedPointerKind,
{
    if editable(edit, &mut ptr).is_some() {
        return ptr;
    }
    let mut node = clone_ref(ptr);
    node.set_edit(edit);
    SharedPointer::new(node)
}

pub(crate) struct LeafNode<K, V> {
    edit: Option<Edit>,
    pub(crate) hash: HashBits,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K: Clone, V: Clone> Clone for LeafNode<K, V> {
    fn clone(&self) -> Self {
        LeafNode {
            edit: self.edit,
            hash: self.hash,
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

pub(crate) struct CollisionNode<K, V, P: SharedPointerKind> {
    edit: Option<Edit>,
    pub(crate) hash: HashBits,
    pub(crate) children: Vec<SharedPointer<LeafNode<K, V>, P>>,
}

// We impl Clone instead of deriving it, because the pointer kind needn't be Clone.
impl<K, V, P: SharedPointerKind> Clone for CollisionNode<K, V, P> {
    fn clone(&self) -> Self {
        CollisionNode {
            edit: self.edit,
            hash: self.hash,
            children: self.children.clone(),
        }
    }
}

pub(crate) struct IndexedNode<K, V, P: SharedPointerKind> {
    edit: Option<Edit>,
    pub(crate) mask: Bitmap,
    pub(crate) children: Chunk<Node<K, V, P>, HASH_WIDTH>,
}

impl<K, V, P: SharedPointerKind> Clone for IndexedNode<K, V, P> {
    fn clone(&self) -> Self {
        IndexedNode {
            edit: self.edit,
            mask: self.mask,
            children: self.children.clone(),
        }
    }
}

pub(crate) struct ArrayNode<K, V, P: SharedPointerKind> {
    edit: Option<Edit>,
    pub(crate) count: usize,
    pub(crate) children: [Node<K, V, P>; HASH_WIDTH],
}

impl<K, V, P: SharedPointerKind> Clone for ArrayNode<K, V, P> {
    fn clone(&self) -> Self {
        ArrayNode {
            edit: self.edit,
            count: self.count,
            children: self.children.clone(),
        }
    }
}

pub(crate) enum Node<K, V, P: SharedPointerKind> {
    Empty,
    Leaf(SharedPointer<LeafNode<K, V>, P>),
    Collision(SharedPointer<CollisionNode<K, V, P>, P>),
    Indexed(SharedPointer<IndexedNode<K, V, P>, P>),
    Array(SharedPointer<ArrayNode<K, V, P>, P>),
}

impl<K, V, P: SharedPointerKind> Clone for Node<K, V, P> {
    fn clone(&self) -> Self {
        match self {
            Node::Empty => Node::Empty,
            Node::Leaf(leaf) => Node::Leaf(leaf.clone()),
            Node::Collision(coll) => Node::Collision(coll.clone()),
            Node::Indexed(node) => Node::Indexed(node.clone()),
            Node::Array(node) => Node::Array(node.clone()),
        }
    }
}

impl<K, V, P: SharedPointerKind> Default for Node<K, V, P> {
    fn default() -> Self {
        Node::Empty
    }
}

impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Leaves and collision nodes can sit at any depth, so they are free
    /// to move up into their parent's slot.
    #[inline]
    fn is_leaf_like(&self) -> bool {
        matches!(self, Node::Leaf(_) | Node::Collision(_))
    }

    /// Test whether two nodes are the same node, without comparing their
    /// contents.
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Empty, Node::Empty) => true,
            (Node::Leaf(a), Node::Leaf(b)) => SharedPointer::ptr_eq(a, b),
            (Node::Collision(a), Node::Collision(b)) => SharedPointer::ptr_eq(a, b),
            (Node::Indexed(a), Node::Indexed(b)) => SharedPointer::ptr_eq(a, b),
            (Node::Array(a), Node::Array(b)) => SharedPointer::ptr_eq(a, b),
            _ => false,
        }
    }

    fn leaf(edit: Option<Edit>, hash: HashBits, key: K, value: V) -> Self {
        Node::Leaf(SharedPointer::new(LeafNode {
            edit,
            hash,
            key,
            value,
        }))
    }

    /// Look up a key.
    ///
    /// This walks down the trie in a loop, so lookups never recurse.
    pub(crate) fn get<BK>(&self, hash: HashBits, key: &BK) -> Option<(&K, &V)>
    where
        BK: Eq + ?Sized,
        K: Borrow<BK>,
    {
        let mut node = self;
        let mut shift = 0;
        loop {
            match node {
                Node::Empty => return None,
                Node::Leaf(leaf) => {
                    return if leaf.hash == hash && leaf.key.borrow() == key {
                        Some((&leaf.key, &leaf.value))
                    } else {
                        None
                    };
                }
                Node::Collision(coll) => {
                    if coll.hash != hash {
                        return None;
                    }
                    return coll
                        .children
                        .iter()
                        .find(|leaf| leaf.key.borrow() == key)
                        .map(|leaf| (&leaf.key, &leaf.value));
                }
                Node::Indexed(indexed) => {
                    let fragment = hash_fragment(shift, hash);
                    if !indexed.mask.get(fragment) {
                        return None;
                    }
                    node = &indexed.children[from_bitmap(&indexed.mask, to_bitmap(fragment))];
                }
                Node::Array(array) => {
                    node = &array.children[hash_fragment(shift, hash)];
                }
            }
            shift += HASH_SHIFT;
        }
    }
}

impl<K, V, P> Node<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    /// Insert, update or remove the entry for `key`.
    ///
    /// `f` is called exactly once, with the current value for `key` if
    /// there is one, and decides what happens to the entry. Size changes
    /// and the displaced value are recorded in `outcome`. Nodes stamped
    /// with `edit` that nobody else holds are changed in place; everything
    /// else on the path to the entry is copied. When nothing changes, the
    /// node is handed back as it came in.
    pub(crate) fn modify<Q, F>(
        self,
        edit: Option<Edit>,
        shift: usize,
        f: F,
        hash: HashBits,
        key: Q,
        outcome: &mut Outcome<V>,
    ) -> Self
    where
        Q: KeyLike<K>,
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        match self {
            Node::Empty => {
                let change = f(None);
                match (change, key.into_owned()) {
                    (Change::Set(value), Some(key)) => {
                        outcome.grew();
                        Node::leaf(edit, hash, key, value)
                    }
                    _ => Node::Empty,
                }
            }
            Node::Leaf(leaf) => Self::modify_leaf(leaf, edit, shift, f, hash, key, outcome),
            Node::Collision(coll) => {
                Self::modify_collision(coll, edit, shift, f, hash, key, outcome)
            }
            Node::Indexed(node) => Self::modify_indexed(node, edit, shift, f, hash, key, outcome),
            Node::Array(node) => Self::modify_array(node, edit, shift, f, hash, key, outcome),
        }
    }

    fn modify_leaf<Q, F>(
        mut leaf: SharedPointer<LeafNode<K, V>, P>,
        edit: Option<Edit>,
        shift: usize,
        f: F,
        hash: HashBits,
        key: Q,
        outcome: &mut Outcome<V>,
    ) -> Self
    where
        Q: KeyLike<K>,
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        if leaf.hash == hash && key.matches(&leaf.key) {
            let change = f(Some(&leaf.value));
            return match change {
                Change::Keep => Node::Leaf(leaf),
                Change::Remove => {
                    outcome.shrank();
                    outcome.displace_leaf(leaf);
                    Node::Empty
                }
                Change::Set(value) => {
                    replace_value(edit, &mut leaf, value, outcome);
                    Node::Leaf(leaf)
                }
            };
        }
        let change = f(None);
        let (value, key) = match (change, key.into_owned()) {
            (Change::Set(value), Some(key)) => (value, key),
            _ => return Node::Leaf(leaf),
        };
        outcome.grew();
        let new_leaf = SharedPointer::new(LeafNode {
            edit,
            hash,
            key,
            value,
        });
        if leaf.hash == hash {
            return Node::Collision(SharedPointer::new(CollisionNode {
                edit,
                hash,
                children: vec![leaf, new_leaf],
            }));
        }
        let old_hash = leaf.hash;
        Self::merge(edit, shift, old_hash, Node::Leaf(leaf), hash, Node::Leaf(new_leaf))
    }

    fn modify_collision<Q, F>(
        coll: SharedPointer<CollisionNode<K, V, P>, P>,
        edit: Option<Edit>,
        shift: usize,
        f: F,
        hash: HashBits,
        key: Q,
        outcome: &mut Outcome<V>,
    ) -> Self
    where
        Q: KeyLike<K>,
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        let position = if coll.hash == hash {
            coll.children.iter().position(|leaf| key.matches(&leaf.key))
        } else {
            None
        };
        let index = match position {
            Some(index) => index,
            None => {
                let change = f(None);
                let (value, key) = match (change, key.into_owned()) {
                    (Change::Set(value), Some(key)) => (value, key),
                    _ => return Node::Collision(coll),
                };
                outcome.grew();
                let new_leaf = SharedPointer::new(LeafNode {
                    edit,
                    hash,
                    key,
                    value,
                });
                if coll.hash != hash {
                    let old_hash = coll.hash;
                    return Self::merge(
                        edit,
                        shift,
                        old_hash,
                        Node::Collision(coll),
                        hash,
                        Node::Leaf(new_leaf),
                    );
                }
                let mut coll = writable(edit, coll);
                SharedPointer::make_mut(&mut coll).children.push(new_leaf);
                return Node::Collision(coll);
            }
        };
        let change = f(Some(&coll.children[index].value));
        match change {
            Change::Keep => Node::Collision(coll),
            Change::Remove => {
                outcome.shrank();
                let mut coll = writable(edit, coll);
                let node = SharedPointer::make_mut(&mut coll);
                let removed = node.children.remove(index);
                outcome.displace_leaf(removed);
                if node.children.len() == 1 {
                    if let Some(last) = node.children.pop() {
                        return Node::Leaf(last);
                    }
                }
                Node::Collision(coll)
            }
            Change::Set(value) => {
                let mut coll = writable(edit, coll);
                let node = SharedPointer::make_mut(&mut coll);
                replace_value(edit, &mut node.children[index], value, outcome);
                Node::Collision(coll)
            }
        }
    }

    fn modify_indexed<Q, F>(
        mut ptr: SharedPointer<IndexedNode<K, V, P>, P>,
        edit: Option<Edit>,
        shift: usize,
        f: F,
        hash: HashBits,
        key: Q,
        outcome: &mut Outcome<V>,
    ) -> Self
    where
        Q: KeyLike<K>,
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        let fragment = hash_fragment(shift, hash);
        let bit = to_bitmap(fragment);
        let index = from_bitmap(&ptr.mask, bit);
        let exists = ptr.mask.get(fragment);
        let (child, in_place) = match editable(edit, &mut ptr) {
            Some(node) => match exists {
                true => (mem::take(&mut node.children[index]), true),
                false => (Node::Empty, true),
            },
            None => match exists {
                true => (ptr.children[index].clone(), false),
                false => (Node::Empty, false),
            },
        };
        let child = child.modify(edit, shift + HASH_SHIFT, f, hash, key, outcome);
        if !in_place {
            let unchanged = if exists {
                ptr.children[index].ptr_eq(&child)
            } else {
                child.is_empty()
            };
            if unchanged {
                return Node::Indexed(ptr);
            }
        }
        let mut ptr = writable(edit, ptr);
        let node = SharedPointer::make_mut(&mut ptr);
        match (exists, child.is_empty()) {
            (false, true) => {}
            (true, true) => {
                node.mask.set(fragment, false);
                node.children.remove(index);
                if node.children.is_empty() {
                    return Node::Empty;
                }
            }
            (false, false) if node.children.len() >= MAX_INDEXED_CHILDREN => {
                return Self::expand(edit, node, fragment, child);
            }
            (false, false) => {
                node.mask.set(fragment, true);
                node.children.insert(index, child);
            }
            (true, false) => node.children[index] = child,
        }
        Self::collapse(ptr)
    }

    fn modify_array<Q, F>(
        mut ptr: SharedPointer<ArrayNode<K, V, P>, P>,
        edit: Option<Edit>,
        shift: usize,
        f: F,
        hash: HashBits,
        key: Q,
        outcome: &mut Outcome<V>,
    ) -> Self
    where
        Q: KeyLike<K>,
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        let fragment = hash_fragment(shift, hash);
        let (child, in_place) = match editable(edit, &mut ptr) {
            Some(node) => (mem::take(&mut node.children[fragment]), true),
            None => (ptr.children[fragment].clone(), false),
        };
        let was_empty = child.is_empty();
        let child = child.modify(edit, shift + HASH_SHIFT, f, hash, key, outcome);
        if !in_place && ptr.children[fragment].ptr_eq(&child) {
            return Node::Array(ptr);
        }
        let mut ptr = writable(edit, ptr);
        let node = SharedPointer::make_mut(&mut ptr);
        let now_empty = child.is_empty();
        node.children[fragment] = child;
        match (was_empty, now_empty) {
            (true, false) => node.count += 1,
            (false, true) => {
                node.count -= 1;
                if node.count <= MIN_ARRAY_CHILDREN {
                    return Self::pack(edit, node);
                }
            }
            _ => {}
        }
        Node::Array(ptr)
    }

    /// Build the smallest subtree holding two nodes with different hashes.
    fn merge(
        edit: Option<Edit>,
        shift: usize,
        hash1: HashBits,
        node1: Self,
        hash2: HashBits,
        node2: Self,
    ) -> Self {
        debug_assert_ne!(hash1, hash2);
        let fragment1 = hash_fragment(shift, hash1);
        let fragment2 = hash_fragment(shift, hash2);
        let mut mask = Bitmap::new();
        let mut children = Chunk::new();
        mask.set(fragment1, true);
        if fragment1 == fragment2 {
            children.push_back(Self::merge(
                edit,
                shift + HASH_SHIFT,
                hash1,
                node1,
                hash2,
                node2,
            ));
        } else {
            mask.set(fragment2, true);
            if fragment1 < fragment2 {
                children.push_back(node1);
                children.push_back(node2);
            } else {
                children.push_back(node2);
                children.push_back(node1);
            }
        }
        Node::Indexed(SharedPointer::new(IndexedNode {
            edit,
            mask,
            children,
        }))
    }

    /// Turn a full indexed node into an array node with `child` added at
    /// `fragment`.
    fn expand(
        edit: Option<Edit>,
        node: &mut IndexedNode<K, V, P>,
        fragment: usize,
        child: Self,
    ) -> Self {
        let mut children: [Self; HASH_WIDTH] = std::array::from_fn(|_| Node::Empty);
        let mask = node.mask;
        for (slot, existing) in mask.into_iter().zip(node.children.drain()) {
            children[slot] = existing;
        }
        let count = mask.len() + 1;
        children[fragment] = child;
        Node::Array(SharedPointer::new(ArrayNode {
            edit,
            count,
            children,
        }))
    }

    /// Turn a sparse array node back into an indexed node.
    fn pack(edit: Option<Edit>, node: &mut ArrayNode<K, V, P>) -> Self {
        let mut mask = Bitmap::new();
        let mut children = Chunk::new();
        for (slot, child) in node.children.iter_mut().enumerate() {
            if !child.is_empty() {
                mask.set(slot, true);
                children.push_back(mem::take(child));
            }
        }
        Self::collapse(SharedPointer::new(IndexedNode {
            edit,
            mask,
            children,
        }))
    }

    /// An indexed node whose only child is leaf-like is replaced by that
    /// child.
    fn collapse(ptr: SharedPointer<IndexedNode<K, V, P>, P>) -> Self {
        if ptr.children.len() == 1 && ptr.children[0].is_leaf_like() {
            return ptr.children[0].clone();
        }
        Node::Indexed(ptr)
    }
}

/// Store `value` in the leaf at `slot`, in place when the leaf allows it.
fn replace_value<K, V, P>(
    edit: Option<Edit>,
    slot: &mut SharedPointer<LeafNode<K, V>, P>,
    value: V,
    outcome: &mut Outcome<V>,
) where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    match editable(edit, slot) {
        Some(leaf) => outcome.displace(mem::replace(&mut leaf.value, value)),
        None => {
            let fresh = SharedPointer::new(LeafNode {
                edit,
                hash: slot.hash,
                key: slot.key.clone(),
                value,
            });
            outcome.displace_leaf(mem::replace(slot, fresh));
        }
    }
}

#[cfg(any(test, feature = "debug"))]
impl<K: Eq, V, P: SharedPointerKind> Node<K, V, P> {
    /// Check the structural invariants of the subtree at `shift`, and
    /// return the hashes of every entry in it.
    pub(crate) fn check_invariants(&self, shift: usize) -> Vec<HashBits> {
        match self {
            Node::Empty => Vec::new(),
            Node::Leaf(leaf) => vec![leaf.hash],
            Node::Collision(coll) => {
                assert!(
                    coll.children.len() >= 2,
                    "collision node with {} entries",
                    coll.children.len()
                );
                for (index, leaf) in coll.children.iter().enumerate() {
                    assert_eq!(coll.hash, leaf.hash, "collision node holds a foreign hash");
                    assert!(
                        coll.children[index + 1..]
                            .iter()
                            .all(|other| other.key != leaf.key),
                        "collision node holds a duplicate key"
                    );
                }
                vec![coll.hash; coll.children.len()]
            }
            Node::Indexed(node) => {
                assert_eq!(node.mask.len(), node.children.len(), "mask disagrees with children");
                assert!(!node.children.is_empty(), "indexed node without children");
                assert!(node.children.len() <= MAX_INDEXED_CHILDREN, "indexed node too full");
                assert!(
                    node.children.len() > 1 || !node.children[0].is_leaf_like(),
                    "indexed node wraps a lone leaf"
                );
                let mut hashes = Vec::new();
                for (slot, child) in node.mask.into_iter().zip(node.children.iter()) {
                    assert!(!child.is_empty(), "indexed node holds an empty child");
                    Self::check_slot(child, shift, slot, &mut hashes);
                }
                hashes
            }
            Node::Array(node) => {
                let occupied = node.children.iter().filter(|c| !c.is_empty()).count();
                assert_eq!(node.count, occupied, "array node count is stale");
                assert!(node.count > MIN_ARRAY_CHILDREN, "array node should have been packed");
                let mut hashes = Vec::new();
                for (slot, child) in node.children.iter().enumerate() {
                    Self::check_slot(child, shift, slot, &mut hashes);
                }
                hashes
            }
        }
    }

    fn check_slot(child: &Self, shift: usize, slot: usize, hashes: &mut Vec<HashBits>) {
        let below = child.check_invariants(shift + HASH_SHIFT);
        for hash in &below {
            assert_eq!(slot, hash_fragment(shift, *hash), "entry filed under the wrong slot");
        }
        hashes.extend(below);
    }
}

impl<K, V, P> fmt::Debug for Node<K, V, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::Leaf(leaf) => f
                .debug_struct("Leaf")
                .field("hash", &leaf.hash)
                .field("key", &leaf.key)
                .field("value", &leaf.value)
                .finish(),
            Node::Collision(coll) => f
                .debug_struct("Collision")
                .field("hash", &coll.hash)
                .field(
                    "entries",
                    &coll.children.iter().map(|leaf| (&leaf.key, &leaf.value)).collect::<Vec<_>>(),
                )
                .finish(),
            Node::Indexed(node) => f
                .debug_struct("Indexed")
                .field("mask", &node.mask)
                .field("children", &&node.children[..])
                .finish(),
            Node::Array(node) => f
                .debug_struct("Array")
                .field("count", &node.count)
                .field("children", &&node.children[..])
                .finish(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nodes::bits::hash_key;
    use crate::test::LolHasher;
    use archery::RcK;
    use std::hash::BuildHasherDefault;

    type TestNode = Node<u32, u32, RcK>;

    fn hash_of(key: u32) -> HashBits {
        hash_key(&BuildHasherDefault::<LolHasher>::default(), &key)
    }

    fn set(node: TestNode, edit: Option<Edit>, key: u32, value: u32) -> (TestNode, Option<u32>) {
        let mut outcome = Outcome::new(true);
        let node = node.modify(
            edit,
            0,
            |_| Change::Set(value),
            hash_of(key),
            Owned(key),
            &mut outcome,
        );
        node.check_invariants(0);
        (node, outcome.into_displaced())
    }

    fn remove(node: TestNode, edit: Option<Edit>, key: u32) -> (TestNode, Option<u32>) {
        let mut outcome = Outcome::new(true);
        let node = node.modify(
            edit,
            0,
            |_| Change::Remove,
            hash_of(key),
            Probe(&key),
            &mut outcome,
        );
        node.check_invariants(0);
        (node, outcome.into_displaced())
    }

    fn lookup(node: &TestNode, key: u32) -> Option<u32> {
        node.get(hash_of(key), &key).map(|(_, v)| *v)
    }

    #[test]
    fn edits_are_unique() {
        let a = Edit::fresh();
        let b = Edit::fresh();
        assert_ne!(a, b);
        assert!(can_edit(Some(a), Some(a)));
        assert!(!can_edit(Some(a), Some(b)));
        assert!(!can_edit(None, None));
        assert!(!can_edit(Some(a), None));
    }

    #[test]
    fn leaf_updates_and_removals() {
        let (node, old) = set(Node::Empty, None, 1, 10);
        assert!(old.is_none());
        assert!(matches!(node, Node::Leaf(_)));
        let (node, old) = set(node, None, 1, 11);
        assert_eq!(Some(10), old);
        assert_eq!(Some(11), lookup(&node, 1));
        let (node, old) = remove(node, None, 2);
        assert!(old.is_none());
        let (node, old) = remove(node, None, 1);
        assert_eq!(Some(11), old);
        assert!(node.is_empty());
    }

    #[test]
    fn absent_key_is_left_alone() {
        let (node, _) = set(Node::Empty, None, 1, 1);
        let (node, _) = set(node, None, 2, 2);
        let before = node.clone();
        let (after, _) = remove(node, None, 3);
        assert!(before.ptr_eq(&after));
    }

    #[test]
    fn borrowed_keys_never_insert() {
        let mut outcome = Outcome::new(false);
        let node: TestNode = Node::Empty.modify(
            None,
            0,
            |_| Change::Set(1),
            hash_of(5),
            Probe(&5),
            &mut outcome,
        );
        assert!(node.is_empty());
        assert!(!outcome.changed_size());
    }

    #[test]
    fn equal_hashes_collide() {
        let h = 0x1234_5678;
        let mut outcome = Outcome::new(false);
        let node: TestNode =
            Node::Empty.modify(None, 0, |_| Change::Set(1), h, Owned(1), &mut outcome);
        let node = node.modify(None, 0, |_| Change::Set(2), h, Owned(2), &mut outcome);
        assert!(matches!(node, Node::Collision(_)));
        assert_eq!(2, outcome.apply(0));
        assert_eq!(Some((&1, &1)), node.get(h, &1));
        assert_eq!(Some((&2, &2)), node.get(h, &2));
        let node = node.modify(None, 0, |_| Change::Remove, h, Probe(&1), &mut outcome);
        assert!(matches!(node, Node::Leaf(_)));
        assert_eq!(None, node.get(h, &1));
        assert_eq!(Some((&2, &2)), node.get(h, &2));
    }

    #[test]
    fn merge_grows_only_as_deep_as_needed() {
        // These hashes agree on their lowest two fragments.
        let low = 0b11_0000_0000_0000;
        let a: HashBits = low | (1 << 20);
        let b: HashBits = low | (2 << 20);
        let mut outcome = Outcome::new(false);
        let node: TestNode =
            Node::Empty.modify(None, 0, |_| Change::Set(1), a, Owned(1), &mut outcome);
        let node = node.modify(None, 0, |_| Change::Set(2), b, Owned(2), &mut outcome);
        node.check_invariants(0);
        let mut depth = 0;
        let mut cursor = &node;
        while let Node::Indexed(indexed) = cursor {
            depth += 1;
            if indexed.children.len() == 2 {
                break;
            }
            cursor = &indexed.children[0];
        }
        let expected = 20 / HASH_SHIFT + 1;
        assert_eq!(expected, depth);
        assert_eq!(Some((&1, &1)), node.get(a, &1));
        assert_eq!(Some((&2, &2)), node.get(b, &2));
    }

    #[test]
    fn shared_nodes_are_copied() {
        let edit = Some(Edit::fresh());
        let (node, _) = set(Node::Empty, edit, 1, 1);
        let (node, _) = set(node, edit, 2, 2);
        let snapshot = node.clone();
        let (node, _) = set(node, edit, 1, 100);
        assert_eq!(Some(1), lookup(&snapshot, 1));
        assert_eq!(Some(100), lookup(&node, 1));
    }

    #[test]
    fn editable_nodes_change_in_place() {
        let edit = Some(Edit::fresh());
        let (node, _) = set(Node::Empty, edit, 1, 1);
        let (node, _) = set(node, edit, 2, 2);
        let address = match &node {
            Node::Indexed(ptr) => &**ptr as *const IndexedNode<u32, u32, RcK>,
            other => panic!("expected an indexed root, got {:?}", other),
        };
        let (node, old) = set(node, edit, 1, 3);
        assert_eq!(Some(1), old);
        match &node {
            Node::Indexed(ptr) => assert_eq!(address, &**ptr as *const _),
            other => panic!("expected an indexed root, got {:?}", other),
        }
    }

    #[test]
    fn frozen_nodes_are_never_written() {
        let (node, _) = set(Node::Empty, None, 1, 1);
        let (node, _) = set(node, None, 2, 2);
        let before = node.clone();
        let (after, _) = set(node, Some(Edit::fresh()), 1, 5);
        assert!(!before.ptr_eq(&after));
        assert_eq!(Some(1), lookup(&before, 1));
    }

    #[cfg(not(feature = "small-chunks"))]
    #[test]
    fn array_promotion_and_packing() {
        // Every key shares the first fragment (0) and differs in the second.
        let keys: Vec<u32> = (0..20).map(|i| i << HASH_SHIFT).collect();
        let mut node: TestNode = Node::Empty;
        for (count, key) in keys.iter().enumerate() {
            node = set(node, None, *key, *key).0;
            if count == 0 {
                assert!(matches!(node, Node::Leaf(_)));
            } else {
                let Node::Indexed(root) = &node else {
                    panic!("expected an indexed root, got {:?}", node)
                };
                let inner = &root.children[0];
                if count + 1 > MAX_INDEXED_CHILDREN {
                    assert!(matches!(inner, Node::Array(_)), "at {} keys", count + 1);
                } else {
                    assert!(matches!(inner, Node::Indexed(_)), "at {} keys", count + 1);
                }
            }
            for key in &keys[..=count] {
                assert_eq!(Some(*key), lookup(&node, *key));
            }
        }
        for (removed, key) in keys.iter().enumerate() {
            node = remove(node, None, *key).0;
            let left = keys.len() - removed - 1;
            for key in &keys[removed + 1..] {
                assert_eq!(Some(*key), lookup(&node, *key));
            }
            if left > MIN_ARRAY_CHILDREN {
                let Node::Indexed(root) = &node else {
                    panic!("expected an indexed root, got {:?}", node)
                };
                assert!(matches!(root.children[0], Node::Array(_)), "at {} keys", left);
            } else if left > 1 {
                let Node::Indexed(root) = &node else {
                    panic!("expected an indexed root, got {:?}", node)
                };
                assert!(matches!(root.children[0], Node::Indexed(_)), "at {} keys", left);
            }
        }
        assert!(node.is_empty());
    }
}
