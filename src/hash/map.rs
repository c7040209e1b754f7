// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An unordered map.
//!
//! An immutable hash map using [hash array mapped tries][1].
//!
//! Most operations on this map are O(log<sub>x</sub> n) for a
//! suitably high *x* that it should be nearly O(1) for most maps.
//! Because of this, it's a great choice for a generic map as long as
//! you don't mind that keys will need to implement
//! [`Hash`][std::hash::Hash] and [`Eq`][std::cmp::Eq].
//!
//! Map entries will have a predictable order based on the hasher
//! being used. Unless otherwise specified, this will be the standard
//! [`RandomState`][std::collections::hash_map::RandomState] hasher.
//!
//! # Persistent and transient updates
//!
//! Methods taking `&self` and returning a new map, like
//! [`set`][GenericHashMap::set] and [`without`][GenericHashMap::without],
//! never change the map they are called on: the result shares every
//! subtree it didn't need to change with the original.
//!
//! Methods taking `&mut self`, like [`insert`][GenericHashMap::insert],
//! update the map in front of you. On an ordinary map they still copy the
//! path to the entry they change, because any node may be shared with an
//! older version. A map obtained from
//! [`begin_mutation`][GenericHashMap::begin_mutation] carries a fresh edit
//! token instead, and nodes it creates are stamped with it, so a batch of
//! updates only copies each node once and changes it in place from then
//! on. [`end_mutation`][GenericHashMap::end_mutation] (or the scoped
//! [`mutate`][GenericHashMap::mutate]) turns it back into an ordinary map.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [std::cmp::Eq]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
//! [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html
//! [std::collections::hash_map::RandomState]: https://doc.rust-lang.org/std/collections/hash_map/struct.RandomState.html

use std::borrow::Borrow;
use std::collections;
use std::collections::hash_map::RandomState;
use std::fmt::{Debug, Error, Formatter};
use std::hash::{BuildHasher, Hash};
use std::iter::{FromIterator, FusedIterator};
use std::mem;
use std::ops::Index;

use archery::SharedPointerKind;

use crate::nodes::bits::{hash_key, HashBits};
use crate::nodes::hamt::{Change, Edit, KeyLike, Node, Outcome, Owned, Probe};
use crate::nodes::iter::{Drain as NodeDrain, Iter as NodeIter};
use crate::shared_ptr::DefaultSharedPtr;

/// Construct a hash map from a sequence of key/value pairs.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate hashtrie;
/// # use hashtrie::HashMap;
/// # fn main() {
/// assert_eq!(
///   hashmap!{
///     1 => 11,
///     2 => 22,
///     3 => 33
///   },
///   HashMap::from(vec![(1, 11), (2, 22), (3, 33)])
/// );
/// # }
/// ```
#[macro_export]
macro_rules! hashmap {
    () => { $crate::hashmap::HashMap::new() };

    ( $( $key:expr => $value:expr ),* ) => {{
        let mut map = $crate::hashmap::HashMap::new();
        $({
            map.insert($key, $value);
        })*;
        map
    }};

    ( $( $key:expr => $value:expr ,)* ) => {{
        let mut map = $crate::hashmap::HashMap::new();
        $({
            map.insert($key, $value);
        })*;
        map
    }};
}

/// Type alias for [`GenericHashMap`] that uses [`std::hash::RandomState`] as the default hasher and [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericHashMap]: ./struct.GenericHashMap.html
/// [`std::hash::RandomState`]: https://doc.rust-lang.org/stable/std/collections/hash_map/struct.RandomState.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type HashMap<K, V> = GenericHashMap<K, V, RandomState, DefaultSharedPtr>;

/// An unordered map.
///
/// An immutable hash map using [hash array mapped tries] [1].
///
/// Most operations on this map are O(log<sub>x</sub> n) for a
/// suitably high *x* that it should be nearly O(1) for most maps.
/// Because of this, it's a great choice for a generic map as long as
/// you don't mind that keys will need to implement
/// [`Hash`][std::hash::Hash] and [`Eq`][std::cmp::Eq].
///
/// The hasher `S` decides how keys are hashed, and the keys' own
/// [`Eq`][std::cmp::Eq] decides when two keys are the same key. Keys that
/// are equal must hash the same; if they don't, lookups will give wrong
/// answers, but nothing worse will happen.
///
/// [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
/// [std::cmp::Eq]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
/// [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html
pub struct GenericHashMap<K, V, S, P: SharedPointerKind> {
    size: usize,
    root: Node<K, V, P>,
    hasher: S,
    edit: Option<Edit>,
}

impl<K, V, P> GenericHashMap<K, V, RandomState, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    /// Construct a hash map with a single mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hashtrie::HashMap;
    /// let map = HashMap::unit(123, "onetwothree");
    /// assert_eq!(
    ///   map.get(&123),
    ///   Some(&"onetwothree")
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn unit(k: K, v: V) -> GenericHashMap<K, V, RandomState, P> {
        GenericHashMap::new().set(k, v)
    }
}

impl<K, V, S, P: SharedPointerKind> GenericHashMap<K, V, S, P> {
    /// Construct an empty hash map.
    #[inline]
    #[must_use]
    pub fn new() -> Self
    where
        S: Default,
    {
        Self::default()
    }

    /// Test whether a hash map is empty.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// assert!(
    ///   !hashmap!{1 => 2}.is_empty()
    /// );
    /// assert!(
    ///   HashMap::<i32, i32>::new().is_empty()
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of a hash map.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// assert_eq!(3, hashmap!{
    ///   1 => 11,
    ///   2 => 22,
    ///   3 => 33
    /// }.len());
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Test whether two maps refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same map,
    /// or if the two maps refer to the same root node.
    ///
    /// This would return true if you're comparing a map to itself, or
    /// if you're comparing a map to a fresh clone of itself.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.root.ptr_eq(&other.root)
    }

    /// Test whether this map is open for in-place mutation, ie. whether it
    /// came from [`begin_mutation`][GenericHashMap::begin_mutation] and
    /// hasn't been through [`end_mutation`][GenericHashMap::end_mutation]
    /// yet.
    #[inline]
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.edit.is_some()
    }

    /// Construct an empty hash map using the provided hasher.
    #[inline]
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        GenericHashMap {
            size: 0,
            root: Node::Empty,
            hasher,
            edit: None,
        }
    }

    /// Get a reference to the map's [`BuildHasher`][BuildHasher].
    ///
    /// [BuildHasher]: https://doc.rust-lang.org/std/hash/trait.BuildHasher.html
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Construct an empty hash map using the same hasher as the
    /// current hash map.
    #[inline]
    #[must_use]
    pub fn new_from<K1, V1>(&self) -> GenericHashMap<K1, V1, S, P>
    where
        S: Clone,
    {
        GenericHashMap::with_hasher(self.hasher.clone())
    }

    /// Get an iterator over the key/value pairs of a hash map.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    /// Items will not come out in insertion order or sort order.
    /// They will, however, come out in the same order every time for
    /// the same map.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            it: NodeIter::new(&self.root, self.size),
        }
    }

    /// Get an iterator over a hash map's keys.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys {
            it: NodeIter::new(&self.root, self.size),
        }
    }

    /// Get an iterator over a hash map's values.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values {
            it: NodeIter::new(&self.root, self.size),
        }
    }

    /// Fold the key/value pairs of a map into a single value.
    ///
    /// The walk is iterative, so it doesn't grow the call stack however
    /// deep the trie gets.
    ///
    /// Time: O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 10, 2 => 20, 3 => 30};
    /// assert_eq!(66, map.fold(0, |acc, k, v| acc + k + v));
    /// ```
    pub fn fold<B, F>(&self, init: B, mut f: F) -> B
    where
        F: FnMut(B, &K, &V) -> B,
    {
        self.iter().fold(init, |acc, (k, v)| f(acc, k, v))
    }

    /// Call a function on every key/value pair of a map.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        self.iter().for_each(|(k, v)| f(k, v))
    }

    /// Discard all elements from the map.
    ///
    /// This leaves you with an empty map, and all elements that
    /// were previously inside it are dropped.
    ///
    /// Time: O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::HashMap;
    /// let mut map = hashmap![1=>1, 2=>2, 3=>3];
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.root = Node::Empty;
        self.size = 0;
    }

    /// Start a batch of in-place updates.
    ///
    /// The returned map holds the same entries as this one, plus a fresh
    /// edit token. Nodes it copies or creates while you update it through
    /// its `&mut self` methods carry that token, and are changed in place
    /// the next time around instead of being copied again. This map, and
    /// every other map sharing structure with it, stays as it is.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 1};
    /// let mut batch = map.begin_mutation();
    /// for i in 2..100 {
    ///     batch.insert(i, i);
    /// }
    /// let bigger = batch.end_mutation();
    /// assert_eq!(1, map.len());
    /// assert_eq!(99, bigger.len());
    /// ```
    #[must_use]
    pub fn begin_mutation(&self) -> Self
    where
        S: Clone,
    {
        GenericHashMap {
            size: self.size,
            root: self.root.clone(),
            hasher: self.hasher.clone(),
            edit: Some(Edit::fresh()),
        }
    }

    /// Finish a batch of in-place updates started by
    /// [`begin_mutation`][GenericHashMap::begin_mutation].
    ///
    /// From here on the map behaves like any other: no node reachable
    /// from it will be changed in place again.
    ///
    /// Time: O(1)
    #[must_use]
    pub fn end_mutation(mut self) -> Self {
        self.edit = None;
        self
    }

    /// Run a batch of in-place updates against a copy of this map, and
    /// return the result.
    ///
    /// If `body` panics, the half-updated copy is dropped and this map is
    /// left as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 1, 2 => 2};
    /// let changed = map.mutate(|m| {
    ///     m.remove(&1);
    ///     m.insert(3, 3);
    /// });
    /// assert_eq!(hashmap!{1 => 1, 2 => 2}, map);
    /// assert_eq!(hashmap!{2 => 2, 3 => 3}, changed);
    /// ```
    #[must_use]
    pub fn mutate<F>(&self, body: F) -> Self
    where
        F: FnOnce(&mut Self),
        S: Clone,
    {
        let mut map = self.begin_mutation();
        body(&mut map);
        map.end_mutation()
    }

    /// Run `body` with this map open for in-place updates, restoring its
    /// previous state of editability afterwards.
    fn batch<F>(&mut self, body: F)
    where
        F: FnOnce(&mut Self),
    {
        if self.edit.is_some() {
            return body(self);
        }
        self.edit = Some(Edit::fresh());
        let mut guard = Refreeze { map: self };
        body(&mut *guard.map);
    }

    /// Check the structure of the underlying trie, panicking if anything
    /// is out of place.
    #[cfg(any(test, feature = "debug"))]
    pub fn assert_invariants(&self)
    where
        K: Eq,
    {
        let hashes = self.root.check_invariants(0);
        assert_eq!(self.size, hashes.len(), "map size disagrees with its entries");
    }
}

impl<K, V, S, P> GenericHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
    fn test_eq<S2: BuildHasher, P2: SharedPointerKind>(
        &self,
        other: &GenericHashMap<K, V, S2, P2>,
    ) -> bool
    where
        V: PartialEq,
    {
        // Keys are unique, so same size plus containment means same entries.
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }

    /// Get the value for a key from a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "lol"};
    /// assert_eq!(
    ///   map.get(&123),
    ///   Some(&"lol")
    /// );
    /// ```
    #[must_use]
    pub fn get<BK>(&self, key: &BK) -> Option<&V>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Get the key/value pair for a key from a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "lol"};
    /// assert_eq!(
    ///   map.get_key_value(&123),
    ///   Some((&123, &"lol"))
    /// );
    /// ```
    #[must_use]
    pub fn get_key_value<BK>(&self, key: &BK) -> Option<(&K, &V)>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.root.get(hash_key(&self.hasher, key), key)
    }

    /// Test for the presence of a key in a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "lol"};
    /// assert!(
    ///   map.contains_key(&123)
    /// );
    /// assert!(
    ///   !map.contains_key(&321)
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn contains_key<BK>(&self, k: &BK) -> bool
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.get(k).is_some()
    }
}

impl<K, V, S, P> GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    /// Run one [`Node::modify`] against the root and settle the size.
    ///
    /// The map is emptied for the duration of the call, so a panicking
    /// callback leaves it empty rather than inconsistent.
    fn modify_entry<Q, F>(&mut self, hash: HashBits, key: Q, f: F, capture: bool) -> Option<V>
    where
        Q: KeyLike<K>,
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        let root = mem::take(&mut self.root);
        let size = mem::replace(&mut self.size, 0);
        let mut outcome = Outcome::new(capture);
        self.root = root.modify(self.edit, 0, f, hash, key, &mut outcome);
        self.size = outcome.apply(size);
        outcome.into_displaced()
    }

    /// Insert a key/value mapping into a map.
    ///
    /// If the map already has a mapping for the given key, the
    /// previous value is overwritten and returned.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let mut map = hashmap!{};
    /// assert_eq!(None, map.insert(123, "123"));
    /// assert_eq!(Some("123"), map.insert(123, "321"));
    /// assert_eq!(map, hashmap!{123 => "321"});
    /// ```
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        let hash = hash_key(&self.hasher, &k);
        self.modify_entry(hash, Owned(k), |_| Change::Set(v), true)
    }

    /// Remove a key/value pair from a map, if it exists, and return
    /// the removed value.
    ///
    /// Removing a key that isn't there leaves the map untouched.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let mut map = hashmap!{123 => "123", 456 => "456"};
    /// assert_eq!(Some("123"), map.remove(&123));
    /// assert_eq!(Some("456"), map.remove(&456));
    /// assert_eq!(None, map.remove(&789));
    /// assert!(map.is_empty());
    /// ```
    pub fn remove<BK>(&mut self, k: &BK) -> Option<V>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        let hash = hash_key(&self.hasher, k);
        self.modify_entry(hash, Probe(k), |_| Change::Remove, true)
    }

    /// Remove every key produced by an iterator from a map.
    ///
    /// Time: O(m log n)
    pub fn remove_many<'a, BK, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a BK>,
        BK: Hash + Eq + ?Sized + 'a,
        K: Borrow<BK>,
    {
        self.batch(|map| {
            for key in keys {
                let hash = hash_key(&map.hasher, key);
                map.modify_entry(hash, Probe(key), |_| Change::Remove, false);
            }
        })
    }

    /// Insert, update or remove the mapping for a key in place.
    ///
    /// `f` receives the current value for `key`, if any. If it returns
    /// `Some`, that becomes the key's new value; if it returns `None`,
    /// the key is removed.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let mut map = hashmap!{"counter" => 1};
    /// map.alter("counter", |v| v.map(|n| n + 1));
    /// map.alter("fresh", |v| Some(v.copied().unwrap_or(0)));
    /// map.alter("counter", |_| None);
    /// assert_eq!(hashmap!{"fresh" => 0}, map);
    /// ```
    pub fn alter<F>(&mut self, key: K, f: F)
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let hash = hash_key(&self.hasher, &key);
        self.modify_entry(
            hash,
            Owned(key),
            |current| match f(current) {
                Some(value) => Change::Set(value),
                None => Change::Remove,
            },
            false,
        );
    }

    /// Replace the value for a key with the result of a function, if the
    /// key is present. Absent keys are left alone.
    ///
    /// Returns `true` if the key was present.
    ///
    /// Time: O(log n)
    pub fn update_mut<BK, F>(&mut self, key: &BK, f: F) -> bool
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
        F: FnOnce(&V) -> V,
    {
        let hash = hash_key(&self.hasher, key);
        let mut found = false;
        self.modify_entry(
            hash,
            Probe(key),
            |current| match current {
                Some(value) => {
                    found = true;
                    Change::Set(f(value))
                }
                None => Change::Keep,
            },
            false,
        );
        found
    }

    /// Retain only the elements specified by the predicate.
    ///
    /// Remove all pairs `(k, v)` for which `f(&k, &v)` returns false.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let mut map = hashmap!{1 => 1, 2 => 2, 3 => 3};
    /// map.retain(|k, v| *k > 1);
    /// let expected = hashmap!{2 => 2, 3 => 3};
    /// assert_eq!(expected, map);
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .iter()
            .filter(|&(k, v)| !f(k, v))
            .map(|(k, _)| k.clone())
            .collect();
        self.remove_many(doomed.iter());
    }

    /// Construct a new hash map by inserting a key/value mapping into a map.
    ///
    /// If the map already has a mapping for the given key, the previous
    /// value is overwritten. The original map is left as it is.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{};
    /// assert_eq!(
    ///   map.set(123, "123"),
    ///   hashmap!{123 => "123"}
    /// );
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn set(&self, k: K, v: V) -> Self {
        let mut out = self.clone();
        let hash = hash_key(&out.hasher, &k);
        out.modify_entry(hash, Owned(k), |_| Change::Set(v), false);
        out
    }

    /// Construct a new map without the given key.
    ///
    /// Construct a map that's a copy of the current map, absent the
    /// mapping for `key` if it's present. If it isn't, the result shares
    /// its root with this map.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn without<BK>(&self, k: &BK) -> Self
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        let mut out = self.clone();
        let hash = hash_key(&out.hasher, k);
        out.modify_entry(hash, Probe(k), |_| Change::Remove, false);
        out
    }

    /// Construct a new map without any of the keys produced by an
    /// iterator.
    ///
    /// Time: O(m log n)
    #[must_use]
    pub fn without_many<'a, BK, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a BK>,
        BK: Hash + Eq + ?Sized + 'a,
        K: Borrow<BK>,
    {
        self.mutate(|map| map.remove_many(keys))
    }

    /// Construct a new map by inserting, updating or removing the mapping
    /// for a key.
    ///
    /// This is the persistent counterpart of
    /// [`alter`][GenericHashMap::alter].
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => "one"};
    /// let renamed = map.modify(1, |v| v.map(|_| "uno"));
    /// assert_eq!(Some(&"uno"), renamed.get(&1));
    /// assert_eq!(Some(&"one"), map.get(&1));
    /// assert!(map.modify(1, |_| None).is_empty());
    /// ```
    #[must_use]
    pub fn modify<F>(&self, key: K, f: F) -> Self
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let mut out = self.clone();
        out.alter(key, f);
        out
    }

    /// Construct a new map with the value for a key replaced by the
    /// result of a function, if the key is present.
    ///
    /// When the key is absent, the result shares its root with this map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 10};
    /// assert_eq!(hashmap!{1 => 11}, map.update(&1, |v| v + 1));
    /// assert!(map.update(&2, |v| v + 1).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn update<BK, F>(&self, key: &BK, f: F) -> Self
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
        F: FnOnce(&V) -> V,
    {
        let mut out = self.clone();
        out.update_mut(key, f);
        out
    }

    /// Remove a key/value pair from a map, if it exists, and return
    /// the removed value as well as the updated map.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn extract<BK>(&self, k: &BK) -> Option<(V, Self)>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        let mut out = self.clone();
        let value = out.remove(k)?;
        Some((value, out))
    }

    /// Remove a key/value pair from a map, if it exists, and return the
    /// removed key and value as well as the updated map.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn extract_with_key<BK>(&self, k: &BK) -> Option<(K, V, Self)>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        let (key, value) = self.get_key_value(k)?;
        let (key, value) = (key.clone(), value.clone());
        Some((key, value, self.without(k)))
    }

    /// Construct a new map containing only the pairs for which the
    /// predicate returns true.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn filter<F>(&self, f: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.mutate(|map| map.retain(f))
    }

    /// Split a map in two: the pairs for which the predicate returns true,
    /// and the rest.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 'a', 2 => 'b', 3 => 'c'};
    /// let (odd, even) = map.partition(|k, _| k % 2 == 1);
    /// assert_eq!(hashmap!{1 => 'a', 3 => 'c'}, odd);
    /// assert_eq!(hashmap!{2 => 'b'}, even);
    /// ```
    #[must_use]
    pub fn partition<F>(&self, mut f: F) -> (Self, Self)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut matching = self.begin_mutation();
        let mut rest = self.begin_mutation();
        for (k, v) in self {
            if f(k, v) {
                rest.remove(k);
            } else {
                matching.remove(k);
            }
        }
        (matching.end_mutation(), rest.end_mutation())
    }

    /// Construct a new map with the same keys, and values produced by
    /// calling a function on each pair.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 10, 2 => 20};
    /// let strings = map.map_values(|_, v| v.to_string());
    /// assert_eq!(Some(&"20".to_string()), strings.get(&2));
    /// ```
    #[must_use]
    pub fn map_values<W, F>(&self, mut f: F) -> GenericHashMap<K, W, S, P>
    where
        W: Clone,
        F: FnMut(&K, &V) -> W,
    {
        let mut out = self.new_from();
        out.batch(|out| {
            for (k, v) in self {
                out.insert(k.clone(), f(k, v));
            }
        });
        out
    }

    /// Construct a new map from the pairs for which a function returns a
    /// value, mapping each key to that value.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn filter_map<W, F>(&self, mut f: F) -> GenericHashMap<K, W, S, P>
    where
        W: Clone,
        F: FnMut(&K, &V) -> Option<W>,
    {
        let mut out = self.new_from();
        out.batch(|out| {
            for (k, v) in self {
                if let Some(value) = f(k, v) {
                    out.insert(k.clone(), value);
                }
            }
        });
        out
    }

    /// Construct a new map from all the pairs produced by calling a
    /// function on each pair of this map. Later pairs overwrite earlier
    /// ones with the same key.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map = hashmap!{1 => 2};
    /// let spread = map.flat_map(|k, v| vec![(*k, *v), (*k * 10, *v * 10)]);
    /// assert_eq!(hashmap!{1 => 2, 10 => 20}, spread);
    /// ```
    #[must_use]
    pub fn flat_map<K2, W, I, F>(&self, mut f: F) -> GenericHashMap<K2, W, S, P>
    where
        K2: Hash + Eq + Clone,
        W: Clone,
        I: IntoIterator<Item = (K2, W)>,
        F: FnMut(&K, &V) -> I,
    {
        let mut out = self.new_from();
        out.batch(|out| {
            for (k, v) in self {
                for (key, value) in f(k, v) {
                    out.insert(key, value);
                }
            }
        });
        out
    }

    /// Construct the union of two maps.
    ///
    /// Where both maps have a mapping for the same key, the value from
    /// `other` wins.
    ///
    /// Time: O(m log n) where m is the size of the smaller map
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashmap::HashMap;
    /// let map1 = hashmap!{1 => 1, 3 => 3};
    /// let map2 = hashmap!{2 => 2, 3 => 4};
    /// let expected = hashmap!{1 => 1, 2 => 2, 3 => 4};
    /// assert_eq!(expected, map1.union(&map2));
    /// ```
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if other.len() > self.len() {
            other.mutate(|out| {
                for (k, v) in self {
                    if !out.contains_key(k) {
                        out.insert(k.clone(), v.clone());
                    }
                }
            })
        } else {
            self.mutate(|out| {
                for (k, v) in other {
                    out.insert(k.clone(), v.clone());
                }
            })
        }
    }
}

// Core traits

impl<K, V, S, P> Clone for GenericHashMap<K, V, S, P>
where
    S: Clone,
    P: SharedPointerKind,
{
    /// Clone a map.
    ///
    /// The clone shares the whole trie with the original, and is never
    /// editable, even when the original is.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericHashMap {
            size: self.size,
            root: self.root.clone(),
            hasher: self.hasher.clone(),
            edit: None,
        }
    }
}

impl<K, V, S1, S2, P1, P2> PartialEq<GenericHashMap<K, V, S2, P2>> for GenericHashMap<K, V, S1, P1>
where
    K: Hash + Eq,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
    P1: SharedPointerKind,
    P2: SharedPointerKind,
{
    fn eq(&self, other: &GenericHashMap<K, V, S2, P2>) -> bool {
        self.test_eq(other)
    }
}

impl<K, V, S, P> Eq for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
}

impl<K, V, S, P> Default for GenericHashMap<K, V, S, P>
where
    S: Default,
    P: SharedPointerKind,
{
    #[inline]
    fn default() -> Self {
        GenericHashMap::with_hasher(S::default())
    }
}

/// Drops the edit token of a map opened by `batch`, even if the batch
/// unwinds.
struct Refreeze<'a, K, V, S, P: SharedPointerKind> {
    map: &'a mut GenericHashMap<K, V, S, P>,
}

impl<K, V, S, P: SharedPointerKind> Drop for Refreeze<'_, K, V, S, P> {
    fn drop(&mut self) {
        self.map.edit = None;
    }
}

impl<K, V, S, RK, RV, P> Extend<(RK, RV)> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone + From<RK>,
    V: Clone + From<RV>,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (RK, RV)>,
    {
        self.batch(|map| {
            for (key, value) in iter {
                map.insert(From::from(key), From::from(value));
            }
        })
    }
}

impl<BK, K, V, S, P> Index<&BK> for GenericHashMap<K, V, S, P>
where
    BK: Hash + Eq + ?Sized,
    K: Hash + Eq + Borrow<BK>,
    S: BuildHasher,
    P: SharedPointerKind,
{
    type Output = V;

    fn index(&self, key: &BK) -> &Self::Output {
        match self.get(key) {
            None => panic!("HashMap::index: invalid key"),
            Some(value) => value,
        }
    }
}

impl<K, V, S, P> Debug for GenericHashMap<K, V, S, P>
where
    K: Debug,
    V: Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut d = f.debug_map();
        for (k, v) in self {
            d.entry(k, v);
        }
        d.finish()
    }
}

// Iterators

/// An iterator over the elements of a map.
pub struct Iter<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

/// A consuming iterator over the elements of a map.
pub struct ConsumingIter<K, V, P: SharedPointerKind> {
    it: NodeDrain<K, V, P>,
}

impl<K, V, P> Iterator for ConsumingIter<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K: Clone, V: Clone, P: SharedPointerKind> ExactSizeIterator for ConsumingIter<K, V, P> {}

impl<K: Clone, V: Clone, P: SharedPointerKind> FusedIterator for ConsumingIter<K, V, P> {}

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Keys<'a, K, V, P> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Keys<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Keys<'a, K, V, P> {}

/// An iterator over the values of a map.
pub struct Values<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Values<'a, K, V, P> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Values<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Values<'a, K, V, P> {}

impl<'a, K, V, S, P: SharedPointerKind> IntoIterator for &'a GenericHashMap<K, V, S, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S, P> IntoIterator for GenericHashMap<K, V, S, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    type Item = (K, V);
    type IntoIter = ConsumingIter<K, V, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        ConsumingIter {
            it: NodeDrain::new(self.root, self.size),
        }
    }
}

// Conversions

impl<K, V, S, P> FromIterator<(K, V)> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::default();
        map.extend(i);
        map
    }
}

impl<'a, K, V, S, P> From<&'a [(K, V)]> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: &'a [(K, V)]) -> Self {
        m.iter().cloned().collect()
    }
}

impl<K, V, S, P> From<Vec<(K, V)>> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: Vec<(K, V)>) -> Self {
        m.into_iter().collect()
    }
}

impl<K, V, S, P, const N: usize> From<[(K, V); N]> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: [(K, V); N]) -> Self {
        m.into_iter().collect()
    }
}

impl<K, V, S1, S2, P> From<collections::HashMap<K, V, S2>> for GenericHashMap<K, V, S1, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S1: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: collections::HashMap<K, V, S2>) -> Self {
        m.into_iter().collect()
    }
}

// Tests
