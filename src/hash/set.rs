// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An unordered set.
//!
//! An immutable hash set using [hash array mapped tries] [1].
//!
//! Most operations on this set are O(log<sub>x</sub> n) for a
//! suitably high *x* that it should be nearly O(1) for most sets.
//! Because of this, it's a great choice for a generic set as long as
//! you don't mind that values will need to implement
//! [`Hash`][std::hash::Hash] and [`Eq`][std::cmp::Eq].
//!
//! Values will have a predictable order based on the hasher
//! being used. Unless otherwise specified, this will be the standard
//! [`RandomState`][std::collections::hash_map::RandomState] hasher.
//!
//! A set is a [`GenericHashMap`] from its values to `()`, and follows the
//! map's rules for persistent updates and mutation scopes.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [std::cmp::Eq]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
//! [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html
//! [std::collections::hash_map::RandomState]: https://doc.rust-lang.org/std/collections/hash_map/struct.RandomState.html

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt::{Debug, Error, Formatter};
use std::hash::{BuildHasher, Hash};
use std::iter::{FromIterator, FusedIterator};

use archery::SharedPointerKind;

use crate::hash::map::{self, GenericHashMap};
use crate::shared_ptr::DefaultSharedPtr;

/// Construct a set from a sequence of values.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate hashtrie;
/// # use hashtrie::HashSet;
/// # fn main() {
/// assert_eq!(
///   hashset![1, 2, 3],
///   HashSet::from(vec![1, 2, 3])
/// );
/// # }
/// ```
#[macro_export]
macro_rules! hashset {
    () => { $crate::hashset::HashSet::new() };

    ( $($x:expr),* ) => {{
        let mut l = $crate::hashset::HashSet::new();
        $(
            l.insert($x);
        )*
            l
    }};

    ( $($x:expr ,)* ) => {{
        let mut l = $crate::hashset::HashSet::new();
        $(
            l.insert($x);
        )*
            l
    }};
}

/// Type alias for [`GenericHashSet`] that uses [`std::hash::RandomState`] as the default hasher and [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericHashSet]: ./struct.GenericHashSet.html
/// [`std::hash::RandomState`]: https://doc.rust-lang.org/stable/std/collections/hash_map/struct.RandomState.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type HashSet<A> = GenericHashSet<A, RandomState, DefaultSharedPtr>;

/// An unordered set.
///
/// An immutable hash set using [hash array mapped tries] [1].
///
/// Most operations on this set are O(log<sub>x</sub> n) for a
/// suitably high *x* that it should be nearly O(1) for most sets.
/// Because of this, it's a great choice for a generic set as long as
/// you don't mind that values will need to implement
/// [`Hash`][std::hash::Hash] and [`Eq`][std::cmp::Eq].
///
/// Values will have a predictable order based on the hasher
/// being used. Unless otherwise specified, this will be the standard
/// [`RandomState`][std::collections::hash_map::RandomState] hasher.
///
/// [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
/// [std::cmp::Eq]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
/// [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html
/// [std::collections::hash_map::RandomState]: https://doc.rust-lang.org/std/collections/hash_map/struct.RandomState.html
pub struct GenericHashSet<A, S, P: SharedPointerKind> {
    map: GenericHashMap<A, (), S, P>,
}

impl<A, S, P> GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    /// Construct a set with a single value.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set = HashSet::unit(123);
    /// assert!(set.contains(&123));
    /// ```
    #[inline]
    #[must_use]
    pub fn unit(a: A) -> Self {
        GenericHashSet::new().add(a)
    }
}

impl<A, S, P: SharedPointerKind> GenericHashSet<A, S, P> {
    /// Construct an empty set.
    #[must_use]
    pub fn new() -> Self
    where
        S: Default,
    {
        Self::default()
    }

    /// Test whether a set is empty.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// assert!(
    ///   !hashset![1, 2, 3].is_empty()
    /// );
    /// assert!(
    ///   HashSet::<i32>::new().is_empty()
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of a set.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// assert_eq!(3, hashset![1, 2, 3].len());
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Test whether two sets refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same set,
    /// or if the two sets refer to the same root node.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.map.ptr_eq(&other.map)
    }

    /// Test whether this set is open for in-place mutation.
    #[inline]
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.map.is_editable()
    }

    /// Construct an empty hash set using the provided hasher.
    #[inline]
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        GenericHashSet {
            map: GenericHashMap::with_hasher(hasher),
        }
    }

    /// Get a reference to the set's [`BuildHasher`][BuildHasher].
    ///
    /// [BuildHasher]: https://doc.rust-lang.org/std/hash/trait.BuildHasher.html
    #[must_use]
    pub fn hasher(&self) -> &S {
        self.map.hasher()
    }

    /// Construct an empty hash set using the same hasher as the current hash set.
    #[inline]
    #[must_use]
    pub fn new_from<A2>(&self) -> GenericHashSet<A2, S, P>
    where
        S: Clone,
    {
        GenericHashSet {
            map: self.map.new_from(),
        }
    }

    /// Discard all elements from the set.
    ///
    /// Time: O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::HashSet;
    /// let mut set = hashset![1, 2, 3];
    /// set.clear();
    /// assert!(set.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Get an iterator over the values in a hash set.
    ///
    /// Please note that the order is consistent between sets using
    /// the same hasher, but no other ordering guarantee is offered.
    /// Items will not come out in insertion order or sort order.
    /// They will, however, come out in the same order every time for
    /// the same set.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, A, P> {
        Iter {
            it: self.map.keys(),
        }
    }

    /// Fold the values of a set into a single value.
    ///
    /// Time: O(n)
    pub fn fold<B, F>(&self, init: B, mut f: F) -> B
    where
        F: FnMut(B, &A) -> B,
    {
        self.map.fold(init, |acc, value, _| f(acc, value))
    }

    /// Call a function on every value of a set.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&A),
    {
        self.map.for_each(|value, _| f(value))
    }

    /// Start a batch of in-place updates.
    ///
    /// See [`GenericHashMap::begin_mutation`].
    #[must_use]
    pub fn begin_mutation(&self) -> Self
    where
        S: Clone,
    {
        GenericHashSet {
            map: self.map.begin_mutation(),
        }
    }

    /// Finish a batch of in-place updates.
    ///
    /// See [`GenericHashMap::end_mutation`].
    #[must_use]
    pub fn end_mutation(self) -> Self {
        GenericHashSet {
            map: self.map.end_mutation(),
        }
    }

    /// Run a batch of in-place updates against a copy of this set, and
    /// return the result.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set = hashset![1, 2, 3];
    /// let evens = set.mutate(|s| s.retain(|v| v % 2 == 0));
    /// assert_eq!(hashset![2], evens);
    /// assert_eq!(3, set.len());
    /// ```
    #[must_use]
    pub fn mutate<F>(&self, body: F) -> Self
    where
        F: FnOnce(&mut Self),
        S: Clone,
    {
        let mut set = self.begin_mutation();
        body(&mut set);
        set.end_mutation()
    }

    /// Check the structure of the underlying trie, panicking if anything
    /// is out of place.
    #[cfg(any(test, feature = "debug"))]
    pub fn assert_invariants(&self)
    where
        A: Eq,
    {
        self.map.assert_invariants()
    }
}

impl<A, S, P> GenericHashSet<A, S, P>
where
    A: Hash + Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
    /// Test if a value is part of a set.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn contains<BA>(&self, a: &BA) -> bool
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.map.contains_key(a)
    }

    /// Test whether a set is a subset of another set, meaning that
    /// all values in our set must also be in the other set.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn is_subset<RS>(&self, other: RS) -> bool
    where
        RS: Borrow<Self>,
    {
        let o = other.borrow();
        self.len() <= o.len() && self.iter().all(|a| o.contains(a))
    }

    /// Test whether a set is a proper subset of another set, meaning
    /// that all values in our set must also be in the other set. A
    /// proper subset must also be smaller than the other set.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn is_proper_subset<RS>(&self, other: RS) -> bool
    where
        RS: Borrow<Self>,
    {
        self.len() != other.borrow().len() && self.is_subset(other)
    }
}

impl<A, S, P> GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    /// Insert a value into a set.
    ///
    /// Returns `true` if the value wasn't in the set already.
    ///
    /// Time: O(log n)
    #[inline]
    pub fn insert(&mut self, a: A) -> bool {
        self.map.insert(a, ()).is_none()
    }

    /// Remove a value from a set if it exists.
    ///
    /// Returns `true` if the value was in the set.
    ///
    /// Time: O(log n)
    pub fn remove<BA>(&mut self, a: &BA) -> bool
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.map.remove(a).is_some()
    }

    /// Construct a new set from the current set with the given value
    /// added.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set = hashset![123];
    /// assert_eq!(
    ///   set.add(456),
    ///   hashset![123, 456]
    /// );
    /// ```
    #[must_use]
    pub fn add(&self, a: A) -> Self {
        GenericHashSet {
            map: self.map.set(a, ()),
        }
    }

    /// Construct a new set with the given value removed if it's in
    /// the set.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn without<BA>(&self, a: &BA) -> Self
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        GenericHashSet {
            map: self.map.without(a),
        }
    }

    /// Construct a new set with the given value removed if it's in the
    /// set, or added if it isn't.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set = hashset![1, 2];
    /// assert_eq!(hashset![1], set.toggle(2));
    /// assert_eq!(hashset![1, 2, 3], set.toggle(3));
    /// ```
    #[must_use]
    pub fn toggle(&self, a: A) -> Self {
        GenericHashSet {
            map: self.map.modify(a, |present| match present {
                Some(()) => None,
                None => Some(()),
            }),
        }
    }

    /// Remove the values which don't satisfy a predicate.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::HashSet;
    /// let mut set = hashset![1, 2, 3];
    /// set.retain(|v| *v > 1);
    /// let expected = hashset![2, 3];
    /// assert_eq!(expected, set);
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&A) -> bool,
    {
        self.map.retain(|value, _| f(value))
    }

    /// Construct a new set with only the values which satisfy a
    /// predicate.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn filter<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&A) -> bool,
    {
        GenericHashSet {
            map: self.map.filter(|value, _| f(value)),
        }
    }

    /// Split a set in two: the values which satisfy a predicate, and the
    /// rest.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn partition<F>(&self, mut f: F) -> (Self, Self)
    where
        F: FnMut(&A) -> bool,
    {
        let (matching, rest) = self.map.partition(|value, _| f(value));
        (GenericHashSet { map: matching }, GenericHashSet { map: rest })
    }

    /// Construct a new set from the results of calling a function on
    /// every value of this set.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set = hashset![1, 2, 3];
    /// assert_eq!(hashset![0, 1], set.map(|v| v / 2));
    /// ```
    #[must_use]
    pub fn map<B, F>(&self, mut f: F) -> GenericHashSet<B, S, P>
    where
        B: Hash + Eq + Clone,
        F: FnMut(&A) -> B,
    {
        GenericHashSet {
            map: self.map.flat_map(|value, _| Some((f(value), ()))),
        }
    }

    /// Construct a new set from all the values produced by calling a
    /// function on every value of this set.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn flat_map<B, I, F>(&self, mut f: F) -> GenericHashSet<B, S, P>
    where
        B: Hash + Eq + Clone,
        I: IntoIterator<Item = B>,
        F: FnMut(&A) -> I,
    {
        GenericHashSet {
            map: self
                .map
                .flat_map(|value, _| f(value).into_iter().map(|b| (b, ()))),
        }
    }

    /// Construct the union of two sets.
    ///
    /// Time: O(m log n) where m is the size of the smaller set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set1 = hashset!{1, 2};
    /// let set2 = hashset!{2, 3};
    /// let expected = hashset!{1, 2, 3};
    /// assert_eq!(expected, set1.union(&set2));
    /// ```
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        GenericHashSet {
            map: self.map.union(&other.map),
        }
    }

    /// Construct the intersection of two sets.
    ///
    /// Time: O(m log n) where m is the size of the smaller set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set1 = hashset!{1, 2};
    /// let set2 = hashset!{2, 3};
    /// let expected = hashset!{2};
    /// assert_eq!(expected, set1.intersection(&set2));
    /// ```
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.filter(|value| large.contains(value))
    }

    /// Construct the set of values in `self` that do not occur in
    /// `other`.
    ///
    /// Time: O(m log n) where m is the size of the other set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hashtrie;
    /// # use hashtrie::hashset::HashSet;
    /// let set1 = hashset!{1, 2};
    /// let set2 = hashset!{2, 3};
    /// let expected = hashset!{1};
    /// assert_eq!(expected, set1.difference(&set2));
    /// ```
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        GenericHashSet {
            map: self.map.without_many(other.iter()),
        }
    }
}

// Core traits

impl<A, S, P> Clone for GenericHashSet<A, S, P>
where
    S: Clone,
    P: SharedPointerKind,
{
    /// Clone a set.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericHashSet {
            map: self.map.clone(),
        }
    }
}

impl<A, S1, P1, S2, P2> PartialEq<GenericHashSet<A, S2, P2>> for GenericHashSet<A, S1, P1>
where
    A: Hash + Eq,
    S1: BuildHasher,
    S2: BuildHasher,
    P1: SharedPointerKind,
    P2: SharedPointerKind,
{
    fn eq(&self, other: &GenericHashSet<A, S2, P2>) -> bool {
        self.map == other.map
    }
}

impl<A, S, P> Eq for GenericHashSet<A, S, P>
where
    A: Hash + Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
}

impl<A, S, P> Default for GenericHashSet<A, S, P>
where
    S: Default,
    P: SharedPointerKind,
{
    fn default() -> Self {
        GenericHashSet {
            map: GenericHashMap::default(),
        }
    }
}

impl<A, S, R, P> Extend<R> for GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone + From<R>,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = R>,
    {
        Extend::<(A, ())>::extend(
            &mut self.map,
            iter.into_iter().map(|value| (A::from(value), ())),
        );
    }
}

impl<A, S, P> Debug for GenericHashSet<A, S, P>
where
    A: Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

// Iterators

/// An iterator over the elements of a set.
pub struct Iter<'a, A, P: SharedPointerKind> {
    it: map::Keys<'a, A, (), P>,
}

impl<'a, A, P: SharedPointerKind> Iterator for Iter<'a, A, P> {
    type Item = &'a A;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, A, P: SharedPointerKind> ExactSizeIterator for Iter<'a, A, P> {}

impl<'a, A, P: SharedPointerKind> FusedIterator for Iter<'a, A, P> {}

/// A consuming iterator over the elements of a set.
pub struct ConsumingIter<A, P: SharedPointerKind> {
    it: map::ConsumingIter<A, (), P>,
}

impl<A, P> Iterator for ConsumingIter<A, P>
where
    A: Clone,
    P: SharedPointerKind,
{
    type Item = A;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(value, ())| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<A: Clone, P: SharedPointerKind> ExactSizeIterator for ConsumingIter<A, P> {}

impl<A: Clone, P: SharedPointerKind> FusedIterator for ConsumingIter<A, P> {}

// Iterator conversions

impl<A, RA, S, P> FromIterator<RA> for GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone + From<RA>,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = RA>,
    {
        let mut set = Self::default();
        set.extend(i);
        set
    }
}

impl<'a, A, S, P> IntoIterator for &'a GenericHashSet<A, S, P>
where
    P: SharedPointerKind,
{
    type Item = &'a A;
    type IntoIter = Iter<'a, A, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A, S, P> IntoIterator for GenericHashSet<A, S, P>
where
    A: Clone,
    P: SharedPointerKind,
{
    type Item = A;
    type IntoIter = ConsumingIter<A, P>;

    fn into_iter(self) -> Self::IntoIter {
        ConsumingIter {
            it: self.map.into_iter(),
        }
    }
}

// Conversions

impl<A, OA, SA, SB, P1, P2> From<&GenericHashSet<&A, SA, P1>> for GenericHashSet<OA, SB, P2>
where
    A: ToOwned<Owned = OA> + Hash + Eq + ?Sized,
    OA: Borrow<A> + Hash + Eq + Clone,
    SA: BuildHasher,
    SB: BuildHasher + Default + Clone,
    P1: SharedPointerKind,
    P2: SharedPointerKind,
{
    fn from(set: &GenericHashSet<&A, SA, P1>) -> Self {
        set.iter().map(|a| (*a).to_owned()).collect()
    }
}

impl<A, S, const N: usize, P> From<[A; N]> for GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(arr: [A; N]) -> Self {
        IntoIterator::into_iter(arr).collect()
    }
}

impl<'a, A, S, P> From<&'a [A]> for GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(slice: &'a [A]) -> Self {
        slice.iter().cloned().collect()
    }
}

impl<A, S, P> From<Vec<A>> for GenericHashSet<A, S, P>
where
    A: Hash + Eq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(vec: Vec<A>) -> Self {
        vec.into_iter().collect()
    }
}

impl<A, S, P> From<GenericHashMap<A, (), S, P>> for GenericHashSet<A, S, P>
where
    P: SharedPointerKind,
{
    fn from(map: GenericHashMap<A, (), S, P>) -> Self {
        GenericHashSet { map }
    }
}
