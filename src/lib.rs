// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Persistent hash maps and sets
//!
//! This crate provides [`HashMap`][hashmap::HashMap] and
//! [`HashSet`][hashset::HashSet], built on [hash array mapped tries][hamt].
//! They are *persistent*: updating one never changes it for anyone else
//! holding a copy, and copies share every part of the structure neither
//! of them has changed. Cloning is O(1), and an update only copies the
//! nodes on the path to the entry it touches.
//!
//! ## Transient updates
//!
//! Building a big map one persistent update at a time copies a path for
//! every update. When you have a batch of changes to make, open a mutation
//! scope instead:
//!
//! ```
//! # #[macro_use] extern crate hashtrie;
//! # use hashtrie::HashMap;
//! let base = hashmap!{"one" => 1};
//! let bigger = base.mutate(|map| {
//!     map.insert("two", 2);
//!     map.insert("three", 3);
//!     map.remove("one");
//! });
//! assert_eq!(1, base.len());
//! assert_eq!(hashmap!{"two" => 2, "three" => 3}, bigger);
//! ```
//!
//! Inside the scope, nodes created by the scope are changed in place, so
//! each node is copied at most once. Nothing outside the scope can see
//! those nodes until the scope ends, after which they are never changed
//! again.
//!
//! ## Trie layout
//!
//! Keys are hashed to 32 bits, and the hash is consumed five bits at a
//! time, one fragment per level of the trie. A level is stored as a
//! compact *indexed* node (a bitmap plus only the occupied slots) while it
//! is sparse, and as a full 32 slot *array* node once more than half of
//! its slots are in use. Keys whose full hashes are equal share a
//! *collision* node.
//!
//! ## Shared pointers
//!
//! The pointer kind used for trie nodes is a type parameter; see the
//! [`shared_ptr`] module. [`HashMap`] and [`HashSet`] use the
//! [`DefaultSharedPtr`][shared_ptr::DefaultSharedPtr], which is thread
//! safe.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! | ------- | ----------- |
//! | [`proptest`](https://crates.io/crates/proptest) | Strategies for all these data structures for the [`proptest`](https://crates.io/crates/proptest) crate |
//! | [`quickcheck`](https://crates.io/crates/quickcheck) | [`quickcheck::Arbitrary`](https://docs.rs/quickcheck/latest/quickcheck/trait.Arbitrary.html) implementations for all these data structures |
//! | [`arbitrary`](https://crates.io/crates/arbitrary/) | [`arbitrary::Arbitrary`](https://docs.rs/arbitrary/latest/arbitrary/trait.Arbitrary.html) implementations for all these data structures |
//! | [`serde`](https://crates.io/crates/serde) | [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) implementations for all these data structures |
//! | `small-chunks` | Use a branching factor of 4 instead of 32, to make deep tries easy to test |
//! | `triomphe` | Use [`triomphe::Arc`](https://docs.rs/triomphe) as the default shared pointer |
//! | `debug` | Expose `assert_invariants` on maps and sets |
//!
//! [hamt]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie

#![forbid(rust_2018_idioms)]
#![deny(unsafe_code, nonstandard_style)]
#![warn(unreachable_pub, missing_docs)]

#[macro_use]
mod util;

mod config;
mod nodes;

#[macro_use]
mod hash;

pub use crate::hash::map as hashmap;
pub use crate::hash::set as hashset;

pub mod shared_ptr;

pub use crate::hashmap::{GenericHashMap, HashMap};
pub use crate::hashset::{GenericHashSet, HashSet};

#[cfg(feature = "arbitrary")]
#[doc(hidden)]
pub mod arbitrary;

#[cfg(any(test, feature = "serde"))]
#[doc(hidden)]
pub mod ser;

#[cfg(feature = "quickcheck")]
#[doc(hidden)]
pub mod quickcheck;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest;

#[cfg(test)]
mod test;
