// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! About shared pointers. Re-export the [`archery`] crate.
//!
//! Every trie node is held behind a [`SharedPointer`], so two map handles
//! can share any subtree neither of them has changed. The pointer kind is a
//! type parameter of [`GenericHashMap`][crate::GenericHashMap] and
//! [`GenericHashSet`][crate::GenericHashSet]: use [`RcK`] for maps that
//! never leave their thread, and [`ArcK`] (the default) otherwise.
//!
//! [`archery`]: https://docs.rs/archery/latest/

pub use archery::{ArcK, RcK, SharedPointer, SharedPointerKind};

#[cfg(feature = "triomphe")]
pub use archery::ArcTK;

#[cfg(not(feature = "triomphe"))]
/// Default shared pointer used by [`HashMap`] and [`HashSet`]. This alias points to [`ArcK`] if `triomphe` is disabled, [`ArcTK`] otherwise.
///
/// [`HashMap`]: crate::HashMap
/// [`HashSet`]: crate::HashSet
/// [`ArcK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcK.html
/// [`ArcTK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcTK.html
pub type DefaultSharedPtr = ArcK;

#[cfg(feature = "triomphe")]
/// Default shared pointer used by [`HashMap`] and [`HashSet`]. This alias points to [`ArcK`] if `triomphe` is disabled, [`ArcTK`] otherwise.
///
/// [`HashMap`]: crate::HashMap
/// [`HashSet`]: crate::HashSet
/// [`ArcK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcK.html
/// [`ArcTK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcTK.html
pub type DefaultSharedPtr = ArcTK;
