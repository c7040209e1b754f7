// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// The level size of HAMTs, in bits
/// Branching factor is 2 ^ HashLevelSize.
#[cfg(feature = "small-chunks")]
pub(crate) const HASH_LEVEL_SIZE: usize = 2;
#[cfg(not(feature = "small-chunks"))]
pub(crate) const HASH_LEVEL_SIZE: usize = 5;

/// The most children an indexed node may hold before it is expanded into
/// an array node.
pub(crate) const MAX_INDEXED_CHILDREN: usize = (1 << HASH_LEVEL_SIZE) / 2;

/// An array node holding this many children or fewer is packed back into
/// an indexed node.
pub(crate) const MIN_ARRAY_CHILDREN: usize = (1 << HASH_LEVEL_SIZE) / 4;
