// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item and property identity types.

use core::fmt;

/// Sentinel value indicating "no item" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to an item in an [`ItemTree`](super::ItemTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an item is destroyed and its slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ItemId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({}@gen{})", self.idx, self.generation)
    }
}

/// Slot index of a property in the tree's property arena.
///
/// Property slots are owned by their item and only handed out internally, so
/// no generation is carried: every dependent edge to a property is removed
/// before its slot is freed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PropertyId(pub(crate) u32);

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({})", self.0)
    }
}
