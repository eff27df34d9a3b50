// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Arbor uses [`understory_dirty`] to track which items need structural work
//! before the next [`compute`](crate::item::ItemTree::compute). Keys are item
//! slot indices.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`PEDIGREE`] has dependency edges from child to
//!   parent. Attaching or detaching an item marks it with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy), so its whole subtree is
//!   marked: every descendant's ancestor chain changed. The remaining
//!   children of the parent are marked locally, since only their peer set
//!   changed.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on the parent for every child
//!   list mutation. It surfaces as
//!   [`ComputeReport::topology_changed`](crate::item::ComputeReport::topology_changed)
//!   and does not propagate.
//!
//! # Consumption
//!
//! `compute(item)` drains both channels, keeps the marks that fall inside
//! `item`'s subtree, and re-marks the rest so that a later compute on an
//! enclosing item still sees them.

use understory_dirty::Channel;

/// Pedigree is stale. Rebuild scope resolution on the next compute that
/// walks through this item.
pub const PEDIGREE: Channel = Channel::new(0);

/// The item's child list changed.
pub const TOPOLOGY: Channel = Channel::new(1);
