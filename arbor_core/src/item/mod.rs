// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item tree data model and evaluation.
//!
//! An *item* is a node in an ordered tree. Each item has:
//!
//! - An identity ([`ItemId`]): a generational handle that becomes stale when
//!   the item is destroyed, preventing use-after-free bugs at the API level.
//!   Items may also carry a validated id, used by descendants and siblings
//!   to refer to them by name.
//! - Topology: a parent and an ordered list of children.
//! - **Properties** defined by the caller with [`set`](ItemTree::set) or
//!   [`ItemSpec`]: constants, or [derived](Definition::Derived) functions
//!   that read other properties through an [`EvalHandle`].
//! - A *pedigree*: the snapshot of names visible from the item (`self`,
//!   `parent`, sibling ids, ancestor ids), rebuilt lazily by
//!   [`compute`](ItemTree::compute).
//!
//! Items are stored in struct-of-arrays layout with index-based handles.
//! Properties live in a separate arena; the dependency graph between them is
//! kept as slot indices in both directions (requirements and dependents).
//!
//! # Dirty tracking
//!
//! Tree mutations mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)):
//!
//! - **PEDIGREE**: propagates to all descendants when an item is attached or
//!   detached, since every name they can see may have moved. The other
//!   children of the parent are marked locally.
//! - **TOPOLOGY**: the item that gained or lost a child.
//!
//! Property redefinitions do not use channels: they invalidate dependents
//! directly through the dependency graph.

mod evaluate;
mod handle;
mod id;
mod pedigree;
mod property;
mod store;
mod traverse;

pub use evaluate::{ComputeReport, PropertyChange};
pub use handle::{EvalHandle, Scope};
pub use id::{INVALID, ItemId};
pub use property::Definition;
pub use store::{ItemSpec, ItemTree};
pub use traverse::Children;
