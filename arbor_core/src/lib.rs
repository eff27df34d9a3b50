// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental reactive evaluation over a tree of named properties.
//!
//! `arbor_core` maintains a tree of *items*, each holding named properties
//! that are either constants or functions of other properties anywhere in
//! scope (the item itself, its siblings, its parent, or any ancestor by id).
//! It is `no_std` compatible (with `alloc`) and stores items in an arena
//! addressed by generational handles.
//!
//! # Architecture
//!
//! Mutations only mark state stale. Nothing is recomputed until
//! [`ItemTree::compute`](item::ItemTree::compute) is called on some item:
//!
//! ```text
//!   add_child / remove_child / set
//!       │ (marks PEDIGREE / TOPOLOGY, invalidates dependents)
//!       ▼
//!   ItemTree::compute(item)
//!       ├─ 1. pedigree refresh      (top-down, stale children only)
//!       ├─ 2. dependency rebinding  (items whose pedigree changed)
//!       ├─ 3. own properties        (dirty queue)
//!       └─ 4. children properties   (one batch per level, then recurse)
//!       │
//!       ▼
//!   ComputeReport ──► ItemKind::on_change hooks fired along the way
//! ```
//!
//! **[`item`]**: The item arena, properties, pedigrees (scope resolution),
//! evaluation handles, and the evaluation engine.
//!
//! **[`value`]**: The dynamic [`Value`](value::Value) type and its absorbing
//! `Pending` sentinel.
//!
//! **[`name`]**: Validated item ids and property names.
//!
//! **[`kind`]**: The [`ItemKind`](kind::ItemKind) capability descriptor:
//! reserved property names and change hooks per kind of item.
//!
//! **[`dirty`]**: Dirty-tracking channels (via `understory_dirty`) for
//! pedigree staleness and topology changes.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! compute instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```rust
//! use arbor_core::item::{Definition, ItemSpec, ItemTree};
//! use arbor_core::value::Value;
//!
//! let mut tree = ItemTree::new();
//! let child = tree
//!     .create_item(
//!         ItemSpec::new()
//!             .id("c1")
//!             .derived("v1_", |d| Ok(d.parent().get("v2_")? * 2)),
//!     )
//!     .unwrap();
//! let root = tree
//!     .create_item(
//!         ItemSpec::root()
//!             .constant("v1_", 1)
//!             .derived("v2_", |d| Ok(d.get("v1_")? + 2))
//!             .child(child),
//!     )
//!     .unwrap();
//!
//! tree.compute(root).unwrap();
//! assert_eq!(tree.value(child, "v1_"), Some(&Value::Int(6)));
//!
//! tree.set(root, "v1_", Definition::from(3)).unwrap();
//! tree.compute(root).unwrap();
//! assert_eq!(tree.value(root, "v2_"), Some(&Value::Int(5)));
//! assert_eq!(tree.value(child, "v1_"), Some(&Value::Int(10)));
//! ```
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod dirty;
pub mod error;
pub mod item;
pub mod kind;
pub mod name;
pub mod trace;
pub mod value;
