// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item kinds: per-kind capabilities attached to every item.
//!
//! A kind decides which property names may skip the trailing
//! [`MARKER`](crate::name::MARKER) and receives a callback whenever one of
//! its item's properties settles on a new value during
//! [`compute`](crate::item::ItemTree::compute). Higher-level layers use this
//! to expose framework properties (`width`, `height`, ...) and to push
//! changes outward.

use core::fmt;

use crate::name::PropertyName;
use crate::value::Value;

/// Capability descriptor for a kind of item.
pub trait ItemKind: fmt::Debug + 'static {
    /// Short name of the kind, used as the prefix of generated display names.
    fn kind_name(&self) -> &'static str;

    /// Property names this kind allows without the trailing marker.
    ///
    /// The set is static for the kind and consulted every time a property
    /// is defined on one of its items.
    fn reserved_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Called synchronously during compute when `name` settles on a value
    /// different from the last one reported.
    fn on_change(&mut self, name: &PropertyName, value: &Value) {
        _ = (name, value);
    }
}

/// The default kind: no reserved names and no change hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainItem;

impl ItemKind for PlainItem {
    fn kind_name(&self) -> &'static str {
        "Item"
    }
}
