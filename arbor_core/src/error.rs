// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Failures fall into three groups:
//!
//! - **Contract violations** ([`NameError`], [`TreeError`]) are reported by
//!   the call that introduced them and are never retried.
//! - **Evaluation failures** ([`EvalError`]) are returned by a property's
//!   defining function. They are recoverable: the property's value becomes
//!   [`Value::Pending`](crate::value::Value::Pending) and the engine moves on.
//! - **Circular dependencies** ([`CircularDependency`]) abort the
//!   [`compute`](crate::item::ItemTree::compute) call that detected them.
//!
//! Stale handles and broken bookkeeping invariants are bugs, not errors, and
//! panic.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::item::ItemId;

/// An invalid item id or property name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty.
    Empty,
    /// The id is one of the symbolic scope names `self` or `parent`.
    ReservedId(String),
    /// The id starts or ends with the property marker.
    MarkerAffix(String),
    /// The id is not a valid identifier.
    NotIdentifier(String),
    /// The property name starts with the marker.
    LeadingMarker(String),
    /// The property name lacks the trailing marker and is not reserved by
    /// the item's kind.
    MissingMarker(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("name is empty"),
            Self::ReservedId(id) => write!(f, "id `{id}` is a reserved scope name"),
            Self::MarkerAffix(id) => {
                write!(f, "id `{id}` cannot start or end with the property marker")
            }
            Self::NotIdentifier(id) => write!(f, "id `{id}` is not a valid identifier"),
            Self::LeadingMarker(name) => {
                write!(f, "property `{name}` cannot start with the property marker")
            }
            Self::MissingMarker(name) => write!(
                f,
                "property `{name}` must end with the property marker or be reserved by its kind"
            ),
        }
    }
}

impl core::error::Error for NameError {}

/// A rejected tree mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// An id or property name failed validation.
    Name(NameError),
    /// The child is already attached to a parent.
    AlreadyAttached {
        /// The item that was to be attached.
        child: ItemId,
        /// Its current parent.
        parent: ItemId,
    },
    /// The item is not a child of the given parent.
    NotAChild {
        /// The parent that was searched.
        parent: ItemId,
        /// The item that was not found among its children.
        child: ItemId,
    },
    /// Attaching would make an item its own ancestor.
    WouldCycle {
        /// The would-be parent.
        parent: ItemId,
        /// The would-be child (an ancestor of, or equal to, `parent`).
        child: ItemId,
    },
    /// The item's peer id has already been adopted.
    AlreadyAdopted(ItemId),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(e) => fmt::Display::fmt(e, f),
            Self::AlreadyAttached { child, parent } => {
                write!(f, "{child:?} is already a child of {parent:?}")
            }
            Self::NotAChild { parent, child } => {
                write!(f, "{child:?} is not a child of {parent:?}")
            }
            Self::WouldCycle { parent, child } => {
                write!(f, "attaching {child:?} under {parent:?} would create a cycle")
            }
            Self::AlreadyAdopted(id) => write!(f, "{id:?} has already been adopted"),
        }
    }
}

impl core::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Name(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NameError> for TreeError {
    fn from(e: NameError) -> Self {
        Self::Name(e)
    }
}

/// A failed evaluation attempt.
///
/// Returned by property reads through an
/// [`EvalHandle`](crate::item::EvalHandle) and by defining functions. The
/// engine turns any `EvalError` into a `Pending` value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    /// No item named by the scope is visible from the evaluating item.
    UnresolvedScope(String),
    /// The scope resolved, but the item has no such property.
    UnknownProperty {
        /// The scope that resolved.
        scope: String,
        /// The missing property.
        property: String,
    },
    /// The defining function gave up.
    Failed(String),
}

impl EvalError {
    /// Creates an [`EvalError::Failed`] with the given message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedScope(scope) => write!(f, "scope `{scope}` does not resolve"),
            Self::UnknownProperty { scope, property } => {
                write!(f, "`{scope}` has no property `{property}`")
            }
            Self::Failed(message) => write!(f, "evaluation failed: {message}"),
        }
    }
}

impl core::error::Error for EvalError {}

/// One property that could make no progress when a cycle was detected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StuckProperty {
    /// The owning item.
    pub item: ItemId,
    /// The owning item's display name.
    pub display_name: String,
    /// The property name.
    pub property: String,
}

/// A dependency cycle detected by [`compute`](crate::item::ItemTree::compute).
///
/// Lists every queued property that was still blocked when a full round of
/// the work queue made no progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircularDependency {
    /// The stuck properties, in queue order.
    pub stuck: Vec<StuckProperty>,
}

impl CircularDependency {
    /// Returns `true` if `property` on `item` is among the stuck properties.
    #[must_use]
    pub fn involves(&self, item: ItemId, property: &str) -> bool {
        self.stuck
            .iter()
            .any(|s| s.item == item && s.property == property)
    }
}

impl fmt::Display for CircularDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dependency circle detected among")?;
        for (i, s) in self.stuck.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}.{}", s.display_name, s.property)?;
        }
        Ok(())
    }
}

impl core::error::Error for CircularDependency {}
