// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validated item ids and property names.
//!
//! User-defined property names carry a trailing [`MARKER`] (`v1_`, `width_`).
//! Item kinds may additionally allow a fixed set of framework names without
//! the marker (see [`ItemKind::reserved_names`](crate::kind::ItemKind::reserved_names)).
//! Item ids are plain identifiers that must not collide with the symbolic
//! scope names [`SELF`] and [`PARENT`] or look like property names.

use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;

use crate::error::NameError;

/// Scope name that always resolves to the evaluating item itself.
pub const SELF: &str = "self";

/// Scope name that resolves to the evaluating item's parent.
pub const PARENT: &str = "parent";

/// Suffix that marks user-defined property names.
pub const MARKER: char = '_';

/// A validated item id.
///
/// Must be a non-empty identifier, must not be [`SELF`] or [`PARENT`], and
/// must neither start nor end with [`MARKER`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemIdent(String);

impl ItemIdent {
    /// Validates `id`.
    pub fn new(id: &str) -> Result<Self, NameError> {
        if id.is_empty() {
            return Err(NameError::Empty);
        }
        if id == SELF || id == PARENT {
            return Err(NameError::ReservedId(id.into()));
        }
        if id.starts_with(MARKER) || id.ends_with(MARKER) {
            return Err(NameError::MarkerAffix(id.into()));
        }
        if !is_identifier(id) {
            return Err(NameError::NotIdentifier(id.into()));
        }
        Ok(Self(id.into()))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ItemIdent {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemIdent({})", self.0)
    }
}

impl fmt::Display for ItemIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated property name.
///
/// Must be non-empty, must not start with [`MARKER`], and must either end
/// with [`MARKER`] or appear in the owning kind's reserved names.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyName(String);

impl PropertyName {
    /// Validates `name` against the marker convention and the given reserved
    /// names.
    pub fn new(name: &str, reserved: &[&str]) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.starts_with(MARKER) {
            return Err(NameError::LeadingMarker(name.into()));
        }
        if !name.ends_with(MARKER) && !reserved.contains(&name) {
            return Err(NameError::MissingMarker(name.into()));
        }
        Ok(Self(name.into()))
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PropertyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyName({})", self.0)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for PropertyName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PropertyName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A recorded cross-reference: the `(scope, property)` pair a property's
/// defining function read during its last evaluation attempt.
///
/// Names are kept verbatim as read, so a requirement may name a scope or
/// property that does not (yet) resolve.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Requirement {
    /// Symbolic scope: [`SELF`], [`PARENT`], or a peer/ancestor id.
    pub scope: String,
    /// Property name within that scope.
    pub property: String,
}

impl Requirement {
    /// Creates a requirement on `scope.property`.
    #[must_use]
    pub fn new(scope: &str, property: &str) -> Self {
        Self {
            scope: scope.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.property)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
