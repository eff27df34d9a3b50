// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recording handle passed to defining functions.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;

use super::id::ItemId;
use super::store::ItemTree;
use crate::error::EvalError;
use crate::name::{PARENT, Requirement, SELF};
use crate::value::Value;

/// Read access to the properties visible from one item during a single
/// evaluation attempt.
///
/// Every read made through the handle is recorded as a [`Requirement`] of
/// the property being evaluated, including reads whose scope or property
/// does not resolve. The recorded set replaces the property's requirements
/// once the attempt finishes, whatever the function returned.
///
/// ```rust
/// use arbor_core::item::{ItemSpec, ItemTree};
/// use arbor_core::value::Value;
///
/// let mut tree = ItemTree::new();
/// let root = tree
///     .create_item(
///         ItemSpec::root()
///             .id("top")
///             .constant("w_", 4)
///             .derived("area_", |d| Ok(d.get("w_")? * d.scope("top").get("w_")?)),
///     )
///     .unwrap();
/// tree.compute(root).unwrap();
/// assert_eq!(tree.value(root, "area_"), Some(&Value::Int(16)));
/// ```
#[derive(Debug)]
pub struct EvalHandle<'a> {
    tree: &'a ItemTree,
    owner: u32,
    observed: BTreeSet<Requirement>,
    scopes: BTreeMap<String, Option<u32>>,
}

impl<'a> EvalHandle<'a> {
    pub(crate) fn new(tree: &'a ItemTree, owner: u32) -> Self {
        Self {
            tree,
            owner,
            observed: BTreeSet::new(),
            scopes: BTreeMap::new(),
        }
    }

    /// The item whose property is being evaluated.
    #[must_use]
    pub fn owner(&self) -> ItemId {
        self.tree.item_id(self.owner)
    }

    /// Reads `property` on the evaluating item itself.
    pub fn get(&mut self, property: &str) -> Result<Value, EvalError> {
        self.scope(SELF).get(property)
    }

    /// Returns an accessor for the item named `name`.
    ///
    /// Resolution is cached for the lifetime of the handle.
    pub fn scope(&mut self, name: &str) -> Scope<'_, 'a> {
        let target = match self.scopes.get(name) {
            Some(&target) => target,
            None => {
                let target = self.tree.resolve_scope(self.owner, name);
                self.scopes.insert(name.into(), target);
                target
            }
        };
        Scope {
            handle: self,
            name: name.into(),
            target,
        }
    }

    /// Shorthand for `scope("self")`.
    pub fn this(&mut self) -> Scope<'_, 'a> {
        self.scope(SELF)
    }

    /// Shorthand for `scope("parent")`.
    pub fn parent(&mut self) -> Scope<'_, 'a> {
        self.scope(PARENT)
    }

    pub(crate) fn into_observed(self) -> BTreeSet<Requirement> {
        self.observed
    }
}

/// Accessor for one named scope, created by [`EvalHandle::scope`].
#[derive(Debug)]
pub struct Scope<'h, 'a> {
    handle: &'h mut EvalHandle<'a>,
    name: String,
    target: Option<u32>,
}

impl Scope<'_, '_> {
    /// Returns `true` if the scope name resolved to an item.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.target.is_some()
    }

    /// Records `(scope, property)` and returns the property's current value,
    /// which may be [`Value::Pending`].
    pub fn get(&mut self, property: &str) -> Result<Value, EvalError> {
        self.handle
            .observed
            .insert(Requirement::new(&self.name, property));
        let Some(target) = self.target else {
            return Err(EvalError::UnresolvedScope(self.name.clone()));
        };
        let tree = self.handle.tree;
        match tree.lookup[target as usize].get(property) {
            Some(&pid) => Ok(tree.props[pid].value.clone()),
            None => Err(EvalError::UnknownProperty {
                scope: self.name.clone(),
                property: property.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::item::ItemSpec;

    #[test]
    fn unresolved_reads_are_recorded() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(ItemSpec::root().derived("v1_", |d| {
                let missing = d.scope("ghost").get("v1_");
                assert_eq!(missing, Err(EvalError::UnresolvedScope("ghost".into())));
                d.get("nope_")
            }))
            .unwrap();
        tree.compute(root).unwrap();
        assert_eq!(tree.value(root, "v1_"), Some(&Value::Pending));
        assert_eq!(
            tree.requirements(root, "v1_").unwrap(),
            vec![
                Requirement::new("ghost", "v1_"),
                Requirement::new("self", "nope_"),
            ]
        );
    }

    #[test]
    fn unknown_property_reports_scope() {
        let mut tree = ItemTree::new();
        let root = tree.create_item(ItemSpec::root().constant("a_", 1)).unwrap();
        let handle_result = {
            let mut handle = EvalHandle::new(&tree, root.idx);
            assert!(!handle.parent().exists(), "a root has no parent");
            handle.this().get("b_")
        };
        assert_eq!(
            handle_result,
            Err(EvalError::UnknownProperty {
                scope: "self".into(),
                property: "b_".into(),
            })
        );
    }

    #[test]
    fn owner_is_the_evaluating_item() {
        let mut tree = ItemTree::new();
        let root = tree.create_item(ItemSpec::root()).unwrap();
        let handle = EvalHandle::new(&tree, root.idx);
        assert_eq!(handle.owner(), root);
    }
}
