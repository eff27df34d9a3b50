// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property definitions, storage, and dependency bookkeeping.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

use super::handle::EvalHandle;
use super::id::PropertyId;
use super::store::ItemTree;
use crate::error::EvalError;
use crate::name::{PropertyName, Requirement};
use crate::value::Value;

type DeriveFn = dyn Fn(&mut EvalHandle<'_>) -> Result<Value, EvalError>;

/// How a property obtains its value.
#[derive(Clone)]
pub enum Definition {
    /// A fixed value.
    Constant(Value),
    /// A function of other properties, read through an [`EvalHandle`].
    ///
    /// Returning `Err` is a recoverable outcome: the property's value
    /// becomes [`Value::Pending`].
    Derived(Rc<DeriveFn>),
}

impl Definition {
    /// Wraps a defining function.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&mut EvalHandle<'_>) -> Result<Value, EvalError> + 'static,
    {
        Self::Derived(Rc::new(f))
    }

    /// Returns `true` for [`Definition::Constant`].
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<Value> for Definition {
    fn from(v: Value) -> Self {
        Self::Constant(v)
    }
}

macro_rules! impl_constant_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Definition {
                fn from(v: $t) -> Self {
                    Self::Constant(Value::from(v))
                }
            }
        )*
    };
}

impl_constant_from!(bool, i32, i64, f64, &str, String);

/// One property slot.
#[derive(Debug)]
pub(crate) struct Property {
    pub(crate) owner: u32,
    pub(crate) name: PropertyName,
    pub(crate) value: Value,
    pub(crate) definition: Definition,
    pub(crate) up_to_date: bool,
    /// Requirements read by the last attempt, each bound to the property it
    /// resolved to, or `None` while unresolvable.
    pub(crate) requirements: BTreeMap<Requirement, Option<PropertyId>>,
    pub(crate) dependents: BTreeSet<PropertyId>,
    /// Last value passed to the change hook.
    pub(crate) reported: Value,
}

impl Property {
    pub(crate) fn new(owner: u32, name: PropertyName, definition: Definition) -> Self {
        let (value, up_to_date) = match &definition {
            Definition::Constant(v) => (v.clone(), true),
            Definition::Derived(_) => (Value::Pending, false),
        };
        Self {
            owner,
            name,
            value,
            definition,
            up_to_date,
            requirements: BTreeMap::new(),
            dependents: BTreeSet::new(),
            reported: Value::Pending,
        }
    }

    /// Distinct properties this one is currently bound to.
    pub(crate) fn targets(&self) -> BTreeSet<PropertyId> {
        self.requirements.values().flatten().copied().collect()
    }

    pub(crate) fn has_unresolved(&self) -> bool {
        self.requirements.values().any(Option::is_none)
    }
}

/// Arena of property slots with a free list.
#[derive(Debug, Default)]
pub(crate) struct PropertyArena {
    slots: Vec<Option<Property>>,
    free: Vec<u32>,
}

impl PropertyArena {
    pub(crate) fn insert(&mut self, property: Property) -> PropertyId {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(property);
            PropertyId(idx)
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "property slots are addressed by u32"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Some(property));
            PropertyId(idx)
        }
    }

    pub(crate) fn remove(&mut self, id: PropertyId) -> Property {
        let Some(property) = self.slots[id.0 as usize].take() else {
            panic!("dangling {id:?}");
        };
        self.free.push(id.0);
        property
    }
}

impl Index<PropertyId> for PropertyArena {
    type Output = Property;

    fn index(&self, id: PropertyId) -> &Property {
        match &self.slots[id.0 as usize] {
            Some(p) => p,
            None => panic!("dangling {id:?}"),
        }
    }
}

impl IndexMut<PropertyId> for PropertyArena {
    fn index_mut(&mut self, id: PropertyId) -> &mut Property {
        match &mut self.slots[id.0 as usize] {
            Some(p) => p,
            None => panic!("dangling {id:?}"),
        }
    }
}

/// Result of one evaluation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attempt {
    /// The function returned a value and every bound requirement is up to
    /// date.
    Ready,
    /// The function returned `Err`; the property is up to date as `Pending`.
    Failed,
    /// Some bound requirement is not up to date yet.
    Deferred,
}

// -- Dependency bookkeeping --

impl ItemTree {
    /// Defines or redefines `pid`.
    ///
    /// Detaches it from its current requirements. A constant that changes
    /// the value of an up-to-date property invalidates its dependents; a
    /// function always does.
    pub(crate) fn redefine(&mut self, pid: PropertyId, definition: Definition) {
        self.detach_requirements(pid);
        let prop = &mut self.props[pid];
        let was_up_to_date = prop.up_to_date;
        let notify = match &definition {
            Definition::Constant(v) => {
                let changed = !v.same(&prop.value);
                prop.value = v.clone();
                prop.up_to_date = true;
                was_up_to_date && changed
            }
            Definition::Derived(_) => {
                prop.value = Value::Pending;
                prop.up_to_date = false;
                was_up_to_date
            }
        };
        prop.definition = definition;
        if notify {
            self.notify_invalidation(pid);
        }
    }

    /// Removes `pid` from the dependents of everything it requires and
    /// clears its requirements.
    pub(crate) fn detach_requirements(&mut self, pid: PropertyId) {
        for target in self.props[pid].targets() {
            self.props[target].dependents.remove(&pid);
        }
        self.props[pid].requirements.clear();
        self.unresolved.remove(&pid);
    }

    /// Marks every transitive dependent of `pid` not up to date, stopping at
    /// dependents that already were.
    pub(crate) fn notify_invalidation(&mut self, pid: PropertyId) {
        let mut stack: Vec<PropertyId> = self.props[pid].dependents.iter().copied().collect();
        while let Some(dep) = stack.pop() {
            let prop = &mut self.props[dep];
            if prop.up_to_date {
                prop.up_to_date = false;
                stack.extend(prop.dependents.iter().copied());
            }
        }
    }

    /// Returns `true` if any property `pid` is bound to needs an update.
    pub(crate) fn requirements_stale(&self, pid: PropertyId) -> bool {
        self.props[pid]
            .requirements
            .values()
            .flatten()
            .any(|&target| !self.props[target].up_to_date)
    }

    /// Replaces the bindings of `pid` and moves its dependent edges from the
    /// old target set to the new one.
    fn apply_bindings(
        &mut self,
        pid: PropertyId,
        bindings: BTreeMap<Requirement, Option<PropertyId>>,
    ) {
        let old = self.props[pid].targets();
        let new: BTreeSet<PropertyId> = bindings.values().flatten().copied().collect();
        for &target in old.difference(&new) {
            self.props[target].dependents.remove(&pid);
        }
        for &target in new.difference(&old) {
            self.props[target].dependents.insert(pid);
        }
        let prop = &mut self.props[pid];
        prop.requirements = bindings;
        if prop.has_unresolved() {
            self.unresolved.insert(pid);
        } else {
            self.unresolved.remove(&pid);
        }
    }

    /// Re-resolves every requirement of `pid` against its owner's current
    /// pedigree. If any binding moved, applies the new bindings and marks
    /// `pid` for re-evaluation.
    ///
    /// Returns whether anything moved.
    pub(crate) fn rebind(&mut self, pid: PropertyId) -> bool {
        let prop = &self.props[pid];
        let owner = prop.owner;
        let bindings: BTreeMap<Requirement, Option<PropertyId>> = prop
            .requirements
            .keys()
            .map(|req| (req.clone(), self.resolve_requirement(owner, req)))
            .collect();
        if bindings == prop.requirements {
            return false;
        }
        self.apply_bindings(pid, bindings);
        let prop = &mut self.props[pid];
        let was_up_to_date = prop.up_to_date;
        prop.up_to_date = false;
        if was_up_to_date {
            self.notify_invalidation(pid);
        }
        true
    }

    /// Runs the defining function of `pid` once, recording what it reads.
    ///
    /// Requirements kept from the previous attempt keep their bindings;
    /// new ones are resolved now. The attempt is ready when every bound
    /// requirement is up to date. Unresolved requirements do not block.
    pub(crate) fn try_update(&mut self, pid: PropertyId) -> Attempt {
        let prop = &self.props[pid];
        if prop.up_to_date {
            return Attempt::Ready;
        }
        let owner = prop.owner;
        let (result, observed) = match prop.definition.clone() {
            Definition::Constant(v) => (Ok(v), BTreeSet::new()),
            Definition::Derived(f) => {
                let mut handle = EvalHandle::new(self, owner);
                let result = f(&mut handle);
                (result, handle.into_observed())
            }
        };

        let prop = &self.props[pid];
        let bindings: BTreeMap<Requirement, Option<PropertyId>> = observed
            .into_iter()
            .map(|req| {
                let target = match prop.requirements.get(&req) {
                    Some(&bound) => bound,
                    None => self.resolve_requirement(owner, &req),
                };
                (req, target)
            })
            .collect();
        self.apply_bindings(pid, bindings);

        let ready = !self.requirements_stale(pid);
        let prop = &mut self.props[pid];
        let failed = result.is_err();
        prop.value = match result {
            Ok(v) if ready => v,
            _ => Value::Pending,
        };
        if !ready {
            return Attempt::Deferred;
        }
        prop.up_to_date = true;
        if failed {
            Attempt::Failed
        } else {
            Attempt::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::item::ItemSpec;

    #[test]
    fn constant_is_up_to_date_immediately() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(ItemSpec::root().constant("v1_", 1))
            .unwrap();
        assert_eq!(tree.value(root, "v1_"), Some(&Value::Int(1)));
        assert_eq!(tree.is_up_to_date(root, "v1_"), Some(true));
    }

    #[test]
    fn derived_starts_pending() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(ItemSpec::root().derived("v1_", |_| Ok(Value::Int(1))))
            .unwrap();
        assert_eq!(tree.value(root, "v1_"), Some(&Value::Pending));
        assert_eq!(tree.is_up_to_date(root, "v1_"), Some(false));
    }

    #[test]
    fn redefining_as_derived_invalidates_dependents() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .constant("v1_", 1)
                    .derived("v2_", |d| Ok(d.get("v1_")? + 1))
                    .derived("v3_", |d| Ok(d.get("v2_")? + 1)),
            )
            .unwrap();
        tree.compute(root).unwrap();
        assert_eq!(tree.is_up_to_date(root, "v3_"), Some(true));

        tree.set(root, "v1_", Definition::derived(|_| Ok(Value::Int(5))))
            .unwrap();
        assert_eq!(tree.is_up_to_date(root, "v1_"), Some(false));
        assert_eq!(tree.is_up_to_date(root, "v2_"), Some(false));
        assert_eq!(tree.is_up_to_date(root, "v3_"), Some(false));
        assert_eq!(tree.value(root, "v1_"), Some(&Value::Pending));
    }

    #[test]
    fn same_constant_keeps_dependents_fresh() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .constant("v1_", 1)
                    .derived("v2_", |d| Ok(d.get("v1_")? + 1)),
            )
            .unwrap();
        tree.compute(root).unwrap();

        tree.set(root, "v1_", 1).unwrap();
        assert_eq!(tree.is_up_to_date(root, "v2_"), Some(true));

        tree.set(root, "v1_", 2).unwrap();
        assert_eq!(tree.is_up_to_date(root, "v2_"), Some(false));
    }

    #[test]
    fn evaluation_records_requirements_and_dependents() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .constant("v1_", 1)
                    .constant("v2_", 2)
                    .derived("v3_", |d| Ok(d.get("v1_")? + d.this().get("v2_")?)),
            )
            .unwrap();
        tree.compute(root).unwrap();

        assert_eq!(
            tree.requirements(root, "v3_").unwrap(),
            vec![Requirement::new("self", "v1_"), Requirement::new("self", "v2_")]
        );
        let deps = tree.dependents(root, "v1_").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].0, root);
        assert_eq!(deps[0].1, "v3_");
    }

    #[test]
    fn redefinition_drops_stale_requirements() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .constant("v1_", 1)
                    .constant("v2_", 2)
                    .derived("v3_", |d| Ok(d.get("v1_")? * 10)),
            )
            .unwrap();
        tree.compute(root).unwrap();
        assert_eq!(tree.dependents(root, "v1_").unwrap().len(), 1);

        tree.set(root, "v3_", Definition::derived(|d| d.get("v2_")))
            .unwrap();
        assert!(tree.dependents(root, "v1_").unwrap().is_empty());
        assert!(tree.requirements(root, "v3_").unwrap().is_empty());

        tree.compute(root).unwrap();
        assert_eq!(tree.value(root, "v3_"), Some(&Value::Int(2)));
        assert!(tree.dependents(root, "v1_").unwrap().is_empty());
        assert_eq!(tree.dependents(root, "v2_").unwrap().len(), 1);
    }

    #[test]
    fn failed_function_yields_pending() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .derived("v1_", |_| Err(EvalError::failed("not today")))
                    .derived("v2_", |d| Ok(d.get("v1_")? + 1)),
            )
            .unwrap();
        tree.compute(root).unwrap();
        assert_eq!(tree.value(root, "v1_"), Some(&Value::Pending));
        assert_eq!(tree.is_up_to_date(root, "v1_"), Some(true));
        assert_eq!(tree.value(root, "v2_"), Some(&Value::Pending));
    }

    #[test]
    fn definition_debug_hides_closure() {
        let d = Definition::derived(|_| Ok(Value::Int(1)));
        assert_eq!(alloc::format!("{d:?}"), "Derived(..)");
        assert!(Definition::from(3).is_constant());
    }
}
