// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays item storage with allocation, topology, and property
//! management.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::handle::EvalHandle;
use super::id::{INVALID, ItemId, PropertyId};
use super::pedigree::Pedigree;
use super::property::{Definition, Property, PropertyArena};
use super::traverse::Children;
use crate::config::TreeConfig;
use crate::dirty;
use crate::error::{EvalError, TreeError};
use crate::kind::{ItemKind, PlainItem};
use crate::name::{ItemIdent, PropertyName, Requirement};
use crate::value::Value;

/// Everything needed to create one item.
///
/// ```rust
/// use arbor_core::item::{ItemSpec, ItemTree};
///
/// let mut tree = ItemTree::new();
/// let leaf = tree.create_item(ItemSpec::new().id("leaf")).unwrap();
/// let root = tree
///     .create_item(ItemSpec::root().constant("v1_", 1).child(leaf))
///     .unwrap();
/// assert_eq!(tree.parent(leaf), Some(root));
/// ```
#[derive(Debug, Default)]
pub struct ItemSpec {
    id: Option<String>,
    root: bool,
    kind: Option<Box<dyn ItemKind>>,
    properties: Vec<(String, Definition)>,
    children: Vec<ItemId>,
}

impl ItemSpec {
    /// A non-root item with no id, the [`PlainItem`] kind, and nothing else.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A root item. Roots own a fresh pedigree from the start.
    #[must_use]
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }

    /// Sets the item id.
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the item kind.
    #[must_use]
    pub fn kind(mut self, kind: impl ItemKind) -> Self {
        self.kind = Some(Box::new(kind));
        self
    }

    /// Adds a property with the given definition.
    #[must_use]
    pub fn property(mut self, name: &str, definition: impl Into<Definition>) -> Self {
        self.properties.push((name.into(), definition.into()));
        self
    }

    /// Adds a constant property.
    #[must_use]
    pub fn constant(self, name: &str, value: impl Into<Value>) -> Self {
        self.property(name, Definition::Constant(value.into()))
    }

    /// Adds a derived property.
    #[must_use]
    pub fn derived<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&mut EvalHandle<'_>) -> Result<Value, EvalError> + 'static,
    {
        self.property(name, Definition::derived(f))
    }

    /// Appends an initial child. The child must be detached.
    #[must_use]
    pub fn child(mut self, child: ItemId) -> Self {
        self.children.push(child);
        self
    }
}

/// Struct-of-arrays storage for a tree of items and their properties.
///
/// Items are addressed by [`ItemId`] handles. Internally, each item occupies
/// a slot in parallel arrays. Destroyed items are recycled via a free list,
/// and generation counters prevent stale handle access. Properties live in a
/// second arena; dependency edges between them are slot indices, never
/// owning pointers.
#[derive(Debug)]
pub struct ItemTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Identity --
    pub(crate) ident: Vec<Option<ItemIdent>>,
    pub(crate) adopted: Vec<Option<ItemIdent>>,
    pub(crate) display: Vec<String>,
    pub(crate) root: Vec<bool>,
    pub(crate) kind: Vec<Box<dyn ItemKind>>,

    // -- Properties --
    pub(crate) lookup: Vec<HashMap<PropertyName, PropertyId>>,
    pub(crate) order: Vec<Vec<PropertyId>>,
    pub(crate) props: PropertyArena,
    /// Properties holding at least one unresolved requirement.
    pub(crate) unresolved: BTreeSet<PropertyId>,

    // -- Scope resolution --
    pub(crate) pedigree: Vec<Pedigree>,
    pub(crate) pedigree_version: Vec<u32>,
    pub(crate) applied_version: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    pub(crate) config: TreeConfig,
    pub(crate) compute_index: u64,
}

impl Default for ItemTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemTree {
    /// Creates an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::new())
    }

    /// Creates an empty tree with the given configuration.
    #[must_use]
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            parent: Vec::new(),
            children: Vec::new(),
            ident: Vec::new(),
            adopted: Vec::new(),
            display: Vec::new(),
            root: Vec::new(),
            kind: Vec::new(),
            lookup: Vec::new(),
            order: Vec::new(),
            props: PropertyArena::default(),
            unresolved: BTreeSet::new(),
            pedigree: Vec::new(),
            pedigree_version: Vec::new(),
            applied_version: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            config,
            compute_index: 0,
        }
    }

    /// Returns the tree's configuration.
    #[must_use]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    // -- Allocation API --

    /// Creates an item from `spec` and returns its handle.
    ///
    /// Validates the id and every property name against the kind's reserved
    /// names, and checks that every listed child is detached, before
    /// anything is allocated. Non-root items start with a stale pedigree.
    ///
    /// # Panics
    ///
    /// Panics if a child handle is stale or a child is listed twice.
    pub fn create_item(&mut self, spec: ItemSpec) -> Result<ItemId, TreeError> {
        let ItemSpec {
            id,
            root,
            kind,
            properties,
            children,
        } = spec;
        let ident = id.as_deref().map(ItemIdent::new).transpose()?;
        let kind = kind.unwrap_or_else(|| Box::new(PlainItem));
        let reserved = kind.reserved_names();
        let mut named = Vec::with_capacity(properties.len());
        for (name, definition) in properties {
            named.push((PropertyName::new(&name, reserved)?, definition));
        }
        for (i, &child) in children.iter().enumerate() {
            self.validate(child);
            assert!(
                !children[..i].contains(&child),
                "child {child:?} listed twice"
            );
            if let Some(parent) = self.parent(child) {
                return Err(TreeError::AlreadyAttached { child, parent });
            }
        }

        let idx = self.allocate(ident, root, kind);
        for (name, definition) in named {
            self.insert_property(idx, name, definition);
        }
        let id = self.item_id(idx);
        for child in children {
            self.add_child(id, child)?;
        }
        Ok(id)
    }

    fn allocate(&mut self, ident: Option<ItemIdent>, root: bool, kind: Box<dyn ItemKind>) -> u32 {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.adopted[i] = None;
            self.root[i] = root;
            self.lookup[i].clear();
            self.order[i].clear();
            self.pedigree_version[i] = 0;
            self.applied_version[i] = 0;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.ident.push(None);
            self.adopted.push(None);
            self.display.push(String::new());
            self.root.push(root);
            self.kind.push(Box::new(PlainItem));
            self.lookup.push(HashMap::new());
            self.order.push(Vec::new());
            self.pedigree.push(Pedigree::detached(
                ItemId {
                    idx,
                    generation: 0,
                },
                None,
            ));
            self.pedigree_version.push(0);
            self.applied_version.push(0);
            self.generation.push(0);
            idx
        };

        let i = idx as usize;
        self.display[i] = match &ident {
            Some(ident) => ident.as_str().into(),
            None => format!("{}_{idx}", kind.kind_name()),
        };
        self.pedigree[i] = Pedigree::detached(self.item_id(idx), ident.clone());
        self.ident[i] = ident;
        self.kind[i] = kind;
        if !root {
            self.dirty.mark(idx, dirty::PEDIGREE);
        }
        idx
    }

    /// Destroys a detached, childless item, freeing its slot for reuse.
    ///
    /// Every property that required one of the item's properties loses that
    /// binding and is invalidated; it re-resolves on the next compute that
    /// covers it.
    ///
    /// # Panics
    ///
    /// Panics if the item is attached, has children, or the handle is stale.
    pub fn destroy_item(&mut self, id: ItemId) {
        self.validate(id);
        let i = id.idx as usize;
        assert!(
            self.parent[i] == INVALID,
            "cannot destroy an attached item"
        );
        assert!(
            self.children[i].is_empty(),
            "cannot destroy item with children"
        );

        let owned = core::mem::take(&mut self.order[i]);
        for &pid in &owned {
            self.detach_requirements(pid);
        }
        for &pid in &owned {
            let dependents: Vec<PropertyId> = self.props[pid].dependents.iter().copied().collect();
            for dep in dependents {
                if self.props[dep].owner == id.idx {
                    continue;
                }
                for binding in self.props[dep].requirements.values_mut() {
                    if *binding == Some(pid) {
                        *binding = None;
                    }
                }
                self.unresolved.insert(dep);
                let prop = &mut self.props[dep];
                if prop.up_to_date {
                    prop.up_to_date = false;
                    self.notify_invalidation(dep);
                }
            }
        }
        for pid in owned {
            self.props.remove(pid);
        }
        self.lookup[i].clear();

        self.dirty.remove_key(id.idx);
        self.generation[i] += 1;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live item.
    #[must_use]
    pub fn is_alive(&self, id: ItemId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks `child`'s whole subtree and the existing children of `parent`
    /// pedigree-stale.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: ItemId, child: ItemId) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        if let Some(current) = self.parent(child) {
            return Err(TreeError::AlreadyAttached {
                child,
                parent: current,
            });
        }
        if self.is_within(p, c) {
            return Err(TreeError::WouldCycle { parent, child });
        }

        for &sibling in &self.children[p as usize] {
            self.dirty.mark(sibling, dirty::PEDIGREE);
        }
        self.children[p as usize].push(c);
        self.parent[c as usize] = p;

        let _ = self.dirty.add_dependency(c, p, dirty::PEDIGREE);
        self.dirty.mark_with(c, dirty::PEDIGREE, &EagerPolicy);
        self.dirty.mark(p, dirty::TOPOLOGY);
        Ok(())
    }

    /// Adds each item in `children` to `parent`, in order.
    ///
    /// Stops at the first failure; earlier children stay attached.
    pub fn add_children(
        &mut self,
        parent: ItemId,
        children: impl IntoIterator<Item = ItemId>,
    ) -> Result<(), TreeError> {
        for child in children {
            self.add_child(parent, child)?;
        }
        Ok(())
    }

    /// Attaches `item` under `parent`. Same as `add_child(parent, item)`.
    pub fn attach_to(&mut self, item: ItemId, parent: ItemId) -> Result<(), TreeError> {
        self.add_child(parent, item)
    }

    /// Detaches `child` from `parent`.
    ///
    /// The detached item keeps its properties and children but only knows
    /// itself until it is attached again. The remaining children of
    /// `parent` are marked pedigree-stale.
    pub fn remove_child(&mut self, parent: ItemId, child: ItemId) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        let Some(pos) = self.children[p as usize].iter().position(|&x| x == c) else {
            return Err(TreeError::NotAChild { parent, child });
        };

        self.children[p as usize].remove(pos);
        self.parent[c as usize] = INVALID;
        for &sibling in &self.children[p as usize] {
            self.dirty.mark(sibling, dirty::PEDIGREE);
        }

        self.dirty.remove_dependency(c, p, dirty::PEDIGREE);
        let pedigree = Pedigree::detached(child, self.peer_ident(c).cloned());
        self.pedigree[c as usize] = pedigree;
        self.pedigree_version[c as usize] = self.pedigree_version[c as usize].wrapping_add(1);
        self.dirty.mark_with(c, dirty::PEDIGREE, &EagerPolicy);
        self.dirty.mark(p, dirty::TOPOLOGY);
        Ok(())
    }

    /// Returns the parent of an item, if any.
    #[must_use]
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.item_id(p))
    }

    /// Returns an iterator over the direct children of an item.
    #[must_use]
    pub fn children(&self, id: ItemId) -> Children<'_> {
        self.validate(id);
        Children::new(self, &self.children[id.idx as usize])
    }

    // -- Identity API --

    /// Returns the item's own id, if it has one.
    #[must_use]
    pub fn id(&self, id: ItemId) -> Option<&ItemIdent> {
        self.validate(id);
        self.ident[id.idx as usize].as_ref()
    }

    /// Returns the item's id, or a generated `<kind>_<slot>` name.
    #[must_use]
    pub fn display_name(&self, id: ItemId) -> &str {
        self.validate(id);
        &self.display[id.idx as usize]
    }

    /// Returns the name siblings use to find this item: the adopted id if
    /// set, else the item's own id.
    #[must_use]
    pub fn peer_id(&self, id: ItemId) -> Option<&ItemIdent> {
        self.validate(id);
        self.peer_ident(id.idx)
    }

    /// Overrides the item's peer id. Allowed once per item.
    ///
    /// Siblings see the new name after their next pedigree rebuild.
    pub fn adopt(&mut self, id: ItemId, peer_id: &str) -> Result<(), TreeError> {
        self.validate(id);
        let i = id.idx as usize;
        if self.adopted[i].is_some() {
            return Err(TreeError::AlreadyAdopted(id));
        }
        let peer = ItemIdent::new(peer_id)?;
        self.pedigree[i].set_this_peer(Some(peer.clone()));
        self.pedigree_version[i] = self.pedigree_version[i].wrapping_add(1);
        self.adopted[i] = Some(peer);

        let p = self.parent[i];
        if p != INVALID {
            for &sibling in &self.children[p as usize] {
                if sibling != id.idx {
                    self.dirty.mark(sibling, dirty::PEDIGREE);
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if the item was created as a root.
    #[must_use]
    pub fn is_root(&self, id: ItemId) -> bool {
        self.validate(id);
        self.root[id.idx as usize]
    }

    /// Returns the item's kind.
    #[must_use]
    pub fn kind(&self, id: ItemId) -> &dyn ItemKind {
        self.validate(id);
        self.kind[id.idx as usize].as_ref()
    }

    // -- Property API --

    /// Defines or redefines a property on `item`.
    ///
    /// A new property joins the item immediately. Redefining a property
    /// detaches it from its old requirements and invalidates its dependents
    /// as needed; nothing is recomputed until the next
    /// [`compute`](Self::compute).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set(
        &mut self,
        item: ItemId,
        name: &str,
        definition: impl Into<Definition>,
    ) -> Result<(), TreeError> {
        self.validate(item);
        let i = item.idx as usize;
        let name = PropertyName::new(name, self.kind[i].reserved_names())?;
        self.insert_property(item.idx, name, definition.into());
        Ok(())
    }

    fn insert_property(&mut self, idx: u32, name: PropertyName, definition: Definition) {
        if let Some(pid) = self.lookup[idx as usize].get(&name).copied() {
            self.redefine(pid, definition);
            return;
        }
        let pid = self
            .props
            .insert(Property::new(idx, name.clone(), definition));
        self.lookup[idx as usize].insert(name, pid);
        self.order[idx as usize].push(pid);
    }

    /// Returns the current value of a property, or `None` if the item has
    /// no property by that name.
    #[must_use]
    pub fn value(&self, item: ItemId, name: &str) -> Option<&Value> {
        self.property(item, name).map(|pid| &self.props[pid].value)
    }

    /// Returns whether a property is up to date.
    #[must_use]
    pub fn is_up_to_date(&self, item: ItemId, name: &str) -> Option<bool> {
        self.property(item, name).map(|pid| self.props[pid].up_to_date)
    }

    /// Returns the requirements a property read during its last evaluation
    /// attempt, in sorted order.
    #[must_use]
    pub fn requirements(&self, item: ItemId, name: &str) -> Option<Vec<Requirement>> {
        self.property(item, name)
            .map(|pid| self.props[pid].requirements.keys().cloned().collect())
    }

    /// Returns the properties that currently depend on a property.
    #[must_use]
    pub fn dependents(&self, item: ItemId, name: &str) -> Option<Vec<(ItemId, PropertyName)>> {
        self.property(item, name).map(|pid| {
            self.props[pid]
                .dependents
                .iter()
                .map(|&dep| {
                    let d = &self.props[dep];
                    (self.item_id(d.owner), d.name.clone())
                })
                .collect()
        })
    }

    /// Returns the names of an item's properties in definition order.
    pub fn property_names(&self, item: ItemId) -> impl Iterator<Item = &PropertyName> + '_ {
        self.validate(item);
        self.order[item.idx as usize]
            .iter()
            .map(|&pid| &self.props[pid].name)
    }

    // -- Internal helpers --

    fn property(&self, item: ItemId, name: &str) -> Option<PropertyId> {
        self.validate(item);
        self.lookup[item.idx as usize].get(name).copied()
    }

    pub(crate) fn item_id(&self, idx: u32) -> ItemId {
        ItemId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn peer_ident(&self, idx: u32) -> Option<&ItemIdent> {
        self.adopted[idx as usize]
            .as_ref()
            .or(self.ident[idx as usize].as_ref())
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ItemId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ItemId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::error::NameError;

    #[test]
    fn create_and_destroy() {
        let mut tree = ItemTree::new();
        let id = tree.create_item(ItemSpec::new()).unwrap();
        assert!(tree.is_alive(id));
        tree.destroy_item(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = ItemTree::new();
        let id1 = tree.create_item(ItemSpec::new()).unwrap();
        tree.destroy_item(id1);
        let id2 = tree.create_item(ItemSpec::new()).unwrap();
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn default_display_name_uses_kind() {
        let mut tree = ItemTree::new();
        let anon = tree.create_item(ItemSpec::new()).unwrap();
        let named = tree.create_item(ItemSpec::new().id("name")).unwrap();
        assert_eq!(tree.id(anon), None);
        assert_eq!(tree.display_name(anon), "Item_0");
        assert_eq!(tree.id(named).map(ItemIdent::as_str), Some("name"));
        assert_eq!(tree.display_name(named), "name");
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut tree = ItemTree::new();
        assert_eq!(
            tree.create_item(ItemSpec::new().id("parent")),
            Err(TreeError::Name(NameError::ReservedId("parent".into())))
        );
        assert!(matches!(
            tree.create_item(ItemSpec::new().constant("_v1", 1)),
            Err(TreeError::Name(NameError::LeadingMarker(_)))
        ));
        assert!(matches!(
            tree.create_item(ItemSpec::new().constant("v1", 1)),
            Err(TreeError::Name(NameError::MissingMarker(_)))
        ));
        // Nothing was allocated by the failed calls.
        assert_eq!(tree.len, 0);
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = ItemTree::new();
        let parent = tree.create_item(ItemSpec::root()).unwrap();
        let child1 = tree.create_item(ItemSpec::new()).unwrap();
        let child2 = tree.create_item(ItemSpec::new()).unwrap();

        tree.add_children(parent, [child1, child2]).unwrap();

        assert_eq!(tree.parent(child1), Some(parent));
        assert_eq!(tree.parent(child2), Some(parent));
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn attach_twice_is_rejected() {
        let mut tree = ItemTree::new();
        let p1 = tree.create_item(ItemSpec::root()).unwrap();
        let p2 = tree.create_item(ItemSpec::root()).unwrap();
        let child = tree.create_item(ItemSpec::new()).unwrap();

        tree.attach_to(child, p1).unwrap();
        assert_eq!(
            tree.add_child(p2, child),
            Err(TreeError::AlreadyAttached { child, parent: p1 })
        );
        assert_eq!(
            tree.create_item(ItemSpec::new().child(child)),
            Err(TreeError::AlreadyAttached { child, parent: p1 })
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = ItemTree::new();
        let a = tree.create_item(ItemSpec::root()).unwrap();
        let b = tree.create_item(ItemSpec::new()).unwrap();
        tree.add_child(a, b).unwrap();
        assert_eq!(
            tree.add_child(b, a),
            Err(TreeError::WouldCycle {
                parent: b,
                child: a
            })
        );
        assert_eq!(
            tree.add_child(a, a),
            Err(TreeError::WouldCycle {
                parent: a,
                child: a
            })
        );
    }

    #[test]
    fn remove_child_works() {
        let mut tree = ItemTree::new();
        let parent = tree.create_item(ItemSpec::root()).unwrap();
        let child = tree.create_item(ItemSpec::new()).unwrap();

        tree.add_child(parent, child).unwrap();
        tree.remove_child(parent, child).unwrap();
        assert_eq!(tree.parent(child), None);
        assert!(tree.children(parent).next().is_none());
        assert_eq!(
            tree.remove_child(parent, child),
            Err(TreeError::NotAChild { parent, child })
        );

        // A detached item can be attached elsewhere.
        let other = tree.create_item(ItemSpec::root()).unwrap();
        tree.add_child(other, child).unwrap();
        assert_eq!(tree.parent(child), Some(other));
    }

    #[test]
    fn adopt_only_once() {
        let mut tree = ItemTree::new();
        let item = tree.create_item(ItemSpec::new().id("own")).unwrap();
        assert_eq!(tree.peer_id(item).map(ItemIdent::as_str), Some("own"));
        tree.adopt(item, "wrapper").unwrap();
        assert_eq!(tree.peer_id(item).map(ItemIdent::as_str), Some("wrapper"));
        assert_eq!(tree.id(item).map(ItemIdent::as_str), Some("own"));
        assert_eq!(
            tree.adopt(item, "again"),
            Err(TreeError::AlreadyAdopted(item))
        );
    }

    #[test]
    fn property_names_keep_definition_order() {
        let mut tree = ItemTree::new();
        let item = tree
            .create_item(ItemSpec::new().constant("b_", 1).constant("a_", 2))
            .unwrap();
        tree.set(item, "c_", 3).unwrap();
        tree.set(item, "b_", 4).unwrap();
        let names: Vec<&str> = tree.property_names(item).map(PropertyName::as_str).collect();
        assert_eq!(names, ["b_", "a_", "c_"]);
        assert_eq!(tree.value(item, "b_"), Some(&Value::Int(4)));
        assert_eq!(tree.value(item, "zz_"), None);
    }

    #[test]
    fn destroy_unbinds_dependents() {
        let mut tree = ItemTree::new();
        let a = tree.create_item(ItemSpec::new().id("a").constant("v1_", 5)).unwrap();
        let b = tree
            .create_item(ItemSpec::new().derived("v1_", |d| Ok(d.scope("a").get("v1_")? + 1)))
            .unwrap();
        let root = tree.create_item(ItemSpec::root().child(a).child(b)).unwrap();
        tree.compute(root).unwrap();
        assert_eq!(tree.value(b, "v1_"), Some(&Value::Int(6)));

        tree.remove_child(root, a).unwrap();
        tree.destroy_item(a);
        assert_eq!(tree.is_up_to_date(b, "v1_"), Some(false));

        tree.compute(root).unwrap();
        assert_eq!(tree.value(b, "v1_"), Some(&Value::Pending));
        assert_eq!(
            tree.requirements(b, "v1_").unwrap(),
            vec![Requirement::new("a", "v1_")]
        );
    }

    #[test]
    #[should_panic(expected = "cannot destroy item with children")]
    fn destroy_with_children_panics() {
        let mut tree = ItemTree::new();
        let parent = tree.create_item(ItemSpec::root()).unwrap();
        let child = tree.create_item(ItemSpec::new()).unwrap();
        tree.add_child(parent, child).unwrap();
        tree.destroy_item(parent);
    }

    #[test]
    #[should_panic(expected = "cannot destroy an attached item")]
    fn destroy_attached_panics() {
        let mut tree = ItemTree::new();
        let parent = tree.create_item(ItemSpec::root()).unwrap();
        let child = tree.create_item(ItemSpec::new()).unwrap();
        tree.add_child(parent, child).unwrap();
        tree.destroy_item(child);
    }

    #[test]
    #[should_panic(expected = "stale ItemId")]
    fn destroyed_handle_panics_on_set() {
        let mut tree = ItemTree::new();
        let id = tree.create_item(ItemSpec::new()).unwrap();
        tree.destroy_item(id);
        let _ = tree.set(id, "v1_", 1);
    }

    #[test]
    #[should_panic(expected = "stale ItemId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut tree = ItemTree::new();
        let root = tree.create_item(ItemSpec::root()).unwrap();
        let id = tree.create_item(ItemSpec::new()).unwrap();
        tree.destroy_item(id);
        let _ = tree.add_child(root, id);
    }

    #[test]
    #[should_panic(expected = "stale ItemId")]
    fn destroyed_handle_panics_on_parent() {
        let mut tree = ItemTree::new();
        let id = tree.create_item(ItemSpec::new()).unwrap();
        tree.destroy_item(id);
        let _ = tree.parent(id);
    }
}
