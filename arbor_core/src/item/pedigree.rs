// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scope resolution.
//!
//! Every item carries a [`Pedigree`] snapshot of the names visible from it:
//! itself, its siblings (peers), its parent, and its ancestors by id. The
//! snapshot is rebuilt top-down by `compute` when the item's position in the
//! tree may have changed, and replaced wholesale; each rebuild bumps the
//! item's pedigree version so the rebinding phase knows to re-resolve its
//! requirements.

use alloc::collections::BTreeMap;

use super::id::{ItemId, PropertyId};
use super::store::ItemTree;
use crate::name::{ItemIdent, PARENT, Requirement, SELF};

/// Names visible from one item, as of the last rebuild.
#[derive(Clone, Debug)]
pub(crate) struct Pedigree {
    this: ItemId,
    this_peer: Option<ItemIdent>,
    parent: Option<ItemId>,
    /// Ancestors keyed by their own id; nearer ancestors shadow farther ones.
    ancestors: BTreeMap<ItemIdent, ItemId>,
    /// Children of the parent keyed by peer id; the first occurrence wins.
    peers: BTreeMap<ItemIdent, ItemId>,
}

impl Pedigree {
    /// A pedigree that only knows the item itself.
    pub(crate) fn detached(this: ItemId, this_peer: Option<ItemIdent>) -> Self {
        Self {
            this,
            this_peer,
            parent: None,
            ancestors: BTreeMap::new(),
            peers: BTreeMap::new(),
        }
    }

    /// Resolves a scope name: self aliases first, then peers, then the
    /// parent, then ancestors by id.
    pub(crate) fn resolve(&self, name: &str) -> Option<ItemId> {
        if name == SELF || self.this_peer.as_ref().is_some_and(|p| p.as_str() == name) {
            return Some(self.this);
        }
        if let Some(&peer) = self.peers.get(name) {
            return Some(peer);
        }
        if name == PARENT {
            return self.parent;
        }
        self.ancestors.get(name).copied()
    }

    /// Updates the self alias after the item's peer id changed.
    pub(crate) fn set_this_peer(&mut self, peer: Option<ItemIdent>) {
        self.this_peer = peer;
    }
}

impl ItemTree {
    /// Builds fresh pedigrees for the listed children of `parent`.
    ///
    /// The shared part (ancestors plus `parent` itself, and the peer map) is
    /// computed once from `parent`'s current pedigree, so `parent` must
    /// already be fresh.
    pub(crate) fn rebuild_child_pedigrees(&mut self, parent: u32, stale: &[u32]) {
        let parent_id = self.item_id(parent);
        let mut ancestors = self.pedigree[parent as usize].ancestors.clone();
        if let Some(ident) = &self.ident[parent as usize] {
            ancestors.insert(ident.clone(), parent_id);
        }
        let mut peers = BTreeMap::new();
        for &c in &self.children[parent as usize] {
            if let Some(peer) = self.peer_ident(c) {
                peers.entry(peer.clone()).or_insert_with(|| self.item_id(c));
            }
        }
        for &c in stale {
            let pedigree = Pedigree {
                this: self.item_id(c),
                this_peer: self.peer_ident(c).cloned(),
                parent: Some(parent_id),
                ancestors: ancestors.clone(),
                peers: peers.clone(),
            };
            self.pedigree[c as usize] = pedigree;
            self.pedigree_version[c as usize] = self.pedigree_version[c as usize].wrapping_add(1);
        }
    }

    /// Resolves `name` as seen from `owner`, ignoring destroyed items.
    pub(crate) fn resolve_scope(&self, owner: u32, name: &str) -> Option<u32> {
        self.pedigree[owner as usize]
            .resolve(name)
            .filter(|&id| self.is_alive(id))
            .map(|id| id.idx)
    }

    /// Resolves a requirement as seen from `owner` to a concrete property.
    pub(crate) fn resolve_requirement(&self, owner: u32, req: &Requirement) -> Option<PropertyId> {
        let target = self.resolve_scope(owner, &req.scope)?;
        self.lookup[target as usize]
            .get(req.property.as_str())
            .copied()
    }
}
