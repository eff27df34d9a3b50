// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;
use core::slice;

use super::id::{INVALID, ItemId};
use super::store::ItemTree;

/// An iterator over the direct children of an item, in insertion order.
///
/// Created by [`ItemTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a ItemTree,
    inner: slice::Iter<'a, u32>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a ItemTree, children: &'a [u32]) -> Self {
        Self {
            tree,
            inner: children.iter(),
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        self.inner.next().map(|&idx| self.tree.item_id(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl ItemTree {
    /// Depth-first pre-order listing of the subtree rooted at `idx`.
    pub(crate) fn subtree_preorder(&self, idx: u32) -> Vec<u32> {
        let mut order = Vec::new();
        let mut stack = alloc::vec![idx];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.children[i as usize].iter().rev());
        }
        order
    }

    /// Returns `true` if `ancestor` is `idx` or lies on its parent chain.
    pub(crate) fn is_within(&self, idx: u32, ancestor: u32) -> bool {
        let mut cur = idx;
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }
}
