// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The evaluation engine.
//!
//! `compute` on an item runs four phases over that item's subtree:
//!
//! 1. **Pedigree refresh**: drain the `PEDIGREE` and `TOPOLOGY` channels,
//!    then walk the subtree pre-order, rebuilding the pedigrees of stale
//!    children from their parent's. The invoking item's own pedigree is
//!    left as is; only its parent can rebuild it.
//! 2. **Rebind**: for every item whose pedigree version moved since the
//!    last rebind, re-resolve each property's requirements. Properties
//!    holding unresolved requirements are re-resolved too.
//! 3. **Self properties**: run the work queue over the invoking item's
//!    properties.
//! 4. **Children properties**: pre-order, each item runs one queue over the
//!    properties of all of its children.
//!
//! # Work queue
//!
//! A property whose bound requirements are not all up to date goes to the
//! back of the queue. A round is one pass over the queue as it stood when
//! the round began; a round that ends without the queue shrinking means
//! every remaining property waits on another one in the queue, and the call
//! fails with [`CircularDependency`].

use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;

use super::id::{ItemId, PropertyId};
use super::property::Attempt;
use super::store::ItemTree;
use crate::dirty;
use crate::error::{CircularDependency, StuckProperty};
use crate::name::PropertyName;
use crate::trace::{
    ComputeBeginEvent, ComputeEndEvent, CycleDetectedEvent, EvalOutcome, PedigreeRebuiltEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, PropertyChangedEvent, PropertyEvaluatedEvent,
    Tracer,
};
use crate::value::Value;

/// A property whose value changed during a compute.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    /// The owning item.
    pub item: ItemId,
    /// The property name.
    pub property: PropertyName,
    /// The new value.
    pub value: Value,
}

/// What a single [`ItemTree::compute`] call did.
#[derive(Clone, Debug, Default)]
pub struct ComputeReport {
    /// Properties whose value changed, in the order the changes were
    /// reported. Change hooks fired in the same order.
    pub changed: Vec<PropertyChange>,
    /// Items whose pedigree was rebuilt.
    pub rebuilt: Vec<ItemId>,
    /// Number of properties whose requirement bindings moved.
    pub rebound: u32,
    /// Number of evaluation attempts, including deferred ones.
    pub attempts: u32,
    /// Whether any item in the subtree gained or lost children since the
    /// last compute covering it.
    pub topology_changed: bool,
}

impl ComputeReport {
    /// Returns `true` if `property` on `item` changed.
    #[must_use]
    pub fn contains(&self, item: ItemId, property: &str) -> bool {
        self.changed
            .iter()
            .any(|c| c.item == item && c.property == property)
    }
}

impl ItemTree {
    /// Brings every property in the subtree of `item` up to date.
    ///
    /// See the [module docs](self) for the phases. Calling this on a
    /// non-root item is valid: the item is evaluated with its last-known
    /// pedigree, and properties outside the subtree are read as they are.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or if invariant checking is enabled
    /// and an up-to-date property is found with a stale requirement.
    pub fn compute(&mut self, item: ItemId) -> Result<ComputeReport, CircularDependency> {
        self.compute_traced(item, &mut Tracer::none())
    }

    /// Like [`compute`](Self::compute), emitting trace events to `tracer`.
    pub fn compute_traced(
        &mut self,
        item: ItemId,
        tracer: &mut Tracer<'_>,
    ) -> Result<ComputeReport, CircularDependency> {
        self.validate(item);
        let index = self.compute_index;
        self.compute_index += 1;
        tracer.compute_begin(&ComputeBeginEvent {
            compute_index: index,
            item,
        });

        let mut pass = Pass {
            index,
            report: ComputeReport::default(),
        };
        let result = self.run_phases(item.idx, &mut pass, tracer);

        #[expect(
            clippy::cast_possible_truncation,
            reason = "change counts fit in u32"
        )]
        let changed = pass.report.changed.len() as u32;
        tracer.compute_end(&ComputeEndEvent {
            compute_index: index,
            item,
            attempts: pass.report.attempts,
            changed,
            ok: result.is_ok(),
        });
        result.map(|()| pass.report)
    }

    fn run_phases(
        &mut self,
        invoker: u32,
        pass: &mut Pass,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), CircularDependency> {
        let subtree = self.subtree_preorder(invoker);

        pass.phase_begin(tracer, PhaseKind::PedigreeRefresh);
        let stale = self.drain_marks(invoker, &mut pass.report);
        self.refresh_pedigrees(&subtree, &stale, pass, tracer);
        pass.phase_end(tracer, PhaseKind::PedigreeRefresh);

        pass.phase_begin(tracer, PhaseKind::Rebind);
        self.rebind_subtree(invoker, &subtree, &mut pass.report);
        pass.phase_end(tracer, PhaseKind::Rebind);

        pass.phase_begin(tracer, PhaseKind::SelfProperties);
        let queue: VecDeque<PropertyId> = self.order[invoker as usize].iter().copied().collect();
        let result = self.run_queue(queue, pass, tracer);
        pass.phase_end(tracer, PhaseKind::SelfProperties);
        result?;

        pass.phase_begin(tracer, PhaseKind::ChildrenProperties);
        let result = self.run_children(&subtree, pass, tracer);
        pass.phase_end(tracer, PhaseKind::ChildrenProperties);
        result
    }

    fn run_children(
        &mut self,
        subtree: &[u32],
        pass: &mut Pass,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), CircularDependency> {
        for &idx in subtree {
            let queue: VecDeque<PropertyId> = self.children[idx as usize]
                .iter()
                .flat_map(|&c| self.order[c as usize].iter().copied())
                .collect();
            if !queue.is_empty() {
                self.run_queue(queue, pass, tracer)?;
            }
        }
        Ok(())
    }

    /// Drains both dirty channels, keeping the marks inside the subtree of
    /// `invoker` and putting the rest back. The invoker's own pedigree mark
    /// is put back too.
    ///
    /// Returns the items whose pedigree must be rebuilt.
    fn drain_marks(&mut self, invoker: u32, report: &mut ComputeReport) -> BTreeSet<u32> {
        let marked: Vec<u32> = self
            .dirty
            .drain(dirty::PEDIGREE)
            .deterministic()
            .run()
            .collect();
        let mut stale = BTreeSet::new();
        for idx in marked {
            if idx != invoker && self.is_within(idx, invoker) {
                stale.insert(idx);
            } else {
                self.dirty.mark(idx, dirty::PEDIGREE);
            }
        }

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        for idx in topology {
            if self.is_within(idx, invoker) {
                report.topology_changed = true;
            } else {
                self.dirty.mark(idx, dirty::TOPOLOGY);
            }
        }
        stale
    }

    fn refresh_pedigrees(
        &mut self,
        subtree: &[u32],
        stale: &BTreeSet<u32>,
        pass: &mut Pass,
        tracer: &mut Tracer<'_>,
    ) {
        if stale.is_empty() {
            return;
        }
        // Pre-order: a parent is always fresh before its children rebuild.
        for &idx in subtree {
            let children: Vec<u32> = self.children[idx as usize]
                .iter()
                .copied()
                .filter(|c| stale.contains(c))
                .collect();
            if children.is_empty() {
                continue;
            }
            self.rebuild_child_pedigrees(idx, &children);
            for c in children {
                let item = self.item_id(c);
                tracer.pedigree_rebuilt(&PedigreeRebuiltEvent {
                    compute_index: pass.index,
                    item,
                });
                pass.report.rebuilt.push(item);
            }
        }
    }

    fn rebind_subtree(&mut self, invoker: u32, subtree: &[u32], report: &mut ComputeReport) {
        for &idx in subtree {
            let i = idx as usize;
            if self.pedigree_version[i] == self.applied_version[i] {
                continue;
            }
            for pid in self.order[i].clone() {
                if self.rebind(pid) {
                    report.rebound += 1;
                }
            }
            self.applied_version[i] = self.pedigree_version[i];
        }

        let watched: Vec<PropertyId> = self
            .unresolved
            .iter()
            .copied()
            .filter(|&pid| self.is_within(self.props[pid].owner, invoker))
            .collect();
        for pid in watched {
            if self.rebind(pid) {
                report.rebound += 1;
            }
        }
    }

    fn run_queue(
        &mut self,
        mut queue: VecDeque<PropertyId>,
        pass: &mut Pass,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), CircularDependency> {
        let mut last_len = queue.len();
        let mut countdown = last_len + 1;
        let mut rounds: u32 = 0;

        while !queue.is_empty() {
            countdown -= 1;
            if countdown == 0 {
                let exhausted = self.config.max_rounds.is_some_and(|max| rounds + 1 >= max);
                if last_len == queue.len() || exhausted {
                    return Err(self.circular(&queue, pass.index, tracer));
                }
                rounds += 1;
                last_len = queue.len();
                countdown = last_len + 1;
            }
            let Some(pid) = queue.pop_front() else {
                break;
            };

            let up_to_date = self.props[pid].up_to_date;
            let blocked = self.requirements_stale(pid);
            if self.config.check_invariants {
                assert!(
                    !(up_to_date && blocked),
                    "up-to-date property {} has a stale requirement",
                    self.props[pid].name
                );
            }

            if up_to_date {
                self.report_change(pid, pass, tracer);
            } else if blocked {
                queue.push_back(pid);
            } else {
                pass.report.attempts += 1;
                let attempt = self.try_update(pid);
                let outcome = match attempt {
                    Attempt::Ready => EvalOutcome::Ready,
                    Attempt::Failed => EvalOutcome::Failed,
                    Attempt::Deferred => EvalOutcome::Deferred,
                };
                let prop = &self.props[pid];
                tracer.property_evaluated(&PropertyEvaluatedEvent {
                    compute_index: pass.index,
                    item: self.item_id(prop.owner),
                    property: prop.name.as_str(),
                    outcome,
                });
                if attempt == Attempt::Deferred {
                    queue.push_back(pid);
                } else {
                    self.report_change(pid, pass, tracer);
                }
            }
        }
        Ok(())
    }

    /// Fires the change hook and records the change if the value differs
    /// from the last one reported.
    fn report_change(&mut self, pid: PropertyId, pass: &mut Pass, tracer: &mut Tracer<'_>) {
        let item = self.item_id(self.props[pid].owner);
        let prop = &mut self.props[pid];
        if prop.value.same(&prop.reported) {
            return;
        }
        prop.reported = prop.value.clone();
        self.kind[item.idx as usize].on_change(&prop.name, &prop.value);
        tracer.property_changed(&PropertyChangedEvent {
            compute_index: pass.index,
            item,
            property: prop.name.as_str(),
            value: &prop.value,
        });
        pass.report.changed.push(PropertyChange {
            item,
            property: prop.name.clone(),
            value: prop.value.clone(),
        });
    }

    fn circular(
        &self,
        queue: &VecDeque<PropertyId>,
        index: u64,
        tracer: &mut Tracer<'_>,
    ) -> CircularDependency {
        let stuck: Vec<StuckProperty> = queue
            .iter()
            .map(|&pid| {
                let prop = &self.props[pid];
                StuckProperty {
                    item: self.item_id(prop.owner),
                    display_name: self.display[prop.owner as usize].clone(),
                    property: prop.name.as_str().into(),
                }
            })
            .collect();
        tracer.cycle_detected(&CycleDetectedEvent {
            compute_index: index,
            stuck: &stuck,
        });
        CircularDependency { stuck }
    }
}

/// State threaded through one compute call.
struct Pass {
    index: u64,
    report: ComputeReport,
}

impl Pass {
    fn phase_begin(&self, tracer: &mut Tracer<'_>, phase: PhaseKind) {
        tracer.phase_begin(&PhaseBeginEvent {
            compute_index: self.index,
            phase,
        });
    }

    fn phase_end(&self, tracer: &mut Tracer<'_>, phase: PhaseKind) {
        tracer.phase_end(&PhaseEndEvent {
            compute_index: self.index,
            phase,
        });
    }
}
