// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for `compute`.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! evaluation engine calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Every event carries the `compute_index` of the call that emitted it, a
//! per-tree counter that increments on each `compute`.

use crate::error::StuckProperty;
use crate::item::ItemId;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of `compute` is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Top-down pedigree rebuild of stale children.
    PedigreeRefresh,
    /// Re-resolution of requirements for items whose pedigree changed.
    Rebind,
    /// The invoking item's own properties.
    SelfProperties,
    /// One batch per item over its children's properties.
    ChildrenProperties,
}

impl PhaseKind {
    /// Stable lowercase name, used by sinks that print or export phases.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PedigreeRefresh => "pedigree_refresh",
            Self::Rebind => "rebind",
            Self::SelfProperties => "self_properties",
            Self::ChildrenProperties => "children_properties",
        }
    }
}

/// Result of one evaluation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvalOutcome {
    /// The function returned a value and every input was up to date.
    Ready,
    /// The function returned an error; the property settled on `Pending`.
    Failed,
    /// Some input was not up to date; the property was queued again.
    Deferred,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when `compute` starts.
#[derive(Clone, Copy, Debug)]
pub struct ComputeBeginEvent {
    /// Compute counter.
    pub compute_index: u64,
    /// The invoking item.
    pub item: ItemId,
}

/// Emitted when `compute` returns.
#[derive(Clone, Copy, Debug)]
pub struct ComputeEndEvent {
    /// Compute counter.
    pub compute_index: u64,
    /// The invoking item.
    pub item: ItemId,
    /// Number of evaluation attempts made.
    pub attempts: u32,
    /// Number of property changes reported.
    pub changed: u32,
    /// `false` if a circular dependency aborted the call.
    pub ok: bool,
}

/// Marks the beginning of a compute phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Compute counter.
    pub compute_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a compute phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Compute counter.
    pub compute_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted after an item's pedigree was rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct PedigreeRebuiltEvent {
    /// Compute counter.
    pub compute_index: u64,
    /// The item whose pedigree changed.
    pub item: ItemId,
}

/// Emitted after each evaluation attempt.
#[derive(Clone, Copy, Debug)]
pub struct PropertyEvaluatedEvent<'a> {
    /// Compute counter.
    pub compute_index: u64,
    /// Owner of the property.
    pub item: ItemId,
    /// Property name.
    pub property: &'a str,
    /// What the attempt produced.
    pub outcome: EvalOutcome,
}

/// Emitted when a property's reported value changes.
#[derive(Clone, Copy, Debug)]
pub struct PropertyChangedEvent<'a> {
    /// Compute counter.
    pub compute_index: u64,
    /// Owner of the property.
    pub item: ItemId,
    /// Property name.
    pub property: &'a str,
    /// The new value.
    pub value: &'a Value,
}

/// Emitted when the work queue stops making progress.
#[derive(Clone, Copy, Debug)]
pub struct CycleDetectedEvent<'a> {
    /// Compute counter.
    pub compute_index: u64,
    /// The properties left in the queue.
    pub stuck: &'a [StuckProperty],
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from `compute`.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when `compute` starts.
    fn on_compute_begin(&mut self, e: &ComputeBeginEvent) {
        _ = e;
    }

    /// Called when `compute` returns.
    fn on_compute_end(&mut self, e: &ComputeEndEvent) {
        _ = e;
    }

    /// Called at the beginning of a compute phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a compute phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after a pedigree rebuild.
    fn on_pedigree_rebuilt(&mut self, e: &PedigreeRebuiltEvent) {
        _ = e;
    }

    /// Called after each evaluation attempt.
    fn on_property_evaluated(&mut self, e: &PropertyEvaluatedEvent<'_>) {
        _ = e;
    }

    /// Called when a property's value change is reported.
    fn on_property_changed(&mut self, e: &PropertyChangedEvent<'_>) {
        _ = e;
    }

    /// Called when a circular dependency is detected.
    fn on_cycle_detected(&mut self, e: &CycleDetectedEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`ComputeBeginEvent`].
    #[inline]
    pub fn compute_begin(&mut self, e: &ComputeBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_compute_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ComputeEndEvent`].
    #[inline]
    pub fn compute_end(&mut self, e: &ComputeEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_compute_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PedigreeRebuiltEvent`].
    #[inline]
    pub fn pedigree_rebuilt(&mut self, e: &PedigreeRebuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pedigree_rebuilt(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PropertyEvaluatedEvent`].
    #[inline]
    pub fn property_evaluated(&mut self, e: &PropertyEvaluatedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_property_evaluated(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PropertyChangedEvent`].
    #[inline]
    pub fn property_changed(&mut self, e: &PropertyChangedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_property_changed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CycleDetectedEvent`].
    #[inline]
    pub fn cycle_detected(&mut self, e: &CycleDetectedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cycle_detected(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemSpec, ItemTree};

    #[test]
    fn noop_sink_compiles() {
        let mut tree = ItemTree::new();
        let root = tree.create_item(ItemSpec::root()).unwrap();
        let mut sink = NoopSink;
        sink.on_compute_begin(&ComputeBeginEvent {
            compute_index: 0,
            item: root,
        });
        sink.on_phase_begin(&PhaseBeginEvent {
            compute_index: 0,
            phase: PhaseKind::Rebind,
        });
        sink.on_property_changed(&PropertyChangedEvent {
            compute_index: 0,
            item: root,
            property: "v1_",
            value: &Value::Int(1),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tree = ItemTree::new();
        let root = tree.create_item(ItemSpec::root().constant("v1_", 1)).unwrap();
        let mut tracer = Tracer::none();
        tracer.phase_end(&PhaseEndEvent {
            compute_index: 0,
            phase: PhaseKind::SelfProperties,
        });
        tree.compute_traced(root, &mut tracer).unwrap();
    }

    #[test]
    fn phase_names_are_distinct() {
        let names = [
            PhaseKind::PedigreeRefresh.name(),
            PhaseKind::Rebind.name(),
            PhaseKind::SelfProperties.name(),
            PhaseKind::ChildrenProperties.name(),
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::string::String;
        use alloc::vec::Vec;

        #[derive(Default)]
        struct RecordingSink {
            phases: Vec<PhaseKind>,
            changed: Vec<String>,
            begins: u32,
            ends: u32,
        }
        impl TraceSink for RecordingSink {
            fn on_compute_begin(&mut self, _: &ComputeBeginEvent) {
                self.begins += 1;
            }
            fn on_compute_end(&mut self, e: &ComputeEndEvent) {
                assert!(e.ok);
                self.ends += 1;
            }
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.phases.push(e.phase);
            }
            fn on_property_changed(&mut self, e: &PropertyChangedEvent<'_>) {
                self.changed.push(e.property.into());
            }
        }

        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .constant("v1_", 1)
                    .derived("v2_", |d| Ok(d.get("v1_")? + 2)),
            )
            .unwrap();

        let mut sink = RecordingSink::default();
        let mut tracer = Tracer::new(&mut sink);
        tree.compute_traced(root, &mut tracer).unwrap();
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.begins, 1);
        assert_eq!(sink.ends, 1);
        assert_eq!(
            sink.phases,
            [
                PhaseKind::PedigreeRefresh,
                PhaseKind::Rebind,
                PhaseKind::SelfProperties,
                PhaseKind::ChildrenProperties,
            ]
        );
        assert_eq!(sink.changed, ["v1_", "v2_"]);
    }
}
