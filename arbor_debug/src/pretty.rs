// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Each line
//! starts with a bracketed tag and the compute counter.

use std::io::Write;

use arbor_core::item::ItemId;
use arbor_core::trace::{
    ComputeBeginEvent, ComputeEndEvent, CycleDetectedEvent, PedigreeRebuiltEvent, PhaseBeginEvent,
    PhaseEndEvent, PropertyChangedEvent, PropertyEvaluatedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    evaluations: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            evaluations: true,
        }
    }

    /// Enables or disables the per-attempt `[eval]` lines, which dominate
    /// the output on large trees.
    #[must_use]
    pub fn evaluations(mut self, enabled: bool) -> Self {
        self.evaluations = enabled;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

struct Item(ItemId);

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}@{}", self.0.index(), self.0.generation())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_compute_begin(&mut self, e: &ComputeBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[compute:begin] pass={} item={}",
            e.compute_index,
            Item(e.item),
        );
    }

    fn on_compute_end(&mut self, e: &ComputeEndEvent) {
        let status = if e.ok { "ok" } else { "CYCLE" };
        let _ = writeln!(
            self.writer,
            "[compute:end] pass={} item={} attempts={} changed={} {status}",
            e.compute_index,
            Item(e.item),
            e.attempts,
            e.changed,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] pass={} {}",
            e.compute_index,
            e.phase.name(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] pass={} {}",
            e.compute_index,
            e.phase.name(),
        );
    }

    fn on_pedigree_rebuilt(&mut self, e: &PedigreeRebuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[pedigree] pass={} item={}",
            e.compute_index,
            Item(e.item),
        );
    }

    fn on_property_evaluated(&mut self, e: &PropertyEvaluatedEvent<'_>) {
        if !self.evaluations {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[eval] pass={} {}.{} {:?}",
            e.compute_index,
            Item(e.item),
            e.property,
            e.outcome,
        );
    }

    fn on_property_changed(&mut self, e: &PropertyChangedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[changed] pass={} {}.{} = {}",
            e.compute_index,
            Item(e.item),
            e.property,
            e.value,
        );
    }

    fn on_cycle_detected(&mut self, e: &CycleDetectedEvent<'_>) {
        let stuck: Vec<String> = e
            .stuck
            .iter()
            .map(|s| format!("{}.{}", s.display_name, s.property))
            .collect();
        let _ = writeln!(
            self.writer,
            "[cycle] pass={} stuck={}",
            e.compute_index,
            stuck.join(", "),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::item::{ItemSpec, ItemTree};
    use arbor_core::trace::Tracer;

    #[test]
    fn pretty_print_compute() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(
                ItemSpec::root()
                    .constant("v1_", 1)
                    .derived("v2_", |d| Ok(d.get("v1_")? + 2)),
            )
            .unwrap();

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let mut tracer = Tracer::new(&mut sink);
        tree.compute_traced(root, &mut tracer).unwrap();
        drop(tracer);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[compute:begin] pass=0"), "got: {output}");
        assert!(output.contains("[phase:begin] pass=0 rebind"), "got: {output}");
        assert!(output.contains("[eval] pass=0 #0@0.v2_ Ready"), "got: {output}");
        assert!(output.contains("[changed] pass=0 #0@0.v2_ = 3"), "got: {output}");
        assert!(
            output.contains("attempts=1 changed=2 ok"),
            "got: {output}"
        );
    }

    #[test]
    fn pretty_print_cycle_without_evaluations() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(ItemSpec::root().id("top").derived("v1_", |d| d.get("v1_")))
            .unwrap();

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).evaluations(false);
        let mut tracer = Tracer::new(&mut sink);
        assert!(tree.compute_traced(root, &mut tracer).is_err());
        drop(tracer);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[cycle] pass=0 stuck=top.v1_"), "got: {output}");
        assert!(!output.contains("[eval]"), "got: {output}");
        assert!(output.contains("CYCLE"), "got: {output}");
    }
}
