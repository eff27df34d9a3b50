// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traced compute passes over a small reactive tree.
//!
//! Builds a root with two properties and a child that reads from its parent,
//! computes, edits the root, and computes again. A final pass turns the root
//! into a self-reference to show cycle reporting. Every event goes to both a
//! [`PrettyPrintSink`](arbor_debug::pretty::PrettyPrintSink) on stderr and a
//! [`RecorderSink`](arbor_debug::recorder::RecorderSink); the recording is then
//! exported as Chrome trace JSON.
//!
//! Usage: `trace_demo [OUTPUT]`. Without an argument the JSON goes to stdout.

use std::fs::File;
use std::io::{BufWriter, Write};

use arbor_core::item::{Definition, ItemSpec, ItemTree};
use arbor_core::kind::ItemKind;
use arbor_core::name::PropertyName;
use arbor_core::trace::{
    ComputeBeginEvent, ComputeEndEvent, CycleDetectedEvent, PedigreeRebuiltEvent, PhaseBeginEvent,
    PhaseEndEvent, PropertyChangedEvent, PropertyEvaluatedEvent, TraceSink, Tracer,
};
use arbor_core::value::Value;

use arbor_debug::pretty::PrettyPrintSink;
use arbor_debug::recorder::RecorderSink;

/// A kind that exposes `width` without the marker and prints its changes.
#[derive(Debug)]
struct Panel;

impl ItemKind for Panel {
    fn kind_name(&self) -> &'static str {
        "Panel"
    }

    fn reserved_names(&self) -> &'static [&'static str] {
        &["width"]
    }

    fn on_change(&mut self, name: &PropertyName, value: &Value) {
        eprintln!("  panel: {name} -> {value}");
    }
}

/// Forwards every event to two sinks.
struct Tee<'a> {
    first: &'a mut dyn TraceSink,
    second: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_compute_begin(&mut self, e: &ComputeBeginEvent) {
        self.first.on_compute_begin(e);
        self.second.on_compute_begin(e);
    }

    fn on_compute_end(&mut self, e: &ComputeEndEvent) {
        self.first.on_compute_end(e);
        self.second.on_compute_end(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.first.on_phase_begin(e);
        self.second.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.first.on_phase_end(e);
        self.second.on_phase_end(e);
    }

    fn on_pedigree_rebuilt(&mut self, e: &PedigreeRebuiltEvent) {
        self.first.on_pedigree_rebuilt(e);
        self.second.on_pedigree_rebuilt(e);
    }

    fn on_property_evaluated(&mut self, e: &PropertyEvaluatedEvent<'_>) {
        self.first.on_property_evaluated(e);
        self.second.on_property_evaluated(e);
    }

    fn on_property_changed(&mut self, e: &PropertyChangedEvent<'_>) {
        self.first.on_property_changed(e);
        self.second.on_property_changed(e);
    }

    fn on_cycle_detected(&mut self, e: &CycleDetectedEvent<'_>) {
        self.first.on_cycle_detected(e);
        self.second.on_cycle_detected(e);
    }
}

fn main() {
    let output = std::env::args().nth(1);

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::stderr();
    let mut recorder = RecorderSink::new();

    // -- tree --------------------------------------------------------------
    let mut tree = ItemTree::new();
    let child = tree
        .create_item(
            ItemSpec::new()
                .id("c1")
                .kind(Panel)
                .derived("v1_", |d| Ok(d.parent().get("v2_")? * 2))
                .derived("width", |d| Ok(d.get("v1_")? + 10)),
        )
        .expect("valid child item");
    let root = tree
        .create_item(
            ItemSpec::root()
                .id("top")
                .constant("v1_", 1)
                .derived("v2_", |d| Ok(d.get("v1_")? + 2))
                .child(child),
        )
        .expect("valid root item");

    // -- passes ------------------------------------------------------------
    {
        let mut tee = Tee {
            first: &mut pretty,
            second: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);

        let report = tree
            .compute_traced(root, &mut tracer)
            .expect("acyclic tree");
        eprintln!("first pass: {} changes", report.changed.len());

        tree.set(root, "v1_", 3).expect("valid property name");
        let report = tree
            .compute_traced(root, &mut tracer)
            .expect("acyclic tree");
        eprintln!("second pass: {} changes", report.changed.len());

        // A self-reference never settles.
        tree.set(root, "v1_", Definition::derived(|d| d.get("v1_")))
            .expect("valid property name");
        if let Err(err) = tree.compute_traced(root, &mut tracer) {
            eprintln!("third pass: {err}");
        }
    }

    eprintln!(
        "c1.v1_ = {}, c1.width = {}",
        tree.value(child, "v1_").expect("defined"),
        tree.value(child, "width").expect("defined"),
    );

    // -- export Chrome trace -----------------------------------------------
    let result = match &output {
        Some(path) => {
            let file = File::create(path).expect("failed to create output file");
            let mut writer = BufWriter::new(file);
            arbor_debug::chrome::export(recorder.as_bytes(), &mut writer)
                .and_then(|()| writer.flush())
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            arbor_debug::chrome::export(recorder.as_bytes(), &mut writer)
                .and_then(|()| writer.flush())
        }
    };
    result.expect("failed to write Chrome trace");

    if let Some(path) = output {
        eprintln!("Wrote {path}");
    }
}
