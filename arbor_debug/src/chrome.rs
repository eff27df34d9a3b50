// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! The engine does not read a clock, so timestamps are the ordinal of each
//! event in the recording. Durations in the viewer therefore count events,
//! not time. Each compute pass is a separate process row (`pid` is the
//! compute counter).
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, RecordedItem, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        let pid = recorded.compute_index();
        match recorded {
            RecordedEvent::ComputeBegin { item, .. } => {
                events.push(json!({
                    "ph": "B",
                    "name": "compute",
                    "cat": "Compute",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "args": {
                        "item": item_label(item),
                    }
                }));
            }
            RecordedEvent::ComputeEnd {
                item,
                attempts,
                changed,
                ok,
                ..
            } => {
                events.push(json!({
                    "ph": "E",
                    "name": "compute",
                    "cat": "Compute",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "args": {
                        "item": item_label(item),
                        "attempts": attempts,
                        "changed": changed,
                        "ok": ok,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                }));
            }
            RecordedEvent::PedigreeRebuilt { item, .. } => {
                events.push(json!({
                    "ph": "i",
                    "name": "PedigreeRebuilt",
                    "cat": "Pedigree",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "item": item_label(item),
                    }
                }));
            }
            RecordedEvent::PropertyEvaluated {
                item,
                property,
                outcome,
                ..
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("eval {property}"),
                    "cat": "Property",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "item": item_label(item),
                        "outcome": format!("{outcome:?}"),
                    }
                }));
            }
            RecordedEvent::PropertyChanged {
                item,
                property,
                value,
                ..
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("changed {property}"),
                    "cat": "Property",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "item": item_label(item),
                        "value": value,
                    }
                }));
            }
            RecordedEvent::CycleDetected { stuck, .. } => {
                let stuck: Vec<Value> = stuck
                    .iter()
                    .map(|s| {
                        json!({
                            "item": item_label(s.item),
                            "display_name": s.display_name,
                            "property": s.property,
                        })
                    })
                    .collect();
                events.push(json!({
                    "ph": "i",
                    "name": "CycleDetected",
                    "cat": "Compute",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "stuck": stuck,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn item_label(item: RecordedItem) -> String {
    format!("{}@{}", item.index, item.generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use arbor_core::item::{ItemSpec, ItemTree};
    use arbor_core::trace::Tracer;

    #[test]
    fn export_produces_valid_json() {
        let mut tree = ItemTree::new();
        let root = tree.create_item(ItemSpec::root().constant("v1_", 1)).unwrap();

        let mut rec = RecorderSink::new();
        let mut tracer = Tracer::new(&mut rec);
        tree.compute_traced(root, &mut tracer).unwrap();
        drop(tracer);

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        // compute begin/end, four phase pairs, one change.
        assert_eq!(parsed.len(), 11);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "compute");
        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "pedigree_refresh");
        assert_eq!(parsed[10]["ph"], "E");
        assert_eq!(parsed[10]["args"]["ok"], true);

        let change = parsed
            .iter()
            .find(|e| e["name"] == "changed v1_")
            .expect("change event exported");
        assert_eq!(change["args"]["value"], "1");
        assert_eq!(change["args"]["item"], "0@0");

        // Timestamps are strictly increasing ordinals.
        for (i, e) in parsed.iter().enumerate() {
            assert_eq!(e["ts"], i);
        }
    }

    #[test]
    fn export_cycle() {
        let mut tree = ItemTree::new();
        let root = tree
            .create_item(ItemSpec::root().id("top").derived("v1_", |d| d.get("v1_")))
            .unwrap();
        let mut rec = RecorderSink::new();
        let mut tracer = Tracer::new(&mut rec);
        assert!(tree.compute_traced(root, &mut tracer).is_err());
        drop(tracer);

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        let cycle = parsed
            .iter()
            .find(|e| e["name"] == "CycleDetected")
            .expect("cycle event exported");
        assert_eq!(cycle["args"]["stuck"][0]["display_name"], "top");
        assert_eq!(cycle["args"]["stuck"][0]["property"], "v1_");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
