// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as tagged little-endian records. Strings (property names,
//! display names, and the display form of values) are stored with a `u32`
//! length prefix. [`decode`] reads them back as an iterator of
//! [`RecordedEvent`].
//!
//! Items are recorded as their slot index and generation; a recording can
//! be decoded without the tree that produced it.

use arbor_core::item::ItemId;
use arbor_core::trace::{
    ComputeBeginEvent, ComputeEndEvent, CycleDetectedEvent, EvalOutcome, PedigreeRebuiltEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, PropertyChangedEvent, PropertyEvaluatedEvent,
    TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_COMPUTE_BEGIN: u8 = 1;
const TAG_COMPUTE_END: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_PEDIGREE_REBUILT: u8 = 5;
const TAG_PROPERTY_EVALUATED: u8 = 6;
const TAG_PROPERTY_CHANGED: u8 = 7;
const TAG_CYCLE_DETECTED: u8 = 8;

/// An item as it appears in a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedItem {
    /// Slot index.
    pub index: u32,
    /// Generation of the slot at recording time.
    pub generation: u32,
}

impl From<ItemId> for RecordedItem {
    fn from(id: ItemId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// A stuck property as it appears in a recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedStuck {
    /// The owning item.
    pub item: RecordedItem,
    /// The owning item's display name.
    pub display_name: String,
    /// The property name.
    pub property: String,
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_len(&mut self, len: usize) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "lengths capped at u32::MAX for recording"
        )]
        self.write_u32(len.min(u32::MAX as usize) as u32);
    }

    fn write_str(&mut self, s: &str) {
        let bytes = &s.as_bytes()[..s.len().min(u32::MAX as usize)];
        self.write_len(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    fn write_item(&mut self, item: ItemId) {
        self.write_u32(item.index());
        self.write_u32(item.generation());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::PedigreeRefresh => 0,
            PhaseKind::Rebind => 1,
            PhaseKind::SelfProperties => 2,
            PhaseKind::ChildrenProperties => 3,
        });
    }

    fn write_outcome(&mut self, o: EvalOutcome) {
        self.write_u8(match o {
            EvalOutcome::Ready => 0,
            EvalOutcome::Failed => 1,
            EvalOutcome::Deferred => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_compute_begin(&mut self, e: &ComputeBeginEvent) {
        self.write_u8(TAG_COMPUTE_BEGIN);
        self.write_u64(e.compute_index);
        self.write_item(e.item);
    }

    fn on_compute_end(&mut self, e: &ComputeEndEvent) {
        self.write_u8(TAG_COMPUTE_END);
        self.write_u64(e.compute_index);
        self.write_item(e.item);
        self.write_u32(e.attempts);
        self.write_u32(e.changed);
        self.write_u8(u8::from(e.ok));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.compute_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.compute_index);
        self.write_phase(e.phase);
    }

    fn on_pedigree_rebuilt(&mut self, e: &PedigreeRebuiltEvent) {
        self.write_u8(TAG_PEDIGREE_REBUILT);
        self.write_u64(e.compute_index);
        self.write_item(e.item);
    }

    fn on_property_evaluated(&mut self, e: &PropertyEvaluatedEvent<'_>) {
        self.write_u8(TAG_PROPERTY_EVALUATED);
        self.write_u64(e.compute_index);
        self.write_item(e.item);
        self.write_str(e.property);
        self.write_outcome(e.outcome);
    }

    fn on_property_changed(&mut self, e: &PropertyChangedEvent<'_>) {
        self.write_u8(TAG_PROPERTY_CHANGED);
        self.write_u64(e.compute_index);
        self.write_item(e.item);
        self.write_str(e.property);
        self.write_str(&e.value.to_string());
    }

    fn on_cycle_detected(&mut self, e: &CycleDetectedEvent<'_>) {
        self.write_u8(TAG_CYCLE_DETECTED);
        self.write_u64(e.compute_index);
        self.write_len(e.stuck.len());
        for s in e.stuck.iter().take(u32::MAX as usize) {
            self.write_item(s.item);
            self.write_str(&s.display_name);
            self.write_str(&s.property);
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`ComputeBeginEvent`].
    ComputeBegin {
        /// Compute counter.
        compute_index: u64,
        /// The invoking item.
        item: RecordedItem,
    },
    /// A [`ComputeEndEvent`].
    ComputeEnd {
        /// Compute counter.
        compute_index: u64,
        /// The invoking item.
        item: RecordedItem,
        /// Number of evaluation attempts.
        attempts: u32,
        /// Number of reported changes.
        changed: u32,
        /// `false` if the call failed.
        ok: bool,
    },
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`PedigreeRebuiltEvent`].
    PedigreeRebuilt {
        /// Compute counter.
        compute_index: u64,
        /// The rebuilt item.
        item: RecordedItem,
    },
    /// A [`PropertyEvaluatedEvent`].
    PropertyEvaluated {
        /// Compute counter.
        compute_index: u64,
        /// Owner of the property.
        item: RecordedItem,
        /// Property name.
        property: String,
        /// What the attempt produced.
        outcome: EvalOutcome,
    },
    /// A [`PropertyChangedEvent`], with the value in display form.
    PropertyChanged {
        /// Compute counter.
        compute_index: u64,
        /// Owner of the property.
        item: RecordedItem,
        /// Property name.
        property: String,
        /// The new value, as formatted by its `Display` impl.
        value: String,
    },
    /// A [`CycleDetectedEvent`].
    CycleDetected {
        /// Compute counter.
        compute_index: u64,
        /// The stuck properties.
        stuck: Vec<RecordedStuck>,
    },
}

impl RecordedEvent {
    /// The compute counter the event belongs to.
    #[must_use]
    pub fn compute_index(&self) -> u64 {
        match self {
            Self::ComputeBegin { compute_index, .. }
            | Self::ComputeEnd { compute_index, .. }
            | Self::PedigreeRebuilt { compute_index, .. }
            | Self::PropertyEvaluated { compute_index, .. }
            | Self::PropertyChanged { compute_index, .. }
            | Self::CycleDetected { compute_index, .. } => *compute_index,
            Self::PhaseBegin(e) => e.compute_index,
            Self::PhaseEnd(e) => e.compute_index,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated or unknown record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_str(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn read_item(&mut self) -> Option<RecordedItem> {
        Some(RecordedItem {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::PedigreeRefresh,
            1 => PhaseKind::Rebind,
            2 => PhaseKind::SelfProperties,
            _ => PhaseKind::ChildrenProperties,
        })
    }

    fn read_outcome(&mut self) -> Option<EvalOutcome> {
        Some(match self.read_u8()? {
            0 => EvalOutcome::Ready,
            1 => EvalOutcome::Failed,
            _ => EvalOutcome::Deferred,
        })
    }

    fn decode_compute_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ComputeEnd {
            compute_index: self.read_u64()?,
            item: self.read_item()?,
            attempts: self.read_u32()?,
            changed: self.read_u32()?,
            ok: self.read_u8()? != 0,
        })
    }

    fn decode_property_evaluated(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PropertyEvaluated {
            compute_index: self.read_u64()?,
            item: self.read_item()?,
            property: self.read_str()?,
            outcome: self.read_outcome()?,
        })
    }

    fn decode_property_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PropertyChanged {
            compute_index: self.read_u64()?,
            item: self.read_item()?,
            property: self.read_str()?,
            value: self.read_str()?,
        })
    }

    fn decode_cycle_detected(&mut self) -> Option<RecordedEvent> {
        let compute_index = self.read_u64()?;
        let count = self.read_u32()?;
        let mut stuck = Vec::new();
        for _ in 0..count {
            stuck.push(RecordedStuck {
                item: self.read_item()?,
                display_name: self.read_str()?,
                property: self.read_str()?,
            });
        }
        Some(RecordedEvent::CycleDetected {
            compute_index,
            stuck,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_COMPUTE_BEGIN => Some(RecordedEvent::ComputeBegin {
                compute_index: self.read_u64()?,
                item: self.read_item()?,
            }),
            TAG_COMPUTE_END => self.decode_compute_end(),
            TAG_PHASE_BEGIN => Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
                compute_index: self.read_u64()?,
                phase: self.read_phase()?,
            })),
            TAG_PHASE_END => Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
                compute_index: self.read_u64()?,
                phase: self.read_phase()?,
            })),
            TAG_PEDIGREE_REBUILT => Some(RecordedEvent::PedigreeRebuilt {
                compute_index: self.read_u64()?,
                item: self.read_item()?,
            }),
            TAG_PROPERTY_EVALUATED => self.decode_property_evaluated(),
            TAG_PROPERTY_CHANGED => self.decode_property_changed(),
            TAG_CYCLE_DETECTED => self.decode_cycle_detected(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
