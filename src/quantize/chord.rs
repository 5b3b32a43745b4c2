//! Chord grouping for one staff
//!
//! A single scan over chronologically sorted notes. The first note of a chord
//! is its anchor; later notes join while their onset is within the tolerance
//! of the anchor and in the same measure.

use std::collections::BTreeSet;

use super::beat_grid::{BeatGrid, TIME_EPSILON};
use super::error::{Discard, DiscardReason};
use crate::models::NoteEvent;

/// Notes judged simultaneous, before quantization
#[derive(Debug, Clone, PartialEq)]
pub struct ChordGroup {
    /// Onset of the anchor note
    pub start_time: f64,
    pub measure_index: usize,
    /// Conservative end: earliest member end, capped by the next onset,
    /// the final-chord cap and the bar line
    pub effective_end: f64,
    pub notes: Vec<NoteEvent>,
}

/// Pitch content of a group once duplicates are removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchContent {
    pub pitches: BTreeSet<u8>,
    pub tied_from: BTreeSet<u8>,
    pub tied_to: BTreeSet<u8>,
    pub velocity: u8,
}

impl ChordGroup {
    /// Collapse members into a pitch set, recording repeated pitches as discards
    ///
    /// The first member of a pitch wins; its tie role is the one kept.
    pub fn pitch_content(&self, discards: &mut Vec<Discard>) -> PitchContent {
        let mut content = PitchContent::default();
        for note in &self.notes {
            if !content.pitches.insert(note.pitch) {
                discards.push(Discard::new(*note, DiscardReason::DuplicatePitch));
                continue;
            }
            if note.tie.tied_from_previous() {
                content.tied_from.insert(note.pitch);
            }
            if note.tie.tied_to_next() {
                content.tied_to.insert(note.pitch);
            }
            content.velocity = content.velocity.max(note.velocity);
        }
        content
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.effective_end - self.start_time
    }
}

fn joins(anchor: f64, onset: f64, tolerance_secs: f64) -> bool {
    let gap = onset - anchor;
    gap < tolerance_secs || gap <= TIME_EPSILON
}

/// Group one staff's notes into chords
///
/// `final_cap_secs` bounds the last chord's length when set.
pub fn group_chords(
    notes: &[NoteEvent],
    tolerance_secs: f64,
    grid: &BeatGrid,
    beats_per_measure: u32,
    final_cap_secs: Option<f64>,
) -> Vec<ChordGroup> {
    let mut groups: Vec<ChordGroup> = Vec::new();

    for note in notes {
        let measure_index = grid.measure_index_at(note.start_time, beats_per_measure);
        match groups.last_mut() {
            Some(current)
                if current.measure_index == measure_index
                    && joins(current.start_time, note.start_time, tolerance_secs) =>
            {
                current.effective_end = current.effective_end.min(note.end_time);
                current.notes.push(*note);
            }
            _ => groups.push(ChordGroup {
                start_time: note.start_time,
                measure_index,
                effective_end: note.end_time,
                notes: vec![*note],
            }),
        }
    }

    let onsets: Vec<f64> = groups.iter().map(|g| g.start_time).collect();
    let last = groups.len().saturating_sub(1);
    for (i, group) in groups.iter_mut().enumerate() {
        let mut end = group.effective_end;
        if let Some(next) = onsets.get(i + 1) {
            end = end.min(*next);
        } else if let Some(cap) = final_cap_secs {
            debug_assert_eq!(i, last);
            end = end.min(group.start_time + cap);
        }
        end = end.min(grid.measure_end(group.measure_index, beats_per_measure));
        group.effective_end = end;
    }

    log::debug!("chord grouping: {} notes -> {} chords", notes.len(), groups.len());
    groups
}
