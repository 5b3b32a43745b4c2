//! Note normalization
//!
//! Drops degenerate events (recording why) and splits every note that crosses
//! a bar line into pieces, one per measure. Pieces keep pitch, velocity and
//! origin; their `tie` marks how they chain together. Output is sorted
//! chronologically.

use super::beat_grid::{BeatGrid, TIME_EPSILON};
use super::error::{Discard, DiscardReason};
use crate::models::note_event::MIDI_MAX;
use crate::models::{NoteEvent, TieState};

/// Normalizer output: usable notes plus the ones that were dropped
#[derive(Debug, Clone, Default)]
pub struct NormalizedNotes {
    pub notes: Vec<NoteEvent>,
    pub discards: Vec<Discard>,
}

/// Validate, tag with origin index, split at bar lines and sort
///
/// Notes that end after measure `max_measures - 1` are discarded, which also
/// bounds the number of pieces one note can produce.
pub fn normalize_notes(
    raw: &[NoteEvent],
    grid: &BeatGrid,
    beats_per_measure: u32,
    max_measures: usize,
) -> NormalizedNotes {
    let mut out = NormalizedNotes::default();
    let horizon = grid.measure_end(max_measures.saturating_sub(1), beats_per_measure);

    for (origin, note) in raw.iter().enumerate() {
        let mut note = *note;
        note.origin = origin;
        note.tie = TieState::None;

        if let Some(reason) = check_note(&note) {
            out.discards.push(Discard::new(note, reason));
            continue;
        }
        if note.end_time - horizon > TIME_EPSILON {
            out.discards.push(Discard::new(note, DiscardReason::BeyondMeasureLimit));
            continue;
        }

        split_at_bar_lines(&note, grid, beats_per_measure, &mut out.notes);
    }

    out.notes.sort_by(NoteEvent::chronological);

    log::debug!(
        "normalizer: {} input notes -> {} pieces, {} discarded",
        raw.len(),
        out.notes.len(),
        out.discards.len()
    );
    out
}

fn check_note(note: &NoteEvent) -> Option<DiscardReason> {
    if !(note.start_time.is_finite() && note.end_time.is_finite()) {
        Some(DiscardReason::NonFiniteTime)
    } else if note.end_time <= note.start_time {
        Some(DiscardReason::NonPositiveDuration)
    } else if note.start_time < 0.0 {
        Some(DiscardReason::NegativeStartTime)
    } else if note.pitch > MIDI_MAX {
        Some(DiscardReason::InvalidPitch)
    } else {
        None
    }
}

/// Push one piece per measure the note touches
fn split_at_bar_lines(note: &NoteEvent, grid: &BeatGrid, beats_per_measure: u32, out: &mut Vec<NoteEvent>) {
    let mut piece_start = note.start_time;
    let mut first = true;

    loop {
        let measure = grid.measure_index_at(piece_start, beats_per_measure);
        let boundary = grid.measure_end(measure, beats_per_measure);

        let crosses = note.end_time - boundary > TIME_EPSILON && boundary - piece_start > TIME_EPSILON;
        if !crosses {
            let tie = if first { TieState::None } else { TieState::Stop };
            out.push(note.piece(piece_start, note.end_time, tie));
            return;
        }

        let tie = if first { TieState::Start } else { TieState::Continue };
        out.push(note.piece(piece_start, boundary, tie));
        piece_start = boundary;
        first = false;
    }
}
