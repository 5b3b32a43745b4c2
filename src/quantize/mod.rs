//! Note-to-notation quantization
//!
//! Pipeline stages, each its own module:
//!
//! 1. `beat_grid`: resolve the tempo source into a `BeatGrid`
//! 2. `normalizer`: drop degenerate notes, split at bar lines
//! 3. `staff`: assign each note to treble or bass
//! 4. `chord`: group near-simultaneous notes per staff
//! 5. `duration`: snap chord lengths to the vocabulary
//! 6. `measurization`: place chords in measures and build the `Score`
//!
//! Everything is a pure in-memory transformation; identical input and
//! configuration always produce an identical `Transcription`.

pub mod beat_grid;
pub mod chord;
pub mod config;
pub mod defaults;
pub mod duration;
pub mod error;
pub mod measurization;
pub mod normalizer;
pub mod staff;

use serde::Serialize;

pub use beat_grid::{BeatGrid, TempoChange, TempoSource, TIME_EPSILON};
pub use config::{FinalChordCap, QuantizeConfig, StaffPolicy, TieBreak};
pub use error::{Discard, DiscardReason, QuantizeError, Result};

use crate::models::{Clef, NoteEvent, Score};
use measurization::{assemble_score, measurize_staff, MeasureContext};

/// Pipeline result: the score plus every note that did not make it in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcription {
    pub score: Score,
    pub discards: Vec<Discard>,
}

/// Run the full pipeline against an already resolved grid
pub fn quantize_notes(notes: &[NoteEvent], grid: &BeatGrid, config: &QuantizeConfig) -> Result<Transcription> {
    config.validate()?;
    let beats_per_measure = config.time_signature.beats_per_measure;

    let normalized = normalizer::normalize_notes(notes, grid, beats_per_measure, config.max_measures);
    let mut discards = normalized.discards;

    let split = staff::assign_with_policy(&config.staff_policy, &normalized.notes);

    let ctx = MeasureContext::new(grid, config);
    let treble = measurize_staff(Clef::Treble, split.notes(Clef::Treble), &ctx, &mut discards);
    let bass = measurize_staff(Clef::Bass, split.notes(Clef::Bass), &ctx, &mut discards);

    let score = assemble_score(grid.tempo_bpm(), config.time_signature, treble, bass);

    log::info!(
        "quantized {} notes into {} measures ({} discarded)",
        notes.len(),
        score.measure_count(),
        discards.len()
    );
    Ok(Transcription { score, discards })
}

/// Resolve the beat grid, then quantize
///
/// Fails with `MissingTempo` before any grouping when neither an override nor
/// a usable tempo source is given.
pub fn quantize_with_tempo(
    notes: &[NoteEvent],
    bpm_override: Option<f64>,
    tempo: &TempoSource,
    config: &QuantizeConfig,
) -> Result<Transcription> {
    config.validate()?;
    let grid = BeatGrid::resolve(bpm_override, tempo, config.default_tempo_bpm)?;
    quantize_notes(notes, &grid, config)
}
