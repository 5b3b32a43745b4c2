//! Error and discard types for the quantization pipeline
//!
//! Fatal problems (no tempo, broken grid, bad configuration) are
//! `QuantizeError`s. Per-note problems never abort the run: the note is
//! recorded as a `Discard` so nothing disappears without a reason.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::NoteEvent;

/// Fatal pipeline errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantizeError {
    /// No BPM, beat grid or tempo map available
    #[error("no tempo or beat grid could be derived from the input")]
    MissingTempo,

    /// BPM is zero, negative or not finite
    #[error("invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    /// Beat timestamps are unusable
    #[error("invalid beat grid: {0}")]
    InvalidBeatGrid(String),

    /// Configuration value out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, QuantizeError>;

/// Why a note was left out of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// `end_time <= start_time`
    NonPositiveDuration,
    /// Start or end is NaN or infinite
    NonFiniteTime,
    /// Starts before time zero
    NegativeStartTime,
    /// Pitch above 127
    InvalidPitch,
    /// Ends after the last measure the score may hold
    BeyondMeasureLimit,
    /// Same pitch already present in the chord it was grouped into
    DuplicatePitch,
}

/// A note that did not make it into any chord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discard {
    pub note: NoteEvent,
    pub reason: DiscardReason,
}

impl Discard {
    pub fn new(note: NoteEvent, reason: DiscardReason) -> Self {
        log::warn!(
            "discarding note pitch={} start={:.3} end={:.3}: {:?}",
            note.pitch,
            note.start_time,
            note.end_time,
            reason
        );
        Discard { note, reason }
    }
}
