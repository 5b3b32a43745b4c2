//! Standard MIDI File → note events
//!
//! Reads every track, pairs note-on/note-off per channel and key, converts
//! ticks to seconds through the file's tempo map and returns the notes with
//! the tempo information the quantizer needs. Percussion (channel 10) is
//! ignored.

mod parse;
mod timing;

pub use parse::parse_midi;
pub use timing::{TempoSegment, TickClock};

use thiserror::Error;

use crate::models::{NoteEvent, TimeSignature};
use crate::quantize::{TempoChange, TempoSource};

#[derive(Debug, Error)]
pub enum MidiImportError {
    #[error("midi parse error: {0}")]
    Parse(String),
    #[error("unsupported midi timing: {0}")]
    UnsupportedTiming(String),
}

pub type Result<T> = std::result::Result<T, MidiImportError>;

/// Everything the quantizer needs from a MIDI file
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMidi {
    /// Sorted by onset, then pitch
    pub notes: Vec<NoteEvent>,
    /// In quarter notes per minute; empty for SMPTE-timed files
    pub tempo_map: Vec<TempoChange>,
    /// First time signature event, if any
    pub time_signature: Option<TimeSignature>,
}

impl ImportedMidi {
    /// Tempo source for `BeatGrid::resolve`, in beats of `time_signature`
    pub fn tempo_source(&self, time_signature: &TimeSignature) -> TempoSource {
        TempoSource::TempoMap(
            self.tempo_map
                .iter()
                .map(|change| TempoChange {
                    time: change.time,
                    bpm: time_signature.beat_bpm(change.bpm),
                })
                .collect(),
        )
    }
}
