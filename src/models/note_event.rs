//! Timestamped note events as delivered by a transcription front end

use serde::{Deserialize, Serialize};

/// Highest valid MIDI pitch / velocity
pub const MIDI_MAX: u8 = 127;

/// Tie role of a note piece produced by bar-line splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieState {
    /// Unsplit note
    #[default]
    None,
    /// First piece of a split note (tied to the next piece)
    Start,
    /// Middle piece (tied on both sides)
    Continue,
    /// Last piece (tied from the previous piece)
    Stop,
}

impl TieState {
    /// Piece continues a note begun in an earlier measure
    pub fn tied_from_previous(self) -> bool {
        matches!(self, TieState::Continue | TieState::Stop)
    }

    /// Piece continues into the next measure
    pub fn tied_to_next(self) -> bool {
        matches!(self, TieState::Start | TieState::Continue)
    }
}

/// A pitched sound with onset/offset in seconds
///
/// `origin` is the index of the input event this one derives from; both pieces
/// of a bar-line split share it. It is assigned by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub start_time: f64,
    pub end_time: f64,
    pub velocity: u8,
    #[serde(default)]
    pub origin: usize,
    #[serde(default)]
    pub tie: TieState,
}

impl NoteEvent {
    pub fn new(pitch: u8, start_time: f64, end_time: f64, velocity: u8) -> Self {
        NoteEvent {
            pitch,
            start_time,
            end_time,
            velocity,
            origin: 0,
            tie: TieState::None,
        }
    }

    /// Length in seconds (may be zero or negative for degenerate input)
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Copy of this note restricted to `[start, end)` with the given tie role
    pub fn piece(&self, start_time: f64, end_time: f64, tie: TieState) -> Self {
        NoteEvent {
            start_time,
            end_time,
            tie,
            ..*self
        }
    }

    /// Chronological order, pitch as secondary key, origin last
    pub fn chronological(a: &NoteEvent, b: &NoteEvent) -> std::cmp::Ordering {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.pitch.cmp(&b.pitch))
            .then(a.origin.cmp(&b.origin))
    }
}
