//! Score skeleton: parts → measures → chords
//!
//! This is what the quantizer hands to a notation renderer. It carries no
//! wall-clock timing beyond each chord's original onset.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::duration::{quarters, Duration};
use super::serde_helpers::duration_str;

/// Staff a part is written on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    /// Both staves in score order
    pub const ALL: [Clef; 2] = [Clef::Treble, Clef::Bass];

    /// MusicXML clef sign and staff line
    pub fn sign_and_line(self) -> (&'static str, u8) {
        match self {
            Clef::Treble => ("G", 2),
            Clef::Bass => ("F", 4),
        }
    }
}

/// Time signature (beats per measure over beat unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats_per_measure: u32,
    pub beat_unit: u32,
}

impl TimeSignature {
    pub fn new(beats_per_measure: u32, beat_unit: u32) -> Self {
        TimeSignature { beats_per_measure, beat_unit }
    }

    /// Quarter notes per beat (1 for x/4, 1/2 for x/8, 2 for x/2)
    pub fn quarters_per_beat(&self) -> Duration {
        quarters(4, self.beat_unit.max(1))
    }

    /// Measure length in quarter notes
    pub fn measure_length(&self) -> Duration {
        self.quarters_per_beat() * self.beats_per_measure
    }

    /// Convert quarter notes per minute to beats of this signature per minute
    pub fn beat_bpm(&self, quarter_bpm: f64) -> f64 {
        quarter_bpm * self.beat_unit as f64 / 4.0
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::new(4, 4)
    }
}

/// Notes judged simultaneous, with a notated duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    /// Onset of the chord's anchor note, in seconds
    pub start_time: f64,
    /// Distinct MIDI pitches, ascending
    pub pitches: BTreeSet<u8>,
    #[serde(with = "duration_str")]
    pub quantized_duration: Duration,
    /// Onset within its measure, in quarter notes
    #[serde(with = "duration_str")]
    pub offset: Duration,
    /// Loudest member velocity
    pub velocity: u8,
    /// Pitches continuing a note split at the previous bar line
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tied_from: BTreeSet<u8>,
    /// Pitches continuing into the next measure
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tied_to: BTreeSet<u8>,
}

impl Chord {
    /// Pitches sounding for the first time here (not tie continuations)
    pub fn onset_pitches(&self) -> impl Iterator<Item = u8> + '_ {
        self.pitches.iter().copied().filter(|p| !self.tied_from.contains(p))
    }
}

/// One bar of a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub index: usize,
    pub chords: Vec<Chord>,
}

impl Measure {
    pub fn new(index: usize) -> Self {
        Measure { index, chords: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

/// One staff of the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub clef: Clef,
    pub measures: Vec<Measure>,
}

impl Part {
    pub fn new(clef: Clef) -> Self {
        Part { clef, measures: Vec::new() }
    }

    /// All chords in measure order
    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        self.measures.iter().flat_map(|m| m.chords.iter())
    }

    /// True when the part holds no chords at all
    pub fn is_empty(&self) -> bool {
        self.measures.iter().all(Measure::is_empty)
    }
}

/// Complete two-staff score skeleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub tempo: f64,
    pub time_signature: TimeSignature,
    pub parts: Vec<Part>,
}

impl Score {
    pub fn part(&self, clef: Clef) -> Option<&Part> {
        self.parts.iter().find(|p| p.clef == clef)
    }

    /// Measure count shared by all parts
    pub fn measure_count(&self) -> usize {
        self.parts.iter().map(|p| p.measures.len()).max().unwrap_or(0)
    }
}
