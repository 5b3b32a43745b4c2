//! Quantization configuration
//!
//! Every threshold the pipeline uses lives here. Deserializes from partial
//! JSON: missing fields take their defaults.

use serde::{Deserialize, Serialize};

use super::defaults::*;
use super::error::{QuantizeError, Result};
use crate::models::duration::{common_denominator, dotted_vocabulary, quarters, standard_vocabulary, to_f64};
use crate::models::serde_helpers::{duration_str, duration_vec_str};
use crate::models::{Duration, TimeSignature};

/// Finest offset grid (1/n quarter) a vocabulary may imply
pub const MAX_GRID_DENOMINATOR: u32 = 16_384;

/// Longest vocabulary entry, in quarter notes
pub const MAX_VOCABULARY_QUARTERS: u32 = 64;

/// Upper bound on `beats_per_measure`
pub const MAX_BEATS_PER_MEASURE: u32 = 64;

/// Upper bound on `max_measures`
pub const MAX_SCORE_MEASURES: usize = 1_000_000;

/// How notes are split between the two staves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaffPolicy {
    /// `pitch >= cutoff` → treble, else bass
    Threshold {
        #[serde(default = "default_cutoff")]
        cutoff: u8,
    },
    /// Hand-continuity heuristic (nearest previous pitch, with idle timeout)
    Continuity {
        #[serde(default = "default_hand_switch_timeout")]
        hand_switch_timeout: f64,
        #[serde(default = "default_treble_anchor")]
        treble_anchor: Option<u8>,
        #[serde(default = "default_bass_anchor")]
        bass_anchor: Option<u8>,
    },
}

impl StaffPolicy {
    pub fn threshold() -> Self {
        StaffPolicy::Threshold { cutoff: DEFAULT_TREBLE_CUTOFF }
    }

    pub fn continuity() -> Self {
        StaffPolicy::Continuity {
            hand_switch_timeout: DEFAULT_HAND_SWITCH_TIMEOUT,
            treble_anchor: Some(DEFAULT_TREBLE_ANCHOR),
            bass_anchor: Some(DEFAULT_BASS_ANCHOR),
        }
    }
}

impl Default for StaffPolicy {
    fn default() -> Self {
        StaffPolicy::threshold()
    }
}

fn default_cutoff() -> u8 {
    DEFAULT_TREBLE_CUTOFF
}

fn default_hand_switch_timeout() -> f64 {
    DEFAULT_HAND_SWITCH_TIMEOUT
}

fn default_treble_anchor() -> Option<u8> {
    Some(DEFAULT_TREBLE_ANCHOR)
}

fn default_bass_anchor() -> Option<u8> {
    Some(DEFAULT_BASS_ANCHOR)
}

/// Which vocabulary entry wins when a raw duration is equidistant from two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    PreferLonger,
    PreferShorter,
    /// First minimal entry in vocabulary order
    VocabularyOrder,
}

/// Effective-end cap for the last chord of a staff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FinalChordCap {
    /// At most this many quarter notes
    Quarters(#[serde(with = "duration_str")] Duration),
    /// Only the measure boundary limits it
    MeasureEnd,
}

impl Default for FinalChordCap {
    fn default() -> Self {
        FinalChordCap::Quarters(quarters(DEFAULT_FINAL_CHORD_QUARTERS, 1))
    }
}

/// All tunables of the note-to-notation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    pub staff_policy: StaffPolicy,
    /// Onsets closer than this fraction of a quarter note share a chord
    pub chord_tolerance: f64,
    #[serde(with = "duration_vec_str")]
    pub vocabulary: Vec<Duration>,
    /// Raw durations below this are raised to it before snapping
    #[serde(with = "duration_str")]
    pub min_duration: Duration,
    pub tie_break: TieBreak,
    pub final_chord: FinalChordCap,
    pub time_signature: TimeSignature,
    /// Used when the tempo source is an empty tempo map
    pub default_tempo_bpm: f64,
    /// Score length limit; notes ending beyond it are discarded
    pub max_measures: usize,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        QuantizeConfig {
            staff_policy: StaffPolicy::default(),
            chord_tolerance: DEFAULT_CHORD_TOLERANCE,
            vocabulary: standard_vocabulary(),
            min_duration: quarters(DEFAULT_MIN_DURATION.0, DEFAULT_MIN_DURATION.1),
            tie_break: TieBreak::default(),
            final_chord: FinalChordCap::default(),
            time_signature: TimeSignature::new(DEFAULT_BEATS_PER_MEASURE, DEFAULT_BEAT_UNIT),
            default_tempo_bpm: DEFAULT_TEMPO_BPM,
            max_measures: DEFAULT_MAX_MEASURES,
        }
    }
}

impl QuantizeConfig {
    /// Default configuration with dotted values in the vocabulary
    pub fn with_dotted_vocabulary() -> Self {
        QuantizeConfig {
            vocabulary: dotted_vocabulary(),
            ..QuantizeConfig::default()
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.is_empty() {
            return Err(QuantizeError::InvalidConfig("duration vocabulary is empty".into()));
        }
        if self.vocabulary.iter().any(|d| *d.numer() == 0) {
            return Err(QuantizeError::InvalidConfig("vocabulary contains a zero duration".into()));
        }
        if self.vocabulary.iter().any(|d| *d > quarters(MAX_VOCABULARY_QUARTERS, 1)) {
            return Err(QuantizeError::InvalidConfig(format!(
                "vocabulary entries must not exceed {} quarter notes",
                MAX_VOCABULARY_QUARTERS
            )));
        }
        match common_denominator(&self.vocabulary) {
            Some(denom) if denom <= MAX_GRID_DENOMINATOR => {}
            _ => {
                return Err(QuantizeError::InvalidConfig(format!(
                    "vocabulary needs a grid finer than 1/{} quarter",
                    MAX_GRID_DENOMINATOR
                )))
            }
        }
        if *self.min_duration.numer() == 0 {
            return Err(QuantizeError::InvalidConfig("minimum duration must be positive".into()));
        }
        if !(self.chord_tolerance.is_finite() && self.chord_tolerance >= 0.0) {
            return Err(QuantizeError::InvalidConfig(format!(
                "chord tolerance {} must be a non-negative number",
                self.chord_tolerance
            )));
        }
        let ts = self.time_signature;
        if ts.beats_per_measure == 0 || ts.beats_per_measure > MAX_BEATS_PER_MEASURE {
            return Err(QuantizeError::InvalidConfig(format!(
                "beats per measure must be between 1 and {}",
                MAX_BEATS_PER_MEASURE
            )));
        }
        if ts.beat_unit == 0 || !ts.beat_unit.is_power_of_two() || ts.beat_unit > 64 {
            return Err(QuantizeError::InvalidConfig(format!(
                "beat unit {} is not a note value",
                ts.beat_unit
            )));
        }
        if !(self.default_tempo_bpm.is_finite() && self.default_tempo_bpm > 0.0) {
            return Err(QuantizeError::InvalidConfig(format!(
                "default tempo {} must be positive",
                self.default_tempo_bpm
            )));
        }
        if self.max_measures == 0 || self.max_measures > MAX_SCORE_MEASURES {
            return Err(QuantizeError::InvalidConfig(format!(
                "max measures must be between 1 and {}",
                MAX_SCORE_MEASURES
            )));
        }
        if let StaffPolicy::Continuity { hand_switch_timeout, treble_anchor, bass_anchor } = self.staff_policy {
            if !(hand_switch_timeout.is_finite() && hand_switch_timeout >= 0.0) {
                return Err(QuantizeError::InvalidConfig(format!(
                    "hand switch timeout {} must be non-negative",
                    hand_switch_timeout
                )));
            }
            if treble_anchor.into_iter().chain(bass_anchor).any(|p| p > 127) {
                return Err(QuantizeError::InvalidConfig("anchor pitch above 127".into()));
            }
        }
        if let FinalChordCap::Quarters(cap) = self.final_chord {
            if *cap.numer() == 0 {
                return Err(QuantizeError::InvalidConfig("final chord cap must be positive".into()));
            }
        }
        Ok(())
    }

    /// Final-chord cap in quarter notes, if any
    pub fn final_chord_quarters(&self) -> Option<f64> {
        match self.final_chord {
            FinalChordCap::Quarters(cap) => Some(to_f64(cap)),
            FinalChordCap::MeasureEnd => None,
        }
    }
}
