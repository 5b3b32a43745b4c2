//! Beat grid: maps wall-clock seconds to beats and measures
//!
//! A grid is either uniform (derived from one BPM) or an explicit list of beat
//! timestamps. Explicit grids are extended past their last beat using the last
//! interval, so any note time has a beat. Times before the first beat clamp
//! to beat 0.
//!
//! All lookups add `TIME_EPSILON` before flooring: a note piece that starts
//! exactly on a computed bar line belongs to the later measure even when the
//! float arithmetic lands a hair short of it.

use serde::{Deserialize, Serialize};

use super::error::{QuantizeError, Result};
use crate::models::duration::to_f64;
use crate::models::TimeSignature;

/// Fixed tolerance for comparing times, in seconds
pub const TIME_EPSILON: f64 = 1e-9;

/// One entry of a tempo map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    /// Seconds from the start of the performance
    pub time: f64,
    pub bpm: f64,
}

/// Tempo information supplied with the note events
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TempoSource {
    /// Fixed tempo
    Bpm(f64),
    /// Explicit beat timestamps in seconds
    Beats(Vec<f64>),
    /// Tempo changes; the first entry is used
    TempoMap(Vec<TempoChange>),
    /// Nothing known
    #[default]
    Unknown,
}

/// Resolved beat grid
#[derive(Debug, Clone, PartialEq)]
pub enum BeatGrid {
    Uniform { beat_duration: f64 },
    Explicit { beats: Vec<f64> },
}

impl BeatGrid {
    /// Uniform grid starting at time zero
    pub fn from_bpm(bpm: f64) -> Result<Self> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(QuantizeError::InvalidTempo(bpm));
        }
        Ok(BeatGrid::Uniform { beat_duration: 60.0 / bpm })
    }

    /// Grid from explicit beat timestamps (at least two, strictly increasing)
    pub fn from_beats(beats: Vec<f64>) -> Result<Self> {
        if beats.len() < 2 {
            return Err(QuantizeError::InvalidBeatGrid(format!(
                "need at least 2 beats, got {}",
                beats.len()
            )));
        }
        if let Some(bad) = beats.iter().find(|b| !b.is_finite()) {
            return Err(QuantizeError::InvalidBeatGrid(format!("beat time {} is not finite", bad)));
        }
        if let Some(pair) = beats.windows(2).find(|w| w[1] - w[0] <= TIME_EPSILON) {
            return Err(QuantizeError::InvalidBeatGrid(format!(
                "beats not strictly increasing at {} -> {}",
                pair[0], pair[1]
            )));
        }
        Ok(BeatGrid::Explicit { beats })
    }

    /// Pick a grid from an optional BPM override and the supplied tempo source
    ///
    /// Order: override, then the source. An empty tempo map falls back to
    /// `default_bpm`; `TempoSource::Unknown` without override is `MissingTempo`.
    pub fn resolve(bpm_override: Option<f64>, source: &TempoSource, default_bpm: f64) -> Result<Self> {
        if let Some(bpm) = bpm_override {
            log::debug!("beat grid: using BPM override {}", bpm);
            return BeatGrid::from_bpm(bpm);
        }
        match source {
            TempoSource::Bpm(bpm) => BeatGrid::from_bpm(*bpm),
            TempoSource::Beats(beats) => BeatGrid::from_beats(beats.clone()),
            TempoSource::TempoMap(changes) => match changes.first() {
                Some(first) => {
                    if changes.len() > 1 {
                        log::info!(
                            "beat grid: {} tempo changes, using first ({} BPM)",
                            changes.len(),
                            first.bpm
                        );
                    }
                    BeatGrid::from_bpm(first.bpm)
                }
                None => {
                    log::info!("beat grid: empty tempo map, defaulting to {} BPM", default_bpm);
                    BeatGrid::from_bpm(default_bpm)
                }
            },
            TempoSource::Unknown => Err(QuantizeError::MissingTempo),
        }
    }

    /// Representative tempo (mean beat interval for explicit grids)
    pub fn tempo_bpm(&self) -> f64 {
        60.0 / self.mean_beat_duration()
    }

    fn mean_beat_duration(&self) -> f64 {
        match self {
            BeatGrid::Uniform { beat_duration } => *beat_duration,
            BeatGrid::Explicit { beats } => {
                let n = beats.len();
                (beats[n - 1] - beats[0]) / (n - 1) as f64
            }
        }
    }

    /// Seconds per quarter note under the representative tempo
    pub fn quarter_duration(&self, time_signature: &TimeSignature) -> f64 {
        self.mean_beat_duration() / to_f64(time_signature.quarters_per_beat())
    }

    /// Timestamp of beat `index`, extrapolated past the end of an explicit grid
    pub fn beat_time(&self, index: usize) -> f64 {
        match self {
            BeatGrid::Uniform { beat_duration } => index as f64 * beat_duration,
            BeatGrid::Explicit { beats } => {
                if let Some(t) = beats.get(index) {
                    return *t;
                }
                let n = beats.len();
                let last = beats[n - 1];
                let interval = last - beats[n - 2];
                last + (index - (n - 1)) as f64 * interval
            }
        }
    }

    /// Index of the greatest beat at or before `time` (0 for earlier times)
    pub fn beat_index_at(&self, time: f64) -> usize {
        let nudged = time + TIME_EPSILON;
        match self {
            BeatGrid::Uniform { beat_duration } => {
                if nudged <= 0.0 {
                    log::debug!("beat grid: time {:.3} precedes first beat, clamping", time);
                    return 0;
                }
                (nudged / beat_duration).floor() as usize
            }
            BeatGrid::Explicit { beats } => {
                let n = beats.len();
                let last = beats[n - 1];
                if nudged >= last {
                    let interval = last - beats[n - 2];
                    return n - 1 + ((nudged - last) / interval).floor() as usize;
                }
                let after = beats.partition_point(|b| *b <= nudged);
                if after == 0 {
                    log::debug!("beat grid: time {:.3} precedes first beat, clamping", time);
                    0
                } else {
                    after - 1
                }
            }
        }
    }

    /// Fractional beat position of `time` (never negative)
    pub fn beat_position(&self, time: f64) -> f64 {
        let index = self.beat_index_at(time);
        let start = self.beat_time(index);
        let next = self.beat_time(index + 1);
        let fraction = ((time - start) / (next - start)).clamp(0.0, 1.0);
        index as f64 + fraction
    }

    /// Measure containing `time`
    pub fn measure_index_at(&self, time: f64, beats_per_measure: u32) -> usize {
        self.beat_index_at(time) / beats_per_measure.max(1) as usize
    }

    /// Start time of measure `index`
    pub fn measure_start(&self, index: usize, beats_per_measure: u32) -> f64 {
        self.beat_time(index * beats_per_measure.max(1) as usize)
    }

    /// End time (exclusive) of measure `index`
    pub fn measure_end(&self, index: usize, beats_per_measure: u32) -> f64 {
        self.measure_start(index + 1, beats_per_measure)
    }
}
