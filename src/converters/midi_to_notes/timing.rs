use midly::{MetaMessage, Smf, Timing, TrackEventKind};

use super::{MidiImportError, Result};
use crate::quantize::TempoChange;

/// SMF default tempo: 120 BPM
const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// Stretch of constant tempo starting at `tick`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub tick: u64,
    pub seconds: f64,
    pub micros_per_quarter: u32,
}

/// Converts absolute ticks to seconds
#[derive(Debug, Clone, PartialEq)]
pub enum TickClock {
    /// Ticks per quarter note, with every tempo change applied
    Metrical {
        ticks_per_quarter: u16,
        segments: Vec<TempoSegment>,
    },
    /// Fixed SMPTE rate
    Timecode { seconds_per_tick: f64 },
}

impl TickClock {
    pub fn from_smf(smf: &Smf) -> Result<Self> {
        match smf.header.timing {
            Timing::Metrical(tpq) => {
                let ticks_per_quarter = tpq.as_int();
                if ticks_per_quarter == 0 {
                    return Err(MidiImportError::UnsupportedTiming("0 ticks per quarter note".into()));
                }
                let changes = collect_tempo_changes(smf);
                if changes.is_empty() {
                    log::debug!("midi import: no tempo events, assuming 120 quarter notes per minute");
                }
                Ok(TickClock::Metrical {
                    ticks_per_quarter,
                    segments: build_segments(&changes, ticks_per_quarter),
                })
            }
            Timing::Timecode(fps, subframes) => {
                if subframes == 0 {
                    return Err(MidiImportError::UnsupportedTiming("0 subframes per frame".into()));
                }
                let ticks_per_second = fps.as_f32() as f64 * subframes as f64;
                Ok(TickClock::Timecode { seconds_per_tick: 1.0 / ticks_per_second })
            }
        }
    }

    /// Seconds from the start of the file at `tick`
    pub fn seconds_at(&self, tick: u64) -> f64 {
        match self {
            TickClock::Metrical { ticks_per_quarter, segments, .. } => {
                let idx = segments.partition_point(|s| s.tick <= tick).saturating_sub(1);
                match segments.get(idx) {
                    Some(seg) => seg.seconds + ticks_to_seconds(tick - seg.tick, seg.micros_per_quarter, *ticks_per_quarter),
                    None => ticks_to_seconds(tick, DEFAULT_MICROS_PER_QUARTER, *ticks_per_quarter),
                }
            }
            TickClock::Timecode { seconds_per_tick } => tick as f64 * seconds_per_tick,
        }
    }

    /// Tempo map in seconds and quarter notes per minute
    ///
    /// A metrical file without tempo events runs at the SMF default of 120;
    /// SMPTE-timed files have no tempo and yield an empty map.
    pub fn tempo_map(&self) -> Vec<TempoChange> {
        match self {
            TickClock::Metrical { segments, .. } => segments
                .iter()
                .map(|s| TempoChange {
                    time: s.seconds,
                    bpm: 60_000_000.0 / s.micros_per_quarter as f64,
                })
                .collect(),
            TickClock::Timecode { .. } => Vec::new(),
        }
    }
}

fn ticks_to_seconds(ticks: u64, micros_per_quarter: u32, ticks_per_quarter: u16) -> f64 {
    ticks as f64 * micros_per_quarter as f64 / 1_000_000.0 / ticks_per_quarter as f64
}

/// All tempo events across every track as (absolute tick, µs per quarter)
fn collect_tempo_changes(smf: &Smf) -> Vec<(u64, u32)> {
    let mut changes = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Meta(MetaMessage::Tempo(mpq)) = event.kind {
                let mpq = mpq.as_int();
                if mpq > 0 {
                    changes.push((tick, mpq));
                }
            }
        }
    }
    // Stable: at equal ticks the later event (in track order) wins below
    changes.sort_by_key(|(tick, _)| *tick);
    changes
}

fn build_segments(changes: &[(u64, u32)], ticks_per_quarter: u16) -> Vec<TempoSegment> {
    let mut segments = vec![TempoSegment {
        tick: 0,
        seconds: 0.0,
        micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
    }];

    for &(tick, mpq) in changes {
        let Some(last) = segments.last_mut() else { break };
        if last.tick == tick {
            last.micros_per_quarter = mpq;
            continue;
        }
        let seconds = last.seconds + ticks_to_seconds(tick - last.tick, last.micros_per_quarter, ticks_per_quarter);
        segments.push(TempoSegment { tick, seconds, micros_per_quarter: mpq });
    }
    segments
}
