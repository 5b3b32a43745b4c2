//! Measure assembly
//!
//! Turns one staff's notes into a `Part`: chords are grouped, quantized and
//! appended to the measure their anchor falls in. Each part is dense (every
//! index from 0 up to its last measure is present); `assemble_score` then
//! pads both parts to the same length.

use super::beat_grid::BeatGrid;
use super::chord::{group_chords, ChordGroup};
use super::config::QuantizeConfig;
use super::duration::{quantize_duration, raw_duration};
use super::error::Discard;
use crate::models::duration::{common_denominator, quarters, snap_to_grid, to_f64};
use crate::models::{Chord, Clef, Duration, Measure, NoteEvent, Part, Score, TimeSignature};

/// Shared per-run values derived from the grid and config
#[derive(Debug, Clone, Copy)]
pub struct MeasureContext<'a> {
    pub grid: &'a BeatGrid,
    pub config: &'a QuantizeConfig,
    /// Seconds per quarter note
    pub quarter_duration: f64,
    /// Offsets snap to multiples of `1/offset_denominator` quarters
    pub offset_denominator: u32,
}

impl<'a> MeasureContext<'a> {
    pub fn new(grid: &'a BeatGrid, config: &'a QuantizeConfig) -> Self {
        MeasureContext {
            grid,
            config,
            quarter_duration: grid.quarter_duration(&config.time_signature),
            offset_denominator: common_denominator(&config.vocabulary).unwrap_or(1),
        }
    }

    fn time_signature(&self) -> TimeSignature {
        self.config.time_signature
    }

    /// Onset of `group` within its measure, in quarter notes
    fn offset_of(&self, group: &ChordGroup) -> Duration {
        let ts = self.time_signature();
        let first_beat = (group.measure_index * ts.beats_per_measure as usize) as f64;
        let beats_in = self.grid.beat_position(group.start_time) - first_beat;
        let quarters_in = beats_in * to_f64(ts.quarters_per_beat());
        let offset = snap_to_grid(quarters_in, self.offset_denominator);

        // Rounding can push a late onset onto the next bar line; a grid step
        // longer than the measure leaves only the downbeat
        let length = ts.measure_length();
        if offset < length {
            return offset;
        }
        let step = quarters(1, self.offset_denominator.max(1));
        if step < length {
            length - step
        } else {
            Duration::from_integer(0)
        }
    }
}

/// Build the chords for one staff
pub fn measurize_staff(clef: Clef, notes: &[NoteEvent], ctx: &MeasureContext, discards: &mut Vec<Discard>) -> Part {
    let config = ctx.config;
    let tolerance_secs = config.chord_tolerance * ctx.quarter_duration;
    let final_cap_secs = config.final_chord_quarters().map(|q| q * ctx.quarter_duration);

    let groups = group_chords(
        notes,
        tolerance_secs,
        ctx.grid,
        config.time_signature.beats_per_measure,
        final_cap_secs,
    );

    let mut part = Part::new(clef);
    for group in &groups {
        let content = group.pitch_content(discards);
        let raw = raw_duration(group.start_time, group.effective_end, ctx.quarter_duration);
        let chord = Chord {
            start_time: group.start_time,
            pitches: content.pitches,
            quantized_duration: quantize_duration(raw, &config.vocabulary, config.min_duration, config.tie_break),
            offset: ctx.offset_of(group),
            velocity: content.velocity,
            tied_from: content.tied_from,
            tied_to: content.tied_to,
        };

        while part.measures.len() <= group.measure_index {
            let next = part.measures.len();
            part.measures.push(Measure::new(next));
        }
        part.measures[group.measure_index].chords.push(chord);
    }

    log::debug!(
        "measurize {:?}: {} chords in {} measures",
        clef,
        groups.len(),
        part.measures.len()
    );
    part
}

/// Combine both staves into a score with equal measure counts
pub fn assemble_score(tempo: f64, time_signature: TimeSignature, mut treble: Part, mut bass: Part) -> Score {
    let count = treble.measures.len().max(bass.measures.len());
    for part in [&mut treble, &mut bass] {
        pad_part(part, count);
    }
    Score {
        tempo,
        time_signature,
        parts: vec![treble, bass],
    }
}

fn pad_part(part: &mut Part, count: usize) {
    while part.measures.len() < count {
        let next = part.measures.len();
        part.measures.push(Measure::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::config::FinalChordCap;

    fn note(pitch: u8, start: f64, end: f64) -> NoteEvent {
        NoteEvent::new(pitch, start, end, 64)
    }

    #[test]
    fn test_chords_land_in_measures_with_offsets() {
        let grid = BeatGrid::from_bpm(120.0).unwrap();
        let config = QuantizeConfig::default();
        let ctx = MeasureContext::new(&grid, &config);
        let notes = vec![note(64, 0.0, 0.5), note(65, 0.75, 1.0), note(67, 2.5, 3.0)];
        let part = measurize_staff(Clef::Treble, &notes, &ctx, &mut Vec::new());

        assert_eq!(part.measures.len(), 2);
        assert_eq!(part.measures[0].chords.len(), 2);
        assert_eq!(part.measures[0].chords[1].offset, quarters(3, 2));
        assert_eq!(part.measures[0].chords[1].quantized_duration, quarters(1, 2));
        assert_eq!(part.measures[1].index, 1);
        assert_eq!(part.measures[1].chords[0].offset, quarters(1, 1));
    }

    #[test]
    fn test_gap_measures_are_filled() {
        let grid = BeatGrid::from_bpm(120.0).unwrap();
        let config = QuantizeConfig::default();
        let ctx = MeasureContext::new(&grid, &config);
        let part = measurize_staff(Clef::Bass, &[note(40, 0.0, 0.5), note(41, 6.0, 6.5)], &ctx, &mut Vec::new());
        let indices: Vec<usize> = part.measures.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(part.measures[1].is_empty());
        assert!(part.measures[2].is_empty());
    }

    #[test]
    fn test_final_chord_cap_policy() {
        let grid = BeatGrid::from_bpm(120.0).unwrap();
        let notes = vec![note(60, 0.0, 1.9)];

        let config = QuantizeConfig::default();
        let ctx = MeasureContext::new(&grid, &config);
        let part = measurize_staff(Clef::Treble, &notes, &ctx, &mut Vec::new());
        assert_eq!(part.measures[0].chords[0].quantized_duration, quarters(2, 1));

        let config = QuantizeConfig { final_chord: FinalChordCap::MeasureEnd, ..QuantizeConfig::default() };
        let ctx = MeasureContext::new(&grid, &config);
        let part = measurize_staff(Clef::Treble, &notes, &ctx, &mut Vec::new());
        assert_eq!(part.measures[0].chords[0].quantized_duration, quarters(4, 1));
    }

    #[test]
    fn test_offset_in_compound_meter() {
        // 6/8 at 120 eighth-beats per minute: beat = 0.5 s = one eighth
        let grid = BeatGrid::from_bpm(120.0).unwrap();
        let config = QuantizeConfig { time_signature: TimeSignature::new(6, 8), ..QuantizeConfig::default() };
        let ctx = MeasureContext::new(&grid, &config);
        assert_eq!(ctx.quarter_duration, 1.0);
        let part = measurize_staff(Clef::Treble, &[note(72, 1.0, 1.5), note(74, 3.5, 4.0)], &ctx, &mut Vec::new());
        assert_eq!(part.measures[0].chords[0].offset, quarters(1, 1));
        // 3.5 s = beat 7 = measure 1, beat 1
        assert_eq!(part.measures[1].chords[0].offset, quarters(1, 2));
    }

    #[test]
    fn test_offset_when_grid_step_exceeds_measure() {
        // 3/16 bar is 3/4 quarter; a {4, 2, 1} vocabulary snaps offsets to whole quarters
        let grid = BeatGrid::from_bpm(120.0).unwrap();
        let config = QuantizeConfig {
            vocabulary: vec![quarters(4, 1), quarters(2, 1), quarters(1, 1)],
            time_signature: TimeSignature::new(3, 16),
            ..QuantizeConfig::default()
        };
        assert!(config.validate().is_ok());
        let ctx = MeasureContext::new(&grid, &config);
        let part = measurize_staff(Clef::Treble, &[note(60, 1.1, 1.4)], &ctx, &mut Vec::new());

        let chord = part.chords().next().unwrap();
        assert_eq!(chord.offset, quarters(0, 1));
        assert!(chord.offset < config.time_signature.measure_length());
    }

    #[test]
    fn test_assemble_pads_parts() {
        let mut treble = Part::new(Clef::Treble);
        treble.measures = (0..3).map(Measure::new).collect();
        let score = assemble_score(120.0, TimeSignature::default(), treble, Part::new(Clef::Bass));
        assert_eq!(score.parts[0].measures.len(), 3);
        assert_eq!(score.parts[1].measures.len(), 3);
        assert_eq!(score.parts[1].measures[2].index, 2);
        assert_eq!(score.measure_count(), 3);
    }
}
