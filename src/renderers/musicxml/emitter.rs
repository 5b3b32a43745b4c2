//! MusicXML emitter - turns a quantized `Score` into a partwise document
//!
//! One `<part>` per staff. Inside a measure, chords are written in offset
//! order; a chord's written length is its quantized duration clipped to the
//! next onset and the bar line, so every measure adds up exactly. Chords that
//! snapped to the same offset are merged into one note group.

use std::collections::BTreeSet;

use super::builder::{assemble_document, MusicXmlBuilder, NoteSpec, PartAttributes};
use super::{RenderError, Result};
use super::helpers::lcm;
use crate::models::duration::format_duration;
use crate::models::{Chord, Clef, Duration, Measure, Part, Score};

/// Upper bound on `<divisions>`; finer grids mean a broken vocabulary
const MAX_DIVISIONS: u32 = 16_384;

/// Emit a complete MusicXML document for `score`
pub fn emit_musicxml(score: &Score, title: Option<&str>) -> Result<String> {
    let measure_length = score.time_signature.measure_length();
    if *measure_length.numer() == 0 {
        return Err(RenderError::UnsupportedDuration("zero-length measure".into()));
    }

    let divisions = score_divisions(score, measure_length)?;
    let measure_count = score.measure_count().max(1);
    crate::musicxml_log!(
        "emitting {} parts, {} measures, divisions={}",
        score.parts.len(),
        measure_count,
        divisions
    );

    let mut parts = Vec::new();
    for (index, clef) in Clef::ALL.iter().enumerate() {
        let attrs = PartAttributes {
            clef: *clef,
            time_signature: score.time_signature,
            tempo: score.tempo,
        };
        let body = emit_part(score.part(*clef), &attrs, divisions, measure_count, measure_length, index + 1);
        parts.push((format!("P{}", index + 1), part_name(*clef).to_string(), body));
    }

    Ok(assemble_document(title, &parts))
}

fn part_name(clef: Clef) -> &'static str {
    match clef {
        Clef::Treble => "Treble",
        Clef::Bass => "Bass",
    }
}

/// LCM of every denominator that can appear in a written duration
fn score_divisions(score: &Score, measure_length: Duration) -> Result<u32> {
    let mut values: Vec<Duration> = vec![measure_length];
    for chord in score.parts.iter().flat_map(Part::chords) {
        values.push(chord.quantized_duration);
        values.push(chord.offset);
    }

    let mut divisions: u64 = 1;
    for value in &values {
        divisions = lcm(divisions, *value.denom() as u64);
        if divisions > MAX_DIVISIONS as u64 {
            return Err(RenderError::UnsupportedDuration(format!(
                "{} needs more than {} divisions per quarter",
                format_duration(*value),
                MAX_DIVISIONS
            )));
        }
    }
    Ok(divisions as u32)
}

fn emit_part(
    part: Option<&Part>,
    attrs: &PartAttributes,
    divisions: u32,
    measure_count: usize,
    measure_length: Duration,
    part_number: usize,
) -> String {
    let mut builder = MusicXmlBuilder::new(divisions);
    for index in 0..measure_count {
        builder.start_measure(Some(attrs));
        match part.and_then(|p| p.measures.get(index)) {
            Some(measure) if !measure.is_empty() => emit_measure(&mut builder, measure, measure_length),
            _ => builder.write_measure_rest(measure_length),
        }
        builder.end_measure();
    }
    builder.finish_part(&format!("P{}", part_number))
}

/// Chords sharing one written onset
struct Slot<'a> {
    offset: Duration,
    chords: Vec<&'a Chord>,
}

fn slots(measure: &Measure, measure_length: Duration) -> Vec<Slot<'_>> {
    let mut slots: Vec<Slot> = Vec::new();
    for chord in &measure.chords {
        let offset = chord.offset.min(measure_length);
        match slots.last_mut() {
            Some(slot) if slot.offset >= offset => slot.chords.push(chord),
            _ => slots.push(Slot { offset, chords: vec![chord] }),
        }
    }
    slots
}

fn emit_measure(builder: &mut MusicXmlBuilder, measure: &Measure, measure_length: Duration) {
    let slots = slots(measure, measure_length);
    let mut cursor = Duration::from_integer(0);

    for (i, slot) in slots.iter().enumerate() {
        if slot.offset >= measure_length {
            crate::musicxml_log!("measure {}: chord at bar line dropped from layout", measure.index);
            continue;
        }
        if slot.offset > cursor {
            builder.write_rest(slot.offset - cursor);
        }

        let limit = slots
            .get(i + 1)
            .map(|next| next.offset.min(measure_length))
            .unwrap_or(measure_length);
        let longest = slot
            .chords
            .iter()
            .map(|c| c.quantized_duration)
            .max()
            .unwrap_or(limit - slot.offset);
        let written = longest.min(limit - slot.offset);

        emit_slot(builder, slot, written);
        cursor = slot.offset + written;
    }

    if cursor < measure_length {
        builder.write_rest(measure_length - cursor);
    }
}

fn emit_slot(builder: &mut MusicXmlBuilder, slot: &Slot, written: Duration) {
    let mut pitches = BTreeSet::new();
    let mut tied_from = BTreeSet::new();
    let mut tied_to = BTreeSet::new();
    let mut velocity = 0u8;
    for chord in &slot.chords {
        pitches.extend(chord.pitches.iter().copied());
        tied_from.extend(chord.tied_from.iter().copied());
        tied_to.extend(chord.tied_to.iter().copied());
        velocity = velocity.max(chord.velocity);
    }

    for (n, midi) in pitches.iter().enumerate() {
        builder.write_note(&NoteSpec {
            midi: *midi,
            duration: written,
            chord: n > 0,
            tie_stop: tied_from.contains(midi),
            tie_start: tied_to.contains(midi),
            velocity,
        });
    }
}
