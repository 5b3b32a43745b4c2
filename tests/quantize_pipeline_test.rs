//! End-to-end tests of the note-to-notation pipeline
//!
//! Drives `quantize_with_tempo` with hand-built note lists and checks the
//! resulting `Score`.

use std::collections::BTreeMap;

use transcribe_wasm::models::duration::{quarters, to_f64};
use transcribe_wasm::quantize::{DiscardReason, QuantizeError, StaffPolicy};
use transcribe_wasm::*;

fn note(pitch: u8, start: f64, end: f64) -> NoteEvent {
    NoteEvent::new(pitch, start, end, 80)
}

fn run(notes: &[NoteEvent], config: &QuantizeConfig) -> Transcription {
    quantize_with_tempo(notes, Some(120.0), &TempoSource::Unknown, config).unwrap()
}

fn treble(score: &Score) -> &Part {
    score.part(Clef::Treble).unwrap()
}

fn bass(score: &Score) -> &Part {
    score.part(Clef::Bass).unwrap()
}

/// Count of each pitch across all chord onsets (ties excluded)
fn onset_counts(score: &Score) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for part in &score.parts {
        for chord in part.chords() {
            for pitch in chord.onset_pitches() {
                *counts.entry(pitch).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Two simultaneous notes become one quarter-note chord
#[test]
fn test_simultaneous_notes_form_one_chord() {
    let result = run(&[note(64, 0.0, 0.5), note(67, 0.0, 0.5)], &QuantizeConfig::default());
    let chords: Vec<&Chord> = treble(&result.score).chords().collect();

    assert_eq!(chords.len(), 1);
    assert_eq!(chords[0].pitches.iter().copied().collect::<Vec<_>>(), vec![64, 67]);
    assert_eq!(chords[0].quantized_duration, quarters(1, 1));
    assert_eq!(chords[0].offset, quarters(0, 1));
    assert!(bass(&result.score).is_empty());
    assert!(result.discards.is_empty());
}

/// A note crossing a bar line is split and tied
#[test]
fn test_note_across_bar_line_is_split_and_tied() {
    let result = run(&[note(50, 1.9, 2.3)], &QuantizeConfig::default());
    let part = bass(&result.score);

    assert_eq!(part.measures.len(), 2);
    assert_eq!(part.measures[0].chords.len(), 1);
    assert_eq!(part.measures[1].chords.len(), 1);

    let head = &part.measures[0].chords[0];
    let tail = &part.measures[1].chords[0];
    assert!(head.tied_to.contains(&50));
    assert!(head.tied_from.is_empty());
    assert!(tail.tied_from.contains(&50));
    assert!(tail.tied_to.is_empty());
    assert_eq!(tail.offset, quarters(0, 1));

    // 0.1 s = 0.2 quarters → sixteenth; 0.3 s = 0.6 quarters → eighth
    assert_eq!(head.quantized_duration, quarters(1, 4));
    assert_eq!(tail.quantized_duration, quarters(1, 2));

    // The tied tail is not a new onset
    assert_eq!(onset_counts(&result.score).get(&50), Some(&1));
}

/// Threshold policy: the cutoff pitch itself is treble
#[test]
fn test_threshold_boundary() {
    let result = run(&[note(59, 0.0, 0.5), note(60, 1.0, 1.5)], &QuantizeConfig::default());
    let treble_pitches: Vec<u8> = treble(&result.score).chords().flat_map(|c| c.pitches.iter().copied()).collect();
    let bass_pitches: Vec<u8> = bass(&result.score).chords().flat_map(|c| c.pitches.iter().copied()).collect();
    assert_eq!(treble_pitches, vec![60]);
    assert_eq!(bass_pitches, vec![59]);
}

/// Continuity policy: a low note right after a high one goes to the bass
#[test]
fn test_continuity_policy_picks_nearer_hand() {
    let config = QuantizeConfig { staff_policy: StaffPolicy::continuity(), ..QuantizeConfig::default() };
    let result = run(&[note(70, 0.0, 0.1), note(40, 0.1, 0.6)], &config);

    let treble_pitches: Vec<u8> = treble(&result.score).chords().flat_map(|c| c.pitches.iter().copied()).collect();
    let bass_pitches: Vec<u8> = bass(&result.score).chords().flat_map(|c| c.pitches.iter().copied()).collect();
    assert_eq!(treble_pitches, vec![70]);
    assert_eq!(bass_pitches, vec![40]);
}

/// Continuity policy: a melodic line that dips below middle C stays in one hand
#[test]
fn test_continuity_policy_keeps_melodic_line_together() {
    let config = QuantizeConfig { staff_policy: StaffPolicy::continuity(), ..QuantizeConfig::default() };
    let notes = vec![note(64, 0.0, 0.5), note(62, 0.5, 1.0), note(59, 1.0, 1.5), note(57, 1.5, 2.0)];
    let result = run(&notes, &config);

    assert_eq!(treble(&result.score).chords().count(), 4);
    assert!(bass(&result.score).is_empty());

    // The threshold policy would have split the same line
    let split = run(&notes, &QuantizeConfig::default());
    assert_eq!(bass(&split.score).chords().count(), 2);
}

/// No notes is a valid, empty score
#[test]
fn test_empty_input() {
    let result = run(&[], &QuantizeConfig::default());
    assert_eq!(result.score.parts.len(), 2);
    assert!(result.score.parts.iter().all(|p| p.is_empty()));
    assert_eq!(result.score.measure_count(), 0);
    assert!(result.discards.is_empty());
}

/// Every valid input pitch shows up exactly once as an onset
#[test]
fn test_every_pitch_is_accounted_for() {
    let notes = vec![
        note(48, 0.0, 1.0),
        note(60, 0.0, 0.5),
        note(64, 0.02, 0.5),
        note(67, 0.5, 2.6),
        note(43, 1.0, 3.0),
        note(72, 3.1, 3.3),
        note(36, 5.0, 5.5),
    ];
    let result = run(&notes, &QuantizeConfig::default());

    let mut expected = BTreeMap::new();
    for n in &notes {
        *expected.entry(n.pitch).or_insert(0) += 1;
    }
    assert_eq!(onset_counts(&result.score), expected);
    assert!(result.discards.is_empty());
}

/// Degenerate notes are reported, the rest survive
#[test]
fn test_degenerate_notes_are_discarded() {
    let notes = vec![
        note(60, 0.0, 0.5),
        note(62, 1.0, 1.0),
        note(64, 1.0, 0.8),
        NoteEvent::new(200, 0.0, 0.5, 80),
        note(65, f64::NAN, 1.0),
        note(67, -1.0, 0.5),
    ];
    let result = run(&notes, &QuantizeConfig::default());

    assert_eq!(treble(&result.score).chords().count(), 1);
    let reasons: Vec<DiscardReason> = result.discards.iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![
            DiscardReason::NonPositiveDuration,
            DiscardReason::NonPositiveDuration,
            DiscardReason::InvalidPitch,
            DiscardReason::NonFiniteTime,
            DiscardReason::NegativeStartTime,
        ]
    );
}

/// All quantized durations come from the vocabulary
#[test]
fn test_durations_stay_in_vocabulary() {
    let config = QuantizeConfig::default();
    let notes: Vec<NoteEvent> = (0..24)
        .map(|i| {
            let start = i as f64 * 0.37;
            note(60 + (i % 12) as u8, start, start + 0.05 + (i as f64 * 0.13) % 1.7)
        })
        .collect();
    let result = run(&notes, &config);

    for part in &result.score.parts {
        for chord in part.chords() {
            assert!(
                config.vocabulary.contains(&chord.quantized_duration),
                "{:?} not in vocabulary",
                chord.quantized_duration
            );
            assert!(chord.offset < config.time_signature.measure_length());
        }
    }
}

/// Very short notes are raised to the minimum before snapping
#[test]
fn test_short_note_gets_minimum_duration() {
    let config = QuantizeConfig { min_duration: quarters(1, 4), ..QuantizeConfig::default() };
    let result = run(&[note(72, 0.0, 0.01)], &config);
    let chord = treble(&result.score).chords().next().unwrap();
    assert_eq!(chord.quantized_duration, quarters(1, 4));
}

/// Dotted vocabulary lets a dotted quarter survive
#[test]
fn test_dotted_vocabulary() {
    let notes = vec![note(67, 0.0, 0.75), note(69, 0.75, 1.0), note(71, 1.0, 1.5)];

    let plain = run(&notes, &QuantizeConfig::default());
    let dotted = run(&notes, &QuantizeConfig::with_dotted_vocabulary());

    let first = |t: &Transcription| treble(&t.score).chords().next().unwrap().quantized_duration;
    assert_ne!(first(&plain), quarters(3, 2));
    assert_eq!(first(&dotted), quarters(3, 2));
}

/// Measure counts agree across parts even when one staff ends early
#[test]
fn test_parts_have_equal_measure_counts() {
    let notes = vec![note(72, 0.0, 0.5), note(40, 0.0, 0.5), note(76, 9.0, 9.5)];
    let result = run(&notes, &QuantizeConfig::default());

    assert_eq!(treble(&result.score).measures.len(), 5);
    assert_eq!(bass(&result.score).measures.len(), 5);
    for part in &result.score.parts {
        let indices: Vec<usize> = part.measures.iter().map(|m| m.index).collect();
        assert_eq!(indices, (0..5).collect::<Vec<_>>());
    }
}

/// Chord onsets and offsets follow the beat grid, not the raw clock
#[test]
fn test_explicit_beat_grid() {
    // Accelerating beats: 0.6 s, then 0.5 s, then 0.4 s
    let beats = vec![0.0, 0.6, 1.1, 1.5, 1.9, 2.3, 2.7, 3.1];
    let notes = vec![note(60, 0.6, 1.1), note(62, 1.9, 2.3)];
    let result = quantize_with_tempo(&notes, None, &TempoSource::Beats(beats), &QuantizeConfig::default()).unwrap();

    let part = treble(&result.score);
    assert_eq!(part.measures.len(), 2);
    assert_eq!(part.measures[0].chords[0].offset, quarters(1, 1));
    assert_eq!(part.measures[1].chords[0].offset, quarters(0, 1));
}

/// A bpm override wins over any tempo source
#[test]
fn test_bpm_override() {
    let result = quantize_with_tempo(
        &[note(60, 0.0, 1.0)],
        Some(60.0),
        &TempoSource::Bpm(200.0),
        &QuantizeConfig::default(),
    )
    .unwrap();
    assert_eq!(result.score.tempo, 60.0);
    let chord = treble(&result.score).chords().next().unwrap();
    assert_eq!(chord.quantized_duration, quarters(1, 1));
}

#[test]
fn test_missing_tempo_is_an_error() {
    let result = quantize_with_tempo(&[note(60, 0.0, 1.0)], None, &TempoSource::Unknown, &QuantizeConfig::default());
    assert!(matches!(result, Err(QuantizeError::MissingTempo)));
}

/// A measure shorter than one offset grid step still places its chord
#[test]
fn test_short_measure_with_coarse_vocabulary() {
    let config = QuantizeConfig {
        vocabulary: vec![quarters(4, 1), quarters(2, 1), quarters(1, 1)],
        time_signature: TimeSignature::new(3, 16),
        ..QuantizeConfig::default()
    };
    let result = run(&[note(60, 1.1, 1.4)], &config);
    let chord = treble(&result.score).chords().next().unwrap();
    assert_eq!(chord.offset, quarters(0, 1));
}

/// Vocabularies whose grid cannot be represented are rejected up front
#[test]
fn test_unrepresentable_vocabulary_is_rejected() {
    let config = QuantizeConfig { vocabulary: vec![quarters(1, 65_536), quarters(1, 65_537)], ..QuantizeConfig::default() };
    let result = quantize_with_tempo(&[note(60, 0.0, 0.5)], Some(120.0), &TempoSource::Unknown, &config);
    assert!(matches!(result, Err(QuantizeError::InvalidConfig(_))));
}

/// Absurdly long or late notes are discarded instead of expanding the score
#[test]
fn test_notes_beyond_measure_limit_are_discarded() {
    let notes = vec![note(60, 0.0, 1e9), note(64, 1e9, 1e9 + 1.0), note(67, 0.0, 0.5)];
    let result = run(&notes, &QuantizeConfig::default());

    assert_eq!(result.score.measure_count(), 1);
    let reasons: Vec<DiscardReason> = result.discards.iter().map(|d| d.reason).collect();
    assert_eq!(reasons, vec![DiscardReason::BeyondMeasureLimit, DiscardReason::BeyondMeasureLimit]);

    let config = QuantizeConfig { max_measures: 2, ..QuantizeConfig::default() };
    let result = run(&[note(62, 3.0, 4.5), note(65, 0.0, 1.0)], &config);
    assert_eq!(result.discards.len(), 1);
    assert_eq!(result.discards[0].note.pitch, 62);
}

/// Same input twice gives byte-identical output
#[test]
fn test_deterministic_output() {
    let notes = vec![
        note(55, 0.0, 0.4),
        note(59, 0.03, 0.4),
        note(62, 0.05, 0.9),
        note(43, 0.5, 2.5),
        note(74, 1.7, 2.2),
    ];
    let config = QuantizeConfig { staff_policy: StaffPolicy::continuity(), ..QuantizeConfig::default() };
    let first = serde_json::to_string(&run(&notes, &config)).unwrap();
    let second = serde_json::to_string(&run(&notes, &config)).unwrap();
    assert_eq!(first, second);
}

/// Config round-trips through JSON and partial JSON fills in defaults
#[test]
fn test_config_json() {
    let config: QuantizeConfig =
        serde_json::from_str(r#"{"staff_policy":{"kind":"continuity"},"vocabulary":["2","1","1/2","3/4"]}"#).unwrap();
    assert_eq!(config.staff_policy, StaffPolicy::continuity());
    assert_eq!(config.vocabulary, vec![quarters(2, 1), quarters(1, 1), quarters(1, 2), quarters(3, 4)]);
    assert_eq!(config.chord_tolerance, QuantizeConfig::default().chord_tolerance);

    let text = serde_json::to_string(&QuantizeConfig::default()).unwrap();
    let back: QuantizeConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, QuantizeConfig::default());
}

/// Chord onset times map back to wall-clock time
#[test]
fn test_chord_start_time_is_preserved() {
    let result = run(&[note(65, 0.52, 1.0)], &QuantizeConfig::default());
    let chord = treble(&result.score).chords().next().unwrap();
    assert_eq!(chord.start_time, 0.52);
    assert_eq!(to_f64(chord.offset), 1.0);
}
