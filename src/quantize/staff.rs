//! Staff assignment: which hand plays each note
//!
//! Two policies implement `StaffClassifier`:
//!
//! - `ThresholdClassifier`: `pitch >= cutoff` is treble. Stateless.
//! - `ContinuityClassifier`: each note goes to the hand whose last pitch is
//!   closer, unless the bass hand has been idle longer than the timeout, in
//!   which case the treble hand takes it.
//!
//! `assign_staves` is a left-to-right fold over chronologically sorted notes
//! with the classifier's state threaded through; the continuity policy needs
//! that order because each decision reads the previous ones. Tie
//! continuations of a split note follow the staff of the note's first piece.

use std::collections::HashMap;

use super::config::StaffPolicy;
use crate::models::{Clef, NoteEvent};

/// A staff assignment policy
pub trait StaffClassifier {
    /// Per-run state, empty at the start of a piece
    type State: Default;

    /// Pick a staff for `note` given everything assigned so far
    fn classify(&self, note: &NoteEvent, state: &Self::State) -> Clef;

    /// Record that `note` went to `clef`
    fn observe(&self, _state: &mut Self::State, _note: &NoteEvent, _clef: Clef) {}
}

/// Fixed pitch split
#[derive(Debug, Clone, Copy)]
pub struct ThresholdClassifier {
    pub cutoff: u8,
}

impl StaffClassifier for ThresholdClassifier {
    type State = ();

    fn classify(&self, note: &NoteEvent, _state: &()) -> Clef {
        if note.pitch >= self.cutoff {
            Clef::Treble
        } else {
            Clef::Bass
        }
    }
}

/// Hand-continuity heuristic
#[derive(Debug, Clone, Copy)]
pub struct ContinuityClassifier {
    /// Seconds of bass silence after which treble takes every note
    pub hand_switch_timeout: f64,
    /// Pitch each hand is assumed to rest at before playing (None = infinitely far)
    pub treble_anchor: Option<u8>,
    pub bass_anchor: Option<u8>,
}

/// Last pitch and time played by one hand
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandHistory {
    pub last_pitch: Option<u8>,
    pub last_time: Option<f64>,
}

/// State threaded through the continuity fold
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandState {
    pub treble: HandHistory,
    pub bass: HandHistory,
    /// Onset of the first note; an idle hand counts its silence from here
    pub session_start: Option<f64>,
}

impl HandState {
    fn hand(&self, clef: Clef) -> &HandHistory {
        match clef {
            Clef::Treble => &self.treble,
            Clef::Bass => &self.bass,
        }
    }

    fn hand_mut(&mut self, clef: Clef) -> &mut HandHistory {
        match clef {
            Clef::Treble => &mut self.treble,
            Clef::Bass => &mut self.bass,
        }
    }
}

impl ContinuityClassifier {
    fn distance(&self, note: &NoteEvent, state: &HandState, clef: Clef) -> f64 {
        let anchor = match clef {
            Clef::Treble => self.treble_anchor,
            Clef::Bass => self.bass_anchor,
        };
        state
            .hand(clef)
            .last_pitch
            .or(anchor)
            .map(|p| (note.pitch as f64 - p as f64).abs())
            .unwrap_or(f64::INFINITY)
    }

    fn idle_time(&self, note: &NoteEvent, state: &HandState, clef: Clef) -> f64 {
        let since = state
            .hand(clef)
            .last_time
            .or(state.session_start)
            .unwrap_or(note.start_time);
        note.start_time - since
    }
}

impl StaffClassifier for ContinuityClassifier {
    type State = HandState;

    fn classify(&self, note: &NoteEvent, state: &HandState) -> Clef {
        let treble_distance = self.distance(note, state, Clef::Treble);
        let bass_distance = self.distance(note, state, Clef::Bass);
        let bass_idle = self.idle_time(note, state, Clef::Bass);

        if treble_distance <= bass_distance || bass_idle > self.hand_switch_timeout {
            Clef::Treble
        } else {
            Clef::Bass
        }
    }

    fn observe(&self, state: &mut HandState, note: &NoteEvent, clef: Clef) {
        state.session_start.get_or_insert(note.start_time);
        let hand = state.hand_mut(clef);
        hand.last_pitch = Some(note.pitch);
        hand.last_time = Some(note.start_time);
    }
}

/// Notes partitioned by staff, each list still in chronological order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffSplit {
    pub treble: Vec<NoteEvent>,
    pub bass: Vec<NoteEvent>,
}

impl StaffSplit {
    pub fn notes(&self, clef: Clef) -> &[NoteEvent] {
        match clef {
            Clef::Treble => &self.treble,
            Clef::Bass => &self.bass,
        }
    }

    fn push(&mut self, clef: Clef, note: NoteEvent) {
        match clef {
            Clef::Treble => self.treble.push(note),
            Clef::Bass => self.bass.push(note),
        }
    }
}

/// Assign every note to exactly one staff
///
/// `notes` must be sorted chronologically (the normalizer guarantees it).
pub fn assign_staves<C: StaffClassifier>(classifier: &C, notes: &[NoteEvent]) -> StaffSplit {
    debug_assert!(
        notes.windows(2).all(|w| w[0].start_time <= w[1].start_time),
        "staff assignment needs chronological input"
    );

    let mut heads: HashMap<usize, Clef> = HashMap::new();

    let (_, split) = notes.iter().fold(
        (C::State::default(), StaffSplit::default()),
        |(mut state, mut split), note| {
            let clef = match heads.get(&note.origin) {
                Some(clef) if note.tie.tied_from_previous() => *clef,
                _ => classifier.classify(note, &state),
            };
            if note.tie.tied_to_next() {
                heads.insert(note.origin, clef);
            }
            classifier.observe(&mut state, note, clef);
            split.push(clef, *note);
            (state, split)
        },
    );

    log::debug!(
        "staff assignment: {} treble, {} bass",
        split.treble.len(),
        split.bass.len()
    );
    split
}

/// Dispatch on the configured policy
pub fn assign_with_policy(policy: &StaffPolicy, notes: &[NoteEvent]) -> StaffSplit {
    match *policy {
        StaffPolicy::Threshold { cutoff } => assign_staves(&ThresholdClassifier { cutoff }, notes),
        StaffPolicy::Continuity { hand_switch_timeout, treble_anchor, bass_anchor } => assign_staves(
            &ContinuityClassifier { hand_switch_timeout, treble_anchor, bass_anchor },
            notes,
        ),
    }
}
