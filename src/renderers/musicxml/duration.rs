// Duration helpers for MusicXML export

use crate::models::duration::quarters;
use crate::models::Duration;

/// Undotted note types and their length in quarter notes
const NOTE_TYPES: [(&str, u32, u32); 6] = [
    ("whole", 4, 1),
    ("half", 2, 1),
    ("quarter", 1, 1),
    ("eighth", 1, 2),
    ("16th", 1, 4),
    ("32nd", 1, 8),
];

/// Convert a duration (in quarter notes) to a MusicXML note type and dot count
///
/// Exact lookup: plain values, single dots (x 3/2) and double dots (x 7/4).
/// Returns `None` for anything else; such notes are written without `<type>`.
///
/// # Examples
/// ```
/// use transcribe_wasm::models::duration::quarters;
/// use transcribe_wasm::renderers::musicxml::duration::duration_to_note_type;
///
/// assert_eq!(duration_to_note_type(quarters(1, 1)), Some(("quarter", 0)));
/// assert_eq!(duration_to_note_type(quarters(3, 4)), Some(("eighth", 1)));
/// assert_eq!(duration_to_note_type(quarters(5, 8)), None);
/// ```
pub fn duration_to_note_type(duration: Duration) -> Option<(&'static str, usize)> {
    for (name, numer, denom) in NOTE_TYPES {
        let base = quarters(numer, denom);
        if duration == base {
            return Some((name, 0));
        }
        if duration == base * quarters(3, 2) {
            return Some((name, 1));
        }
        if duration == base * quarters(7, 4) {
            return Some((name, 2));
        }
    }
    None
}

/// Metronome beat-unit name for a time-signature denominator
pub fn beat_unit_name(beat_unit: u32) -> Option<&'static str> {
    match beat_unit {
        1 => Some("whole"),
        2 => Some("half"),
        4 => Some("quarter"),
        8 => Some("eighth"),
        16 => Some("16th"),
        32 => Some("32nd"),
        _ => None,
    }
}
