// Pitch spelling for MusicXML export

/// Sharp spelling of each pitch class
const PITCH_CLASSES: [(&str, i8); 12] = [
    ("C", 0),
    ("C", 1),
    ("D", 0),
    ("D", 1),
    ("E", 0),
    ("F", 0),
    ("F", 1),
    ("G", 0),
    ("G", 1),
    ("A", 0),
    ("A", 1),
    ("B", 0),
];

/// Convert a MIDI note number to MusicXML (step, alter, octave)
///
/// Black keys are spelled as sharps. MIDI 60 is C4.
///
/// # Examples
/// ```
/// use transcribe_wasm::renderers::musicxml::pitch::midi_to_step_alter_octave;
///
/// assert_eq!(midi_to_step_alter_octave(60), ("C", 0, 4));
/// assert_eq!(midi_to_step_alter_octave(70), ("A", 1, 4));
/// ```
pub fn midi_to_step_alter_octave(midi: u8) -> (&'static str, i8, i8) {
    let (step, alter) = PITCH_CLASSES[(midi % 12) as usize];
    let octave = (midi / 12) as i8 - 1;
    (step, alter, octave)
}
