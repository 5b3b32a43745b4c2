//! Default values for quantization
//!
//! Only `Default` impls read these; the pipeline itself takes everything from
//! `QuantizeConfig`.

/// Fallback tempo when a tempo map is present but empty
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Static split: this pitch and above go to treble (60 = middle C)
pub const DEFAULT_TREBLE_CUTOFF: u8 = 60;

/// Seconds of bass-hand silence after which the treble hand takes over
pub const DEFAULT_HAND_SWITCH_TIMEOUT: f64 = 2.0;

/// Resting position of each hand before it has played anything (G4 / C3)
pub const DEFAULT_TREBLE_ANCHOR: u8 = 67;
pub const DEFAULT_BASS_ANCHOR: u8 = 48;

/// Chord tolerance as a fraction of one quarter note
pub const DEFAULT_CHORD_TOLERANCE: f64 = 0.1;

/// Shortest raw duration considered, in quarter notes (numerator, denominator)
pub const DEFAULT_MIN_DURATION: (u32, u32) = (1, 16);

/// Cap for the last chord of a staff, in quarter notes
pub const DEFAULT_FINAL_CHORD_QUARTERS: u32 = 2;

/// Notes reaching past this many measures are discarded
pub const DEFAULT_MAX_MEASURES: usize = 10_000;

/// Default time signature
pub const DEFAULT_BEATS_PER_MEASURE: u32 = 4;
pub const DEFAULT_BEAT_UNIT: u32 = 4;
