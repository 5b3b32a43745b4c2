//! Format converters
//!
//! `midi_to_notes` reads Standard MIDI Files. `midi_to_musicxml` runs the
//! whole chain: MIDI → note events → quantized score → MusicXML.

pub mod midi_to_notes;

use thiserror::Error;

use crate::quantize::{quantize_with_tempo, QuantizeConfig, QuantizeError, Transcription};
use crate::renderers::{emit_musicxml, RenderError};
use midi_to_notes::{parse_midi, MidiImportError};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Import(#[from] MidiImportError),
    #[error(transparent)]
    Quantize(#[from] QuantizeError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Options for a MIDI → MusicXML run
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Quarter notes per minute, like MIDI tempo; overrides the file's tempo
    pub bpm_override: Option<f64>,
    pub title: Option<String>,
    pub config: QuantizeConfig,
    /// Use the file's first time signature instead of `config.time_signature`
    pub time_signature_from_file: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        TranscribeOptions {
            bpm_override: None,
            title: None,
            config: QuantizeConfig::default(),
            time_signature_from_file: true,
        }
    }
}

/// Parse and quantize a MIDI file
pub fn transcribe_midi(bytes: &[u8], options: &TranscribeOptions) -> Result<Transcription, ConvertError> {
    let imported = parse_midi(bytes)?;

    let mut config = options.config.clone();
    if options.time_signature_from_file {
        if let Some(ts) = imported.time_signature {
            log::debug!("using time signature {}/{} from file", ts.beats_per_measure, ts.beat_unit);
            config.time_signature = ts;
        }
    }

    // MIDI counts quarter notes; the grid counts beats of the time signature
    let ts = config.time_signature;
    let bpm_override = options.bpm_override.map(|bpm| ts.beat_bpm(bpm));
    let tempo = imported.tempo_source(&ts);

    let transcription = quantize_with_tempo(&imported.notes, bpm_override, &tempo, &config)?;
    Ok(transcription)
}

/// MIDI bytes to a MusicXML document
pub fn midi_to_musicxml(bytes: &[u8], options: &TranscribeOptions) -> Result<String, ConvertError> {
    let transcription = transcribe_midi(bytes, options)?;
    if !transcription.discards.is_empty() {
        log::warn!("{} notes were discarded during quantization", transcription.discards.len());
    }
    Ok(emit_musicxml(&transcription.score, options.title.as_deref())?)
}
