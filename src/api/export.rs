//! Operations exposed to JavaScript
//!
//! - `quantizeNotes`: note events + tempo → `Transcription` object
//! - `transcribeMidi`: Standard MIDI File bytes → MusicXML string
//! - `defaultConfig`: the default `QuantizeConfig` as an object
//!
//! Each JS entry point is a thin wrapper around a plain-Rust function of the
//! same shape so the logic can be tested natively.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, deserialize_or_default, serialize, to_js_error};
use crate::converters::{midi_to_musicxml, TranscribeOptions};
use crate::models::NoteEvent;
use crate::quantize::{quantize_with_tempo, QuantizeConfig, TempoSource, Transcription};
use crate::{wasm_info, wasm_log, wasm_warn};

/// Tempo argument of `quantizeNotes`
///
/// ```json
/// { "bpm_override": 96, "source": { "kind": "beats", "value": [0.0, 0.6, 1.2] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoInput {
    pub bpm_override: Option<f64>,
    pub source: TempoSource,
}

/// Quantize note events (plain Rust entry point)
pub fn quantize_events(notes: &[NoteEvent], tempo: &TempoInput, config: &QuantizeConfig) -> Result<Transcription, String> {
    quantize_with_tempo(notes, tempo.bpm_override, &tempo.source, config).map_err(|e| e.to_string())
}

/// Transcribe MIDI bytes to MusicXML (plain Rust entry point)
///
/// `bpm_override` counts quarter notes, as MIDI tempo does.
pub fn transcribe_midi_to_musicxml(
    bytes: &[u8],
    bpm_override: Option<f64>,
    config: QuantizeConfig,
) -> Result<String, String> {
    let options = TranscribeOptions {
        bpm_override,
        config,
        ..TranscribeOptions::default()
    };
    midi_to_musicxml(bytes, &options).map_err(|e| e.to_string())
}

// ============================================================================
// JavaScript bindings
// ============================================================================

/// Quantize an array of note events
///
/// # Arguments
/// * `notes` - `[{ pitch, start_time, end_time, velocity }]`
/// * `tempo` - `TempoInput` object
/// * `config` - partial `QuantizeConfig` (or undefined for defaults)
///
/// # Returns
/// `{ score, discards }`
#[wasm_bindgen(js_name = quantizeNotes)]
pub fn quantize_notes_js(notes: JsValue, tempo: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
    let notes: Vec<NoteEvent> = deserialize(notes, "Invalid note events")?;
    let tempo: TempoInput = deserialize_or_default(tempo, "Invalid tempo")?;
    let config: QuantizeConfig = deserialize_or_default(config, "Invalid config")?;
    wasm_info!("quantizeNotes called with {} notes", notes.len());

    let transcription = quantize_events(&notes, &tempo, &config).map_err(|e| to_js_error("Quantization failed", e))?;

    if !transcription.discards.is_empty() {
        wasm_warn!("{} notes discarded", transcription.discards.len());
    }
    wasm_log!("  {} measures per part", transcription.score.measure_count());
    serialize(&transcription, "Failed to serialize transcription")
}

/// Convert a Standard MIDI File to MusicXML
///
/// # Arguments
/// * `bytes` - MIDI file contents
/// * `bpm_override` - tempo in quarter notes per minute, replacing the file's
/// * `config` - partial `QuantizeConfig` (or undefined for defaults)
#[wasm_bindgen(js_name = transcribeMidi)]
pub fn transcribe_midi_js(bytes: &[u8], bpm_override: Option<f64>, config: JsValue) -> Result<String, JsValue> {
    wasm_info!("transcribeMidi called ({} bytes)", bytes.len());
    let config: QuantizeConfig = deserialize_or_default(config, "Invalid config")?;

    let musicxml = transcribe_midi_to_musicxml(bytes, bpm_override, config)
        .map_err(|e| to_js_error("MIDI transcription failed", e))?;

    wasm_info!("  MusicXML generated: {} bytes", musicxml.len());
    Ok(musicxml)
}

/// Default quantization settings
#[wasm_bindgen(js_name = defaultConfig)]
pub fn default_config_js() -> Result<JsValue, JsValue> {
    serialize(&QuantizeConfig::default(), "Failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_input_json() {
        let tempo: TempoInput = serde_json::from_str(r#"{"source":{"kind":"bpm","value":90}}"#).unwrap();
        assert_eq!(tempo.bpm_override, None);
        assert_eq!(tempo.source, TempoSource::Bpm(90.0));

        let empty: TempoInput = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.source, TempoSource::Unknown);
    }

    #[test]
    fn test_quantize_events_reports_missing_tempo() {
        let notes = vec![NoteEvent::new(60, 0.0, 0.5, 64)];
        let err = quantize_events(&notes, &TempoInput::default(), &QuantizeConfig::default()).unwrap_err();
        assert!(err.contains("no tempo"), "unexpected error: {}", err);
    }

    #[test]
    fn test_transcribe_rejects_garbage() {
        let err = transcribe_midi_to_musicxml(b"not a midi file", None, QuantizeConfig::default()).unwrap_err();
        assert!(err.starts_with("midi parse error"), "unexpected error: {}", err);
    }
}
