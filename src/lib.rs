//! Note-to-Notation Quantization Engine (WASM module)
//!
//! Turns timestamped note events into a two-staff score skeleton: notes are
//! split at bar lines, assigned to treble or bass, grouped into chords,
//! snapped to notated durations and placed in measures. MIDI import and
//! MusicXML export sit around that core.

pub mod models;
pub mod quantize;
pub mod converters;
pub mod renderers;
pub mod api;

// Re-export commonly used types
pub use models::*;
pub use quantize::{quantize_notes, quantize_with_tempo, BeatGrid, QuantizeConfig, TempoSource, Transcription};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    {
        if console_log::init_with_level(log::Level::Debug).is_err() {
            web_sys::console::warn_1(&"logger already initialized".into());
        }
    }

    log::info!("Transcription WASM module initialized");
}
