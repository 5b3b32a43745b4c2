//! WASM API
//!
//! JavaScript-facing functions for the quantization engine.
//!
//! # Module Structure
//!
//! - `helpers`: Console logging macros and serde-wasm-bindgen conversions
//! - `export`: `quantizeNotes`, `transcribeMidi`, `defaultConfig` and their
//!   plain-Rust counterparts

pub mod helpers;
pub mod export;

pub use export::{
    default_config_js, quantize_events, quantize_notes_js, transcribe_midi_js, transcribe_midi_to_musicxml,
    TempoInput,
};
