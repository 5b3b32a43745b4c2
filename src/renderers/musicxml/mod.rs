//! MusicXML export module
//!
//! Provides MusicXML 3.1 partwise export for quantized scores.
//!
//! # Module Structure
//!
//! - **emitter**: Main entry point (`emit_musicxml()`), measure layout and rests
//! - **builder**: MusicXML XML structure building
//! - **pitch**: MIDI pitch to step/alter/octave
//! - **duration**: Rational duration to note type and dots
//! - **helpers**: Utility functions (GCD/LCM, logging, formatting)

pub mod builder;
pub mod duration;
pub mod emitter;
pub mod helpers;
pub mod pitch;

pub use builder::*;
pub use duration::*;
pub use emitter::emit_musicxml;
pub use helpers::log_musicxml;
pub use pitch::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported duration: {0}")]
    UnsupportedDuration(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
