//! Renderers module
//!
//! Converts a quantized `Score` into notation interchange formats.

pub mod musicxml;

// Re-export commonly used types
pub use musicxml::{emit_musicxml, RenderError};
