//! Data models for the quantization pipeline
//!
//! Input side: `NoteEvent`. Output side: `Score` → `Part` → `Measure` → `Chord`.
//! Durations are exact rationals of a quarter note.

pub mod duration;
pub mod note_event;
pub mod notation;
pub mod serde_helpers;

// Re-export commonly used types
pub use duration::Duration;
pub use note_event::{NoteEvent, TieState};
pub use notation::{Chord, Clef, Measure, Part, Score, TimeSignature};
