//! Workout interval timer
//!
//! The format classifier, the timer state machine, its display projection
//! and the audio cue contract it drives.

pub mod cues;
pub mod engine;
pub mod format;
pub mod view;

// Re-export main types
pub use cues::{Cue, CueEmitter, LogCues, MemoryCues, SilentCues};
pub use engine::{Phase, Schedule, TabataPhase, TimerConfig, TimerState, WorkoutTimer};
pub use format::FormatTag;
pub use view::{format_duration, TimerView};
