//! WOD Coach - A workout interval timer service
//! 
//! This library provides the interval timer behind a generated workout:
//! format classification, the timer state machine with its audio cues, the
//! per-workout session task, and the HTTP control surface around them.

pub mod config;
pub mod timer;
pub mod audio;
pub mod tasks;
pub mod workout;
pub mod services;
pub mod state;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use timer::{FormatTag, Phase, TimerConfig, TimerView, WorkoutTimer};
pub use utils::signals::shutdown_signal;
