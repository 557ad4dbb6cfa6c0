//! Background tasks module
//! 
//! This module contains the per-workout timer session task.

pub mod timer_driver;

// Re-export main types
pub use timer_driver::{spawn_timer, Outcome, TimerHandle, TimerOp, TICK_PERIOD};
