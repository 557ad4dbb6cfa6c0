//! External service module
//! 
//! This module contains the client for the generative text service that
//! programs workouts.

pub mod generator;

// Re-export main types
pub use generator::{GenerateError, GeneratorConfig, WodGenerator};
