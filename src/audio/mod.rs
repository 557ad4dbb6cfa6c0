//! Speaker output for timer cues

#[cfg(feature = "speaker")]
pub mod speaker;

#[cfg(feature = "speaker")]
pub use speaker::SpeakerCues;
