//! Whisper model management.

pub mod catalog;
#[cfg(feature = "model-download")]
pub mod download;
