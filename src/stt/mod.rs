//! Speech-to-text adapters.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{MockTranscriber, Segment, Transcriber, Transcription};
pub use whisper::{WhisperConfig, WhisperTranscriber};
