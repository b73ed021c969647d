//! Microphone capture and audio file handling.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod chunker;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::{CpalCapture, list_devices, suppress_audio_warnings};
pub use chunker::{ChunkAssembler, ChunkerConfig};
