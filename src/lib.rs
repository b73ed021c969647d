//! livecap - Live speech transcription for the terminal
//!
//! Streams microphone audio through a phrase-segmentation pipeline into a
//! continuously updated transcript, shown on the console and pushed to feed
//! clients.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod feed;
pub mod models;
pub mod stt;
pub mod transcript;

// L4 composition root - needs everything
#[cfg(all(feature = "cpal-audio", feature = "model-download"))]
pub mod app;

// Core pipeline (queue → aggregator → transcript → sinks)
pub use transcript::aggregator::{Aggregator, AggregatorConfig, AggregatorHandle, Iteration};
pub use transcript::queue::ChunkQueue;
pub use transcript::sink::{
    CollectorSink, ConsoleSink, FeedSink, TranscriptSink, TranscriptUpdate,
};
pub use transcript::state::Transcript;

// Core traits and adapters
pub use stt::transcriber::{MockTranscriber, Segment, Transcriber, Transcription};
pub use stt::whisper::{WhisperConfig, WhisperTranscriber};

// Feed
pub use feed::protocol::FeedEvent;
pub use feed::server::FeedServer;

// Error handling
pub use error::{LivecapError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
