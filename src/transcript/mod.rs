//! Streaming phrase aggregation.
//!
//! The live transcription core:
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌─────────────┐    ┌───────────┐
//! │ Capture  │───▶│ ChunkQueue │───▶│ Aggregator  │───▶│Transcriber│
//! │ callback │    │  (FIFO)    │    │  (1 thread) │    │ (blocking)│
//! └──────────┘    └────────────┘    └──────┬──────┘    └───────────┘
//!                                          │
//!                                   Transcript ──▶ Sinks
//! ```
//!
//! The aggregator is the only writer to the transcript and the phrase
//! timer; the queue is the only state shared with the capture side.

pub mod aggregator;
pub mod clock;
pub mod pcm;
pub mod queue;
pub mod sink;
pub mod state;

pub use aggregator::{Aggregator, AggregatorConfig, AggregatorHandle, Iteration};
pub use clock::{Clock, MockClock, SystemClock};
pub use queue::ChunkQueue;
pub use sink::{CollectorSink, ConsoleSink, FeedSink, TranscriptSink, TranscriptUpdate};
pub use state::Transcript;
