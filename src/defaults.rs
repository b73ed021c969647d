//! Default configuration constants for livecap.
//!
//! Shared across configuration types so defaults live in exactly one place.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and what the Whisper
/// models expect as input.
pub const SAMPLE_RATE: u32 = 16000;

/// Default capture-side energy gate, as RMS over raw signed 16-bit samples.
///
/// Audio below this level is treated as silence by the chunk assembler and
/// never reaches the ingest queue. 1000 (~3% of full scale) suits typical
/// microphone input levels.
pub const ENERGY_THRESHOLD: u32 = 1000;

/// Default maximum chunk duration in milliseconds.
///
/// Bounds how much audio a single captured chunk may carry, which in turn
/// bounds how stale the live transcript can get between updates.
pub const RECORD_TIMEOUT_MS: u32 = 2000;

/// Default phrase timeout in milliseconds.
///
/// When this much time passes between processed batches, the current phrase
/// is considered finished and the next transcription starts a new line.
pub const PHRASE_TIMEOUT_MS: u32 = 3000;

/// Default aggregator poll interval in milliseconds.
///
/// How long the aggregator sleeps when the ingest queue is empty.
pub const POLL_INTERVAL_MS: u32 = 250;

/// Default Whisper model name.
///
/// "base" (multilingual) balances accuracy and CPU cost. English sessions
/// are upgraded to the ".en" variant automatically, see
/// [`crate::models::catalog::english_variant`].
pub const DEFAULT_MODEL: &str = "base";

/// Default language code for transcription.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Suffix for English-only model variants.
pub const ENGLISH_ONLY_SUFFIX: &str = ".en";

/// Default listen address for the live feed server.
pub const FEED_ADDR: &str = "127.0.0.1:5000";
