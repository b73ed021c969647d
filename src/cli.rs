//! Command-line interface for livecap
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Live speech transcription for the terminal
#[derive(Parser, Debug)]
#[command(name = "livecap", version, about = "Live speech transcription for the terminal")]
pub struct Cli {
    /// Subcommand to execute (default: live transcription session)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress the live transcript display
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (run `livecap devices` to list)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Whisper model (tiny, base, small, medium, large)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Don't use the English-only model variant; auto-detect the language
    #[arg(long)]
    pub non_english: bool,

    /// Capture energy gate (RMS over raw 16-bit samples)
    #[arg(long, value_name = "LEVEL")]
    pub energy_threshold: Option<u32>,

    /// Maximum duration of one captured chunk. Examples: 2, 1.5, 800ms
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub record_timeout: Option<u64>,

    /// Silence between updates before a new transcript line starts
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub phrase_timeout: Option<u64>,

    /// Serve the live feed, optionally on ADDR (default: configured
    /// feed.listen, 127.0.0.1:5000 out of the box)
    #[arg(
        long,
        value_name = "ADDR",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub serve: Option<String>,

    /// Prevent automatic model download if the configured model is missing
    #[arg(long)]
    pub no_download: bool,
}

/// Parse a duration argument into milliseconds.
///
/// Bare numbers are seconds, fractions allowed (`2`, `0.5`). Anything else
/// goes through `humantime` (`800ms`, `2s`, `1m30s`).
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        if secs < 0.0 || !secs.is_finite() {
            return Err(format!("invalid duration: {s}"));
        }
        return Ok((secs * 1000.0) as u64);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Manage Whisper models
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Transcribe pre-recorded WAV files
    Transcribe {
        /// Files to transcribe
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Follow a running session's live feed
    Follow {
        /// Feed address (default 127.0.0.1:5000)
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List available models
    List,
    /// Download and install a model
    Install {
        /// Model name (e.g., base.en, small, tiny)
        name: String,
    },
}
