//! Composition root: wires capture, aggregation, sinks, and the feed
//! server into a live transcription session.

use crate::audio::capture::{CpalCapture, suppress_audio_warnings};
use crate::audio::chunker::ChunkerConfig;
use crate::config::Config;
use crate::defaults;
use crate::error::{LivecapError, Result};
use crate::feed::server::FeedServer;
use crate::models::catalog;
use crate::models::download::download_model;
use crate::stt::whisper::{WhisperConfig, WhisperTranscriber};
use crate::transcript::aggregator::{Aggregator, AggregatorConfig};
use crate::transcript::queue::ChunkQueue;
use crate::transcript::sink::{ConsoleSink, FeedSink, TranscriptSink};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Run a live transcription session: microphone → aggregator → sinks.
///
/// Blocks until Ctrl+C, then shuts down cooperatively and prints the final
/// transcript.
#[allow(clippy::too_many_arguments)]
pub async fn run_live_command(
    mut config: Config,
    device: Option<String>,
    model: Option<String>,
    non_english: bool,
    energy_threshold: Option<u32>,
    record_timeout_ms: Option<u64>,
    phrase_timeout_ms: Option<u64>,
    serve: Option<String>,
    quiet: bool,
    verbose: u8,
    no_download: bool,
) -> Result<()> {
    // Quiet down ALSA/JACK probing noise before any audio init
    suppress_audio_warnings();

    // Apply CLI overrides
    if let Some(d) = device {
        config.audio.device = Some(d);
    }
    if let Some(m) = model {
        config.stt.model = m;
    }
    if non_english {
        config.stt.language = defaults::AUTO_LANGUAGE.to_string();
    }
    if let Some(level) = energy_threshold {
        config.audio.energy_threshold = level;
    }
    if let Some(ms) = record_timeout_ms {
        config.audio.record_timeout_ms = ms as u32;
    }
    if let Some(ms) = phrase_timeout_ms {
        config.phrase.phrase_timeout_ms = ms as u32;
    }

    // Load the model ONCE before the loop (this is the slow part)
    let model_name = catalog::english_variant(&config.stt.model, &config.stt.language);
    if !quiet {
        eprintln!("Loading model '{}'...", model_name);
    }
    let transcriber = create_transcriber(&config, &model_name, quiet, no_download).await?;

    let queue = Arc::new(ChunkQueue::new());
    let chunker = ChunkerConfig {
        energy_threshold: config.audio.energy_threshold,
        max_chunk_ms: config.audio.record_timeout_ms,
        sample_rate: config.audio.sample_rate,
    };
    let mut capture = CpalCapture::new(config.audio.device.as_deref(), chunker, Arc::clone(&queue))?;

    let mut sinks: Vec<Box<dyn TranscriptSink>> = Vec::new();
    if !quiet {
        sinks.push(Box::new(ConsoleSink::new()));
    }
    if verbose >= 1 {
        sinks.push(Box::new(BatchLogSink));
    }

    // Feed server: enabled by --serve or by config
    let feed_addr = match serve {
        Some(addr) if !addr.is_empty() => Some(addr),
        Some(_) => Some(config.feed.listen.clone()),
        None if config.feed.enabled => Some(config.feed.listen.clone()),
        None => None,
    };
    let feed_server = match feed_addr {
        Some(addr_str) => {
            let addr: SocketAddr =
                addr_str
                    .parse()
                    .map_err(|e| LivecapError::ConfigInvalidValue {
                        key: "feed.listen".to_string(),
                        message: format!("{addr_str}: {e}"),
                    })?;
            let server = Arc::new(FeedServer::new(addr));
            sinks.push(Box::new(FeedSink::new(server.events())));
            let accept_server = Arc::clone(&server);
            tokio::spawn(async move {
                if let Err(e) = accept_server.start().await {
                    eprintln!("livecap: feed server stopped: {e}");
                }
            });
            Some(server)
        }
        None => None,
    };

    // Capture problems are fatal at startup, before the loop exists
    capture.start()?;

    let aggregator_config = AggregatorConfig {
        phrase_timeout: Duration::from_millis(config.phrase.phrase_timeout_ms as u64),
        poll_interval: Duration::from_millis(config.phrase.poll_interval_ms as u64),
    };
    let handle =
        Aggregator::new(aggregator_config, queue, Arc::new(transcriber)).spawn(sinks);

    if !quiet {
        if let Some(ref server) = feed_server {
            eprintln!("Feed available on {}", server.addr());
        }
        eprintln!("Model '{}' loaded. Listening... (Ctrl+C to stop)", model_name);
    }

    // Cooperative cancellation: the aggregator notices between iterations
    let _ = tokio::signal::ctrl_c().await;

    if let Err(e) = capture.stop() {
        eprintln!("livecap: failed to stop audio capture: {e}");
    }
    let transcript = handle.stop();
    if let Some(server) = feed_server {
        server.stop().await;
    }

    if !quiet {
        println!();
        for line in transcript.iter().filter(|l| !l.is_empty()) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Logs every processed batch to stderr (verbose mode). The console sink
/// redraws the screen, so diagnostics go to the other stream.
struct BatchLogSink;

impl TranscriptSink for BatchLogSink {
    fn publish(&mut self, update: &crate::transcript::sink::TranscriptUpdate) -> Result<()> {
        let marker = if update.finalized { "new line" } else { "update" };
        eprintln!("[{marker}] \"{}\"", update.text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "batch-log"
    }
}

/// Create the transcriber, handling model download if needed.
pub async fn create_transcriber(
    config: &Config,
    model_name: &str,
    quiet: bool,
    no_download: bool,
) -> Result<WhisperTranscriber> {
    let model_to_use = if catalog::is_model_installed(model_name) || looks_like_path(model_name) {
        model_name.to_string()
    } else if no_download {
        // Can't download, try whatever is installed
        if let Some(fallback) = catalog::find_any_installed_model() {
            if !quiet {
                eprintln!(
                    "Model '{}' not installed (--no-download). Using '{}'.",
                    model_name, fallback
                );
            }
            fallback
        } else {
            return Err(LivecapError::Transcription {
                message: format!(
                    "Model '{}' not installed and --no-download specified.\n\
                     Run: livecap models install {}",
                    model_name, model_name
                ),
            });
        }
    } else {
        download_model(model_name, !quiet).await?;
        model_name.to_string()
    };

    let whisper_config = WhisperConfig {
        model_path: build_model_path(&model_to_use)?,
        language: config.stt.language.clone(),
        threads: None,
    };

    WhisperTranscriber::new(whisper_config)
}

fn looks_like_path(model: &str) -> bool {
    let path = std::path::Path::new(model);
    path.is_absolute() || path.exists() || model.contains('/')
}

/// Build the full path to a Whisper model file.
///
/// Accepts an absolute path, a relative path, a catalog name (resolved in
/// the cache directory), or a custom filename looked up under `models/`.
fn build_model_path(model: &str) -> Result<PathBuf> {
    let path = PathBuf::from(model);

    if path.is_absolute() || path.exists() || model.contains('/') {
        return Ok(path);
    }

    if catalog::get_model(model).is_some() {
        if catalog::is_model_installed(model) {
            return Ok(catalog::model_path(model));
        }
        return Err(LivecapError::Transcription {
            message: format!(
                "Model '{}' is not installed. Run 'livecap models install {}' to download it.",
                model, model
            ),
        });
    }

    // Custom model filename, local models/ directory
    let filename = if model.ends_with(".bin") {
        model.to_string()
    } else {
        format!("ggml-{model}.bin")
    };
    Ok(PathBuf::from("models").join(filename))
}
