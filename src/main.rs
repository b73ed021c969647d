use anyhow::Result;
use clap::{CommandFactory, Parser};
use livecap::app::{create_transcriber, run_live_command};
use livecap::audio::capture::list_devices;
use livecap::cli::{Cli, Commands, ModelsAction};
use livecap::config::Config;
use livecap::feed::protocol::FeedEvent;
use livecap::models::catalog::{self, format_model_info, list_models};
use livecap::models::download::download_model;
use owo_colors::OwoColorize;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_live_command(
                config,
                cli.device,
                cli.model,
                cli.non_english,
                cli.energy_threshold,
                cli.record_timeout,
                cli.phrase_timeout,
                cli.serve,
                cli.quiet,
                cli.verbose,
                cli.no_download,
            )
            .await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Models { action }) => {
            handle_models_command(action).await?;
        }
        Some(Commands::Transcribe { files }) => {
            let config = load_config(cli.config.as_deref())?;
            let model_name = catalog::english_variant(&config.stt.model, &config.stt.language);
            if !cli.quiet {
                eprintln!("Loading model '{}'...", model_name);
            }
            let transcriber =
                create_transcriber(&config, &model_name, cli.quiet, cli.no_download).await?;
            let succeeded = livecap::batch::transcribe_files(&transcriber, &files, cli.quiet);
            if succeeded == 0 {
                std::process::exit(1);
            }
        }
        Some(Commands::Follow { addr }) => {
            let config = load_config(cli.config.as_deref())?;
            let addr = addr.unwrap_or(config.feed.listen);
            handle_follow(&addr).await?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "livecap", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/livecap/config.toml)
/// 3. Built-in defaults
/// with environment variable overrides applied on top.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        if !path.exists() {
            return Err(livecap::LivecapError::ConfigFileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

/// List available audio input devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

/// Handle model management commands.
async fn handle_models_command(action: ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => {
            println!("Available models:");
            for model in list_models() {
                println!("  {}", format_model_info(model));
            }
        }
        ModelsAction::Install { name } => {
            let path = download_model(&name, true).await?;
            println!("{}", format!("Model '{}' installed successfully", name).green());
            println!("Location: {}", path.display());
        }
    }
    Ok(())
}

/// Follow a running session's feed and render it live.
async fn handle_follow(addr: &str) -> Result<()> {
    match livecap::feed::client::follow(addr, render_feed_event).await {
        Ok(()) => {
            println!();
            println!("Feed connection closed");
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("Failed to follow feed: {}", e).red());
            eprintln!("Is a session running? Start one with: livecap --serve");
            std::process::exit(1);
        }
    }
}

/// Render one feed event to the terminal.
fn render_feed_event(event: FeedEvent) {
    match event {
        FeedEvent::Hello { version } => {
            eprintln!("{}", format!("Connected to livecap v{}", version).dimmed());
        }
        FeedEvent::Phrase { transcript, .. } => {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "\x1b[2J\x1b[H");
            for line in &transcript {
                let _ = writeln!(out, "{line}");
            }
            let _ = out.flush();
        }
    }
}
