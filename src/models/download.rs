//! Model download and installation.
//!
//! Fetches Whisper models from HuggingFace into the user's cache directory.

use crate::error::{LivecapError, Result};
use crate::models::catalog::{get_model, model_path};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Download a Whisper model by catalog name.
///
/// Already-installed models are a no-op.
///
/// # Errors
/// Returns an error if the model is not in the catalog, the download fails,
/// or the file cannot be written.
pub async fn download_model(name: &str, progress: bool) -> Result<PathBuf> {
    let path = model_path(name);

    if path.exists() {
        if progress {
            eprintln!("Model '{}' is already installed at {}", name, path.display());
        }
        return Ok(path);
    }

    let info = get_model(name).ok_or_else(|| {
        LivecapError::Other(format!(
            "Model '{name}' not found in catalog.\n\
             Run 'livecap models list' to see available models."
        ))
    })?;

    download_to_path(name, &info.url(), info.size_mb, &path, progress).await?;
    Ok(path)
}

/// Core download: fetch url, stream to path.
async fn download_to_path(
    name: &str,
    url: &str,
    size_mb: u32,
    output_path: &Path,
    progress: bool,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| LivecapError::Other(format!("Failed to create models directory: {e}")))?;
    }

    if progress {
        eprintln!("Downloading {name} ({size_mb} MB)...");
    }

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LivecapError::Other(format!("Failed to start download: {e}")))?;

    if !response.status().is_success() {
        return Err(LivecapError::Other(format!(
            "Download failed with status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);

    let pb = if progress {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            // SAFETY: hardcoded template string — always valid
            #[allow(clippy::expect_used)]
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut stream = response.bytes_stream();
    let mut file = fs::File::create(output_path)
        .map_err(|e| LivecapError::Other(format!("Failed to create output file: {e}")))?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| LivecapError::Other(format!("Failed to read download chunk: {e}")))?;

        file.write_all(&chunk)
            .map_err(|e| LivecapError::Other(format!("Failed to write to file: {e}")))?;
        written += chunk.len() as u64;

        if let Some(ref pb) = pb {
            pb.inc(chunk.len() as u64);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Downloaded");
    }

    // A truncated transfer would leave a model whisper.cpp can't load
    if total_size > 0 && written != total_size {
        if let Err(e) = fs::remove_file(output_path) {
            eprintln!("livecap: failed to remove truncated download: {e}");
        }
        return Err(LivecapError::Other(format!(
            "Download incomplete: expected {total_size} bytes, got {written}"
        )));
    }

    if progress {
        eprintln!("Model installed to: {}", output_path.display());
    }

    Ok(())
}
