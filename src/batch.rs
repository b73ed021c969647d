//! Batch transcription of pre-recorded audio files.
//!
//! Separate from the streaming core: each file is transcribed in one shot
//! and the result is segmented by the model's own reported timings.

use crate::audio::wav;
use crate::error::Result;
use crate::stt::transcriber::Transcriber;
use crate::transcript::pcm;
use std::fs;
use std::path::{Path, PathBuf};

/// Transcribe a batch of files, skipping the invalid ones.
///
/// Every file gets its own attempt; an unreadable or corrupt file prints a
/// skip message and the run continues. Returns how many files succeeded.
pub fn transcribe_files(transcriber: &dyn Transcriber, paths: &[PathBuf], quiet: bool) -> usize {
    let mut succeeded = 0;
    for path in paths {
        match transcribe_file(transcriber, path) {
            Ok(output) => {
                succeeded += 1;
                if !quiet {
                    println!(
                        "Transcription finished for {}, output in {}",
                        path.display(),
                        output.parent().unwrap_or(Path::new(".")).display()
                    );
                }
            }
            Err(e) => {
                eprintln!("{}: not a valid file, skipping ({e})", path.display());
            }
        }
    }
    succeeded
}

/// Transcribe one file and persist the segmented result.
///
/// Writes `<stem>.txt` into a `transcriptions/` directory next to the input
/// file: the stem as the first line, then one `[start --> end]: text` line
/// per segment.
pub fn transcribe_file(transcriber: &dyn Transcriber, path: &Path) -> Result<PathBuf> {
    let samples = wav::load_samples(path)?;
    let audio = pcm::samples_to_f32(&samples);
    let result = transcriber.transcribe(&audio)?;

    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "transcription".to_string());
    let out_dir = path.parent().unwrap_or(Path::new(".")).join("transcriptions");
    fs::create_dir_all(&out_dir)?;

    let mut body = title.clone();
    for segment in &result.segments {
        body.push_str(&format!(
            "\n[{} --> {}]: {}",
            format_timestamp(segment.start_ms),
            format_timestamp(segment.end_ms),
            segment.text.trim()
        ));
    }
    body.push('\n');

    let out_path = out_dir.join(format!("{title}.txt"));
    fs::write(&out_path, body)?;
    Ok(out_path)
}

/// Format milliseconds as `H:MM:SS.mmm`.
fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours}:{minutes:02}:{seconds:02}.{millis:03}")
}
