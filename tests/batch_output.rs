//! Batch file transcription through the public API.

use livecap::batch::{transcribe_file, transcribe_files};
use livecap::{MockTranscriber, Segment, Transcriber, Transcription};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, seconds: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(seconds * 16000.0) as usize {
        writer.write_sample(((i % 100) as i16 - 50) * 100).unwrap();
    }
    writer.finalize().unwrap();
    path
}

/// Transcriber reporting several time-aligned segments, like Whisper does
/// for longer recordings.
struct SegmentedTranscriber;

impl Transcriber for SegmentedTranscriber {
    fn transcribe(&self, _audio: &[f32]) -> livecap::Result<Transcription> {
        Ok(Transcription {
            text: "I have a dream today".to_string(),
            segments: vec![
                Segment {
                    start_ms: 0,
                    end_ms: 1500,
                    text: "I have a dream".to_string(),
                },
                Segment {
                    start_ms: 1500,
                    end_ms: 2750,
                    text: "today".to_string(),
                },
            ],
        })
    }

    fn model_name(&self) -> &str {
        "segmented"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[test]
fn output_file_lists_one_line_per_segment() {
    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "dream.wav", 3.0);

    let out_path = transcribe_file(&SegmentedTranscriber, &wav).unwrap();
    assert_eq!(out_path, dir.path().join("transcriptions").join("dream.txt"));

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "dream",
            "[0:00:00.000 --> 0:00:01.500]: I have a dream",
            "[0:00:01.500 --> 0:00:02.750]: today",
        ]
    );
}

#[test]
fn corrupt_file_is_skipped_without_aborting_the_batch() {
    let dir = TempDir::new().unwrap();
    let corrupt = dir.path().join("corrupt.wav");
    std::fs::write(&corrupt, b"\x00\x01garbage").unwrap();
    let good = write_wav(dir.path(), "fine.wav", 0.5);

    let transcriber = MockTranscriber::new("test-model").with_response("fine audio");
    let succeeded = transcribe_files(&transcriber, &[corrupt, good], true);

    assert_eq!(succeeded, 1);
    assert!(dir.path().join("transcriptions").join("fine.txt").exists());
    assert!(!dir.path().join("transcriptions").join("corrupt.txt").exists());
}

#[test]
fn sibling_output_directory_is_created_next_to_the_input() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("recordings");
    std::fs::create_dir_all(&nested).unwrap();
    let wav = write_wav(&nested, "meeting.wav", 0.25);

    let transcriber = MockTranscriber::new("test-model").with_response("minutes");
    let out_path = transcribe_file(&transcriber, &wav).unwrap();

    assert_eq!(
        out_path,
        nested.join("transcriptions").join("meeting.txt")
    );
}
