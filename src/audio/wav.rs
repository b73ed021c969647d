//! WAV file loading for batch transcription.

use crate::defaults::SAMPLE_RATE;
use crate::error::{LivecapError, Result};
use std::io::Read;
use std::path::Path;

/// Loads a WAV file as 16-bit mono samples at 16kHz.
///
/// Accepts arbitrary sample rates and mono/stereo channel layouts;
/// everything is mixed down and resampled.
pub fn load_samples(path: &Path) -> Result<Vec<i16>> {
    let file = std::fs::File::open(path).map_err(|e| LivecapError::AudioCapture {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;
    samples_from_reader(Box::new(std::io::BufReader::new(file)))
}

/// Loads WAV data from any reader (for testing/flexibility).
pub fn samples_from_reader(reader: Box<dyn Read + Send>) -> Result<Vec<i16>> {
    let mut wav_reader = hound::WavReader::new(reader).map_err(|e| LivecapError::AudioCapture {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = wav_reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels;

    let raw_samples: Vec<i16> = wav_reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| LivecapError::AudioCapture {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

    // Mix down to mono
    let mono_samples = if source_channels == 2 {
        raw_samples
            .chunks_exact(2)
            .map(|frame| {
                let left = frame[0] as i32;
                let right = frame[1] as i32;
                ((left + right) / 2) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    if source_rate != SAMPLE_RATE {
        Ok(resample(&mono_samples, source_rate, SAMPLE_RATE))
    } else {
        Ok(mono_samples)
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx.min(samples.len() - 1)]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
