//! Capture-side chunk assembly.
//!
//! Sits inside the audio callback between the device and the ingest queue.
//! An energy gate keeps ambient noise out of the queue entirely; the record
//! timeout bounds how much audio a single chunk may carry, so the aggregator
//! gets a steady stream of bounded chunks while someone is speaking.

use crate::defaults;

/// Configuration for the chunk assembler.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Energy gate as RMS over raw i16 samples. Frames below this are
    /// silence: they close the current chunk and are otherwise ignored.
    pub energy_threshold: u32,
    /// Maximum chunk duration in milliseconds (the record timeout).
    pub max_chunk_ms: u32,
    /// Sample rate in Hz, used to convert the timeout to a sample count.
    pub sample_rate: u32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            energy_threshold: defaults::ENERGY_THRESHOLD,
            max_chunk_ms: defaults::RECORD_TIMEOUT_MS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Accumulates gated audio into bounded chunks.
pub struct ChunkAssembler {
    config: ChunkerConfig,
    max_samples: usize,
    pending: Vec<i16>,
}

impl ChunkAssembler {
    pub fn new(config: ChunkerConfig) -> Self {
        let max_samples =
            (config.sample_rate as u64 * config.max_chunk_ms as u64 / 1000).max(1) as usize;
        Self {
            config,
            max_samples,
            pending: Vec::new(),
        }
    }

    /// Feeds one callback frame, returning zero or more completed chunks.
    ///
    /// A frame at or above the energy gate extends the current chunk; every
    /// `max_chunk_ms` worth of accumulated samples is emitted immediately so
    /// the transcript keeps updating through long utterances. A frame below
    /// the gate closes the current chunk; the quiet frame is included as
    /// trailing padding so word endings are not clipped.
    pub fn feed(&mut self, samples: &[i16]) -> Vec<Vec<i16>> {
        let mut chunks = Vec::new();

        if rms(samples) >= self.config.energy_threshold as f32 {
            self.pending.extend_from_slice(samples);
            while self.pending.len() >= self.max_samples {
                let rest = self.pending.split_off(self.max_samples);
                chunks.push(std::mem::replace(&mut self.pending, rest));
            }
        } else if !self.pending.is_empty() {
            self.pending.extend_from_slice(samples);
            chunks.push(std::mem::take(&mut self.pending));
        }

        chunks
    }

    /// Flushes any partially accumulated chunk (end of stream).
    pub fn flush(&mut self) -> Option<Vec<i16>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

/// Root mean square of raw i16 samples, in raw amplitude units.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}
