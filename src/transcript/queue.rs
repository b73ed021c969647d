//! Thread-safe ingest queue between the capture callback and the aggregator.

use std::sync::Mutex;

/// Unbounded FIFO of raw PCM chunks.
///
/// The capture callback pushes completed chunks (little-endian signed 16-bit
/// mono PCM bytes); the aggregator drains the whole queue atomically once per
/// iteration. Chunks are never reordered and never dropped. Partial drains
/// and peeking are deliberately not offered, so the consumer can only ever
/// observe a consistent batch.
pub struct ChunkQueue {
    chunks: Mutex<Vec<Vec<u8>>>,
}

impl ChunkQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
        }
    }

    /// Appends a chunk to the tail.
    ///
    /// Non-blocking apart from the queue lock; safe to call from the audio
    /// callback.
    pub fn push(&self, chunk: Vec<u8>) {
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push(chunk);
        }
    }

    /// Atomically removes and returns the entire queue contents, in push
    /// order. The queue is empty afterwards.
    pub fn drain_all(&self) -> Vec<Vec<u8>> {
        match self.chunks.lock() {
            Ok(mut chunks) => std::mem::take(&mut *chunks),
            Err(_) => Vec::new(),
        }
    }

    /// Returns true if no chunks are waiting.
    pub fn is_empty(&self) -> bool {
        self.chunks.lock().map(|c| c.is_empty()).unwrap_or(true)
    }

    /// Number of chunks currently waiting.
    pub fn len(&self) -> usize {
        self.chunks.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for ChunkQueue {
    fn default() -> Self {
        Self::new()
    }
}
