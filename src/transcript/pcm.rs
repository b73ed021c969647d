//! PCM buffer merging and normalization.
//!
//! The queue carries raw little-endian signed 16-bit mono PCM; the
//! transcriber wants f32 samples in [-1, 1]. These helpers sit between the
//! two.

/// Concatenates drained chunks, in order, into one pending buffer.
pub fn merge_chunks(chunks: Vec<Vec<u8>>) -> Vec<u8> {
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    let mut merged = Vec::with_capacity(total);
    for chunk in chunks {
        merged.extend_from_slice(&chunk);
    }
    merged
}

/// Reinterprets raw bytes as signed 16-bit little-endian samples and
/// normalizes to f32 in [-1, 1] by dividing by 32768.
///
/// A trailing odd byte (which a well-formed capture never produces) is
/// ignored.
pub fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Normalizes i16 samples to f32 in [-1, 1].
pub fn samples_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Encodes i16 samples as little-endian bytes, the queue's wire format.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_chunks_preserves_order() {
        let merged = merge_chunks(vec![vec![1, 2], vec![3], vec![4, 5, 6]]);
        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_merge_chunks_empty() {
        assert!(merge_chunks(Vec::new()).is_empty());
        assert!(merge_chunks(vec![Vec::new(), Vec::new()]).is_empty());
    }

    #[test]
    fn test_zero_bytes_normalize_to_zero_samples() {
        let samples = bytes_to_f32(&[0u8; 64]);
        assert_eq!(samples.len(), 32);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_bytes_to_f32_known_values() {
        // 0, 16384, -16384, 32767, -32768 as little-endian pairs
        let bytes: Vec<u8> = [0i16, 16384, -16384, 32767, -32768]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let samples = bytes_to_f32(&bytes);

        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert!((samples[2] + 0.5).abs() < 1e-6);
        assert!((samples[3] - 0.999969).abs() < 1e-4);
        assert_eq!(samples[4], -1.0);
    }

    #[test]
    fn test_bytes_to_f32_ignores_trailing_odd_byte() {
        let samples = bytes_to_f32(&[0, 0, 7]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_samples_roundtrip_through_bytes() {
        let samples = vec![0i16, 1, -1, 1000, -1000, i16::MAX, i16::MIN];
        let bytes = samples_to_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * 2);

        let direct = samples_to_f32(&samples);
        let via_bytes = bytes_to_f32(&bytes);
        assert_eq!(direct, via_bytes);
    }
}
