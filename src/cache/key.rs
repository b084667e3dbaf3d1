//! Content-derived cache keys
//!
//! A key is a deterministic digest of the reference audio content plus the
//! request parameters that change the resulting prompt: sample rate,
//! reference transcript and x-vector-only mode. Identity use only, not a
//! security boundary.

use std::fmt;

use sha2::{Digest, Sha256};

/// Samples hashed from the front of the buffer
const KEY_SAMPLE_PREFIX: usize = 1000;

/// Transcript characters folded into the key
const REF_TEXT_PREFIX_CHARS: usize = 32;

/// Opaque content-derived cache key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({self})")
    }
}

/// Derive a cache key from preprocessed reference audio and request mode.
///
/// Only the first 1000 samples are hashed; recordings sharing a prefix but
/// differing later map to the same key. That trade-off keeps key derivation
/// cheap for long references and is part of the cache's observable behavior.
pub fn derive_key(
    samples: &[f32],
    sample_rate: u32,
    ref_text: Option<&str>,
    x_vector_only: bool,
) -> CacheKey {
    let prefix = &samples[..samples.len().min(KEY_SAMPLE_PREFIX)];
    let mut hasher = Sha256::new();
    for sample in prefix {
        hasher.update(sample.to_le_bytes());
    }
    let audio_digest = hasher.finalize();

    let text_part: String = match ref_text {
        Some(text) if !text.is_empty() => text.chars().take(REF_TEXT_PREFIX_CHARS).collect(),
        _ => "no_text".to_string(),
    };
    let mode_part = if x_vector_only { "xvec" } else { "full" };

    let mut audio_hex = String::with_capacity(16);
    for byte in &audio_digest[..8] {
        audio_hex.push_str(&format!("{byte:02x}"));
    }

    let composed = format!("{audio_hex}_{text_part}_{mode_part}_{sample_rate}");
    CacheKey(Sha256::digest(composed.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize, seed: f32) -> Vec<f32> {
        (0..n).map(|i| ((i as f32 * 0.01 + seed).sin()) * 0.5).collect()
    }

    #[test]
    fn test_derive_key_deterministic() {
        let audio = samples(4000, 0.0);
        let a = derive_key(&audio, 24000, Some("hello world"), false);
        let b = derive_key(&audio, 24000, Some("hello world"), false);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_key_changes_with_audio_prefix() {
        let a = derive_key(&samples(4000, 0.0), 24000, None, false);
        let b = derive_key(&samples(4000, 1.0), 24000, None, false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_ignores_samples_past_prefix() {
        let mut long = samples(4000, 0.0);
        let key_a = derive_key(&long, 24000, None, false);
        // Change content after the hashed prefix only
        long[2000] += 0.25;
        let key_b = derive_key(&long, 24000, None, false);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_key_changes_with_parameters() {
        let audio = samples(4000, 0.0);
        let base = derive_key(&audio, 24000, Some("text"), false);
        assert_ne!(base, derive_key(&audio, 16000, Some("text"), false));
        assert_ne!(base, derive_key(&audio, 24000, Some("other"), false));
        assert_ne!(base, derive_key(&audio, 24000, Some("text"), true));
        assert_ne!(base, derive_key(&audio, 24000, None, false));
    }

    #[test]
    fn test_empty_text_same_as_no_text() {
        let audio = samples(500, 0.0);
        assert_eq!(
            derive_key(&audio, 24000, Some(""), false),
            derive_key(&audio, 24000, None, false)
        );
    }

    #[test]
    fn test_short_buffer_hashes_available_samples() {
        let audio = samples(10, 0.0);
        let key = derive_key(&audio, 24000, None, false);
        assert_eq!(key, derive_key(&audio, 24000, None, false));
    }

    #[test]
    fn test_display_is_hex() {
        let key = derive_key(&samples(100, 0.0), 24000, None, false);
        let s = key.to_string();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
