//! Reference preparation service
//!
//! Ties the preprocessor and the prompt cache together for one
//! voice-cloning request: normalize the reference audio, derive its content
//! key, and either reuse the cached prompt or build a new one through the
//! caller-supplied constructor. The cache is owned here and handed to the
//! request path explicitly; there is no global instance.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::audio::{AudioPreprocessor, PreprocessedAudio, RawAudioBuffer, SilenceStrategy};
use crate::cache::{derive_key, CacheKey, CacheStats, CacheStatus, VoicePromptCache};
use crate::config::PrepConfig;
use crate::core::error::{PrepError, Result};

/// Result of preparing one reference recording
#[derive(Debug)]
pub struct PreparedReference<P> {
    /// Preprocessed mono audio plus metadata
    pub audio: PreprocessedAudio,
    /// Prompt to pass to the engine's generation call
    pub prompt: Arc<P>,
    /// Whether the prompt came from the cache
    pub cache_status: CacheStatus,
    /// Content-derived key for this reference
    pub cache_key: CacheKey,
}

/// Request-path service for reference-audio preparation
///
/// Constructed once at startup from [`PrepConfig`] and passed by handle into
/// every voice-cloning request.
pub struct ReferencePreparer<P> {
    preprocessor: AudioPreprocessor,
    cache: Option<Arc<VoicePromptCache<P>>>,
    config: PrepConfig,
}

impl<P> ReferencePreparer<P> {
    /// Build a preparer with the full silence heuristic
    pub fn new(config: PrepConfig) -> Result<Self> {
        Self::with_silence_strategy(config, None)
    }

    /// Build a preparer with an explicit silence strategy (pass
    /// [`crate::audio::NullSilence`] to disable smart clipping)
    pub fn with_silence_strategy(
        config: PrepConfig,
        silence: Option<Box<dyn SilenceStrategy>>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = if config.cache.enabled {
            Some(Arc::new(VoicePromptCache::new(
                config.cache.max_size,
                Duration::from_secs(config.cache.ttl_seconds),
            )?))
        } else {
            None
        };

        let preprocessor = match silence {
            Some(strategy) => AudioPreprocessor::new(strategy),
            None => AudioPreprocessor::with_heuristics(),
        };

        Ok(Self {
            preprocessor,
            cache,
            config,
        })
    }

    /// Prepare a reference recording for prompt construction.
    ///
    /// `build` is invoked with the preprocessed audio only on a cache miss
    /// (or always, when caching is disabled); its error type flows back to
    /// the caller unchanged.
    pub fn prepare<F, E>(
        &self,
        audio: RawAudioBuffer,
        sample_rate: u32,
        ref_text: Option<&str>,
        x_vector_only: bool,
        build: F,
    ) -> std::result::Result<PreparedReference<P>, E>
    where
        F: FnOnce(&PreprocessedAudio) -> std::result::Result<P, E>,
        E: From<PrepError>,
    {
        let processed = if self.config.preprocessing.enabled {
            let started = std::time::Instant::now();
            let processed = self.preprocessor.preprocess(
                audio,
                sample_rate,
                self.config.preprocessing.max_ref_duration_secs,
                self.config.preprocessing.target_min_duration_secs,
            )?;
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                clip_method = %processed.metadata.clip_method,
                silence_removed_ms = processed.metadata.silence_removed_ms,
                "preprocessed reference audio"
            );
            processed
        } else {
            AudioPreprocessor::mixdown_only(audio, sample_rate)?
        };

        let cache_key = derive_key(
            &processed.samples,
            processed.sample_rate,
            ref_text,
            x_vector_only,
        );

        let (prompt, cache_status) = match &self.cache {
            Some(cache) => cache.get_or_create(cache_key, || build(&processed))?,
            None => (Arc::new(build(&processed)?), CacheStatus::Miss),
        };

        Ok(PreparedReference {
            audio: processed,
            prompt,
            cache_status,
            cache_key,
        })
    }

    /// Cache statistics, or `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Remove all cached prompts
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Reset cache hit/miss/eviction counters
    pub fn reset_cache_stats(&self) {
        if let Some(cache) = &self.cache {
            cache.reset_stats();
        }
    }

    /// Active configuration
    pub fn config(&self) -> &PrepConfig {
        &self.config
    }
}
