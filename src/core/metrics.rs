//! Per-request performance tracking
//!
//! Tracks preprocessing time, generation time and cache status for a single
//! voice-cloning request, and renders the result as a log line or as
//! response-header key/value pairs.

use std::time::{Duration, Instant};

use tracing::info;

use crate::cache::CacheStatus;

/// Performance tracker for one audio-generation request
///
/// # Example
///
/// ```rust,ignore
/// let mut tracker = PerformanceTracker::new();
/// tracker.start();
/// // ... preprocess ...
/// tracker.mark_preprocessing(prep_elapsed);
/// // ... generate ...
/// tracker.mark_generation();
/// tracker.set_audio_duration(audio_secs);
/// tracker.log_summary();
/// ```
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    start: Option<Instant>,
    generation_time: Option<Duration>,
    preprocessing_time: Option<Duration>,
    audio_duration_secs: Option<f64>,
    cache_status: CacheStatus,
}

impl PerformanceTracker {
    /// Create a new tracker (cache status defaults to miss)
    pub fn new() -> Self {
        Self {
            start: None,
            generation_time: None,
            preprocessing_time: None,
            audio_duration_secs: None,
            cache_status: CacheStatus::Miss,
        }
    }

    /// Start timing the generation phase
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Record preprocessing time
    pub fn mark_preprocessing(&mut self, elapsed: Duration) {
        self.preprocessing_time = Some(elapsed);
    }

    /// Mark generation complete, capturing elapsed time since `start`
    pub fn mark_generation(&mut self) {
        if let Some(start) = self.start {
            self.generation_time = Some(start.elapsed());
        }
    }

    /// Set the duration of the generated audio in seconds
    pub fn set_audio_duration(&mut self, secs: f64) {
        self.audio_duration_secs = Some(secs);
    }

    /// Set the cache status for this request
    pub fn set_cache_status(&mut self, status: CacheStatus) {
        self.cache_status = status;
    }

    /// Cache status for this request
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    /// Real-time factor: generation_time / audio_duration, lower is faster
    pub fn rtf(&self) -> Option<f64> {
        match (self.generation_time, self.audio_duration_secs) {
            (Some(gen), Some(audio)) if audio > 0.0 => Some(gen.as_secs_f64() / audio),
            _ => None,
        }
    }

    /// Log a one-line performance summary
    pub fn log_summary(&self) {
        let Some(gen) = self.generation_time else {
            return;
        };

        let mut msg = match (self.rtf(), self.audio_duration_secs) {
            (Some(rtf), Some(audio)) => format!(
                "Generation completed in {:.2}s (audio: {:.2}s, RTF: {:.2}x) [cache: {}]",
                gen.as_secs_f64(),
                audio,
                rtf,
                self.cache_status
            ),
            _ => format!(
                "Generation completed in {:.2}s [cache: {}]",
                gen.as_secs_f64(),
                self.cache_status
            ),
        };

        if let Some(prep) = self.preprocessing_time {
            msg.push_str(&format!(" [preprocessing: {:.2}s]", prep.as_secs_f64()));
        }

        info!("{msg}");
    }

    /// Render metrics as response-header name/value pairs
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();

        if let Some(gen) = self.generation_time {
            headers.push(("X-Generation-Time", format!("{:.3}", gen.as_secs_f64())));
        }
        if let Some(audio) = self.audio_duration_secs {
            headers.push(("X-Audio-Duration", format!("{audio:.3}")));
        }
        if let Some(rtf) = self.rtf() {
            headers.push(("X-RTF", format!("{rtf:.3}")));
        }
        headers.push(("X-Cache-Status", self.cache_status.as_str().to_string()));
        if let Some(prep) = self.preprocessing_time {
            headers.push(("X-Preprocessing-Time", format!("{:.3}", prep.as_secs_f64())));
        }

        headers
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
