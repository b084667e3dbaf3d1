//! Reference audio preprocessing
//!
//! Bounds, trims and normalizes raw decoded PCM before it reaches the TTS
//! engine's prompt builder:
//!
//! 1. Mixdown to mono (channel averaging)
//! 2. Length bounding with a smart-clip fallback chain
//!    (long-silence split -> short-silence split -> hard clip)
//! 3. Edge silence trimming
//! 4. 50 ms tail pad for a natural ending
//!
//! Pure and stateless: safe to call concurrently, but CPU-bound over the
//! full sample array, so dispatch off any single-threaded request loop.

use serde::Serialize;
use tracing::{debug, warn};

use crate::audio::silence::{
    leading_silence_samples, ms_to_samples, trailing_silence_samples, HeuristicSilence,
    SilenceParams, SilenceStrategy,
};
use crate::core::error::{PrepError, Result};

/// Edge-trim threshold (dBFS)
const TRIM_THRESHOLD_DBFS: f32 = -42.0;

/// Tail padding appended for a natural ending (milliseconds)
const TAIL_PAD_MS: u64 = 50;

/// Raw decoded PCM handed in by the caller, one or two channels
#[derive(Debug, Clone)]
pub enum RawAudioBuffer {
    /// Single channel
    Mono(Vec<f32>),
    /// Two channels, interleaved L R L R ...
    Interleaved(Vec<f32>),
    /// Two channels, one buffer per channel
    Planar(Vec<f32>, Vec<f32>),
}

impl RawAudioBuffer {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        match self {
            RawAudioBuffer::Mono(s) => s.len(),
            RawAudioBuffer::Interleaved(s) => s.len() / 2,
            RawAudioBuffer::Planar(l, r) => l.len().min(r.len()),
        }
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        match self {
            RawAudioBuffer::Mono(_) => 1,
            _ => 2,
        }
    }

    /// Average channels into a mono buffer.
    ///
    /// Returns the mono samples and whether a conversion happened; mono
    /// input is passed through untouched, so the step is idempotent.
    fn into_mono(self) -> (Vec<f32>, bool) {
        match self {
            RawAudioBuffer::Mono(s) => (s, false),
            RawAudioBuffer::Interleaved(s) => {
                let mono = s.chunks_exact(2).map(|f| (f[0] + f[1]) * 0.5).collect();
                (mono, true)
            }
            RawAudioBuffer::Planar(l, r) => {
                let mono = l.iter().zip(&r).map(|(a, b)| (a + b) * 0.5).collect();
                (mono, true)
            }
        }
    }
}

/// How the signal was brought within the duration bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMethod {
    /// No clipping was necessary
    None,
    /// Clipped at a long natural pause
    LongSilence,
    /// Clipped at a short pause
    ShortSilence,
    /// Truncated at the bound, no suitable pause found
    HardClip,
    /// Truncated at the bound, silence analysis unavailable
    BasicClip,
}

impl ClipMethod {
    /// Stable string form used in logs and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipMethod::None => "none",
            ClipMethod::LongSilence => "long_silence",
            ClipMethod::ShortSilence => "short_silence",
            ClipMethod::HardClip => "hard_clip",
            ClipMethod::BasicClip => "basic_clip",
        }
    }
}

impl std::fmt::Display for ClipMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What preprocessing did to the signal, attached to the result for logging
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessMetadata {
    /// Input duration in seconds, before mixdown
    pub original_duration_secs: f64,
    /// Output duration in seconds, after the tail pad
    pub processed_duration_secs: f64,
    /// Clipping method applied
    pub clip_method: ClipMethod,
    /// Total edge silence removed, in milliseconds
    pub silence_removed_ms: f64,
    /// Whether a stereo input was mixed down
    pub converted_to_mono: bool,
    /// Sample rate, preserved from the input
    pub sample_rate: u32,
}

/// Preprocessed reference audio: mono samples plus metadata
#[derive(Debug, Clone)]
pub struct PreprocessedAudio {
    /// Mono samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Derived metadata
    pub metadata: PreprocessMetadata,
}

impl PreprocessedAudio {
    /// Duration of the processed samples in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Stateless preprocessor with a silence capability chosen at construction
pub struct AudioPreprocessor {
    silence: Box<dyn SilenceStrategy>,
}

impl AudioPreprocessor {
    /// Create a preprocessor with the given silence strategy
    pub fn new(silence: Box<dyn SilenceStrategy>) -> Self {
        Self { silence }
    }

    /// Create a preprocessor with the full silence heuristic
    pub fn with_heuristics() -> Self {
        Self::new(Box::new(HeuristicSilence))
    }

    /// Preprocess reference audio.
    ///
    /// Never fails for well-formed input: empty audio yields empty output,
    /// silent audio is kept as-is. NaN/Inf samples or a zero sample rate
    /// are rejected with a validation error.
    pub fn preprocess(
        &self,
        audio: RawAudioBuffer,
        sample_rate: u32,
        max_duration_secs: f64,
        target_min_secs: f64,
    ) -> Result<PreprocessedAudio> {
        validate_input(&audio, sample_rate)?;

        let original_duration_secs = audio.frames() as f64 / sample_rate as f64;
        let (mut samples, converted_to_mono) = audio.into_mono();

        if samples.is_empty() {
            return Ok(PreprocessedAudio {
                samples,
                sample_rate,
                metadata: PreprocessMetadata {
                    original_duration_secs: 0.0,
                    processed_duration_secs: 0.0,
                    clip_method: ClipMethod::None,
                    silence_removed_ms: 0.0,
                    converted_to_mono,
                    sample_rate,
                },
            });
        }

        let mut clip_method = ClipMethod::None;
        let max_samples = (max_duration_secs * sample_rate as f64).floor() as usize;
        if samples.len() > max_samples {
            let (clipped, method) =
                self.bound_length(samples, sample_rate, max_samples, target_min_secs);
            samples = clipped;
            clip_method = method;
            debug!(
                method = %clip_method,
                duration_secs = samples.len() as f64 / sample_rate as f64,
                "clipped reference audio"
            );
        }

        let silence_removed_ms = trim_edges(&mut samples, sample_rate);

        // Short tail pad so generation does not end abruptly
        samples.extend(std::iter::repeat(0.0).take(ms_to_samples(TAIL_PAD_MS, sample_rate)));

        let processed_duration_secs = samples.len() as f64 / sample_rate as f64;
        Ok(PreprocessedAudio {
            samples,
            sample_rate,
            metadata: PreprocessMetadata {
                original_duration_secs,
                processed_duration_secs,
                clip_method,
                silence_removed_ms,
                converted_to_mono,
                sample_rate,
            },
        })
    }

    /// Mixdown-only path used when preprocessing is disabled by config
    pub fn mixdown_only(audio: RawAudioBuffer, sample_rate: u32) -> Result<PreprocessedAudio> {
        validate_input(&audio, sample_rate)?;

        let original_duration_secs = audio.frames() as f64 / sample_rate as f64;
        let (samples, converted_to_mono) = audio.into_mono();
        let processed_duration_secs = samples.len() as f64 / sample_rate as f64;
        Ok(PreprocessedAudio {
            samples,
            sample_rate,
            metadata: PreprocessMetadata {
                original_duration_secs,
                processed_duration_secs,
                clip_method: ClipMethod::None,
                silence_removed_ms: 0.0,
                converted_to_mono,
                sample_rate,
            },
        })
    }

    /// Bring an over-long signal within `max_samples`.
    ///
    /// Tries the long-pause split, then the short-pause split, then hard
    /// truncation. A null silence strategy short-circuits to basic_clip.
    fn bound_length(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
        max_samples: usize,
        target_min_secs: f64,
    ) -> (Vec<f32>, ClipMethod) {
        let target_min_samples = (target_min_secs * sample_rate as f64).floor() as usize;

        for (params, method) in [
            (SilenceParams::long_pause(), ClipMethod::LongSilence),
            (SilenceParams::short_pause(), ClipMethod::ShortSilence),
        ] {
            match self.silence.split(&samples, sample_rate, &params) {
                None => {
                    warn!("silence analysis unavailable, falling back to basic clipping");
                    return (truncate(samples, max_samples), ClipMethod::BasicClip);
                }
                Some(segments) => {
                    if let Some(clipped) =
                        accumulate_segments(&segments, max_samples, target_min_samples)
                    {
                        if clipped.len() <= max_samples {
                            return (clipped, method);
                        }
                    }
                }
            }
        }

        (truncate(samples, max_samples), ClipMethod::HardClip)
    }
}

impl Default for AudioPreprocessor {
    fn default() -> Self {
        Self::with_heuristics()
    }
}

/// Accumulate split segments in order until the bound would be exceeded.
///
/// A boundary is only usable once the running total already exceeds the
/// target minimum and the next segment would push past the maximum. Returns
/// `None` when the split produced no segments at all.
fn accumulate_segments(
    segments: &[Vec<f32>],
    max_samples: usize,
    target_min_samples: usize,
) -> Option<Vec<f32>> {
    if segments.is_empty() {
        return None;
    }

    let mut out: Vec<f32> = Vec::new();
    for segment in segments {
        if out.len() > target_min_samples && out.len() + segment.len() > max_samples {
            break;
        }
        out.extend_from_slice(segment);
    }
    Some(out)
}

/// Trim edge silence in place, returning the removed amount in milliseconds.
///
/// A fully-silent signal is left untouched so silent input still produces
/// output.
fn trim_edges(samples: &mut Vec<f32>, sample_rate: u32) -> f64 {
    let lead = leading_silence_samples(samples, sample_rate, TRIM_THRESHOLD_DBFS);
    let trail = trailing_silence_samples(samples, sample_rate, TRIM_THRESHOLD_DBFS);

    if lead + trail >= samples.len() {
        return 0.0;
    }

    let end = samples.len() - trail;
    samples.truncate(end);
    samples.drain(..lead);
    (lead + trail) as f64 * 1000.0 / sample_rate as f64
}

fn truncate(mut samples: Vec<f32>, max_samples: usize) -> Vec<f32> {
    samples.truncate(max_samples);
    samples
}

fn validate_input(audio: &RawAudioBuffer, sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(PrepError::Validation {
            message: "sample rate must be positive".to_string(),
            field: Some("sample_rate".to_string()),
        });
    }

    let finite = match audio {
        RawAudioBuffer::Mono(s) | RawAudioBuffer::Interleaved(s) => {
            s.iter().all(|v| v.is_finite())
        }
        RawAudioBuffer::Planar(l, r) => {
            l.iter().all(|v| v.is_finite()) && r.iter().all(|v| v.is_finite())
        }
    };
    if !finite {
        return Err(PrepError::Validation {
            message: "reference audio contains NaN or infinite samples".to_string(),
            field: Some("reference_audio".to_string()),
        });
    }
    Ok(())
}
