//! dBFS-based silence analysis
//!
//! Peak-relative silence detection used for smart length clipping and edge
//! trimming of reference audio. The splitting heuristic is pluggable: the
//! preprocessor is built with either the full [`HeuristicSilence`] strategy
//! or [`NullSilence`], which disables splitting and forces basic truncation.

/// Analysis granularity for silence scanning (milliseconds)
const ANALYSIS_CHUNK_MS: u64 = 10;

/// Added before log10 so exact zero does not produce -inf
const DBFS_EPSILON: f32 = 1e-10;

/// Peak level of a chunk in dBFS, with full scale at 1.0
pub fn peak_dbfs(samples: &[f32]) -> f32 {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    20.0 * (peak + DBFS_EPSILON).log10()
}

/// Parameters for one silence-splitting pass
#[derive(Debug, Clone, Copy)]
pub struct SilenceParams {
    /// Minimum silence length to split at (milliseconds)
    pub min_silence_ms: u64,
    /// Level below which audio counts as silence (dBFS)
    pub threshold_dbfs: f32,
    /// Silence preserved at each segment boundary (milliseconds)
    pub keep_silence_ms: u64,
}

impl SilenceParams {
    /// Coarse parameters: split at long natural pauses
    pub fn long_pause() -> Self {
        Self {
            min_silence_ms: 1000,
            threshold_dbfs: -50.0,
            keep_silence_ms: 1000,
        }
    }

    /// Fine parameters: split at short pauses
    pub fn short_pause() -> Self {
        Self {
            min_silence_ms: 100,
            threshold_dbfs: -40.0,
            keep_silence_ms: 100,
        }
    }
}

/// Silence-splitting capability, selected once at preprocessor construction
pub trait SilenceStrategy: Send + Sync {
    /// Split `samples` into segments at qualifying silences, preserving up to
    /// `keep_silence_ms` of silence at each boundary.
    ///
    /// Returns `None` when silence analysis is unavailable, in which case the
    /// caller falls back to plain truncation. An empty segment list means the
    /// signal contained no non-silent content.
    fn split(&self, samples: &[f32], sample_rate: u32, params: &SilenceParams)
        -> Option<Vec<Vec<f32>>>;
}

/// Full dBFS-scan splitting heuristic
pub struct HeuristicSilence;

/// Disabled silence analysis; always reports the capability as unavailable
pub struct NullSilence;

impl SilenceStrategy for HeuristicSilence {
    fn split(
        &self,
        samples: &[f32],
        sample_rate: u32,
        params: &SilenceParams,
    ) -> Option<Vec<Vec<f32>>> {
        if samples.is_empty() {
            return Some(Vec::new());
        }

        let silences = detect_silent_ranges(
            samples,
            sample_rate,
            params.min_silence_ms,
            params.threshold_dbfs,
        );
        let keep = ms_to_samples(params.keep_silence_ms, sample_rate);

        // Non-silent spans between the detected silences
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut cursor = 0usize;
        for &(start, end) in &silences {
            if start > cursor {
                spans.push((cursor, start));
            }
            cursor = end;
        }
        if cursor < samples.len() {
            spans.push((cursor, samples.len()));
        }

        let segments = spans
            .iter()
            .map(|&(start, end)| {
                let left = silences.iter().find(|&&(_, s_end)| s_end == start);
                let right = silences.iter().find(|&&(s_start, _)| s_start == end);
                let ext_left = left.map_or(0, |&(s_start, s_end)| {
                    boundary_extension(s_end - s_start, keep, s_start == 0)
                });
                let ext_right = right.map_or(0, |&(s_start, s_end)| {
                    boundary_extension(s_end - s_start, keep, s_end == samples.len())
                });
                samples[start - ext_left..end + ext_right].to_vec()
            })
            .collect();

        Some(segments)
    }
}

impl SilenceStrategy for NullSilence {
    fn split(&self, _: &[f32], _: u32, _: &SilenceParams) -> Option<Vec<Vec<f32>>> {
        None
    }
}

/// How far a segment may extend into an adjacent silent range.
///
/// Interior silences are shared between two neighbours, so each side gets at
/// most half; edge silences border a single segment and may be consumed up to
/// the full keep length.
fn boundary_extension(silence_len: usize, keep: usize, at_edge: bool) -> usize {
    if at_edge {
        keep.min(silence_len)
    } else {
        keep.min(silence_len / 2)
    }
}

/// Silent sample ranges of at least `min_silence_ms`, scanned in ~10 ms chunks
fn detect_silent_ranges(
    samples: &[f32],
    sample_rate: u32,
    min_silence_ms: u64,
    threshold_dbfs: f32,
) -> Vec<(usize, usize)> {
    let chunk = analysis_chunk(sample_rate);
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + chunk).min(samples.len());
        let silent = peak_dbfs(&samples[pos..end]) < threshold_dbfs;
        match (silent, run_start) {
            (true, None) => run_start = Some(pos),
            (false, Some(start)) => {
                ranges.push((start, pos));
                run_start = None;
            }
            _ => {}
        }
        pos = end;
    }
    if let Some(start) = run_start {
        ranges.push((start, samples.len()));
    }

    let min_len = ms_to_samples(min_silence_ms, sample_rate);
    ranges.retain(|&(start, end)| end - start >= min_len);
    ranges
}

/// Leading samples below `threshold_dbfs`, scanned in ~10 ms chunks
pub fn leading_silence_samples(samples: &[f32], sample_rate: u32, threshold_dbfs: f32) -> usize {
    let chunk = analysis_chunk(sample_rate);
    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + chunk).min(samples.len());
        if peak_dbfs(&samples[pos..end]) > threshold_dbfs {
            return pos;
        }
        pos = end;
    }
    samples.len()
}

/// Trailing samples below `threshold_dbfs`, scanned in ~10 ms chunks
pub fn trailing_silence_samples(samples: &[f32], sample_rate: u32, threshold_dbfs: f32) -> usize {
    let chunk = analysis_chunk(sample_rate);
    let mut end = samples.len();
    while end > 0 {
        let start = end.saturating_sub(chunk);
        if peak_dbfs(&samples[start..end]) > threshold_dbfs {
            return samples.len() - end;
        }
        end = start;
    }
    samples.len()
}

fn analysis_chunk(sample_rate: u32) -> usize {
    ms_to_samples(ANALYSIS_CHUNK_MS, sample_rate).max(1)
}

/// Sample count for a duration in milliseconds (floor)
pub fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    (ms as u128 * sample_rate as u128 / 1000) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 24000;

    fn tone(secs: f64, amp: f32) -> Vec<f32> {
        let n = (secs * SR as f64) as usize;
        (0..n)
            .map(|i| amp * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SR as f32).sin())
            .collect()
    }

    fn silence(secs: f64) -> Vec<f32> {
        vec![0.0; (secs * SR as f64) as usize]
    }

    #[test]
    fn test_peak_dbfs_silence_is_very_low() {
        assert!(peak_dbfs(&[0.0; 256]) < -150.0);
    }

    #[test]
    fn test_peak_dbfs_full_scale_is_zero() {
        let db = peak_dbfs(&[1.0, -0.5, 0.25]);
        assert!(db.abs() < 0.01, "full-scale peak should be ~0 dBFS, got {db}");
    }

    #[test]
    fn test_leading_silence_detected() {
        let mut samples = silence(2.0);
        samples.extend(tone(1.0, 0.5));
        let lead = leading_silence_samples(&samples, SR, -42.0);
        let lead_secs = lead as f64 / SR as f64;
        assert!((1.9..=2.1).contains(&lead_secs), "got {lead_secs}s");
    }

    #[test]
    fn test_trailing_silence_detected() {
        let mut samples = tone(1.0, 0.5);
        samples.extend(silence(2.0));
        let trail = trailing_silence_samples(&samples, SR, -42.0);
        let trail_secs = trail as f64 / SR as f64;
        assert!((1.9..=2.1).contains(&trail_secs), "got {trail_secs}s");
    }

    #[test]
    fn test_split_at_long_pause() {
        let mut samples = tone(3.0, 0.5);
        samples.extend(silence(1.5));
        samples.extend(tone(3.0, 0.5));

        let segments = HeuristicSilence
            .split(&samples, SR, &SilenceParams::long_pause())
            .unwrap();
        assert_eq!(segments.len(), 2);

        // Each segment keeps up to half of the shared 1.5s silence
        let first_secs = segments[0].len() as f64 / SR as f64;
        assert!(first_secs > 3.0 && first_secs < 4.0, "got {first_secs}s");
    }

    #[test]
    fn test_split_continuous_audio_yields_single_segment() {
        let samples = tone(5.0, 0.5);
        let segments = HeuristicSilence
            .split(&samples, SR, &SilenceParams::long_pause())
            .unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), samples.len());
    }

    #[test]
    fn test_split_fully_silent_yields_no_segments() {
        let samples = silence(4.0);
        let segments = HeuristicSilence
            .split(&samples, SR, &SilenceParams::long_pause())
            .unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn test_short_pause_params_are_finer() {
        let mut samples = tone(1.0, 0.5);
        samples.extend(silence(0.3));
        samples.extend(tone(1.0, 0.5));

        // 300ms pause: too short for the long-pause split, found by the short one
        let long = HeuristicSilence
            .split(&samples, SR, &SilenceParams::long_pause())
            .unwrap();
        assert_eq!(long.len(), 1);

        let short = HeuristicSilence
            .split(&samples, SR, &SilenceParams::short_pause())
            .unwrap();
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn test_null_strategy_reports_unavailable() {
        assert!(NullSilence
            .split(&[0.1; 1024], SR, &SilenceParams::long_pause())
            .is_none());
    }
}
