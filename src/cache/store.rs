//! Voice prompt cache
//!
//! Bounded, TTL-aware LRU store for the opaque prompt objects the engine
//! builds from reference audio. One mutex guards the entry map and the
//! hit/miss/eviction counters; every operation is O(1) apart from `clear`,
//! so single-lock serialization stays cheap next to the engine calls the
//! cache exists to avoid.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::key::CacheKey;
use crate::core::error::{PrepError, Result};

/// Outcome of a cache consultation, exposed for response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Stable lowercase string form
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only statistics snapshot, recomputed on demand
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Lookup hits
    pub hits: u64,
    /// Lookup misses (including expired entries)
    pub misses: u64,
    /// Entries evicted to make room
    pub evictions: u64,
    /// hits / (hits + misses) as a percentage, rounded to 2 decimals
    pub hit_rate_percent: f64,
    /// Total lookups recorded
    pub total_requests: u64,
}

#[derive(Debug)]
struct CacheEntry<P> {
    prompt: Arc<P>,
    inserted_at: Instant,
    last_access_at: Instant,
}

#[derive(Debug)]
struct CacheInner<P> {
    entries: LruCache<CacheKey, CacheEntry<P>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Content-addressed store for voice clone prompts
///
/// Generic over the prompt type, which the cache never inspects. All public
/// operations are safe to call from any number of threads.
///
/// # Example
///
/// ```rust,ignore
/// let cache: VoicePromptCache<Prompt> = VoicePromptCache::new(100, Duration::from_secs(3600))?;
/// let key = derive_key(&audio.samples, audio.sample_rate, ref_text, false);
/// let (prompt, status) = cache.get_or_create(key, || engine.create_prompt(&audio))?;
/// ```
#[derive(Debug)]
pub struct VoicePromptCache<P> {
    inner: Mutex<CacheInner<P>>,
    ttl: Duration,
    max_size: NonZeroUsize,
}

impl<P> VoicePromptCache<P> {
    /// Create a cache with the given capacity and per-entry TTL.
    ///
    /// A zero capacity is a configuration error, surfaced at startup.
    pub fn new(max_size: usize, ttl: Duration) -> Result<Self> {
        let max_size = NonZeroUsize::new(max_size).ok_or_else(|| PrepError::Config {
            message: "cache max_size must be greater than zero".to_string(),
        })?;
        Ok(Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(max_size),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            ttl,
            max_size,
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a prompt by key.
    ///
    /// An expired entry is removed as a side effect and counts as a miss;
    /// a fresh entry is marked most-recently-used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<P>> {
        let mut inner = self.lock();

        let state = inner
            .entries
            .peek(key)
            .map(|entry| entry.inserted_at.elapsed() > self.ttl);

        match state {
            None => {
                inner.misses += 1;
                debug!(%key, "cache miss");
                None
            }
            Some(true) => {
                inner.entries.pop(key);
                inner.misses += 1;
                debug!(%key, "cache entry expired");
                None
            }
            Some(false) => {
                let prompt = inner.entries.get_mut(key).map(|entry| {
                    entry.last_access_at = Instant::now();
                    entry.prompt.clone()
                });
                inner.hits += 1;
                debug!(%key, "cache hit");
                prompt
            }
        }
    }

    /// Store a prompt, evicting the least-recently-used entry when a new key
    /// arrives at capacity. Returns the shared handle to the stored prompt.
    pub fn put(&self, key: CacheKey, prompt: P) -> Arc<P> {
        let prompt = Arc::new(prompt);
        let now = Instant::now();
        let entry = CacheEntry {
            prompt: prompt.clone(),
            inserted_at: now,
            last_access_at: now,
        };

        let mut inner = self.lock();
        if let Some((evicted_key, _)) = inner.entries.push(key, entry) {
            // push returns the replaced entry for the same key, or the
            // evicted LRU pair for a new key at capacity
            if evicted_key != key {
                inner.evictions += 1;
                debug!(key = %evicted_key, "evicted least recently used prompt");
            }
        }
        debug!(%key, "cached voice prompt");
        prompt
    }

    /// Fetch the prompt for `key`, building and storing it on a miss
    pub fn get_or_create<F, E>(
        &self,
        key: CacheKey,
        build: F,
    ) -> std::result::Result<(Arc<P>, CacheStatus), E>
    where
        F: FnOnce() -> std::result::Result<P, E>,
    {
        if let Some(prompt) = self.get(&key) {
            return Ok((prompt, CacheStatus::Hit));
        }
        let prompt = build()?;
        Ok((self.put(key, prompt), CacheStatus::Miss))
    }

    /// Remove all entries; counters are untouched
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        info!("voice prompt cache cleared");
    }

    /// Reset the hit/miss/eviction counters
    pub fn reset_stats(&self) {
        let mut inner = self.lock();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
        info!("cache statistics reset");
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        let hit_rate_percent = if total > 0 {
            round2(inner.hits as f64 / total as f64 * 100.0)
        } else {
            0.0
        };
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_size.get(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            hit_rate_percent,
            total_requests: total,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::derive_key;

    fn key(n: u32) -> CacheKey {
        let samples: Vec<f32> = (0..100).map(|i| (i * n) as f32 * 1e-4).collect();
        derive_key(&samples, 24000, None, false)
    }

    fn cache(max_size: usize) -> VoicePromptCache<String> {
        VoicePromptCache::new(max_size, Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn test_zero_capacity_is_config_error() {
        let err = VoicePromptCache::<String>::new(0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PrepError::Config { .. }));
    }

    #[test]
    fn test_put_get_round_trip() {
        let cache = cache(10);
        let k = key(1);
        cache.put(k, "prompt-1".to_string());
        assert_eq!(cache.get(&k).unwrap().as_str(), "prompt-1");
    }

    #[test]
    fn test_absent_key_is_miss() {
        let cache = cache(10);
        assert!(cache.get(&key(9)).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_capacity_bound_evicts_oldest() {
        let cache = cache(3);
        for n in 0..4 {
            cache.put(key(n), format!("p{n}"));
        }

        let stats = cache.stats();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.evictions, 1);
        assert!(cache.get(&key(0)).is_none(), "first key should be evicted");
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn test_lru_ordering_respects_access() {
        let cache = cache(3);
        cache.put(key(1), "a".to_string());
        cache.put(key(2), "b".to_string());
        cache.put(key(3), "c".to_string());

        // Touch A, making B the least recently used
        assert!(cache.get(&key(1)).is_some());
        cache.put(key(4), "d".to_string());

        assert!(cache.get(&key(2)).is_none(), "B should have been evicted");
        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(3)).is_some());
        assert!(cache.get(&key(4)).is_some());
    }

    #[test]
    fn test_replacing_existing_key_is_not_an_eviction() {
        let cache = cache(2);
        cache.put(key(1), "a".to_string());
        cache.put(key(2), "b".to_string());
        cache.put(key(1), "a2".to_string());

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 0);
        assert_eq!(cache.get(&key(1)).unwrap().as_str(), "a2");
    }

    #[test]
    fn test_ttl_expiry() {
        let cache: VoicePromptCache<String> =
            VoicePromptCache::new(10, Duration::from_millis(50)).unwrap();
        let k = key(1);
        cache.put(k, "p".to_string());

        assert!(cache.get(&k).is_some(), "fresh entry should be a hit");

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get(&k).is_none(), "expired entry should be a miss");
        assert_eq!(cache.len(), 0, "expired entry should be removed");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 0, "expiry is not an eviction");
    }

    #[test]
    fn test_hit_rate_arithmetic() {
        let cache = cache(10);
        let k = key(1);
        assert!(cache.get(&k).is_none()); // miss
        cache.put(k, "p".to_string());
        for _ in 0..3 {
            assert!(cache.get(&k).is_some()); // 3 hits
        }

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.hit_rate_percent, 75.0);
    }

    #[test]
    fn test_hit_rate_zero_without_requests() {
        assert_eq!(cache(10).stats().hit_rate_percent, 0.0);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = cache(10);
        let k = key(1);
        cache.put(k, "p".to_string());
        cache.get(&k);
        cache.clear();

        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1, "clear must not touch counters");

        cache.reset_stats();
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_get_or_create_builds_once() {
        let cache = cache(10);
        let k = key(1);

        let (first, status) = cache
            .get_or_create(k, || Ok::<_, PrepError>("built".to_string()))
            .unwrap();
        assert_eq!(status, CacheStatus::Miss);

        let built_again = std::sync::atomic::AtomicBool::new(false);
        let (second, status) = cache
            .get_or_create(k, || {
                built_again.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok::<_, PrepError>(String::new())
            })
            .unwrap();
        assert_eq!(status, CacheStatus::Hit);
        assert!(!built_again.load(std::sync::atomic::Ordering::SeqCst));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_or_create_propagates_build_error() {
        let cache = cache(10);
        let err = cache
            .get_or_create(key(1), || {
                Err::<String, _>(PrepError::Internal {
                    message: "engine failed".to_string(),
                })
            })
            .unwrap_err();
        assert!(err.to_string().contains("engine failed"));
        assert!(cache.is_empty(), "failed build must not insert an entry");
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(cache(16));
        let mut handles = Vec::new();
        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let k = key(t * 50 + i);
                    cache.put(k, format!("{t}-{i}"));
                    cache.get(&k);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.size, 16);
        assert_eq!(stats.total_requests, 200);
    }
}
