//! Voice prompt caching
//!
//! - Content-derived cache keys over preprocessed reference audio
//! - Bounded LRU store with per-entry TTL and statistics

mod key;
mod store;

pub use key::{derive_key, CacheKey};
pub use store::{CacheStats, CacheStatus, VoicePromptCache};
