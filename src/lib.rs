//! # voice-prep - Reference Audio Preparation for Voice Cloning
//!
//! The reference-preparation core of a TTS front-end: everything that happens
//! to a voice-clone reference recording before it reaches the engine, and the
//! memoization of the expensive prompt-construction step.
//!
//! ## Features
//!
//! - **Audio Preprocessing**: mixdown, smart length clipping at natural
//!   pauses, edge silence trimming, tail padding
//! - **Voice Prompt Cache**: content-addressed LRU store with per-entry TTL,
//!   generic over the engine's opaque prompt type
//! - **Request Orchestration**: preprocess, derive key, get-or-create in one
//!   call, with hit/miss status for response headers
//! - **Instrumentation**: per-request RTF and timing tracker
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voice_prep::{PrepConfig, RawAudioBuffer, ReferencePreparer};
//!
//! let preparer: ReferencePreparer<EnginePrompt> =
//!     ReferencePreparer::new(PrepConfig::default())?;
//!
//! // Per request: decode audio externally, then prepare it
//! let prepared = preparer.prepare(
//!     RawAudioBuffer::Mono(samples),
//!     sample_rate,
//!     Some("reference transcript"),
//!     false,
//!     |audio| engine.create_prompt(audio),
//! )?;
//!
//! let waveform = engine.generate(text, &prepared.prompt)?;
//! response.header("X-Cache-Status", prepared.cache_status.as_str());
//! ```
//!
//! The engine itself (prompt construction and generation), audio decoding,
//! and the HTTP surface are external collaborators; this crate is called
//! strictly before and independently of them.

pub mod audio;
pub mod cache;
pub mod config;
pub mod core;
pub mod prepare;

// Audio exports
pub use audio::{
    AudioPreprocessor, ClipMethod, HeuristicSilence, NullSilence, PreprocessMetadata,
    PreprocessedAudio, RawAudioBuffer, SilenceParams, SilenceStrategy,
};

// Cache exports
pub use cache::{derive_key, CacheKey, CacheStats, CacheStatus, VoicePromptCache};

// Configuration exports
pub use config::{CacheSettings, PrepConfig, PreprocessSettings};

// Core framework re-exports
pub use crate::core::{
    error::{AudioOperation, PrepError, Result, ResultExt},
    metrics::PerformanceTracker,
};

// Request orchestration exports
pub use prepare::{PreparedReference, ReferencePreparer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
