//! Core abstractions shared across the crate
//!
//! - `error`: structured error handling
//! - `metrics`: per-request performance tracking

pub mod error;
pub mod metrics;

pub use error::{AudioOperation, PrepError, Result, ResultExt};
pub use metrics::PerformanceTracker;
