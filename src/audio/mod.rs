//! Audio processing modules
//!
//! - Reference audio preprocessing (mixdown, smart clipping, edge trimming)
//! - dBFS-based silence analysis heuristics

mod preprocess;
pub mod silence;

pub use preprocess::{
    AudioPreprocessor, ClipMethod, PreprocessMetadata, PreprocessedAudio, RawAudioBuffer,
};
pub use silence::{HeuristicSilence, NullSilence, SilenceParams, SilenceStrategy};
