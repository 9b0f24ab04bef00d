//! Audio sample assembly.
//!
//! Recorded PCM chunks are combined into a single in-memory WAV payload for
//! replay and upload. Durations are tracked in whole seconds, paced by the
//! recording timer.

mod sample;

pub use sample::{AudioError, AudioSample, SampleBuilder};
