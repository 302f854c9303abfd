//! Audio note handling: uploaded file → decode → downmix → 16 kHz resample.
//!
//! # Pipeline
//!
//! ```text
//! bytes + extension → symphonia probe/decode → stereo_to_mono
//!                   → resample_to_16k (rubato) → Vec<f32> for Whisper
//! ```

pub mod decode;
pub mod resample;

pub use decode::{decode_to_pcm, is_supported_audio, AudioError, SUPPORTED_EXTENSIONS};
pub use resample::{resample_to_16k, stereo_to_mono, TARGET_RATE};
