//! Speech-to-text for uploaded audio notes.
//!
//! ```text
//! bytes + extension ──▶ audio::decode_to_pcm ──▶ SttEngine::transcribe ──▶ text
//!                                                  ├─ WhisperEngine (whisper-rs)
//!                                                  └─ NoModelStt    (model missing)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use helpdesk_assistant::stt::{transcribe_audio, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-base.bin", TranscribeParams::default())
//!     .expect("model not found");
//! let bytes = std::fs::read("note.m4a").unwrap();
//! println!("{}", transcribe_audio(&engine, &bytes, "m4a").unwrap());
//! ```

pub mod engine;
pub mod model;
pub mod transcribe;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{NoModelStt, SttEngine, SttError, WhisperEngine};
pub use model::{find_model_by_id, ModelInfo, ModelPaths, WHISPER_MODELS};
pub use transcribe::{transcribe_audio, TranscribeParams};

#[cfg(test)]
pub use engine::MockSttEngine;
