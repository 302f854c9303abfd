//! Transcription parameters and the audio-note adapter.
//!
//! [`transcribe_audio`] is what the orchestrator calls: it decodes an
//! uploaded file and hands the PCM to whichever [`SttEngine`] is installed.

use crate::audio::decode_to_pcm;
use crate::config::SttConfig;
use crate::stt::engine::{SttEngine, SttError};

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// All parameters for a single Whisper transcription run.
///
/// ```
/// use helpdesk_assistant::stt::TranscribeParams;
///
/// let params = TranscribeParams {
///     language: "en".into(),
///     ..TranscribeParams::default()
/// };
/// assert_eq!(params.language, "en");
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 language code, or `"auto"` for detection.
    pub language: String,
    /// CPU threads handed to Whisper, capped at 8.
    pub n_threads: i32,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "auto".into(),
            n_threads: optimal_threads(),
        }
    }
}

impl TranscribeParams {
    pub fn from_config(config: &SttConfig) -> Self {
        Self {
            language: config.language.clone(),
            ..Self::default()
        }
    }

    /// The language as whisper-rs expects it: `None` means detect.
    pub(crate) fn whisper_language(&self) -> Option<&str> {
        match self.language.trim() {
            "" | "auto" => None,
            code => Some(code),
        }
    }
}

pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// transcribe_audio
// ---------------------------------------------------------------------------

/// Decode an uploaded audio note and transcribe it.
///
/// `extension` is the file extension of the upload (`wav`, `mp3`, `m4a`).
/// Blocking: run it on `spawn_blocking` from async code.
pub fn transcribe_audio(
    engine: &dyn SttEngine,
    bytes: &[u8],
    extension: &str,
) -> Result<String, SttError> {
    let pcm = decode_to_pcm(bytes, extension)?;
    log::info!(
        "transcribing audio note ({:.1}s)",
        pcm.len() as f32 / crate::audio::TARGET_RATE as f32
    );
    engine.transcribe(&pcm)
}
