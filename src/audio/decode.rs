//! Uploaded audio file → 16 kHz mono `f32` PCM.
//!
//! Containers are probed with `symphonia`; the file extension is only a hint.
//! Every decoded packet is downmixed to mono, and the complete signal is
//! resampled once at the end.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::audio::resample::{resample_to_16k, stereo_to_mono};

/// Extensions accepted by the upload picker.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "m4a"];

/// Errors raised while turning an uploaded file into PCM.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    #[error("unsupported audio format: {0:?} (expected wav, mp3 or m4a)")]
    UnsupportedFormat(String),

    #[error("could not recognise the audio container: {0}")]
    Probe(String),

    #[error("the file has no audio track")]
    NoTrack,

    #[error("the audio track has no sample rate")]
    UnknownSampleRate,

    #[error("audio decoding failed: {0}")]
    Decode(String),

    #[error("the file contains no audio samples")]
    Empty,

    #[error("resampling failed: {0}")]
    Resample(String),
}

/// `true` when `extension` (with or without a leading dot, any case) is one
/// of [`SUPPORTED_EXTENSIONS`].
///
/// ```rust
/// use helpdesk_assistant::audio::is_supported_audio;
///
/// assert!(is_supported_audio("M4A"));
/// assert!(is_supported_audio(".wav"));
/// assert!(!is_supported_audio("flac"));
/// ```
pub fn is_supported_audio(extension: &str) -> bool {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

/// Decode an in-memory audio file and return 16 kHz mono samples.
pub fn decode_to_pcm(data: &[u8], extension: &str) -> Result<Vec<f32>, AudioError> {
    if !is_supported_audio(extension) {
        return Err(AudioError::UnsupportedFormat(extension.to_string()));
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(&extension.trim_start_matches('.').to_ascii_lowercase());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Probe(e.to_string()))?;

    let mut format = probed.format;

    let track = format.default_track().ok_or(AudioError::NoTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params.sample_rate.ok_or(AudioError::UnknownSampleRate)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("codec: {e}")))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AudioError::Decode(format!("packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("skipping corrupt audio frame: {e}");
                continue;
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
        buf.copy_interleaved_ref(decoded);
        let channels = spec.channels.count() as u16;
        mono.extend(stereo_to_mono(buf.samples(), channels));
    }

    if mono.is_empty() {
        return Err(AudioError::Empty);
    }

    let pcm = resample_to_16k(&mono, source_rate)?;
    log::debug!(
        "decoded {extension} note: {source_rate} Hz → 16 kHz, {:.2}s",
        pcm.len() as f32 / 16_000.0
    );
    Ok(pcm)
}

/// Minimal 16-bit PCM WAV writer for test fixtures.
#[cfg(test)]
pub(crate) fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
