//! Channel mixing and sample-rate conversion.
//!
//! Whisper needs **16 kHz mono `f32`**.  [`stereo_to_mono`] averages
//! interleaved channels; [`resample_to_16k`] converts the rate with a
//! band-limited sinc resampler from `rubato`.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::audio::decode::AudioError;

/// Sample rate expected by the STT engine.
pub const TARGET_RATE: u32 = 16_000;

const CHUNK_SIZE: usize = 1024;

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// * `channels == 1` returns the input unchanged.
/// * `channels == 0` returns an empty vector.
///
/// ```rust
/// use helpdesk_assistant::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!(mono[0].abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to 16 000 Hz.
///
/// The output length is `ceil(samples.len() * 16_000 / source_rate)`.  The
/// resampler's group delay is dropped from the front and its tail is flushed,
/// so the signal stays time-aligned with the input.
///
/// ```rust
/// use helpdesk_assistant::audio::resample_to_16k;
///
/// let hi = vec![0.0_f32; 48_000];
/// assert_eq!(resample_to_16k(&hi, 48_000).unwrap().len(), 16_000);
/// ```
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Result<Vec<f32>, AudioError> {
    if source_rate == TARGET_RATE {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    if source_rate == 0 {
        return Err(AudioError::UnknownSampleRate);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = TARGET_RATE as f64 / source_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).ceil() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| AudioError::Resample(format!("init: {e}")))?;

    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let processed = if chunk.len() == CHUNK_SIZE {
            resampler.process(&[chunk][..], None)
        } else {
            resampler.process_partial(Some(&[chunk][..]), None)
        }
        .map_err(|e| AudioError::Resample(e.to_string()))?;
        output.extend_from_slice(&processed[0]);
    }

    // Flush the filter tail until the delayed signal is fully out.
    while output.len() < expected_len + delay {
        let tail = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if tail[0].is_empty() {
            break;
        }
        output.extend_from_slice(&tail[0]);
    }

    let start = delay.min(output.len());
    let mut aligned = output.split_off(start);
    aligned.resize(expected_len, 0.0);
    Ok(aligned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
