//! PCM conversion into the device's native layout
//!
//! Buffers arrive as interleaved i16 at the caller's rate and channel count.
//! The output stream consumes interleaved f32 at the device rate and channel
//! count, so uploads are converted once, up front.

use dasp::Sample;
use monovox_core::BackendError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::config::ResamplingQuality;

/// Decode little-endian i16 bytes into f32 samples in [-1.0, 1.0]
///
/// A trailing odd byte is ignored.
pub fn decode_i16_le(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]).to_sample::<f32>())
        .collect()
}

/// Map interleaved frames from `from` channels onto `to` channels
///
/// Mono feeds the first two output channels, stereo keeps left/right and
/// any extra output channels stay silent. A mono device gets the average.
/// An incomplete trailing frame is dropped.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == 0 || to == 0 {
        return Vec::new();
    }
    if from == to {
        let whole = samples.len() - samples.len() % from;
        return samples[..whole].to_vec();
    }

    let frames = samples.chunks_exact(from);
    let mut out = Vec::with_capacity(frames.len() * to);
    for frame in frames {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
            continue;
        }
        for ch in 0..to {
            let value = match from {
                1 if ch < 2 => frame[0],
                _ if ch < from.min(2) => frame[ch],
                _ => 0.0,
            };
            out.push(value);
        }
    }
    out
}

/// Lowest buffer sample rate accepted for upload, in Hz
pub const MIN_SAMPLE_RATE: u32 = 1_000;

/// Highest buffer sample rate accepted for upload, in Hz
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Reject buffer rates the resampler cannot turn into a sane ratio
pub fn validate_sample_rate(sample_rate: u32) -> Result<(), BackendError> {
    if (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
        Ok(())
    } else {
        Err(BackendError::invalid_value(format!(
            "sample rate {} Hz outside {}..={} Hz",
            sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
        )))
    }
}

/// Resample interleaved `samples` from `source_rate` to `target_rate`
pub fn resample(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
    quality: ResamplingQuality,
) -> Result<Vec<f32>, BackendError> {
    validate_sample_rate(source_rate)?;
    if source_rate == target_rate || channels == 0 {
        return Ok(samples.to_vec());
    }
    let frames = samples.len() / channels;
    if frames == 0 {
        return Ok(Vec::new());
    }

    let interpolation = match quality {
        ResamplingQuality::Fast => SincInterpolationType::Linear,
        _ => SincInterpolationType::Cubic,
    };

    let params = SincInterpolationParameters {
        sinc_len: quality.sinc_len(),
        f_cutoff: quality.f_cutoff(),
        interpolation,
        oversampling_factor: quality.oversampling_factor(),
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(target_rate) / f64::from(source_rate),
        2.0,
        params,
        frames,
        channels,
    )
    .map_err(|e| BackendError::stream(format!("resampler setup: {}", e)))?;

    // Deinterleave
    let mut deinterleaved = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, sample) in deinterleaved.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let resampled = resampler
        .process(&deinterleaved, None)
        .map_err(|e| BackendError::stream(format!("resampling: {}", e)))?;

    // Interleave
    let output_frames = resampled[0].len();
    let mut interleaved = Vec::with_capacity(output_frames * channels);
    for frame_idx in 0..output_frames {
        for channel_data in &resampled {
            interleaved.push(channel_data[frame_idx]);
        }
    }

    Ok(interleaved)
}
