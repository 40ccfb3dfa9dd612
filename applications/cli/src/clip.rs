//! Loading audio files as 16-bit PCM

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// How to interpret an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSource {
    /// RIFF/WAVE, format read from the header
    Wav,
    /// Headerless signed 16-bit little-endian samples
    Raw {
        /// Sample rate in Hz
        sample_rate: u32,
        /// Interleaved channel count
        channels: u16,
    },
}

impl ClipSource {
    /// WAV for `.wav` files, raw otherwise
    pub fn detect(path: &Path, sample_rate: u32, channels: u16) -> Self {
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav {
            Self::Wav
        } else {
            Self::Raw {
                sample_rate,
                channels,
            }
        }
    }
}

/// Decoded audio ready to hand to a session
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Interleaved signed 16-bit little-endian PCM
    pub pcm: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl Clip {
    /// Load `path` as described by `source`
    pub fn load(path: &Path, source: ClipSource) -> Result<Self> {
        match source {
            ClipSource::Wav => Self::load_wav(path),
            ClipSource::Raw {
                sample_rate,
                channels,
            } => {
                let pcm = fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(Self {
                    pcm,
                    sample_rate,
                    channels,
                })
            }
        }
    }

    fn load_wav(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
        let spec = reader.spec();

        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .collect::<Result<_, _>>()
                .context("Failed to decode WAV samples")?,
            (hound::SampleFormat::Int, bits) if bits <= 32 => {
                let shift = i32::from(bits) - 16;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| rescale(v, shift)))
                    .collect::<Result<_, _>>()
                    .context("Failed to decode WAV samples")?
            }
            (hound::SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
                .collect::<Result<_, _>>()
                .context("Failed to decode WAV samples")?,
            (format, bits) => bail!("Unsupported WAV format: {:?} {}-bit", format, bits),
        };

        Ok(Self {
            pcm: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Frame count
    pub fn frames(&self) -> usize {
        self.pcm.len() / (usize::from(self.channels.max(1)) * 2)
    }
}

/// Scale an integer sample of `16 + shift` bits to 16 bits
fn rescale(value: i32, shift: i32) -> i16 {
    let scaled = if shift >= 0 {
        value >> shift
    } else {
        value << -shift
    };
    scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}
