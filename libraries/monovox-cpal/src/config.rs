//! Backend configuration

use serde::{Deserialize, Serialize};

/// Resampling quality preset
///
/// Used when a buffer's sample rate differs from the output device rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingQuality {
    /// Short linear-interpolated sinc; cheapest upload conversion
    Fast,
    /// Middle ground between [`Fast`](Self::Fast) and [`High`](Self::High)
    Balanced,
    /// Default preset
    #[default]
    High,
    /// Longest filter; uploads of long clips take noticeably longer
    Maximum,
}

impl ResamplingQuality {
    /// Filter length in taps
    pub fn sinc_len(&self) -> usize {
        match self {
            Self::Fast => 64,
            Self::Balanced => 128,
            Self::High => 256,
            Self::Maximum => 512,
        }
    }

    /// Passband edge as a fraction of Nyquist
    pub fn f_cutoff(&self) -> f32 {
        match self {
            Self::Fast => 0.90,
            Self::Balanced => 0.95,
            Self::High => 0.99,
            Self::Maximum => 0.995,
        }
    }

    /// Sinc table oversampling
    pub fn oversampling_factor(&self) -> usize {
        match self {
            Self::Fast => 128,
            Self::Balanced => 256,
            Self::High => 512,
            Self::Maximum => 1024,
        }
    }
}

/// Settings for [`CpalBackend`](crate::CpalBackend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpalBackendConfig {
    /// Quality used when converting buffer sample rates
    #[serde(default)]
    pub resampling_quality: ResamplingQuality,

    /// Capacity of the stream thread command queue
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_command_capacity() -> usize {
    32
}

impl Default for CpalBackendConfig {
    fn default() -> Self {
        Self {
            resampling_quality: ResamplingQuality::default(),
            command_capacity: default_command_capacity(),
        }
    }
}
