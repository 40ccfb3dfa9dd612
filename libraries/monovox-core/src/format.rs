//! Sample formats, device attributes and playback info

use serde::{Deserialize, Serialize};

/// Attribute key requesting HRTF rendering at device reset
pub const ATTR_HRTF: i32 = 0x1992;

/// Attribute value for "enabled"
pub const ATTR_TRUE: i32 = 1;

/// Attribute value for "disabled"
pub const ATTR_FALSE: i32 = 0;

/// 16-bit interleaved PCM layout accepted by a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// One channel, signed 16-bit little-endian
    Mono16,

    /// Two interleaved channels, signed 16-bit little-endian
    Stereo16,
}

impl SampleFormat {
    /// Map a caller-supplied channel count to a format tag
    ///
    /// `1` selects mono; every other value selects stereo. Counts above two
    /// are not rejected.
    pub fn from_channels(channels: u16) -> Self {
        if channels == 1 {
            Self::Mono16
        } else {
            Self::Stereo16
        }
    }

    /// Number of interleaved channels
    pub fn channels(self) -> u16 {
        match self {
            Self::Mono16 => 1,
            Self::Stereo16 => 2,
        }
    }

    /// Bytes occupied by one frame (one sample per channel)
    pub fn bytes_per_frame(self) -> usize {
        2 * self.channels() as usize
    }
}

/// Summary of a successfully issued `play`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackInfo {
    /// Buffer length in milliseconds
    pub duration_ms: u64,

    /// Sample rate the buffer was tagged with (Hz)
    pub sample_rate: u32,

    /// Channel count of the selected format
    pub channels: u16,
}

impl PlaybackInfo {
    /// Describe a payload of `byte_len` bytes uploaded with `format` at `sample_rate`
    pub fn new(byte_len: usize, format: SampleFormat, sample_rate: u32) -> Self {
        let frames = (byte_len / format.bytes_per_frame()) as u64;
        let duration_ms = (frames * 1000)
            .checked_div(u64::from(sample_rate))
            .unwrap_or(0);

        Self {
            duration_ms,
            sample_rate,
            channels: format.channels(),
        }
    }
}

/// A single device-reset attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceAttribute {
    /// Request (or refuse) HRTF spatialization
    Hrtf(bool),
}

impl DeviceAttribute {
    fn key_value(self) -> (i32, i32) {
        match self {
            Self::Hrtf(enabled) => (ATTR_HRTF, if enabled { ATTR_TRUE } else { ATTR_FALSE }),
        }
    }
}

/// Ordered attribute list passed to a device reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes(Vec<DeviceAttribute>);

impl DeviceAttributes {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute list that asks for HRTF rendering
    pub fn hrtf() -> Self {
        Self(vec![DeviceAttribute::Hrtf(true)])
    }

    /// Append an attribute
    #[must_use]
    pub fn with(mut self, attribute: DeviceAttribute) -> Self {
        self.0.push(attribute);
        self
    }

    /// Attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceAttribute> {
        self.0.iter()
    }

    /// Whether HRTF is requested; the last `Hrtf` entry wins
    pub fn requests_hrtf(&self) -> bool {
        self.0
            .iter()
            .rev()
            .map(|attr| match attr {
                DeviceAttribute::Hrtf(enabled) => *enabled,
            })
            .next()
            .unwrap_or(false)
    }

    /// Flat `[key, value, ..., 0]` encoding terminated by the zero sentinel
    pub fn to_raw(&self) -> Vec<i32> {
        let mut raw = Vec::with_capacity(self.0.len() * 2 + 1);
        for attr in &self.0 {
            let (key, value) = attr.key_value();
            raw.push(key);
            raw.push(value);
        }
        raw.push(0);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_channel_is_mono() {
        assert_eq!(SampleFormat::from_channels(1), SampleFormat::Mono16);
    }

    #[test]
    fn everything_else_is_stereo() {
        for channels in [0, 2, 3, 6, u16::MAX] {
            assert_eq!(SampleFormat::from_channels(channels), SampleFormat::Stereo16);
        }
    }

    #[test]
    fn frame_sizes() {
        assert_eq!(SampleFormat::Mono16.bytes_per_frame(), 2);
        assert_eq!(SampleFormat::Stereo16.bytes_per_frame(), 4);
    }

    #[test]
    fn playback_info_duration() {
        // 1 second of 44.1kHz stereo
        let info = PlaybackInfo::new(44_100 * 4, SampleFormat::Stereo16, 44_100);
        assert_eq!(info.duration_ms, 1000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 44_100);

        // Half a second of 48kHz mono
        let info = PlaybackInfo::new(24_000 * 2, SampleFormat::Mono16, 48_000);
        assert_eq!(info.duration_ms, 500);
    }

    #[test]
    fn playback_info_zero_rate() {
        let info = PlaybackInfo::new(1024, SampleFormat::Mono16, 0);
        assert_eq!(info.duration_ms, 0);
    }

    #[test]
    fn playback_info_serializes_camel_case() {
        let info = PlaybackInfo::new(4, SampleFormat::Stereo16, 1000);
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["durationMs"], 1);
        assert_eq!(json["sampleRate"], 1000);
        assert_eq!(json["channels"], 2);
    }

    #[test]
    fn hrtf_attributes_are_zero_terminated() {
        assert_eq!(DeviceAttributes::hrtf().to_raw(), vec![ATTR_HRTF, ATTR_TRUE, 0]);
        assert_eq!(DeviceAttributes::new().to_raw(), vec![0]);
    }

    #[test]
    fn last_hrtf_entry_wins() {
        let attrs = DeviceAttributes::hrtf().with(DeviceAttribute::Hrtf(false));
        assert!(!attrs.requests_hrtf());
        assert_eq!(attrs.to_raw(), vec![ATTR_HRTF, ATTR_TRUE, ATTR_HRTF, ATTR_FALSE, 0]);
        assert!(!DeviceAttributes::new().requests_hrtf());
    }
}
