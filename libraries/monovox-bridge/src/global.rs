//! Process-wide bridge over the default output device
//!
//! Created on first use from [`BridgeConfig::load`]; a configuration that
//! fails to load is logged and replaced by the defaults.

use std::sync::OnceLock;

use monovox_core::PlaybackInfo;
use monovox_cpal::CpalBackend;
use tracing::{info, warn};

use crate::bridge::Bridge;
use crate::config::BridgeConfig;

static DEFAULT_BRIDGE: OnceLock<Bridge<CpalBackend>> = OnceLock::new();

/// The process-wide bridge
pub fn default_bridge() -> &'static Bridge<CpalBackend> {
    DEFAULT_BRIDGE.get_or_init(|| {
        let config = BridgeConfig::load().unwrap_or_else(|e| {
            warn!("Using default configuration: {}", e);
            BridgeConfig::default()
        });
        info!(
            "Creating playback bridge (default HRTF: {}, resampling: {:?})",
            config.default_hrtf, config.backend.resampling_quality
        );
        Bridge::with_default_hrtf(
            CpalBackend::with_config(config.backend),
            config.default_hrtf,
        )
    })
}

/// Play PCM on the default output device
pub fn play(pcm: Option<&[u8]>, sample_rate: i32, channels: i32, enable_hrtf: bool) -> bool {
    default_bridge().play(pcm, sample_rate, channels, enable_hrtf)
}

/// Play PCM on the default output device, returning its playback info
pub fn play_with_info(
    pcm: Option<&[u8]>,
    sample_rate: i32,
    channels: i32,
    enable_hrtf: bool,
) -> Option<PlaybackInfo> {
    default_bridge().play_with_info(pcm, sample_rate, channels, enable_hrtf)
}

/// Pause playback
pub fn pause() {
    default_bridge().pause();
}

/// Resume playback
pub fn resume() {
    default_bridge().resume();
}

/// Seek to `seconds` from the start
pub fn seek(seconds: f32) {
    default_bridge().seek(seconds);
}

/// Stop playback
pub fn stop() {
    default_bridge().stop();
}

/// Release the device and every playback resource
pub fn release() {
    default_bridge().release();
}
