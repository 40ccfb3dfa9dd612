//! Thread-safe session façade with host-shaped entry points

use std::sync::{Mutex, MutexGuard};

use monovox_core::{AudioBackend, HrtfStatus, PlaybackInfo, PlaybackSession, TransportState};
use tracing::{error, warn};

use crate::error::{BridgeError, Result};

/// Serializes host calls onto one [`PlaybackSession`]
///
/// Every entry point takes the lock for the whole call, so calls from
/// different threads never interleave inside the session.
pub struct Bridge<B: AudioBackend> {
    session: Mutex<PlaybackSession<B>>,
    default_hrtf: bool,
}

impl<B: AudioBackend> Bridge<B> {
    /// Wrap a fresh session over `backend`
    pub fn new(backend: B) -> Self {
        Self::with_default_hrtf(backend, true)
    }

    /// Wrap a fresh session, choosing the HRTF request used when a call omits it
    pub fn with_default_hrtf(backend: B, default_hrtf: bool) -> Self {
        Self {
            session: Mutex::new(PlaybackSession::new(backend)),
            default_hrtf,
        }
    }

    /// HRTF request used when a call omits it
    pub fn default_hrtf(&self) -> bool {
        self.default_hrtf
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackSession<B>> {
        self.session.lock().unwrap_or_else(|poisoned| {
            warn!("Playback session lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Run `f` with exclusive access to the session
    pub fn with_session<R>(&self, f: impl FnOnce(&mut PlaybackSession<B>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Play PCM, reporting the failure reason
    ///
    /// Negative sample rates become zero, which backends reject. Channel
    /// counts other than one, including negative ones, play as stereo.
    pub fn try_play(
        &self,
        pcm: Option<&[u8]>,
        sample_rate: i32,
        channels: i32,
        enable_hrtf: bool,
    ) -> Result<PlaybackInfo> {
        let pcm = match pcm {
            Some(pcm) if !pcm.is_empty() => pcm,
            _ => return Err(BridgeError::NoPcm),
        };
        let sample_rate = u32::try_from(sample_rate).unwrap_or(0);
        let channels = u16::try_from(channels).unwrap_or(2);

        Ok(self.lock().play(pcm, sample_rate, channels, enable_hrtf)?)
    }

    /// Play PCM, returning its playback info on success
    pub fn play_with_info(
        &self,
        pcm: Option<&[u8]>,
        sample_rate: i32,
        channels: i32,
        enable_hrtf: bool,
    ) -> Option<PlaybackInfo> {
        match self.try_play(pcm, sample_rate, channels, enable_hrtf) {
            Ok(info) => Some(info),
            Err(e) => {
                error!("Play failed [{}]: {}", e.code(), e);
                None
            }
        }
    }

    /// Play PCM; `false` when the payload is missing or setup/upload failed
    pub fn play(
        &self,
        pcm: Option<&[u8]>,
        sample_rate: i32,
        channels: i32,
        enable_hrtf: bool,
    ) -> bool {
        self.play_with_info(pcm, sample_rate, channels, enable_hrtf)
            .is_some()
    }

    /// Pause playback
    pub fn pause(&self) {
        self.lock().pause();
    }

    /// Resume paused playback
    pub fn resume(&self) {
        self.lock().resume();
    }

    /// Seek to `seconds` from the start
    pub fn seek(&self, seconds: f32) {
        self.lock().seek(seconds);
    }

    /// Stop playback, keeping the session
    pub fn stop(&self) {
        self.lock().stop();
    }

    /// Tear everything down
    pub fn release(&self) {
        self.lock().release();
    }

    /// Tracked transport state
    pub fn state(&self) -> TransportState {
        self.lock().state()
    }

    /// HRTF outcome for the current device
    pub fn hrtf(&self) -> HrtfStatus {
        self.lock().hrtf()
    }

    /// Whether the session holds a device
    pub fn is_initialized(&self) -> bool {
        self.lock().is_initialized()
    }
}
