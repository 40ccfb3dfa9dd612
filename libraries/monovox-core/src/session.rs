//! Single-voice playback session
//!
//! A [`PlaybackSession`] owns one device, one context, one source and one
//! buffer, created lazily on the first `play` and released together.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --play--> Playing --pause--> Paused --resume--> Playing
//!       ^                    |                  |
//!       |                    +-------stop-------+--> Stopped
//!       +------------------------release (from any state)
//! ```
//!
//! Resources are acquired device → context → source/buffer and released in
//! the reverse order. Every release step is guarded on its own, so a session
//! left half-built by a failed initialization is still fully reclaimed by
//! [`PlaybackSession::release`] (or by dropping the session).

use tracing::{debug, info, warn};

use crate::backend::{AudioBackend, SourceState};
use crate::error::{BackendError, Result, SessionError};
use crate::format::{DeviceAttributes, PlaybackInfo, SampleFormat};
use crate::handle::{BufferHandle, ContextHandle, DeviceHandle, SourceHandle};
use crate::state::{HrtfStatus, TransportState};

/// Handles held by the session
///
/// Any subset may be present after a failed initialization; only a complete
/// set is usable for playback.
#[derive(Debug, Default)]
struct Resources {
    device: Option<DeviceHandle>,
    context: Option<ContextHandle>,
    source: Option<SourceHandle>,
    buffer: Option<BufferHandle>,
}

impl Resources {
    fn voice(&self) -> Option<(SourceHandle, BufferHandle)> {
        match (self.device, self.context, self.source, self.buffer) {
            (Some(_), Some(_), Some(source), Some(buffer)) => Some((source, buffer)),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.device.is_none()
            && self.context.is_none()
            && self.source.is_none()
            && self.buffer.is_none()
    }

    /// Release in dependency order: source, buffer, context, device
    fn teardown<B: AudioBackend>(&mut self, backend: &mut B) {
        if let Some(source) = self.source.take() {
            if let Err(e) = backend.source_stop(source) {
                warn!("Failed to stop {}: {}", source, e);
            }
            if let Err(e) = backend.delete_source(source) {
                warn!("Failed to delete {}: {}", source, e);
            }
        }

        if let Some(buffer) = self.buffer.take() {
            if let Err(e) = backend.delete_buffer(buffer) {
                warn!("Failed to delete {}: {}", buffer, e);
            }
        }

        if let Some(context) = self.context.take() {
            if let Err(e) = backend.make_context_current(None) {
                warn!("Failed to clear current context: {}", e);
            }
            if let Err(e) = backend.destroy_context(context) {
                warn!("Failed to destroy {}: {}", context, e);
            }
        }

        if let Some(device) = self.device.take() {
            if let Err(e) = backend.close_device(device) {
                warn!("Failed to close {}: {}", device, e);
            }
        }
    }
}

/// Playback session for exactly one voice
///
/// The session is not internally synchronized. Callers that share it across
/// threads must serialize access (see `monovox-bridge`).
pub struct PlaybackSession<B: AudioBackend> {
    backend: B,
    resources: Resources,
    state: TransportState,
    hrtf_requested: bool,
    hrtf: HrtfStatus,
    /// Buffer holds uploaded data and is attached to the source
    loaded: bool,
}

impl<B: AudioBackend> PlaybackSession<B> {
    /// Create an uninitialized session; no backend call is made
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            resources: Resources::default(),
            state: TransportState::Uninitialized,
            hrtf_requested: false,
            hrtf: HrtfStatus::NotRequested,
            loaded: false,
        }
    }

    /// Acquire device, context, source and buffer unless already held
    ///
    /// Idempotent: a fully initialized session returns immediately and
    /// ignores `enable_hrtf`. Leftovers of an earlier failed attempt are
    /// released before rebuilding from scratch.
    ///
    /// A missing HRTF extension is not an error; the device keeps its
    /// default spatialization and [`hrtf`](Self::hrtf) reports `Unavailable`.
    pub fn initialize_if_needed(&mut self, enable_hrtf: bool) -> Result<()> {
        if self.resources.voice().is_some() {
            return Ok(());
        }

        if !self.resources.is_empty() {
            debug!("Discarding partially initialized resources before retry");
            self.reset();
        }

        let device = self.backend.open_default_device().map_err(|e| {
            warn!("Failed to open default audio device: {}", e);
            SessionError::DeviceUnavailable(e)
        })?;
        self.resources.device = Some(device);

        self.hrtf_requested = enable_hrtf;
        if enable_hrtf {
            self.hrtf = self.negotiate_hrtf(device);
        }

        let context = self.backend.create_context(device).map_err(|e| {
            warn!("Failed to create context on {}: {}", device, e);
            SessionError::ContextFailed(e)
        })?;
        self.resources.context = Some(context);

        self.backend
            .make_context_current(Some(context))
            .map_err(|e| {
                warn!("Failed to make {} current: {}", context, e);
                SessionError::ContextFailed(e)
            })?;

        let source = self
            .backend
            .gen_source()
            .map_err(SessionError::AllocationFailed)?;
        self.resources.source = Some(source);

        let buffer = self
            .backend
            .gen_buffer()
            .map_err(SessionError::AllocationFailed)?;
        self.resources.buffer = Some(buffer);

        self.state = TransportState::Ready;
        info!(
            "Playback session initialized ({}, {}, {}, {}, hrtf: {:?})",
            device, context, source, buffer, self.hrtf
        );

        Ok(())
    }

    fn negotiate_hrtf(&mut self, device: DeviceHandle) -> HrtfStatus {
        let Some(reset_device) = self.backend.reset_device_extension(device) else {
            info!("HRTF requested but device reset is unavailable, using default spatialization");
            return HrtfStatus::Unavailable;
        };

        match reset_device(&mut self.backend, device, &DeviceAttributes::hrtf()) {
            Ok(()) => {
                debug!("HRTF enabled on {}", device);
                HrtfStatus::Enabled
            }
            Err(e) => {
                warn!("HRTF device reset rejected: {}", e);
                HrtfStatus::Failed
            }
        }
    }

    /// Upload `pcm` and start playing it from the beginning
    ///
    /// `pcm` is interleaved signed 16-bit little-endian audio. `channels == 1`
    /// selects mono; any other count is treated as stereo. The previous buffer
    /// contents are replaced, and a voice that is already playing restarts
    /// with the new data.
    ///
    /// Returns once playback has been issued; it does not wait for the
    /// buffer to finish.
    pub fn play(
        &mut self,
        pcm: &[u8],
        sample_rate: u32,
        channels: u16,
        enable_hrtf: bool,
    ) -> Result<PlaybackInfo> {
        if pcm.is_empty() {
            return Err(SessionError::EmptyPayload);
        }

        self.initialize_if_needed(enable_hrtf)?;
        let Some((source, buffer)) = self.resources.voice() else {
            return Err(SessionError::AllocationFailed(BackendError::invalid_operation(
                "voice missing after initialization",
            )));
        };

        // A buffer cannot be refilled while attached to a source
        if self.loaded {
            self.backend
                .source_stop(source)
                .map_err(SessionError::Playback)?;
            self.backend
                .source_set_buffer(source, None)
                .map_err(SessionError::Playback)?;
            self.loaded = false;
            self.state = self.state.on_stop();
        }

        let format = SampleFormat::from_channels(channels);
        self.backend
            .buffer_data(buffer, format, pcm, sample_rate)
            .map_err(SessionError::Playback)?;
        self.backend
            .source_set_buffer(source, Some(buffer))
            .map_err(SessionError::Playback)?;
        self.loaded = true;

        self.backend
            .source_play(source)
            .map_err(SessionError::Playback)?;
        self.state = self.state.on_play();

        let info = PlaybackInfo::new(pcm.len(), format, sample_rate);
        debug!(
            "Playing {} bytes as {:?} at {} Hz ({} ms)",
            pcm.len(),
            format,
            sample_rate,
            info.duration_ms
        );

        Ok(info)
    }

    /// Suspend playback; no-op before initialization
    pub fn pause(&mut self) {
        let Some(source) = self.active_source("pause") else {
            return;
        };

        match self.backend.source_pause(source) {
            Ok(()) => self.state = self.state.on_pause(),
            Err(e) => warn!("Pause failed: {}", e),
        }
    }

    /// Continue from the paused position; no-op before initialization
    pub fn resume(&mut self) {
        let Some(source) = self.active_source("resume") else {
            return;
        };

        match self.backend.source_play(source) {
            Ok(()) if self.loaded => self.state = self.state.on_resume(),
            Ok(()) => {}
            Err(e) => warn!("Resume failed: {}", e),
        }
    }

    /// Set the playback offset in seconds; no-op before initialization
    ///
    /// The offset is not checked against the buffer length here.
    pub fn seek(&mut self, seconds: f32) {
        let Some(source) = self.active_source("seek") else {
            return;
        };

        if let Err(e) = self.backend.source_set_offset(source, seconds) {
            warn!("Seek to {}s failed: {}", seconds, e);
        }
    }

    /// Halt playback, keeping the buffer attached; no-op before initialization
    pub fn stop(&mut self) {
        let Some(source) = self.active_source("stop") else {
            return;
        };

        match self.backend.source_stop(source) {
            Ok(()) => self.state = self.state.on_stop(),
            Err(e) => warn!("Stop failed: {}", e),
        }
    }

    /// Release every resource and return to `Uninitialized`
    ///
    /// Safe to call any number of times, including on a session that was
    /// never initialized.
    pub fn release(&mut self) {
        if self.resources.is_empty() {
            return;
        }

        self.reset();
        info!("Playback session released");
    }

    fn reset(&mut self) {
        self.resources.teardown(&mut self.backend);
        self.state = TransportState::Uninitialized;
        self.hrtf_requested = false;
        self.hrtf = HrtfStatus::NotRequested;
        self.loaded = false;
    }

    fn active_source(&self, operation: &str) -> Option<SourceHandle> {
        let voice = self.resources.voice();
        if voice.is_none() {
            debug!("Ignoring {}: session not initialized", operation);
        }
        voice.map(|(source, _)| source)
    }

    /// Tracked transport state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Transport state as reported by the backend
    ///
    /// Unlike [`state`](Self::state) this reflects a buffer that has played
    /// to its end. `None` before initialization.
    pub fn source_state(&self) -> Option<SourceState> {
        let (source, _) = self.resources.voice()?;
        match self.backend.source_state(source) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Failed to query {}: {}", source, e);
                None
            }
        }
    }

    /// Whether device, context, source and buffer are all held
    pub fn is_initialized(&self) -> bool {
        self.resources.voice().is_some()
    }

    /// HRTF flag captured at the current initialization
    pub fn hrtf_requested(&self) -> bool {
        self.hrtf_requested
    }

    /// Outcome of HRTF negotiation for the current device
    pub fn hrtf(&self) -> HrtfStatus {
        self.hrtf
    }

    /// Handle of the open device, if any
    pub fn device(&self) -> Option<DeviceHandle> {
        self.resources.device
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Underlying backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: AudioBackend> Drop for PlaybackSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: AudioBackend> std::fmt::Debug for PlaybackSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("resources", &self.resources)
            .field("state", &self.state)
            .field("hrtf_requested", &self.hrtf_requested)
            .field("hrtf", &self.hrtf)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}
