//! Monovox Core
//!
//! Lifecycle management for a single-voice PCM playback session.
//!
//! This crate provides:
//! - [`PlaybackSession`]: lazy device/context/source/buffer acquisition,
//!   transport control (play, pause, resume, seek, stop) and ordered release
//! - [`AudioBackend`]: the seam to the native audio API, including the
//!   optional device-reset extension used for HRTF negotiation
//! - Typed resource handles, 16-bit PCM formats and device attributes
//! - [`mock::MockBackend`]: an in-memory recording backend
//!
//! # Architecture
//!
//! `monovox-core` has no dependency on any audio library. Real output is
//! provided by a backend crate (`monovox-cpal` on desktop); hosts reach the
//! session through `monovox-bridge`.
//!
//! # Example
//!
//! ```rust
//! use monovox_core::mock::MockBackend;
//! use monovox_core::{PlaybackSession, SampleFormat, TransportState};
//!
//! let mut session = PlaybackSession::new(MockBackend::new());
//!
//! // Half a second of stereo silence at 8 kHz
//! let pcm = vec![0u8; 8_000 * 4 / 2];
//! let info = session.play(&pcm, 8_000, 2, true).unwrap();
//! assert_eq!(info.duration_ms, 500);
//! assert_eq!(session.state(), TransportState::Playing);
//!
//! session.pause();
//! session.seek(0.25);
//! session.resume();
//! session.stop();
//!
//! session.release();
//! session.release(); // idempotent
//! assert_eq!(session.state(), TransportState::Uninitialized);
//! assert_eq!(SampleFormat::from_channels(1), SampleFormat::Mono16);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod format;
mod handle;
pub mod mock;
mod session;
mod state;

// Public exports
pub use backend::{AudioBackend, BackendResult, ResetDeviceFn, SourceState};
pub use error::{BackendError, Result, SessionError};
pub use format::{
    DeviceAttribute, DeviceAttributes, PlaybackInfo, SampleFormat, ATTR_FALSE, ATTR_HRTF,
    ATTR_TRUE,
};
pub use handle::{BufferHandle, ContextHandle, DeviceHandle, SourceHandle};
pub use session::PlaybackSession;
pub use state::{HrtfStatus, TransportState};
