//! cpal audio backend for Monovox
//!
//! Implements [`monovox_core::AudioBackend`] on the system's default output
//! device. A context is an output stream running on its own thread; a source
//! is the single voice of that stream; buffers hold PCM already converted to
//! the device's sample rate and channel layout.
//!
//! cpal exposes no HRTF control, so
//! [`reset_device_extension`](monovox_core::AudioBackend::reset_device_extension)
//! always reports the extension as absent and sessions fall back to default
//! spatialization.
//!
//! ```no_run
//! use monovox_core::PlaybackSession;
//! use monovox_cpal::CpalBackend;
//!
//! let mut session = PlaybackSession::new(CpalBackend::new());
//! let pcm = vec![0u8; 44_100 * 4];
//! let info = session.play(&pcm, 44_100, 2, true)?;
//! assert_eq!(info.duration_ms, 1_000);
//! # Ok::<(), monovox_core::SessionError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
pub mod config;
pub mod convert;
mod voice;

pub use backend::CpalBackend;
pub use config::{CpalBackendConfig, ResamplingQuality};
