//! Host boundary for Monovox playback
//!
//! Hosts see a flat call surface: `play` answers a boolean, every other call
//! answers nothing, and failures are only logged. [`Bridge`] provides that
//! surface over any [`monovox_core::AudioBackend`] behind a mutex; the free
//! functions in this crate forward to a process-wide bridge on the default
//! output device. Message-based hosts can send [`HostCall`]s and get
//! [`HostReply`]s instead.
//!
//! ```
//! use monovox_bridge::Bridge;
//! use monovox_core::{mock::MockBackend, TransportState};
//!
//! let bridge = Bridge::new(MockBackend::new());
//! assert!(!bridge.play(None, 44_100, 2, true));
//! assert!(bridge.play(Some(&[0u8; 8]), 44_100, 2, true));
//! bridge.pause();
//! assert_eq!(bridge.state(), TransportState::Paused);
//! bridge.release();
//! assert!(!bridge.is_initialized());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod channel;
pub mod config;
mod error;
mod global;
mod logging;

pub use bridge::Bridge;
pub use channel::{HostCall, HostReply};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use global::{default_bridge, pause, play, play_with_info, release, resume, seek, stop};
pub use logging::{init_logging, DEFAULT_LOG_FILTER};
