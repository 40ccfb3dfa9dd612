//! Method-call dispatch for message-based hosts
//!
//! A host sends a JSON object naming a `method` plus its arguments and gets a
//! [`HostReply`] back. Unknown methods answer [`HostReply::NotImplemented`]
//! so hosts can detect support.
//!
//! ```
//! use monovox_bridge::{Bridge, HostReply};
//! use monovox_core::mock::MockBackend;
//!
//! let bridge = Bridge::new(MockBackend::new());
//! let reply = bridge.handle_json(
//!     r#"{"method":"playPcm","pcm":[0,0,0,0],"sampleRate":8000,"channels":2}"#,
//! );
//! assert!(matches!(reply, HostReply::Success { .. }));
//! assert_eq!(bridge.handle_json(r#"{"method":"shuffle"}"#), HostReply::NotImplemented);
//! ```

use monovox_core::AudioBackend;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::bridge::Bridge;
use crate::error::BridgeError;

/// A decoded host call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum HostCall {
    /// Upload and play interleaved 16-bit PCM
    PlayPcm {
        /// PCM bytes; missing or empty is `NO_PCM`
        #[serde(default)]
        pcm: Option<Vec<u8>>,
        /// Sample rate in Hz
        #[serde(rename = "sampleRate")]
        sample_rate: i32,
        /// Channel count, 1 for mono
        channels: i32,
        /// HRTF request; the bridge default when absent
        #[serde(rename = "enableHrtf", default)]
        enable_hrtf: Option<bool>,
    },
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Seek to an offset
    Seek {
        /// Seconds from the start
        #[serde(default)]
        seconds: f64,
    },
    /// Stop playback
    Stop,
    /// Release every resource
    Release,
}

impl HostCall {
    /// Method names this dispatcher understands
    pub const METHODS: [&'static str; 6] =
        ["playPcm", "pause", "resume", "seek", "stop", "release"];

    /// Method name of this call
    pub fn method(&self) -> &'static str {
        match self {
            Self::PlayPcm { .. } => "playPcm",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Seek { .. } => "seek",
            Self::Stop => "stop",
            Self::Release => "release",
        }
    }
}

/// Outcome of a host call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum HostReply {
    /// Call succeeded
    Success {
        /// Method-specific result
        value: Value,
    },
    /// Call failed
    Error {
        /// Stable error code (`NO_PCM`, `PLAYBACK_FAIL`, `BAD_ARGUMENTS`)
        code: String,
        /// Human-readable detail
        message: String,
    },
    /// Method unknown to this dispatcher
    NotImplemented,
}

impl HostReply {
    fn success(value: Value) -> Self {
        Self::Success { value }
    }

    /// Whether the call succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<BridgeError> for HostReply {
    fn from(error: BridgeError) -> Self {
        Self::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl<B: AudioBackend> Bridge<B> {
    /// Execute a decoded call
    pub fn dispatch(&self, call: HostCall) -> HostReply {
        debug!("Dispatching {}", call.method());
        match call {
            HostCall::PlayPcm {
                pcm,
                sample_rate,
                channels,
                enable_hrtf,
            } => {
                let enable_hrtf = enable_hrtf.unwrap_or(self.default_hrtf());
                match self.try_play(pcm.as_deref(), sample_rate, channels, enable_hrtf) {
                    Ok(info) => match serde_json::to_value(info) {
                        Ok(value) => HostReply::success(value),
                        Err(e) => BridgeError::BadArguments(e.to_string()).into(),
                    },
                    Err(e) => e.into(),
                }
            }
            HostCall::Pause => {
                self.pause();
                HostReply::success(json!(true))
            }
            HostCall::Resume => {
                self.resume();
                HostReply::success(json!(true))
            }
            HostCall::Seek { seconds } => {
                self.seek(seconds as f32);
                HostReply::success(json!(true))
            }
            HostCall::Stop => {
                self.stop();
                HostReply::success(json!(true))
            }
            HostCall::Release => {
                self.release();
                HostReply::success(json!(true))
            }
        }
    }

    /// Decode and execute a call given as a JSON value
    pub fn handle_message(&self, message: Value) -> HostReply {
        let method = match message.get("method").and_then(Value::as_str) {
            Some(method) => method,
            None => {
                return BridgeError::BadArguments("missing method name".to_string()).into();
            }
        };
        if !HostCall::METHODS.contains(&method) {
            debug!("Unknown method '{}'", method);
            return HostReply::NotImplemented;
        }

        match serde_json::from_value::<HostCall>(message) {
            Ok(call) => self.dispatch(call),
            Err(e) => BridgeError::BadArguments(e.to_string()).into(),
        }
    }

    /// Decode and execute a call given as JSON text
    pub fn handle_json(&self, request: &str) -> HostReply {
        match serde_json::from_str::<Value>(request) {
            Ok(message) => self.handle_message(message),
            Err(e) => BridgeError::BadArguments(e.to_string()).into(),
        }
    }
}
