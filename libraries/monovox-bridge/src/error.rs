//! Bridge error types

use monovox_core::SessionError;
use thiserror::Error;

/// Errors surfaced at the host boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Missing or empty PCM payload
    #[error("No PCM data")]
    NoPcm,

    /// Arguments missing or of the wrong type
    #[error("Bad arguments: {0}")]
    BadArguments(String),

    /// Session failed to initialize or play
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Stable code reported to the host
    ///
    /// Any backend setup or upload failure is `PLAYBACK_FAIL`, whichever
    /// backend is in use. Hosts expecting `OPENAL_FAIL` must map it.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoPcm | Self::Session(SessionError::EmptyPayload) => "NO_PCM",
            Self::BadArguments(_) => "BAD_ARGUMENTS",
            Self::Session(_) => "PLAYBACK_FAIL",
            Self::Config(_) => "CONFIG",
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
