//! Error types for backends and the playback session

use thiserror::Error;

/// Errors reported by an audio backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// No output device could be opened
    #[error("Audio device not found")]
    DeviceNotFound,

    /// A handle does not name a live resource
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Operation needs a current context and none is active
    #[error("No current context")]
    NoCurrentContext,

    /// Argument out of range (offset, sample rate, ...)
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Operation not allowed in the resource's current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Backend cannot allocate another resource of this kind
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Output stream or audio thread failure
    #[error("Stream error: {0}")]
    Stream(String),
}

impl BackendError {
    /// Create an invalid handle error
    pub fn invalid_handle(handle: impl std::fmt::Display) -> Self {
        Self::InvalidHandle(handle.to_string())
    }

    /// Create an invalid value error
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }
}

/// Playback session errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Default output device could not be opened
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(#[source] BackendError),

    /// Device opened but the rendering context could not be created or made current
    #[error("Context setup failed: {0}")]
    ContextFailed(#[source] BackendError),

    /// Source or buffer allocation failed
    #[error("Voice allocation failed: {0}")]
    AllocationFailed(#[source] BackendError),

    /// Empty or missing PCM payload
    #[error("PCM payload is empty")]
    EmptyPayload,

    /// Uploading or starting playback failed
    #[error("Playback failed: {0}")]
    Playback(#[source] BackendError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
