//! Audio backend seam
//!
//! `AudioBackend` models the native audio API the session drives: a device,
//! a rendering context bound to it, and source/buffer objects living in the
//! current context. Implementations own every resource they hand out; the
//! session only holds handles and decides the order of creation and release.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::format::{DeviceAttributes, SampleFormat};
use crate::handle::{BufferHandle, ContextHandle, DeviceHandle, SourceHandle};

/// Result type for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Device-reset entry point returned by an extension lookup
///
/// Re-applies `attributes` to an already opened device. Obtained through
/// [`AudioBackend::reset_device_extension`]; a backend without the extension
/// returns `None` instead of a function.
pub type ResetDeviceFn<B> = fn(&mut B, DeviceHandle, &DeviceAttributes) -> BackendResult<()>;

/// Transport state reported by the backend for a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceState {
    /// Never played, or rewound
    Initial,

    /// Rendering audio
    Playing,

    /// Suspended mid-buffer
    Paused,

    /// Halted explicitly or ran off the end of its buffer
    Stopped,
}

/// Native audio API used by [`PlaybackSession`](crate::PlaybackSession)
pub trait AudioBackend {
    /// Open the system default output device
    fn open_default_device(&mut self) -> BackendResult<DeviceHandle>;

    /// Probe for the device-reset-with-attributes extension
    ///
    /// `None` means the extension (or its entry point) is not available. This
    /// is a normal answer, not an error.
    fn reset_device_extension(&self, device: DeviceHandle) -> Option<ResetDeviceFn<Self>>
    where
        Self: Sized;

    /// Close a device; all of its contexts must already be destroyed
    fn close_device(&mut self, device: DeviceHandle) -> BackendResult<()>;

    /// Create a rendering context on `device`
    fn create_context(&mut self, device: DeviceHandle) -> BackendResult<ContextHandle>;

    /// Make `context` current, or clear the current context with `None`
    fn make_context_current(&mut self, context: Option<ContextHandle>) -> BackendResult<()>;

    /// Destroy a context that is no longer current
    fn destroy_context(&mut self, context: ContextHandle) -> BackendResult<()>;

    /// Allocate a source in the current context
    fn gen_source(&mut self) -> BackendResult<SourceHandle>;

    /// Delete a source
    fn delete_source(&mut self, source: SourceHandle) -> BackendResult<()>;

    /// Allocate an empty buffer in the current context
    fn gen_buffer(&mut self) -> BackendResult<BufferHandle>;

    /// Delete a buffer that is not attached to any source
    fn delete_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()>;

    /// Replace the contents of `buffer` with interleaved 16-bit PCM
    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: SampleFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> BackendResult<()>;

    /// Attach `buffer` to `source`, or detach with `None`
    fn source_set_buffer(
        &mut self,
        source: SourceHandle,
        buffer: Option<BufferHandle>,
    ) -> BackendResult<()>;

    /// Start (or restart) playback
    ///
    /// A playing source restarts from the beginning; a paused source
    /// continues from where it was paused.
    fn source_play(&mut self, source: SourceHandle) -> BackendResult<()>;

    /// Suspend playback, keeping the position
    fn source_pause(&mut self, source: SourceHandle) -> BackendResult<()>;

    /// Halt playback
    fn source_stop(&mut self, source: SourceHandle) -> BackendResult<()>;

    /// Move the playback position, in seconds from the start of the buffer
    fn source_set_offset(&mut self, source: SourceHandle, seconds: f32) -> BackendResult<()>;

    /// Current transport state of `source`
    fn source_state(&self, source: SourceHandle) -> BackendResult<SourceState>;
}
