//! In-memory backend for tests and host simulation
//!
//! `MockBackend` keeps every resource in plain maps, records each call in
//! order, and enforces the same lifetime rules a native backend does
//! (sources need a current context, attached buffers cannot be deleted or
//! refilled, devices cannot close under live contexts). Failures can be
//! injected per operation through [`MockOptions`].

use std::collections::BTreeMap;

use crate::backend::{AudioBackend, BackendResult, ResetDeviceFn, SourceState};
use crate::error::BackendError;
use crate::format::{DeviceAttributes, SampleFormat};
use crate::handle::{BufferHandle, ContextHandle, DeviceHandle, SourceHandle};

/// A recorded backend call
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OpenDevice,
    ResetDevice(DeviceHandle, Vec<i32>),
    CloseDevice(DeviceHandle),
    CreateContext(DeviceHandle),
    MakeContextCurrent(Option<ContextHandle>),
    DestroyContext(ContextHandle),
    GenSource,
    DeleteSource(SourceHandle),
    GenBuffer,
    DeleteBuffer(BufferHandle),
    BufferData {
        buffer: BufferHandle,
        format: SampleFormat,
        len: usize,
        sample_rate: u32,
    },
    SetBuffer(SourceHandle, Option<BufferHandle>),
    Play(SourceHandle),
    Pause(SourceHandle),
    Stop(SourceHandle),
    SetOffset(SourceHandle, f32),
}

/// Failure injection and capability switches
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// No output device present
    pub no_device: bool,

    /// Device exposes the reset-with-attributes extension
    pub reset_extension: bool,

    /// Reset extension present but rejects the call
    pub reset_fails: bool,

    /// Context creation fails
    pub context_fails: bool,

    /// Context cannot be made current
    pub make_current_fails: bool,

    /// Buffer allocation fails
    pub gen_buffer_fails: bool,
}

/// Buffer contents as last uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct MockBuffer {
    /// Format tag, `None` until first upload
    pub format: Option<SampleFormat>,
    /// Raw PCM bytes
    pub data: Vec<u8>,
    /// Sample rate tag (Hz)
    pub sample_rate: u32,
}

/// Source transport as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct MockSource {
    /// Attached buffer
    pub buffer: Option<BufferHandle>,
    /// Transport state
    pub state: SourceState,
    /// Offset in seconds from the start of the attached buffer
    pub offset: f32,
    /// Offset set while initial or stopped, applied by the next play
    pub pending_offset: Option<f32>,
}

#[derive(Debug)]
struct MockDevice {
    hrtf: bool,
}

/// Recording in-memory [`AudioBackend`]
#[derive(Debug, Default)]
pub struct MockBackend {
    /// Failure injection, may be changed between calls
    pub options: MockOptions,
    calls: Vec<Call>,
    next_id: u32,
    devices: BTreeMap<DeviceHandle, MockDevice>,
    contexts: BTreeMap<ContextHandle, DeviceHandle>,
    current: Option<ContextHandle>,
    sources: BTreeMap<SourceHandle, MockSource>,
    buffers: BTreeMap<BufferHandle, MockBuffer>,
    devices_opened: usize,
}

impl MockBackend {
    /// Backend with a working device and no reset extension
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with custom options
    pub fn with_options(options: MockOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Every call in the order it was made
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Total number of successful device opens
    pub fn devices_opened(&self) -> usize {
        self.devices_opened
    }

    /// Number of live devices, contexts, sources and buffers
    pub fn live_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.devices.len(),
            self.contexts.len(),
            self.sources.len(),
            self.buffers.len(),
        )
    }

    /// Whether nothing is allocated
    pub fn is_empty(&self) -> bool {
        self.live_counts() == (0, 0, 0, 0)
    }

    /// Whether `device` was reset with HRTF rendering
    pub fn device_hrtf(&self, device: DeviceHandle) -> Option<bool> {
        self.devices.get(&device).map(|d| d.hrtf)
    }

    /// The only live source, if exactly one exists
    pub fn only_source(&self) -> Option<(SourceHandle, &MockSource)> {
        let mut iter = self.sources.iter();
        match (iter.next(), iter.next()) {
            (Some((handle, source)), None) => Some((*handle, source)),
            _ => None,
        }
    }

    /// Inspect a buffer
    pub fn buffer(&self, buffer: BufferHandle) -> Option<&MockBuffer> {
        self.buffers.get(&buffer)
    }

    /// Simulate the source running off the end of its buffer
    pub fn finish_playback(&mut self, source: SourceHandle) {
        if let Some(s) = self.sources.get_mut(&source) {
            s.state = SourceState::Stopped;
            s.offset = 0.0;
        }
    }

    fn next_raw(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn require_current(&self) -> BackendResult<ContextHandle> {
        self.current.ok_or(BackendError::NoCurrentContext)
    }

    fn source_mut(&mut self, source: SourceHandle) -> BackendResult<&mut MockSource> {
        self.sources
            .get_mut(&source)
            .ok_or_else(|| BackendError::invalid_handle(source))
    }

    fn buffer_attached(&self, buffer: BufferHandle) -> bool {
        self.sources.values().any(|s| s.buffer == Some(buffer))
    }

    fn reset_device(
        backend: &mut Self,
        device: DeviceHandle,
        attributes: &DeviceAttributes,
    ) -> BackendResult<()> {
        backend
            .calls
            .push(Call::ResetDevice(device, attributes.to_raw()));
        if backend.options.reset_fails {
            return Err(BackendError::invalid_value("attributes rejected"));
        }
        let slot = backend
            .devices
            .get_mut(&device)
            .ok_or_else(|| BackendError::invalid_handle(device))?;
        slot.hrtf = attributes.requests_hrtf();
        Ok(())
    }
}

impl AudioBackend for MockBackend {
    fn open_default_device(&mut self) -> BackendResult<DeviceHandle> {
        self.calls.push(Call::OpenDevice);
        if self.options.no_device {
            return Err(BackendError::DeviceNotFound);
        }
        let device = DeviceHandle::new(self.next_raw());
        self.devices.insert(device, MockDevice { hrtf: false });
        self.devices_opened += 1;
        Ok(device)
    }

    fn reset_device_extension(&self, device: DeviceHandle) -> Option<ResetDeviceFn<Self>> {
        if self.options.reset_extension && self.devices.contains_key(&device) {
            Some(Self::reset_device)
        } else {
            None
        }
    }

    fn close_device(&mut self, device: DeviceHandle) -> BackendResult<()> {
        self.calls.push(Call::CloseDevice(device));
        if self.contexts.values().any(|d| *d == device) {
            return Err(BackendError::invalid_operation("device has live contexts"));
        }
        self.devices
            .remove(&device)
            .map(|_| ())
            .ok_or_else(|| BackendError::invalid_handle(device))
    }

    fn create_context(&mut self, device: DeviceHandle) -> BackendResult<ContextHandle> {
        self.calls.push(Call::CreateContext(device));
        if self.options.context_fails {
            return Err(BackendError::invalid_value("context attributes rejected"));
        }
        if !self.devices.contains_key(&device) {
            return Err(BackendError::invalid_handle(device));
        }
        let context = ContextHandle::new(self.next_raw());
        self.contexts.insert(context, device);
        Ok(context)
    }

    fn make_context_current(&mut self, context: Option<ContextHandle>) -> BackendResult<()> {
        self.calls.push(Call::MakeContextCurrent(context));
        match context {
            Some(_) if self.options.make_current_fails => {
                Err(BackendError::invalid_operation("context cannot be made current"))
            }
            Some(c) if !self.contexts.contains_key(&c) => Err(BackendError::invalid_handle(c)),
            _ => {
                self.current = context;
                Ok(())
            }
        }
    }

    fn destroy_context(&mut self, context: ContextHandle) -> BackendResult<()> {
        self.calls.push(Call::DestroyContext(context));
        if self.current == Some(context) {
            return Err(BackendError::invalid_operation("context is current"));
        }
        self.contexts
            .remove(&context)
            .map(|_| ())
            .ok_or_else(|| BackendError::invalid_handle(context))
    }

    fn gen_source(&mut self) -> BackendResult<SourceHandle> {
        self.calls.push(Call::GenSource);
        self.require_current()?;
        let source = SourceHandle::new(self.next_raw());
        self.sources.insert(
            source,
            MockSource {
                buffer: None,
                state: SourceState::Initial,
                offset: 0.0,
                pending_offset: None,
            },
        );
        Ok(source)
    }

    fn delete_source(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.calls.push(Call::DeleteSource(source));
        self.require_current()?;
        self.sources
            .remove(&source)
            .map(|_| ())
            .ok_or_else(|| BackendError::invalid_handle(source))
    }

    fn gen_buffer(&mut self) -> BackendResult<BufferHandle> {
        self.calls.push(Call::GenBuffer);
        self.require_current()?;
        if self.options.gen_buffer_fails {
            return Err(BackendError::ResourceExhausted("buffers".to_string()));
        }
        let buffer = BufferHandle::new(self.next_raw());
        self.buffers.insert(
            buffer,
            MockBuffer {
                format: None,
                data: Vec::new(),
                sample_rate: 0,
            },
        );
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
        self.calls.push(Call::DeleteBuffer(buffer));
        self.require_current()?;
        if self.buffer_attached(buffer) {
            return Err(BackendError::invalid_operation("buffer is attached"));
        }
        self.buffers
            .remove(&buffer)
            .map(|_| ())
            .ok_or_else(|| BackendError::invalid_handle(buffer))
    }

    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: SampleFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> BackendResult<()> {
        self.calls.push(Call::BufferData {
            buffer,
            format,
            len: data.len(),
            sample_rate,
        });
        self.require_current()?;
        if self.buffer_attached(buffer) {
            return Err(BackendError::invalid_operation("buffer is attached"));
        }
        let slot = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| BackendError::invalid_handle(buffer))?;
        *slot = MockBuffer {
            format: Some(format),
            data: data.to_vec(),
            sample_rate,
        };
        Ok(())
    }

    fn source_set_buffer(
        &mut self,
        source: SourceHandle,
        buffer: Option<BufferHandle>,
    ) -> BackendResult<()> {
        self.calls.push(Call::SetBuffer(source, buffer));
        if let Some(b) = buffer {
            if !self.buffers.contains_key(&b) {
                return Err(BackendError::invalid_handle(b));
            }
        }
        let slot = self.source_mut(source)?;
        if matches!(slot.state, SourceState::Playing | SourceState::Paused) {
            return Err(BackendError::invalid_operation("source is active"));
        }
        slot.buffer = buffer;
        slot.state = SourceState::Initial;
        slot.offset = 0.0;
        slot.pending_offset = None;
        Ok(())
    }

    fn source_play(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.calls.push(Call::Play(source));
        let slot = self.source_mut(source)?;
        if slot.buffer.is_none() {
            return Ok(());
        }
        if slot.state != SourceState::Paused {
            slot.offset = slot.pending_offset.take().unwrap_or(0.0);
        }
        slot.state = SourceState::Playing;
        Ok(())
    }

    fn source_pause(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.calls.push(Call::Pause(source));
        let slot = self.source_mut(source)?;
        if slot.state == SourceState::Playing {
            slot.state = SourceState::Paused;
        }
        Ok(())
    }

    fn source_stop(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.calls.push(Call::Stop(source));
        let slot = self.source_mut(source)?;
        if matches!(slot.state, SourceState::Playing | SourceState::Paused) {
            slot.state = SourceState::Stopped;
            slot.offset = 0.0;
        }
        Ok(())
    }

    fn source_set_offset(&mut self, source: SourceHandle, seconds: f32) -> BackendResult<()> {
        self.calls.push(Call::SetOffset(source, seconds));
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(BackendError::invalid_value(format!("offset {}", seconds)));
        }
        let slot = self.source_mut(source)?;
        if matches!(slot.state, SourceState::Initial | SourceState::Stopped) {
            slot.pending_offset = Some(seconds);
        }
        slot.offset = seconds;
        Ok(())
    }

    fn source_state(&self, source: SourceHandle) -> BackendResult<SourceState> {
        self.sources
            .get(&source)
            .map(|s| s.state)
            .ok_or_else(|| BackendError::invalid_handle(source))
    }
}
