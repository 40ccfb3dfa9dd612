//! [`AudioBackend`] over a cpal output stream
//!
//! Devices are the default output device of the default host. Each context
//! owns one [`Voice`] (one stream thread) and can hold a single source.
//! Buffers are converted to the device layout when filled.

use std::collections::HashMap;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};
use monovox_core::{
    AudioBackend, BackendError, BackendResult, BufferHandle, ContextHandle, DeviceHandle,
    ResetDeviceFn, SampleFormat, SourceHandle, SourceState,
};
use tracing::{debug, info};

use crate::config::CpalBackendConfig;
use crate::convert::{decode_i16_le, remap_channels, resample, validate_sample_rate};
use crate::voice::Voice;

struct DeviceSlot {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
}

struct ContextSlot {
    device: DeviceHandle,
    voice: Voice,
    source: Option<SourceHandle>,
}

struct SourceSlot {
    context: ContextHandle,
    buffer: Option<BufferHandle>,
}

struct BufferSlot {
    context: ContextHandle,
    /// Interleaved f32 at device rate and channel count
    samples: Arc<Vec<f32>>,
}

/// Audio backend driving the system's default output device
pub struct CpalBackend {
    config: CpalBackendConfig,
    next_id: u32,
    devices: HashMap<DeviceHandle, DeviceSlot>,
    contexts: HashMap<ContextHandle, ContextSlot>,
    current: Option<ContextHandle>,
    sources: HashMap<SourceHandle, SourceSlot>,
    buffers: HashMap<BufferHandle, BufferSlot>,
}

impl CpalBackend {
    /// Create a backend with default settings
    pub fn new() -> Self {
        Self::with_config(CpalBackendConfig::default())
    }

    /// Create a backend with custom settings
    pub fn with_config(config: CpalBackendConfig) -> Self {
        Self {
            config,
            next_id: 0,
            devices: HashMap::new(),
            contexts: HashMap::new(),
            current: None,
            sources: HashMap::new(),
            buffers: HashMap::new(),
        }
    }

    /// Active settings
    pub fn config(&self) -> &CpalBackendConfig {
        &self.config
    }

    /// Output channel count and sample rate of an open device
    pub fn device_layout(&self, device: DeviceHandle) -> Option<(u16, u32)> {
        self.devices
            .get(&device)
            .map(|slot| (slot.config.channels, slot.config.sample_rate))
    }

    fn next_raw(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    fn require_current(&self) -> BackendResult<ContextHandle> {
        self.current.ok_or(BackendError::NoCurrentContext)
    }

    fn buffer_attached(&self, buffer: BufferHandle) -> bool {
        self.sources.values().any(|s| s.buffer == Some(buffer))
    }

    fn source_slot(&self, source: SourceHandle) -> BackendResult<&SourceSlot> {
        self.sources
            .get(&source)
            .ok_or_else(|| BackendError::invalid_handle(source))
    }

    fn voice_for(&self, source: SourceHandle) -> BackendResult<&Voice> {
        let slot = self.source_slot(source)?;
        self.contexts
            .get(&slot.context)
            .map(|ctx| &ctx.voice)
            .ok_or_else(|| BackendError::invalid_handle(slot.context))
    }

    fn device_for_context(&self, context: ContextHandle) -> BackendResult<&DeviceSlot> {
        let ctx = self
            .contexts
            .get(&context)
            .ok_or_else(|| BackendError::invalid_handle(context))?;
        self.devices
            .get(&ctx.device)
            .ok_or_else(|| BackendError::invalid_handle(ctx.device))
    }

    /// Convert 16-bit PCM into the layout of the device behind `context`
    fn convert(
        &self,
        context: ContextHandle,
        format: SampleFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> BackendResult<Vec<f32>> {
        let device = self.device_for_context(context)?;
        let out_channels = usize::from(device.config.channels);

        let decoded = decode_i16_le(data);
        let mapped = remap_channels(&decoded, usize::from(format.channels()), out_channels);
        resample(
            &mapped,
            out_channels,
            sample_rate,
            device.config.sample_rate,
            self.config.resampling_quality,
        )
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn open_default_device(&mut self) -> BackendResult<DeviceHandle> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(BackendError::DeviceNotFound)?;

        let supported = device
            .default_output_config()
            .map_err(|e| BackendError::stream(format!("no default output config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string());
        info!(
            "Opened output device '{}' ({} channels at {} Hz, {:?})",
            name, config.channels, config.sample_rate, sample_format
        );

        let handle = DeviceHandle::new(self.next_raw());
        self.devices.insert(
            handle,
            DeviceSlot {
                device,
                config,
                sample_format,
            },
        );
        Ok(handle)
    }

    fn reset_device_extension(&self, device: DeviceHandle) -> Option<ResetDeviceFn<Self>> {
        debug!("{} has no reset-with-attributes support", device);
        None
    }

    fn close_device(&mut self, device: DeviceHandle) -> BackendResult<()> {
        if self.contexts.values().any(|c| c.device == device) {
            return Err(BackendError::invalid_operation("device has live contexts"));
        }
        self.devices
            .remove(&device)
            .map(|_| debug!("Closed {}", device))
            .ok_or_else(|| BackendError::invalid_handle(device))
    }

    fn create_context(&mut self, device: DeviceHandle) -> BackendResult<ContextHandle> {
        let slot = self
            .devices
            .get(&device)
            .ok_or_else(|| BackendError::invalid_handle(device))?;

        let voice = Voice::spawn(
            slot.device.clone(),
            slot.config.clone(),
            slot.sample_format,
            self.config.command_capacity,
        )?;

        let context = ContextHandle::new(self.next_raw());
        self.contexts.insert(
            context,
            ContextSlot {
                device,
                voice,
                source: None,
            },
        );
        Ok(context)
    }

    fn make_context_current(&mut self, context: Option<ContextHandle>) -> BackendResult<()> {
        if let Some(c) = context {
            if !self.contexts.contains_key(&c) {
                return Err(BackendError::invalid_handle(c));
            }
        }
        self.current = context;
        Ok(())
    }

    fn destroy_context(&mut self, context: ContextHandle) -> BackendResult<()> {
        if self.current == Some(context) {
            return Err(BackendError::invalid_operation("context is current"));
        }
        let slot = self
            .contexts
            .remove(&context)
            .ok_or_else(|| BackendError::invalid_handle(context))?;

        // Objects of a destroyed context go with it
        self.sources.retain(|_, s| s.context != context);
        self.buffers.retain(|_, b| b.context != context);
        drop(slot);
        debug!("Destroyed {}", context);
        Ok(())
    }

    fn gen_source(&mut self) -> BackendResult<SourceHandle> {
        let context = self.require_current()?;
        let has_source = self
            .contexts
            .get(&context)
            .ok_or_else(|| BackendError::invalid_handle(context))?
            .source
            .is_some();
        if has_source {
            return Err(BackendError::ResourceExhausted(
                "one source per context".to_string(),
            ));
        }

        let source = SourceHandle::new(self.next_raw());
        self.sources.insert(
            source,
            SourceSlot {
                context,
                buffer: None,
            },
        );
        if let Some(ctx) = self.contexts.get_mut(&context) {
            ctx.source = Some(source);
        }
        Ok(source)
    }

    fn delete_source(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.require_current()?;
        let slot = self
            .sources
            .remove(&source)
            .ok_or_else(|| BackendError::invalid_handle(source))?;
        if let Some(ctx) = self.contexts.get_mut(&slot.context) {
            ctx.voice.stop();
            ctx.voice.load(Arc::new(Vec::new()));
            ctx.source = None;
        }
        Ok(())
    }

    fn gen_buffer(&mut self) -> BackendResult<BufferHandle> {
        let context = self.require_current()?;
        let buffer = BufferHandle::new(self.next_raw());
        self.buffers.insert(
            buffer,
            BufferSlot {
                context,
                samples: Arc::new(Vec::new()),
            },
        );
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
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
        self.require_current()?;
        validate_sample_rate(sample_rate)?;
        if self.buffer_attached(buffer) {
            return Err(BackendError::invalid_operation("buffer is attached"));
        }
        let context = self
            .buffers
            .get(&buffer)
            .ok_or_else(|| BackendError::invalid_handle(buffer))?
            .context;

        let samples = self.convert(context, format, data, sample_rate)?;
        debug!(
            "Filled {} with {} bytes of {:?} at {} Hz ({} device samples)",
            buffer,
            data.len(),
            format,
            sample_rate,
            samples.len()
        );

        if let Some(slot) = self.buffers.get_mut(&buffer) {
            slot.samples = Arc::new(samples);
        }
        Ok(())
    }

    fn source_set_buffer(
        &mut self,
        source: SourceHandle,
        buffer: Option<BufferHandle>,
    ) -> BackendResult<()> {
        let samples = match buffer {
            Some(b) => Arc::clone(
                &self
                    .buffers
                    .get(&b)
                    .ok_or_else(|| BackendError::invalid_handle(b))?
                    .samples,
            ),
            None => Arc::new(Vec::new()),
        };

        let voice = self.voice_for(source)?;
        if matches!(voice.transport(), SourceState::Playing | SourceState::Paused) {
            return Err(BackendError::invalid_operation("source is active"));
        }
        voice.load(samples);

        if let Some(slot) = self.sources.get_mut(&source) {
            slot.buffer = buffer;
        }
        Ok(())
    }

    fn source_play(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.voice_for(source)?.play();
        Ok(())
    }

    fn source_pause(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.voice_for(source)?.pause();
        Ok(())
    }

    fn source_stop(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.voice_for(source)?.stop();
        Ok(())
    }

    fn source_set_offset(&mut self, source: SourceHandle, seconds: f32) -> BackendResult<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(BackendError::invalid_value(format!(
                "offset {} out of range",
                seconds
            )));
        }
        let voice = self.voice_for(source)?;
        let frame = (f64::from(seconds) * f64::from(voice.sample_rate())).round() as usize;
        voice.seek_frame(frame)
    }

    fn source_state(&self, source: SourceHandle) -> BackendResult<SourceState> {
        Ok(self.voice_for(source)?.transport())
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        // Voices own threads; join them before the devices go away
        self.current = None;
        self.sources.clear();
        self.buffers.clear();
        self.contexts.clear();
    }
}
