//! Voice rendering on a dedicated stream thread
//!
//! The cpal `Stream` is created, driven and dropped on its own thread; it is
//! not `Send` on every platform. Transport state lives in [`VoiceState`],
//! shared with the audio callback. Callers update it synchronously so that
//! queries observe their own writes, and then ask the thread to start or
//! suspend the stream.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use monovox_core::{BackendError, SourceState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

/// Commands sent to the stream thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCommand {
    /// Start (or continue) pulling from the callback
    Start,
    /// Pause the device stream
    Suspend,
    /// Drop the stream and exit
    Shutdown,
}

/// Shared between the caller and the audio callback
#[derive(Debug)]
pub struct VoiceState {
    /// Interleaved f32 at device rate and channel count
    pub samples: Arc<Vec<f32>>,
    /// Next sample index (not frame)
    pub position: usize,
    /// Transport state
    pub transport: SourceState,
    /// Sample index set while initial or stopped, used by the next play
    pub pending: Option<usize>,
    channels: usize,
}

impl VoiceState {
    fn new(channels: u16) -> Self {
        Self {
            samples: Arc::new(Vec::new()),
            position: 0,
            transport: SourceState::Initial,
            pending: None,
            channels: usize::from(channels.max(1)),
        }
    }

    /// Replace the data and rewind
    fn load(&mut self, samples: Arc<Vec<f32>>) {
        self.samples = samples;
        self.position = 0;
        self.pending = None;
        self.transport = SourceState::Initial;
    }

    /// Returns whether the stream must be started
    fn play(&mut self) -> bool {
        if self.samples.is_empty() {
            return false;
        }
        if self.transport != SourceState::Paused {
            self.position = self.pending.take().unwrap_or(0);
        }
        self.transport = SourceState::Playing;
        true
    }

    /// Returns whether the stream must be suspended
    fn pause(&mut self) -> bool {
        if self.transport != SourceState::Playing {
            return false;
        }
        self.transport = SourceState::Paused;
        true
    }

    /// Returns whether the stream must be suspended
    fn stop(&mut self) -> bool {
        if !matches!(self.transport, SourceState::Playing | SourceState::Paused) {
            return false;
        }
        self.transport = SourceState::Stopped;
        self.position = 0;
        true
    }

    fn seek_frame(&mut self, frame: usize) -> Result<(), BackendError> {
        let position = frame.saturating_mul(self.channels);
        if position > self.samples.len() {
            return Err(BackendError::invalid_value(format!(
                "offset frame {} past end of buffer",
                frame
            )));
        }
        match self.transport {
            SourceState::Initial | SourceState::Stopped => self.pending = Some(position),
            SourceState::Playing | SourceState::Paused => self.position = position,
        }
        Ok(())
    }

    /// Fill `output` from the cursor; silence unless playing
    ///
    /// Running off the end stops the voice and rewinds it.
    fn render<T: cpal::SizedSample + cpal::FromSample<f32>>(&mut self, output: &mut [T]) {
        let silence = T::from_sample(0.0f32);

        if self.transport != SourceState::Playing {
            output.fill(silence);
            return;
        }

        let samples = Arc::clone(&self.samples);
        let mut pos = self.position;
        for out_sample in output.iter_mut() {
            *out_sample = match samples.get(pos) {
                Some(sample) => {
                    pos += 1;
                    T::from_sample(*sample)
                }
                None => silence,
            };
        }

        if pos >= samples.len() {
            self.transport = SourceState::Stopped;
            self.position = 0;
        } else {
            self.position = pos;
        }
    }
}

fn lock(state: &Mutex<VoiceState>) -> MutexGuard<'_, VoiceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One output stream and its playback cursor
pub struct Voice {
    state: Arc<Mutex<VoiceState>>,
    command_tx: Sender<StreamCommand>,
    thread: Option<JoinHandle<()>>,
    channels: u16,
    sample_rate: u32,
}

impl Voice {
    /// Spawn the stream thread and wait until the stream is built
    pub fn spawn(
        device: Device,
        config: StreamConfig,
        sample_format: SampleFormat,
        command_capacity: usize,
    ) -> Result<Self, BackendError> {
        let channels = config.channels;
        let sample_rate = config.sample_rate;
        let state = Arc::new(Mutex::new(VoiceState::new(channels)));
        let (command_tx, command_rx) = bounded::<StreamCommand>(command_capacity.max(1));
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);

        let state_clone = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name("monovox-voice".to_string())
            .spawn(move || {
                Self::stream_thread_run(
                    &device,
                    &config,
                    sample_format,
                    state_clone,
                    &command_rx,
                    &ready_tx,
                );
            })
            .map_err(|e| BackendError::stream(format!("failed to spawn voice thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                let _ = thread.join();
                return Err(BackendError::stream(message));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(BackendError::stream("voice thread exited during startup"));
            }
        }

        debug!(
            "Voice stream ready ({} channels at {} Hz)",
            channels, sample_rate
        );

        Ok(Self {
            state,
            command_tx,
            thread: Some(thread),
            channels,
            sample_rate,
        })
    }

    /// Stream thread main loop
    ///
    /// Builds the stream, reports readiness, then services commands until
    /// shutdown or until every sender is gone.
    fn stream_thread_run(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        state: Arc<Mutex<VoiceState>>,
        command_rx: &Receiver<StreamCommand>,
        ready_tx: &Sender<Result<(), String>>,
    ) {
        let stream = match Self::build_stream(device, config, sample_format, state) {
            Ok(stream) => stream,
            Err(message) => {
                error!("Failed to build output stream: {}", message);
                let _ = ready_tx.send(Err(message));
                return;
            }
        };
        let _ = ready_tx.send(Ok(()));

        while let Ok(command) = command_rx.recv() {
            match command {
                StreamCommand::Start => {
                    if let Err(e) = stream.play() {
                        warn!("Failed to start stream: {}", e);
                    }
                }
                StreamCommand::Suspend => {
                    if let Err(e) = stream.pause() {
                        // Some hosts cannot pause; the callback renders silence instead
                        debug!("Stream pause unsupported: {}", e);
                    }
                }
                StreamCommand::Shutdown => break,
            }
        }

        drop(stream);
        debug!("Voice stream thread exiting");
    }

    fn build_stream(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        state: Arc<Mutex<VoiceState>>,
    ) -> Result<Stream, String> {
        match sample_format {
            SampleFormat::F32 => Self::build_typed_stream::<f32>(device, config, state),
            SampleFormat::I16 => Self::build_typed_stream::<i16>(device, config, state),
            SampleFormat::U16 => Self::build_typed_stream::<u16>(device, config, state),
            format => Err(format!("Unsupported sample format: {:?}", format)),
        }
    }

    fn build_typed_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &Device,
        config: &StreamConfig,
        state: Arc<Mutex<VoiceState>>,
    ) -> Result<Stream, String> {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    Self::audio_callback(data, &state);
                },
                |err| warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| e.to_string())
    }

    /// Audio callback function (runs in real-time audio thread)
    fn audio_callback<T: cpal::SizedSample + cpal::FromSample<f32>>(
        output: &mut [T],
        state: &Mutex<VoiceState>,
    ) {
        lock(state).render(output);
    }

    fn send(&self, command: StreamCommand) {
        if let Err(e) = self.command_tx.send(command) {
            warn!("Voice thread unavailable for {:?}: {}", command, e);
        }
    }

    /// Replace the voice data and rewind
    pub fn load(&self, samples: Arc<Vec<f32>>) {
        lock(&self.state).load(samples);
    }

    /// Start from the beginning (or a pending offset), or continue when paused
    ///
    /// A voice without data stays where it is.
    pub fn play(&self) {
        let start = lock(&self.state).play();
        if start {
            self.send(StreamCommand::Start);
        }
    }

    /// Suspend, keeping the position
    pub fn pause(&self) {
        let suspend = lock(&self.state).pause();
        if suspend {
            self.send(StreamCommand::Suspend);
        }
    }

    /// Halt and rewind
    pub fn stop(&self) {
        let suspend = lock(&self.state).stop();
        if suspend {
            self.send(StreamCommand::Suspend);
        }
    }

    /// Move to `frame` frames from the start
    ///
    /// On an initial or stopped voice the offset waits for the next play.
    pub fn seek_frame(&self, frame: usize) -> Result<(), BackendError> {
        lock(&self.state).seek_frame(frame)
    }

    /// Transport state
    pub fn transport(&self) -> SourceState {
        lock(&self.state).transport
    }

    /// Device channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stop the stream thread and wait for it
    pub fn shutdown(&mut self) {
        let _ = self.command_tx.send(StreamCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Voice thread panicked");
            }
        }
    }
}

impl Drop for Voice {
    fn drop(&mut self) {
        self.shutdown();
    }
}
