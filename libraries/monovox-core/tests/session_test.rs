//! Integration tests for PlaybackSession lifecycle
//!
//! All tests drive the session through MockBackend, which records calls
//! and enforces native resource rules.

use monovox_core::mock::{Call, MockBackend, MockOptions};
use monovox_core::{
    HrtfStatus, PlaybackSession, SampleFormat, SessionError, SourceState, TransportState,
    ATTR_HRTF, ATTR_TRUE,
};

// ============================================================================
// HELPERS
// ============================================================================

/// One second of a 16-bit ramp, interleaved for `channels`
fn pcm(sample_rate: u32, channels: u16) -> Vec<u8> {
    let frames = sample_rate as usize;
    let mut bytes = Vec::with_capacity(frames * channels as usize * 2);
    for i in 0..frames {
        let sample = (i % 256) as i16 * 64;
        for _ in 0..channels {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
    }
    bytes
}

fn session() -> PlaybackSession<MockBackend> {
    PlaybackSession::new(MockBackend::new())
}

fn session_with(options: MockOptions) -> PlaybackSession<MockBackend> {
    PlaybackSession::new(MockBackend::with_options(options))
}

fn source_state(session: &PlaybackSession<MockBackend>) -> SourceState {
    session.backend().only_source().unwrap().1.state
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
fn new_session_touches_nothing() {
    let session = session();
    assert_eq!(session.state(), TransportState::Uninitialized);
    assert!(!session.is_initialized());
    assert!(session.backend().calls().is_empty());
}

#[test]
fn initialize_acquires_in_dependency_order() {
    let mut session = session();
    session.initialize_if_needed(false).unwrap();

    let calls = session.backend().calls();
    assert!(matches!(calls[0], Call::OpenDevice));
    assert!(matches!(calls[1], Call::CreateContext(_)));
    assert!(matches!(calls[2], Call::MakeContextCurrent(Some(_))));
    assert!(matches!(calls[3], Call::GenSource));
    assert!(matches!(calls[4], Call::GenBuffer));
    assert_eq!(calls.len(), 5);

    assert_eq!(session.state(), TransportState::Ready);
    assert_eq!(session.backend().live_counts(), (1, 1, 1, 1));
}

#[test]
fn initialize_is_idempotent() {
    let mut session = session();
    session.initialize_if_needed(false).unwrap();
    let device = session.device();
    session.backend_mut().clear_calls();

    session.initialize_if_needed(true).unwrap();

    assert!(session.backend().calls().is_empty());
    assert_eq!(session.device(), device);
    assert_eq!(session.hrtf(), HrtfStatus::NotRequested);
}

#[test]
fn consecutive_plays_reuse_one_device() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    let device = session.device();
    session.play(&pcm(8_000, 1), 8_000, 1, false).unwrap();
    session.play(&pcm(16_000, 2), 16_000, 2, true).unwrap();

    assert_eq!(session.device(), device);
    assert_eq!(session.backend().devices_opened(), 1);
    assert_eq!(session.backend().live_counts(), (1, 1, 1, 1));
}

// ============================================================================
// HRTF NEGOTIATION
// ============================================================================

#[test]
fn hrtf_enabled_through_reset_extension() {
    let mut session = session_with(MockOptions {
        reset_extension: true,
        ..MockOptions::default()
    });
    session.play(&pcm(8_000, 2), 8_000, 2, true).unwrap();

    assert_eq!(session.hrtf(), HrtfStatus::Enabled);
    assert!(session.hrtf_requested());
    let device = session.device().unwrap();
    assert_eq!(session.backend().device_hrtf(device), Some(true));

    let reset = session
        .backend()
        .calls()
        .iter()
        .find_map(|c| match c {
            Call::ResetDevice(_, attrs) => Some(attrs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(reset, vec![ATTR_HRTF, ATTR_TRUE, 0]);
}

#[test]
fn hrtf_reset_happens_before_context_creation() {
    let mut session = session_with(MockOptions {
        reset_extension: true,
        ..MockOptions::default()
    });
    session.initialize_if_needed(true).unwrap();

    let calls = session.backend().calls();
    assert!(matches!(calls[0], Call::OpenDevice));
    assert!(matches!(calls[1], Call::ResetDevice(..)));
    assert!(matches!(calls[2], Call::CreateContext(_)));
}

#[test]
fn missing_extension_degrades_gracefully() {
    let mut session = session();
    let result = session.play(&pcm(8_000, 2), 8_000, 2, true);

    assert!(result.is_ok());
    assert_eq!(session.hrtf(), HrtfStatus::Unavailable);
    assert!(!session
        .backend()
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ResetDevice(..))));
}

#[test]
fn rejected_reset_is_not_an_error() {
    let mut session = session_with(MockOptions {
        reset_extension: true,
        reset_fails: true,
        ..MockOptions::default()
    });

    assert!(session.play(&pcm(8_000, 2), 8_000, 2, true).is_ok());
    assert_eq!(session.hrtf(), HrtfStatus::Failed);
}

#[test]
fn hrtf_not_requested_skips_extension_lookup() {
    let mut session = session_with(MockOptions {
        reset_extension: true,
        ..MockOptions::default()
    });
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    assert_eq!(session.hrtf(), HrtfStatus::NotRequested);
    assert_eq!(
        session.backend().device_hrtf(session.device().unwrap()),
        Some(false)
    );
}

#[test]
fn later_hrtf_flag_does_not_change_open_device() {
    let mut session = session_with(MockOptions {
        reset_extension: true,
        ..MockOptions::default()
    });
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.play(&pcm(8_000, 2), 8_000, 2, true).unwrap();

    assert!(!session.hrtf_requested());
    assert_eq!(session.hrtf(), HrtfStatus::NotRequested);
}

// ============================================================================
// PLAY
// ============================================================================

#[test]
fn play_uploads_binds_and_starts() {
    let mut session = session();
    let data = pcm(8_000, 2);
    let info = session.play(&data, 8_000, 2, false).unwrap();

    assert_eq!(info.duration_ms, 1000);
    assert_eq!(info.sample_rate, 8_000);
    assert_eq!(info.channels, 2);
    assert_eq!(session.state(), TransportState::Playing);

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Playing);
    let buffer = session.backend().buffer(source.buffer.unwrap()).unwrap();
    assert_eq!(buffer.data, data);
    assert_eq!(buffer.sample_rate, 8_000);
    assert_eq!(buffer.format, Some(SampleFormat::Stereo16));
}

#[test]
fn mono_channel_count_selects_mono_format() {
    let mut session = session();
    session.play(&pcm(8_000, 1), 8_000, 1, false).unwrap();

    let (_, source) = session.backend().only_source().unwrap();
    let buffer = session.backend().buffer(source.buffer.unwrap()).unwrap();
    assert_eq!(buffer.format, Some(SampleFormat::Mono16));
}

#[test]
fn unusual_channel_counts_select_stereo_format() {
    for channels in [0, 2, 3, 8] {
        let mut session = session();
        session.play(&pcm(8_000, 2), 8_000, channels, false).unwrap();

        let (_, source) = session.backend().only_source().unwrap();
        let buffer = session.backend().buffer(source.buffer.unwrap()).unwrap();
        assert_eq!(buffer.format, Some(SampleFormat::Stereo16), "channels = {}", channels);
    }
}

#[test]
fn empty_payload_is_rejected_without_touching_device() {
    let mut session = session();
    let result = session.play(&[], 44_100, 2, true);

    assert_eq!(result, Err(SessionError::EmptyPayload));
    assert!(session.backend().calls().is_empty());
    assert_eq!(session.state(), TransportState::Uninitialized);
}

#[test]
fn empty_payload_leaves_playing_session_alone() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.backend_mut().clear_calls();

    assert!(session.play(&[], 8_000, 2, false).is_err());

    assert!(session.backend().calls().is_empty());
    assert_eq!(session.state(), TransportState::Playing);
    assert_eq!(source_state(&session), SourceState::Playing);
}

#[test]
fn replay_restarts_with_new_buffer() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.seek(0.5);

    let second = pcm(16_000, 1);
    session.play(&second, 16_000, 1, false).unwrap();

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Playing);
    assert_eq!(source.offset, 0.0);
    let buffer = session.backend().buffer(source.buffer.unwrap()).unwrap();
    assert_eq!(buffer.data, second);
    assert_eq!(buffer.sample_rate, 16_000);
    assert_eq!(buffer.format, Some(SampleFormat::Mono16));
}

#[test]
fn replay_detaches_before_refilling() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.backend_mut().clear_calls();

    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    let calls = session.backend().calls();
    assert!(matches!(calls[0], Call::Stop(_)));
    assert!(matches!(calls[1], Call::SetBuffer(_, None)));
    assert!(matches!(calls[2], Call::BufferData { .. }));
    assert!(matches!(calls[3], Call::SetBuffer(_, Some(_))));
    assert!(matches!(calls[4], Call::Play(_)));
}

#[test]
fn play_after_pause_restarts_from_beginning() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.seek(0.75);
    session.pause();

    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Playing);
    assert_eq!(source.offset, 0.0);
    assert_eq!(session.state(), TransportState::Playing);
}

// ============================================================================
// TRANSPORT
// ============================================================================

#[test]
fn transport_before_play_is_a_noop() {
    let mut session = session();
    session.pause();
    session.resume();
    session.seek(3.0);
    session.stop();

    assert!(session.backend().calls().is_empty());
    assert!(session.backend().is_empty());
    assert_eq!(session.state(), TransportState::Uninitialized);
    assert_eq!(session.source_state(), None);
}

#[test]
fn pause_and_resume_keep_position() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.seek(0.4);

    session.pause();
    assert_eq!(session.state(), TransportState::Paused);
    assert_eq!(source_state(&session), SourceState::Paused);

    session.resume();
    assert_eq!(session.state(), TransportState::Playing);
    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Playing);
    assert_eq!(source.offset, 0.4);
}

#[test]
fn stop_keeps_buffer_attached() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    session.stop();

    assert_eq!(session.state(), TransportState::Stopped);
    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Stopped);
    assert!(source.buffer.is_some());
}

#[test]
fn resume_after_stop_replays() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.stop();

    session.resume();

    assert_eq!(session.state(), TransportState::Playing);
    assert_eq!(source_state(&session), SourceState::Playing);
}

#[test]
fn seek_while_stopped_applies_on_resume() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.stop();

    session.seek(0.5);
    session.resume();

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Playing);
    assert_eq!(source.offset, 0.5);
    assert_eq!(source.pending_offset, None);
    assert_eq!(session.state(), TransportState::Playing);
}

#[test]
fn resume_after_stop_without_seek_starts_over() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.seek(0.7);
    session.stop();

    session.resume();

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.offset, 0.0);
}

#[test]
fn seek_after_natural_end_applies_on_resume() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    let (source, _) = session.backend().only_source().unwrap();
    session.backend_mut().finish_playback(source);

    session.seek(0.25);
    session.resume();

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.state, SourceState::Playing);
    assert_eq!(source.offset, 0.25);
}

#[test]
fn resume_without_data_stays_ready() {
    let mut session = session();
    session.initialize_if_needed(false).unwrap();

    session.resume();

    assert_eq!(session.state(), TransportState::Ready);
    assert_eq!(source_state(&session), SourceState::Initial);
}

#[test]
fn seek_is_not_bounded_by_session() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    session.seek(120.0);

    let (_, source) = session.backend().only_source().unwrap();
    assert_eq!(source.offset, 120.0);
    assert_eq!(session.state(), TransportState::Playing);
}

#[test]
fn rejected_seek_is_swallowed() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    session.seek(-1.0);
    session.seek(f32::NAN);

    assert_eq!(session.state(), TransportState::Playing);
}

#[test]
fn source_state_reports_natural_end() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    let (source, _) = session.backend().only_source().unwrap();

    session.backend_mut().finish_playback(source);

    // Tracked state does not follow the backend timeline
    assert_eq!(session.state(), TransportState::Playing);
    assert_eq!(session.source_state(), Some(SourceState::Stopped));
}

// ============================================================================
// RELEASE
// ============================================================================

#[test]
fn release_tears_down_in_reverse_order() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.backend_mut().clear_calls();

    session.release();

    let calls = session.backend().calls();
    assert!(matches!(calls[0], Call::Stop(_)));
    assert!(matches!(calls[1], Call::DeleteSource(_)));
    assert!(matches!(calls[2], Call::DeleteBuffer(_)));
    assert!(matches!(calls[3], Call::MakeContextCurrent(None)));
    assert!(matches!(calls[4], Call::DestroyContext(_)));
    assert!(matches!(calls[5], Call::CloseDevice(_)));
    assert_eq!(calls.len(), 6);

    assert!(session.backend().is_empty());
    assert_eq!(session.state(), TransportState::Uninitialized);
    assert_eq!(session.device(), None);
}

#[test]
fn release_is_idempotent() {
    let mut session = session();
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    session.release();
    session.backend_mut().clear_calls();

    for _ in 0..5 {
        session.release();
    }

    assert!(session.backend().calls().is_empty());
    assert_eq!(session.state(), TransportState::Uninitialized);
}

#[test]
fn release_on_fresh_session_is_safe() {
    let mut session = session();
    session.release();
    session.release();

    assert!(session.backend().calls().is_empty());
}

#[test]
fn play_after_release_rebuilds_everything() {
    let mut session = session_with(MockOptions {
        reset_extension: true,
        ..MockOptions::default()
    });
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();
    let first_device = session.device();
    session.release();

    session.play(&pcm(8_000, 2), 8_000, 2, true).unwrap();

    assert_ne!(session.device(), first_device);
    assert_eq!(session.backend().devices_opened(), 2);
    assert_eq!(session.backend().live_counts(), (1, 1, 1, 1));
    assert_eq!(session.hrtf(), HrtfStatus::Enabled);

    // Transport works against the new handles
    session.pause();
    assert_eq!(source_state(&session), SourceState::Paused);
    session.seek(0.2);
    session.resume();
    assert_eq!(source_state(&session), SourceState::Playing);
    session.stop();
    assert_eq!(source_state(&session), SourceState::Stopped);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn missing_device_fails_without_partial_state() {
    let mut session = session_with(MockOptions {
        no_device: true,
        ..MockOptions::default()
    });

    let result = session.play(&pcm(8_000, 2), 8_000, 2, true);

    assert!(matches!(result, Err(SessionError::DeviceUnavailable(_))));
    assert_eq!(session.device(), None);
    assert!(session.backend().is_empty());
    assert_eq!(session.state(), TransportState::Uninitialized);
}

#[test]
fn device_can_appear_later() {
    let mut session = session_with(MockOptions {
        no_device: true,
        ..MockOptions::default()
    });
    assert!(session.play(&pcm(8_000, 2), 8_000, 2, false).is_err());

    session.backend_mut().options.no_device = false;

    assert!(session.play(&pcm(8_000, 2), 8_000, 2, false).is_ok());
    assert_eq!(session.state(), TransportState::Playing);
}

#[test]
fn context_failure_keeps_device_until_release() {
    let mut session = session_with(MockOptions {
        context_fails: true,
        ..MockOptions::default()
    });

    let result = session.play(&pcm(8_000, 2), 8_000, 2, false);

    assert!(matches!(result, Err(SessionError::ContextFailed(_))));
    assert!(!session.is_initialized());
    assert_eq!(session.backend().live_counts(), (1, 0, 0, 0));

    session.release();
    assert!(session.backend().is_empty());
}

#[test]
fn make_current_failure_is_reclaimed_by_release() {
    let mut session = session_with(MockOptions {
        make_current_fails: true,
        ..MockOptions::default()
    });

    let result = session.initialize_if_needed(false);

    assert!(matches!(result, Err(SessionError::ContextFailed(_))));
    assert_eq!(session.backend().live_counts(), (1, 1, 0, 0));

    session.release();
    assert!(session.backend().is_empty());
}

#[test]
fn retry_after_partial_failure_rebuilds_from_scratch() {
    let mut session = session_with(MockOptions {
        gen_buffer_fails: true,
        ..MockOptions::default()
    });
    assert!(matches!(
        session.initialize_if_needed(false),
        Err(SessionError::AllocationFailed(_))
    ));
    assert_eq!(session.backend().live_counts(), (1, 1, 1, 0));

    session.backend_mut().options.gen_buffer_fails = false;
    session.play(&pcm(8_000, 2), 8_000, 2, false).unwrap();

    // Leftovers were released before the second attempt
    assert_eq!(session.backend().devices_opened(), 2);
    assert_eq!(session.backend().live_counts(), (1, 1, 1, 1));
}

#[test]
fn transport_after_failed_init_is_a_noop() {
    let mut session = session_with(MockOptions {
        context_fails: true,
        ..MockOptions::default()
    });
    let _ = session.play(&pcm(8_000, 2), 8_000, 2, false);
    session.backend_mut().clear_calls();

    session.pause();
    session.resume();
    session.seek(1.0);
    session.stop();

    assert!(session.backend().calls().is_empty());
}
