//! Session state machine

use serde::{Deserialize, Serialize};

/// Transport state tracked by the session
///
/// `Uninitialized` is the only state without backend resources. `release`
/// always returns here, and `play` from here re-initializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// No device, context, source or buffer
    #[default]
    Uninitialized,

    /// Resources allocated, nothing uploaded yet
    Ready,

    /// Playback issued
    Playing,

    /// Suspended, position retained
    Paused,

    /// Halted, buffer binding retained
    Stopped,
}

impl TransportState {
    /// State after a successful `play`
    pub fn on_play(self) -> Self {
        Self::Playing
    }

    /// State after `pause`
    pub fn on_pause(self) -> Self {
        match self {
            Self::Playing => Self::Paused,
            other => other,
        }
    }

    /// State after `resume`
    ///
    /// A stopped source with data replays from the start, so `Stopped` also
    /// moves to `Playing`. `Ready` has nothing to play.
    pub fn on_resume(self) -> Self {
        match self {
            Self::Paused | Self::Stopped => Self::Playing,
            other => other,
        }
    }

    /// State after `stop`
    pub fn on_stop(self) -> Self {
        match self {
            Self::Uninitialized => Self::Uninitialized,
            _ => Self::Stopped,
        }
    }

    /// Whether backend resources exist in this state
    pub fn is_initialized(self) -> bool {
        self != Self::Uninitialized
    }
}

/// Outcome of HRTF negotiation for the open device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HrtfStatus {
    /// HRTF was not requested (or no device is open)
    #[default]
    NotRequested,

    /// Device was reset with HRTF rendering
    Enabled,

    /// Reset extension missing; default spatialization in use
    Unavailable,

    /// Extension present but the reset call was rejected
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_from_anywhere() {
        for state in [
            TransportState::Uninitialized,
            TransportState::Ready,
            TransportState::Playing,
            TransportState::Paused,
            TransportState::Stopped,
        ] {
            assert_eq!(state.on_play(), TransportState::Playing);
        }
    }

    #[test]
    fn pause_only_from_playing() {
        assert_eq!(TransportState::Playing.on_pause(), TransportState::Paused);
        assert_eq!(TransportState::Ready.on_pause(), TransportState::Ready);
        assert_eq!(TransportState::Stopped.on_pause(), TransportState::Stopped);
        assert_eq!(TransportState::Paused.on_pause(), TransportState::Paused);
    }

    #[test]
    fn resume_transitions() {
        assert_eq!(TransportState::Paused.on_resume(), TransportState::Playing);
        assert_eq!(TransportState::Stopped.on_resume(), TransportState::Playing);
        assert_eq!(TransportState::Ready.on_resume(), TransportState::Ready);
        assert_eq!(
            TransportState::Uninitialized.on_resume(),
            TransportState::Uninitialized
        );
    }

    #[test]
    fn stop_from_any_initialized_state() {
        assert_eq!(TransportState::Ready.on_stop(), TransportState::Stopped);
        assert_eq!(TransportState::Playing.on_stop(), TransportState::Stopped);
        assert_eq!(TransportState::Paused.on_stop(), TransportState::Stopped);
        assert_eq!(
            TransportState::Uninitialized.on_stop(),
            TransportState::Uninitialized
        );
    }
}
