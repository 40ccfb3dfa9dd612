//! Interactive transport commands read from stdin

use std::fmt;
use std::str::FromStr;

use monovox_bridge::Bridge;
use monovox_core::AudioBackend;

use crate::clip::Clip;

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Upload the clip again and play from the start
    Play,
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Seek to seconds from the start
    Seek(f32),
    /// Stop, keeping the device open
    Stop,
    /// Release the device
    Release,
    /// Print transport state
    Status,
    /// Print the command list
    Help,
    /// Release and exit
    Quit,
}

/// Error for an unrecognised input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type 'help' for commands)", self.0)
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Err(ParseCommandError("empty command".to_string()));
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "play" | "p" => Self::Play,
            "pause" => Self::Pause,
            "resume" | "r" => Self::Resume,
            "seek" | "s" => {
                let seconds = match words.next() {
                    Some(arg) => arg
                        .parse::<f32>()
                        .map_err(|_| ParseCommandError(format!("invalid seconds '{}'", arg)))?,
                    None => 0.0,
                };
                Self::Seek(seconds)
            }
            "stop" => Self::Stop,
            "release" => Self::Release,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseCommandError(format!("unknown command '{}'", other))),
        };

        if words.next().is_some() {
            return Err(ParseCommandError(format!("too many arguments for '{}'", word)));
        }
        Ok(command)
    }
}

/// What the input loop should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading, optionally printing a line
    Continue(Option<String>),
    /// Leave the loop
    Exit,
}

impl Command {
    /// Command summary printed by `help`
    pub const HELP: &'static str =
        "commands: play, pause, resume, seek <seconds>, stop, release, status, quit";

    /// Apply this command to `bridge`
    pub fn apply<B: AudioBackend>(
        self,
        bridge: &Bridge<B>,
        clip: &Clip,
        enable_hrtf: bool,
    ) -> Outcome {
        match self {
            Self::Play => {
                let played = bridge.play(
                    Some(&clip.pcm),
                    i32::try_from(clip.sample_rate).unwrap_or(i32::MAX),
                    i32::from(clip.channels),
                    enable_hrtf,
                );
                if played {
                    Outcome::Continue(None)
                } else {
                    Outcome::Continue(Some("playback failed".to_string()))
                }
            }
            Self::Pause => {
                bridge.pause();
                Outcome::Continue(None)
            }
            Self::Resume => {
                bridge.resume();
                Outcome::Continue(None)
            }
            Self::Seek(seconds) => {
                bridge.seek(seconds);
                Outcome::Continue(None)
            }
            Self::Stop => {
                bridge.stop();
                Outcome::Continue(None)
            }
            Self::Release => {
                bridge.release();
                Outcome::Continue(None)
            }
            Self::Status => {
                let (state, source, hrtf) = bridge.with_session(|session| {
                    (session.state(), session.source_state(), session.hrtf())
                });
                Outcome::Continue(Some(format!(
                    "state: {:?}, source: {:?}, hrtf: {:?}",
                    state, source, hrtf
                )))
            }
            Self::Help => Outcome::Continue(Some(Self::HELP.to_string())),
            Self::Quit => {
                bridge.release();
                Outcome::Exit
            }
        }
    }
}
