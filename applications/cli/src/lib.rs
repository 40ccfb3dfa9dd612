//! Building blocks of the `monovox` command-line player

pub mod clip;
pub mod command;

pub use clip::{Clip, ClipSource};
pub use command::{Command, Outcome};
