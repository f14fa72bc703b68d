//! Keyboard input handling for CHIME

mod commands;
mod modal;

pub use commands::{Command, Direction, Mode};
pub use modal::{InputHandler, DIGIT_CHOICES};
