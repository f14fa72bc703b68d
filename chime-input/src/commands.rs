//! Command definitions for CHIME

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Play,
    Help,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Play => "PLAY",
            Mode::Help => "HELP",
        }
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Commands that can be dispatched from input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the choice cursor
    MoveSelection(Direction),
    /// Submit the highlighted choice
    Answer,
    /// Submit a choice by number (0-based)
    AnswerChoice(usize),
    Hint,
    ToggleMute,
    ToggleSound,
    ToggleAmbient,
    VolumeUp,
    VolumeDown,
    Restart,
    ToggleHelp,
    Quit,
}
