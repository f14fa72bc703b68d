//! Modal keyboard handling

use crate::commands::{Command, Direction, Mode};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Number of answer choices reachable by digit keys
pub const DIGIT_CHOICES: usize = 4;

/// Handles keyboard input and converts to commands
#[derive(Debug, Default)]
pub struct InputHandler {
    mode: Mode,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        // Some terminals report releases too; act on presses only
        if key.kind == KeyEventKind::Release {
            return None;
        }

        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }

        match self.mode {
            Mode::Play => self.handle_play_mode(key),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    fn handle_play_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Command::MoveSelection(Direction::Up)),
            KeyCode::Down | KeyCode::Char('j') => Some(Command::MoveSelection(Direction::Down)),
            KeyCode::Left => Some(Command::MoveSelection(Direction::Left)),
            KeyCode::Right | KeyCode::Tab => Some(Command::MoveSelection(Direction::Right)),

            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Answer),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                (index < DIGIT_CHOICES).then_some(Command::AnswerChoice(index))
            }

            KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::Hint),
            KeyCode::Char('m') | KeyCode::Char('M') => Some(Command::ToggleMute),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::ToggleSound),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::ToggleAmbient),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::VolumeUp),
            KeyCode::Char('-') => Some(Command::VolumeDown),

            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Some(Command::ToggleHelp)
            }

            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),

            _ => None,
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.mode = Mode::Play;
                Some(Command::ToggleHelp)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_digits_map_to_choices() {
        let mut input = InputHandler::new();
        assert_eq!(input.handle_key(press(KeyCode::Char('1'))), Some(Command::AnswerChoice(0)));
        assert_eq!(input.handle_key(press(KeyCode::Char('4'))), Some(Command::AnswerChoice(3)));
        assert_eq!(input.handle_key(press(KeyCode::Char('7'))), None);
    }

    #[test]
    fn test_letter_shortcuts() {
        let mut input = InputHandler::new();
        assert_eq!(input.handle_key(press(KeyCode::Char('M'))), Some(Command::ToggleMute));
        assert_eq!(input.handle_key(press(KeyCode::Char('r'))), Some(Command::Restart));
        assert_eq!(input.handle_key(press(KeyCode::Char('h'))), Some(Command::Hint));
        assert_eq!(input.handle_key(press(KeyCode::Enter)), Some(Command::Answer));
        assert_eq!(input.handle_key(press(KeyCode::Char('='))), Some(Command::VolumeUp));
        assert_eq!(input.handle_key(press(KeyCode::Char('-'))), Some(Command::VolumeDown));
    }

    #[test]
    fn test_help_mode_swallows_game_keys() {
        let mut input = InputHandler::new();
        input.handle_key(press(KeyCode::Char('?')));
        assert_eq!(input.mode(), Mode::Help);
        assert_eq!(input.handle_key(press(KeyCode::Enter)), None);
        assert_eq!(input.handle_key(press(KeyCode::Esc)), Some(Command::ToggleHelp));
        assert_eq!(input.mode(), Mode::Play);
    }

    #[test]
    fn test_ctrl_q_quits_from_any_mode() {
        let mut input = InputHandler::new();
        input.handle_key(press(KeyCode::Char('?')));
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(input.handle_key(key), Some(Command::Quit));
    }

    #[test]
    fn test_release_events_ignored() {
        let mut input = InputHandler::new();
        let mut key = press(KeyCode::Enter);
        key.kind = KeyEventKind::Release;
        assert_eq!(input.handle_key(key), None);
    }
}
