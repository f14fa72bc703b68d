//! Application state: routes commands to the quiz and the audio engine

use std::path::PathBuf;

use chime_audio::{AudioEngine, Config};
use chime_input::{Command, InputHandler, Mode};
use chime_tui::{Banner, HelpWidget, MessageType, QuizWidget, StatusBarWidget, StatusLine, Theme};
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};
use tracing::{debug, warn};

use crate::quiz::{Phase, Quiz, Transition, LEVELS, MAX_MISSES, QUESTIONS_PER_LEVEL};

/// Master volume change per key press
const VOLUME_STEP: f32 = 0.1;

pub struct App {
    quiz: Quiz,
    status: StatusLine,
    input: InputHandler,
    engine: AudioEngine,
    config: Config,
    /// Where toggled preferences are saved; `None` keeps them in memory
    config_path: Option<PathBuf>,
    theme: Theme,
    unlocked: bool,
    should_quit: bool,
}

impl App {
    pub fn new(engine: AudioEngine, config: Config, theme: Theme, seed: u64) -> Self {
        let quiz = Quiz::new(seed);
        let mut status = StatusLine::new();
        status.set_message(format!(
            "Level 1: {}  Press ? for help",
            quiz.question().prompt()
        ));

        Self {
            quiz,
            status,
            input: InputHandler::new(),
            engine,
            config,
            config_path: None,
            theme,
            unlocked: false,
            should_quit: false,
        }
    }

    /// Persist sound preferences to `path` whenever they change
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AudioEngine {
        &mut self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        // A key press is the user gesture that lets audio start
        if !self.unlocked {
            self.unlocked = true;
            self.engine.unlock();
            if self.config.ambient {
                self.engine.start_ambient(self.config.ambient_bed);
            }
        }

        if let Some(cmd) = self.input.handle_key(key) {
            self.handle_command(cmd);
        }
    }

    pub fn handle_command(&mut self, cmd: Command) {
        debug!(?cmd, "command");
        match cmd {
            Command::MoveSelection(direction) => {
                let t = self.quiz.move_selection(direction);
                self.apply(t);
            }
            Command::Answer => {
                let t = self.quiz.answer();
                self.apply(t);
            }
            Command::AnswerChoice(index) => {
                let t = self.quiz.answer_choice(index);
                self.apply(t);
            }
            Command::Hint => {
                let t = self.quiz.request_hint();
                self.apply(t);
            }
            Command::Restart => {
                let t = self.quiz.restart();
                self.apply(Some(t));
            }
            Command::ToggleMute => {
                let muted = self.engine.toggle_mute();
                if muted {
                    self.engine.stop_ambient();
                } else if self.config.ambient {
                    self.engine.start_ambient(self.config.ambient_bed);
                }
                self.config.muted = muted;
                self.save_config();
                self.status
                    .set_message(if muted { "Sound muted" } else { "Sound unmuted" });
            }
            Command::ToggleSound => {
                let enabled = !self.engine.is_enabled();
                self.engine.set_enabled(enabled);
                if enabled && self.config.ambient {
                    self.engine.start_ambient(self.config.ambient_bed);
                }
                self.config.enabled = enabled;
                self.save_config();
                self.status
                    .set_message(if enabled { "Sound on" } else { "Sound off" });
            }
            Command::ToggleAmbient => {
                self.config.ambient = !self.config.ambient;
                if self.config.ambient {
                    // No-op while muted or sound is off; unmute starts it
                    self.engine.start_ambient(self.config.ambient_bed);
                    self.status.set_message(format!(
                        "Background music on ({})",
                        self.config.ambient_bed.name()
                    ));
                } else {
                    self.engine.stop_ambient();
                    self.status.set_message("Background music off");
                }
                self.save_config();
            }
            Command::VolumeUp | Command::VolumeDown => {
                let step = if cmd == Command::VolumeUp { VOLUME_STEP } else { -VOLUME_STEP };
                let volume = ((self.engine.master_volume() + step) * 10.0).round() / 10.0;
                self.engine.set_master_volume(volume);
                self.config.master_volume = self.engine.master_volume();
                self.save_config();
                self.status.set_message(format!(
                    "Volume {}%",
                    (self.config.master_volume * 100.0).round() as u32
                ));
            }
            Command::ToggleHelp => {
                if self.input.mode() == Mode::Help {
                    self.status.set_message("Help");
                } else {
                    self.status.set_message(format!("Back to {}", self.quiz.question().prompt()));
                }
            }
            Command::Quit => self.should_quit = true,
        }
    }

    /// Advance timers by `dt` seconds; call once per frame
    pub fn tick(&mut self, dt: f64) {
        let t = self.quiz.tick(dt);
        self.apply(t);
        self.engine.poll();
    }

    /// Stop sound and release the output device
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }

    fn apply(&mut self, transition: Option<Transition>) {
        let Some(t) = transition else {
            return;
        };
        match t.kind {
            MessageType::Info => self.status.set_message(t.message),
            MessageType::Success => self.status.set_success(t.message),
            MessageType::Warning => self.status.set_warning(t.message),
            MessageType::Error => self.status.set_error(t.message),
        }
        if let Some(effect) = t.effect {
            self.engine.play(effect);
        }
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, path = %path.display(), "could not save config");
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        if self.input.mode() == Mode::Help {
            frame.render_widget(HelpWidget::new(&self.theme), area);
            return;
        }

        let [main, status] =
            Layout::vertical([Constraint::Min(8), Constraint::Length(1)]).areas(area);

        let question = self.quiz.question();
        let prompt = question.prompt();
        let (feedback, banner) = match self.quiz.phase() {
            Phase::Asking => (None, None),
            Phase::Feedback { correct, .. } => (Some(correct), None),
            Phase::Victory => (None, Some(Banner::Victory)),
            Phase::GameOver => (None, Some(Banner::GameOver)),
        };

        let quiz = QuizWidget::new(&prompt, &question.choices, self.quiz.selected(), &self.theme)
            .progress(
                self.quiz.level(),
                LEVELS,
                self.quiz.question_number(),
                QUESTIONS_PER_LEVEL,
            )
            .score(self.quiz.score())
            .tries(self.quiz.tries_left(), MAX_MISSES)
            .feedback(feedback)
            .hint(self.quiz.hint())
            .banner(banner);
        frame.render_widget(quiz, main);

        let ambient = self.engine.ambient_bed().map(|bed| bed.name());
        let bar = StatusBarWidget::new(self.input.mode(), &self.theme)
            .message(self.status.message(), self.status.message_type())
            .audio(self.engine.status_note(), ambient);
        frame.render_widget(bar, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_audio::{OfflineBackend, UnavailableBackend, AMBIENT_FADE_OUT};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn offline_app(config: Config) -> App {
        let engine = AudioEngine::with_config(Box::new(OfflineBackend::default()), &config);
        App::new(engine, config, Theme::default(), 21)
    }

    #[test]
    fn test_first_key_unlocks_audio_and_ambient() {
        let mut app = offline_app(Config::default());
        assert!(!app.engine().has_context());

        app.handle_key(press(KeyCode::Right));
        assert!(app.engine().has_context());
        assert!(app.engine().is_ambient_running());
        assert!(app.status().message().unwrap_or("").starts_with("Selected 2"));
    }

    #[test]
    fn test_answer_schedules_sound() {
        let config = Config {
            ambient: false,
            ..Config::default()
        };
        let mut app = offline_app(config);
        let index = app.quiz().question().answer_index;
        app.handle_key(press(KeyCode::Char(char::from(b'1' + index as u8))));

        assert_eq!(app.quiz().score(), 1);
        assert!(app.engine().node_count() > 0);
        assert!(app.status().message().unwrap_or("").starts_with("Correct!"));
    }

    #[test]
    fn test_every_action_updates_status_line() {
        let mut app = offline_app(Config::default());
        let mut revision = app.status().revision();
        for code in [KeyCode::Right, KeyCode::Char('h'), KeyCode::Char('m'), KeyCode::Enter] {
            app.handle_key(press(code));
            assert!(app.status().revision() > revision, "{:?} left status unchanged", code);
            revision = app.status().revision();
        }
    }

    #[test]
    fn test_game_plays_without_audio() {
        let engine = AudioEngine::new(Box::new(UnavailableBackend));
        let mut app = App::new(engine, Config::default(), Theme::default(), 5);
        for _ in 0..20 {
            let index = app.quiz().question().answer_index;
            app.handle_command(Command::AnswerChoice(index));
            app.tick(1.0);
        }
        assert_eq!(app.engine().node_count(), 0);
        assert_eq!(app.engine().status_note(), Some("Audio unavailable"));
        assert!(app.quiz().score() >= 20);
    }

    #[test]
    fn test_toggles_update_config() {
        let mut app = offline_app(Config::default());
        app.handle_key(press(KeyCode::Char('m')));
        assert!(app.config().muted);
        assert!(app.engine().is_muted());

        // Muting fades the bed out with the master
        assert!(!app.engine().is_ambient_running());
        app.engine_mut().advance(AMBIENT_FADE_OUT + 0.1);
        assert_eq!(app.engine().node_count(), 0);

        app.handle_key(press(KeyCode::Char('m')));
        assert!(app.engine().is_ambient_running());

        app.handle_key(press(KeyCode::Char('a')));
        assert!(!app.config().ambient);
        assert!(!app.engine().is_ambient_running());

        app.handle_key(press(KeyCode::Char('s')));
        assert!(!app.config().enabled);
        assert_eq!(app.status().message(), Some("Sound off"));
    }

    #[test]
    fn test_ambient_toggle_while_muted_follows_preference() {
        let mut app = offline_app(Config::default());
        app.handle_key(press(KeyCode::Char('m')));
        assert!(!app.engine().is_ambient_running());

        app.handle_key(press(KeyCode::Char('a')));
        assert!(!app.config().ambient);
        assert_eq!(app.status().message(), Some("Background music off"));

        // Unmuting respects the choice made while muted
        app.handle_key(press(KeyCode::Char('m')));
        assert!(!app.engine().is_ambient_running());

        app.handle_key(press(KeyCode::Char('a')));
        assert!(app.config().ambient);
        assert!(app.engine().is_ambient_running());
    }

    #[test]
    fn test_ambient_choice_kept_while_sound_off() {
        let mut app = offline_app(Config::default());
        app.handle_key(press(KeyCode::Char('s')));
        app.handle_key(press(KeyCode::Char('a')));
        assert!(!app.config().ambient);
        app.handle_key(press(KeyCode::Char('a')));
        assert!(app.config().ambient);
        assert!(!app.engine().is_ambient_running());

        app.handle_key(press(KeyCode::Char('s')));
        assert!(app.engine().is_ambient_running());
    }

    #[test]
    fn test_volume_keys_step_and_clamp() {
        let mut app = offline_app(Config::default());
        app.handle_key(press(KeyCode::Char('-')));
        assert!((app.config().master_volume - 0.7).abs() < 1e-6);
        assert_eq!(app.status().message(), Some("Volume 70%"));

        for _ in 0..10 {
            app.handle_key(press(KeyCode::Char('+')));
        }
        assert_eq!(app.config().master_volume, 1.0);
        assert_eq!(app.engine().master_volume(), 1.0);

        for _ in 0..15 {
            app.handle_key(press(KeyCode::Char('-')));
        }
        assert_eq!(app.config().master_volume, 0.0);
    }

    #[test]
    fn test_quit_command() {
        let mut app = offline_app(Config::default());
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }
}
