//! Status bar widget - mode indicator, live status message, audio state

use crate::status::MessageType;
use crate::theme::Theme;
use chime_input::Mode;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Widget for displaying the status bar
pub struct StatusBarWidget<'a> {
    mode: Mode,
    message: Option<&'a str>,
    message_type: MessageType,
    audio_note: Option<&'a str>,
    ambient: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: Mode, theme: &'a Theme) -> Self {
        Self {
            mode,
            message: None,
            message_type: MessageType::Info,
            audio_note: None,
            ambient: None,
            theme,
        }
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }

    /// Audio state shown on the right ("Muted", "Sound off", ...)
    pub fn audio(mut self, note: Option<&'a str>, ambient: Option<&'a str>) -> Self {
        self.audio_note = note;
        self.ambient = ambient;
        self
    }

    fn mode_string(&self) -> (&'static str, Style) {
        match self.mode {
            Mode::Play => (self.mode.display_name(), self.theme.highlight()),
            Mode::Help => (self.mode.display_name(), Style::from(self.theme.accent)),
        }
    }

    fn audio_line(&self) -> Line<'a> {
        let mut spans = vec![];
        match self.audio_note {
            Some(note) => spans.push(Span::styled(note, Style::default().fg(self.theme.warning))),
            None => spans.push(Span::styled("♪ on", Style::from(self.theme.accent))),
        }
        if let Some(bed) = self.ambient {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("~{}", bed), self.theme.dim()));
        }
        Line::from(spans)
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Length(8),  // Mode indicator
            Constraint::Min(20),    // Status message
            Constraint::Length(24), // Audio state
        ])
        .split(area);

        let (mode_text, mode_style) = self.mode_string();
        let mode_line = Line::from(vec![
            Span::raw("["),
            Span::styled(mode_text, mode_style),
            Span::raw("]"),
        ]);
        Paragraph::new(mode_line).render(chunks[0], buf);

        let content = if let Some(msg) = self.message {
            let msg_style = match self.message_type {
                MessageType::Info => self.theme.normal(),
                MessageType::Success => Style::from(self.theme.accent),
                MessageType::Warning => Style::default().fg(self.theme.warning),
                MessageType::Error => Style::default().fg(self.theme.danger),
            };
            Line::from(Span::styled(msg, msg_style))
        } else {
            Line::from(Span::styled(
                "Pick an answer with the arrows and Enter. Press ? for help",
                self.theme.dim(),
            ))
        };
        Paragraph::new(content).render(chunks[1], buf);

        Paragraph::new(self.audio_line()).render(chunks[2], buf);
    }
}

/// Help overlay widget
pub struct HelpWidget<'a> {
    theme: &'a Theme,
}

impl<'a> HelpWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    fn help_lines() -> Vec<&'static str> {
        vec![
            "╔══════════════════════════════════════════════╗",
            "║            CHIME - arithmetic quiz           ║",
            "╠══════════════════════════════════════════════╣",
            "║ ANSWERING                                    ║",
            "║   ← → ↑ ↓ / j k    Move between answers      ║",
            "║   Enter / Space    Choose highlighted answer ║",
            "║   1-4              Choose answer by number   ║",
            "║   h                Show a hint               ║",
            "║   r                Start over                ║",
            "╠──────────────────────────────────────────────╣",
            "║ SOUND                                        ║",
            "║   m                Mute / unmute             ║",
            "║   s                Sound effects on / off    ║",
            "║   a                Background music on / off ║",
            "║   + / -            Volume up / down          ║",
            "╠══════════════════════════════════════════════╣",
            "║        Press Esc or ? to close help          ║",
            "║             q or Ctrl-Q to quit              ║",
            "╚══════════════════════════════════════════════╝",
        ]
    }
}

impl Widget for HelpWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear background
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                buf[(x, y)].set_char(' ').set_style(self.theme.normal());
            }
        }

        let help_text = Self::help_lines();
        let width = help_text
            .first()
            .map(|line| line.chars().count() as u16)
            .unwrap_or(0);
        let start_x = area.x + area.width.saturating_sub(width) / 2;
        let start_y = area.y + area.height.saturating_sub(help_text.len() as u16) / 2;

        for (i, line) in help_text.iter().enumerate() {
            let y = start_y + i as u16;
            if y >= area.y + area.height {
                break;
            }

            for (j, ch) in line.chars().enumerate() {
                let x = start_x + j as u16;
                if x >= area.x + area.width {
                    break;
                }

                let style = if matches!(ch, '║' | '╔' | '╗' | '╚' | '╝' | '═' | '╠' | '╣' | '─') {
                    self.theme.border()
                } else {
                    self.theme.normal()
                };

                buf[(x, y)].set_char(ch).set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::CHALKBOARD;

    fn row_text(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn test_status_bar_shows_message_and_audio_note() {
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        StatusBarWidget::new(Mode::Play, &CHALKBOARD)
            .message(Some("Correct! 7 + 5 = 12"), MessageType::Success)
            .audio(Some("Muted"), Some("calm"))
            .render(area, &mut buf);

        let text = row_text(&buf, 0, 80);
        assert!(text.contains("[PLAY]"));
        assert!(text.contains("Correct! 7 + 5 = 12"));
        assert!(text.contains("Muted"));
        assert!(text.contains("~calm"));
    }

    #[test]
    fn test_help_lines_are_uniform_width() {
        let lines = HelpWidget::help_lines();
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|line| line.chars().count() == width));
    }

    #[test]
    fn test_help_renders_in_small_area() {
        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);
        HelpWidget::new(&CHALKBOARD).render(area, &mut buf);
    }
}
