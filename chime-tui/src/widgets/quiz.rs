//! Quiz widget - question, answer choices, and progress

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// End-of-session overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Victory,
    GameOver,
}

impl Banner {
    fn text(&self) -> &'static str {
        match self {
            Banner::Victory => "*  You finished every level!  *",
            Banner::GameOver => "Out of tries for this level",
        }
    }
}

/// Widget for displaying the current question
pub struct QuizWidget<'a> {
    prompt: &'a str,
    choices: &'a [u32],
    selected: usize,
    theme: &'a Theme,
    level: (u32, u32),
    question: (u32, u32),
    score: u32,
    tries: (u32, u32),
    feedback: Option<bool>,
    hint: Option<&'a str>,
    banner: Option<Banner>,
}

impl<'a> QuizWidget<'a> {
    pub fn new(prompt: &'a str, choices: &'a [u32], selected: usize, theme: &'a Theme) -> Self {
        Self {
            prompt,
            choices,
            selected,
            theme,
            level: (1, 1),
            question: (1, 1),
            score: 0,
            tries: (0, 0),
            feedback: None,
            hint: None,
            banner: None,
        }
    }

    /// Level and question counters, both 1-based
    pub fn progress(mut self, level: u32, levels: u32, question: u32, questions: u32) -> Self {
        self.level = (level, levels);
        self.question = (question, questions);
        self
    }

    pub fn score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub fn tries(mut self, remaining: u32, max: u32) -> Self {
        self.tries = (remaining, max);
        self
    }

    pub fn feedback(mut self, feedback: Option<bool>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn hint(mut self, hint: Option<&'a str>) -> Self {
        self.hint = hint;
        self
    }

    pub fn banner(mut self, banner: Option<Banner>) -> Self {
        self.banner = banner;
        self
    }

    fn progress_line(&self) -> Line<'static> {
        let (remaining, max) = self.tries;
        let dots: String = (0..max)
            .map(|i| if i < remaining { '●' } else { '○' })
            .collect();

        Line::from(vec![
            Span::styled(
                format!("Question {}/{}", self.question.0, self.question.1),
                self.theme.dim(),
            ),
            Span::raw("   "),
            Span::styled(format!("Score {}", self.score), self.theme.normal()),
            Span::raw("   "),
            Span::styled("Tries ", self.theme.dim()),
            Span::styled(dots, self.theme.tries_style(remaining)),
        ])
    }

    fn render_choices(&self, area: Rect, buf: &mut Buffer) {
        if self.choices.is_empty() {
            return;
        }

        let count = self.choices.len() as u32;
        let cells = Layout::horizontal(vec![Constraint::Ratio(1, count); self.choices.len()])
            .split(area);

        for (i, (value, cell)) in self.choices.iter().zip(cells.iter()).enumerate() {
            let style = if i == self.selected {
                self.theme.highlight()
            } else {
                self.theme.normal()
            };
            let label = Line::from(Span::styled(format!(" {}: {} ", i + 1, value), style));
            Paragraph::new(label)
                .alignment(Alignment::Center)
                .render(*cell, buf);
        }
    }
}

impl Widget for QuizWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = match self.feedback {
            Some(correct) => self.theme.feedback(correct),
            None => self.theme.border(),
        };
        let title = format!(" LEVEL {}/{} ", self.level.0, self.level.1);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(title, self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 20 || inner.height < 5 {
            return;
        }

        let [progress, _, prompt, _, choices, _, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(self.progress_line())
            .alignment(Alignment::Center)
            .render(progress, buf);

        if let Some(banner) = self.banner {
            let style = self.theme.feedback(banner == Banner::Victory);
            Paragraph::new(Line::from(Span::styled(banner.text(), style)))
                .alignment(Alignment::Center)
                .render(prompt, buf);
            Paragraph::new(Line::from(Span::styled("Press r to play again", self.theme.dim())))
                .alignment(Alignment::Center)
                .render(choices, buf);
            return;
        }

        let prompt_style = Style::default()
            .fg(self.theme.fg)
            .add_modifier(Modifier::BOLD);
        Paragraph::new(Line::from(Span::styled(self.prompt, prompt_style)))
            .alignment(Alignment::Center)
            .render(prompt, buf);

        self.render_choices(choices, buf);

        let footer_line = match (self.feedback, self.hint) {
            (Some(true), _) => Line::from(Span::styled("Correct!", self.theme.feedback(true))),
            (Some(false), _) => Line::from(Span::styled("Not quite", self.theme.feedback(false))),
            (None, Some(hint)) => Line::from(Span::styled(hint, Style::from(self.theme.warning))),
            (None, None) => Line::default(),
        };
        Paragraph::new(footer_line)
            .alignment(Alignment::Center)
            .render(footer, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::CHALKBOARD;

    fn rendered(widget: QuizWidget<'_>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_renders_prompt_and_choices() {
        let choices = [12, 11, 13, 2];
        let widget = QuizWidget::new("7 + 5 = ?", &choices, 0, &CHALKBOARD)
            .progress(2, 5, 3, 5)
            .tries(3, 3);
        let text = rendered(widget, 60, 12);

        assert!(text.contains("LEVEL 2/5"));
        assert!(text.contains("7 + 5 = ?"));
        assert!(text.contains("1: 12"));
        assert!(text.contains("4: 2"));
        assert!(text.contains("Question 3/5"));
    }

    #[test]
    fn test_banner_replaces_question() {
        let choices = [1, 2, 3, 4];
        let widget = QuizWidget::new("3 - 1 = ?", &choices, 0, &CHALKBOARD)
            .banner(Some(Banner::GameOver));
        let text = rendered(widget, 60, 12);

        assert!(text.contains("Out of tries"));
        assert!(!text.contains("3 - 1 = ?"));
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let choices = [1, 2, 3, 4];
        let widget = QuizWidget::new("1 + 1 = ?", &choices, 9, &CHALKBOARD);
        rendered(widget, 8, 3);
    }
}
