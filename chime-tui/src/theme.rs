//! Color themes for the quiz screen

use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    /// Primary foreground color (text, borders)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (selected choice, titles)
    pub highlight: Color,
    /// Accent color (correct answers, progress)
    pub accent: Color,
    pub warning: Color,
    /// Wrong answers and game over
    pub danger: Color,
}

impl Theme {
    /// Look up a theme by name
    pub fn by_name(name: &str) -> Option<Theme> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chalkboard" | "chalk" => Some(CHALKBOARD),
            "contrast" | "high-contrast" => Some(HIGH_CONTRAST),
            _ => None,
        }
    }

    /// Get style for normal text
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for dimmed text
    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Get style for the selected choice
    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for feedback after an answer
    pub fn feedback(&self, correct: bool) -> Style {
        let color = if correct { self.accent } else { self.danger };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Style for the remaining-tries dots; turns red on the last try
    pub fn tries_style(&self, remaining: u32) -> Style {
        let color = match remaining {
            0 | 1 => self.danger,
            2 => self.warning,
            _ => self.accent,
        };
        Style::default().fg(color)
    }
}

impl Default for Theme {
    fn default() -> Self {
        CHALKBOARD
    }
}

/// Dark green board with chalk-colored text
pub const CHALKBOARD: Theme = Theme {
    name: "chalkboard",
    fg: Color::Rgb(235, 240, 230),        // chalk white
    fg_dim: Color::Rgb(130, 150, 135),    // smudged chalk
    bg: Color::Rgb(24, 46, 36),           // board green
    highlight: Color::Rgb(255, 214, 102), // yellow chalk
    accent: Color::Rgb(120, 220, 140),    // green chalk
    warning: Color::Rgb(255, 170, 80),    // orange chalk
    danger: Color::Rgb(255, 110, 110),    // red chalk
};

/// Black and white with saturated accents
pub const HIGH_CONTRAST: Theme = Theme {
    name: "contrast",
    fg: Color::White,
    fg_dim: Color::Gray,
    bg: Color::Black,
    highlight: Color::Yellow,
    accent: Color::LightGreen,
    warning: Color::LightYellow,
    danger: Color::LightRed,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("Chalk").map(|t| t.name), Some("chalkboard"));
        assert_eq!(Theme::by_name(" contrast ").map(|t| t.name), Some("contrast"));
        assert!(Theme::by_name("neon").is_none());
    }
}
