//! Terminal UI for CHIME - widgets, theme, and the status line
//!
//! Every widget is a plain ratatui `Widget` built from borrowed view data,
//! so the game state stays in the application crate.

mod status;
mod theme;
pub mod widgets;

pub use status::{MessageType, StatusLine};
pub use theme::{Theme, CHALKBOARD, HIGH_CONTRAST};
pub use widgets::status_bar::HelpWidget;
pub use widgets::{Banner, QuizWidget, StatusBarWidget};
