//! UI Widgets for CHIME

mod quiz;
pub mod status_bar;

pub use quiz::{Banner, QuizWidget};
pub use status_bar::StatusBarWidget;
