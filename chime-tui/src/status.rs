//! Status line state
//!
//! The status line is the text channel that mirrors every audible event, so
//! the game stays playable with sound off.

/// Message type for colored status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    message: Option<String>,
    message_type: MessageType,
    /// Bumped on every update, including repeats of the same text
    revision: u64,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Set a message to display (info level)
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.set(msg.into(), MessageType::Info);
    }

    /// Set a success message (green)
    pub fn set_success(&mut self, msg: impl Into<String>) {
        self.set(msg.into(), MessageType::Success);
    }

    /// Set a warning message (yellow)
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.set(msg.into(), MessageType::Warning);
    }

    /// Set an error message (red)
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.set(msg.into(), MessageType::Error);
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.message_type = MessageType::Info;
        self.revision = self.revision.wrapping_add(1);
    }

    fn set(&mut self, msg: String, message_type: MessageType) {
        self.message = Some(msg);
        self.message_type = message_type;
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_message_bumps_revision() {
        let mut status = StatusLine::new();
        status.set_message("Selected 7");
        let first = status.revision();
        status.set_message("Selected 7");
        assert!(status.revision() > first);
        assert_eq!(status.message(), Some("Selected 7"));
    }

    #[test]
    fn test_message_types() {
        let mut status = StatusLine::new();
        status.set_error("Not quite");
        assert_eq!(status.message_type(), MessageType::Error);
        status.clear();
        assert_eq!(status.message(), None);
        assert_eq!(status.message_type(), MessageType::Info);
    }
}
