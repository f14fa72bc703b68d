//! Error types for the audio layer

use thiserror::Error;

/// Errors that can occur while opening or driving an audio context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoOutputDevice,
    #[error("Failed to get audio config: {0}")]
    DefaultConfig(String),
    #[error("Failed to create audio stream: {0}")]
    BuildStream(String),
    #[error("Failed to start audio: {0}")]
    PlayStream(String),
    #[error("Audio stream error: {0}")]
    Stream(String),
    #[error("Audio output is not available")]
    Unavailable,
    #[error("Audio context is closed")]
    Closed,
    #[error("Voice limit reached ({0} active voices)")]
    VoiceLimit(usize),
}
