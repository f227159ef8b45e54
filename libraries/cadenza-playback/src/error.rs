//! Error types for playback control

use crate::command::CommandError;
use crate::types::TrackId;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The OS refused exclusive audio output
    #[error("Audio focus denied")]
    FocusDenied,

    /// Audio focus will be granted later; playback starts on the gain notification
    #[error("Audio focus grant delayed")]
    FocusDelayed,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Track id could not be resolved by the library
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Engine could not load or prepare a source
    #[error("Source error: {0}")]
    Source(String),

    /// Malformed external command
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Snapshot or settings persistence failed
    #[error("Store error: {0}")]
    Store(String),

    /// The serialized control loop is gone
    #[error("Playback service is not running")]
    ChannelClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Create a source error
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
