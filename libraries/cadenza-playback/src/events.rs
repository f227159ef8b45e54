//! Playback Events
//!
//! Notifications for observers attached to the session (remote controllers,
//! notification surfaces, the host process). Events are emitted by the
//! session publisher at key points:
//! - Entering or leaving `Playing`
//! - Every published state change
//! - Metadata switching to another track
//! - Queue replacement or removal
//! - Source errors

use crate::types::{PlaybackStatus, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback control core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Emitted exactly when the state enters or leaves `Playing`
    PlayingChanged {
        /// Whether the new state is `Playing`
        playing: bool,
    },

    /// A playback state was published
    StateChanged {
        /// The new status
        state: PlaybackStatus,
        /// Position at publication time
        position_ms: u64,
    },

    /// Session metadata now describes another track
    TrackChanged {
        /// ID of the new track, `None` when metadata was cleared
        track_id: Option<TrackId>,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Queue changed (replaced, reordered or an entry removed)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// The engine reported a source error
    Error {
        /// Error message
        message: String,
    },
}

impl PlaybackEvent {
    /// Whether this is a playing transition into `Playing`
    pub fn started_playing(&self) -> bool {
        matches!(self, Self::PlayingChanged { playing: true })
    }
}
