//! Persisted queue snapshot
//!
//! Written opportunistically by the host and read once at restore time.
//! Mode and state fields are stored as session integer codes so snapshots
//! stay readable by older hosts.

use crate::error::Result;
use crate::types::{PlaybackStatus, RepeatMode, ShuffleMode, TrackId};
use serde::{Deserialize, Serialize};

/// Durable queue and position record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedQueueSnapshot {
    /// Selected track, may be absent from `queue_ids`
    pub current_id: Option<TrackId>,

    /// Last playback state code
    pub play_state: i32,

    /// Last known position in milliseconds
    pub seek_position: u64,

    /// Repeat mode code
    pub repeat_mode: i32,

    /// Shuffle mode code
    pub shuffle_mode: i32,

    /// Queue display label
    pub queue_title: String,

    /// Queued track ids in play order
    pub queue_ids: Vec<TrackId>,
}

impl PersistedQueueSnapshot {
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::from_code(self.play_state)
    }

    pub fn repeat(&self) -> RepeatMode {
        RepeatMode::from_code(self.repeat_mode)
    }

    pub fn shuffle(&self) -> ShuffleMode {
        ShuffleMode::from_code(self.shuffle_mode)
    }
}

/// Snapshot persistence
pub trait QueueStore: Send {
    /// Load the last snapshot; `None` when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedQueueSnapshot>>;

    /// Replace the stored snapshot
    fn save(&mut self, snapshot: &PersistedQueueSnapshot) -> Result<()>;
}
