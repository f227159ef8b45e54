//! Core types for playback control

use serde::{Deserialize, Serialize};

/// Stable numeric track identifier from the song store
pub type TrackId = i64;

/// Playback speed. Variable speed is not supported.
pub const PLAYBACK_SPEED: f32 = 1.0;

/// Track information used for session metadata
///
/// Read-only to the control core; sourced from the [`TrackLibrary`](crate::TrackLibrary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Album identifier (artwork lookups key off this)
    pub album_id: i64,

    /// Track duration in milliseconds
    pub duration_ms: u64,
}

/// Metadata published to the session for the current track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track id as a media id string
    pub media_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Artwork key (the album id)
    pub art_uri: String,
    pub duration_ms: u64,
}

impl From<&Track> for TrackMetadata {
    fn from(track: &Track) -> Self {
        Self {
            media_id: track.id.to_string(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            art_uri: track.album_id.to_string(),
            duration_ms: track.duration_ms,
        }
    }
}

impl TrackMetadata {
    /// Track id parsed back from the media id
    pub fn track_id(&self) -> Option<TrackId> {
        self.media_id.parse().ok()
    }
}

/// Session playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing loaded, no active session
    #[default]
    None,

    /// Engine reset, no source
    Stopped,

    /// Source loaded, rendering suspended
    Paused,

    /// Rendering
    Playing,
}

impl PlaybackStatus {
    /// Session integer code
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Stopped => 1,
            Self::Paused => 2,
            Self::Playing => 3,
        }
    }

    /// Decode a session integer code, unknown codes map to `None`
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Stopped,
            2 => Self::Paused,
            3 => Self::Playing,
            _ => Self::None,
        }
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue
    #[default]
    None,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

impl RepeatMode {
    /// Session integer code
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::One => 1,
            Self::All => 2,
        }
    }

    /// Decode a session integer code, unknown codes map to `None`
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::One,
            2 => Self::All,
            _ => Self::None,
        }
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// Play in queue order
    #[default]
    None,

    /// Queue order randomized
    All,
}

impl ShuffleMode {
    /// Session integer code
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::All => 1,
        }
    }

    /// Decode a session integer code, any non-zero code is `All`
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            Self::None
        } else {
            Self::All
        }
    }
}

/// Out-of-band session fields carried alongside the playback state
///
/// The publisher mirrors these into the session's own repeat/shuffle
/// indicators whenever a state carrying them is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackExtras {
    /// Repeat policy, if set
    pub repeat_mode: Option<RepeatMode>,

    /// Shuffle policy, if set
    pub shuffle_mode: Option<ShuffleMode>,
}

/// Authoritative playback state, owned by the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Current status
    pub status: PlaybackStatus,

    /// Position in milliseconds
    pub position_ms: u64,

    /// Playback speed
    pub speed: f32,

    /// Repeat/shuffle extras
    pub extras: PlaybackExtras,

    /// Last source error, cleared by the next successful transition
    pub error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::None,
            position_ms: 0,
            speed: PLAYBACK_SPEED,
            extras: PlaybackExtras::default(),
            error: None,
        }
    }
}

impl PlaybackState {
    /// Copy of this state with a new status and position, extras kept
    pub fn with_status(&self, status: PlaybackStatus, position_ms: u64) -> Self {
        Self {
            status,
            position_ms,
            speed: PLAYBACK_SPEED,
            extras: self.extras,
            error: None,
        }
    }

    /// Whether the state is `Playing`
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}
