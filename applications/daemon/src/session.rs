//! JSON-lines session transport
//!
//! Every session update becomes one JSON object on its own line, tagged by
//! `type`. The daemon points this at stdout so a front end can follow the
//! session by reading lines.

use cadenza_playback::{PlaybackState, RepeatMode, SessionTransport, ShuffleMode, TrackMetadata};
use serde::Serialize;
use std::io::{self, Write};
use tracing::warn;

/// One line of session output
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionLine<'a> {
    State { state: &'a PlaybackState },
    Metadata { metadata: Option<&'a TrackMetadata> },
    RepeatMode { mode: i32 },
    ShuffleMode { mode: i32 },
    Active { active: bool },
}

pub struct JsonLinesSession {
    out: Box<dyn Write + Send>,
}

impl std::fmt::Debug for JsonLinesSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSession").finish_non_exhaustive()
    }
}

impl JsonLinesSession {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    /// Session written to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn write(&mut self, line: &SessionLine<'_>) {
        let result = serde_json::to_writer(&mut self.out, line)
            .map_err(io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to write session update: {}", e);
        }
    }
}

impl SessionTransport for JsonLinesSession {
    fn set_playback_state(&mut self, state: &PlaybackState) {
        self.write(&SessionLine::State { state });
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.write(&SessionLine::RepeatMode { mode: mode.code() });
    }

    fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        self.write(&SessionLine::ShuffleMode { mode: mode.code() });
    }

    fn set_metadata(&mut self, metadata: Option<&TrackMetadata>) {
        self.write(&SessionLine::Metadata { metadata });
    }

    fn set_active(&mut self, active: bool) {
        self.write(&SessionLine::Active { active });
    }
}
