//! External command vocabulary
//!
//! Remote surfaces send a named action with a JSON object payload.
//! [`Command::decode`] turns that pair into a typed [`Command`]; unknown
//! actions decode to `None` and are ignored by the dispatcher. A known
//! action with a missing or malformed required field is a [`CommandError`],
//! which the dispatcher logs and drops.

use crate::engine::EngineParameter;
use crate::types::{RepeatMode, ShuffleMode, TrackId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Command payload: a JSON object keyed by field name
pub type Payload = Map<String, Value>;

/// Command decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A required payload field is absent
    #[error("{action}: missing field `{field}`")]
    MissingField {
        action: String,
        field: &'static str,
    },

    /// A payload field has the wrong type or an unparseable value
    #[error("{action}: invalid field `{field}`: {reason}")]
    InvalidField {
        action: String,
        field: &'static str,
        reason: String,
    },
}

/// Media id of a browsable item
///
/// Either a bare track id (`"42"`) or `category|id[|caller]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaId {
    pub category: Option<String>,
    pub track_id: TrackId,
    pub caller: Option<String>,
}

impl MediaId {
    pub fn parse(text: &str) -> Option<Self> {
        let parts: Vec<&str> = text.split('|').collect();
        match parts.as_slice() {
            [id] => Some(Self {
                category: None,
                track_id: id.trim().parse().ok()?,
                caller: None,
            }),
            [category, id, rest @ ..] => Some(Self {
                category: Some((*category).to_string()),
                track_id: id.trim().parse().ok()?,
                caller: rest.first().map(|caller| (*caller).to_string()),
            }),
            [] => None,
        }
    }
}

/// Decoded external command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Restore the persisted session, or resync a live one
    SetMediaState,
    RepeatSong,
    RepeatQueue,
    PlayNext {
        track_id: TrackId,
    },
    QueueReorder {
        from: usize,
        to: usize,
    },
    SongDeleted {
        track_id: TrackId,
    },
    /// Republish the live session
    RestoreMediaSession,
    /// Engine tuning, forwarded unchanged
    Parameter(EngineParameter),
    /// EQ parameter text (preset or raw)
    SetEqParams(String),
    SetSleep {
        enabled: bool,
    },

    // Transport controls
    Play,
    Pause,
    PlayFromSearch {
        query: Option<String>,
    },
    PlayFromMediaId {
        media_id: MediaId,
        queue: Option<Vec<TrackId>>,
        queue_title: Option<String>,
        seek_position: u64,
    },
    SeekTo {
        position_ms: u64,
    },
    SkipNext,
    SkipPrevious,
    Stop,
    SetRepeatMode(RepeatMode),
    SetShuffleMode(ShuffleMode),
}

impl Command {
    /// Decode an action name and payload
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when a known action lacks a required field or
    /// carries a value of the wrong type.
    pub fn decode(action: &str, payload: &Payload) -> Result<Option<Self>, CommandError> {
        let fields = Fields { action, payload };

        let command = match action {
            "set-media-state" => Self::SetMediaState,
            "repeat-song" => Self::RepeatSong,
            "repeat-queue" => Self::RepeatQueue,
            "play-next" => Self::PlayNext {
                track_id: fields.int("track-id")?,
            },
            "queue-reorder" => Self::QueueReorder {
                from: fields.index("from-index")?,
                to: fields.index("to-index")?,
            },
            "song-deleted" => Self::SongDeleted {
                track_id: fields.int("track-id")?,
            },
            "restore-media-session" => Self::RestoreMediaSession,

            "set-samplerate" => {
                Self::Parameter(EngineParameter::SampleRate(fields.sample_rate("sample-rate")?))
            }
            "set-enabled-effect" => {
                Self::Parameter(EngineParameter::EffectEnabled(fields.bool("enabled")?))
            }
            "set-enabled-stereo-width" => {
                Self::Parameter(EngineParameter::StereoWidthEnabled(fields.bool("enabled")?))
            }
            "set-stereo-width" => {
                Self::Parameter(EngineParameter::StereoWidth(fields.int("width")? as f32))
            }
            "set-enabled-chafen" => {
                Self::Parameter(EngineParameter::ChafenEnabled(fields.bool("enabled")?))
            }
            "set-chafen" => Self::Parameter(EngineParameter::ChafenDelay(fields.int32("delay")?)),
            "select-eqparam" => Self::SetEqParams(fields.string("preset")?),
            "set-eqparam" => Self::SetEqParams(fields.string("eqparam")?),
            "set-enabled-compressor" => {
                Self::Parameter(EngineParameter::CompressorEnabled(fields.bool("enabled")?))
            }
            "set-threshold" => {
                Self::Parameter(EngineParameter::Threshold(fields.int("threshold")? as f32))
            }
            "set-ratio" => Self::Parameter(EngineParameter::Ratio(fields.int("ratio")? as f64)),
            "set-attack" => Self::Parameter(EngineParameter::Attack(fields.int("attack")? as f64)),
            "set-release-time" => {
                Self::Parameter(EngineParameter::ReleaseTime(fields.int("release-time")? as f64))
            }
            "set-auto-gain" => Self::Parameter(EngineParameter::AutoGain(fields.bool("enabled")?)),
            "set-gain" => Self::Parameter(EngineParameter::Gain(fields.int("gain")? as f64)),
            "set-threshold-width" => {
                Self::Parameter(EngineParameter::ThresholdWidth(fields.int32("width")?))
            }
            "set-sleep" => Self::SetSleep {
                enabled: fields.bool("enabled")?,
            },

            "play" => Self::Play,
            "pause" => Self::Pause,
            "play-from-search" => Self::PlayFromSearch {
                query: fields.optional_string("query")?,
            },
            "play-from-media-id" => {
                let text = fields.string("media-id")?;
                let media_id = MediaId::parse(&text)
                    .ok_or_else(|| fields.invalid("media-id", format!("unrecognised `{text}`")))?;
                Self::PlayFromMediaId {
                    media_id,
                    queue: fields.optional_ids("queue")?,
                    queue_title: fields.optional_string("queue-title")?,
                    seek_position: fields.optional_position("seek-position")?.unwrap_or(0),
                }
            }
            "seek-to" => Self::SeekTo {
                position_ms: fields.position("position")?,
            },
            "skip-next" => Self::SkipNext,
            "skip-previous" => Self::SkipPrevious,
            "stop" => Self::Stop,
            "set-repeat-mode" => Self::SetRepeatMode(RepeatMode::from_code(fields.int32("mode")?)),
            "set-shuffle-mode" => {
                Self::SetShuffleMode(ShuffleMode::from_code(fields.int32("mode")?))
            }

            _ => return Ok(None),
        };

        Ok(Some(command))
    }
}

struct Fields<'a> {
    action: &'a str,
    payload: &'a Payload,
}

impl Fields<'_> {
    fn missing(&self, field: &'static str) -> CommandError {
        CommandError::MissingField {
            action: self.action.to_string(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> CommandError {
        CommandError::InvalidField {
            action: self.action.to_string(),
            field,
            reason: reason.into(),
        }
    }

    fn get(&self, field: &'static str) -> Option<&Value> {
        self.payload.get(field).filter(|value| !value.is_null())
    }

    fn require(&self, field: &'static str) -> Result<&Value, CommandError> {
        self.get(field).ok_or_else(|| self.missing(field))
    }

    fn int(&self, field: &'static str) -> Result<i64, CommandError> {
        self.require(field)?
            .as_i64()
            .ok_or_else(|| self.invalid(field, "expected an integer"))
    }

    fn int32(&self, field: &'static str) -> Result<i32, CommandError> {
        let value = self.int(field)?;
        i32::try_from(value).map_err(|_| self.invalid(field, format!("{value} out of range")))
    }

    fn index(&self, field: &'static str) -> Result<usize, CommandError> {
        let value = self.int(field)?;
        usize::try_from(value).map_err(|_| self.invalid(field, format!("negative index {value}")))
    }

    fn position(&self, field: &'static str) -> Result<u64, CommandError> {
        let value = self.int(field)?;
        Ok(value.max(0) as u64)
    }

    fn optional_position(&self, field: &'static str) -> Result<Option<u64>, CommandError> {
        match self.get(field) {
            Some(_) => self.position(field).map(Some),
            None => Ok(None),
        }
    }

    fn bool(&self, field: &'static str) -> Result<bool, CommandError> {
        self.require(field)?
            .as_bool()
            .ok_or_else(|| self.invalid(field, "expected a boolean"))
    }

    fn string(&self, field: &'static str) -> Result<String, CommandError> {
        self.require(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(field, "expected a string"))
    }

    fn optional_string(&self, field: &'static str) -> Result<Option<String>, CommandError> {
        match self.get(field) {
            Some(_) => self.string(field).map(Some),
            None => Ok(None),
        }
    }

    fn sample_rate(&self, field: &'static str) -> Result<u32, CommandError> {
        let value = self.require(field)?;
        let rate = match value {
            Value::String(text) => text
                .trim()
                .parse::<u32>()
                .map_err(|e| self.invalid(field, e.to_string()))?,
            Value::Number(number) => number
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| self.invalid(field, "expected a positive integer"))?,
            _ => return Err(self.invalid(field, "expected a string or integer")),
        };
        Ok(rate)
    }

    fn optional_ids(&self, field: &'static str) -> Result<Option<Vec<TrackId>>, CommandError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(field, "expected an array of track ids"))?;
        items
            .iter()
            .map(|item| {
                item.as_i64()
                    .ok_or_else(|| self.invalid(field, format!("not a track id: {item}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}
