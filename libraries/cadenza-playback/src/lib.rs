//! Cadenza - Playback Control Core
//!
//! The control plane of a background music player: it owns the play queue,
//! drives an external rendering engine through a handful of primitives and
//! maps commands from remote surfaces (notification controls, lock screen,
//! external controllers) onto state transitions.
//!
//! This crate provides:
//! - Play queue with repeat (none/one/all) and shuffle policy
//! - Playback state machine (None, Stopped, Paused, Playing)
//! - Command decoding for the external command surface
//! - Audio focus arbitration with transient-loss resume
//! - Cancellable sleep timer
//! - Session publishing and snapshot restore
//! - EQ parameter text parsing
//!
//! # Architecture
//!
//! Every external collaborator is a trait: [`AudioEngine`], [`AudioFocus`],
//! [`SessionTransport`], [`TrackLibrary`], [`QueueStore`] and
//! [`SettingsStore`]. Hosts supply one implementation of each.
//!
//! All inputs (commands, engine callbacks, focus changes, timer firings) go
//! through a single channel into [`PlaybackService::run`], which owns the
//! [`SongPlayer`] and applies them one at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_playback::{Collaborators, Command, PlaybackService, PlayerConfig};
//!
//! # async fn example(collaborators: Collaborators) -> cadenza_playback::Result<()> {
//! let (service, handle) = PlaybackService::new(collaborators, &PlayerConfig::default());
//! tokio::spawn(service.run());
//!
//! handle.send(Command::SetMediaState)?;
//! handle.send(Command::Play)?;
//!
//! let mut events = handle.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod engine;
pub mod eq;
mod error;
pub mod events;
pub mod focus;
pub mod library;
pub mod player;
pub mod queue;
pub mod service;
pub mod session;
pub mod settings;
pub mod sleep;
pub mod snapshot;
pub mod timer;
pub mod types;

// Public exports
pub use command::{Command, CommandError, MediaId, Payload};
pub use engine::{AudioEngine, EngineEvent, EngineEvents, EngineParameter};
pub use eq::{parse_eq_params, EqBand};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use focus::{AudioFocus, FocusChange, FocusRequest};
pub use library::TrackLibrary;
pub use player::{Collaborators, SongPlayer};
pub use queue::Queue;
pub use service::{ControlEvent, EventSender, PlaybackHandle, PlaybackService};
pub use session::SessionTransport;
pub use settings::{MemorySettings, PlayerConfig, SettingsStore};
pub use snapshot::{PersistedQueueSnapshot, QueueStore};
pub use types::{
    PlaybackExtras, PlaybackState, PlaybackStatus, RepeatMode, ShuffleMode, Track, TrackId,
    TrackMetadata,
};
