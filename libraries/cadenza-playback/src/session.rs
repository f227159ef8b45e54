//! Session State Publisher
//!
//! Projects the queue, the playback state and the current track metadata
//! into the external session consumed by remote controllers, and notifies
//! observers through a broadcast channel of [`PlaybackEvent`]s.
//!
//! The session's own repeat/shuffle indicators are always written from the
//! extras of the state being published, so the two never disagree.

use crate::events::PlaybackEvent;
use crate::library::TrackLibrary;
use crate::queue::Queue;
use crate::snapshot::PersistedQueueSnapshot;
use crate::types::{
    PlaybackExtras, PlaybackState, PlaybackStatus, RepeatMode, ShuffleMode, Track, TrackMetadata,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

/// External session representation
pub trait SessionTransport: Send {
    /// Publish a playback state
    fn set_playback_state(&mut self, state: &PlaybackState);

    /// Session repeat indicator
    fn set_repeat_mode(&mut self, mode: RepeatMode);

    /// Session shuffle indicator
    fn set_shuffle_mode(&mut self, mode: ShuffleMode);

    /// Current track metadata, `None` clears it
    fn set_metadata(&mut self, metadata: Option<&TrackMetadata>);

    /// Activate or deactivate the session
    fn set_active(&mut self, active: bool);
}

pub struct SessionPublisher {
    transport: Box<dyn SessionTransport>,
    state: PlaybackState,
    metadata: Option<TrackMetadata>,

    /// A state has been published since creation or the last release
    active: bool,

    events: broadcast::Sender<PlaybackEvent>,
}

impl std::fmt::Debug for SessionPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPublisher")
            .field("state", &self.state)
            .field("metadata", &self.metadata)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl SessionPublisher {
    pub fn new(transport: Box<dyn SessionTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            state: PlaybackState::default(),
            metadata: None,
            active: false,
            events,
        }
    }

    /// Last published state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Last published metadata
    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    /// Whether a session has been published and not released
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Subscribe to observer events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Sender side of the observer channel, for handles
    pub fn event_sender(&self) -> broadcast::Sender<PlaybackEvent> {
        self.events.clone()
    }

    /// Send an event to observers; having none is fine
    pub fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send(event);
    }

    /// Publish a new state
    pub fn publish(&mut self, state: PlaybackState) {
        if !self.active {
            self.transport.set_active(true);
            self.active = true;
        }

        let was_playing = self.state.is_playing();
        self.write_state(&state);
        self.emit(PlaybackEvent::StateChanged {
            state: state.status,
            position_ms: state.position_ms,
        });
        if was_playing != state.is_playing() {
            self.emit(PlaybackEvent::PlayingChanged {
                playing: state.is_playing(),
            });
        }
        self.state = state;
    }

    /// Publish a status and position, keeping the current extras
    pub fn update(&mut self, status: PlaybackStatus, position_ms: u64) {
        let state = self.state.with_status(status, position_ms);
        self.publish(state);
    }

    /// Republish the current state with the queue's repeat/shuffle policy
    pub fn publish_modes(&mut self, queue: &Queue) {
        let mut state = self.state.clone();
        state.extras = PlaybackExtras {
            repeat_mode: Some(queue.repeat_mode()),
            shuffle_mode: Some(queue.shuffle_mode()),
        };
        self.publish(state);
    }

    /// Replace the session metadata
    pub fn set_metadata(&mut self, track: Option<&Track>) {
        let previous = self.metadata.as_ref().and_then(TrackMetadata::track_id);
        let metadata = track.map(TrackMetadata::from);
        self.transport.set_metadata(metadata.as_ref());

        let current = track.map(|track| track.id);
        if current != previous {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: current,
                previous_track_id: previous,
            });
        }
        self.metadata = metadata;
    }

    /// Push the live state and metadata again, for late observers
    pub fn republish(&mut self) {
        debug!("Republishing session state");
        let state = self.state.clone();
        self.write_state(&state);
        self.transport.set_metadata(self.metadata.as_ref());
        self.emit(PlaybackEvent::StateChanged {
            state: state.status,
            position_ms: state.position_ms,
        });
    }

    /// Rebuild queue, metadata and state from a snapshot
    ///
    /// Never touches the engine. A current track the library no longer
    /// knows is dropped; one that is known but not queued stays selected.
    /// A snapshot taken while playing restores as `Paused`, since nothing
    /// is rendering yet.
    pub fn restore(
        &mut self,
        snapshot: &PersistedQueueSnapshot,
        queue: &mut Queue,
        library: &dyn TrackLibrary,
    ) {
        info!(
            "Restoring session: {} queued, current {:?}",
            snapshot.queue_ids.len(),
            snapshot.current_id
        );

        queue.set_queue(snapshot.queue_ids.clone(), snapshot.queue_title.clone());
        queue.set_repeat_mode(snapshot.repeat());
        queue.restore_shuffle_flag(snapshot.shuffle());

        let track = snapshot.current_id.and_then(|id| library.track(id));
        if track.is_none() && snapshot.current_id.is_some() {
            debug!("Snapshot track {:?} no longer exists", snapshot.current_id);
        }
        queue.set_current_id(track.as_ref().map(|track| track.id));
        self.set_metadata(track.as_ref());
        self.emit(PlaybackEvent::QueueChanged {
            length: queue.len(),
        });

        let status = match snapshot.status() {
            PlaybackStatus::Playing => PlaybackStatus::Paused,
            status => status,
        };
        self.publish(PlaybackState {
            status,
            position_ms: snapshot.seek_position,
            extras: PlaybackExtras {
                repeat_mode: Some(snapshot.repeat()),
                shuffle_mode: Some(snapshot.shuffle()),
            },
            ..PlaybackState::default()
        });
    }

    /// Snapshot of the live session for persistence
    pub fn capture(&self, queue: &Queue) -> PersistedQueueSnapshot {
        PersistedQueueSnapshot {
            current_id: queue.current_id(),
            play_state: self.state.status.code(),
            seek_position: self.state.position_ms,
            repeat_mode: queue.repeat_mode().code(),
            shuffle_mode: queue.shuffle_mode().code(),
            queue_title: queue.title().to_string(),
            queue_ids: queue.ids().to_vec(),
        }
    }

    /// Deactivate the session
    pub fn deactivate(&mut self) {
        if self.active {
            self.transport.set_active(false);
            self.active = false;
        }
    }

    fn write_state(&mut self, state: &PlaybackState) {
        self.transport.set_playback_state(state);
        if let Some(mode) = state.extras.repeat_mode {
            self.transport.set_repeat_mode(mode);
        }
        if let Some(mode) = state.extras.shuffle_mode {
            self.transport.set_shuffle_mode(mode);
        }
    }
}
