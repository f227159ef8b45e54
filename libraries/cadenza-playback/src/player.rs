//! Playback state machine
//!
//! [`SongPlayer`] owns the queue and the authoritative playback state and
//! sequences the engine, the audio focus arbiter, the session publisher and
//! the sleep timer. It is driven exclusively from the control loop in
//! [`crate::service`], so every method runs to completion before the next
//! event is looked at.
//!
//! # States
//!
//! ```text
//! None -> Stopped -> Paused <-> Playing
//!   ^                                |
//!   +------------- stop() -----------+
//! ```
//!
//! The engine source is tracked separately (`Empty`, `Preparing`, `Ready`).
//! Engine callbacks are only honoured in the source state they belong to:
//! a `Prepared` that arrives after a stop or a track change is dropped.

use crate::command::{Command, MediaId};
use crate::engine::{AudioEngine, EngineAdapter, EngineEvent, EngineEvents, EngineParameter};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::focus::{AudioFocus, FocusAction, FocusChange, ResourceArbiter};
use crate::library::TrackLibrary;
use crate::queue::Queue;
use crate::service::{ControlEvent, EventSender};
use crate::session::{SessionPublisher, SessionTransport};
use crate::settings::{PlayerConfig, SettingsStore};
use crate::sleep::SleepTimer;
use crate::snapshot::{PersistedQueueSnapshot, QueueStore};
use crate::types::{
    PlaybackState, PlaybackStatus, RepeatMode, ShuffleMode, Track, TrackId, TrackMetadata,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// External collaborators of the player, one production adapter each
pub struct Collaborators {
    pub engine: Box<dyn AudioEngine>,
    pub focus: Box<dyn AudioFocus>,
    pub session: Box<dyn SessionTransport>,
    pub library: Box<dyn TrackLibrary>,
    pub store: Box<dyn QueueStore>,
    pub settings: Box<dyn SettingsStore>,
}

/// What the engine currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Empty,
    Preparing(TrackId),
    Ready(TrackId),
}

/// The playback state machine
pub struct SongPlayer {
    queue: Queue,
    engine: EngineAdapter,
    arbiter: ResourceArbiter,
    session: SessionPublisher,
    sleep: SleepTimer,
    library: Box<dyn TrackLibrary>,
    store: Box<dyn QueueStore>,
    settings: Box<dyn SettingsStore>,
    source: Source,

    /// Start rendering once the pending source is prepared
    play_when_ready: bool,
}

impl std::fmt::Debug for SongPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SongPlayer")
            .field("queue", &self.queue)
            .field("session", &self.session)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl SongPlayer {
    /// Create a player and apply persisted settings to the engine
    pub fn new(collaborators: Collaborators, config: &PlayerConfig, tx: EventSender) -> Self {
        let Collaborators {
            engine,
            focus,
            session,
            library,
            store,
            settings,
        } = collaborators;

        let mut engine = EngineAdapter::new(engine, EngineEvents::new(tx.clone()));
        engine.apply_config(config);

        Self {
            queue: Queue::new(),
            engine,
            arbiter: ResourceArbiter::new(focus),
            session: SessionPublisher::new(session),
            sleep: SleepTimer::new(tx),
            library,
            store,
            settings,
            source: Source::Empty,
            play_when_ready: false,
        }
    }

    // ===== Accessors =====

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Last published playback state
    pub fn state(&self) -> &PlaybackState {
        self.session.state()
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.session.metadata()
    }

    pub fn is_playing(&self) -> bool {
        self.session.state().is_playing()
    }

    /// Whether the engine holds a prepared source
    pub fn is_prepared(&self) -> bool {
        matches!(self.source, Source::Ready(_))
    }

    /// Whether a sleep timer is armed
    pub fn sleep_armed(&self) -> bool {
        self.sleep.is_armed()
    }

    /// Current position: the engine's while prepared, else the last published one
    pub fn position(&self) -> u64 {
        match self.source {
            Source::Ready(_) => self.engine.position(),
            _ => self.session.state().position_ms,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.session.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<PlaybackEvent> {
        self.session.event_sender()
    }

    /// Snapshot of the live session
    pub fn snapshot(&self) -> PersistedQueueSnapshot {
        self.session.capture(&self.queue)
    }

    // ===== Event dispatch =====

    /// Handle one control-loop event
    pub fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Command(command) => match self.execute(command) {
                Ok(()) => {}
                Err(PlaybackError::FocusDelayed) => {
                    info!("Playback starts once audio focus is granted");
                }
                Err(e) => warn!("Command failed: {}", e),
            },
            ControlEvent::Engine(EngineEvent::Prepared) => self.on_prepared(),
            ControlEvent::Engine(EngineEvent::Error { message }) => self.on_error(&message),
            ControlEvent::Engine(EngineEvent::Completed) => self.on_completed(),
            ControlEvent::Focus(change) => self.on_focus_change(change),
            ControlEvent::SleepElapsed(generation) => self.on_sleep_elapsed(generation),
            ControlEvent::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
            }
            ControlEvent::Shutdown => self.release(),
        }
    }

    /// Apply a decoded command
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::SetMediaState => self.restore_media_state(),
            Command::RepeatSong => return self.repeat_song(),
            Command::RepeatQueue => return self.repeat_queue(),
            Command::PlayNext { track_id } => self.play_next(track_id),
            Command::QueueReorder { from, to } => self.swap_queue_songs(from, to),
            Command::SongDeleted { track_id } => self.remove_from_queue(track_id),
            Command::RestoreMediaSession => self.session.republish(),
            Command::Parameter(parameter) => self.set_parameter(parameter),
            Command::SetEqParams(text) => self.engine.set_eq_params(&text),
            Command::SetSleep { enabled } => self.set_sleep(enabled),

            Command::Play => return self.play(),
            Command::Pause => {
                // An explicit pause overrides a pending focus resume
                self.arbiter.forget_interruption();
                self.pause();
            }
            Command::PlayFromSearch { query } => return self.play_from_search(query.as_deref()),
            Command::PlayFromMediaId {
                media_id,
                queue,
                queue_title,
                seek_position,
            } => return self.play_from_media_id(&media_id, queue, queue_title, seek_position),
            Command::SeekTo { position_ms } => self.seek_to(position_ms),
            Command::SkipNext => return self.next_song(),
            Command::SkipPrevious => return self.previous_song(),
            Command::Stop => self.stop(),
            Command::SetRepeatMode(mode) => self.set_repeat_mode(mode),
            Command::SetShuffleMode(mode) => self.set_shuffle_mode(mode),
        }
        Ok(())
    }

    // ===== Transport =====

    /// Play the current track
    ///
    /// Resumes directly when the current track is already prepared,
    /// otherwise loads it; rendering then starts on the prepared callback.
    ///
    /// # Errors
    ///
    /// `FocusDenied`/`FocusDelayed` when exclusive output is not granted
    /// (the engine is left untouched), `QueueEmpty` when there is nothing to
    /// play, or a source error.
    pub fn play(&mut self) -> Result<()> {
        debug!("play()");
        self.arbiter.acquire()?;

        let id = self.queue.ensure_current_id().ok_or(PlaybackError::QueueEmpty)?;
        match self.source {
            Source::Ready(ready) if ready == id => {
                self.start_rendering();
                Ok(())
            }
            Source::Preparing(pending) if pending == id => {
                debug!("Track {} is still preparing", id);
                self.play_when_ready = true;
                Ok(())
            }
            _ => self.load(id),
        }
    }

    /// Play a track by id
    pub fn play_song_id(&mut self, id: TrackId) -> Result<()> {
        debug!("play_song_id({})", id);
        let track = self.library.track(id).ok_or(PlaybackError::TrackNotFound(id))?;
        self.play_song(&track)
    }

    /// Play a track, switching to it when it is not current
    pub fn play_song(&mut self, track: &Track) -> Result<()> {
        debug!("play_song({})", track.title);
        if self.queue.current_id() != Some(track.id) {
            self.queue.set_current_id(Some(track.id));
            self.source = Source::Empty;
            self.session.update(PlaybackStatus::Stopped, 0);
        }
        self.session.set_metadata(Some(track));
        self.play()
    }

    /// Pause; no-op unless playing
    pub fn pause(&mut self) {
        debug!("pause()");
        if let Source::Preparing(_) = self.source {
            self.play_when_ready = false;
        }
        if !self.is_playing() {
            return;
        }
        let position = self.position();
        self.engine.pause();
        self.session.update(PlaybackStatus::Paused, position);
        self.persist();
    }

    /// Stop from any state
    ///
    /// Cancels the sleep timer and releases audio focus.
    pub fn stop(&mut self) {
        debug!("stop()");
        self.cancel_sleep();
        self.engine.stop();
        self.source = Source::Empty;
        self.play_when_ready = false;
        self.arbiter.abandon();
        self.session.update(PlaybackStatus::None, 0);
        self.persist();
    }

    /// Seek within the prepared source
    ///
    /// Position 0 is sent as 1; the engine rejects a seek to the literal
    /// start. Ignored until a source is prepared.
    pub fn seek_to(&mut self, position_ms: u64) {
        debug!("seek_to({})", position_ms);
        let position = position_ms.max(1);
        if !self.is_prepared() {
            debug!("seek_to ignored, no source prepared");
            return;
        }
        self.engine.seek_to(position);
        let status = self.session.state().status;
        self.session.update(status, position);
    }

    /// Advance to the next track, pausing at the end of the queue
    pub fn next_song(&mut self) -> Result<()> {
        debug!("next_song()");
        match self.queue.next_song_id() {
            Some(id) => self.play_song_id(id),
            None => {
                self.pause();
                Ok(())
            }
        }
    }

    /// Go back one track; nothing at the start of the queue
    pub fn previous_song(&mut self) -> Result<()> {
        debug!("previous_song()");
        match self.queue.previous_song_id() {
            Some(id) => self.play_song_id(id),
            None => Ok(()),
        }
    }

    /// Replay the current track from the start
    pub fn repeat_song(&mut self) -> Result<()> {
        debug!("repeat_song()");
        self.session.update(PlaybackStatus::Stopped, 0);
        self.source = Source::Empty;
        self.play()
    }

    /// Advance, wrapping from the last track to the first
    ///
    /// Wrapping onto the current track (single-track queue) replays it from
    /// the start.
    pub fn repeat_queue(&mut self) -> Result<()> {
        debug!("repeat_queue()");
        let current = self.queue.current_id();
        if current != self.queue.last_id() {
            return self.next_song();
        }
        match self.queue.first_id() {
            Some(first) if Some(first) == current => self.repeat_song(),
            Some(first) => self.play_song_id(first),
            None => Ok(()),
        }
    }

    /// Search the library and play the best match
    ///
    /// Without a query this is a plain `play`.
    pub fn play_from_search(&mut self, query: Option<&str>) -> Result<()> {
        debug!("play_from_search({:?})", query);
        let Some(query) = query else {
            return self.play();
        };
        match self.library.search(query, 1).first() {
            Some(track) => self.play_song(track),
            None => {
                debug!("No match for {:?}", query);
                Ok(())
            }
        }
    }

    /// Play a browsable item, optionally replacing the queue first
    ///
    /// Playback starts at `seek_position` (0 means the start).
    pub fn play_from_media_id(
        &mut self,
        media_id: &MediaId,
        queue: Option<Vec<TrackId>>,
        queue_title: Option<String>,
        seek_position: u64,
    ) -> Result<()> {
        debug!("play_from_media_id({:?})", media_id);
        if let Some(ids) = queue {
            self.set_queue(ids, queue_title.unwrap_or_default());
        }

        let id = media_id.track_id;
        let track = self.library.track(id).ok_or(PlaybackError::TrackNotFound(id))?;

        if self.source == Source::Ready(id) && self.queue.current_id() == Some(id) {
            self.play_song(&track)?;
            if seek_position > 0 {
                self.seek_to(seek_position);
            }
            return Ok(());
        }

        if self.queue.current_id() != Some(id) {
            self.queue.set_current_id(Some(id));
            self.source = Source::Empty;
        }
        // The prepared callback seeks to the published position
        self.session.update(PlaybackStatus::Stopped, seek_position);
        self.session.set_metadata(Some(&track));
        self.play()
    }

    // ===== Queue =====

    /// Replace the queue sequence and title
    pub fn set_queue(&mut self, ids: Vec<TrackId>, title: impl Into<String>) {
        let title = title.into();
        debug!("set_queue({:?}, {:?})", ids, title);
        self.queue.set_queue(ids, title);
        self.queue_changed();
    }

    /// Move a queued track right after the current one
    pub fn play_next(&mut self, id: TrackId) {
        debug!("play_next({})", id);
        self.queue.move_to_next(id);
        self.queue_changed();
    }

    pub fn swap_queue_songs(&mut self, from: usize, to: usize) {
        debug!("swap_queue_songs({} -> {})", from, to);
        self.queue.swap(from, to);
        self.queue_changed();
    }

    /// Remove a track from the queue
    ///
    /// Removing the current track pauses and drops the loaded source; it
    /// never advances to another track.
    pub fn remove_from_queue(&mut self, id: TrackId) {
        debug!("remove_from_queue({})", id);
        let was_current = self.queue.current_id() == Some(id);
        self.queue.remove(id);
        if was_current {
            self.pause();
            self.source = Source::Empty;
            self.play_when_ready = false;
        }
        self.queue_changed();
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        debug!("set_repeat_mode({:?})", mode);
        self.queue.set_repeat_mode(mode);
        self.session.publish_modes(&self.queue);
    }

    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        debug!("set_shuffle_mode({:?})", mode);
        self.queue.set_shuffle_mode(mode);
        self.session.publish_modes(&self.queue);
        self.queue_changed();
    }

    // ===== Engine settings =====

    pub fn set_parameter(&mut self, parameter: EngineParameter) {
        self.engine.set_parameter(parameter);
    }

    /// Parse and load EQ parameter text
    pub fn set_eq_params(&mut self, text: &str) {
        self.engine.set_eq_params(text);
    }

    // ===== Sleep timer =====

    /// Arm or disarm the sleep timer
    ///
    /// The duration is read from settings at arm time. Arming replaces any
    /// pending timer.
    pub fn set_sleep(&mut self, enabled: bool) {
        debug!("set_sleep({})", enabled);
        if enabled {
            self.sleep.arm(self.settings.sleep_duration());
        } else {
            self.sleep.cancel();
        }
        self.persist_sleep_flag(enabled);
    }

    fn on_sleep_elapsed(&mut self, generation: u64) {
        if !self.sleep.take_elapsed(generation) {
            return;
        }
        info!("Sleep timer elapsed, stopping playback");
        self.stop();
        self.persist_sleep_flag(false);
    }

    fn cancel_sleep(&mut self) {
        if self.sleep.cancel() {
            self.persist_sleep_flag(false);
        }
    }

    fn persist_sleep_flag(&mut self, enabled: bool) {
        if let Err(e) = self.settings.set_sleep_enabled(enabled) {
            warn!("Failed to persist sleep flag: {}", e);
        }
    }

    // ===== Session =====

    /// Restore the persisted session, or republish a live one
    ///
    /// Never touches the engine; repeated calls are harmless.
    pub fn restore_media_state(&mut self) {
        if self.session.state().status != PlaybackStatus::None {
            self.session.republish();
            return;
        }
        match self.store.load() {
            Ok(Some(snapshot)) => {
                self.session
                    .restore(&snapshot, &mut self.queue, self.library.as_ref());
            }
            Ok(None) => debug!("No persisted session to restore"),
            Err(e) => warn!("Failed to load persisted session: {}", e),
        }
    }

    /// Tear everything down
    ///
    /// Persists the session, cancels the sleep timer, releases focus,
    /// deactivates the session, releases the engine and clears the queue.
    pub fn release(&mut self) {
        info!("Releasing player");
        self.persist();
        self.cancel_sleep();
        self.arbiter.abandon();
        self.session.deactivate();
        self.engine.release();
        self.queue.reset();
        self.source = Source::Empty;
        self.play_when_ready = false;
    }

    fn persist(&mut self) {
        let snapshot = self.session.capture(&self.queue);
        if let Err(e) = self.store.save(&snapshot) {
            warn!("Failed to persist session: {}", e);
        }
    }

    fn queue_changed(&self) {
        self.session.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    // ===== Engine callbacks =====

    fn load(&mut self, id: TrackId) -> Result<()> {
        if self.session.metadata().and_then(TrackMetadata::track_id) != Some(id) {
            let track = self.library.track(id);
            self.session.set_metadata(track.as_ref());
        }

        let Some(uri) = self.library.source_uri(id) else {
            let message = format!("No source for track {id}");
            self.fail_source(&message);
            return Err(PlaybackError::TrackNotFound(id));
        };

        match self.engine.load(&uri) {
            Ok(()) => {
                self.source = Source::Preparing(id);
                self.play_when_ready = true;
                Ok(())
            }
            Err(e) => {
                self.fail_source(&e.to_string());
                Err(e)
            }
        }
    }

    fn start_rendering(&mut self) {
        let position = self.engine.position();
        self.session.update(PlaybackStatus::Playing, position);
        self.engine.play();
    }

    fn on_prepared(&mut self) {
        let Source::Preparing(id) = self.source else {
            debug!("Ignoring stale prepared callback");
            return;
        };
        debug!("Track {} prepared", id);
        self.source = Source::Ready(id);

        // Position published before the load (restore, play-from-media-id)
        let resume_at = self.session.state().position_ms;
        if self.play_when_ready {
            self.play_when_ready = false;
            self.start_rendering();
            if resume_at > 0 {
                self.seek_to(resume_at);
            }
        } else {
            if resume_at > 0 {
                self.engine.seek_to(resume_at);
            }
            self.session.update(PlaybackStatus::Paused, resume_at);
        }
    }

    fn on_error(&mut self, message: &str) {
        if self.source == Source::Empty {
            debug!("Ignoring engine error with no source: {}", message);
            return;
        }
        self.fail_source(message);
    }

    fn fail_source(&mut self, message: &str) {
        error!("Source error: {}", message);
        self.source = Source::Empty;
        self.play_when_ready = false;

        let mut state = self
            .session
            .state()
            .with_status(PlaybackStatus::Stopped, self.position());
        state.error = Some(message.to_string());
        self.session.publish(state);
        self.session.emit(PlaybackEvent::Error {
            message: message.to_string(),
        });
    }

    fn on_completed(&mut self) {
        if !self.is_prepared() {
            debug!("Ignoring stale completion callback");
            return;
        }
        debug!("Track completed, repeat mode {:?}", self.queue.repeat_mode());

        let result = match self.queue.repeat_mode() {
            RepeatMode::One => self.repeat_song(),
            RepeatMode::All => self.repeat_queue(),
            RepeatMode::None => self.next_song(),
        };
        if let Err(e) = result {
            warn!("Failed to continue after completion: {}", e);
        }
    }

    fn on_focus_change(&mut self, change: FocusChange) {
        match self.arbiter.on_change(change, self.is_playing()) {
            FocusAction::Pause => self.pause(),
            FocusAction::Resume => {
                if let Err(e) = self.play() {
                    warn!("Failed to resume after focus gain: {}", e);
                }
            }
            FocusAction::Nothing => {}
        }
    }
}
