//! Shared fakes for the playback scenario tests
//!
//! Every collaborator records what it was asked to do into state shared with
//! the test through `Arc<Mutex<..>>`.

#![allow(dead_code)]

use cadenza_playback::service::event_channel;
use cadenza_playback::{
    AudioEngine, AudioFocus, Collaborators, Command, ControlEvent, EngineEvents, EngineParameter,
    EqBand, FocusRequest, PersistedQueueSnapshot, PlaybackError, PlaybackEvent, PlaybackState,
    PlaybackStatus, PlayerConfig, QueueStore, RepeatMode, SessionTransport, SettingsStore,
    ShuffleMode, SongPlayer, Track, TrackId, TrackLibrary, TrackMetadata,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

// ===== Engine =====

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetSource(String),
    Prepare,
    Play,
    Pause,
    Stop,
    Reset,
    Release,
    SeekTo(u64),
}

#[derive(Default)]
pub struct EngineLog {
    pub calls: Vec<EngineCall>,
    pub position: u64,
    pub playing: bool,
    pub events: Option<EngineEvents>,
    /// Prepare completes immediately
    pub auto_prepare: bool,
    /// Sources `set_source` rejects
    pub broken: HashSet<String>,
    pub parameters: Vec<EngineParameter>,
    pub eq_loads: Vec<Vec<EqBand>>,
}

pub struct FakeEngine(pub Arc<Mutex<EngineLog>>);

impl AudioEngine for FakeEngine {
    fn attach(&mut self, events: EngineEvents) {
        self.0.lock().unwrap().events = Some(events);
    }

    fn set_source(&mut self, uri: &str) -> cadenza_playback::Result<()> {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::SetSource(uri.to_string()));
        if log.broken.contains(uri) {
            return Err(PlaybackError::source(format!("cannot open {uri}")));
        }
        Ok(())
    }

    fn prepare(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::Prepare);
        if log.auto_prepare {
            if let Some(events) = &log.events {
                events.prepared();
            }
        }
    }

    fn play(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::Play);
        log.playing = true;
    }

    fn pause(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::Pause);
        log.playing = false;
    }

    fn stop(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::Stop);
        log.playing = false;
    }

    fn reset(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::Reset);
        log.playing = false;
        log.position = 0;
    }

    fn release(&mut self) {
        self.0.lock().unwrap().calls.push(EngineCall::Release);
    }

    fn seek_to(&mut self, position_ms: u64) {
        let mut log = self.0.lock().unwrap();
        log.calls.push(EngineCall::SeekTo(position_ms));
        log.position = position_ms;
    }

    fn position(&self) -> u64 {
        self.0.lock().unwrap().position
    }

    fn is_playing(&self) -> bool {
        self.0.lock().unwrap().playing
    }

    fn set_parameter(&mut self, parameter: EngineParameter) {
        self.0.lock().unwrap().parameters.push(parameter);
    }

    fn load_eq(&mut self, bands: &[EqBand]) {
        self.0.lock().unwrap().eq_loads.push(bands.to_vec());
    }
}

// ===== Audio focus =====

#[derive(Default)]
pub struct FocusLog {
    /// Scripted answers; `Granted` once exhausted
    pub answers: VecDeque<FocusRequest>,
    pub requests: usize,
    pub abandons: usize,
}

pub struct FakeFocus(pub Arc<Mutex<FocusLog>>);

impl AudioFocus for FakeFocus {
    fn request(&mut self) -> FocusRequest {
        let mut log = self.0.lock().unwrap();
        log.requests += 1;
        log.answers.pop_front().unwrap_or(FocusRequest::Granted)
    }

    fn abandon(&mut self) {
        self.0.lock().unwrap().abandons += 1;
    }
}

// ===== Session =====

#[derive(Default)]
pub struct SessionLog {
    pub states: Vec<PlaybackState>,
    pub repeat: Option<RepeatMode>,
    pub shuffle: Option<ShuffleMode>,
    pub metadata: Option<TrackMetadata>,
    pub active: bool,
}

impl SessionLog {
    pub fn last(&self) -> Option<&PlaybackState> {
        self.states.last()
    }
}

pub struct RecordingSession(pub Arc<Mutex<SessionLog>>);

impl SessionTransport for RecordingSession {
    fn set_playback_state(&mut self, state: &PlaybackState) {
        self.0.lock().unwrap().states.push(state.clone());
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.0.lock().unwrap().repeat = Some(mode);
    }

    fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        self.0.lock().unwrap().shuffle = Some(mode);
    }

    fn set_metadata(&mut self, metadata: Option<&TrackMetadata>) {
        self.0.lock().unwrap().metadata = metadata.cloned();
    }

    fn set_active(&mut self, active: bool) {
        self.0.lock().unwrap().active = active;
    }
}

// ===== Library =====

pub fn create_test_track(id: TrackId) -> Track {
    Track {
        id,
        title: format!("Track {id}"),
        artist: "Test Artist".to_string(),
        album: "Test Album".to_string(),
        album_id: 100 + id,
        duration_ms: 180_000,
    }
}

pub fn uri_of(id: TrackId) -> String {
    format!("/music/{id}.flac")
}

pub struct FakeLibrary {
    tracks: HashMap<TrackId, Track>,
}

impl FakeLibrary {
    pub fn with_ids(ids: impl IntoIterator<Item = TrackId>) -> Self {
        Self {
            tracks: ids.into_iter().map(|id| (id, create_test_track(id))).collect(),
        }
    }
}

impl TrackLibrary for FakeLibrary {
    fn track(&self, id: TrackId) -> Option<Track> {
        self.tracks.get(&id).cloned()
    }

    fn search(&self, query: &str, limit: usize) -> Vec<Track> {
        let mut matches: Vec<Track> = self
            .tracks
            .values()
            .filter(|track| track.title.contains(query))
            .cloned()
            .collect();
        matches.sort_by_key(|track| track.id);
        matches.truncate(limit);
        matches
    }

    fn source_uri(&self, id: TrackId) -> Option<String> {
        self.tracks.contains_key(&id).then(|| uri_of(id))
    }
}

// ===== Persistence =====

#[derive(Default)]
pub struct StoreLog {
    pub snapshot: Option<PersistedQueueSnapshot>,
    pub saves: usize,
    pub loads: usize,
}

pub struct MemoryStore(pub Arc<Mutex<StoreLog>>);

impl QueueStore for MemoryStore {
    fn load(&self) -> cadenza_playback::Result<Option<PersistedQueueSnapshot>> {
        let mut log = self.0.lock().unwrap();
        log.loads += 1;
        Ok(log.snapshot.clone())
    }

    fn save(&mut self, snapshot: &PersistedQueueSnapshot) -> cadenza_playback::Result<()> {
        let mut log = self.0.lock().unwrap();
        log.saves += 1;
        log.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

pub struct SharedSettings(pub Arc<Mutex<PlayerConfig>>);

impl SettingsStore for SharedSettings {
    fn sleep_duration(&self) -> Duration {
        self.0.lock().unwrap().sleep_duration()
    }

    fn set_sleep_enabled(&mut self, enabled: bool) -> cadenza_playback::Result<()> {
        self.0.lock().unwrap().sleep_enabled = enabled;
        Ok(())
    }
}

// ===== Harness =====

/// Shared handles onto every fake
#[derive(Clone, Default)]
pub struct Fakes {
    pub engine: Arc<Mutex<EngineLog>>,
    pub focus: Arc<Mutex<FocusLog>>,
    pub session: Arc<Mutex<SessionLog>>,
    pub store: Arc<Mutex<StoreLog>>,
    pub settings: Arc<Mutex<PlayerConfig>>,
}

impl Fakes {
    pub fn new(config: &PlayerConfig) -> Self {
        let fakes = Self::default();
        fakes.engine.lock().unwrap().auto_prepare = true;
        *fakes.settings.lock().unwrap() = config.clone();
        fakes
    }

    /// Boxed collaborators over tracks 1..=10
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            engine: Box::new(FakeEngine(Arc::clone(&self.engine))),
            focus: Box::new(FakeFocus(Arc::clone(&self.focus))),
            session: Box::new(RecordingSession(Arc::clone(&self.session))),
            library: Box::new(FakeLibrary::with_ids(1..=10)),
            store: Box::new(MemoryStore(Arc::clone(&self.store))),
            settings: Box::new(SharedSettings(Arc::clone(&self.settings))),
        }
    }

    pub fn engine_calls(&self) -> Vec<EngineCall> {
        self.engine.lock().unwrap().calls.clone()
    }

    pub fn clear_engine_calls(&self) {
        self.engine.lock().unwrap().calls.clear();
    }

    pub fn last_state(&self) -> PlaybackState {
        self.session.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn published(&self) -> Vec<PlaybackStatus> {
        self.session
            .lock()
            .unwrap()
            .states
            .iter()
            .map(|state| state.status)
            .collect()
    }

    /// Move the fake engine's clock
    pub fn set_position(&self, position_ms: u64) {
        self.engine.lock().unwrap().position = position_ms;
    }

    pub fn engine_events(&self) -> EngineEvents {
        self.engine
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("engine attached")
    }
}

/// A player driven synchronously: events are pumped by hand
pub struct Harness {
    pub player: SongPlayer,
    pub rx: mpsc::UnboundedReceiver<ControlEvent>,
    pub fakes: Fakes,
    pub events: broadcast::Receiver<PlaybackEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&PlayerConfig::default())
    }

    pub fn with_config(config: &PlayerConfig) -> Self {
        let fakes = Fakes::new(config);
        let (tx, rx) = event_channel();
        let player = SongPlayer::new(fakes.collaborators(), config, tx);
        let events = player.subscribe();
        Self {
            player,
            rx,
            fakes,
            events,
        }
    }

    /// Handle every queued event, including ones queued while handling
    pub fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.player.handle(event);
        }
    }

    /// Apply a command through the control-loop entry point
    pub fn exec(&mut self, command: Command) {
        self.player.handle(ControlEvent::Command(command));
        self.pump();
    }

    /// Queue `ids` and start playing `start`
    pub fn play_queue(&mut self, ids: &[TrackId], start: TrackId) {
        self.player.set_queue(ids.to_vec(), "Test Queue");
        self.player.play_song_id(start).expect("play");
        self.pump();
    }

    pub fn complete_track(&mut self) {
        self.fakes.engine_events().completed();
        self.pump();
    }

    /// Observer events received so far
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
