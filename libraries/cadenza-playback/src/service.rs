//! Serialized control loop
//!
//! Every input to the player (external commands, engine callbacks, focus
//! notifications, sleep timer firings) is funneled through one unbounded
//! channel into [`PlaybackService::run`], which owns the [`SongPlayer`] and
//! handles events strictly one at a time. Nothing else ever touches the
//! queue or the playback state.

use crate::command::{Command, Payload};
use crate::engine::EngineEvent;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::focus::FocusChange;
use crate::player::{Collaborators, SongPlayer};
use crate::settings::PlayerConfig;
use crate::snapshot::PersistedQueueSnapshot;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

/// Inputs to the control loop
#[derive(Debug)]
pub enum ControlEvent {
    /// Decoded external command
    Command(Command),

    /// Engine lifecycle callback
    Engine(EngineEvent),

    /// OS audio focus notification
    Focus(FocusChange),

    /// Sleep timer fired; carries the arm generation
    SleepElapsed(u64),

    /// Reply with a snapshot of the live session
    Snapshot(oneshot::Sender<PersistedQueueSnapshot>),

    /// Release the player and leave the loop
    Shutdown,
}

/// Cloneable producer side of the control channel
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ControlEvent>,
}

impl EventSender {
    /// Queue an event for the control loop
    pub fn send(&self, event: ControlEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| PlaybackError::ChannelClosed)
    }
}

/// Create the control channel
pub fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<ControlEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

/// Owner of the player; drives it from the control channel
#[derive(Debug)]
pub struct PlaybackService {
    player: SongPlayer,
    rx: mpsc::UnboundedReceiver<ControlEvent>,
}

impl PlaybackService {
    /// Build the player and its control channel
    ///
    /// Persisted DSP settings from `config` are applied to the engine here.
    pub fn new(collaborators: Collaborators, config: &PlayerConfig) -> (Self, PlaybackHandle) {
        let (tx, rx) = event_channel();
        let player = SongPlayer::new(collaborators, config, tx.clone());
        let handle = PlaybackHandle {
            tx,
            events: player.event_sender(),
        };
        (Self { player, rx }, handle)
    }

    /// Process events until `Shutdown`, then release the player
    pub async fn run(mut self) {
        info!("Playback service started");
        while let Some(event) = self.rx.recv().await {
            if matches!(event, ControlEvent::Shutdown) {
                debug!("Shutdown requested");
                break;
            }
            self.player.handle(event);
        }
        self.player.release();
        info!("Playback service stopped");
    }
}

/// Client side of a running [`PlaybackService`]
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    tx: EventSender,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackHandle {
    /// Send a decoded command
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx.send(ControlEvent::Command(command))
    }

    /// Decode and send a named command
    ///
    /// Unknown actions are ignored. A malformed payload is logged and the
    /// command dropped; the decode error is returned to the caller.
    pub fn dispatch(&self, action: &str, payload: &Payload) -> Result<()> {
        match Command::decode(action, payload) {
            Ok(Some(command)) => self.send(command),
            Ok(None) => {
                debug!("Ignoring unknown command: {}", action);
                Ok(())
            }
            Err(e) => {
                warn!("Ignoring malformed command: {}", e);
                Err(e.into())
            }
        }
    }

    /// Forward an OS audio focus notification
    pub fn focus_changed(&self, change: FocusChange) -> Result<()> {
        self.tx.send(ControlEvent::Focus(change))
    }

    /// Snapshot of the live session
    pub async fn snapshot(&self) -> Result<PersistedQueueSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(ControlEvent::Snapshot(reply))?;
        rx.await.map_err(|_| PlaybackError::ChannelClosed)
    }

    /// Ask the service to release the player and stop
    pub fn shutdown(&self) -> Result<()> {
        self.tx.send(ControlEvent::Shutdown)
    }

    /// Subscribe to observer events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}
