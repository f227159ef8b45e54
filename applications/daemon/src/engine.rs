//! Headless rendering engine
//!
//! [`NullSinkEngine`] renders into nothing: it checks that a source file
//! exists, keeps a position on the tokio clock and reports completion when
//! the catalogued track length has elapsed. Tuning parameters are recorded
//! and logged so a real output backend can be swapped in behind the same
//! trait.

use cadenza_playback::timer::OneShotTimer;
use cadenza_playback::{AudioEngine, EngineEvents, EngineParameter, EqBand, PlaybackError};
use std::collections::HashMap;
use std::path::Path;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// Length used for sources missing from the length table
const FALLBACK_LENGTH_MS: u64 = 180_000;

#[derive(Debug, Default)]
pub struct NullSinkEngine {
    events: Option<EngineEvents>,

    /// Track length per source location
    lengths: HashMap<String, u64>,

    source: Option<String>,
    prepared: bool,

    /// Position accumulated before the current render run
    offset_ms: u64,

    /// When the current render run started
    started: Option<Instant>,

    completion: OneShotTimer,
    parameters: Vec<EngineParameter>,
    eq: Vec<EqBand>,
}

impl NullSinkEngine {
    /// Create an engine that knows each source's length in milliseconds
    pub fn new(lengths: HashMap<String, u64>) -> Self {
        Self {
            lengths,
            ..Self::default()
        }
    }

    /// Parameters applied so far, oldest first
    pub fn parameters(&self) -> &[EngineParameter] {
        &self.parameters
    }

    /// Currently loaded EQ curve
    pub fn eq(&self) -> &[EqBand] {
        &self.eq
    }

    fn length_ms(&self) -> u64 {
        self.source
            .as_ref()
            .and_then(|uri| self.lengths.get(uri).copied())
            .unwrap_or(FALLBACK_LENGTH_MS)
    }

    /// Freeze the running clock into `offset_ms`
    fn halt(&mut self) {
        self.offset_ms = self.position();
        self.started = None;
        self.completion.cancel();
    }
}

impl AudioEngine for NullSinkEngine {
    fn attach(&mut self, events: EngineEvents) {
        self.events = Some(events);
    }

    fn set_source(&mut self, uri: &str) -> cadenza_playback::Result<()> {
        if !Path::new(uri).is_file() {
            return Err(PlaybackError::source(format!("no such file: {uri}")));
        }
        self.source = Some(uri.to_string());
        self.prepared = false;
        Ok(())
    }

    fn prepare(&mut self) {
        let Some(events) = &self.events else {
            return;
        };
        match &self.source {
            Some(uri) => {
                debug!("Prepared {}", uri);
                self.prepared = true;
                events.prepared();
            }
            None => events.failed("prepare called without a source"),
        }
    }

    fn play(&mut self) {
        if !self.prepared || self.started.is_some() {
            return;
        }
        self.started = Some(Instant::now());

        let remaining = self.length_ms().saturating_sub(self.offset_ms);
        if let Some(events) = self.events.clone() {
            self.completion
                .schedule(Duration::from_millis(remaining), move || events.completed());
        }
    }

    fn pause(&mut self) {
        self.halt();
    }

    fn stop(&mut self) {
        self.halt();
    }

    fn reset(&mut self) {
        self.completion.cancel();
        self.source = None;
        self.prepared = false;
        self.offset_ms = 0;
        self.started = None;
    }

    fn release(&mut self) {
        self.reset();
        info!("Null sink released");
    }

    fn seek_to(&mut self, position_ms: u64) {
        let playing = self.started.is_some();
        self.halt();
        self.offset_ms = position_ms.min(self.length_ms());
        if playing {
            self.play();
        }
    }

    fn position(&self) -> u64 {
        let running = self
            .started
            .map_or(0, |started| started.elapsed().as_millis() as u64);
        (self.offset_ms + running).min(self.length_ms())
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    fn set_parameter(&mut self, parameter: EngineParameter) {
        debug!("Engine parameter {:?}", parameter);
        self.parameters.push(parameter);
    }

    fn load_eq(&mut self, bands: &[EqBand]) {
        debug!("Loaded {} EQ bands", bands.len());
        self.eq = bands.to_vec();
    }
}
