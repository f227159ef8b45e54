//! Audio engine boundary
//!
//! The rendering engine (decoding, DSP, output) is an external collaborator.
//! [`AudioEngine`] is the capability surface the control core needs from it;
//! [`EngineAdapter`] wraps an implementation and translates its lifecycle
//! callbacks into [`EngineEvent`]s delivered to the serialized control loop.

use crate::eq::{parse_eq_params, EqBand};
use crate::error::Result;
use crate::service::{ControlEvent, EventSender};
use crate::settings::PlayerConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Lifecycle notifications from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// The loaded source finished preparing
    Prepared,

    /// The source could not be loaded, prepared or rendered
    Error {
        /// Underlying cause
        message: String,
    },

    /// Rendering reached the end of the source
    Completed,
}

/// Engine tuning parameters, forwarded unchanged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EngineParameter {
    /// Output sample rate in Hz
    SampleRate(u32),
    /// Master switch for the effect chain
    EffectEnabled(bool),
    /// Stereo widening on/off
    StereoWidthEnabled(bool),
    /// Stereo width amount
    StereoWidth(f32),
    /// "Chafen" delay effect on/off
    ChafenEnabled(bool),
    /// "Chafen" delay amount
    ChafenDelay(i32),
    /// Dynamics compressor on/off
    CompressorEnabled(bool),
    /// Compressor threshold
    Threshold(f32),
    /// Compressor ratio
    Ratio(f64),
    /// Compressor attack time
    Attack(f64),
    /// Compressor release time
    ReleaseTime(f64),
    /// Compressor automatic makeup gain
    AutoGain(bool),
    /// Compressor makeup gain
    Gain(f64),
    /// Compressor knee width
    ThresholdWidth(i32),
}

/// Capability surface of the rendering engine
///
/// `prepare` may complete asynchronously; completion, errors and end of
/// track are reported through the [`EngineEvents`] handed to `attach`.
pub trait AudioEngine: Send {
    /// Receive the callback sink. Called once, before any other method.
    fn attach(&mut self, events: EngineEvents);

    /// Point the engine at a source location
    fn set_source(&mut self, uri: &str) -> Result<()>;

    /// Prepare the current source; reports `Prepared` or `Error`
    fn prepare(&mut self);

    /// Start or resume rendering
    fn play(&mut self);

    /// Suspend rendering, keeping the position
    fn pause(&mut self);

    /// Stop rendering
    fn stop(&mut self);

    /// Drop the current source
    fn reset(&mut self);

    /// Free engine resources
    fn release(&mut self);

    /// Seek within the current source
    fn seek_to(&mut self, position_ms: u64);

    /// Current position in milliseconds
    fn position(&self) -> u64;

    /// Whether the engine is rendering
    fn is_playing(&self) -> bool;

    /// Apply a tuning parameter
    fn set_parameter(&mut self, parameter: EngineParameter);

    /// Replace the equalizer curve
    fn load_eq(&mut self, bands: &[EqBand]);
}

/// Callback sink handed to the engine
///
/// Cloneable and `Send`; every method is safe to call from engine threads.
#[derive(Debug, Clone)]
pub struct EngineEvents {
    tx: EventSender,
}

impl EngineEvents {
    pub(crate) fn new(tx: EventSender) -> Self {
        Self { tx }
    }

    /// The source is prepared
    pub fn prepared(&self) {
        self.emit(EngineEvent::Prepared);
    }

    /// The source failed
    pub fn failed(&self, message: impl Into<String>) {
        self.emit(EngineEvent::Error {
            message: message.into(),
        });
    }

    /// Rendering reached the end of the source
    pub fn completed(&self) {
        self.emit(EngineEvent::Completed);
    }

    fn emit(&self, event: EngineEvent) {
        if self.tx.send(ControlEvent::Engine(event)).is_err() {
            debug!("Engine event dropped, control loop has shut down");
        }
    }
}

/// Wrapper that sequences engine primitives for the state machine
pub struct EngineAdapter {
    engine: Box<dyn AudioEngine>,
}

impl std::fmt::Debug for EngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineAdapter").finish_non_exhaustive()
    }
}

impl EngineAdapter {
    /// Wrap an engine and attach the callback sink
    pub fn new(mut engine: Box<dyn AudioEngine>, events: EngineEvents) -> Self {
        engine.attach(events);
        Self { engine }
    }

    /// Reset, set the source and start preparing
    ///
    /// # Errors
    ///
    /// Returns the engine's `set_source` error; nothing is prepared then.
    pub fn load(&mut self, uri: &str) -> Result<()> {
        debug!("load({})", uri);
        self.engine.reset();
        if let Err(e) = self.engine.set_source(uri) {
            warn!("set_source({}) failed: {}", uri, e);
            return Err(e);
        }
        self.engine.prepare();
        Ok(())
    }

    pub fn play(&mut self) {
        debug!("play()");
        self.engine.play();
    }

    pub fn pause(&mut self) {
        debug!("pause()");
        self.engine.pause();
    }

    pub fn stop(&mut self) {
        debug!("stop()");
        self.engine.stop();
    }

    pub fn release(&mut self) {
        debug!("release()");
        self.engine.release();
    }

    pub fn seek_to(&mut self, position_ms: u64) {
        debug!("seek_to({})", position_ms);
        self.engine.seek_to(position_ms);
    }

    pub fn position(&self) -> u64 {
        self.engine.position()
    }

    /// Forward a tuning parameter
    pub fn set_parameter(&mut self, parameter: EngineParameter) {
        debug!("set_parameter({:?})", parameter);
        self.engine.set_parameter(parameter);
    }

    /// Parse EQ text and load it; an empty parse keeps the current curve
    pub fn set_eq_params(&mut self, text: &str) {
        let bands = parse_eq_params(text);
        if bands.is_empty() {
            debug!("EQ text has no filter records, keeping current curve");
            return;
        }
        debug!("Loading {} EQ bands", bands.len());
        self.engine.load_eq(&bands);
    }

    /// Apply persisted settings on cold start
    pub fn apply_config(&mut self, config: &PlayerConfig) {
        self.set_eq_params(&config.eq_params);
        self.set_parameter(EngineParameter::StereoWidth(config.stereo_width as f32));
        self.set_parameter(EngineParameter::EffectEnabled(config.effect_enabled));
        self.set_parameter(EngineParameter::StereoWidthEnabled(
            config.stereo_width_enabled,
        ));
        self.set_parameter(EngineParameter::SampleRate(config.sample_rate));
        self.set_parameter(EngineParameter::ChafenEnabled(config.chafen_enabled));
        self.set_parameter(EngineParameter::ChafenDelay(config.chafen_delay));
    }
}
