//! Persisted player settings
//!
//! [`PlayerConfig`] is read once at startup and handed to the core by value.
//! The only setting the core writes back is the sleep-armed flag, through
//! [`SettingsStore`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player configuration applied on cold start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Equalizer parameter text (see [`crate::eq`])
    pub eq_params: String,

    /// Stereo width amount
    pub stereo_width: i32,

    /// Effect chain master switch
    pub effect_enabled: bool,

    /// Stereo widening switch
    pub stereo_width_enabled: bool,

    /// "Chafen" delay switch
    pub chafen_enabled: bool,

    /// "Chafen" delay amount
    pub chafen_delay: i32,

    /// Whether the sleep timer is armed
    pub sleep_enabled: bool,

    /// Sleep timer duration in minutes
    pub sleep_minutes: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            eq_params: String::new(),
            stereo_width: 10,
            effect_enabled: false,
            stereo_width_enabled: false,
            chafen_enabled: false,
            chafen_delay: 20,
            sleep_enabled: false,
            sleep_minutes: 30,
        }
    }
}

impl PlayerConfig {
    /// Sleep timer duration
    pub fn sleep_duration(&self) -> Duration {
        Duration::from_secs(self.sleep_minutes.saturating_mul(60))
    }
}

/// Settings access needed at runtime
pub trait SettingsStore: Send {
    /// Sleep duration, read each time the timer is armed
    fn sleep_duration(&self) -> Duration;

    /// Persist whether the sleep timer is armed
    fn set_sleep_enabled(&mut self, enabled: bool) -> Result<()>;
}

/// In-memory settings backed by a [`PlayerConfig`]
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    pub config: PlayerConfig,
}

impl MemorySettings {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }
}

impl SettingsStore for MemorySettings {
    fn sleep_duration(&self) -> Duration {
        self.config.sleep_duration()
    }

    fn set_sleep_enabled(&mut self, enabled: bool) -> Result<()> {
        self.config.sleep_enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cold_start_values() {
        let config = PlayerConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.stereo_width, 10);
        assert_eq!(config.chafen_delay, 20);
        assert_eq!(config.sleep_duration(), Duration::from_secs(30 * 60));
        assert!(!config.sleep_enabled);
    }

    #[test]
    fn huge_sleep_minutes_saturate() {
        let config = PlayerConfig {
            sleep_minutes: u64::MAX,
            ..PlayerConfig::default()
        };
        assert_eq!(config.sleep_duration(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"sample_rate": 48000, "sleep_minutes": 5}"#).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.sleep_minutes, 5);
        assert_eq!(config.chafen_delay, 20);
    }
}
