//! Settings backed by the daemon's TOML config file
//!
//! Only `player.sleep_enabled` is ever written. The file is edited as a
//! TOML table so every other key and section is kept as the user wrote it.

use cadenza_playback::{PlaybackError, PlayerConfig, SettingsStore};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TomlSettings {
    config: PlayerConfig,

    /// Config file to write back to; in-memory only when unset
    file: Option<PathBuf>,
}

impl TomlSettings {
    pub fn new(config: PlayerConfig, file: Option<PathBuf>) -> Self {
        Self { config, file }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    fn write_sleep_flag(&self, enabled: bool) -> cadenza_playback::Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let text = if file.exists() {
            fs::read_to_string(file)?
        } else {
            String::new()
        };
        let mut document: toml::Table = text
            .parse()
            .map_err(|e| PlaybackError::store(format!("{}: {}", file.display(), e)))?;

        let player = document
            .entry("player")
            .or_insert(toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(player) = player else {
            return Err(PlaybackError::store(format!(
                "{}: [player] is not a table",
                file.display()
            )));
        };
        player.insert("sleep_enabled".to_string(), toml::Value::Boolean(enabled));

        let text =
            toml::to_string_pretty(&document).map_err(|e| PlaybackError::store(e.to_string()))?;
        fs::write(file, text)?;
        debug!("Wrote sleep_enabled = {} to {}", enabled, file.display());
        Ok(())
    }
}

impl SettingsStore for TomlSettings {
    fn sleep_duration(&self) -> Duration {
        self.config.sleep_duration()
    }

    fn set_sleep_enabled(&mut self, enabled: bool) -> cadenza_playback::Result<()> {
        self.config.sleep_enabled = enabled;
        self.write_sleep_flag(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_flag_is_written_back_preserving_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cadenza.toml");
        fs::write(
            &file,
            "[player]\nsample_rate = 48000\n\n[paths]\nlibrary = \"lib.json\"\n",
        )
        .unwrap();

        let mut settings = TomlSettings::new(PlayerConfig::default(), Some(file.clone()));
        settings.set_sleep_enabled(true).unwrap();

        let document: toml::Table = fs::read_to_string(&file).unwrap().parse().unwrap();
        assert_eq!(document["player"]["sleep_enabled"].as_bool(), Some(true));
        assert_eq!(document["player"]["sample_rate"].as_integer(), Some(48000));
        assert_eq!(document["paths"]["library"].as_str(), Some("lib.json"));
        assert!(settings.config().sleep_enabled);
    }

    #[test]
    fn missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fresh.toml");

        let mut settings = TomlSettings::new(PlayerConfig::default(), Some(file.clone()));
        settings.set_sleep_enabled(false).unwrap();

        let document: toml::Table = fs::read_to_string(&file).unwrap().parse().unwrap();
        assert_eq!(document["player"]["sleep_enabled"].as_bool(), Some(false));
    }

    #[test]
    fn in_memory_settings_report_duration() {
        let config = PlayerConfig {
            sleep_minutes: 15,
            ..PlayerConfig::default()
        };
        let mut settings = TomlSettings::new(config, None);
        assert_eq!(settings.sleep_duration(), Duration::from_secs(15 * 60));
        assert!(settings.set_sleep_enabled(true).is_ok());
    }
}
