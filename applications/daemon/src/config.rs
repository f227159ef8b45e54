/// Daemon configuration
use crate::error::{DaemonError, Result};
use cadenza_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "cadenza.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DaemonConfig {
    /// Player settings applied on cold start
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub paths: PathSettings,

    /// File the configuration was read from; the sleep flag is written back here
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathSettings {
    /// Track catalogue (JSON array of tracks with a `path`)
    #[serde(default = "default_library")]
    pub library: PathBuf,

    /// Persisted queue snapshot
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            library: default_library(),
            snapshot: default_snapshot(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    /// Environment variables prefixed with `CADENZA_` override file values,
    /// with `__` between nested keys (`CADENZA_PLAYER__SAMPLE_RATE=48000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(path) if !path.exists() => {
                return Err(DaemonError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let mut settings = config::Config::builder();
        if let Some(file) = &source {
            settings = settings.add_source(config::File::from(file.as_path()));
        }
        settings = settings.add_source(
            config::Environment::with_prefix("CADENZA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: DaemonConfig = settings.build()?.try_deserialize()?;
        config.source = source;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.player.sample_rate == 0 {
            return Err(DaemonError::Config(
                "player.sample_rate must be greater than zero".to_string(),
            ));
        }
        if self.player.sleep_minutes == 0 {
            return Err(DaemonError::Config(
                "player.sleep_minutes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// Default values
fn default_library() -> PathBuf {
    PathBuf::from("./library.json")
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("./data/queue.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cadenza.toml");
        fs::write(
            &file,
            r#"
[player]
sample_rate = 48000
eq_params = "filter 1 1000 0.7 3"

[paths]
library = "/srv/music/catalog.json"
"#,
        )
        .unwrap();

        let config = DaemonConfig::load(Some(&file)).unwrap();

        assert_eq!(config.player.sample_rate, 48000);
        assert_eq!(config.player.eq_params, "filter 1 1000 0.7 3");
        assert_eq!(config.player.chafen_delay, 20);
        assert_eq!(config.paths.library, PathBuf::from("/srv/music/catalog.json"));
        assert_eq!(config.paths.snapshot, default_snapshot());
        assert_eq!(config.source.as_deref(), Some(file.as_path()));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DaemonConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_sleep() {
        let mut config = DaemonConfig::default();
        assert!(config.validate().is_ok());

        config.player.sleep_minutes = 0;
        assert!(config.validate().is_err());
    }
}
