//! Queue snapshot file
//!
//! The snapshot is written to a temporary sibling and renamed over the
//! target, so a crash mid-write leaves the previous snapshot intact.

use cadenza_playback::{PersistedQueueSnapshot, PlaybackError, QueueStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonQueueStore {
    path: PathBuf,
}

impl JsonQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStore for JsonQueueStore {
    fn load(&self) -> cadenza_playback::Result<Option<PersistedQueueSnapshot>> {
        if !self.path.exists() {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&text).map_err(|e| {
            PlaybackError::store(format!("corrupt snapshot {}: {}", self.path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &PersistedQueueSnapshot) -> cadenza_playback::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| PlaybackError::store(e.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;

        debug!(
            "Saved snapshot ({} tracks) to {}",
            snapshot.queue_ids.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_creates_directories_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonQueueStore::new(dir.path().join("state/queue.json"));
        let snapshot = PersistedQueueSnapshot {
            current_id: Some(4),
            play_state: 2,
            seek_position: 3210,
            queue_title: "Evening".to_string(),
            queue_ids: vec![4, 5, 6],
            ..PersistedQueueSnapshot::default()
        };

        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), Some(snapshot));
        assert!(!dir.path().join("state/queue.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonQueueStore::new(path);
        assert!(matches!(store.load(), Err(PlaybackError::Store(_))));
    }
}
