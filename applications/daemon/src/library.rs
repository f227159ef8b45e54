//! Track catalogue
//!
//! A JSON array of tracks, each with the file the engine should load:
//!
//! ```json
//! [
//!   {"id": 1, "title": "Intro", "artist": "A", "album": "B",
//!    "album_id": 7, "duration_ms": 61000, "path": "/music/intro.flac"}
//! ]
//! ```

use crate::error::{DaemonError, Result};
use cadenza_playback::{Track, TrackId, TrackLibrary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub track: Track,

    /// Audio file for this track
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogLibrary {
    /// Entries in catalogue order
    entries: Vec<CatalogEntry>,
    index: HashMap<TrackId, usize>,
}

impl CatalogLibrary {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.track.id, position).is_some() {
                return Err(DaemonError::Catalog(format!(
                    "duplicate track id {}",
                    entry.track.id
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Read a catalogue file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DaemonError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&text)?;
        info!("Loaded {} tracks from {}", entries.len(), path.display());
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track length in milliseconds per source location
    pub fn lengths(&self) -> HashMap<String, u64> {
        self.entries
            .iter()
            .map(|entry| (uri_of(&entry.path), entry.track.duration_ms))
            .collect()
    }

    fn entry(&self, id: TrackId) -> Option<&CatalogEntry> {
        self.index.get(&id).map(|&position| &self.entries[position])
    }
}

fn uri_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl TrackLibrary for CatalogLibrary {
    fn track(&self, id: TrackId) -> Option<Track> {
        self.entry(id).map(|entry| entry.track.clone())
    }

    /// Case-insensitive substring match on title, then artist, then album
    fn search(&self, query: &str, limit: usize) -> Vec<Track> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let rank = |track: &Track| {
            [&track.title, &track.artist, &track.album]
                .iter()
                .position(|field| field.to_lowercase().contains(&needle))
        };

        let mut ranked: Vec<(usize, &Track)> = self
            .entries
            .iter()
            .filter_map(|entry| rank(&entry.track).map(|r| (r, &entry.track)))
            .collect();
        // Stable: catalogue order within a rank
        ranked.sort_by_key(|(r, _)| *r);

        ranked
            .into_iter()
            .take(limit)
            .map(|(_, track)| track.clone())
            .collect()
    }

    fn source_uri(&self, id: TrackId) -> Option<String> {
        self.entry(id).map(|entry| uri_of(&entry.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: TrackId, title: &str, artist: &str) -> CatalogEntry {
        CatalogEntry {
            track: Track {
                id,
                title: title.to_string(),
                artist: artist.to_string(),
                album: "Nocturnes".to_string(),
                album_id: 9,
                duration_ms: 240_000,
            },
            path: PathBuf::from(format!("/music/{id}.flac")),
        }
    }

    fn catalog() -> CatalogLibrary {
        CatalogLibrary::new(vec![
            entry(1, "Rain Song", "Blue Static"),
            entry(2, "Night Drive", "The Rain Makers"),
            entry(3, "Morning", "Solo"),
        ])
        .unwrap()
    }

    #[test]
    fn lookups_by_id() {
        let library = catalog();
        assert_eq!(library.track(2).unwrap().title, "Night Drive");
        assert_eq!(library.source_uri(3).as_deref(), Some("/music/3.flac"));
        assert!(library.track(42).is_none());
        assert!(library.source_uri(42).is_none());
    }

    #[test]
    fn search_prefers_title_matches() {
        let library = catalog();

        let ids: Vec<TrackId> = library.search("rain", 10).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let first = library.search("RAIN", 1);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, 1);
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert!(catalog().search("   ", 5).is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = CatalogLibrary::new(vec![entry(1, "A", "B"), entry(1, "C", "D")]);
        assert!(matches!(result, Err(DaemonError::Catalog(_))));
    }

    #[test]
    fn catalogue_file_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("library.json");
        std::fs::write(
            &file,
            r#"[{"id": 5, "title": "T", "artist": "A", "album": "B",
                 "album_id": 1, "duration_ms": 1000, "path": "/x/5.ogg"}]"#,
        )
        .unwrap();

        let library = CatalogLibrary::load(&file).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.lengths().get("/x/5.ogg"), Some(&1000));
    }
}
