//! Song storage boundary

use crate::types::{Track, TrackId};

/// Read-only access to the song store
pub trait TrackLibrary: Send {
    /// Look up a track by id
    fn track(&self, id: TrackId) -> Option<Track>;

    /// Tracks matching a free-text query, best match first
    fn search(&self, query: &str, limit: usize) -> Vec<Track>;

    /// Location the engine should load for `id`
    fn source_uri(&self, id: TrackId) -> Option<String>;
}
