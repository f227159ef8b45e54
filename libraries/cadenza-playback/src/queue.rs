//! Play queue
//!
//! Ordered track ids with a current-track pointer and the shuffle/repeat
//! policy. Navigation (`next_id`, `previous_id`, `first_id`, `last_id`) is
//! defined over the sequence only and never wraps; wrapping is a policy
//! decision left to the state machine.
//!
//! The current track id may point at a track that is not in the sequence
//! (playing something outside the active list). Navigation from such a
//! track yields nothing.

use crate::types::{RepeatMode, ShuffleMode, TrackId};
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Play queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Track ids in play order, duplicates allowed
    ids: Vec<TrackId>,

    /// Display label of the queue
    title: String,

    /// Currently selected track
    current_id: Option<TrackId>,

    shuffle: ShuffleMode,
    repeat: RepeatMode,

    /// Order before shuffle was switched on
    unshuffled: Option<Vec<TrackId>>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sequence and title
    ///
    /// The current track id is left untouched.
    pub fn set_queue(&mut self, ids: Vec<TrackId>, title: impl Into<String>) {
        self.ids = ids;
        self.title = title.into();
        self.unshuffled = None;
    }

    /// Track ids in play order
    pub fn ids(&self) -> &[TrackId] {
        &self.ids
    }

    /// Queue title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Currently selected track, if any
    pub fn current_id(&self) -> Option<TrackId> {
        self.current_id
    }

    /// Select a track (or clear the selection)
    pub fn set_current_id(&mut self, id: Option<TrackId>) {
        self.current_id = id;
    }

    /// Default the current track to the first entry when unset
    ///
    /// Returns the (possibly new) current id.
    pub fn ensure_current_id(&mut self) -> Option<TrackId> {
        if self.current_id.is_none() {
            self.current_id = self.first_id();
        }
        self.current_id
    }

    /// Index of the first occurrence of `id`
    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.ids.iter().position(|&queued| queued == id)
    }

    /// Id following `id` in the sequence, `None` at the end
    pub fn next_id(&self, id: TrackId) -> Option<TrackId> {
        let index = self.position_of(id)?;
        self.ids.get(index + 1).copied()
    }

    /// Id preceding `id` in the sequence, `None` at the start
    pub fn previous_id(&self, id: TrackId) -> Option<TrackId> {
        let index = self.position_of(id)?;
        index.checked_sub(1).and_then(|i| self.ids.get(i).copied())
    }

    /// Id following the current track
    pub fn next_song_id(&self) -> Option<TrackId> {
        self.current_id.and_then(|id| self.next_id(id))
    }

    /// Id preceding the current track
    pub fn previous_song_id(&self) -> Option<TrackId> {
        self.current_id.and_then(|id| self.previous_id(id))
    }

    /// First id in the sequence
    pub fn first_id(&self) -> Option<TrackId> {
        self.ids.first().copied()
    }

    /// Last id in the sequence
    pub fn last_id(&self) -> Option<TrackId> {
        self.ids.last().copied()
    }

    /// Move an existing entry right after the current track ("play next")
    ///
    /// No-op when `id` is not queued or is the current track. When the
    /// current track is not in the sequence the entry moves to the front.
    pub fn move_to_next(&mut self, id: TrackId) {
        if self.current_id == Some(id) {
            return;
        }
        let Some(from) = self.position_of(id) else {
            return;
        };

        self.ids.remove(from);
        let target = self
            .current_id
            .and_then(|current| self.position_of(current))
            .map_or(0, |current| current + 1);
        self.ids.insert(target, id);
    }

    /// Exchange two positions; no-op unless both indices are valid
    pub fn swap(&mut self, from: usize, to: usize) {
        if from < self.ids.len() && to < self.ids.len() {
            self.ids.swap(from, to);
        }
    }

    /// Remove the first occurrence of `id`
    ///
    /// Removing the current track clears the selection; the caller decides
    /// whether to pause or stop. Returns whether an entry was removed.
    pub fn remove(&mut self, id: TrackId) -> bool {
        if self.current_id == Some(id) {
            self.current_id = None;
        }

        if let Some(original) = self.unshuffled.as_mut() {
            if let Some(index) = original.iter().position(|&queued| queued == id) {
                original.remove(index);
            }
        }

        match self.position_of(id) {
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => false,
        }
    }

    /// Repeat policy
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Set repeat policy
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    /// Shuffle policy
    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.shuffle
    }

    /// Switch shuffle on or off
    ///
    /// Switching on randomizes the sequence with the current track moved to
    /// the front. Switching off restores the order from before shuffling.
    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        if mode == self.shuffle {
            return;
        }
        self.shuffle = mode;

        match mode {
            ShuffleMode::All => {
                self.unshuffled = Some(self.ids.clone());
                self.ids.shuffle(&mut thread_rng());
                if let Some(index) = self.current_id.and_then(|id| self.position_of(id)) {
                    let current = self.ids.remove(index);
                    self.ids.insert(0, current);
                }
            }
            ShuffleMode::None => {
                if let Some(original) = self.unshuffled.take() {
                    self.ids = original;
                }
            }
        }
    }

    /// Set the shuffle flag without reordering (used by restore)
    pub fn restore_shuffle_flag(&mut self, mode: ShuffleMode) {
        self.shuffle = mode;
        self.unshuffled = None;
    }

    /// Clear everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
