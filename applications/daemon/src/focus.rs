//! Desktop audio focus
//!
//! Desktop mixers let every stream play at once, so there is nobody to
//! arbitrate with: requests are always granted and the daemon never sees a
//! focus loss unless a host forwards one through the playback handle.

use cadenza_playback::{AudioFocus, FocusRequest};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DesktopFocus {
    held: bool,
}

impl DesktopFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether focus is currently held
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl AudioFocus for DesktopFocus {
    fn request(&mut self) -> FocusRequest {
        if !self.held {
            debug!("Audio focus acquired");
        }
        self.held = true;
        FocusRequest::Granted
    }

    fn abandon(&mut self) {
        if self.held {
            debug!("Audio focus released");
        }
        self.held = false;
    }
}
