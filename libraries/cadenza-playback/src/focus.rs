//! Audio focus arbitration
//!
//! Exclusive device audio output is acquired before any `Playing`
//! transition. Involuntary loss and gain notifications from the OS are
//! mapped to a [`FocusAction`] for the state machine:
//!
//! | Change          | Action                                                 |
//! |-----------------|--------------------------------------------------------|
//! | `Loss`          | pause, forget any interrupted playback                 |
//! | `LossTransient` | pause, remember whether playback was active            |
//! | `Gain`          | resume if playback was interrupted or a grant was delayed |

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Answer to a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusRequest {
    /// Exclusive output granted
    Granted,
    /// Output will be granted later via a `Gain` notification
    Delayed,
    /// Output refused
    Denied,
}

/// OS focus notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    /// Another application took output for an unbounded time
    Loss,
    /// Output taken briefly (call, navigation prompt)
    LossTransient,
    /// Output (re)granted
    Gain,
}

/// What the state machine should do about a focus change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusAction {
    Pause,
    Resume,
    Nothing,
}

/// OS hooks for exclusive audio output
pub trait AudioFocus: Send {
    /// Ask for exclusive output
    fn request(&mut self) -> FocusRequest;

    /// Give exclusive output back
    fn abandon(&mut self);
}

/// Focus policy on top of the OS hooks
pub struct ResourceArbiter {
    focus: Box<dyn AudioFocus>,

    /// Playback was active when a transient loss arrived
    loss_transient: bool,

    /// A request was answered with `Delayed`
    pending_delayed: bool,
}

impl std::fmt::Debug for ResourceArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceArbiter")
            .field("loss_transient", &self.loss_transient)
            .field("pending_delayed", &self.pending_delayed)
            .finish_non_exhaustive()
    }
}

impl ResourceArbiter {
    pub fn new(focus: Box<dyn AudioFocus>) -> Self {
        Self {
            focus,
            loss_transient: false,
            pending_delayed: false,
        }
    }

    /// Acquire exclusive output
    ///
    /// # Errors
    ///
    /// `FocusDenied` when refused, `FocusDelayed` when the grant will arrive
    /// later (playback then starts on the next `Gain`).
    pub fn acquire(&mut self) -> Result<()> {
        match self.focus.request() {
            FocusRequest::Granted => {
                self.pending_delayed = false;
                Ok(())
            }
            FocusRequest::Delayed => {
                debug!("Audio focus grant delayed");
                self.pending_delayed = true;
                Err(PlaybackError::FocusDelayed)
            }
            FocusRequest::Denied => {
                self.pending_delayed = false;
                Err(PlaybackError::FocusDenied)
            }
        }
    }

    /// Release exclusive output and forget all interruption memory
    pub fn abandon(&mut self) {
        self.forget_interruption();
        self.focus.abandon();
    }

    /// Forget interrupted playback (the user took over)
    pub fn forget_interruption(&mut self) {
        self.loss_transient = false;
        self.pending_delayed = false;
    }

    /// Whether a `Gain` would resume playback
    pub fn will_resume(&self) -> bool {
        self.loss_transient || self.pending_delayed
    }

    /// Map an OS notification to an action
    pub fn on_change(&mut self, change: FocusChange, was_playing: bool) -> FocusAction {
        debug!("Audio focus change: {:?} (playing: {})", change, was_playing);
        match change {
            FocusChange::Loss => {
                self.loss_transient = false;
                self.pending_delayed = false;
                FocusAction::Pause
            }
            FocusChange::LossTransient => {
                self.loss_transient = was_playing;
                FocusAction::Pause
            }
            FocusChange::Gain => {
                let resume = self.will_resume();
                self.forget_interruption();
                if resume {
                    FocusAction::Resume
                } else {
                    FocusAction::Nothing
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<FocusRequest>);

    impl AudioFocus for Scripted {
        fn request(&mut self) -> FocusRequest {
            self.0.pop_front().unwrap_or(FocusRequest::Granted)
        }

        fn abandon(&mut self) {}
    }

    fn arbiter(answers: &[FocusRequest]) -> ResourceArbiter {
        ResourceArbiter::new(Box::new(Scripted(answers.iter().copied().collect())))
    }

    #[test]
    fn transient_loss_while_playing_resumes_on_gain() {
        let mut arbiter = arbiter(&[]);
        assert_eq!(arbiter.on_change(FocusChange::LossTransient, true), FocusAction::Pause);
        assert_eq!(arbiter.on_change(FocusChange::Gain, false), FocusAction::Resume);
        // Memory is cleared after one resume
        assert_eq!(arbiter.on_change(FocusChange::Gain, true), FocusAction::Nothing);
    }

    #[test]
    fn transient_loss_while_paused_does_not_resume() {
        let mut arbiter = arbiter(&[]);
        arbiter.on_change(FocusChange::LossTransient, false);
        assert_eq!(arbiter.on_change(FocusChange::Gain, false), FocusAction::Nothing);
    }

    #[test]
    fn permanent_loss_forgets_interruption() {
        let mut arbiter = arbiter(&[]);
        arbiter.on_change(FocusChange::LossTransient, true);
        assert_eq!(arbiter.on_change(FocusChange::Loss, false), FocusAction::Pause);
        assert_eq!(arbiter.on_change(FocusChange::Gain, false), FocusAction::Nothing);
    }

    #[test]
    fn user_takeover_cancels_resume() {
        let mut arbiter = arbiter(&[]);
        arbiter.on_change(FocusChange::LossTransient, true);
        arbiter.forget_interruption();
        assert_eq!(arbiter.on_change(FocusChange::Gain, false), FocusAction::Nothing);
    }

    #[test]
    fn request_outcomes_map_to_errors() {
        let mut arbiter = arbiter(&[FocusRequest::Denied, FocusRequest::Delayed]);
        assert!(matches!(arbiter.acquire(), Err(PlaybackError::FocusDenied)));
        assert!(matches!(arbiter.acquire(), Err(PlaybackError::FocusDelayed)));
        assert!(arbiter.will_resume());
        assert_eq!(arbiter.on_change(FocusChange::Gain, false), FocusAction::Resume);
        assert!(arbiter.acquire().is_ok());
    }
}
