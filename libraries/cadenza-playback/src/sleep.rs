//! Sleep timer
//!
//! Force-stops playback after a delay. Firing does not touch the player
//! directly: it posts [`ControlEvent::SleepElapsed`] into the control loop,
//! tagged with the generation of the arm that scheduled it. Only the live
//! generation is honoured, so a firing that races a re-arm or a disarm is
//! dropped.

use crate::service::{ControlEvent, EventSender};
use crate::timer::OneShotTimer;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug)]
pub struct SleepTimer {
    timer: OneShotTimer,
    tx: EventSender,
    generation: u64,
    armed: Option<u64>,
}

impl SleepTimer {
    pub fn new(tx: EventSender) -> Self {
        Self {
            timer: OneShotTimer::new(),
            tx,
            generation: 0,
            armed: None,
        }
    }

    /// Arm for `duration`, cancelling and replacing any pending timer
    pub fn arm(&mut self, duration: Duration) {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();

        info!("Sleep timer armed for {:?}", duration);
        self.timer.schedule(duration, move || {
            if tx.send(ControlEvent::SleepElapsed(generation)).is_err() {
                debug!("Sleep timer fired after control loop shut down");
            }
        });
        self.armed = Some(generation);
    }

    /// Disarm; returns whether a timer was armed
    pub fn cancel(&mut self) -> bool {
        self.timer.cancel();
        let was_armed = self.armed.take().is_some();
        if was_armed {
            debug!("Sleep timer cancelled");
        }
        was_armed
    }

    /// Whether a timer is armed and its firing has not been handled
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Consume an elapsed notification
    ///
    /// Returns `true` when `generation` is the live arm, which is then
    /// cleared; stale generations return `false`.
    pub fn take_elapsed(&mut self, generation: u64) -> bool {
        if self.armed == Some(generation) {
            self.armed = None;
            true
        } else {
            debug!("Ignoring stale sleep timer generation {}", generation);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::event_channel;

    #[tokio::test(start_paused = true)]
    async fn elapsed_event_carries_generation() {
        let (tx, mut rx) = event_channel();
        let mut sleep = SleepTimer::new(tx);
        sleep.arm(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        match rx.try_recv() {
            Ok(ControlEvent::SleepElapsed(generation)) => {
                assert!(sleep.take_elapsed(generation));
                assert!(!sleep.is_armed());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn double_arm_leaves_one_pending_timer() {
        let (tx, mut rx) = event_channel();
        let mut sleep = SleepTimer::new(tx);
        sleep.arm(Duration::from_secs(10));
        sleep.arm(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(15)).await;
        let Ok(ControlEvent::SleepElapsed(generation)) = rx.try_recv() else {
            panic!("expected one elapsed event");
        };
        assert_eq!(generation, 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_ignored() {
        let (tx, _rx) = event_channel();
        let mut sleep = SleepTimer::new(tx);
        sleep.arm(Duration::from_secs(10));
        sleep.arm(Duration::from_secs(10));

        assert!(!sleep.take_elapsed(1));
        assert!(sleep.is_armed());
        assert!(sleep.cancel());
        assert!(!sleep.take_elapsed(2));
        assert!(!sleep.cancel());
    }
}
