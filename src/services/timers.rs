use std::{collections::HashMap, time::Duration};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, sleep},
};

use tracing::warn;

use crate::services::round_service::{TimerId, TimerSlot};

/// Tokio-backed timers, one task per armed slot, reporting fires on a channel.
pub struct TimerWheel {
    fired: mpsc::UnboundedSender<TimerId>,
    armed: HashMap<TimerSlot, JoinHandle<()>>,
}

impl TimerWheel {
    /// Build a wheel and the receiver its fires are delivered to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (fired, receiver) = mpsc::unbounded_channel();
        let wheel = Self {
            fired,
            armed: HashMap::new(),
        };
        (wheel, receiver)
    }

    /// Arm `timer`, aborting whatever was armed in the same slot.
    ///
    /// A repeating timer whose first deadline cannot be represented is not armed.
    pub fn arm(&mut self, timer: TimerId, period: Duration, repeating: bool) {
        let first = Instant::now().checked_add(period);
        if repeating && first.is_none() {
            warn!(
                slot = ?timer.slot,
                period_secs = period.as_secs(),
                "timer period out of range; not arming"
            );
            self.disarm(timer.slot);
            return;
        }

        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            let Some(first) = first.filter(|_| repeating) else {
                sleep(period).await;
                let _ = fired.send(timer);
                return;
            };

            let mut ticks = interval_at(first, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if fired.send(timer).is_err() {
                    break;
                }
            }
        });

        if let Some(previous) = self.armed.insert(timer.slot, task) {
            previous.abort();
        }
    }

    /// Abort the timer in `slot`, if any.
    pub fn disarm(&mut self, slot: TimerSlot) {
        if let Some(task) = self.armed.remove(&slot) {
            task.abort();
        }
    }

    /// Abort every armed timer.
    pub fn disarm_all(&mut self) {
        for (_, task) in self.armed.drain() {
            task.abort();
        }
    }
}

impl Drop for TimerWheel {
    fn drop(&mut self) {
        self.disarm_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(slot: TimerSlot, generation: u64) -> TimerId {
        TimerId { slot, generation }
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_after_period() {
        let (mut wheel, mut fired) = TimerWheel::new();
        wheel.arm(timer(TimerSlot::Round, 1), Duration::from_secs(15), false);

        tokio::time::advance(Duration::from_secs(14)).await;
        assert!(fired.try_recv().is_err());

        assert_eq!(fired.recv().await, Some(timer(TimerSlot::Round, 1)));
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_fires_every_period() {
        let (mut wheel, mut fired) = TimerWheel::new();
        let poll = timer(TimerSlot::Poll, 7);
        wheel.arm(poll, Duration::from_secs(1), true);

        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(fired.recv().await, Some(poll));
        }
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_a_slot_replaces_previous_timer() {
        let (mut wheel, mut fired) = TimerWheel::new();
        wheel.arm(timer(TimerSlot::Round, 1), Duration::from_secs(1), true);
        wheel.arm(timer(TimerSlot::Round, 2), Duration::from_secs(5), false);

        assert_eq!(fired.recv().await, Some(timer(TimerSlot::Round, 2)));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_period_leaves_slot_empty() {
        let (mut wheel, mut fired) = TimerWheel::new();
        wheel.arm(timer(TimerSlot::Poll, 1), Duration::from_secs(1), true);
        wheel.arm(timer(TimerSlot::Poll, 2), Duration::MAX, true);
        assert!(!wheel.armed.contains_key(&TimerSlot::Poll));

        wheel.arm(timer(TimerSlot::Round, 3), Duration::MAX, false);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_is_idempotent() {
        let (mut wheel, mut fired) = TimerWheel::new();
        wheel.arm(timer(TimerSlot::Poll, 1), Duration::from_secs(1), true);
        wheel.disarm(TimerSlot::Poll);
        wheel.disarm(TimerSlot::Poll);
        wheel.disarm(TimerSlot::Round);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(fired.try_recv().is_err());
    }
}
