// Tokio-backed playback timers
use crate::application::dashboard_service::TickSender;
use crate::application::playback::{TickScheduler, TimerHandle, TimerId};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Each timer is its own interval task; cancelling the handle aborts it.
#[derive(Debug, Clone)]
pub struct TokioTickScheduler {
    ticks: TickSender,
}

impl TokioTickScheduler {
    pub fn new(ticks: TickSender) -> Self {
        Self { ticks }
    }
}

impl TickScheduler for TokioTickScheduler {
    fn start(&self, timer: TimerId, every: Duration) -> TimerHandle {
        let ticks = self.ticks.clone();
        let task = tokio::spawn(async move {
            // First tick one full period after start, never immediately
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(timer).is_err() {
                    break;
                }
            }
        });
        TimerHandle::new(timer, Some(task.abort_handle()))
    }
}
