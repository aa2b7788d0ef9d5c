use std::time::Duration;

use tokio::time::Instant;

use crate::utils::percentage::{duration_percentage, Percentage};

use super::timer::Timer;

/// Cosmetic progress bar of the warning dialog. Ticks every `interval` and reaches 100% once the
/// whole warning window has passed, after which it stops scheduling itself.
#[derive(Debug)]
pub struct ProgressTicker {
    timer: Timer,
    interval: Duration,
    window: Duration,
    ticks: u32,
}

impl ProgressTicker {
    pub fn start(now: Instant, interval: Duration, window: Duration) -> Self {
        let mut timer = Timer::default();
        timer.schedule(now + interval);
        Self {
            timer,
            interval,
            window,
            ticks: 0,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn is_finished(&self) -> bool {
        !self.timer.is_armed()
    }

    /// Advances the bar if the next tick is due. The following tick is scheduled relative to the
    /// previous deadline so the bar doesn't drift.
    pub fn tick(&mut self, now: Instant) -> Option<Percentage> {
        let deadline = self.timer.deadline()?;
        if !self.timer.fire_if_due(now) {
            return None;
        }
        self.ticks += 1;
        let progress = duration_percentage(self.interval * self.ticks, self.window);
        if !progress.is_full() {
            self.timer.schedule(deadline + self.interval);
        }
        Some(progress)
    }
}
