use std::time::{Duration, Instant};

use super::frame_clock::frame_interval;

/// Fixed-rate redraw scheduler.
///
/// The event loop sleeps until [`deadline`](Self::deadline) and then asks for a
/// redraw. Deadlines advance by whole intervals from the previous one, so the
/// rate does not drift with per-frame overhead; after a stall the next
/// deadline restarts from `now` instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: u32) -> Self {
        Self { interval: frame_interval(fps), next: None }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next frame should start. `None` until the first frame.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// `true` when a frame should be produced at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_none_or(|t| now >= t)
    }

    /// Records a frame started at `now` and schedules the next one.
    pub fn mark(&mut self, now: Instant) -> Instant {
        let next = match self.next {
            Some(prev) if now < prev + self.interval => prev + self.interval,
            _ => now + self.interval,
        };
        self.next = Some(next);
        next
    }
}
