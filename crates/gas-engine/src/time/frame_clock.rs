use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, after clamping.
    pub delta: Duration,

    /// Monotonic frame counter.
    pub frame_index: u64,

    /// `true` when the raw delta exceeded the clamp and was cut down.
    pub clamped: bool,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// `FrameClock` is used per loop so that independent loops do not share
/// delta-time state.
///
/// Delta time is clamped to avoid pathological values when the application is
/// paused by the debugger, minimized, or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    max_delta: Duration,
}

impl FrameClock {
    /// Clock for a loop targeting `fps` ticks per second.
    ///
    /// Deltas are capped at three nominal frame intervals, so a stall is
    /// caught up over several ticks rather than in one huge step.
    pub fn for_rate(fps: u32) -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            max_delta: frame_interval(fps) * 3,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`. Time running backwards yields a zero delta.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let raw = now.saturating_duration_since(self.last);
        self.last = now;

        let ft = FrameTime {
            delta: raw.min(self.max_delta),
            frame_index: self.frame_index,
            clamped: raw > self.max_delta,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

/// Nominal interval between ticks at `fps` (at least one tick per second).
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_rate_clamps_to_three_intervals() {
        let mut clock = FrameClock::for_rate(30);
        let start = Instant::now();
        clock.last = start;

        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert!(ft.clamped);
        assert_eq!(ft.delta, Duration::from_secs(1) / 30 * 3);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn normal_delta_passes_through() {
        let mut clock = FrameClock::for_rate(60);
        let start = Instant::now();
        clock.last = start;

        let ft = clock.tick_at(start + Duration::from_millis(17));
        assert!(!ft.clamped);
        assert_eq!(ft.delta, Duration::from_millis(17));
        assert_eq!(clock.tick_at(start + Duration::from_millis(30)).frame_index, 1);
    }

    #[test]
    fn backwards_time_yields_zero_delta() {
        let mut clock = FrameClock::for_rate(60);
        let start = Instant::now() + Duration::from_secs(1);
        clock.last = start;
        let ft = clock.tick_at(start - Duration::from_millis(5));
        assert_eq!(ft.delta, Duration::ZERO);
        assert!(!ft.clamped);
    }

    #[test]
    fn zero_fps_is_treated_as_one() {
        assert_eq!(frame_interval(0), Duration::from_secs(1));
        assert_eq!(frame_interval(50), Duration::from_millis(20));
    }
}
