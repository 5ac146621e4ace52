use std::time::Duration;

use crate::anim::ease::{self, Easing};

use super::{Dob, NodeId};

pub(crate) type Configure = Box<dyn for<'a> FnMut(Dob<'a>)>;

/// In-flight emission: clones of `template` still waiting for their due time.
pub(crate) struct Emission {
    pub source: NodeId,
    pub template: NodeId,
    /// Remaining due times, relative to the `emit` call.
    pub due: Schedule,
    pub elapsed: Duration,
    pub configure: Configure,
}

impl Emission {
    /// Pops the next due time if it has been reached.
    pub fn pop_due(&mut self) -> Option<Duration> {
        match self.due.peek() {
            Some(at) if at <= self.elapsed => self.due.next(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.due.peek().is_none()
    }
}

/// Ascending spawn times, computed one at a time.
#[derive(Debug, Clone)]
pub(crate) struct Schedule {
    next: u32,
    count: u32,
    spacing: Duration,
    total: Duration,
    start_delay: Duration,
    easing: Option<Easing>,
}

impl Schedule {
    pub fn peek(&self) -> Option<Duration> {
        (self.next < self.count).then(|| self.at(self.next))
    }

    fn at(&self, i: u32) -> Duration {
        let linear = self.spacing * i;
        let offset = match self.easing {
            Some(f) if !self.total.is_zero() => {
                let t = (linear.as_secs_f64() / self.total.as_secs_f64()) as f32;
                self.total.mul_f32(ease::apply(Some(f), t).clamp(0.0, 1.0))
            }
            _ => linear,
        };
        self.start_delay.saturating_add(offset)
    }
}

impl Iterator for Schedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let at = self.peek()?;
        self.next += 1;
        Some(at)
    }
}

/// Spawn times for `count` instances.
///
/// Instances are spaced by `min(interval, total / count)`. Without an easing the
/// times are `start_delay + i * spacing`; with one, the linear fraction of
/// `total` is remapped through it so spawns bunch where the curve is flat.
/// Counts beyond `u32::MAX` are capped there.
pub(crate) fn schedule(
    count: usize,
    interval: Duration,
    total: Duration,
    start_delay: Duration,
    easing: Option<Easing>,
) -> Schedule {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    let spacing = if total.is_zero() || count == 0 {
        Duration::ZERO
    } else {
        interval.min(total / count)
    };
    Schedule { next: 0, count, spacing, total, start_delay, easing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::ease::{in_out_sine_inv, linear};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn times(
        count: usize,
        interval: Duration,
        total: Duration,
        start_delay: Duration,
        easing: Option<Easing>,
    ) -> Vec<Duration> {
        schedule(count, interval, total, start_delay, easing).collect()
    }

    #[test]
    fn evenly_spaced_without_easing() {
        let due = times(5, ms(100), ms(500), Duration::ZERO, None);
        assert_eq!(due, [ms(0), ms(100), ms(200), ms(300), ms(400)]);
    }

    #[test]
    fn interval_is_capped_by_total() {
        let due = times(4, Duration::from_secs(1), ms(400), Duration::ZERO, None);
        assert_eq!(due, [ms(0), ms(100), ms(200), ms(300)]);
    }

    #[test]
    fn start_delay_shifts_everything() {
        let due = times(2, ms(50), ms(100), ms(250), None);
        assert_eq!(due, [ms(250), ms(300)]);
    }

    #[test]
    fn linear_easing_matches_plain_spacing() {
        let plain = times(5, ms(100), ms(500), Duration::ZERO, None);
        let eased = times(5, ms(100), ms(500), Duration::ZERO, Some(linear));
        for (a, b) in plain.iter().zip(&eased) {
            assert!(a.abs_diff(*b) < Duration::from_micros(1), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn easing_staggers_times_within_total() {
        let due = times(20, ms(500), Duration::from_secs(3), Duration::ZERO, Some(in_out_sine_inv));
        assert_eq!(due.len(), 20);
        assert_eq!(due[0], Duration::ZERO);
        assert!(due.iter().zip(due.iter().skip(1)).all(|(a, b)| a <= b));
        assert!(due.iter().all(|d| *d <= Duration::from_secs(3)));
        // Fast at the edges: the first gap is wider than the one mid-way.
        assert!(due[1] - due[0] > due[10] - due[9]);
    }

    #[test]
    fn zero_count_schedules_nothing() {
        assert!(times(0, ms(100), ms(500), Duration::ZERO, None).is_empty());
    }

    #[test]
    fn count_beyond_u32_is_capped() {
        let mut due = schedule(usize::MAX, ms(100), ms(500), Duration::ZERO, None);
        assert_eq!(due.next(), Some(Duration::ZERO));
        assert_eq!(due.next(), Some(Duration::ZERO), "spacing rounds down to nothing");
        assert!(due.peek().is_some());
    }

    #[test]
    fn zero_total_spawns_all_at_once() {
        let due = times(3, ms(100), Duration::ZERO, ms(10), Some(in_out_sine_inv));
        assert_eq!(due, [ms(10), ms(10), ms(10)]);
    }
}
