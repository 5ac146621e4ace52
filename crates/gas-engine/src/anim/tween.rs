use std::time::Duration;

use crate::coords::Vec2;
use crate::graph::Transform;

use super::ease::{self, Easing};

/// Property a tween drives, with its target value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Prop {
    Position(Vec2),
    Scale(Vec2),
    /// Degrees. Targets in `[0, 360)` travel the shortest way round; anything
    /// outside that range is taken literally.
    Rotation(f32),
    Alpha(f32),
}

/// A tween that has not started yet: its start value is captured when the
/// owning chain step begins executing.
#[derive(Debug, Copy, Clone)]
pub struct TweenSpec {
    pub prop: Prop,
    pub duration: Duration,
    pub easing: Option<Easing>,
}

impl TweenSpec {
    pub fn new(prop: Prop, duration: Duration, easing: Option<Easing>) -> Self {
        Self { prop, duration, easing }
    }
}

#[derive(Debug, Copy, Clone)]
enum Lane {
    Position { from: Vec2, to: Vec2 },
    Scale { from: Vec2, to: Vec2 },
    Rotation { from: f32, delta: f32, to: f32 },
    Alpha { from: f32, to: f32 },
}

/// A running interpolation of one property on one node.
#[derive(Debug, Clone)]
pub struct Tween {
    lane: Lane,
    duration: Duration,
    elapsed: Duration,
    easing: Option<Easing>,
    done: bool,
}

impl Tween {
    /// Starts `spec`, capturing the current value of its property from `xf`.
    pub fn start(spec: TweenSpec, xf: &Transform) -> Self {
        let lane = match spec.prop {
            Prop::Position(to) => Lane::Position { from: xf.pos, to },
            Prop::Scale(to) => Lane::Scale { from: xf.scale, to },
            Prop::Rotation(to) => Lane::Rotation {
                from: xf.rotation,
                delta: rotation_delta(xf.rotation, to),
                to,
            },
            Prop::Alpha(to) => Lane::Alpha { from: xf.alpha, to },
        };
        Self {
            lane,
            duration: spec.duration,
            elapsed: Duration::ZERO,
            easing: spec.easing,
            done: false,
        }
    }

    /// Advances by `dt` and writes the interpolated value into `xf`.
    ///
    /// Returns `true` only on the call where elapsed time first reaches the
    /// duration; that call writes the target value exactly.
    pub fn advance(&mut self, dt: Duration, xf: &mut Transform) -> bool {
        if self.done {
            return false;
        }

        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
        if self.elapsed >= self.duration {
            self.write_target(xf);
            self.done = true;
            return true;
        }

        let t = (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32;
        let e = ease::apply(self.easing, t);
        match self.lane {
            Lane::Position { from, to } => xf.pos = from.lerp(to, e),
            Lane::Scale { from, to } => xf.scale = from.lerp(to, e),
            Lane::Rotation { from, delta, .. } => xf.rotation = from + delta * e,
            Lane::Alpha { from, to } => xf.alpha = from + (to - from) * e,
        }
        false
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn write_target(&self, xf: &mut Transform) {
        match self.lane {
            Lane::Position { to, .. } => xf.pos = to,
            Lane::Scale { to, .. } => xf.scale = to,
            Lane::Rotation { to, .. } => xf.rotation = to,
            Lane::Alpha { to, .. } => xf.alpha = to,
        }
    }
}

/// Signed angular travel from `from` to `to`, in degrees.
pub fn rotation_delta(from: f32, to: f32) -> f32 {
    if (0.0..360.0).contains(&to) {
        (to - from + 180.0).rem_euclid(360.0) - 180.0
    } else {
        to - from
    }
}
