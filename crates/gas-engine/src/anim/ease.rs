//! Easing library.
//!
//! Every function maps normalized time `t ∈ [0, 1]` to eased progress with
//! `f(0) = 0` and `f(1) = 1`. Values in between may leave `[0, 1]` (see
//! [`out_back`]). All functions are pure.

use std::f32::consts::PI;

/// Normalized-time remapping function.
pub type Easing = fn(f32) -> f32;

/// Applies `easing`, treating `None` as [`linear`].
#[inline]
pub fn apply(easing: Option<Easing>, t: f32) -> f32 {
    match easing {
        Some(f) => f(t),
        None => t,
    }
}

#[inline]
pub fn linear(t: f32) -> f32 {
    t
}

/// Slow start and end, fastest at the midpoint.
#[inline]
pub fn in_out_sine(t: f32) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    (1.0 - (PI * t).cos()) * 0.5
}

/// Functional inverse of [`in_out_sine`]: fast at both ends, slow in the middle.
///
/// Used to stagger emission times so spawns bunch up mid-way.
#[inline]
pub fn in_out_sine_inv(t: f32) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    (1.0 - 2.0 * t).clamp(-1.0, 1.0).acos() / PI
}

#[inline]
pub fn in_quad(t: f32) -> f32 {
    t * t
}

#[inline]
pub fn out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

#[inline]
pub fn in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

#[inline]
pub fn in_cubic(t: f32) -> f32 {
    t * t * t
}

#[inline]
pub fn out_cubic(t: f32) -> f32 {
    let u = t - 1.0;
    u * u * u + 1.0
}

/// Overshoots past 1 before settling.
#[inline]
pub fn out_back(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    let u = t - 1.0;
    1.0 + C3 * u * u * u + C1 * u * u
}
