//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per render loop; `tick()` once per frame yields the clamped delta
//! - one `FramePacer` per loop to schedule redraws at the target rate

mod frame_clock;
mod pacer;

pub use frame_clock::{frame_interval, FrameClock, FrameTime};
pub use pacer::FramePacer;
