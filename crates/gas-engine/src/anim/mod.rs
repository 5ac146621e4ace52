//! Animation primitives: easing curves, tweens, continuation chains and the
//! signals chains synchronize on.

pub mod ease;
pub(crate) mod chain;
mod signal;
mod tween;

pub use ease::Easing;
pub use signal::{Completion, Guard};
pub use tween::{rotation_delta, Prop, Tween, TweenSpec};
