//! Contract between the window runtime and the stage it drives.
//!
//! The runtime owns the platform loop and the GPU; the stage only sees a
//! [`FrameCtx`] once per paced frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
