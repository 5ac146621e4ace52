//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the stage window, and wires them to the GPU
//! layer and the frame pacer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
