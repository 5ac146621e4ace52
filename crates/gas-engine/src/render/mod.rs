//! GPU rendering subsystem.
//!
//! Renderers consume `draw` streams and issue GPU commands via wgpu.
//! Each renderer is responsible for its own GPU resources (pipelines, buffers,
//! uploaded textures).
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shader converts to NDC using a viewport uniform.

mod common;
mod ctx;
mod sprite;

pub(crate) use common::clear_color;
pub use ctx::{RenderCtx, RenderTarget};
pub use sprite::SpriteRenderer;
