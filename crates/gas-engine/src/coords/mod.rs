//! Coordinate types shared by the scene graph and the renderer.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down, rotations clockwise in degrees
//!
//! The sprite renderer converts to NDC in its shader using a viewport uniform.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
