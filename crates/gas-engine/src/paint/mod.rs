//! Paint model shared between the scene graph and the renderer.
//!
//! Colors are premultiplied RGBA in display encoding (sRGB bytes / 255)
//! throughout the engine; the surface is a plain UNORM format, so nothing is
//! re-encoded on the way out.

pub mod color;

pub use color::Color;
