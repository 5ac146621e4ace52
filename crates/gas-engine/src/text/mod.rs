//! Font/text provider.
//!
//! Loads fonts with `fontdue` and bakes strings into outlined RGBA bitmaps that
//! nodes display like any other texture.

mod font_system;
mod raster;

pub use font_system::{FontId, FontSystem};
