//! Error taxonomy.
//!
//! - [`ResourceError`]: an image cannot be loaded; returned by spawn/load calls.
//! - [`RenderError`]: a font cannot be loaded or a string cannot be rasterized.
//! - [`InitError`]: the engine or its graphics backend failed to come up.
//!
//! None of these cross the tick loop. Logical misuse (touching an exited node,
//! resolving a resolved guard) is not an error at all.

use std::path::PathBuf;

use thiserror::Error;

use crate::text::FontId;
use crate::texture::TextureId;

/// Failure to load or look up a texture.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
}

/// Failure to load a font or rasterize text with it.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unknown font {0:?}")]
    UnknownFont(FontId),

    #[error("failed to read font {path}: {source}")]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    FontParse(String),

    #[error("invalid font size {0}")]
    FontSize(f32),

    #[error("text produces no visible glyphs")]
    Empty,

    #[error("font has no glyph for {0:?}")]
    Unencodable(char),
}

/// Fatal start-up failure. No partial engine state survives it.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("failed to create event loop: {0}")]
    EventLoop(String),

    #[error("failed to create window: {0}")]
    Window(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
