//! Texture provider.
//!
//! Decodes image files (via `image`) into premultiplied RGBA8 textures and owns
//! generated bitmaps such as rendered text. GPU upload is the renderer's job.

mod store;

pub use store::{Texture, TextureId, TextureStore};
