use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ResourceError;

/// Opaque handle to a texture held by a [`TextureStore`].
///
/// Ids are never reused, so a renderer can keep GPU copies keyed by id and drop
/// them once [`TextureStore::contains`] reports the id gone.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(pub(crate) u32);

/// CPU-side RGBA8 image with premultiplied alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Row-major, 4 bytes per pixel, premultiplied.
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Wraps premultiplied RGBA8 pixels.
    ///
    /// Returns `None` when `pixels` does not match `width * height * 4`.
    pub fn from_premul_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Converts a straight-alpha image into the premultiplied representation.
    pub fn from_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut pixels = img.into_raw();
        for px in pixels.chunks_exact_mut(4) {
            let a = px[3] as u32;
            if a == 255 {
                continue;
            }
            px[0] = ((px[0] as u32 * a + 127) / 255) as u8;
            px[1] = ((px[1] as u32 * a + 127) / 255) as u8;
            px[2] = ((px[2] as u32 * a + 127) / 255) as u8;
        }
        Self { width, height, pixels }
    }
}

/// Owns every texture the scene can draw.
///
/// Image files are cached by path: loading the same path twice yields the same
/// id. Generated textures (text bitmaps) are inserted directly and removed by
/// their owner when no longer needed.
#[derive(Debug, Default)]
pub struct TextureStore {
    textures: HashMap<TextureId, Texture>,
    by_path: HashMap<PathBuf, TextureId>,
    next_id: u32,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and decodes an image file, or returns the cached id for `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<TextureId, ResourceError> {
        let path = path.as_ref();
        if let Some(&id) = self.by_path.get(path) {
            return Ok(id);
        }

        let img = image::open(path).map_err(|err| match err {
            image::ImageError::IoError(source) => ResourceError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => ResourceError::Decode {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let texture = Texture::from_image(img.into_rgba8());
        log::debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );

        let id = self.insert(texture);
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }

    /// Stores a generated texture and returns its id.
    pub fn insert(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.textures.insert(id, texture);
        id
    }

    /// Drops a texture. Path-cached images are forgotten as well.
    pub fn remove(&mut self, id: TextureId) -> Option<Texture> {
        self.by_path.retain(|_, v| *v != id);
        self.textures.remove(&id)
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    /// Returns the texture size, or [`ResourceError::UnknownTexture`].
    pub fn size(&self, id: TextureId) -> Result<(u32, u32), ResourceError> {
        self.get(id)
            .map(|t| (t.width, t.height))
            .ok_or(ResourceError::UnknownTexture(id))
    }

    #[inline]
    pub fn contains(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gas-engine-{}-{name}", std::process::id()))
    }

    // ── load ──────────────────────────────────────────────────────────────

    #[test]
    fn missing_file_is_io_error() {
        let mut store = TextureStore::new();
        let err = store.load(scratch_path("does-not-exist.png")).unwrap_err();
        assert!(matches!(err, ResourceError::Io { .. }), "got {err:?}");
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let path = scratch_path("corrupt.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let mut store = TextureStore::new();
        let err = store.load(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(err, ResourceError::Decode { .. }), "got {err:?}");
        assert!(store.is_empty());
    }

    #[test]
    fn same_path_is_cached() {
        let path = scratch_path("dot.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let mut store = TextureStore::new();
        let a = store.load(&path).unwrap();
        let b = store.load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.size(a).unwrap(), (2, 3));
    }

    // ── insert / remove ───────────────────────────────────────────────────

    #[test]
    fn ids_are_not_reused_after_remove() {
        let mut store = TextureStore::new();
        let tex = Texture::from_premul_rgba(1, 1, vec![0; 4]).unwrap();
        let a = store.insert(tex.clone());
        store.remove(a);
        let b = store.insert(tex);
        assert_ne!(a, b);
        assert!(!store.contains(a));
        assert!(store.contains(b));
    }

    #[test]
    fn unknown_texture_size_is_error() {
        let store = TextureStore::new();
        assert!(matches!(
            store.size(TextureId(7)),
            Err(ResourceError::UnknownTexture(TextureId(7)))
        ));
    }

    // ── premultiplication ─────────────────────────────────────────────────

    #[test]
    fn from_image_premultiplies() {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 128, 0, 128]));
        let tex = Texture::from_image(img);
        assert_eq!(tex.pixels, vec![128, 64, 0, 128]);
    }

    #[test]
    fn from_premul_rgba_checks_length() {
        assert!(Texture::from_premul_rgba(2, 2, vec![0; 15]).is_none());
        assert!(Texture::from_premul_rgba(2, 2, vec![0; 16]).is_some());
    }
}
