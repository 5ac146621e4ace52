use std::path::Path;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

use crate::coords::Vec2;
use crate::error::RenderError;
use crate::paint::Color;
use crate::texture::Texture;

use super::raster::{composite, Mask};

/// Opaque handle to a font loaded into a [`FontSystem`] at a fixed pixel size.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

struct LoadedFont {
    font: fontdue::Font,
    size: f32,
}

/// Owns a collection of loaded fonts.
///
/// Each entry pairs a parsed face with the pixel size it was loaded at, so the
/// same file loaded at 96 px and 48 px yields two ids.
pub struct FontSystem {
    fonts: Vec<LoadedFont>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8], size: f32) -> Result<FontId, RenderError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(RenderError::FontSize(size));
        }
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| RenderError::FontParse(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(LoadedFont { font, size });
        Ok(id)
    }

    /// Reads and parses a font file.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>, size: f32) -> Result<FontId, RenderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RenderError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        let id = self.load_font(&bytes, size)?;
        log::debug!("loaded font {} at {size}px as {id:?}", path.display());
        Ok(id)
    }

    /// Pixel size the font was loaded at.
    pub fn size(&self, id: FontId) -> Option<f32> {
        self.fonts.get(id.0).map(|f| f.size)
    }

    /// Computes the bounding box of a laid-out single-run string.
    ///
    /// Returns `(width, height)` in logical pixels, or `None` for an unknown id.
    #[must_use]
    pub fn measure_text(&self, text: &str, id: FontId) -> Option<Vec2> {
        let LoadedFont { font, size } = self.fonts.get(id.0)?;

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, *size, 0));

        let glyphs = layout.glyphs();
        if glyphs.is_empty() {
            return Some(Vec2::new(0.0, size * 1.2));
        }

        // Pen position after each glyph rather than the bitmap's right edge.
        let w = glyphs
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, *size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);
        let h = glyphs.iter().map(|g| g.y + g.height as f32).fold(*size, f32::max);
        Some(Vec2::new(w, h))
    }

    /// Rasterizes `text` into a premultiplied texture: `fill` glyphs over an
    /// `outline` ring `outline_width` pixels wide.
    ///
    /// The bitmap is padded by the outline width so the stroke is never clipped.
    pub fn rasterize(
        &self,
        text: &str,
        id: FontId,
        fill: Color,
        outline_width: f32,
        outline: Color,
    ) -> Result<Texture, RenderError> {
        let LoadedFont { font, size } = self.fonts.get(id.0).ok_or(RenderError::UnknownFont(id))?;

        if let Some(c) = text
            .chars()
            .find(|&c| !c.is_whitespace() && !c.is_control() && font.lookup_glyph_index(c) == 0)
        {
            return Err(RenderError::Unencodable(c));
        }

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, *size, 0));

        let glyphs: Vec<_> = layout
            .glyphs()
            .iter()
            .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
            .map(|g| (g.key, g.x, g.y, g.width, g.height))
            .collect();
        if glyphs.is_empty() {
            return Err(RenderError::Empty);
        }

        let min_x = glyphs.iter().map(|g| g.1).fold(f32::INFINITY, f32::min).floor();
        let min_y = glyphs.iter().map(|g| g.2).fold(f32::INFINITY, f32::min).floor();
        let max_x = glyphs.iter().map(|g| g.1 + g.3 as f32).fold(f32::NEG_INFINITY, f32::max).ceil();
        let max_y = glyphs.iter().map(|g| g.2 + g.4 as f32).fold(f32::NEG_INFINITY, f32::max).ceil();

        let outline_width = if outline_width.is_finite() { outline_width.max(0.0) } else { 0.0 };
        let pad = outline_width.ceil() as i32;
        let width = (max_x - min_x) as usize + 2 * pad as usize;
        let height = (max_y - min_y) as usize + 2 * pad as usize;

        let mut mask = Mask::new(width, height);
        for (key, x, y, _, _) in glyphs {
            let (metrics, coverage) = font.rasterize_config(key);
            if metrics.width == 0 || metrics.height == 0 {
                continue;
            }
            mask.blit_max(
                (x - min_x).round() as i32 + pad,
                (y - min_y).round() as i32 + pad,
                metrics.width,
                &coverage,
            );
        }
        if mask.is_blank() {
            return Err(RenderError::Empty);
        }

        let pixels = if outline_width > 0.0 {
            let ring = mask.dilate(outline_width);
            composite(&mask, fill, Some((&ring, outline)))
        } else {
            composite(&mask, fill, None)
        };

        Texture::from_premul_rgba(width as u32, height as u32, pixels).ok_or(RenderError::Empty)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font(b"not a font", 48.0).unwrap_err();
        assert!(matches!(err, RenderError::FontParse(_)), "got {err:?}");
    }

    #[test]
    fn non_positive_size_is_rejected() {
        let mut fonts = FontSystem::new();
        assert!(matches!(fonts.load_font(&[], 0.0), Err(RenderError::FontSize(_))));
    }

    #[test]
    fn missing_file_is_font_io_error() {
        let mut fonts = FontSystem::new();
        let err = fonts
            .load_font_file("/definitely/not/here/Montserrat-Regular.ttf", 96.0)
            .unwrap_err();
        assert!(matches!(err, RenderError::FontIo { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_font_cannot_rasterize() {
        let fonts = FontSystem::new();
        let err = fonts
            .rasterize("Frogger", FontId(3), Color::WHITE, 2.0, Color::BLACK)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownFont(FontId(3))));
        assert!(fonts.measure_text("Frogger", FontId(3)).is_none());
    }
}
