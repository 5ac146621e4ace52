//! CPU compositing for outlined text bitmaps.

use crate::paint::Color;

/// Single-channel coverage bitmap.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0; width * height] }
    }

    /// Max-blends a glyph coverage bitmap, `src_width` pixels per row, with its
    /// top-left corner at `(x, y)`. Parts falling outside the mask are dropped.
    pub fn blit_max(&mut self, x: i32, y: i32, src_width: usize, coverage: &[u8]) {
        if src_width == 0 {
            return;
        }
        for (row, line) in coverage.chunks_exact(src_width).enumerate() {
            let ty = y + row as i32;
            if ty < 0 || ty as usize >= self.height {
                continue;
            }
            for (col, &c) in line.iter().enumerate() {
                let tx = x + col as i32;
                if tx < 0 || tx as usize >= self.width {
                    continue;
                }
                let dst = &mut self.data[ty as usize * self.width + tx as usize];
                *dst = (*dst).max(c);
            }
        }
    }

    /// Morphological dilation with a disc of `radius` pixels.
    pub fn dilate(&self, radius: f32) -> Mask {
        if radius <= 0.0 {
            return self.clone();
        }
        let reach = radius.ceil() as i32;
        let r2 = radius * radius;
        let offsets: Vec<(i32, i32)> = (-reach..=reach)
            .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| (dx * dx + dy * dy) as f32 <= r2)
            .collect();

        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let mut best = 0u8;
                for &(dx, dy) in &offsets {
                    let (sx, sy) = (x + dx, y + dy);
                    if sx < 0 || sy < 0 || sx as usize >= self.width || sy as usize >= self.height {
                        continue;
                    }
                    best = best.max(self.data[sy as usize * self.width + sx as usize]);
                    if best == u8::MAX {
                        break;
                    }
                }
                out.data[y as usize * self.width + x as usize] = best;
            }
        }
        out
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }
}

/// Composites `fill` over an outline ring into premultiplied RGBA8.
///
/// `outline` is `None` for text without a stroke.
pub(crate) fn composite(fill_mask: &Mask, fill: Color, outline: Option<(&Mask, Color)>) -> Vec<u8> {
    let mut out = Vec::with_capacity(fill_mask.data.len() * 4);
    for (i, &cov) in fill_mask.data.iter().enumerate() {
        let f = fill.faded(cov as f32 / 255.0);
        let px = match outline {
            Some((ring, stroke)) => {
                let o = stroke.faded(ring.data[i] as f32 / 255.0);
                let k = 1.0 - f.a;
                Color::from_premul(f.r + o.r * k, f.g + o.g * k, f.b + o.b * k, f.a + o.a * k)
            }
            None => f,
        };
        out.extend_from_slice(&px.to_u8_array());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(size: usize) -> Mask {
        let mut m = Mask::new(size, size);
        let c = size / 2;
        m.data[c * size + c] = 255;
        m
    }

    // ── blit ──────────────────────────────────────────────────────────────

    #[test]
    fn blit_clips_to_bounds() {
        let mut m = Mask::new(2, 2);
        m.blit_max(1, 1, 2, &[10, 20, 30, 40]);
        assert_eq!(m.data, vec![0, 0, 0, 10]);
    }

    #[test]
    fn blit_follows_source_row_width() {
        let mut m = Mask::new(2, 3);
        m.blit_max(0, 0, 3, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(m.data, vec![1, 2, 4, 5, 0, 0]);
    }

    #[test]
    fn blit_keeps_maximum() {
        let mut m = Mask::new(1, 1);
        m.blit_max(0, 0, 1, &[200]);
        m.blit_max(0, 0, 1, &[100]);
        assert_eq!(m.data, vec![200]);
    }

    // ── dilate ────────────────────────────────────────────────────────────

    #[test]
    fn dilate_zero_radius_is_identity() {
        let m = dot(5);
        assert_eq!(m.dilate(0.0), m);
    }

    #[test]
    fn dilate_grows_a_disc() {
        let d = dot(5).dilate(1.0);
        // Orthogonal neighbours are inside radius 1, diagonals are not.
        assert_eq!(d.data[2 * 5 + 1], 255);
        assert_eq!(d.data[1 * 5 + 2], 255);
        assert_eq!(d.data[1 * 5 + 1], 0);
        assert_eq!(d.data[0], 0);
    }

    // ── composite ─────────────────────────────────────────────────────────

    #[test]
    fn fill_sits_on_top_of_outline() {
        let fill_mask = dot(3);
        let ring = fill_mask.dilate(1.0);
        let px = composite(&fill_mask, Color::WHITE, Some((&ring, Color::BLACK)));

        // Center: fully covered by fill.
        assert_eq!(&px[4 * 4..4 * 4 + 4], &[255, 255, 255, 255]);
        // Left neighbour: outline only.
        assert_eq!(&px[3 * 4..3 * 4 + 4], &[0, 0, 0, 255]);
        // Corner: nothing.
        assert_eq!(&px[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn composite_without_outline_is_tinted_coverage() {
        let mut m = Mask::new(1, 1);
        m.data[0] = 255;
        let px = composite(&m, Color::from_rgba_u32(0x00ff00ff), None);
        assert_eq!(px, vec![0, 255, 0, 255]);
    }
}
