use super::DrawCmd;

/// Recorded draw stream for a frame.
///
/// Paint order is recording order. `push()` is O(1) and `clear()` keeps the
/// allocation, so no per-frame allocation happens once warmed.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawCmd>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded items. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn push(&mut self, cmd: DrawCmd) {
        self.items.push(cmd);
    }

    /// Returns items in paint order (back-to-front).
    #[inline]
    pub fn items(&self) -> &[DrawCmd] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DrawCmd> {
        self.items.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::draw::SpriteCmd;
    use crate::paint::Color;
    use crate::texture::TextureId;

    fn sprite(x: f32) -> SpriteCmd {
        SpriteCmd {
            texture: TextureId(0),
            center: Vec2::new(x, 0.0),
            size: Vec2::splat(1.0),
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }

    #[test]
    fn keeps_recording_order() {
        let mut list = DrawList::new();
        for x in [3.0, 1.0, 2.0] {
            list.push_sprite(sprite(x));
        }
        let xs: Vec<f32> = list
            .iter()
            .map(|cmd| match cmd {
                DrawCmd::Sprite(s) => s.center.x,
            })
            .collect();
        assert_eq!(xs, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut list = DrawList::new();
        list.push_sprite(sprite(0.0));
        let cap = list.items.capacity();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.items.capacity(), cap);
    }
}
