use crate::coords::Vec2;
use crate::draw::{DrawCmd, DrawList};
use crate::paint::Color;
use crate::texture::TextureId;

/// Textured quad draw payload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteCmd {
    pub texture: TextureId,
    /// Quad center in logical pixels.
    pub center: Vec2,
    /// Full quad size in logical pixels (texture size times world scale).
    pub size: Vec2,
    /// Clockwise degrees around `center`.
    pub rotation: f32,
    /// Premultiplied multiplier applied to every texel; carries the world alpha.
    pub tint: Color,
}

impl DrawList {
    /// Records a sprite draw command.
    #[inline]
    pub fn push_sprite(&mut self, sprite: SpriteCmd) {
        self.push(DrawCmd::Sprite(sprite));
    }
}
