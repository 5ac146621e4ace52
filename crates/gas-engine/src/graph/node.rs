use crate::anim::chain::Track;
use crate::paint::Color;
use crate::text::FontId;
use crate::texture::TextureId;

use super::{NodeId, Transform};

/// Text baked into a node-owned texture by [`Dob::txt_fill_out`](super::Dob::txt_fill_out).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontId,
    pub fill: Color,
    pub outline_width: f32,
    pub outline: Color,
    /// Rasterized bitmap; freed when the node is removed or re-texted.
    pub texture: TextureId,
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// Pure transform container.
    #[default]
    Empty,
    Image(TextureId),
    Text(TextRun),
}

impl Payload {
    /// Texture the renderer should draw, if any.
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        match self {
            Payload::Empty => None,
            Payload::Image(id) => Some(*id),
            Payload::Text(run) => Some(run.texture),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Life {
    Active,
    /// Pending removal at the next sweep. `grace` nodes were exited during an
    /// update pass and still get drawn by the render that follows it.
    Exiting { grace: bool },
}

pub(crate) struct Node {
    pub xf: Transform,
    pub tint: Color,
    pub payload: Payload,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub tracks: Vec<Track>,
    pub life: Life,
}

impl Node {
    pub fn new(parent: Option<NodeId>, payload: Payload, life: Life) -> Self {
        Self {
            xf: Transform::default(),
            tint: Color::WHITE,
            payload,
            parent,
            children: Vec::new(),
            tracks: Vec::new(),
            life,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.life == Life::Active
    }

    /// Text textures belong to the node; image textures belong to the store.
    pub fn owned_texture(&self) -> Option<TextureId> {
        match &self.payload {
            Payload::Text(run) => Some(run.texture),
            _ => None,
        }
    }
}
