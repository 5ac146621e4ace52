use super::SpriteCmd;

/// Renderer-agnostic draw command stream.
///
/// Extending the stream:
/// - add a command struct next to `sprite.rs`
/// - add a new variant here
/// - implement a push helper for it on `DrawList`
/// - add a matching renderer under `render::*`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Sprite(SpriteCmd),
}
