//! Draw stream types.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands
//! - keep paint order equal to recording order (the scene graph records
//!   parents before children, siblings in insertion order)

mod cmd;
mod list;
mod sprite;

pub use cmd::DrawCmd;
pub use list::DrawList;
pub use sprite::SpriteCmd;
