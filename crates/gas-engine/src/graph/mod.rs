//! Scene graph.
//!
//! Responsibilities:
//! - own the node tree (arena + parent/child handles) and its paint order
//! - advance tweens and settle continuation chains once per tick
//! - run emissions and sweep exited nodes
//! - record the tree into a [`DrawList`](crate::draw::DrawList)

mod arena;
mod dob;
mod emitter;
mod node;
mod scene;
mod transform;

pub use arena::NodeId;
pub use dob::{Chain, Dob};
pub use node::{Payload, TextRun};
pub use scene::Scene;
pub use transform::Transform;
