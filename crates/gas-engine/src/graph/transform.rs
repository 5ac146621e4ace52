use crate::coords::Vec2;

/// Local placement of a node relative to its parent.
///
/// `pos` is the node's center, `rotation` is clockwise degrees and `alpha`
/// multiplies down the tree.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub pos: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub alpha: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec2::zero(),
            scale: Vec2::splat(1.0),
            rotation: 0.0,
            alpha: 1.0,
        }
    }
}

impl Transform {
    /// Composes `self` (a parent's world transform) with a child's local one.
    pub fn then(&self, local: &Transform) -> Transform {
        Transform {
            pos: self.pos + local.pos.scale(self.scale).rotated(self.rotation),
            scale: self.scale.scale(local.scale),
            rotation: self.rotation + local.rotation,
            alpha: self.alpha * local.alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_parent_keeps_child() {
        let child = Transform {
            pos: Vec2::new(10.0, 20.0),
            scale: Vec2::splat(0.5),
            rotation: 30.0,
            alpha: 0.25,
        };
        assert_eq!(Transform::default().then(&child), child);
    }

    #[test]
    fn parent_scale_and_offset_apply_to_child_position() {
        let parent = Transform {
            pos: Vec2::new(100.0, 100.0),
            scale: Vec2::splat(2.0),
            ..Transform::default()
        };
        let child = Transform { pos: Vec2::new(5.0, -5.0), ..Transform::default() };
        let world = parent.then(&child);
        assert_eq!(world.pos, Vec2::new(110.0, 90.0));
        assert_eq!(world.scale, Vec2::splat(2.0));
    }

    #[test]
    fn alpha_multiplies() {
        let parent = Transform { alpha: 0.5, ..Transform::default() };
        let child = Transform { alpha: 0.5, ..Transform::default() };
        assert_eq!(parent.then(&child).alpha, 0.25);
    }
}
