use std::path::Path;
use std::time::Duration;

use crate::anim::chain::{Step, Track};
use crate::anim::ease::Easing;
use crate::anim::Guard;
use crate::anim::{Prop, TweenSpec};
use crate::coords::Vec2;
use crate::error::{RenderError, ResourceError};
use crate::paint::Color;
use crate::text::FontId;
use crate::texture::TextureId;

use super::emitter::{schedule, Emission};
use super::node::Node;
use super::{NodeId, Payload, Scene, TextRun, Transform};

/// Fluent handle to one scene node.
///
/// Setters apply immediately and return the handle. Tween starters
/// (`move_to`, `zoom_to`, ...) open a new track on the node and return a
/// [`Chain`] positioned on it, so tweens started by separate calls run
/// concurrently.
///
/// Every operation on an exited or swept node is a no-op.
pub struct Dob<'a> {
    scene: &'a mut Scene,
    id: NodeId,
}

impl<'a> Dob<'a> {
    #[inline]
    pub(crate) fn new(scene: &'a mut Scene, id: NodeId) -> Self {
        Self { scene, id }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.scene.is_active(self.id)
    }

    /// The scene this node lives in, for reaching other nodes from a callback.
    #[inline]
    pub fn scene(&mut self) -> &mut Scene {
        &mut *self.scene
    }

    #[inline]
    pub fn into_scene(self) -> &'a mut Scene {
        self.scene
    }

    // ── spawning ──────────────────────────────────────────────────────────

    /// Spawns a child on top of this node's children and returns its handle.
    pub fn spawn(self, payload: Payload) -> Dob<'a> {
        let child = self.scene.spawn(self.id, payload);
        Dob::new(self.scene, child)
    }

    pub fn spawn_empty(self) -> Dob<'a> {
        self.spawn(Payload::Empty)
    }

    pub fn spawn_texture(self, tex: TextureId) -> Result<Dob<'a>, ResourceError> {
        let child = self.scene.spawn_texture(self.id, tex)?;
        Ok(Dob::new(self.scene, child))
    }

    /// Loads `path` and spawns it as an image child.
    pub fn spawn_image(self, path: impl AsRef<Path>) -> Result<Dob<'a>, ResourceError> {
        let child = self.scene.spawn_image(self.id, path)?;
        Ok(Dob::new(self.scene, child))
    }

    // ── immediate setters ─────────────────────────────────────────────────

    fn edit(self, f: impl FnOnce(&mut Node)) -> Self {
        if let Some(node) = self.scene.node_mut(self.id) {
            f(node);
        }
        self
    }

    /// Places the node's center at `(x, y)` in parent space.
    pub fn at(self, x: f32, y: f32) -> Self {
        self.edit(|n| n.xf.pos = Vec2::new(x, y))
    }

    pub fn zoom(self, s: f32) -> Self {
        self.edit(|n| n.xf.scale = Vec2::splat(s))
    }

    pub fn zoom_xy(self, sx: f32, sy: f32) -> Self {
        self.edit(|n| n.xf.scale = Vec2::new(sx, sy))
    }

    /// Sets rotation in clockwise degrees.
    pub fn spin(self, degrees: f32) -> Self {
        self.edit(|n| n.xf.rotation = degrees)
    }

    pub fn fade(self, alpha: f32) -> Self {
        self.edit(|n| n.xf.alpha = alpha)
    }

    pub fn tint(self, color: Color) -> Self {
        self.edit(|n| n.tint = color)
    }

    /// Swaps the payload for an image texture.
    pub fn texture(self, tex: TextureId) -> Self {
        self.scene.replace_payload(self.id, Payload::Image(tex));
        self
    }

    /// Replaces the payload with `text` rasterized in `font`: `fill` glyphs
    /// ringed by an `outline` stroke `outline_width` pixels wide.
    ///
    /// On error the node keeps its previous payload.
    pub fn txt_fill_out(
        self,
        text: &str,
        fill: Color,
        font: FontId,
        outline_width: f32,
        outline: Color,
    ) -> Result<Self, RenderError> {
        if !self.is_active() {
            return Ok(self);
        }
        let bitmap = self.scene.fonts().rasterize(text, font, fill, outline_width, outline)?;
        let texture = self.scene.textures_mut().insert(bitmap);
        self.scene.replace_payload(
            self.id,
            Payload::Text(TextRun {
                text: text.to_owned(),
                font,
                fill,
                outline_width,
                outline,
                texture,
            }),
        );
        Ok(self)
    }

    // ── tweens ────────────────────────────────────────────────────────────

    fn open(self, track: impl FnOnce(&mut Node) -> Track) -> Chain<'a> {
        let slot = self.scene.node_mut(self.id).map(|node| {
            let track = track(node);
            node.tracks.push(track);
            node.tracks.len() - 1
        });
        Chain { scene: self.scene, id: self.id, track: slot }
    }

    fn tween(self, prop: Prop, duration: Duration, easing: Option<Easing>) -> Chain<'a> {
        self.open(|node| Track::open(TweenSpec::new(prop, duration, easing), &mut node.xf))
    }

    pub fn move_to(self, x: f32, y: f32, duration: Duration, easing: Option<Easing>) -> Chain<'a> {
        self.tween(Prop::Position(Vec2::new(x, y)), duration, easing)
    }

    pub fn zoom_to(self, s: f32, duration: Duration, easing: Option<Easing>) -> Chain<'a> {
        self.tween(Prop::Scale(Vec2::splat(s)), duration, easing)
    }

    pub fn zoom_xy_to(self, sx: f32, sy: f32, duration: Duration, easing: Option<Easing>) -> Chain<'a> {
        self.tween(Prop::Scale(Vec2::new(sx, sy)), duration, easing)
    }

    /// Rotates to `degrees`; see [`Prop::Rotation`] for the path taken.
    pub fn spin_to(self, degrees: f32, duration: Duration, easing: Option<Easing>) -> Chain<'a> {
        self.tween(Prop::Rotation(degrees), duration, easing)
    }

    pub fn fade_to(self, alpha: f32, duration: Duration, easing: Option<Easing>) -> Chain<'a> {
        self.tween(Prop::Alpha(alpha), duration, easing)
    }

    /// Runs `f` on the next settle, on a fresh track.
    pub fn then<F>(self, f: F) -> Chain<'a>
    where
        F: for<'b> FnOnce(Dob<'b>) + 'static,
    {
        self.open(|_| Track::default()).then(f)
    }

    /// Runs `f` with a fresh [`Guard`] on the next settle; the returned chain
    /// continues once any holder resolves it.
    pub fn promise<F>(self, f: F) -> Chain<'a>
    where
        F: for<'b> FnOnce(Dob<'b>, Guard) + 'static,
    {
        self.open(|_| Track::default()).promise(f)
    }

    /// Resolves `guard` now. Later resolutions of the same guard do nothing.
    pub fn resolve(self, guard: &Guard) -> Self {
        if self.is_active() {
            guard.resolve();
        }
        self
    }

    /// Spawns `count` clones of `template` as siblings of this node.
    ///
    /// Instances are spaced by `min(interval, total / count)` after
    /// `start_delay`; `easing` reshapes the spawn times across `total`. Each
    /// clone copies the template's current transform and payload, then goes
    /// through `configure`, which typically starts its tweens. Instances due
    /// at zero spawn before this call returns.
    #[allow(clippy::too_many_arguments)]
    pub fn emit<F>(
        self,
        template: NodeId,
        count: usize,
        interval: Duration,
        total: Duration,
        start_delay: Duration,
        easing: Option<Easing>,
        configure: F,
    ) -> Self
    where
        F: for<'b> FnMut(Dob<'b>) + 'static,
    {
        if !self.is_active() {
            return self;
        }
        let mut em = Emission {
            source: self.id,
            template,
            due: schedule(count, interval, total, start_delay, easing),
            elapsed: Duration::ZERO,
            configure: Box::new(configure),
        };
        if self.scene.run_emission(&mut em) {
            self.scene.emissions.push(em);
        }
        self
    }

    /// Marks this node and its subtree for removal, cancelling their chains.
    pub fn exit(self) -> Self {
        self.scene.exit(self.id);
        self
    }
}

/// Cursor on one track of a node, returned by the tween starters.
///
/// Tween calls join the batch being built; [`then`](Chain::then),
/// [`promise`](Chain::promise) and [`barrier`](Chain::barrier) close it, and
/// tweens issued after them form the next batch.
pub struct Chain<'a> {
    scene: &'a mut Scene,
    id: NodeId,
    track: Option<usize>,
}

impl<'a> Chain<'a> {
    fn with_track(self, f: impl FnOnce(&mut Track, &mut Transform)) -> Self {
        if let Some(i) = self.track {
            if let Some(node) = self.scene.node_mut(self.id) {
                let Node { tracks, xf, .. } = node;
                if let Some(track) = tracks.get_mut(i) {
                    f(track, xf);
                }
            }
        }
        self
    }

    fn tween(self, prop: Prop, duration: Duration, easing: Option<Easing>) -> Self {
        self.with_track(|track, xf| track.push_tween(TweenSpec::new(prop, duration, easing), xf))
    }

    fn push(self, step: Step) -> Self {
        self.with_track(|track, _| track.push(step))
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Back to the node handle. Tweens started from it open new tracks.
    pub fn dob(self) -> Dob<'a> {
        Dob::new(self.scene, self.id)
    }

    pub fn move_to(self, x: f32, y: f32, duration: Duration, easing: Option<Easing>) -> Self {
        self.tween(Prop::Position(Vec2::new(x, y)), duration, easing)
    }

    pub fn zoom_to(self, s: f32, duration: Duration, easing: Option<Easing>) -> Self {
        self.tween(Prop::Scale(Vec2::splat(s)), duration, easing)
    }

    pub fn zoom_xy_to(self, sx: f32, sy: f32, duration: Duration, easing: Option<Easing>) -> Self {
        self.tween(Prop::Scale(Vec2::new(sx, sy)), duration, easing)
    }

    pub fn spin_to(self, degrees: f32, duration: Duration, easing: Option<Easing>) -> Self {
        self.tween(Prop::Rotation(degrees), duration, easing)
    }

    pub fn fade_to(self, alpha: f32, duration: Duration, easing: Option<Easing>) -> Self {
        self.tween(Prop::Alpha(alpha), duration, easing)
    }

    /// Closes the batch without a callback: later tweens wait for it.
    pub fn barrier(self) -> Self {
        self.push(Step::Tweens(Vec::new()))
    }

    /// Fires `f` once every tween of the batch has completed.
    pub fn then<F>(self, f: F) -> Self
    where
        F: for<'b> FnOnce(Dob<'b>) + 'static,
    {
        self.push(Step::Then(Box::new(f)))
    }

    /// Fires `f` with a fresh [`Guard`] once the batch has completed; the rest
    /// of the chain waits until the guard is resolved.
    pub fn promise<F>(self, f: F) -> Self
    where
        F: for<'b> FnOnce(Dob<'b>, Guard) + 'static,
    {
        self.push(Step::Promise(Box::new(f)))
    }

    /// Resolves `guard` once the batch has completed.
    pub fn resolve(self, guard: Guard) -> Self {
        self.then(move |_| {
            guard.resolve();
        })
    }

    /// Exits the node once the batch has completed.
    pub fn exit(self) -> Self {
        self.push(Step::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;

    #[test]
    fn spawn_returns_the_child() {
        let mut scene = Scene::new();
        let root = scene.root_id();
        let a = scene.root().spawn_empty().at(1.0, 2.0).zoom(0.5).spin(45.0).id();
        let b = scene.dob(a).spawn_empty().id();

        assert_eq!(scene.children(root), &[a]);
        assert_eq!(scene.children(a), &[b]);
        assert_eq!(scene.parent(b), Some(a));
        let xf = scene.transform(a).unwrap();
        assert_eq!(xf.pos, Vec2::new(1.0, 2.0));
        assert_eq!(xf.scale, Vec2::splat(0.5));
        assert_eq!(xf.rotation, 45.0);
    }

    #[test]
    fn failed_image_spawn_leaves_tree_untouched() {
        let mut scene = Scene::new();
        let res = scene.root().spawn_image("/definitely/not/here/frog.png");
        assert!(matches!(res, Err(ResourceError::Io { .. })));
        assert!(scene.is_empty());
    }

    #[test]
    fn spawn_texture_checks_the_store() {
        let mut scene = Scene::new();
        let tex = scene
            .textures_mut()
            .insert(Texture::from_premul_rgba(1, 1, vec![0; 4]).unwrap());
        scene.textures_mut().remove(tex);
        assert!(matches!(
            scene.root().spawn_texture(tex),
            Err(ResourceError::UnknownTexture(_))
        ));
    }

    #[test]
    fn failed_text_keeps_previous_payload() {
        let mut scene = Scene::new();
        let tex = scene
            .textures_mut()
            .insert(Texture::from_premul_rgba(1, 1, vec![0; 4]).unwrap());
        let id = scene.root().spawn(Payload::Image(tex)).id();

        let res = scene
            .dob(id)
            .txt_fill_out("Frogger", Color::WHITE, FontId(0), 4.0, Color::BLACK);
        assert!(matches!(res, Err(RenderError::UnknownFont(_))));
        assert_eq!(scene.payload(id), Some(&Payload::Image(tex)));
    }

    #[test]
    fn texture_swap_sets_image_payload() {
        let mut scene = Scene::new();
        let tex = scene
            .textures_mut()
            .insert(Texture::from_premul_rgba(1, 1, vec![0; 4]).unwrap());
        let id = scene.root().spawn_empty().texture(tex).id();
        assert_eq!(scene.payload(id), Some(&Payload::Image(tex)));
    }

    #[test]
    fn resolve_on_exited_node_does_nothing() {
        let mut scene = Scene::new();
        let id = scene.root().spawn_empty().exit().id();
        let guard = Guard::new();
        scene.dob(id).resolve(&guard);
        assert!(!guard.is_resolved());
    }

    #[test]
    fn chain_on_root_is_allowed() {
        let mut scene = Scene::new();
        let root = scene.root_id();
        scene.root().move_to(4.0, 0.0, Duration::from_millis(100), None);
        scene.update(Duration::from_millis(50));
        assert_eq!(scene.transform(root).unwrap().pos, Vec2::new(2.0, 0.0));
    }
}
