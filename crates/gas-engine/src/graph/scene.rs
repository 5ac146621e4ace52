use std::path::Path;
use std::time::Duration;

use crate::anim::chain::{Fired, Poll};
use crate::draw::{DrawList, SpriteCmd};
use crate::error::{RenderError, ResourceError};
use crate::paint::Color;
use crate::text::{FontId, FontSystem};
use crate::texture::{TextureId, TextureStore};

use super::arena::Arena;
use super::emitter::Emission;
use super::node::{Life, Node};
use super::{Dob, NodeId, Payload, TextRun, Transform};

/// Upper bound on chain settle passes per update.
///
/// Each pass fires the ready steps of the tracks a node had when the pass
/// reached it; a pass without progress ends settling. Hitting the bound means callbacks keep re-arming
/// each other with zero-length work.
const MAX_SETTLE_PASSES: usize = 64;

/// Scene graph: the node tree, its chains and emissions, and the assets nodes
/// draw with.
///
/// Children paint in insertion order after their parent. Nodes live in an
/// arena; parents own children by handle and children refer back by handle.
pub struct Scene {
    nodes: Arena<Node>,
    root: NodeId,
    textures: TextureStore,
    fonts: FontSystem,
    pub(crate) emissions: Vec<Emission>,
    updating: bool,
}

impl Scene {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(Node::new(None, Payload::Empty, Life::Active));
        Self {
            nodes,
            root,
            textures: TextureStore::new(),
            fonts: FontSystem::new(),
            emissions: Vec::new(),
            updating: false,
        }
    }

    // ── handles ───────────────────────────────────────────────────────────

    #[inline]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Fluent handle to the root container.
    #[inline]
    pub fn root(&mut self) -> Dob<'_> {
        let root = self.root;
        Dob::new(self, root)
    }

    /// Fluent handle to `id`. Stale ids yield a handle whose operations are no-ops.
    #[inline]
    pub fn dob(&mut self, id: NodeId) -> Dob<'_> {
        Dob::new(self, id)
    }

    // ── assets ────────────────────────────────────────────────────────────

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureStore {
        &mut self.textures
    }

    pub fn fonts(&self) -> &FontSystem {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontSystem {
        &mut self.fonts
    }

    /// Loads (or reuses) an image texture.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureId, ResourceError> {
        self.textures.load(path)
    }

    /// Loads a font file at a fixed pixel size.
    pub fn load_font(&mut self, path: impl AsRef<Path>, size: f32) -> Result<FontId, RenderError> {
        self.fonts.load_font_file(path, size)
    }

    // ── spawning ──────────────────────────────────────────────────────────

    /// Appends a new child to `parent`, on top of its existing children.
    ///
    /// A child spawned under an exited (or stale) parent starts out exited and
    /// is swept with it.
    pub fn spawn(&mut self, parent: NodeId, payload: Payload) -> NodeId {
        let alive = self.is_active(parent);
        let life = if alive { Life::Active } else { Life::Exiting { grace: false } };
        let parent_link = self.nodes.contains(parent).then_some(parent);

        let id = self.nodes.insert(Node::new(parent_link, payload, life));
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Loads `path` and spawns it as an image child of `parent`.
    ///
    /// On failure the tree is left untouched.
    pub fn spawn_image(&mut self, parent: NodeId, path: impl AsRef<Path>) -> Result<NodeId, ResourceError> {
        let tex = self.textures.load(path)?;
        Ok(self.spawn(parent, Payload::Image(tex)))
    }

    /// Spawns an image child from an already-loaded texture.
    pub fn spawn_texture(&mut self, parent: NodeId, tex: TextureId) -> Result<NodeId, ResourceError> {
        if !self.textures.contains(tex) {
            return Err(ResourceError::UnknownTexture(tex));
        }
        Ok(self.spawn(parent, Payload::Image(tex)))
    }

    /// Copies `template`'s transform, tint and payload (not its chains or
    /// children) into a fresh child of `parent`.
    pub(crate) fn clone_node(&mut self, template: NodeId, parent: NodeId) -> Option<NodeId> {
        let src = self.nodes.get(template)?;
        let (xf, tint) = (src.xf, src.tint);
        let payload = match &src.payload {
            Payload::Text(run) => {
                // Text textures are node-owned, so the clone needs its own copy.
                let copy = self.textures.get(run.texture)?.clone();
                Payload::Text(TextRun { texture: self.textures.insert(copy), ..run.clone() })
            }
            other => other.clone(),
        };

        let id = self.spawn(parent, payload);
        if let Some(node) = self.nodes.get_mut(id) {
            node.xf = xf;
            node.tint = tint;
        }
        Some(id)
    }

    // ── introspection ─────────────────────────────────────────────────────

    /// Number of nodes in the tree, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// `true` while the node participates in update and render.
    #[inline]
    pub fn is_active(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(Node::is_active)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(id).map(|n| n.xf)
    }

    pub fn tint(&self, id: NodeId) -> Option<Color> {
        self.nodes.get(id).map(|n| n.tint)
    }

    pub fn payload(&self, id: NodeId) -> Option<&Payload> {
        self.nodes.get(id).map(|n| &n.payload)
    }

    /// `true` while the node has running tweens or queued chain steps.
    pub fn is_animating(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.tracks.iter().any(|t| t.pending() > 0))
    }

    /// Number of emissions still spawning.
    pub fn emissions(&self) -> usize {
        self.emissions.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|n| n.is_active())
    }

    /// Mutable access to an active node; exited and stale nodes yield `None`.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).filter(|n| n.is_active())
    }

    pub(crate) fn replace_payload(&mut self, id: NodeId, payload: Payload) {
        let Some(node) = self.node_mut(id) else { return };
        let old = std::mem::replace(&mut node.payload, payload);
        if let Payload::Text(run) = old {
            self.textures.remove(run.texture);
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Marks `id` and its subtree for removal and drops their chains without
    /// firing them. Idempotent. The root cannot exit; use [`Scene::clear`].
    pub fn exit(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let grace = self.updating;
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.nodes.get_mut(n) else { continue };
            if !node.is_active() {
                continue;
            }
            node.life = Life::Exiting { grace };
            node.tracks.clear();
            stack.extend_from_slice(&node.children);
        }
    }

    /// Destroys every node but the root immediately and cancels emissions.
    /// No chain callbacks fire.
    pub fn clear_nodes(&mut self) {
        let ids: Vec<NodeId> = self.nodes.ids().filter(|&id| id != self.root).collect();
        for id in &ids {
            self.destroy(*id);
        }
        if let Some(root) = self.nodes.get_mut(self.root) {
            root.children.clear();
        }
        self.emissions.clear();
        log::debug!("cleared {} nodes", ids.len());
    }

    /// Cancels every pending chain and running tween; nodes stay where the
    /// cancelled tweens left them.
    pub fn clear_chains(&mut self) {
        for node in self.nodes.values_mut() {
            node.tracks.clear();
        }
        log::debug!("cleared chains");
    }

    /// Returns the tree to an empty root with nothing pending.
    pub fn clear(&mut self) {
        self.clear_nodes();
        self.clear_chains();
    }

    fn destroy(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            if let Some(tex) = node.owned_texture() {
                self.textures.remove(tex);
            }
        }
    }

    /// Reaps every exiting node.
    fn sweep(&mut self) {
        let dead: Vec<NodeId> = self
            .nodes
            .ids()
            .filter(|&id| self.nodes.get(id).is_some_and(|n| !n.is_active()))
            .collect();
        if dead.is_empty() {
            return;
        }

        for &id in &dead {
            let parent = self.nodes.get(id).and_then(|n| n.parent);
            if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p)) {
                p.children.retain(|&c| c != id);
            }
        }
        for id in &dead {
            self.destroy(*id);
        }
        log::debug!("swept {} nodes", dead.len());
    }

    // ── tick ──────────────────────────────────────────────────────────────

    /// Advances every active node by `dt` and fires whatever chain steps
    /// became ready.
    ///
    /// Nodes exited during the previous tick are swept first. Every running
    /// tween sees the same `dt` before any callback runs, so work started by a
    /// callback (tweens, tracks, emissions) is first advanced on the next tick,
    /// wherever its node sits in paint order.
    pub fn update(&mut self, dt: Duration) {
        self.sweep();
        self.updating = true;

        for id in self.active_ids() {
            let Some(node) = self.node_mut(id) else { continue };
            let Node { tracks, xf, .. } = node;
            for track in tracks.iter_mut() {
                track.advance(dt, xf);
            }
        }
        let mut running = std::mem::take(&mut self.emissions);

        // Later passes pick up tracks opened and guards resolved by earlier ones.
        for pass in 1.. {
            let mut progressed = false;
            for id in self.active_ids() {
                progressed |= self.settle(id);
            }
            if !progressed {
                break;
            }
            if pass >= MAX_SETTLE_PASSES {
                log::warn!("chain settling did not converge after {pass} passes");
                break;
            }
        }

        self.advance_emissions(&mut running, dt);
        self.updating = false;
    }

    /// Fires every ready step on the tracks `id` had when the pass began.
    /// Tracks opened by those callbacks wait for the next pass. Returns
    /// whether anything moved.
    fn settle(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else { return false };
        let mut left = node.tracks.len();
        let mut progressed = false;
        let mut i = 0;
        while left > 0 {
            let Some(node) = self.node_mut(id) else { break };
            let Node { tracks, xf, .. } = node;
            let Some(track) = tracks.get_mut(i) else { break };

            match track.poll(xf) {
                Poll::Idle => {
                    i += 1;
                    left -= 1;
                }
                Poll::Done => {
                    tracks.remove(i);
                    left -= 1;
                }
                Poll::Fire(fired) => {
                    progressed = true;
                    log::trace!("firing chain step on {id:?}");
                    match fired {
                        Fired::Then(f) => f(Dob::new(self, id)),
                        Fired::Promise(f, guard) => f(Dob::new(self, id), guard),
                    }
                }
                Poll::Exit => {
                    progressed = true;
                    self.exit(id);
                }
            }
        }
        progressed
    }

    /// Advances the emissions that were running when the tick began. Those
    /// started during this tick are kept for the next one untouched.
    fn advance_emissions(&mut self, running: &mut Vec<Emission>, dt: Duration) {
        let fresh = std::mem::take(&mut self.emissions);
        running.retain_mut(|em| {
            em.elapsed = em.elapsed.saturating_add(dt);
            self.run_emission(em)
        });
        running.extend(fresh);
        // Emissions started by configurators during this pass go after.
        running.append(&mut self.emissions);
        self.emissions = std::mem::take(running);
    }

    /// Spawns every due instance of `em`. Returns `false` once the emission is
    /// finished or cancelled.
    pub(crate) fn run_emission(&mut self, em: &mut Emission) -> bool {
        if !self.is_active(em.source) || !self.is_active(em.template) {
            return false;
        }
        let parent = self.parent(em.source).unwrap_or(self.root);
        while let Some(at) = em.pop_due() {
            let Some(clone) = self.clone_node(em.template, parent) else {
                return false;
            };
            log::trace!("emitted {clone:?} from {:?} at {at:?}", em.template);
            (em.configure)(Dob::new(self, clone));
            if !self.is_active(em.source) || !self.is_active(em.template) {
                return false;
            }
        }
        !em.is_finished()
    }

    /// Active nodes in depth-first paint order.
    fn active_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            out.push(id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    // ── render ────────────────────────────────────────────────────────────

    /// Records one sprite per textured node, parents before children and
    /// siblings in insertion order.
    ///
    /// Nodes exited during the last update are drawn one final time; nodes
    /// exited before it are skipped.
    pub fn render(&self, list: &mut DrawList) {
        self.render_node(self.root, &Transform::default(), list);
    }

    fn render_node(&self, id: NodeId, parent: &Transform, list: &mut DrawList) {
        let Some(node) = self.nodes.get(id) else { return };
        if node.life == (Life::Exiting { grace: false }) {
            return;
        }

        let world = parent.then(&node.xf);
        if let Some(tex) = node.payload.texture() {
            if let Ok((w, h)) = self.textures.size(tex) {
                if world.alpha > 0.0 {
                    list.push_sprite(SpriteCmd {
                        texture: tex,
                        center: world.pos,
                        size: crate::coords::Vec2::new(w as f32, h as f32).scale(world.scale),
                        rotation: world.rotation,
                        tint: node.tint.faded(world.alpha),
                    });
                }
            }
        }

        for &child in &node.children {
            self.render_node(child, &world, list);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
