//! Fixed-tick scheduler.
//!
//! A [`Stage`] owns the [`Scene`] and, once playing, drives it from the window
//! runtime: each paced frame runs the director hook, updates the scene with
//! the clamped frame delta, renders it into a [`DrawList`] and hands that to
//! the sprite renderer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{App, AppControl, FrameCtx};
use crate::draw::DrawList;
use crate::engine::{Engine, View};
use crate::error::InitError;
use crate::graph::Scene;
use crate::paint::Color;
use crate::render::SpriteRenderer;

type Director = Box<dyn FnMut(&mut Scene, Duration)>;

/// Cloneable request to end [`Stage::play`] after the current frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct Stage {
    view: View,
    /// Color the surface is cleared to before the scene draws.
    pub bg_color: Color,
    scene: Scene,
    director: Option<Director>,
    stop: StopHandle,
    draw_list: DrawList,
    renderer: SpriteRenderer,
}

impl Stage {
    pub fn new(view: View) -> Self {
        Self {
            view,
            bg_color: Color::BLACK,
            scene: Scene::new(),
            director: None,
            stop: StopHandle::default(),
            draw_list: DrawList::new(),
            renderer: SpriteRenderer::new(),
        }
    }

    #[inline]
    pub fn view(&self) -> &View {
        &self.view
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Installs the director hook, called with the frame delta before every
    /// scene update. Replaces any previous hook.
    pub fn on_tick<F>(&mut self, director: F) -> &mut Self
    where
        F: FnMut(&mut Scene, Duration) + 'static,
    {
        self.director = Some(Box::new(director));
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs one tick without a window: director, update, render.
    pub fn tick(&mut self, dt: Duration) -> &DrawList {
        if let Some(director) = self.director.as_mut() {
            director(&mut self.scene, dt);
        }
        self.scene.update(dt);

        self.draw_list.clear();
        self.scene.render(&mut self.draw_list);
        &self.draw_list
    }

    /// Opens the view's window and ticks at `fps` until the window closes or
    /// the stop handle fires. Consumes the engine.
    pub fn play(self, engine: Engine, fps: u32) -> Result<(), InitError> {
        log::info!(
            "playing {}x{} \"{}\" at {} fps",
            self.view.width,
            self.view.height,
            self.view.title,
            fps
        );
        let view = self.view.clone();
        engine.run(&view, fps, self)
    }
}

impl App for Stage {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.stop.is_stopped() {
            return AppControl::Exit;
        }

        self.tick(ctx.time.delta);

        let Self { renderer, draw_list, scene, bg_color, .. } = self;
        let control = ctx.render(*bg_color, |rctx, target| {
            renderer.render(rctx, target, draw_list, scene.textures());
        });

        if self.stop.is_stopped() {
            return AppControl::Exit;
        }
        control
    }
}
