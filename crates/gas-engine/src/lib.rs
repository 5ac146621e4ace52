//! gas: a scene-graph animation engine.
//!
//! A [`Scene`](graph::Scene) holds a tree of nodes driven through fluent
//! [`Dob`](graph::Dob) handles: tweens on position, scale, rotation and
//! alpha, chained with join (`then`) and race (`promise`) continuations, plus
//! a staggered emitter for particle-like bursts. A [`Stage`](stage::Stage)
//! ticks the scene at a fixed rate and draws it through wgpu.

pub mod anim;
pub mod engine;
pub mod error;
pub mod graph;
pub mod stage;

pub mod draw;
pub mod text;
pub mod texture;

pub mod core;
pub mod device;
pub mod render;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
