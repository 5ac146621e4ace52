//! Looping "Frogger" intro.
//!
//! Usage: `gas-frogger [ASSET_DIR]` (default `assets`). The directory must
//! hold `img/{bg,heart1,heart3,frog}.png` and `fonts/Montserrat-Regular.ttf`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;

use gas_engine::anim::{ease, Completion};
use gas_engine::engine::{Engine, EngineConfig};
use gas_engine::graph::{NodeId, Scene};
use gas_engine::paint::Color;
use gas_engine::stage::{Stage, StopHandle};
use gas_engine::text::FontId;
use gas_engine::texture::TextureId;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const FPS: u32 = 30;
const LOOP_PAUSE: Duration = Duration::from_secs(1);

/// Assets loaded once and shared by every run of the intro.
#[derive(Clone, Copy)]
struct Assets {
    bg: TextureId,
    heart1: TextureId,
    heart3: TextureId,
    frog: TextureId,
    montserrat96: FontId,
    montserrat48: FontId,
}

impl Assets {
    fn load(scene: &mut Scene, dir: &Path) -> Result<Self> {
        let img = |name: &str| dir.join("img").join(name);
        let font = dir.join("fonts").join("Montserrat-Regular.ttf");

        Ok(Self {
            bg: scene.load_texture(img("bg.png"))?,
            heart1: scene.load_texture(img("heart1.png"))?,
            heart3: scene.load_texture(img("heart3.png"))?,
            frog: scene.load_texture(img("frog.png"))?,
            montserrat96: scene.load_font(&font, 96.0)?,
            montserrat48: scene.load_font(&font, 48.0)?,
        })
    }
}

enum Phase {
    Start,
    Intro(Completion),
    Pause(Duration),
}

fn main() -> Result<()> {
    let asset_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"));

    let engine = Engine::init(EngineConfig::default())?;
    let view = engine.view(WIDTH, HEIGHT, "Frogger");

    let mut stage = Stage::new(view);
    stage.bg_color = Color::from_rgba_u32(0x01b335ff);

    let assets = Assets::load(stage.scene_mut(), &asset_dir)
        .with_context(|| format!("failed to load assets from {}", asset_dir.display()))?;

    let stop = stage.stop_handle();
    let mut phase = Phase::Start;
    stage.on_tick(move |scene, dt| {
        phase = match std::mem::replace(&mut phase, Phase::Start) {
            Phase::Start => start(scene, assets, &stop),
            Phase::Intro(done) if done.is_complete() => {
                log::info!("looping...");
                Phase::Pause(LOOP_PAUSE)
            }
            Phase::Intro(done) => Phase::Intro(done),
            Phase::Pause(left) if left <= dt => {
                scene.clear();
                start(scene, assets, &stop)
            }
            Phase::Pause(left) => Phase::Pause(left - dt),
        };
    });

    stage.play(engine, FPS)?;
    Ok(())
}

fn start(scene: &mut Scene, assets: Assets, stop: &StopHandle) -> Phase {
    match intro(scene, assets) {
        Ok(done) => Phase::Intro(done),
        Err(err) => {
            log::error!("intro failed: {err:#}");
            stop.stop();
            Phase::Start
        }
    }
}

/// Nodes of one intro run, in paint order.
#[derive(Clone, Copy)]
struct Cast {
    bg: NodeId,
    heart1: NodeId,
    frog: NodeId,
    credit: NodeId,
    title: NodeId,
}

/// Builds one run of the intro; the returned handle completes when the title
/// has finished its bounce.
fn intro(scene: &mut Scene, assets: Assets) -> Result<Completion> {
    let cast = spawn_cast(scene, assets)?;
    write_titles(scene, cast, assets)?;
    Ok(choreograph(scene, cast, assets.heart3))
}

fn spawn_cast(scene: &mut Scene, assets: Assets) -> Result<Cast> {
    Ok(Cast {
        bg: scene.root().spawn_texture(assets.bg)?.id(),
        heart1: scene.root().spawn_texture(assets.heart1)?.id(),
        frog: scene.root().spawn_texture(assets.frog)?.id(),
        credit: scene.root().spawn_empty().id(),
        title: scene.root().spawn_empty().id(),
    })
}

fn write_titles(scene: &mut Scene, cast: Cast, assets: Assets) -> Result<()> {
    scene.dob(cast.title).txt_fill_out(
        "Frogger",
        Color::from_rgba_u32(0x00ff00ff),
        assets.montserrat96,
        4.0,
        Color::from_rgba_u32(0x333333ff),
    )?;
    scene.dob(cast.credit).txt_fill_out(
        "jkassis ©2023",
        Color::from_rgba_u32(0xffff33dd),
        assets.montserrat48,
        2.0,
        Color::from_rgba_u32(0x003300dd),
    )?;
    Ok(())
}

fn choreograph(scene: &mut Scene, cast: Cast, heart3: TextureId) -> Completion {
    let done = Completion::new();
    let secs = Duration::from_secs;
    let sine = Some(ease::in_out_sine as ease::Easing);
    let Cast { bg, heart1, frog, credit, title } = cast;

    scene.dob(bg).at(400.0, 300.0);

    scene
        .dob(title)
        .zoom(0.5)
        .at(800.0, 300.0)
        .move_to(400.0, 300.0, secs(2), sine);

    scene
        .dob(frog)
        .zoom(0.05)
        .at(0.0, 200.0)
        .move_to(120.0, 300.0, secs(2), sine)
        .then(move |d| {
            let d = d.move_to(300.0, 120.0, secs(2), None).dob();
            d.zoom_to(4.0, secs(2), None).then(move |d| {
                // Both tracks run to the end; the zoom exits the frog.
                let d = d.zoom_to(0.25, secs(3), sine).exit().dob();
                d.move_to(330.0, 280.0, secs(3), None);
            });
        });

    scene.dob(credit).zoom(0.01).at(533.0, 400.0);

    let finished = done.clone();
    scene
        .dob(heart1)
        .zoom(0.1)
        .at(0.0, 200.0)
        .move_to(120.0, 300.0, secs(2), sine)
        .barrier()
        .move_to(533.0, 400.0, secs(3), sine)
        .then(move |mut d| {
            d.scene()
                .dob(credit)
                .zoom_to(1.0, secs(3), sine)
                .then(move |mut d| {
                    // The title bounce waits for the credit to land.
                    d.scene()
                        .dob(title)
                        .zoom_to(2.0, Duration::from_millis(200), None)
                        .barrier()
                        .zoom_to(1.0, Duration::from_millis(400), None)
                        .then(move |_| finished.complete());
                });
        });

    scene.dob(heart1).emit(
        heart1,
        20,
        Duration::from_millis(500),
        secs(3),
        Duration::ZERO,
        Some(ease::in_out_sine_inv),
        move |d| {
            let mut rng = rand::thread_rng();
            let d = if rng.gen_range(0..100) < 25 { d.texture(heart3) } else { d };

            let spin = -90.0 + 180.0 * rng.r#gen::<f32>();
            let d = d
                .spin_to(spin, secs(1) + rand_duration(&mut rng, secs(4)), None)
                .dob();

            let x = WIDTH as f32 * rng.r#gen::<f32>();
            let y = HEIGHT as f32 * rng.r#gen::<f32>();
            d.move_to(x, y, secs(2) + rand_duration(&mut rng, secs(4)), None)
                .exit();
        },
    );

    done
}

/// Uniform duration in `[0, max)`.
fn rand_duration(rng: &mut impl Rng, max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.gen_range(0..max.as_nanos() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_engine::texture::Texture;

    fn textures(scene: &mut Scene) -> [TextureId; 4] {
        std::array::from_fn(|_| {
            scene
                .textures_mut()
                .insert(Texture::from_premul_rgba(4, 4, vec![255; 64]).unwrap())
        })
    }

    fn run_until(scene: &mut Scene, done: &Completion, step: Duration) -> Duration {
        let mut t = Duration::ZERO;
        while !done.is_complete() && t < Duration::from_secs(30) {
            scene.update(step);
            t += step;
        }
        t
    }

    #[test]
    fn rand_duration_stays_below_max() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert!(rand_duration(&mut rng, Duration::from_secs(4)) < Duration::from_secs(4));
        }
        assert_eq!(rand_duration(&mut rng, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn choreography_completes_after_the_title_bounce() {
        let mut scene = Scene::new();
        let [bg, heart1, heart3, frog] = textures(&mut scene);
        let cast = Cast {
            bg: scene.root().spawn_texture(bg).unwrap().id(),
            heart1: scene.root().spawn_texture(heart1).unwrap().id(),
            frog: scene.root().spawn_texture(frog).unwrap().id(),
            credit: scene.root().spawn_empty().id(),
            title: scene.root().spawn_empty().id(),
        };

        let done = choreograph(&mut scene, cast, heart3);
        let step = Duration::from_millis(33);
        let t = run_until(&mut scene, &done, step);
        assert!(done.is_complete());
        // Heart1 moves for 5 s, the credit zooms for 3 s, the title bounces
        // for 0.6 s; each stage starts on the tick after the previous ends.
        assert!(t >= Duration::from_millis(8600));
        assert!(t < Duration::from_millis(8600) + step * 6);

        assert!(!scene.is_active(cast.frog), "the frog exits with its zoom");
        assert_eq!(scene.emissions(), 0, "every heart was emitted");
        assert_eq!(scene.transform(cast.title).unwrap().scale.x, 1.0);

        scene.clear();
        assert!(scene.is_empty());
    }

    #[test]
    fn intro_with_text_loops() {
        // Rasterizing the titles needs a real font file.
        let Some(font) = std::env::var_os("GAS_TEST_FONT") else {
            return;
        };
        let mut scene = Scene::new();
        let [bg, heart1, heart3, frog] = textures(&mut scene);
        let assets = Assets {
            bg,
            heart1,
            heart3,
            frog,
            montserrat96: scene.load_font(&font, 96.0).unwrap(),
            montserrat48: scene.load_font(&font, 48.0).unwrap(),
        };

        let done = intro(&mut scene, assets).unwrap();
        run_until(&mut scene, &done, Duration::from_millis(33));
        assert!(done.is_complete());

        scene.clear();
        assert!(intro(&mut scene, assets).is_ok());
    }
}
