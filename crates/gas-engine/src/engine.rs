//! Engine lifetime: logging, the platform event loop, and GPU settings.
//!
//! ```no_run
//! use gas_engine::engine::{Engine, EngineConfig};
//! use gas_engine::stage::Stage;
//!
//! let engine = Engine::init(EngineConfig::default())?;
//! let view = engine.view(800, 600, "demo");
//! Stage::new(view).play(engine, 30)?;
//! # Ok::<(), gas_engine::error::InitError>(())
//! ```

use crate::device::GpuInit;
use crate::error::InitError;
use crate::logging::{init_logging, LoggingConfig};
use crate::window::{Runtime, RuntimeConfig};

/// Start-up configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub gpu: GpuInit,
}

/// Size and title of the stage window, in logical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

/// Initialized engine. At most one exists per process.
pub struct Engine {
    runtime: Runtime,
    gpu: GpuInit,
}

impl Engine {
    /// Installs logging and creates the platform event loop.
    ///
    /// Fails with [`InitError::EventLoop`] when the platform has no display or
    /// an engine was already initialized in this process.
    pub fn init(config: EngineConfig) -> Result<Self, InitError> {
        let EngineConfig { logging, gpu } = config;
        init_logging(logging);

        let runtime = Runtime::new().map_err(|e| InitError::EventLoop(format!("{e:#}")))?;
        log::info!("engine initialized");

        Ok(Self { runtime, gpu })
    }

    /// Describes a `width` × `height` stage window. Zero sizes are raised to 1.
    pub fn view(&self, width: u32, height: u32, title: &str) -> View {
        View {
            width: width.max(1),
            height: height.max(1),
            title: title.to_string(),
        }
    }

    /// Tears the engine down without running a stage.
    pub fn destroy(self) {
        drop(self.runtime);
        log::info!("engine destroyed");
    }

    /// Runs `app` in a window described by `view` until it stops; consumes the engine.
    pub(crate) fn run<A>(self, view: &View, fps: u32, app: A) -> Result<(), InitError>
    where
        A: crate::core::App,
    {
        let config = RuntimeConfig {
            title: view.title.clone(),
            initial_size: winit::dpi::LogicalSize::new(view.width as f64, view.height as f64),
            target_fps: fps.max(1),
        };

        let result = self.runtime.run(config, self.gpu, app).map_err(classify);
        log::info!("engine destroyed");
        result
    }
}

/// Maps a runtime failure onto the public taxonomy.
fn classify(err: anyhow::Error) -> InitError {
    if err.downcast_ref::<winit::error::OsError>().is_some() {
        InitError::Window(format!("{err:#}"))
    } else if err.downcast_ref::<winit::error::EventLoopError>().is_some() {
        InitError::EventLoop(format!("{err:#}"))
    } else {
        InitError::Backend(err)
    }
}
