//! # Voxel Terrain
//!
//! An infinite voxel terrain client core: chunked world streaming around the player,
//! background fill and meshing on a worker pool, ray-march collision and targeting,
//! and NPCs that navigate the terrain with a grid path finder.
//!
//! Rendering is delegated to a [`RenderBackend`](engine_state::rendering::RenderBackend)
//! so the engine runs unchanged against a GPU renderer or the headless
//! [`RecordingBackend`](engine_state::rendering::RecordingBackend).
//!
//! ## Key Modules
//!
//! * `core` - Shared resource handles and error types
//! * `engine_state` - The engine session and every subsystem it drives
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_terrain::run();
//! }
//! ```
//!
//! `run()` reads an optional JSON configuration from the path in `VOXEL_CONFIG` and
//! logs through `env_logger`, filtered by `RUST_LOG`.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use engine_state::config::EngineConfig;
use engine_state::input_state::{InputBundle, RawInputState};
use engine_state::rendering::RecordingBackend;
use engine_state::voxels::height_field::NoiseHeightField;
use engine_state::EngineState;

pub mod core;
pub mod engine_state;

/// Environment variable holding the path of the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "VOXEL_CONFIG";

/// Fixed timestep of the headless session.
const TICK_SECONDS: f32 = 1.0 / 60.0;

/// Length of the headless session in ticks.
const SESSION_TICKS: usize = 600;

/// Upper bound on the wait for the initial terrain.
const INITIAL_LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Loads the configuration named by `VOXEL_CONFIG`, falling back to defaults.
pub fn load_config() -> EngineConfig {
    let Ok(path) = env::var(CONFIG_ENV_VAR) else {
        return EngineConfig::default();
    };
    match EngineConfig::load(&path) {
        Ok(config) => {
            info!("Loaded configuration from {path}");
            config
        }
        Err(err) => {
            warn!("Could not load configuration from {path}: {err}; using defaults");
            EngineConfig::default()
        }
    }
}

/// Runs a headless session: streams the terrain around the spawn, then walks the
/// player forward for a few seconds while the NPCs follow their goals.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = load_config();
    let height_field = Arc::new(NoiseHeightField::new(config.terrain.seed));
    let mut engine = match EngineState::new(config, height_field, RecordingBackend::new()) {
        Ok(engine) => engine,
        Err(err) => {
            error!("Could not start the terrain workers: {err}");
            return;
        }
    };

    if !engine.load_initial_terrain(INITIAL_LOAD_TIMEOUT) {
        warn!("Initial terrain did not finish loading within {INITIAL_LOAD_TIMEOUT:?}");
    }

    let input = InputBundle {
        move_forward: RawInputState::Held,
        ..InputBundle::default()
    };
    let mut filled = 0;
    let mut uploaded = 0;
    for _ in 0..SESSION_TICKS {
        let stats = engine.tick(TICK_SECONDS, &input);
        filled += stats.filled;
        uploaded += stats.uploaded;
        engine.backend_mut().clear_draws();
        engine.render();
    }

    let terrain = engine.terrain();
    info!(
        "Session finished: player at {:?}, {} chunks ({} committed), {} fills and {} uploads while walking, {} draws in the last frame",
        engine.player().position,
        terrain.chunk_count(),
        terrain.committed_count(),
        filled,
        uploaded,
        engine.backend().draws().len()
    );
    for npc in engine.npcs() {
        info!(
            "NPC {} ended at {:?} in state {:?} after {} resets",
            npc.id(),
            npc.position,
            npc.state(),
            npc.resets()
        );
    }
}
