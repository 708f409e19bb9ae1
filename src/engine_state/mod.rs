//! # Engine State Module
//!
//! The core engine module that ties the voxel world, its agents and the render backend
//! together.
//!
//! ## Key Components
//!
//! * `EngineState` - The session: owns every subsystem and advances them per tick
//! * `agents` - The player and the NPCs
//! * `config` - Serde configuration for every subsystem
//! * `input_state` - The per-tick input snapshot
//! * `navigation` - NPC actions and the path finder
//! * `rendering` - The backend trait, vertex layout and meshing
//! * `task_management` - Worker threads running fills and meshes
//! * `voxels` - Blocks, chunks, terrain streaming and ray marches
//!
//! ## Tick Order
//!
//! 1. Terrain expansion around the player, at most once per configured interval
//! 2. Draining finished fills and meshes, uploading meshes to the backend
//! 3. The player, including a requested block edit
//! 4. The NPCs, which see the edit made in step 3
//!
//! Rendering is a separate call so a caller can tick several times per frame.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::{debug, info};

use agents::{BlockEdit, Npc, Player, RIG_MATERIALS};
use config::EngineConfig;
use input_state::InputBundle;
use navigation::PathFinder;
use rendering::meshing::build_block_mesh;
use rendering::{MeshId, RenderBackend, RenderPass};
use voxels::chunk::WORLD_HEIGHT;
use voxels::height_field::HeightField;
use voxels::terrain::{DrainStats, Terrain};

pub mod agents;
pub mod config;
pub mod input_state;
pub mod navigation;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// The main state container for the voxel engine
///
/// This struct owns all major subsystems and coordinates their interactions. The
/// backend is generic so callers keep typed access to it, e.g. to inspect a
/// [`RecordingBackend`](rendering::RecordingBackend).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use voxel_terrain::engine_state::config::EngineConfig;
/// use voxel_terrain::engine_state::input_state::InputBundle;
/// use voxel_terrain::engine_state::rendering::RecordingBackend;
/// use voxel_terrain::engine_state::voxels::height_field::FlatHeightField;
/// use voxel_terrain::engine_state::EngineState;
///
/// let mut engine = EngineState::new(
///     EngineConfig::default(),
///     Arc::new(FlatHeightField::new(140.0)),
///     RecordingBackend::new(),
/// )?;
/// engine.tick(1.0 / 60.0, &InputBundle::default());
/// engine.render();
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EngineState<B: RenderBackend> {
    config: EngineConfig,
    terrain: Terrain,
    path_finder: PathFinder,
    player: Player,
    npcs: Vec<Npc>,
    backend: B,
}

impl<B: RenderBackend> EngineState<B> {
    /// Creates a session and starts streaming the terrain around the player spawn.
    ///
    /// Agents start at the top of the world until [`Self::load_initial_terrain`]
    /// places them on the surface.
    ///
    /// # Errors
    /// Fails if the terrain worker pool cannot start a single thread.
    pub fn new(
        config: EngineConfig,
        height_field: Arc<dyn HeightField>,
        mut backend: B,
    ) -> io::Result<Self> {
        let mut terrain = Terrain::new(config.terrain.clone(), height_field)?;
        let [spawn_x, spawn_z] = config.player.spawn_column;
        let dispatched = terrain.expand(spawn_x as f32 + 0.5, spawn_z as f32 + 0.5);
        info!("Engine session started, {dispatched} chunk fills dispatched");

        for material in RIG_MATERIALS {
            let mesh = build_block_mesh(material);
            backend.upload(
                MeshId::Part(material.id() as u32),
                RenderPass::Opaque,
                mesh.vertex_bytes(),
                mesh.index_bytes(),
            );
        }

        let player = Player::new(spawn_point(&terrain, config.player.spawn_column), config.player.clone());
        let npcs = spawn_npcs(&config, &terrain);

        Ok(Self {
            path_finder: PathFinder::new(config.path_finder.clone()),
            config,
            terrain,
            player,
            npcs,
            backend,
        })
    }

    /// Blocks until the initial terrain is filled and meshed, then puts every agent on
    /// the surface of its spawn column.
    ///
    /// # Returns
    /// `true` if the terrain finished loading within `timeout`.
    pub fn load_initial_terrain(&mut self, timeout: Duration) -> bool {
        let loaded = self.terrain.finish_pending(&mut self.backend, timeout);
        self.player.position = spawn_point(&self.terrain, self.config.player.spawn_column);
        self.npcs = spawn_npcs(&self.config, &self.terrain);
        info!(
            "Initial terrain {}: {} chunks committed, {} meshes loaded",
            if loaded { "loaded" } else { "incomplete" },
            self.terrain.committed_count(),
            self.terrain.loaded_mesh_count()
        );
        loaded
    }

    /// Advances the session by `dt` seconds.
    ///
    /// # Returns
    /// What the terrain pipeline drained this tick.
    pub fn tick(&mut self, dt: f32, input: &InputBundle) -> DrainStats {
        let position = self.player.position;
        self.terrain.tick(position.x, position.z);
        let stats = self.terrain.check_thread_results(&mut self.backend);

        if let Some(edit) = self.player.tick(dt, input, &self.terrain) {
            self.apply_edit(edit);
        }

        let player = self.player.position;
        for npc in &mut self.npcs {
            npc.tick(dt, &self.terrain, &self.path_finder, player);
        }
        stats
    }

    fn apply_edit(&mut self, edit: BlockEdit) {
        match self.terrain.place_block_at(edit.position, edit.block, &mut self.backend) {
            Ok(()) => debug!("Placed {:?} at {:?}", edit.block, edit.position),
            Err(err) => debug!("Block edit at {:?} rejected: {err}", edit.position),
        }
    }

    /// Draws opaque terrain, then transparent terrain, then the NPCs.
    pub fn render(&mut self) {
        self.terrain.draw(&mut self.backend, RenderPass::Opaque);
        self.terrain.draw(&mut self.backend, RenderPass::Transparent);
        for npc in &self.npcs {
            for (material, model) in npc.parts() {
                self.backend
                    .draw(MeshId::Part(material.id() as u32), model, RenderPass::Opaque);
            }
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

/// Feet position on top of a column, or at the top of the world if the column has
/// not been filled yet.
fn spawn_point(terrain: &Terrain, [x, z]: [i32; 2]) -> Point3<f32> {
    let y = match terrain.surface_height_at(x, z) {
        Ok(Some(surface)) => surface + 1,
        _ => WORLD_HEIGHT,
    };
    Point3::new(x as f32 + 0.5, y as f32, z as f32 + 0.5)
}

fn spawn_npcs(config: &EngineConfig, terrain: &Terrain) -> Vec<Npc> {
    config
        .npc
        .spawns
        .iter()
        .enumerate()
        .map(|(id, spawn)| {
            Npc::new(
                id,
                spawn_point(terrain, spawn.column),
                spawn.waypoints.clone(),
                config.npc.clone(),
            )
        })
        .collect()
}
