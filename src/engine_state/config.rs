//! # Engine Configuration
//!
//! All tunables of the engine, deserialised from JSON with `serde`. Every field has a
//! default, so a config file only needs to name what it changes:
//!
//! ```json
//! { "terrain": { "half_grid_size": 6 }, "path_finder": { "cost_model": "heuristic" } }
//! ```

use std::path::Path;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;
use crate::engine_state::navigation::CostModel;

/// Top-level configuration of an engine session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub terrain: TerrainConfig,
    pub path_finder: PathFinderConfig,
    pub npc: NpcConfig,
    pub player: PlayerConfig,
}

impl EngineConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Terrain streaming settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunks kept around the player's chunk in each direction.
    pub half_grid_size: i32,
    /// Minimum time between two expansion passes.
    pub expand_interval_ms: u64,
    /// Number of terrain worker threads.
    pub worker_count: usize,
    /// Capacity of each worker result channel.
    pub result_queue_capacity: usize,
    /// Also re-mesh lateral neighbours when an edit touches a chunk boundary.
    pub remesh_neighbors_on_edit: bool,
    /// Seed of the noise height field.
    pub seed: u32,
}

fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            half_grid_size: 4,
            expand_interval_ms: 250,
            worker_count: default_worker_count(),
            result_queue_capacity: 256,
            remesh_neighbors_on_edit: false,
            seed: 1337,
        }
    }
}

/// NPC path search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFinderConfig {
    /// Horizontal half-size of the search window, in blocks.
    pub radius: i32,
    /// Vertical half-size of the search window, in blocks.
    pub vertical_radius: i32,
    pub cost_model: CostModel,
    /// Explore one-block step-ups, emitted as jumps.
    pub allow_jumps: bool,
    /// Horizontal distance at which a goal counts as reached.
    pub goal_tolerance: f32,
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        Self {
            radius: 16,
            vertical_radius: 16,
            cost_model: CostModel::Accumulated,
            allow_jumps: true,
            goal_tolerance: 0.5,
        }
    }
}

/// Where an NPC spawns and which columns it patrols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSpawn {
    /// World column `[x, z]` of the spawn point.
    pub column: [i32; 2],
    /// Patrol columns, visited back and forth. Empty means chase the player.
    #[serde(default)]
    pub waypoints: Vec<[i32; 2]>,
}

/// NPC movement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    pub walk_speed: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    /// Horizontal distance at which an action's destination counts as reached.
    pub arrival_tolerance: f32,
    /// Length of the window the stuck detector compares positions over.
    pub stuck_window_secs: f32,
    /// Minimum travel per window before an NPC counts as stuck.
    pub stuck_epsilon: f32,
    /// Stuck NPCs closer than this to their goal are left alone.
    pub stuck_goal_distance: f32,
    /// Base delay before replanning after an empty search result.
    pub replan_cooldown_secs: f32,
    pub spawns: Vec<NpcSpawn>,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            gravity: 20.0,
            jump_speed: 7.0,
            arrival_tolerance: 0.2,
            stuck_window_secs: 4.0,
            stuck_epsilon: 0.5,
            stuck_goal_distance: 2.0,
            replan_cooldown_secs: 0.5,
            spawns: vec![
                NpcSpawn {
                    column: [8, 24],
                    waypoints: Vec::new(),
                },
                NpcSpawn {
                    column: [-20, 4],
                    waypoints: vec![[-20, 4], [-4, 12], [4, -12]],
                },
            ],
        }
    }
}

/// Player movement and interaction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub walk_speed: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    /// Maximum distance at which blocks can be targeted.
    pub reach: f32,
    /// Radians of rotation per unit of mouse movement.
    pub mouse_sensitivity: f32,
    /// World column `[x, z]` the player spawns above.
    pub spawn_column: [i32; 2],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            gravity: 20.0,
            jump_speed: 7.5,
            reach: 6.0,
            mouse_sensitivity: 0.002,
            spawn_column: [0, 0],
        }
    }
}
