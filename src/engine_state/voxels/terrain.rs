//! # Terrain Module
//!
//! This module provides the `Terrain` struct, which owns every chunk of the world and
//! drives the streaming pipeline that turns chunk coordinates into uploaded meshes.
//!
//! ## Pipeline
//!
//! ```text
//! expand ─► ChunkFillTask ─► blocks-ready ─► ChunkMeshGenerationTask ─► mesh-ready ─► upload
//!  main        worker          channel             worker                channel       main
//! ```
//!
//! - `expand` creates chunks (main thread only) and dispatches one fill per new chunk.
//! - `check_thread_results` drains both channels once per tick: filled chunks are
//!   marked committed and meshed together with their committed neighbours, finished
//!   meshes are uploaded through the render backend.
//! - A chunk is filled exactly once, meshed only after it is committed, and uploaded
//!   only from the main thread.
//!
//! ## Locking
//!
//! Workers hold a chunk's lock only to swap in generated blocks or to copy blocks out
//! for meshing, never while computing. Neighbour links and the upload flag are read
//! and written on the main thread alone, so they sit in the map entry beside the lock.
//!
//! ## Stale Meshes
//!
//! Every chunk carries a revision bumped on each block mutation, and every mesh a
//! dispatch sequence number. An upload is skipped when the mesh was built from an
//! older revision than the chunk now has, or when a newer mesh of the chunk has
//! already been uploaded.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cgmath::{Matrix4, Point3, Vector3};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, trace};
use web_time::Instant;

use super::block::BlockType;
use super::chunk::{chunk_origin, Chunk, ChunkKey, ChunkNeighbor, CHUNK_WIDTH, WORLD_HEIGHT};
use super::height_field::HeightField;
use super::tasks::ChunkFillTask;
use super::VoxelLookup;
use crate::core::{MtResource, VoxelError};
use crate::engine_state::config::TerrainConfig;
use crate::engine_state::rendering::meshing::{build_chunk_mesh, ChunkMeshData};
use crate::engine_state::rendering::tasks::ChunkMeshGenerationTask;
use crate::engine_state::rendering::{MeshId, RenderBackend, RenderPass};
use crate::engine_state::task_management::TaskManager;

/// What one `check_thread_results` call did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Fill reports drained, each one newly committing a chunk.
    pub filled: usize,
    /// Mesh tasks dispatched for filled chunks and their neighbours.
    pub meshes_dispatched: usize,
    /// Meshes uploaded to the backend.
    pub uploaded: usize,
    /// Meshes dropped as stale.
    pub discarded: usize,
}

/// Main-thread entry of one chunk in the terrain map.
struct ChunkSlot {
    chunk: MtResource<Chunk>,
    /// Linked lateral neighbours, indexed by `ChunkNeighbor as usize`.
    neighbors: [Option<ChunkKey>; 4],
    /// Whether the render backend holds buffers for this chunk.
    vbo_loaded: bool,
}

impl ChunkSlot {
    fn new(chunk: MtResource<Chunk>) -> Self {
        Self {
            chunk,
            neighbors: [None; 4],
            vbo_loaded: false,
        }
    }
}

/// The sparse map of all chunks and the streaming pipeline feeding it.
pub struct Terrain {
    /// Every chunk ever created, keyed by origin. Membership doubles as the set of
    /// known origins: a key is inserted exactly when its fill is dispatched.
    chunks: HashMap<ChunkKey, ChunkSlot>,
    /// Chunks whose fill report has been drained.
    committed: HashSet<ChunkKey>,
    uploaded_sequence: HashMap<ChunkKey, u64>,
    next_sequence: u64,
    chunk_min: (i32, i32),
    chunk_max: (i32, i32),
    last_expand: Option<Instant>,
    config: TerrainConfig,
    height_field: Arc<dyn HeightField>,
    // Receivers are declared before the task manager so they drop first, which
    // unblocks any worker waiting on a full channel before the workers are joined.
    blocks_ready_rx: Receiver<ChunkKey>,
    blocks_ready_tx: Sender<ChunkKey>,
    mesh_ready_rx: Receiver<ChunkMeshData>,
    mesh_ready_tx: Sender<ChunkMeshData>,
    task_manager: TaskManager,
}

impl Terrain {
    /// Creates an empty terrain with its own worker pool.
    ///
    /// # Arguments
    /// * `config` - Streaming settings, including worker count and channel capacity
    /// * `height_field` - Terrain shape used by every fill task
    ///
    /// # Errors
    /// The spawn error if no worker thread could be started.
    pub fn new(config: TerrainConfig, height_field: Arc<dyn HeightField>) -> io::Result<Self> {
        let capacity = config.result_queue_capacity.max(1);
        let (blocks_ready_tx, blocks_ready_rx) = bounded(capacity);
        let (mesh_ready_tx, mesh_ready_rx) = bounded(capacity);
        let task_manager = TaskManager::new(config.worker_count)?;

        info!(
            "Terrain ready: half grid size {}, {} workers, result capacity {}",
            config.half_grid_size,
            task_manager.num_workers(),
            capacity
        );

        Ok(Terrain {
            chunks: HashMap::new(),
            committed: HashSet::new(),
            uploaded_sequence: HashMap::new(),
            next_sequence: 0,
            chunk_min: (0, 0),
            chunk_max: (0, 0),
            last_expand: None,
            config,
            height_field,
            blocks_ready_rx,
            blocks_ready_tx,
            mesh_ready_rx,
            mesh_ready_tx,
            task_manager,
        })
    }

    /// Sets the chunk window to the square of side `1 + 2 * half_grid_size` chunks
    /// centred on the chunk with origin `(center_x, center_z)`.
    pub fn set_chunk_min_max_xz(&mut self, center_x: i32, center_z: i32) {
        let reach = self.config.half_grid_size.max(0) * CHUNK_WIDTH;
        self.chunk_min = (center_x - reach, center_z - reach);
        self.chunk_max = (center_x + reach, center_z + reach);
    }

    /// The current chunk window as `(min origin, max origin)`, both inclusive.
    pub fn chunk_min_max_xz(&self) -> ((i32, i32), (i32, i32)) {
        (self.chunk_min, self.chunk_max)
    }

    /// Ensures every chunk in the window around the player exists.
    ///
    /// Chunks not yet known are created, linked to their neighbours and handed to a
    /// fill task. Known chunks are left alone, so repeated calls with the same
    /// position dispatch nothing.
    ///
    /// # Returns
    /// The number of fill tasks dispatched.
    pub fn expand(&mut self, player_x: f32, player_z: f32) -> usize {
        let center_x = chunk_origin(player_x.floor() as i32);
        let center_z = chunk_origin(player_z.floor() as i32);
        self.set_chunk_min_max_xz(center_x, center_z);

        let ((min_x, min_z), (max_x, max_z)) = self.chunk_min_max_xz();
        let mut created = Vec::new();
        for origin_z in (min_z..=max_z).step_by(CHUNK_WIDTH as usize) {
            for origin_x in (min_x..=max_x).step_by(CHUNK_WIDTH as usize) {
                let key = ChunkKey::from_origin(origin_x, origin_z);
                if !self.chunks.contains_key(&key) {
                    created.push(self.instantiate_chunk(key));
                }
            }
        }

        // Dispatch only after the whole batch is linked so linking never waits on a fill.
        for chunk in &created {
            self.task_manager.publish_task(Box::new(ChunkFillTask::new(
                chunk.clone(),
                Arc::clone(&self.height_field),
                self.blocks_ready_tx.clone(),
            )));
        }

        if !created.is_empty() {
            debug!(
                "Expanded around ({center_x}, {center_z}): {} fills dispatched, {} chunks known",
                created.len(),
                self.chunks.len()
            );
        }
        created.len()
    }

    /// Runs `expand` if at least `expand_interval_ms` has passed since the last pass.
    ///
    /// # Returns
    /// The number of fill tasks dispatched.
    pub fn tick(&mut self, player_x: f32, player_z: f32) -> usize {
        let interval = Duration::from_millis(self.config.expand_interval_ms);
        let due = self
            .last_expand
            .map_or(true, |last| last.elapsed() >= interval);
        if !due {
            return 0;
        }
        self.last_expand = Some(Instant::now());
        self.expand(player_x, player_z)
    }

    /// Inserts a new empty chunk and links it with its existing neighbours both ways.
    /// Takes no chunk lock, so it never waits on a worker.
    fn instantiate_chunk(&mut self, key: ChunkKey) -> MtResource<Chunk> {
        let mut slot = ChunkSlot::new(MtResource::new(Chunk::new(key)));
        for direction in ChunkNeighbor::all() {
            let neighbor_key = key.neighbor(direction);
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_key) {
                slot.neighbors[direction as usize] = Some(neighbor_key);
                neighbor.neighbors[direction.opposite() as usize] = Some(key);
            }
        }
        let handle = slot.chunk.clone();
        self.chunks.insert(key, slot);
        handle
    }

    /// Drains worker results. Must be called on the main thread, once per tick.
    ///
    /// 1. Every drained fill report commits its chunk; the chunk and its committed
    ///    neighbours are queued for meshing, each at most once.
    /// 2. Every drained mesh is uploaded through `backend` unless it is stale.
    pub fn check_thread_results(&mut self, backend: &mut dyn RenderBackend) -> DrainStats {
        let mut stats = DrainStats::default();

        let filled: Vec<ChunkKey> = self.blocks_ready_rx.try_iter().collect();
        stats.filled = filled.len();
        self.committed.extend(filled.iter().copied());

        let mut to_mesh = Vec::new();
        let mut queued = HashSet::new();
        for key in filled {
            if queued.insert(key) {
                to_mesh.push(key);
            }
            for neighbor in self.linked_neighbors(key) {
                if self.committed.contains(&neighbor) && queued.insert(neighbor) {
                    to_mesh.push(neighbor);
                }
            }
        }
        for key in to_mesh {
            if self.dispatch_mesh(key) {
                stats.meshes_dispatched += 1;
            }
        }

        let meshes: Vec<ChunkMeshData> = self.mesh_ready_rx.try_iter().collect();
        for mesh in meshes {
            if self.upload_mesh(mesh, backend) {
                stats.uploaded += 1;
            } else {
                stats.discarded += 1;
            }
        }

        if stats != DrainStats::default() {
            trace!("Drained worker results: {stats:?}");
        }
        stats
    }

    /// Keeps draining until no work is pending or `timeout` expires.
    ///
    /// # Returns
    /// `true` if the pipeline went idle.
    pub fn finish_pending(&mut self, backend: &mut dyn RenderBackend, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.check_thread_results(backend);
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// The chunk linked to `key` in `direction`, if any.
    pub fn neighbor(&self, key: ChunkKey, direction: ChunkNeighbor) -> Option<ChunkKey> {
        self.chunks.get(&key)?.neighbors[direction as usize]
    }

    fn linked_neighbors(&self, key: ChunkKey) -> Vec<ChunkKey> {
        self.chunks
            .get(&key)
            .map(|slot| slot.neighbors.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    fn committed_neighbors(&self, key: ChunkKey) -> [Option<MtResource<Chunk>>; 4] {
        let links = self.chunks.get(&key).map_or([None; 4], |slot| slot.neighbors);
        links.map(|link| {
            link.filter(|neighbor| self.committed.contains(neighbor))
                .and_then(|neighbor| self.chunks.get(&neighbor))
                .map(|slot| slot.chunk.clone())
        })
    }

    fn take_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn dispatch_mesh(&mut self, key: ChunkKey) -> bool {
        let Some(chunk) = self.chunks.get(&key).map(|slot| slot.chunk.clone()) else {
            return false;
        };
        let neighbors = self.committed_neighbors(key);
        let sequence = self.take_sequence();
        self.task_manager.publish_task(Box::new(ChunkMeshGenerationTask::new(
            chunk,
            neighbors,
            sequence,
            self.mesh_ready_tx.clone(),
        )));
        true
    }

    /// Uploads one mesh; the only place chunk buffers reach the backend.
    fn upload_mesh(&mut self, mesh: ChunkMeshData, backend: &mut dyn RenderBackend) -> bool {
        let Some(slot) = self.chunks.get_mut(&mesh.key) else {
            return false;
        };
        if self
            .uploaded_sequence
            .get(&mesh.key)
            .is_some_and(|latest| *latest > mesh.sequence)
        {
            debug!("Dropping superseded mesh of chunk {:?}", mesh.key.origin());
            return false;
        }

        let revision = slot.chunk.get().revision();
        if mesh.revision < revision {
            debug!(
                "Dropping stale mesh of chunk {:?} (revision {} < {revision})",
                mesh.key.origin(),
                mesh.revision
            );
            return false;
        }

        let id = MeshId::Chunk(mesh.key);
        backend.upload(
            id,
            RenderPass::Opaque,
            mesh.opaque.vertex_bytes(),
            mesh.opaque.index_bytes(),
        );
        backend.upload(
            id,
            RenderPass::Transparent,
            mesh.transparent.vertex_bytes(),
            mesh.transparent.index_bytes(),
        );
        slot.vbo_loaded = true;
        self.uploaded_sequence.insert(mesh.key, mesh.sequence);
        true
    }

    /// Rebuilds and uploads a committed chunk's mesh on the calling thread.
    fn remesh_now(&mut self, key: ChunkKey, backend: &mut dyn RenderBackend) -> bool {
        let Some(handle) = self.committed_chunk(key).cloned() else {
            return false;
        };
        let neighbors = self.committed_neighbors(key);
        let mut mesh = {
            let chunk = handle.get();
            let guards = neighbors.each_ref().map(|n| n.as_ref().map(MtResource::get));
            let refs = guards.each_ref().map(|g| g.as_deref());
            build_chunk_mesh(&chunk, &refs)
        };
        mesh.sequence = self.take_sequence();
        self.upload_mesh(mesh, backend)
    }

    /// Sets one block and synchronously re-meshes the chunk that owns it.
    ///
    /// Lateral neighbours are only re-meshed when `remesh_neighbors_on_edit` is set
    /// and the edit lies on the shared boundary; otherwise their boundary faces stay
    /// as they were until they are rebuilt for another reason.
    ///
    /// # Errors
    /// * `OutOfWorldBounds` if `y` is outside the world height
    /// * `ChunkNotLoaded` if the owning chunk is absent or not yet filled
    pub fn place_block_at(
        &mut self,
        position: Point3<i32>,
        block: BlockType,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), VoxelError> {
        let Point3 { x, y, z } = position;
        if !(0..WORLD_HEIGHT).contains(&y) {
            return Err(VoxelError::OutOfWorldBounds { y });
        }
        let key = ChunkKey::containing(x, z);
        let handle = self
            .committed_chunk(key)
            .cloned()
            .ok_or(VoxelError::ChunkNotLoaded { x, z })?;

        let (origin_x, origin_z) = key.origin();
        let (local_x, local_z) = (x - origin_x, z - origin_z);
        {
            let mut chunk = handle.get_mut();
            chunk.set(local_x, y, local_z, block);
            chunk.bump_revision();
        }
        self.remesh_now(key, backend);

        if self.config.remesh_neighbors_on_edit {
            for direction in boundary_directions(local_x, local_z) {
                self.remesh_now(key.neighbor(direction), backend);
            }
        }
        Ok(())
    }

    /// The block at a world position.
    ///
    /// # Errors
    /// * `OutOfWorldBounds` if `y` is outside the world height
    /// * `ChunkNotLoaded` if the owning chunk is absent or not yet filled
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Result<BlockType, VoxelError> {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return Err(VoxelError::OutOfWorldBounds { y });
        }
        let chunk = self
            .committed_chunk(ChunkKey::containing(x, z))
            .ok_or(VoxelError::ChunkNotLoaded { x, z })?;
        let block = chunk.get().get_world(x, y, z);
        block.ok_or(VoxelError::ChunkNotLoaded { x, z })
    }

    /// Height of the highest non-empty block in a world column, `None` if the column
    /// is entirely empty.
    pub fn surface_height_at(&self, x: i32, z: i32) -> Result<Option<i32>, VoxelError> {
        let key = ChunkKey::containing(x, z);
        let chunk = self
            .committed_chunk(key)
            .ok_or(VoxelError::ChunkNotLoaded { x, z })?;
        let (origin_x, origin_z) = key.origin();
        let height = chunk.get().surface_height(x - origin_x, z - origin_z);
        Ok(height)
    }

    /// Whether a chunk exists for the world column `(x, z)`, filled or not.
    pub fn has_chunk_at(&self, x: i32, z: i32) -> bool {
        self.chunks.contains_key(&ChunkKey::containing(x, z))
    }

    /// Whether the chunk for the world column `(x, z)` has committed block data.
    pub fn is_committed_at(&self, x: i32, z: i32) -> bool {
        self.committed.contains(&ChunkKey::containing(x, z))
    }

    fn committed_chunk(&self, key: ChunkKey) -> Option<&MtResource<Chunk>> {
        if !self.committed.contains(&key) {
            return None;
        }
        self.chunk(key)
    }

    /// Shared handle to a chunk, filled or not.
    pub fn chunk(&self, key: ChunkKey) -> Option<&MtResource<Chunk>> {
        self.chunks.get(&key).map(|slot| &slot.chunk)
    }

    /// Draws every chunk with loaded buffers in the given pass.
    pub fn draw(&self, backend: &mut dyn RenderBackend, pass: RenderPass) {
        for key in &self.committed {
            if !self.chunks.get(key).is_some_and(|slot| slot.vbo_loaded) {
                continue;
            }
            let (x, z) = key.origin();
            let origin = Vector3::new(x as f32, 0.0, z as f32);
            backend.draw(MeshId::Chunk(*key), Matrix4::from_translation(origin), pass);
        }
    }

    /// True when no task is in flight and both result channels are empty.
    pub fn is_idle(&self) -> bool {
        // In-flight drops only after a task has sent its result, so check it first.
        self.task_manager.tasks_in_flight() == 0
            && self.blocks_ready_rx.is_empty()
            && self.mesh_ready_rx.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// Number of chunks whose buffers are loaded in the backend.
    pub fn loaded_mesh_count(&self) -> usize {
        self.committed
            .iter()
            .filter_map(|key| self.chunks.get(key))
            .filter(|slot| slot.vbo_loaded)
            .count()
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }
}

impl VoxelLookup for Terrain {
    fn voxel_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return Some(BlockType::EMPTY);
        }
        self.block_at(x, y, z).ok()
    }
}

/// Lateral directions in which a local column touches the chunk boundary.
fn boundary_directions(local_x: i32, local_z: i32) -> Vec<ChunkNeighbor> {
    let mut directions = Vec::new();
    if local_x == 0 {
        directions.push(ChunkNeighbor::West);
    }
    if local_x == CHUNK_WIDTH - 1 {
        directions.push(ChunkNeighbor::East);
    }
    if local_z == 0 {
        directions.push(ChunkNeighbor::South);
    }
    if local_z == CHUNK_WIDTH - 1 {
        directions.push(ChunkNeighbor::North);
    }
    directions
}
