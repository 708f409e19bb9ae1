//! # Voxel Engine Core
//!
//! This module contains the voxel world itself and the algorithms that read it.
//!
//! ## Architecture
//!
//! * **Block**: block types and block face geometry
//! * **Chunk**: full-height 16x16 columns of blocks, addressed by packed origin keys
//! * **HeightField**: the terrain shape, a pure function of the world column
//! * **Terrain**: the sparse chunk map and the fill, mesh, upload pipeline
//! * **RayMarch**: grid traversal shared by collision probes and block targeting
//! * **Tasks**: background chunk fills
//!
//! ## Data Flow
//!
//! 1. Terrain receives the player position and creates chunks around it
//! 2. Fill tasks populate blocks on worker threads and report their keys
//! 3. The main thread marks filled chunks committed and dispatches mesh tasks
//! 4. Finished meshes are uploaded to the render backend on the main thread
//!
//! ## Thread Safety
//!
//! * The chunk map is only mutated on the main thread
//! * A chunk is written by its fill task, then only read until an explicit edit,
//!   which runs on the main thread
//! * Readers outside the pipeline go through [`VoxelLookup`], which only sees
//!   committed chunks

use block::BlockType;

pub mod block;
pub mod chunk;
pub mod height_field;
pub mod ray_march;
pub mod tasks;
pub mod terrain;

/// Read access to committed voxel data.
pub trait VoxelLookup {
    /// The block at a world position.
    ///
    /// Returns `None` when the position lies in a chunk that does not exist or has
    /// not finished filling. Positions above or below the world read as `EMPTY`.
    fn voxel_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType>;
}
