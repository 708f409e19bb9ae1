//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Generates mesh data for chunks in the background

pub mod chunk_mesh_generation_task;

pub use chunk_mesh_generation_task::ChunkMeshGenerationTask;
