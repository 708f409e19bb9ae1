//! Rendering system for the voxel engine.
//!
//! The engine never talks to a graphics API directly. Everything it renders goes
//! through a [`RenderBackend`]: a handle that accepts vertex and index byte uploads
//! and draws previously uploaded meshes with a model transform in either the opaque
//! or the transparent pass. Windowing, shaders and textures live behind that trait.
//!
//! Backends are only ever called from the main thread; mesh workers produce plain
//! [`ChunkMeshData`](meshing::ChunkMeshData) values and never touch them.

use std::collections::HashMap;

use cgmath::Matrix4;

use super::voxels::chunk::ChunkKey;

pub mod meshing;
pub mod tasks;
mod vertex;

// Re-export commonly used types
pub use vertex::{Vertex, VERTEX_ATTRIBUTES};

/// Which of the two passes a mesh is drawn in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Depth-tested, non-blended geometry, drawn first.
    Opaque,
    /// Blended geometry, drawn after all opaque geometry.
    Transparent,
}

/// Identifies an uploaded mesh inside a backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshId {
    /// Terrain mesh of one chunk.
    Chunk(ChunkKey),
    /// Shared mesh of one NPC body part material.
    Part(u32),
}

/// The graphics collaborator the engine renders through.
pub trait RenderBackend {
    /// Replaces the buffers stored for `(mesh, pass)`.
    ///
    /// `vertices` holds tightly packed [`Vertex`] values, `indices` holds `u32`
    /// triangle indices.
    fn upload(&mut self, mesh: MeshId, pass: RenderPass, vertices: &[u8], indices: &[u8]);

    /// Draws the buffers stored for `(mesh, pass)` with the given model transform.
    fn draw(&mut self, mesh: MeshId, model: Matrix4<f32>, pass: RenderPass);
}

/// Size of one uploaded buffer pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadedMesh {
    pub vertex_bytes: usize,
    pub index_bytes: usize,
}

impl UploadedMesh {
    pub fn index_count(&self) -> usize {
        self.index_bytes / std::mem::size_of::<u32>()
    }
}

/// Headless backend that records uploads and draws instead of rendering them.
///
/// Used by the binary when no window is attached, and by tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    meshes: HashMap<(MeshId, RenderPass), UploadedMesh>,
    upload_count: usize,
    draws: Vec<(MeshId, RenderPass)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, mesh: MeshId, pass: RenderPass) -> Option<&UploadedMesh> {
        self.meshes.get(&(mesh, pass))
    }

    /// Total number of `upload` calls received.
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }

    /// Draw calls recorded since the last `clear_draws`.
    pub fn draws(&self) -> &[(MeshId, RenderPass)] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn upload(&mut self, mesh: MeshId, pass: RenderPass, vertices: &[u8], indices: &[u8]) {
        self.upload_count += 1;
        self.meshes.insert(
            (mesh, pass),
            UploadedMesh {
                vertex_bytes: vertices.len(),
                index_bytes: indices.len(),
            },
        );
    }

    fn draw(&mut self, mesh: MeshId, _model: Matrix4<f32>, pass: RenderPass) {
        self.draws.push((mesh, pass));
    }
}
