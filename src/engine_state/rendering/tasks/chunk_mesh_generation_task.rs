//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `ChunkMeshGenerationTask` which builds the vertex and
//! index data of one chunk off the main thread. The finished `ChunkMeshData` is sent
//! over the mesh-ready channel; uploading it is left to the main thread.
//!
//! The chunk and its neighbours are copied out under their read locks and meshed from
//! the copies, so an edit on the main thread never waits for a mesh to finish.

use crossbeam_channel::Sender;
use log::trace;

use crate::{
    core::MtResource,
    engine_state::{
        rendering::meshing::{build_chunk_mesh, ChunkMeshData},
        task_management::task::Task,
        voxels::chunk::Chunk,
    },
};

/// A task that generates mesh data for a chunk in a background thread.
///
/// The chunk and every neighbour handed to the task must have committed block data:
/// mesh tasks only ever read.
pub struct ChunkMeshGenerationTask {
    /// The chunk that needs mesh generation
    chunk: MtResource<Chunk>,
    /// Committed lateral neighbours, indexed by `ChunkNeighbor as usize`
    neighbors: [Option<MtResource<Chunk>>; 4],
    /// Dispatch sequence stamped on the finished mesh
    sequence: u64,
    /// Where the finished mesh goes
    mesh_ready: Sender<ChunkMeshData>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `chunk` - The chunk that needs mesh generation
    /// * `neighbors` - Committed neighbours consulted for boundary face culling
    /// * `sequence` - Dispatch sequence number of this mesh
    /// * `mesh_ready` - Sender half of the mesh-ready stage channel
    pub fn new(
        chunk: MtResource<Chunk>,
        neighbors: [Option<MtResource<Chunk>>; 4],
        sequence: u64,
        mesh_ready: Sender<ChunkMeshData>,
    ) -> Self {
        ChunkMeshGenerationTask {
            chunk,
            neighbors,
            sequence,
            mesh_ready,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(self: Box<Self>) {
        let chunk = self.chunk.get().clone();
        let neighbors = self
            .neighbors
            .each_ref()
            .map(|n| n.as_ref().map(|handle| handle.get().clone()));
        let mut mesh = build_chunk_mesh(&chunk, &neighbors.each_ref().map(Option::as_ref));
        mesh.sequence = self.sequence;

        trace!(
            "Meshed chunk {:?}: {} opaque / {} transparent quads",
            mesh.key.origin(),
            mesh.opaque.quad_count(),
            mesh.transparent.quad_count()
        );

        // A closed channel means the terrain is shutting down.
        let _ = self.mesh_ready.send(mesh);
    }

    fn name(&self) -> &'static str {
        "chunk mesh"
    }
}
