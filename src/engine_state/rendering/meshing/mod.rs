//! Mesh generation for voxel rendering.
//!
//! This module converts chunk block data into interleaved vertex/index buffers ready
//! for upload. Every visible block face becomes one quad (4 vertices, 2 triangles).
//!
//! # Face Culling
//! A face is emitted only if the cell it looks at is
//! - absent (outside the world, or in a chunk that is not available),
//! - `EMPTY`, or
//! - transparent and of a different type than the block itself.
//!
//! # Passes
//! Faces of transparent blocks go to a separate stream so the renderer can draw
//! them in a second, blended pass after all opaque geometry.

use cgmath::Point3;

use crate::engine_state::voxels::block::{BlockSide, BlockType};
use crate::engine_state::voxels::chunk::{Chunk, ChunkKey, ChunkNeighbor, CHUNK_WIDTH, WORLD_HEIGHT};

mod face;

pub use face::Face;

/// Vertex and index data for one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<super::Vertex>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Mesh of one chunk, as produced by a mesh task.
///
/// Consumed exactly once by the upload step, then dropped.
#[derive(Debug, Clone)]
pub struct ChunkMeshData {
    /// The chunk this mesh describes
    pub key: ChunkKey,
    /// Chunk revision the mesh was built from
    pub revision: u64,
    /// Dispatch order among meshes of the same terrain, newer meshes win
    pub sequence: u64,
    pub opaque: MeshBuffers,
    pub transparent: MeshBuffers,
}

/// Neighbouring chunks consulted for culling faces on the chunk boundary,
/// indexed by `ChunkNeighbor as usize`.
pub type NeighborChunks<'a> = [Option<&'a Chunk>; 4];

/// Looks up the block a face of `chunk` at local `(x, y, z)` looks at, crossing into
/// a neighbour chunk when the coordinate leaves the chunk laterally.
fn adjacent_block(
    chunk: &Chunk,
    neighbors: &NeighborChunks<'_>,
    x: i32,
    y: i32,
    z: i32,
) -> Option<BlockType> {
    if !(0..WORLD_HEIGHT).contains(&y) {
        return None;
    }
    let direction = if x < 0 {
        ChunkNeighbor::West
    } else if x >= CHUNK_WIDTH {
        ChunkNeighbor::East
    } else if z < 0 {
        ChunkNeighbor::South
    } else if z >= CHUNK_WIDTH {
        ChunkNeighbor::North
    } else {
        return chunk.get(x, y, z);
    };
    neighbors[direction as usize]?.get(x.rem_euclid(CHUNK_WIDTH), y, z.rem_euclid(CHUNK_WIDTH))
}

/// Whether a face of `block` looking at `adjacent` is visible.
fn is_face_visible(block: BlockType, adjacent: Option<BlockType>) -> bool {
    match adjacent {
        None => true,
        Some(other) => other.is_empty() || (other.is_transparent() && other != block),
    }
}

/// Builds the opaque and transparent meshes of a chunk.
///
/// # Arguments
/// * `chunk` - The chunk to mesh; its blocks must not be written concurrently
/// * `neighbors` - Committed lateral neighbours, `None` where unavailable
pub fn build_chunk_mesh(chunk: &Chunk, neighbors: &NeighborChunks<'_>) -> ChunkMeshData {
    let mut opaque = MeshBuffers::default();
    let mut transparent = MeshBuffers::default();

    for z in 0..CHUNK_WIDTH {
        for y in 0..WORLD_HEIGHT {
            for x in 0..CHUNK_WIDTH {
                let block = match chunk.get(x, y, z) {
                    Some(block) if !block.is_empty() => block,
                    _ => continue,
                };
                let target = if block.is_transparent() {
                    &mut transparent
                } else {
                    &mut opaque
                };
                for side in BlockSide::all() {
                    let offset = side.offset();
                    let adjacent =
                        adjacent_block(chunk, neighbors, x + offset.x, y + offset.y, z + offset.z);
                    if is_face_visible(block, adjacent) {
                        Face::new(Point3::new(x as f32, y as f32, z as f32), block, side)
                            .append_to(target);
                    }
                }
            }
        }
    }

    ChunkMeshData {
        key: chunk.key,
        revision: chunk.revision(),
        sequence: 0,
        opaque,
        transparent,
    }
}

/// Builds a unit cube of one material centred on the origin, used for NPC body parts.
pub fn build_block_mesh(block: BlockType) -> MeshBuffers {
    let mut buffers = MeshBuffers::default();
    for side in BlockSide::all() {
        Face::new(Point3::new(-0.5, -0.5, -0.5), block, side).append_to(&mut buffers);
    }
    buffers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with(blocks: &[((i32, i32, i32), BlockType)]) -> Chunk {
        let mut chunk = Chunk::new(ChunkKey::from_origin(0, 0));
        for ((x, y, z), block) in blocks {
            chunk.set(*x, *y, *z, *block);
        }
        chunk
    }

    #[test]
    fn single_block_emits_six_quads() {
        let chunk = chunk_with(&[((8, 100, 8), BlockType::STONE)]);
        let mesh = build_chunk_mesh(&chunk, &[None; 4]);

        assert_eq!(mesh.opaque.quad_count(), 6);
        assert_eq!(mesh.opaque.vertices.len(), 24);
        assert_eq!(mesh.opaque.indices.len(), 36);
        assert!(mesh.transparent.is_empty());
    }

    #[test]
    fn touching_blocks_hide_their_shared_faces() {
        let chunk = chunk_with(&[((8, 100, 8), BlockType::STONE), ((9, 100, 8), BlockType::DIRT)]);
        let mesh = build_chunk_mesh(&chunk, &[None; 4]);

        assert_eq!(mesh.opaque.quad_count(), 10);
    }

    #[test]
    fn water_goes_to_the_transparent_stream() {
        let chunk = chunk_with(&[((2, 50, 2), BlockType::WATER), ((3, 50, 2), BlockType::WATER)]);
        let mesh = build_chunk_mesh(&chunk, &[None; 4]);

        assert!(mesh.opaque.is_empty());
        // Adjacent water of the same type shares no faces.
        assert_eq!(mesh.transparent.quad_count(), 10);
        assert!(mesh.transparent.vertices.iter().all(|v| v.animated == 1));
    }

    #[test]
    fn solid_faces_show_through_water() {
        let chunk = chunk_with(&[((2, 50, 2), BlockType::SAND), ((2, 51, 2), BlockType::WATER)]);
        let mesh = build_chunk_mesh(&chunk, &[None; 4]);

        assert_eq!(mesh.opaque.quad_count(), 6);
        // The water's bottom face is hidden by the opaque sand.
        assert_eq!(mesh.transparent.quad_count(), 5);
    }

    #[test]
    fn indices_reference_their_own_quad() {
        let chunk = chunk_with(&[((0, 0, 0), BlockType::GRASS)]);
        let mesh = build_chunk_mesh(&chunk, &[None; 4]);

        for (quad, indices) in mesh.opaque.indices.chunks(6).enumerate() {
            let base = quad as u32 * 4;
            assert_eq!(indices, [base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    #[test]
    fn block_mesh_is_a_centred_cube() {
        let mesh = build_block_mesh(BlockType::NPC_SKIN);
        assert_eq!(mesh.quad_count(), 6);
        for vertex in &mesh.vertices {
            assert!(vertex.position.iter().all(|c| c.abs() == 0.5));
        }
    }
}
