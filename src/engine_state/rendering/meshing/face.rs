use cgmath::Point3;

use super::MeshBuffers;
use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::block::{BlockSide, BlockType};

/// UV coordinates of the four face corners, in `BlockSide::corners` order.
const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Triangle indices of a quad relative to its first vertex.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Represents a single visible quad face of a voxel in the mesh.
///
/// A face is anchored at the minimum corner of its block and knows which side of
/// the block it covers; the corner positions follow from the side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Minimum corner of the block, in the mesh's local space
    pub position: Point3<f32>,
    /// The block type, used for colour and animation
    pub block: BlockType,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates a new face for a voxel at the given coordinates.
    ///
    /// # Arguments
    /// * `position` - Minimum corner of the voxel in mesh space
    /// * `block` - The type of the block
    /// * `block_side` - Which side of the block this face represents
    pub fn new(position: Point3<f32>, block: BlockType, block_side: BlockSide) -> Self {
        Face {
            position,
            block,
            block_side,
        }
    }

    /// The four corner vertices, counter-clockwise seen from outside.
    pub fn vertices(&self) -> [Vertex; 4] {
        let normal = self.block_side.normal();
        let color = self.block.color(self.block_side);
        let animated = self.block.is_animated();
        let corners = self.block_side.corners();

        std::array::from_fn(|i| {
            let [cx, cy, cz] = corners[i];
            Vertex::new(
                [
                    self.position.x + cx,
                    self.position.y + cy,
                    self.position.z + cz,
                ],
                normal,
                color,
                CORNER_UVS[i],
                animated,
            )
        })
    }

    /// Appends the quad's 4 vertices and 6 indices to `buffers`.
    pub fn append_to(&self, buffers: &mut MeshBuffers) {
        let base = buffers.vertices.len() as u32;
        buffers.vertices.extend_from_slice(&self.vertices());
        buffers
            .indices
            .extend(QUAD_INDICES.iter().map(|offset| base + offset));
    }
}
