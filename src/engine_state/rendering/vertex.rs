//! Vertex data structures and layouts for voxel rendering.
//!
//! This module defines the interleaved vertex format every mesh in the engine uses,
//! chunk meshes and NPC part meshes alike.

/// A vertex in the voxel rendering pipeline.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - Color: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Animated flag: u32 (4 bytes)
///
/// Total size: 48 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in chunk-local space
    pub position: [f32; 3],
    /// Outward face normal
    pub normal: [f32; 3],
    /// Material colour
    pub color: [f32; 3],
    /// UV texture coordinates (0.0-1.0 across the face)
    pub tex_coords: [f32; 2],
    /// Non-zero when the vertex shader should animate this vertex
    pub animated: u32,
}

/// Vertex attribute descriptions, `(shader_location, byte_offset, component_count)`.
///
/// # Shader Attributes
/// - `location = 0`: position (vec3<f32>)
/// - `location = 1`: normal (vec3<f32>)
/// - `location = 2`: color (vec3<f32>)
/// - `location = 3`: tex_coords (vec2<f32>)
/// - `location = 4`: animated (u32)
pub const VERTEX_ATTRIBUTES: [(u32, usize, usize); 5] = [
    (0, 0, 3),
    (1, 12, 3),
    (2, 24, 3),
    (3, 36, 2),
    (4, 44, 1),
];

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Corner position
    /// * `normal` - Outward unit normal of the face the corner belongs to
    /// * `color` - Material colour
    /// * `tex_coords` - UV coordinates of the corner
    /// * `animated` - Whether the shader should animate this vertex
    pub fn new(
        position: [f32; 3],
        normal: [f32; 3],
        color: [f32; 3],
        tex_coords: [f32; 2],
        animated: bool,
    ) -> Self {
        Vertex {
            position,
            normal,
            color,
            tex_coords,
            animated: animated as u32,
        }
    }

    /// Byte distance between consecutive vertices.
    pub const fn stride() -> usize {
        std::mem::size_of::<Vertex>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(Vertex::stride(), 48);
        let (_, last_offset, last_count) = VERTEX_ATTRIBUTES[4];
        assert_eq!(last_offset + last_count * 4, Vertex::stride());
    }

    #[test]
    fn casts_to_bytes() {
        let vertices = [Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5; 3], [0.0, 1.0], true)];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[44..48], &1u32.to_ne_bytes());
    }
}
