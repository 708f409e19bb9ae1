//! # Chunk Keys
//!
//! Chunks are addressed by the world coordinates of their origin column. Both
//! components are multiples of [`CHUNK_WIDTH`](super::CHUNK_WIDTH) and are packed into
//! a single 64-bit key: the high 32 bits hold X, the low 32 bits hold Z.

use super::{ChunkNeighbor, CHUNK_WIDTH};

/// Packs a chunk origin into a 64-bit key.
///
/// Z is reinterpreted as unsigned before widening so its sign bit never bleeds into
/// the X half.
pub fn to_key(x: i32, z: i32) -> i64 {
    ((x as i64) << 32) | (z as u32 as i64)
}

/// Unpacks a key produced by [`to_key`]. Truncating casts restore the sign of both
/// halves.
pub fn to_coords(key: i64) -> (i32, i32) {
    ((key >> 32) as i32, key as i32)
}

/// Returns the origin of the chunk containing world coordinate `v` along one axis.
///
/// Uses floor division, so `-1` maps to `-16` rather than `0`.
pub fn chunk_origin(v: i32) -> i32 {
    v.div_euclid(CHUNK_WIDTH) * CHUNK_WIDTH
}

/// Identifies one chunk column in the terrain map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(i64);

impl ChunkKey {
    /// Key for the chunk whose origin is exactly `(x, z)`.
    pub fn from_origin(x: i32, z: i32) -> Self {
        ChunkKey(to_key(x, z))
    }

    /// Key for the chunk containing the world column `(x, z)`.
    pub fn containing(x: i32, z: i32) -> Self {
        ChunkKey::from_origin(chunk_origin(x), chunk_origin(z))
    }

    /// World X and Z of the chunk origin.
    pub fn origin(self) -> (i32, i32) {
        to_coords(self.0)
    }

    /// Key of the lateral neighbour in the given direction.
    pub fn neighbor(self, direction: ChunkNeighbor) -> Self {
        let (x, z) = self.origin();
        let (dx, dz) = direction.offset();
        ChunkKey::from_origin(
            x.wrapping_add(dx * CHUNK_WIDTH),
            z.wrapping_add(dz * CHUNK_WIDTH),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_for_aligned_origins() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let mut samples = vec![
            (0, 0),
            (-16, 16),
            (i32::MIN, i32::MIN),
            (chunk_origin(i32::MAX), chunk_origin(i32::MAX)),
            (i32::MIN, chunk_origin(i32::MAX)),
        ];
        for _ in 0..1000 {
            samples.push((chunk_origin(rng.i32(..)), chunk_origin(rng.i32(..))));
        }

        for (x, z) in samples {
            assert_eq!(to_coords(to_key(x, z)), (x, z));
            assert_eq!(ChunkKey::from_origin(x, z).origin(), (x, z));
        }
    }

    #[test]
    fn origin_uses_floor_division() {
        assert_eq!(chunk_origin(-17), -32);
        assert_eq!(chunk_origin(-16), -16);
        assert_eq!(chunk_origin(-1), -16);
        assert_eq!(chunk_origin(0), 0);
        assert_eq!(chunk_origin(15), 0);
        assert_eq!(chunk_origin(16), 16);
    }

    #[test]
    fn neighbors_are_one_chunk_apart() {
        let key = ChunkKey::from_origin(-16, 32);
        assert_eq!(key.neighbor(ChunkNeighbor::North).origin(), (-16, 48));
        assert_eq!(key.neighbor(ChunkNeighbor::South).origin(), (-16, 16));
        assert_eq!(key.neighbor(ChunkNeighbor::East).origin(), (0, 32));
        assert_eq!(key.neighbor(ChunkNeighbor::West).origin(), (-32, 32));
    }
}
