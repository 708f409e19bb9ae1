//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a full-height column of the world,
//! `CHUNK_WIDTH` blocks wide and deep and `WORLD_HEIGHT` blocks tall.
//!
//! ## Storage
//!
//! Blocks are stored densely, one `BlockType` per cell, at
//! `index = x + CHUNK_WIDTH * y + CHUNK_WIDTH * WORLD_HEIGHT * z`.
//!
//! A chunk holds block data only. Neighbour links and upload state are main-thread
//! bookkeeping and live in the terrain map next to the chunk's lock.
//!
//! ## Column Fill
//!
//! `generate_blocks` classifies each of the 256 columns by its surface height:
//!
//! | surface height `h`  | infill | cap    | extra                          |
//! |---------------------|--------|--------|--------------------------------|
//! | `h < SEA_LEVEL`     | DIRT   | SAND   | WATER from `h + 1` to sea level |
//! | `h < ROCK_LEVEL`    | DIRT   | GRASS  |                                |
//! | `h < SNOW_LEVEL`    | STONE  | GRAVEL |                                |
//! | otherwise           | STONE  | SNOW   |                                |
//!
//! STONE always fills `[0, min(h, STONE_LEVEL))`; infill covers the rest up to the cap.
//!
//! Generation writes into a fresh buffer that is swapped in afterwards, so a chunk's
//! lock is never held while columns are computed.

use cgmath::Point3;

use super::block::BlockType;
use super::height_field::HeightField;

pub mod chunk_key;

pub use chunk_key::{chunk_origin, to_coords, to_key, ChunkKey};

/// Width and depth of a chunk in blocks.
pub const CHUNK_WIDTH: i32 = 16;
/// Height of the world, and therefore of every chunk, in blocks.
pub const WORLD_HEIGHT: i32 = 256;
/// Number of cells in one chunk.
pub const CHUNK_SIZE: usize = (CHUNK_WIDTH * CHUNK_WIDTH * WORLD_HEIGHT) as usize;

/// Every column is stone below this height.
pub const STONE_LEVEL: i32 = 128;
/// Columns whose surface is below this height are flooded up to it.
pub const SEA_LEVEL: i32 = 136;
/// Grass gives way to rocky slopes at this height.
pub const ROCK_LEVEL: i32 = 142;
/// Rocky slopes give way to snow at this height.
pub const SNOW_LEVEL: i32 = 190;

/// The four lateral directions a chunk can have a neighbour in.
///
/// North is +Z, East is +X.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkNeighbor {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
}

impl ChunkNeighbor {
    pub fn all() -> [ChunkNeighbor; 4] {
        [
            ChunkNeighbor::North,
            ChunkNeighbor::South,
            ChunkNeighbor::East,
            ChunkNeighbor::West,
        ]
    }

    /// Offset in chunks along (X, Z).
    pub fn offset(self) -> (i32, i32) {
        match self {
            ChunkNeighbor::North => (0, 1),
            ChunkNeighbor::South => (0, -1),
            ChunkNeighbor::East => (1, 0),
            ChunkNeighbor::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> ChunkNeighbor {
        match self {
            ChunkNeighbor::North => ChunkNeighbor::South,
            ChunkNeighbor::South => ChunkNeighbor::North,
            ChunkNeighbor::East => ChunkNeighbor::West,
            ChunkNeighbor::West => ChunkNeighbor::East,
        }
    }
}

/// Surface classification of a single column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnBiome {
    Underwater,
    Grass,
    Rocky,
    Snowy,
}

impl ColumnBiome {
    pub fn classify(surface: i32) -> Self {
        if surface < SEA_LEVEL {
            ColumnBiome::Underwater
        } else if surface < ROCK_LEVEL {
            ColumnBiome::Grass
        } else if surface < SNOW_LEVEL {
            ColumnBiome::Rocky
        } else {
            ColumnBiome::Snowy
        }
    }

    /// `(infill, cap)` materials for this biome.
    pub fn materials(self) -> (BlockType, BlockType) {
        match self {
            ColumnBiome::Underwater => (BlockType::DIRT, BlockType::SAND),
            ColumnBiome::Grass => (BlockType::DIRT, BlockType::GRASS),
            ColumnBiome::Rocky => (BlockType::STONE, BlockType::GRAVEL),
            ColumnBiome::Snowy => (BlockType::STONE, BlockType::SNOW),
        }
    }
}

/// A full-height column of the voxel world.
#[derive(Clone)]
pub struct Chunk {
    /// Key of this chunk in the terrain map.
    pub key: ChunkKey,

    /// World-space position of the chunk's minimum corner (`y` is always 0).
    pub origin: Point3<i32>,

    /// Dense block storage, see the module docs for the index layout.
    pub blocks: Vec<BlockType>,

    revision: u64,
}

impl Chunk {
    /// Creates a chunk filled with `EMPTY` blocks.
    pub fn new(key: ChunkKey) -> Self {
        let (x, z) = key.origin();
        Self {
            key,
            origin: Point3::new(x, 0, z),
            blocks: vec![BlockType::EMPTY; CHUNK_SIZE],
            revision: 0,
        }
    }

    /// Maps local coordinates to a storage index, `None` when out of range.
    pub fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        if !(0..CHUNK_WIDTH).contains(&x)
            || !(0..WORLD_HEIGHT).contains(&y)
            || !(0..CHUNK_WIDTH).contains(&z)
        {
            return None;
        }
        Some((x + CHUNK_WIDTH * y + CHUNK_WIDTH * WORLD_HEIGHT * z) as usize)
    }

    /// Reads a block by local coordinates.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        Self::index(x, y, z).map(|i| self.blocks[i])
    }

    /// Writes a block by local coordinates. Returns false if out of range.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        match Self::index(x, y, z) {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    /// Reads a block by world coordinates, `None` if the position is not in this chunk.
    pub fn get_world(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        self.get(x - self.origin.x, y, z - self.origin.z)
    }

    /// Monotonic counter bumped on every block mutation after creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Highest non-empty cell in a local column.
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        (0..WORLD_HEIGHT)
            .rev()
            .find(|y| self.get(x, *y, z).is_some_and(|b| !b.is_empty()))
    }

    /// Swaps in a generated block buffer and bumps the revision.
    pub fn replace_blocks(&mut self, blocks: Vec<BlockType>) {
        debug_assert_eq!(blocks.len(), CHUNK_SIZE);
        self.blocks = blocks;
        self.bump_revision();
    }

    /// Generates the blocks of the chunk at `key` without touching any chunk.
    ///
    /// The height field is sampled exactly once per column.
    pub fn generate_blocks(key: ChunkKey, height_field: &dyn HeightField) -> Vec<BlockType> {
        let mut blocks = vec![BlockType::EMPTY; CHUNK_SIZE];
        let (origin_x, origin_z) = key.origin();
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let world_x = origin_x + x;
                let world_z = origin_z + z;
                let surface = height_field.height(world_x, world_z).floor();
                let surface = (surface as i32).clamp(0, WORLD_HEIGHT - 1);
                let column = ColumnWriter {
                    blocks: &mut blocks,
                    x,
                    z,
                };
                column.fill(world_x, world_z, surface, height_field);
            }
        }
        blocks
    }
}

/// Writes the cells of one local column into a block buffer.
struct ColumnWriter<'a> {
    blocks: &'a mut [BlockType],
    x: i32,
    z: i32,
}

impl ColumnWriter<'_> {
    fn set(&mut self, y: i32, block: BlockType) {
        if let Some(i) = Chunk::index(self.x, y, self.z) {
            self.blocks[i] = block;
        }
    }

    fn fill(mut self, world_x: i32, world_z: i32, surface: i32, height_field: &dyn HeightField) {
        let biome = ColumnBiome::classify(surface);
        let (infill, cap) = biome.materials();
        let stone_top = surface.min(STONE_LEVEL);

        for y in 0..stone_top {
            self.set(y, BlockType::STONE);
        }
        for y in stone_top..surface {
            self.set(y, infill);
        }
        self.set(surface, cap);

        if biome == ColumnBiome::Underwater {
            for y in (surface + 1)..SEA_LEVEL {
                self.set(y, BlockType::WATER);
            }
            // Keep sea beds sealed so water never drains into caves.
            return;
        }

        for y in 1..surface {
            if height_field.is_cave(world_x, y, world_z, surface) {
                self.set(y, BlockType::EMPTY);
            }
        }
    }
}
