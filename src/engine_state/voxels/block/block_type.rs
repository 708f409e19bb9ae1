//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! Block types carry no per-instance state; everything instance-specific is implied by
//! the slot a block occupies inside its chunk.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::{block_side::BlockSide, BlockTypeSize};

/// Enumerates all possible block types in the voxel world.
///
/// The set is closed and falls into four groups: `EMPTY`, terrain materials, liquid
/// materials, and the materials NPC body parts are drawn with. The `FromPrimitive`
/// derive allows conversion from the compact integer id.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Air. Never rendered, never collides.
    #[default]
    EMPTY = 0,
    /// Grass-capped surface block.
    GRASS,
    /// Dirt infill under grass.
    DIRT,
    /// Bedrock-like base of every column.
    STONE,
    /// Beach and sea-floor cap.
    SAND,
    /// Cap of snowy peaks.
    SNOW,
    /// Cap of rocky slopes.
    GRAVEL,
    /// Transparent, animated liquid.
    WATER,
    /// NPC head and hands.
    NPC_SKIN,
    /// NPC torso and arms.
    NPC_SHIRT,
    /// NPC legs.
    NPC_TROUSERS,
    /// NPC hair.
    NPC_HAIR,
}

/// Blocks the player can cycle through and place, in hotbar order.
const PLACEABLE_BLOCKS: [BlockType; 6] = [
    BlockType::GRASS,
    BlockType::DIRT,
    BlockType::STONE,
    BlockType::SAND,
    BlockType::SNOW,
    BlockType::GRAVEL,
];

impl BlockType {
    /// Converts a compact id back into a block type, `None` for unknown ids.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    /// The compact id of this block type.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    pub fn is_empty(self) -> bool {
        self == BlockType::EMPTY
    }

    /// Transparent blocks are meshed into the blended pass and do not hide the faces
    /// of differing neighbours.
    pub fn is_transparent(self) -> bool {
        matches!(self, BlockType::EMPTY | BlockType::WATER)
    }

    pub fn is_liquid(self) -> bool {
        self == BlockType::WATER
    }

    /// Liquids are not solid: agents fall through them and rays pass them by.
    pub fn is_solid(self) -> bool {
        !self.is_empty() && !self.is_liquid()
    }

    /// Whether the vertex shader should animate faces of this block.
    pub fn is_animated(self) -> bool {
        self.is_liquid()
    }

    /// The default set of materials NPCs are allowed to stand on.
    pub fn is_walkable(self) -> bool {
        matches!(
            self,
            BlockType::GRASS
                | BlockType::DIRT
                | BlockType::STONE
                | BlockType::SAND
                | BlockType::SNOW
                | BlockType::GRAVEL
        )
    }

    /// Returns the next placeable block after this one, wrapping around.
    ///
    /// Non-placeable blocks restart the cycle at the first placeable block.
    pub fn next_placeable(self) -> Self {
        match PLACEABLE_BLOCKS.iter().position(|b| *b == self) {
            Some(i) => PLACEABLE_BLOCKS[(i + 1) % PLACEABLE_BLOCKS.len()],
            None => PLACEABLE_BLOCKS[0],
        }
    }

    /// Returns the previous placeable block before this one, wrapping around.
    pub fn prev_placeable(self) -> Self {
        match PLACEABLE_BLOCKS.iter().position(|b| *b == self) {
            Some(i) => PLACEABLE_BLOCKS[(i + PLACEABLE_BLOCKS.len() - 1) % PLACEABLE_BLOCKS.len()],
            None => PLACEABLE_BLOCKS[0],
        }
    }

    /// Material colour for a given face. Top faces of capped blocks differ from
    /// their sides.
    pub fn color(self, side: BlockSide) -> [f32; 3] {
        let (top, sides, bottom) = match self {
            BlockType::EMPTY => ([0.0; 3], [0.0; 3], [0.0; 3]),
            BlockType::GRASS => ([0.30, 0.65, 0.20], [0.45, 0.35, 0.20], [0.45, 0.32, 0.18]),
            BlockType::DIRT => ([0.45, 0.32, 0.18], [0.45, 0.32, 0.18], [0.45, 0.32, 0.18]),
            BlockType::STONE => ([0.50, 0.50, 0.52], [0.48, 0.48, 0.50], [0.46, 0.46, 0.48]),
            BlockType::SAND => ([0.85, 0.80, 0.55], [0.82, 0.77, 0.52], [0.80, 0.75, 0.50]),
            BlockType::SNOW => ([0.95, 0.97, 1.00], [0.90, 0.92, 0.95], [0.88, 0.90, 0.93]),
            BlockType::GRAVEL => ([0.55, 0.52, 0.48], [0.52, 0.49, 0.45], [0.50, 0.47, 0.43]),
            BlockType::WATER => ([0.15, 0.35, 0.75], [0.12, 0.30, 0.70], [0.10, 0.25, 0.65]),
            BlockType::NPC_SKIN => ([0.93, 0.76, 0.62], [0.90, 0.72, 0.58], [0.88, 0.70, 0.55]),
            BlockType::NPC_SHIRT => ([0.20, 0.40, 0.70], [0.18, 0.36, 0.66], [0.16, 0.33, 0.60]),
            BlockType::NPC_TROUSERS => ([0.25, 0.22, 0.35], [0.22, 0.20, 0.32], [0.20, 0.18, 0.30]),
            BlockType::NPC_HAIR => ([0.30, 0.20, 0.10], [0.28, 0.18, 0.09], [0.26, 0.17, 0.08]),
        };
        match side {
            BlockSide::TOP => top,
            BlockSide::BOTTOM => bottom,
            _ => sides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for id in 0..=BlockType::NPC_HAIR.id() {
            let block = BlockType::from_id(id).expect("every id up to the last variant is valid");
            assert_eq!(block.id(), id);
        }
        assert_eq!(BlockType::from_id(200), None);
    }

    #[test]
    fn water_is_transparent_but_not_solid() {
        assert!(BlockType::WATER.is_transparent());
        assert!(!BlockType::WATER.is_solid());
        assert!(!BlockType::WATER.is_walkable());
        assert!(BlockType::STONE.is_solid());
        assert!(!BlockType::STONE.is_transparent());
    }

    #[test]
    fn placeable_cycle_wraps_both_ways() {
        assert_eq!(BlockType::GRAVEL.next_placeable(), BlockType::GRASS);
        assert_eq!(BlockType::GRASS.prev_placeable(), BlockType::GRAVEL);
        assert_eq!(BlockType::WATER.next_placeable(), BlockType::GRASS);
    }

    #[test]
    fn deserializes_lowercase_names() {
        let parsed: Vec<BlockType> = serde_json::from_str(r#"["grass", "npc_skin"]"#).unwrap();
        assert_eq!(parsed, vec![BlockType::GRASS, BlockType::NPC_SKIN]);
    }
}
