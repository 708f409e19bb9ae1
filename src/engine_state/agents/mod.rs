//! # Agents
//!
//! Everything that moves through the voxel world: the player and the NPCs.
//!
//! Both kinds of agent resolve collisions with short ray marches instead of volume
//! tests. A body is a vertical column of `BODY_RADIUS` around its feet position; the
//! sweeps below move it as far as the marches allow.

use cgmath::{InnerSpace, Point3, Vector3};

use super::voxels::ray_march::{grid_march, LiquidCell, UnknownCell};
use super::voxels::VoxelLookup;
use crate::core::VoxelError;

pub mod npc;
pub mod player;
pub mod transform_node;

pub use npc::{Npc, NpcState, RIG_MATERIALS};
pub use player::{BlockEdit, Player};
pub use transform_node::{Transform, TransformNode};

/// Horizontal half-extent of an agent body.
pub const BODY_RADIUS: f32 = 0.3;

/// Ground probes start this far above the feet, so a body resting on a block top
/// does not start inside the block.
const PROBE_LIFT: f32 = 0.5;

/// Extra probe length so a resting body keeps touching its ground.
const PROBE_SLACK: f32 = 0.01;

/// How a vertical sweep ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum VerticalContact {
    /// Came to rest on the ground below.
    Landed,
    /// Hit something above the head.
    Bumped,
    /// Nothing in the way.
    Free,
}

/// Distance along `direction` to the first blocking cell, `None` if the ray is clear.
fn probe<L: VoxelLookup + ?Sized>(
    lookup: &L,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    unknown: UnknownCell,
) -> Result<Option<f32>, VoxelError> {
    let result = grid_march(origin, direction, lookup, unknown, LiquidCell::Pass)?;
    Ok(result.hit.map(|_| result.distance))
}

/// How far a body may travel along the horizontal `delta`.
///
/// One probe is cast per entry of `heights`, measured from the feet.
pub(crate) fn sweep_horizontal<L: VoxelLookup + ?Sized>(
    lookup: &L,
    feet: Point3<f32>,
    delta: Vector3<f32>,
    heights: &[f32],
    unknown: UnknownCell,
) -> Result<f32, VoxelError> {
    let length = delta.magnitude();
    if length == 0.0 {
        return Ok(0.0);
    }
    let reach = delta / length * (length + BODY_RADIUS);

    let mut allowed = length;
    for &height in heights {
        let origin = feet + Vector3::new(0.0, height, 0.0);
        if let Some(distance) = probe(lookup, origin, reach, unknown)? {
            allowed = allowed.min((distance - BODY_RADIUS).max(0.0));
        }
    }
    Ok(allowed)
}

/// Resolves a vertical displacement `dy` for a body of the given height.
///
/// # Returns
/// The displacement to apply and the kind of contact made. A landing snaps the feet
/// onto the block top, which may move the body up slightly if it had sunk in.
pub(crate) fn sweep_vertical<L: VoxelLookup + ?Sized>(
    lookup: &L,
    feet: Point3<f32>,
    dy: f32,
    body_height: f32,
    unknown: UnknownCell,
) -> Result<(f32, VerticalContact), VoxelError> {
    if dy <= 0.0 {
        let origin = feet + Vector3::new(0.0, PROBE_LIFT, 0.0);
        let reach = Vector3::new(0.0, -(PROBE_LIFT - dy + PROBE_SLACK), 0.0);
        Ok(match probe(lookup, origin, reach, unknown)? {
            Some(distance) => (PROBE_LIFT - distance, VerticalContact::Landed),
            None => (dy, VerticalContact::Free),
        })
    } else {
        let origin = feet + Vector3::new(0.0, body_height - PROBE_LIFT, 0.0);
        let reach = Vector3::new(0.0, PROBE_LIFT + dy, 0.0);
        Ok(match probe(lookup, origin, reach, unknown)? {
            Some(distance) => ((distance - PROBE_LIFT).max(0.0), VerticalContact::Bumped),
            None => (dy, VerticalContact::Free),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_world {
    use std::collections::HashSet;

    use cgmath::Point3;

    use crate::engine_state::voxels::block::BlockType;
    use crate::engine_state::voxels::chunk::WORLD_HEIGHT;
    use crate::engine_state::voxels::VoxelLookup;

    /// Flat ground at `ground` with extra stone cells, optionally known only within
    /// a box.
    pub struct TestWorld {
        pub ground: i32,
        pub solids: HashSet<Point3<i32>>,
        pub known_half_width: Option<i32>,
    }

    impl TestWorld {
        pub fn flat(ground: i32) -> Self {
            Self {
                ground,
                solids: HashSet::new(),
                known_half_width: None,
            }
        }

        pub fn with_solid(mut self, x: i32, y: i32, z: i32) -> Self {
            self.solids.insert(Point3::new(x, y, z));
            self
        }
    }

    impl VoxelLookup for TestWorld {
        fn voxel_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
            if !(0..WORLD_HEIGHT).contains(&y) {
                return Some(BlockType::EMPTY);
            }
            if let Some(half) = self.known_half_width {
                if x.abs() > half || z.abs() > half {
                    return None;
                }
            }
            Some(if y == self.ground {
                BlockType::GRASS
            } else if y < self.ground || self.solids.contains(&Point3::new(x, y, z)) {
                BlockType::STONE
            } else {
                BlockType::EMPTY
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_world::TestWorld;
    use super::*;

    #[test]
    fn resting_body_stays_landed() {
        let world = TestWorld::flat(10);
        let (dy, contact) =
            sweep_vertical(&world, Point3::new(0.5, 11.0, 0.5), -0.01, 1.8, UnknownCell::Error)
                .unwrap();
        assert_eq!(contact, VerticalContact::Landed);
        assert!(dy.abs() < 1e-5);
    }

    #[test]
    fn falling_body_lands_on_block_top() {
        let world = TestWorld::flat(10);
        let (dy, contact) =
            sweep_vertical(&world, Point3::new(0.5, 11.3, 0.5), -0.5, 1.8, UnknownCell::Error)
                .unwrap();
        assert_eq!(contact, VerticalContact::Landed);
        assert!((dy + 0.3).abs() < 1e-5, "{dy}");
    }

    #[test]
    fn horizontal_sweep_stops_short_of_walls() {
        let world = TestWorld::flat(10).with_solid(2, 11, 0);
        let allowed = sweep_horizontal(
            &world,
            Point3::new(0.5, 11.0, 0.5),
            Vector3::new(5.0, 0.0, 0.0),
            &[0.5],
            UnknownCell::Error,
        )
        .unwrap();
        assert!((allowed - 1.2).abs() < 1e-5, "{allowed}");
    }

    #[test]
    fn unknown_cells_follow_the_policy() {
        let world = TestWorld {
            known_half_width: Some(1),
            ..TestWorld::flat(10)
        };
        let feet = Point3::new(1.5, 11.0, 0.5);
        let delta = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(
            sweep_horizontal(&world, feet, delta, &[0.5], UnknownCell::Error),
            Err(VoxelError::ChunkNotLoaded { x: 2, z: 0 })
        );
        let allowed = sweep_horizontal(&world, feet, delta, &[0.5], UnknownCell::Solid).unwrap();
        assert!((allowed - 0.2).abs() < 1e-5, "{allowed}");
    }
}
