//! # Ray March
//!
//! Voxel grid traversal shared by collision probes and block targeting.
//!
//! The ray direction doubles as its reach: a march along `direction` stops after
//! `direction.magnitude()` units. Each iteration finds, for every axis the ray moves
//! along, the parametric distance to the next cell boundary, advances to the nearest
//! one and tests the cell it enters. The cell containing the origin is never tested.
//!
//! Two policies shape a march: how cells of unavailable chunks are treated
//! ([`UnknownCell`]) and whether liquids stop the ray ([`LiquidCell`]).
//!
//! An origin lying exactly on a boundary of an axis the ray moves down along would
//! yield a zero-length step; the step to the next boundary is then a full cell, so
//! every iteration makes progress.

use cgmath::{InnerSpace, Point3, Vector3};

use super::block::BlockType;
use super::VoxelLookup;
use crate::core::VoxelError;

/// How a march treats cells whose chunk is not available.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnknownCell {
    /// Unknown cells stop the ray like a solid block. Used by NPCs, which must never
    /// walk into terrain that has not streamed in.
    Solid,
    /// Unknown cells abort the march with `ChunkNotLoaded`. Used by the player, whose
    /// surroundings are always expected to be loaded.
    Error,
}

/// How a march treats liquid cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LiquidCell {
    /// Liquids stop the ray like any other non-empty block. Used for block
    /// targeting, so water can be broken and built on.
    Stop,
    /// Rays pass through liquids. Used by collision probes, since agents wade
    /// through water.
    Pass,
}

/// Outcome of a march.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarchResult {
    /// The first blocking cell, `None` if the ray ran out of length.
    pub hit: Option<Point3<i32>>,
    /// The cell traversed just before `hit` (or before the end of the ray).
    pub previous: Point3<i32>,
    /// Distance travelled to the entry boundary of `hit`, or the full ray length.
    pub distance: f32,
}

fn blocks_ray(block: BlockType, liquids: LiquidCell) -> bool {
    match liquids {
        LiquidCell::Stop => !block.is_empty(),
        LiquidCell::Pass => block.is_solid(),
    }
}

/// Cell containing `p`, biased towards the direction of travel on exact boundaries.
fn cell_of(p: [f32; 3], unit: [f32; 3]) -> Point3<i32> {
    let axis = |a: usize| {
        let floor = p[a].floor();
        if unit[a] < 0.0 && p[a] == floor {
            floor as i32 - 1
        } else {
            floor as i32
        }
    };
    Point3::new(axis(0), axis(1), axis(2))
}

/// Marches a ray through the voxel grid.
///
/// # Arguments
/// * `origin` - Start of the ray
/// * `direction` - Direction of the ray; its length is the maximum search distance
/// * `lookup` - Voxel data to test against
/// * `unknown` - How cells without data are treated
/// * `liquids` - Whether liquid cells stop the ray
///
/// # Errors
/// * `DegenerateRay` if `direction` has zero or non-finite length
/// * `ChunkNotLoaded` if an unknown cell is reached under `UnknownCell::Error`
pub fn grid_march<L: VoxelLookup + ?Sized>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    lookup: &L,
    unknown: UnknownCell,
    liquids: LiquidCell,
) -> Result<MarchResult, VoxelError> {
    let length = direction.magnitude();
    if !length.is_finite() || length <= 0.0 {
        return Err(VoxelError::DegenerateRay);
    }
    let unit: [f32; 3] = (direction / length).into();
    let mut p: [f32; 3] = origin.into();
    let mut previous = cell_of(p, unit);
    let mut travelled = 0.0;

    loop {
        let mut step: Option<(usize, f32, f32)> = None;
        for axis in 0..3 {
            let d = unit[axis];
            if d == 0.0 {
                continue;
            }
            let floor = p[axis].floor();
            let target = if d > 0.0 {
                floor + 1.0
            } else if p[axis] == floor {
                floor - 1.0
            } else {
                floor
            };
            let t = (target - p[axis]) / d;
            if step.map_or(true, |(_, best, _)| t < best) {
                step = Some((axis, t, target));
            }
        }
        let Some((axis, t, target)) = step else {
            return Err(VoxelError::DegenerateRay);
        };

        if travelled + t >= length {
            return Ok(MarchResult {
                hit: None,
                previous,
                distance: length,
            });
        }
        travelled += t;
        for a in 0..3 {
            if a == axis {
                p[a] = target;
            } else {
                p[a] += unit[a] * t;
            }
        }

        let cell = cell_of(p, unit);
        let blocking = match lookup.voxel_at(cell.x, cell.y, cell.z) {
            Some(block) => blocks_ray(block, liquids),
            None => match unknown {
                UnknownCell::Solid => true,
                UnknownCell::Error => {
                    return Err(VoxelError::ChunkNotLoaded {
                        x: cell.x,
                        z: cell.z,
                    })
                }
            },
        };
        if blocking {
            return Ok(MarchResult {
                hit: Some(cell),
                previous,
                distance: travelled,
            });
        }
        previous = cell;
    }
}

/// Marches a ray and returns the hit cell together with the cell in front of it.
///
/// Liquids always stop this march. It succeeds only if the cell on the entry side is
/// confirmed `EMPTY`, which makes it a valid spot to place a new block.
///
/// # Returns
/// `Some((hit, previous))`, or `None` if nothing was hit or the entry cell is not
/// empty.
pub fn grid_march_prev_block<L: VoxelLookup + ?Sized>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    lookup: &L,
    unknown: UnknownCell,
) -> Result<Option<(Point3<i32>, Point3<i32>)>, VoxelError> {
    let result = grid_march(origin, direction, lookup, unknown, LiquidCell::Stop)?;
    let Some(hit) = result.hit else {
        return Ok(None);
    };
    let previous = result.previous;
    if lookup.voxel_at(previous.x, previous.y, previous.z) == Some(BlockType::EMPTY) {
        Ok(Some((hit, previous)))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Sparse grid; cells with `x` below `known_from_x` are unknown.
    struct Grid {
        blocks: HashMap<(i32, i32, i32), BlockType>,
        known_from_x: i32,
    }

    impl Grid {
        fn new() -> Self {
            Grid {
                blocks: HashMap::new(),
                known_from_x: i32::MIN,
            }
        }

        fn with(mut self, x: i32, y: i32, z: i32, block: BlockType) -> Self {
            self.blocks.insert((x, y, z), block);
            self
        }
    }

    impl VoxelLookup for Grid {
        fn voxel_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
            if x < self.known_from_x {
                return None;
            }
            Some(self.blocks.get(&(x, y, z)).copied().unwrap_or(BlockType::EMPTY))
        }
    }

    #[test]
    fn hit_reports_distance_to_the_entry_face() {
        let grid = Grid::new().with(5, 0, 0, BlockType::STONE);
        let result = grid_march(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(10.0, 0.0, 0.0),
            &grid,
            UnknownCell::Error,
            LiquidCell::Pass,
        )
        .unwrap();

        assert_eq!(result.hit, Some(Point3::new(5, 0, 0)));
        assert_eq!(result.previous, Point3::new(4, 0, 0));
        assert!((result.distance - 4.5).abs() < 1e-5);
    }

    #[test]
    fn miss_reports_full_length() {
        let grid = Grid::new();
        let result = grid_march(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, 0.0, -7.25),
            &grid,
            UnknownCell::Error,
            LiquidCell::Pass,
        )
        .unwrap();

        assert_eq!(result.hit, None);
        assert_eq!(result.distance, 7.25);
    }

    #[test]
    fn hit_beyond_reach_is_a_miss() {
        let grid = Grid::new().with(5, 0, 0, BlockType::STONE);
        let result = grid_march(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(3.0, 0.0, 0.0),
            &grid,
            UnknownCell::Error,
            LiquidCell::Pass,
        )
        .unwrap();
        assert_eq!(result.hit, None);
    }

    #[test]
    fn origin_on_boundary_moving_down_still_advances() {
        let grid = Grid::new().with(0, -3, 0, BlockType::DIRT);
        let result = grid_march(
            Point3::new(0.5, 0.0, 0.5),
            Vector3::new(0.0, -10.0, 0.0),
            &grid,
            UnknownCell::Error,
            LiquidCell::Pass,
        )
        .unwrap();

        // The origin sits in cell -1; -2 is crossed and -3 is entered at its top face.
        assert_eq!(result.hit, Some(Point3::new(0, -3, 0)));
        assert!((result.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn integer_origin_axis_aligned_ray_terminates() {
        let grid = Grid::new();
        let result = grid_march(
            Point3::new(3.0, 4.0, 5.0),
            Vector3::new(-20.0, 0.0, 0.0),
            &grid,
            UnknownCell::Error,
            LiquidCell::Pass,
        )
        .unwrap();
        assert_eq!(result.hit, None);
        assert_eq!(result.distance, 20.0);
    }

    #[test]
    fn liquid_policy_decides_whether_water_stops_rays() {
        let grid = Grid::new()
            .with(0, 2, 0, BlockType::WATER)
            .with(0, 1, 0, BlockType::SAND);
        let march = |liquids| {
            grid_march(
                Point3::new(0.5, 3.5, 0.5),
                Vector3::new(0.0, -5.0, 0.0),
                &grid,
                UnknownCell::Error,
                liquids,
            )
            .unwrap()
        };

        assert_eq!(march(LiquidCell::Pass).hit, Some(Point3::new(0, 1, 0)));
        let stopped = march(LiquidCell::Stop);
        assert_eq!(stopped.hit, Some(Point3::new(0, 2, 0)));
        assert!((stopped.distance - 0.5).abs() < 1e-5);
    }

    #[test]
    fn unknown_cells_follow_the_policy() {
        let mut grid = Grid::new();
        grid.known_from_x = 0;
        let origin = Point3::new(1.5, 0.5, 0.5);
        let direction = Vector3::new(-4.0, 0.0, 0.0);

        let solid = grid_march(origin, direction, &grid, UnknownCell::Solid, LiquidCell::Pass).unwrap();
        assert_eq!(solid.hit, Some(Point3::new(-1, 0, 0)));
        assert!((solid.distance - 1.5).abs() < 1e-5);

        let error = grid_march(origin, direction, &grid, UnknownCell::Error, LiquidCell::Pass);
        assert_eq!(error, Err(VoxelError::ChunkNotLoaded { x: -1, z: 0 }));
    }

    #[test]
    fn zero_direction_is_degenerate() {
        let grid = Grid::new();
        let result = grid_march(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, 0.0, 0.0),
            &grid,
            UnknownCell::Solid,
            LiquidCell::Pass,
        );
        assert_eq!(result, Err(VoxelError::DegenerateRay));
    }

    #[test]
    fn prev_block_requires_an_empty_entry_cell() {
        let grid = Grid::new().with(0, 0, 3, BlockType::STONE);
        let placed = grid_march_prev_block(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, 0.0, 5.0),
            &grid,
            UnknownCell::Error,
        )
        .unwrap();
        assert_eq!(placed, Some((Point3::new(0, 0, 3), Point3::new(0, 0, 2))));

        // Water is targetable, so the cell in front of it is a valid spot.
        let shore = Grid::new()
            .with(0, 0, 3, BlockType::STONE)
            .with(0, 0, 2, BlockType::WATER);
        let placed = grid_march_prev_block(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, 0.0, 5.0),
            &shore,
            UnknownCell::Error,
        )
        .unwrap();
        assert_eq!(placed, Some((Point3::new(0, 0, 2), Point3::new(0, 0, 1))));

        let submerged = Grid::new()
            .with(0, 0, 0, BlockType::WATER)
            .with(0, 0, 1, BlockType::STONE);
        let placed = grid_march_prev_block(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, 0.0, 5.0),
            &submerged,
            UnknownCell::Error,
        )
        .unwrap();
        assert_eq!(placed, None);
    }
}
