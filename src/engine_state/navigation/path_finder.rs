//! # Path Finder
//!
//! Bounded A* over terrain blocks. Search nodes are ground blocks: an agent stands
//! on top of a node, so a node must be a walkable material with an `EMPTY` cell
//! directly above it.
//!
//! The search is confined to a window of `±radius` blocks horizontally and
//! `±vertical_radius` vertically around the start. From each node, the eight lateral
//! neighbours are tried one block down, level, and (when jumps are allowed) one block
//! up. Steps cost their Manhattan length.
//!
//! If the target cannot be reached inside the window, the path leads to the visited
//! node horizontally closest to the target instead. Searching never fails; at worst
//! it returns an empty path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bitvec::prelude::*;
use cgmath::{Point3, Vector3};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::npc_action::{ActionKind, NpcAction, Path};
use crate::engine_state::config::PathFinderConfig;
use crate::engine_state::voxels::block::BlockType;
use crate::engine_state::voxels::chunk::WORLD_HEIGHT;
use crate::engine_state::voxels::VoxelLookup;

/// Ordering of the search frontier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostModel {
    /// `f = g + h`: cost so far plus Manhattan distance to the target. Finds shortest
    /// paths.
    #[default]
    Accumulated,
    /// `f = h`: Manhattan distance to the target alone. Greedy best-first; expands
    /// fewer nodes but can wander.
    Heuristic,
}

/// Lateral step directions, axis-aligned first.
const LATERAL_STEPS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

struct SearchNode {
    cell: Point3<i32>,
    parent: Option<usize>,
    g: i32,
}

/// Fixed-size index over the search window, centred on the start block.
struct SearchWindow {
    start: Point3<i32>,
    radius: i32,
    vertical_radius: i32,
    side: usize,
}

impl SearchWindow {
    fn new(start: Point3<i32>, radius: i32, vertical_radius: i32) -> Self {
        Self {
            start,
            radius,
            vertical_radius,
            side: (2 * radius + 1) as usize,
        }
    }

    fn len(&self) -> usize {
        self.side * self.side * (2 * self.vertical_radius + 1) as usize
    }

    /// Packs the offset of `cell` from the start into a slot index.
    fn index(&self, cell: Point3<i32>) -> Option<usize> {
        let offset = cell - self.start;
        if offset.x.abs() > self.radius
            || offset.z.abs() > self.radius
            || offset.y.abs() > self.vertical_radius
        {
            return None;
        }
        let x = (offset.x + self.radius) as usize;
        let y = (offset.y + self.vertical_radius) as usize;
        let z = (offset.z + self.radius) as usize;
        Some((y * self.side + z) * self.side + x)
    }
}

fn manhattan(a: Point3<i32>, b: Point3<i32>) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
}

fn horizontal_distance_squared(a: Point3<i32>, b: Point3<i32>) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dz = (a.z - b.z) as i64;
    dx * dx + dz * dz
}

/// Searches paths for NPCs.
#[derive(Debug, Clone)]
pub struct PathFinder {
    config: PathFinderConfig,
}

impl PathFinder {
    pub fn new(config: PathFinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathFinderConfig {
        &self.config
    }

    /// Projects a position onto the walkable surface: the first non-empty block at or
    /// below it.
    ///
    /// # Returns
    /// `None` if an unknown cell or the bottom of the world is reached first.
    pub fn snap_to_ground<L: VoxelLookup + ?Sized>(
        lookup: &L,
        position: Point3<f32>,
    ) -> Option<Point3<i32>> {
        let mut cell = Point3::new(
            position.x.floor() as i32,
            (position.y.floor() as i32).min(WORLD_HEIGHT - 1),
            position.z.floor() as i32,
        );
        while cell.y >= 0 {
            if lookup.voxel_at(cell.x, cell.y, cell.z)? != BlockType::EMPTY {
                return Some(cell);
            }
            cell.y -= 1;
        }
        None
    }

    /// Whether an agent can stand on top of `cell`.
    pub fn is_standable<L: VoxelLookup + ?Sized>(lookup: &L, cell: Point3<i32>) -> bool {
        lookup
            .voxel_at(cell.x, cell.y, cell.z)
            .is_some_and(BlockType::is_walkable)
            && lookup.voxel_at(cell.x, cell.y + 1, cell.z) == Some(BlockType::EMPTY)
    }

    fn priority(&self, g: i32, h: i32) -> i32 {
        match self.config.cost_model {
            CostModel::Accumulated => g.saturating_add(h),
            CostModel::Heuristic => h,
        }
    }

    /// Finds a sequence of actions leading from `start` towards `target`.
    ///
    /// Both positions are snapped to the ground first. The start block itself is not
    /// part of the returned path.
    ///
    /// # Returns
    /// The action queue, possibly leading only part of the way. Empty if either point
    /// cannot be snapped or no move gets closer to the target.
    pub fn search_path_toward<L: VoxelLookup + ?Sized>(
        &self,
        lookup: &L,
        start: Point3<f32>,
        target: Point3<f32>,
    ) -> Path {
        let (Some(start), Some(goal)) = (
            Self::snap_to_ground(lookup, start),
            Self::snap_to_ground(lookup, target),
        ) else {
            trace!("Path search skipped: start or target not over known ground");
            return Path::new();
        };

        let window = SearchWindow::new(
            start,
            self.config.radius.max(0),
            self.config.vertical_radius.max(1),
        );
        let mut closed = bitvec![0; window.len()];
        let mut g_scores = vec![i32::MAX; window.len()];

        let mut nodes = vec![SearchNode {
            cell: start,
            parent: None,
            g: 0,
        }];
        let mut open = BinaryHeap::new();
        open.push((Reverse(self.priority(0, manhattan(start, goal))), Reverse(0), 0usize));
        if let Some(slot) = window.index(start) {
            g_scores[slot] = 0;
        }

        let climbs: &[i32] = if self.config.allow_jumps {
            &[-1, 0, 1]
        } else {
            &[-1, 0]
        };

        let tolerance = self.config.goal_tolerance.max(0.0);
        let mut best = 0usize;
        let mut best_distance = horizontal_distance_squared(start, goal);

        while let Some((_, Reverse(g), current)) = open.pop() {
            let cell = nodes[current].cell;
            let Some(slot) = window.index(cell) else {
                continue;
            };
            if closed[slot] {
                continue;
            }
            closed.set(slot, true);

            let distance = horizontal_distance_squared(cell, goal);
            if cell.y == goal.y && (distance as f32).sqrt() <= tolerance {
                return Self::reconstruct(&nodes, current);
            }

            if distance < best_distance || (distance == best_distance && g < nodes[best].g) {
                best = current;
                best_distance = distance;
            }

            for (dx, dz) in LATERAL_STEPS {
                for dy in climbs {
                    let next = cell + Vector3::new(dx, *dy, dz);
                    let Some(next_slot) = window.index(next) else {
                        continue;
                    };
                    if closed[next_slot] || !Self::is_standable(lookup, next) {
                        continue;
                    }
                    let tentative = g + dx.abs() + dz.abs() + dy.abs();
                    if tentative >= g_scores[next_slot] {
                        continue;
                    }
                    g_scores[next_slot] = tentative;
                    nodes.push(SearchNode {
                        cell: next,
                        parent: Some(current),
                        g: tentative,
                    });
                    let h = manhattan(next, goal);
                    open.push((
                        Reverse(self.priority(tentative, h)),
                        Reverse(tentative),
                        nodes.len() - 1,
                    ));
                }
            }
        }

        debug!(
            "Target {:?} unreachable within radius {}, settling for {:?}",
            goal, self.config.radius, nodes[best].cell
        );
        Self::reconstruct(&nodes, best)
    }

    fn reconstruct(nodes: &[SearchNode], end: usize) -> Path {
        let mut actions = Vec::new();
        let mut cursor = end;
        while let Some(parent) = nodes[cursor].parent {
            let cell = nodes[cursor].cell;
            let kind = if cell.y > nodes[parent].cell.y {
                ActionKind::Jump
            } else {
                ActionKind::Walk
            };
            actions.push(NpcAction::new(kind, cell));
            cursor = parent;
        }
        actions.into_iter().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A flat GRASS plane at `ground`, with optional column overrides and an
    /// unknown region beyond `known_radius`.
    struct Plane {
        ground: i32,
        raised: HashMap<(i32, i32), i32>,
        known_radius: i32,
    }

    impl Plane {
        fn new(ground: i32) -> Self {
            Plane {
                ground,
                raised: HashMap::new(),
                known_radius: 1000,
            }
        }
    }

    impl VoxelLookup for Plane {
        fn voxel_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
            if x.abs() > self.known_radius || z.abs() > self.known_radius {
                return None;
            }
            let top = self.raised.get(&(x, z)).copied().unwrap_or(self.ground);
            Some(if y <= top {
                BlockType::GRASS
            } else {
                BlockType::EMPTY
            })
        }
    }

    fn finder(radius: i32) -> PathFinder {
        PathFinder::new(PathFinderConfig {
            radius,
            vertical_radius: 4,
            ..PathFinderConfig::default()
        })
    }

    #[test]
    fn snaps_down_to_the_surface() {
        let plane = Plane::new(10);
        assert_eq!(
            PathFinder::snap_to_ground(&plane, Point3::new(2.5, 30.0, -1.5)),
            Some(Point3::new(2, 10, -2))
        );
        assert_eq!(
            PathFinder::snap_to_ground(&plane, Point3::new(2000.0, 30.0, 0.0)),
            None
        );
    }

    #[test]
    fn reaches_a_target_on_flat_ground() {
        let plane = Plane::new(10);
        let path = finder(8).search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(5.5, 11.0, 3.5),
        );

        assert_eq!(path.back().map(|a| a.destination), Some(Point3::new(5, 10, 3)));
        assert!(path.iter().all(|a| a.kind == ActionKind::Walk));
        // Between all-diagonal-first and all-axis-aligned routes of equal cost.
        assert!((5..=8).contains(&path.len()), "{path:?}");
        assert_ne!(path.front().map(|a| a.destination), Some(Point3::new(0, 10, 0)));
    }

    #[test]
    fn unreachable_target_settles_for_the_closest_column() {
        let plane = Plane::new(10);
        let path = finder(8).search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(40.5, 11.0, 0.5),
        );

        assert_eq!(path.back().map(|a| a.destination), Some(Point3::new(8, 10, 0)));
    }

    #[test]
    fn steps_up_become_jumps() {
        let mut plane = Plane::new(10);
        for x in 3..8 {
            for z in -2..3 {
                plane.raised.insert((x, z), 11);
            }
        }
        let path = finder(8).search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(5.5, 12.0, 0.5),
        );

        assert_eq!(path.back().map(|a| a.destination), Some(Point3::new(5, 11, 0)));
        let jumps: Vec<_> = path.iter().filter(|a| a.kind == ActionKind::Jump).collect();
        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].destination.y, 11);
    }

    #[test]
    fn without_jumps_the_ledge_is_the_limit() {
        let mut plane = Plane::new(10);
        for x in 3..8 {
            for z in -20..20 {
                plane.raised.insert((x, z), 11);
            }
        }
        let finder = PathFinder::new(PathFinderConfig {
            radius: 8,
            vertical_radius: 4,
            allow_jumps: false,
            ..PathFinderConfig::default()
        });
        let path = finder.search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(5.5, 12.0, 0.5),
        );

        assert_eq!(path.back().map(|a| a.destination), Some(Point3::new(2, 10, 0)));
    }

    #[test]
    fn heuristic_model_also_arrives() {
        let plane = Plane::new(10);
        let finder = PathFinder::new(PathFinderConfig {
            radius: 8,
            vertical_radius: 4,
            cost_model: CostModel::Heuristic,
            ..PathFinderConfig::default()
        });
        let path = finder.search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(-6.5, 11.0, 4.5),
        );
        assert_eq!(path.back().map(|a| a.destination), Some(Point3::new(-7, 10, 4)));
    }

    #[test]
    fn standing_on_the_target_needs_no_actions() {
        let plane = Plane::new(10);
        let path = finder(8).search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(0.9, 11.0, 0.1),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn goal_tolerance_stops_short_of_the_target() {
        let plane = Plane::new(10);
        let finder = PathFinder::new(PathFinderConfig {
            radius: 8,
            vertical_radius: 4,
            goal_tolerance: 1.5,
            ..PathFinderConfig::default()
        });
        let path = finder.search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(6.5, 11.0, 0.5),
        );
        assert_eq!(path.len(), 5);
        assert_eq!(path.back().map(|a| a.destination), Some(Point3::new(5, 10, 0)));
    }

    #[test]
    fn unknown_ground_gives_an_empty_path() {
        let mut plane = Plane::new(10);
        plane.known_radius = 3;
        let path = finder(8).search_path_toward(
            &plane,
            Point3::new(0.5, 11.0, 0.5),
            Point3::new(50.5, 11.0, 0.5),
        );
        assert!(path.is_empty());
    }
}
