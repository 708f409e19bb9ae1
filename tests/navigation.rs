use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use voxel_terrain::engine_state::config::{PathFinderConfig, TerrainConfig};
use voxel_terrain::engine_state::navigation::{ActionKind, PathFinder};
use voxel_terrain::engine_state::rendering::RecordingBackend;
use voxel_terrain::engine_state::voxels::height_field::{FlatHeightField, HeightField};
use voxel_terrain::engine_state::voxels::terrain::Terrain;

/// Ground at 140, raised by one block from `x = 3` on.
struct Step;

impl HeightField for Step {
    fn height(&self, x: i32, _z: i32) -> f32 {
        if x < 3 {
            140.0
        } else {
            141.0
        }
    }
}

fn loaded(height_field: Arc<dyn HeightField>) -> Terrain {
    let config = TerrainConfig {
        half_grid_size: 1,
        worker_count: 2,
        ..TerrainConfig::default()
    };
    let mut terrain = Terrain::new(config, height_field).unwrap();
    terrain.expand(0.5, 0.5);
    assert!(terrain.finish_pending(&mut RecordingBackend::new(), Duration::from_secs(60)));
    terrain
}

#[test]
fn walks_across_flat_terrain() {
    let terrain = loaded(Arc::new(FlatHeightField::new(140.0)));
    let path_finder = PathFinder::new(PathFinderConfig::default());

    let path = path_finder.search_path_toward(
        &terrain,
        Point3::new(0.5, 141.0, 0.5),
        Point3::new(6.5, 141.0, 0.5),
    );

    assert!((6..=8).contains(&path.len()), "{path:?}");
    assert!(path.iter().all(|action| action.kind == ActionKind::Walk));
    assert!(path.iter().all(|action| action.destination.y == 140));
    assert_eq!(path.back().map(|action| action.destination), Some(Point3::new(6, 140, 0)));
}

#[test]
fn climbs_steps_with_a_jump() {
    let terrain = loaded(Arc::new(Step));
    let path_finder = PathFinder::new(PathFinderConfig::default());

    let path = path_finder.search_path_toward(
        &terrain,
        Point3::new(0.5, 141.0, 0.5),
        Point3::new(6.5, 142.0, 0.5),
    );

    let jumps: Vec<_> = path
        .iter()
        .filter(|action| action.kind == ActionKind::Jump)
        .collect();
    assert_eq!(jumps.len(), 1, "{path:?}");
    assert_eq!(jumps[0].destination.x, 3);
    assert_eq!(jumps[0].destination.y, 141);
    assert_eq!(path.back().map(|action| action.destination), Some(Point3::new(6, 141, 0)));
}

#[test]
fn steps_are_impassable_without_jumps() {
    let terrain = loaded(Arc::new(Step));
    let path_finder = PathFinder::new(PathFinderConfig {
        allow_jumps: false,
        ..PathFinderConfig::default()
    });

    let path = path_finder.search_path_toward(
        &terrain,
        Point3::new(0.5, 141.0, 0.5),
        Point3::new(6.5, 142.0, 0.5),
    );

    // Best effort: the closest block on the lower level.
    assert!(path.iter().all(|action| action.kind == ActionKind::Walk));
    assert_eq!(path.back().map(|action| action.destination), Some(Point3::new(2, 140, 0)));
}

#[test]
fn targets_over_unloaded_terrain_give_no_path() {
    let terrain = loaded(Arc::new(FlatHeightField::new(140.0)));
    let path_finder = PathFinder::new(PathFinderConfig::default());

    let path = path_finder.search_path_toward(
        &terrain,
        Point3::new(0.5, 141.0, 0.5),
        Point3::new(200.5, 141.0, 0.5),
    );
    assert!(path.is_empty());
}
