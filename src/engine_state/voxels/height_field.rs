//! # Height Field
//!
//! Terrain shape is delegated to a `HeightField`: a pure, deterministic function
//! from a world column to a surface height, plus an optional cave predicate.
//! Fill tasks call it from worker threads, so implementations must be `Send + Sync`.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::chunk::{SEA_LEVEL, WORLD_HEIGHT};

/// Source of terrain surface heights.
pub trait HeightField: Send + Sync {
    /// Surface height of the column at world `(x, z)`. Fractional values are floored
    /// and clamped by the caller.
    fn height(&self, x: i32, z: i32) -> f32;

    /// Whether the cell at world `(x, y, z)` below the surface is hollowed out.
    ///
    /// `surface` is the column's floored, clamped height, as already sampled by the
    /// caller.
    fn is_cave(&self, _x: i32, _y: i32, _z: i32, _surface: i32) -> bool {
        false
    }
}

/// A height field with the same height everywhere.
#[derive(Clone, Copy, Debug)]
pub struct FlatHeightField {
    height: f32,
}

impl FlatHeightField {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl HeightField for FlatHeightField {
    fn height(&self, _x: i32, _z: i32) -> f32 {
        self.height
    }
}

/// Scaling factor applied to world coordinates when sampling the surface noise.
pub const HEIGHT_SCALE_FACTOR: f64 = 0.006;
/// Scaling factor applied to world coordinates when sampling the cave noise.
pub const CAVE_SCALE_FACTOR: f64 = 0.05;
/// Cave noise above this value is hollow.
pub const CAVE_THRESHOLD: f64 = 0.55;
/// Caves never reach closer than this to the surface.
pub const CAVE_ROOF_DEPTH: i32 = 4;

/// Fractal Perlin terrain with 3D Perlin caves.
pub struct NoiseHeightField {
    surface: Fbm<Perlin>,
    caves: Perlin,
    base_height: f64,
    amplitude: f64,
}

impl NoiseHeightField {
    pub fn new(seed: u32) -> Self {
        let surface = Fbm::<Perlin>::new(seed)
            .set_octaves(5)
            .set_frequency(1.0)
            .set_persistence(0.5);
        Self {
            surface,
            caves: Perlin::new(seed.wrapping_add(1)),
            base_height: SEA_LEVEL as f64 + 6.0,
            amplitude: 64.0,
        }
    }
}

impl HeightField for NoiseHeightField {
    fn height(&self, x: i32, z: i32) -> f32 {
        let sample = self.surface.get([
            x as f64 * HEIGHT_SCALE_FACTOR,
            z as f64 * HEIGHT_SCALE_FACTOR,
        ]);
        let height = self.base_height + sample * self.amplitude;
        height.clamp(1.0, (WORLD_HEIGHT - 1) as f64) as f32
    }

    fn is_cave(&self, x: i32, y: i32, z: i32, surface: i32) -> bool {
        if y + CAVE_ROOF_DEPTH >= surface {
            return false;
        }
        let sample = self.caves.get([
            x as f64 * CAVE_SCALE_FACTOR,
            y as f64 * CAVE_SCALE_FACTOR,
            z as f64 * CAVE_SCALE_FACTOR,
        ]);
        sample > CAVE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_field_is_deterministic_per_seed() {
        let a = NoiseHeightField::new(42);
        let b = NoiseHeightField::new(42);
        for (x, z) in [(0, 0), (-100, 37), (512, -9)] {
            assert_eq!(a.height(x, z), b.height(x, z));
        }
    }

    #[test]
    fn noise_heights_stay_inside_the_world() {
        let field = NoiseHeightField::new(7);
        for x in (-200..200).step_by(13) {
            for z in (-200..200).step_by(17) {
                let h = field.height(x, z);
                assert!((1.0..WORLD_HEIGHT as f32).contains(&h), "{h}");
            }
        }
    }

    #[test]
    fn caves_keep_a_roof() {
        let field = NoiseHeightField::new(3);
        let surface = field.height(10, 10) as i32;
        assert!(!field.is_cave(10, surface - 1, 10, surface));
        assert!(!field.is_cave(10, surface - CAVE_ROOF_DEPTH, 10, surface));
    }
}
