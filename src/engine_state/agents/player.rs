//! # Player
//!
//! The first-person player: mouse look, walking with gravity and jumps, and block
//! targeting for edits.
//!
//! The player's surroundings are expected to be streamed in, so every march the
//! player makes treats unknown cells as an error. When a collision probe reports one,
//! the physics step is dropped for that tick and the player simply stands still.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Point3, Rad, Vector3};
use log::debug;

use super::{sweep_horizontal, sweep_vertical, VerticalContact, BODY_RADIUS};
use crate::core::VoxelError;
use crate::engine_state::config::PlayerConfig;
use crate::engine_state::input_state::InputBundle;
use crate::engine_state::voxels::block::BlockType;
use crate::engine_state::voxels::ray_march::{grid_march, grid_march_prev_block, LiquidCell, UnknownCell};
use crate::engine_state::voxels::VoxelLookup;

/// Safe limit for pitch to prevent gimbal lock
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Height of the eyes above the feet.
pub const EYE_HEIGHT: f32 = 1.6;

/// Total height of the player body.
pub const BODY_HEIGHT: f32 = 1.8;

/// Heights above the feet at which horizontal movement is probed.
const PROBE_HEIGHTS: [f32; 2] = [0.5, 1.5];

/// A block change requested by the player, applied by the engine to the terrain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockEdit {
    pub position: Point3<i32>,
    pub block: BlockType,
}

/// The player-controlled agent.
#[derive(Debug, Clone)]
pub struct Player {
    /// Feet position in world space
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    /// Horizontal rotation (around Y axis) in radians
    pub yaw: Rad<f32>,
    /// Vertical rotation (around X axis) in radians
    pub pitch: Rad<f32>,
    grounded: bool,
    selected_block: BlockType,
    target: Option<Point3<i32>>,
    config: PlayerConfig,
}

impl Player {
    pub fn new(position: Point3<f32>, config: PlayerConfig) -> Self {
        Self {
            position,
            velocity: Vector3::new(0.0, 0.0, 0.0),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            grounded: false,
            selected_block: BlockType::GRASS,
            target: None,
            config,
        }
    }

    pub fn eye_position(&self) -> Point3<f32> {
        self.position + Vector3::new(0.0, EYE_HEIGHT, 0.0)
    }

    /// Unit vector the player is looking along.
    pub fn view_direction(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// The block placed by the next place action.
    pub fn selected_block(&self) -> BlockType {
        self.selected_block
    }

    /// The block under the crosshair after the last tick, if any is in reach.
    pub fn target_block(&self) -> Option<Point3<i32>> {
        self.target
    }

    /// Advances the player by `dt` seconds.
    ///
    /// # Returns
    /// The block edit requested this tick, if any.
    pub fn tick<L: VoxelLookup + ?Sized>(
        &mut self,
        dt: f32,
        input: &InputBundle,
        lookup: &L,
    ) -> Option<BlockEdit> {
        self.look(input.mouse_delta);

        if input.next_block.is_just_pressed() {
            self.selected_block = self.selected_block.next_placeable();
        }
        if input.prev_block.is_just_pressed() {
            self.selected_block = self.selected_block.prev_placeable();
        }

        if let Err(err) = self.step_physics(dt, input, lookup) {
            debug!("Player physics skipped this tick: {err}");
        }

        let reach = self.view_direction() * self.config.reach;
        self.target = grid_march(
            self.eye_position(),
            reach,
            lookup,
            UnknownCell::Error,
            LiquidCell::Stop,
        )
        .ok()
        .and_then(|result| result.hit);

        if input.break_block.is_just_pressed() {
            return self.target.map(|position| BlockEdit {
                position,
                block: BlockType::EMPTY,
            });
        }
        if input.place_block.is_just_pressed() {
            return match grid_march_prev_block(self.eye_position(), reach, lookup, UnknownCell::Error) {
                Ok(Some((_, previous))) if !self.overlaps(previous) => Some(BlockEdit {
                    position: previous,
                    block: self.selected_block,
                }),
                Ok(_) => None,
                Err(err) => {
                    debug!("Block placement skipped: {err}");
                    None
                }
            };
        }
        None
    }

    fn look(&mut self, (dx, dy): (f32, f32)) {
        let sensitivity = self.config.mouse_sensitivity;
        self.yaw += Rad(dx * sensitivity);
        self.pitch += Rad(-dy * sensitivity);
        self.pitch = Rad(self.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }

    /// Computes the next position and velocity, committing them only if every probe
    /// succeeded.
    fn step_physics<L: VoxelLookup + ?Sized>(
        &mut self,
        dt: f32,
        input: &InputBundle,
        lookup: &L,
    ) -> Result<(), VoxelError> {
        let (forward_axis, right_axis) = input.movement_axes();
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin);
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos);

        let mut wish = forward * forward_axis + right * right_axis;
        if wish.magnitude2() > 0.0 {
            wish = wish.normalize() * self.config.walk_speed;
        }

        let mut velocity = Vector3::new(wish.x, self.velocity.y, wish.z);
        if self.grounded && input.jump.is_active() {
            velocity.y = self.config.jump_speed;
        }
        velocity.y -= self.config.gravity * dt;

        // Axes are resolved one at a time so the player slides along walls.
        let mut position = self.position;
        for axis in [0, 2] {
            let delta = velocity[axis] * dt;
            if delta == 0.0 {
                continue;
            }
            let mut step = Vector3::new(0.0, 0.0, 0.0);
            step[axis] = delta;
            let allowed =
                sweep_horizontal(lookup, position, step, &PROBE_HEIGHTS, UnknownCell::Error)?;
            position[axis] += allowed.copysign(delta);
        }

        let (dy, contact) =
            sweep_vertical(lookup, position, velocity.y * dt, BODY_HEIGHT, UnknownCell::Error)?;
        position.y += dy;
        if contact != VerticalContact::Free {
            velocity.y = 0.0;
        }

        self.position = position;
        self.velocity = velocity;
        self.grounded = contact == VerticalContact::Landed;
        Ok(())
    }

    /// Whether a block at `cell` would intersect the player body.
    fn overlaps(&self, cell: Point3<i32>) -> bool {
        let (x, y, z) = (cell.x as f32, cell.y as f32, cell.z as f32);
        let p = self.position;
        p.x + BODY_RADIUS > x
            && p.x - BODY_RADIUS < x + 1.0
            && p.z + BODY_RADIUS > z
            && p.z - BODY_RADIUS < z + 1.0
            && p.y + BODY_HEIGHT > y
            && p.y < y + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::agents::test_world::TestWorld;
    use crate::engine_state::input_state::RawInputState;

    const DT: f32 = 1.0 / 60.0;

    fn player_at(x: f32, y: f32, z: f32) -> Player {
        Player::new(Point3::new(x, y, z), PlayerConfig::default())
    }

    #[test]
    fn falls_onto_the_ground() {
        let world = TestWorld::flat(10);
        let mut player = player_at(0.5, 14.0, 0.5);
        for _ in 0..120 {
            player.tick(DT, &InputBundle::default(), &world);
        }
        assert!(player.is_grounded());
        assert!((player.position.y - 11.0).abs() < 1e-4, "{:?}", player.position);
    }

    #[test]
    fn walls_stop_forward_movement() {
        let world = TestWorld::flat(10).with_solid(2, 11, 0).with_solid(2, 12, 0);
        let mut player = player_at(0.5, 11.0, 0.5);
        let input = InputBundle {
            move_forward: RawInputState::Held,
            ..InputBundle::default()
        };
        for _ in 0..120 {
            player.tick(DT, &input, &world);
        }
        let x = player.position.x;
        assert!(x > 1.5 && x <= 1.7 + 1e-4, "{x}");
        assert!((player.position.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn jumping_leaves_the_ground() {
        let world = TestWorld::flat(10);
        let mut player = player_at(0.5, 11.0, 0.5);
        player.tick(DT, &InputBundle::default(), &world);
        assert!(player.is_grounded());

        let input = InputBundle {
            jump: RawInputState::Pressed,
            ..InputBundle::default()
        };
        player.tick(DT, &input, &world);
        assert!(!player.is_grounded());
        assert!(player.position.y > 11.0);
    }

    #[test]
    fn unknown_surroundings_freeze_physics() {
        let world = TestWorld {
            known_half_width: Some(-1),
            ..TestWorld::flat(10)
        };
        let mut player = player_at(0.5, 20.0, 0.5);
        player.tick(DT, &InputBundle::default(), &world);
        assert_eq!(player.position, Point3::new(0.5, 20.0, 0.5));
        assert_eq!(player.target_block(), None);
    }

    #[test]
    fn pitch_is_clamped() {
        let world = TestWorld::flat(10);
        let mut player = player_at(0.5, 11.0, 0.5);
        let input = InputBundle {
            mouse_delta: (0.0, -100_000.0),
            ..InputBundle::default()
        };
        player.tick(DT, &input, &world);
        assert_eq!(player.pitch, Rad(SAFE_FRAC_PI_2));
    }

    #[test]
    fn breaking_targets_the_block_underfoot() {
        let world = TestWorld::flat(10);
        let mut player = player_at(0.5, 11.0, 0.5);
        player.pitch = Rad(-SAFE_FRAC_PI_2);
        let input = InputBundle {
            break_block: RawInputState::Pressed,
            ..InputBundle::default()
        };
        let edit = player.tick(DT, &input, &world);
        assert_eq!(
            edit,
            Some(BlockEdit {
                position: Point3::new(0, 10, 0),
                block: BlockType::EMPTY,
            })
        );
    }

    #[test]
    fn placing_uses_the_cell_in_front_of_the_target() {
        let world = TestWorld::flat(10).with_solid(3, 12, 0);
        let mut player = player_at(0.5, 11.0, 0.5);
        let input = InputBundle {
            next_block: RawInputState::Pressed,
            place_block: RawInputState::Pressed,
            ..InputBundle::default()
        };
        let edit = player.tick(DT, &input, &world);
        let selected = BlockType::GRASS.next_placeable();
        assert_eq!(player.selected_block(), selected);
        assert_eq!(
            edit,
            Some(BlockEdit {
                position: Point3::new(2, 12, 0),
                block: selected,
            })
        );
    }

    #[test]
    fn placing_inside_the_body_is_refused() {
        let world = TestWorld::flat(10);
        let mut player = player_at(0.5, 11.0, 0.5);
        player.pitch = Rad(-SAFE_FRAC_PI_2);
        let input = InputBundle {
            place_block: RawInputState::Pressed,
            ..InputBundle::default()
        };
        assert_eq!(player.tick(DT, &input, &world), None);
    }
}
