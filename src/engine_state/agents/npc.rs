//! # NPC
//!
//! Autonomous agents that walk the terrain along paths from the [`PathFinder`].
//!
//! ## State Machine
//!
//! * `GroundedPursuing` - following a non-empty action queue
//! * `GroundedIdleReplan` - standing, waiting to search for a new path
//! * `AirborneJumping` - moving up after a jump action
//! * `AirborneFalling` - moving down after a jump, a ledge or a reset
//!
//! Grounded NPCs replan only once their queue is empty. A search that yields nothing
//! starts a jittered cooldown so a crowd of stuck NPCs does not search every tick.
//!
//! ## Goals
//!
//! An NPC with patrol columns walks them back and forth; one without chases the
//! player. Terrain that has not streamed in counts as solid, so NPCs wait at the edge
//! of the loaded world rather than fall through it.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Point3, Rad, Vector3};
use log::{debug, trace, warn};

use super::transform_node::{Transform, TransformNode};
use super::{sweep_horizontal, sweep_vertical, VerticalContact};
use crate::engine_state::config::NpcConfig;
use crate::engine_state::navigation::npc_action::{horizontal_distance, standing_point};
use crate::engine_state::navigation::{ActionKind, Path, PathFinder};
use crate::engine_state::voxels::block::BlockType;
use crate::engine_state::voxels::chunk::WORLD_HEIGHT;
use crate::engine_state::voxels::ray_march::UnknownCell;
use crate::engine_state::voxels::VoxelLookup;

/// Height of the NPC body used for head collisions.
const BODY_HEIGHT: f32 = 2.0;

/// Height above the feet at which horizontal movement is probed.
const KNEE_HEIGHT: f32 = 0.5;

/// Horizontal distance at which a patrol column counts as visited.
const WAYPOINT_RADIUS: f32 = 1.0;

/// NPCs below this height have fallen out of the world.
const FALL_LIMIT: f32 = -16.0;

/// Limb swing amplitude at full walking speed.
const MAX_SWING: f32 = 0.7;

/// Radians of walk cycle per unit travelled.
const STRIDE_RATE: f32 = 4.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NpcState {
    GroundedPursuing,
    GroundedIdleReplan,
    AirborneJumping,
    AirborneFalling,
}

impl NpcState {
    pub fn is_grounded(self) -> bool {
        matches!(self, NpcState::GroundedPursuing | NpcState::GroundedIdleReplan)
    }
}

/// An autonomous, path-following agent.
#[derive(Debug, Clone)]
pub struct Npc {
    id: usize,
    /// Feet position in world space
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    /// Facing, measured from +Z towards +X
    pub yaw: Rad<f32>,
    spawn: Point3<f32>,
    state: NpcState,
    actions: Path,
    patrol: Vec<[i32; 2]>,
    patrol_index: usize,
    patrol_forward: bool,
    replan_cooldown: f32,
    stuck_anchor: Point3<f32>,
    stuck_timer: f32,
    resets: usize,
    walk_phase: f32,
    rig: TransformNode<BlockType>,
    rng: fastrand::Rng,
    config: NpcConfig,
}

impl Npc {
    /// Creates an NPC falling into place at `spawn`.
    ///
    /// # Arguments
    /// * `id` - Identifier used in log messages and to seed the replan jitter
    /// * `spawn` - Feet position the NPC starts at and returns to when stuck
    /// * `patrol` - World columns `[x, z]` to walk back and forth, empty to chase
    /// * `config` - Movement settings
    pub fn new(id: usize, spawn: Point3<f32>, patrol: Vec<[i32; 2]>, config: NpcConfig) -> Self {
        Self {
            id,
            position: spawn,
            velocity: Vector3::new(0.0, 0.0, 0.0),
            yaw: Rad(0.0),
            spawn,
            state: NpcState::AirborneFalling,
            actions: Path::new(),
            patrol,
            patrol_index: 0,
            patrol_forward: true,
            replan_cooldown: 0.0,
            stuck_anchor: spawn,
            stuck_timer: 0.0,
            resets: 0,
            walk_phase: 0.0,
            rig: build_rig(),
            rng: fastrand::Rng::with_seed(0x6e70_6300 ^ id as u64),
            config,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> NpcState {
        self.state
    }

    /// Remaining actions, front first.
    pub fn actions(&self) -> &Path {
        &self.actions
    }

    /// Number of times the stuck detector sent this NPC back to its spawn.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Advances the NPC by `dt` seconds.
    pub fn tick<L: VoxelLookup + ?Sized>(
        &mut self,
        dt: f32,
        lookup: &L,
        path_finder: &PathFinder,
        player: Point3<f32>,
    ) {
        let goal = self.goal(lookup, player);
        if self.state.is_grounded() {
            self.plan(dt, lookup, path_finder, goal);
        }
        self.steer(dt);
        self.integrate(dt, lookup);
        self.complete_action();
        self.detect_stuck(dt, goal);
        self.animate(dt);
    }

    /// Body parts with their model matrices, for drawing.
    pub fn parts(&self) -> Vec<(BlockType, cgmath::Matrix4<f32>)> {
        self.rig.parts()
    }

    fn goal<L: VoxelLookup + ?Sized>(&mut self, lookup: &L, player: Point3<f32>) -> Option<Point3<f32>> {
        if self.patrol.is_empty() {
            return Some(player);
        }
        let goal = self.patrol_goal(lookup)?;
        if horizontal_distance(self.position, goal) > WAYPOINT_RADIUS {
            return Some(goal);
        }
        self.advance_patrol();
        self.patrol_goal(lookup)
    }

    fn patrol_goal<L: VoxelLookup + ?Sized>(&self, lookup: &L) -> Option<Point3<f32>> {
        let [x, z] = *self.patrol.get(self.patrol_index)?;
        let top = Point3::new(x as f32 + 0.5, (WORLD_HEIGHT - 1) as f32, z as f32 + 0.5);
        PathFinder::snap_to_ground(lookup, top).map(standing_point)
    }

    /// Moves to the next patrol column, reversing at either end.
    fn advance_patrol(&mut self) {
        let last = self.patrol.len().saturating_sub(1);
        if last == 0 {
            return;
        }
        if self.patrol_index == last {
            self.patrol_forward = false;
        } else if self.patrol_index == 0 {
            self.patrol_forward = true;
        }
        if self.patrol_forward {
            self.patrol_index += 1;
        } else {
            self.patrol_index -= 1;
        }
        debug!("NPC {} heading to patrol column {:?}", self.id, self.patrol[self.patrol_index]);
    }

    fn plan<L: VoxelLookup + ?Sized>(
        &mut self,
        dt: f32,
        lookup: &L,
        path_finder: &PathFinder,
        goal: Option<Point3<f32>>,
    ) {
        if !self.actions.is_empty() {
            self.state = NpcState::GroundedPursuing;
            return;
        }
        self.state = NpcState::GroundedIdleReplan;
        let Some(goal) = goal else {
            return;
        };
        if self.replan_cooldown > 0.0 {
            self.replan_cooldown -= dt;
            return;
        }

        self.actions = path_finder.search_path_toward(lookup, self.position, goal);
        if self.actions.is_empty() {
            self.replan_cooldown = self.config.replan_cooldown_secs * (0.5 + self.rng.f32());
        } else {
            trace!("NPC {} planned {} actions", self.id, self.actions.len());
            self.state = NpcState::GroundedPursuing;
        }
    }

    /// Sets the horizontal velocity towards the front action and starts jumps.
    fn steer(&mut self, dt: f32) {
        self.velocity.x = 0.0;
        self.velocity.z = 0.0;
        let Some(action) = self.actions.front().copied() else {
            return;
        };
        if action.kind == ActionKind::Rest {
            return;
        }

        let target = action.standing_point();
        let offset = Vector3::new(target.x - self.position.x, 0.0, target.z - self.position.z);
        let distance = offset.magnitude();
        if distance > self.config.arrival_tolerance {
            let speed = self.config.walk_speed.min(distance / dt.max(f32::EPSILON));
            let heading = offset / distance * speed;
            self.velocity.x = heading.x;
            self.velocity.z = heading.z;
            self.yaw = Rad(offset.x.atan2(offset.z));
        }

        if action.kind == ActionKind::Jump
            && self.state.is_grounded()
            && target.y > self.position.y + 0.5
        {
            self.velocity.y = self.config.jump_speed;
            self.state = NpcState::AirborneJumping;
        }
    }

    fn integrate<L: VoxelLookup + ?Sized>(&mut self, dt: f32, lookup: &L) {
        self.velocity.y -= self.config.gravity * dt;

        let delta = Vector3::new(self.velocity.x, 0.0, self.velocity.z) * dt;
        if delta.magnitude2() > 0.0 {
            // Marches of non-degenerate rays cannot fail under `Solid`.
            let allowed = sweep_horizontal(lookup, self.position, delta, &[KNEE_HEIGHT], UnknownCell::Solid)
                .unwrap_or(0.0);
            self.position += delta.normalize() * allowed;
        }

        let (dy, contact) = sweep_vertical(
            lookup,
            self.position,
            self.velocity.y * dt,
            BODY_HEIGHT,
            UnknownCell::Solid,
        )
        .unwrap_or((0.0, VerticalContact::Landed));
        self.position.y += dy;

        match contact {
            VerticalContact::Landed => {
                self.velocity.y = 0.0;
                if !self.state.is_grounded() {
                    self.state = if self.actions.is_empty() {
                        NpcState::GroundedIdleReplan
                    } else {
                        NpcState::GroundedPursuing
                    };
                }
            }
            VerticalContact::Bumped => {
                self.velocity.y = 0.0;
                self.state = NpcState::AirborneFalling;
            }
            VerticalContact::Free => {
                self.state = if self.velocity.y > 0.0 {
                    NpcState::AirborneJumping
                } else {
                    NpcState::AirborneFalling
                };
            }
        }
    }

    /// Pops the front action once its destination is reached.
    fn complete_action(&mut self) {
        let Some(action) = self.actions.front().copied() else {
            return;
        };
        if action.kind == ActionKind::Rest {
            self.actions.pop_front();
            return;
        }
        if !self.state.is_grounded() || self.velocity.y > 0.0 {
            return;
        }
        let target = action.standing_point();
        if horizontal_distance(self.position, target) <= self.config.arrival_tolerance
            && (self.position.y - target.y).abs() < 0.5
        {
            self.actions.pop_front();
        }
    }

    fn detect_stuck(&mut self, dt: f32, goal: Option<Point3<f32>>) {
        if self.position.y < FALL_LIMIT {
            warn!("NPC {} fell out of the world at {:?}, resetting", self.id, self.position);
            self.reset();
            return;
        }

        self.stuck_timer += dt;
        if self.stuck_timer < self.config.stuck_window_secs {
            return;
        }
        let moved = (self.position - self.stuck_anchor).magnitude();
        let far_from_goal =
            goal.is_some_and(|goal| horizontal_distance(self.position, goal) > self.config.stuck_goal_distance);
        if moved < self.config.stuck_epsilon && far_from_goal {
            warn!(
                "NPC {} stuck at {:?} for {:.1}s, resetting to spawn",
                self.id, self.position, self.stuck_timer
            );
            self.reset();
        }
        self.stuck_anchor = self.position;
        self.stuck_timer = 0.0;
    }

    fn reset(&mut self) {
        self.position = self.spawn;
        self.velocity = Vector3::new(0.0, 0.0, 0.0);
        self.state = NpcState::AirborneFalling;
        self.actions.clear();
        self.patrol_index = 0;
        self.patrol_forward = true;
        self.replan_cooldown = 0.0;
        self.stuck_anchor = self.spawn;
        self.stuck_timer = 0.0;
        self.resets += 1;
    }

    fn animate(&mut self, dt: f32) {
        let speed = Vector3::new(self.velocity.x, 0.0, self.velocity.z).magnitude();
        if speed > 0.0 {
            self.walk_phase = (self.walk_phase + speed * dt * STRIDE_RATE) % TAU;
        } else {
            self.walk_phase = 0.0;
        }
        let stride = (speed / self.config.walk_speed.max(f32::EPSILON)).min(1.0);
        let swing = Rad(self.walk_phase.sin() * MAX_SWING * stride);

        let position = self.position;
        let yaw = self.yaw;
        let mut set = |name: &str, transform: Transform| {
            if let Some(node) = self.rig.find_mut(name) {
                node.transform = transform;
            }
        };
        set("root", Transform::Translate(Vector3::new(position.x, position.y, position.z)));
        set("heading", Transform::Rotate { axis: Vector3::unit_y(), angle: yaw });
        for (name, angle) in [
            ("left_leg", swing),
            ("right_leg", -swing),
            ("left_arm", -swing),
            ("right_arm", swing),
        ] {
            set(name, Transform::Rotate { axis: Vector3::unit_x(), angle });
        }
    }
}

/// A box of unit-cube mesh scaled to `size`, centred at `offset`.
fn segment(offset: Vector3<f32>, size: Vector3<f32>, material: BlockType) -> TransformNode<BlockType> {
    TransformNode::new(Transform::Translate(offset))
        .with_child(TransformNode::new(Transform::Scale(size)).with_part(material))
}

/// A limb hanging from a named joint at `pivot`.
fn limb(name: &'static str, pivot: Vector3<f32>, material: BlockType) -> TransformNode<BlockType> {
    const LENGTH: f32 = 0.75;
    TransformNode::new(Transform::Translate(pivot)).with_child(
        TransformNode::new(Transform::Identity).named(name).with_child(segment(
            Vector3::new(0.0, -LENGTH / 2.0, 0.0),
            Vector3::new(0.25, LENGTH, 0.25),
            material,
        )),
    )
}

/// Humanoid rig with its feet at the origin, facing +Z.
fn build_rig() -> TransformNode<BlockType> {
    let body = TransformNode::new(Transform::Identity)
        .named("heading")
        .with_child(limb("left_leg", Vector3::new(-0.125, 0.75, 0.0), BlockType::NPC_TROUSERS))
        .with_child(limb("right_leg", Vector3::new(0.125, 0.75, 0.0), BlockType::NPC_TROUSERS))
        .with_child(segment(
            Vector3::new(0.0, 1.125, 0.0),
            Vector3::new(0.5, 0.75, 0.25),
            BlockType::NPC_SHIRT,
        ))
        .with_child(limb("left_arm", Vector3::new(-0.375, 1.5, 0.0), BlockType::NPC_SKIN))
        .with_child(limb("right_arm", Vector3::new(0.375, 1.5, 0.0), BlockType::NPC_SKIN))
        .with_child(segment(
            Vector3::new(0.0, 1.75, 0.0),
            Vector3::new(0.5, 0.5, 0.5),
            BlockType::NPC_SKIN,
        ))
        .with_child(segment(
            Vector3::new(0.0, 2.05, 0.0),
            Vector3::new(0.52, 0.1, 0.52),
            BlockType::NPC_HAIR,
        ));
    TransformNode::new(Transform::Identity).named("root").with_child(body)
}

/// Materials the NPC rig draws with.
pub const RIG_MATERIALS: [BlockType; 4] = [
    BlockType::NPC_SKIN,
    BlockType::NPC_SHIRT,
    BlockType::NPC_TROUSERS,
    BlockType::NPC_HAIR,
];
