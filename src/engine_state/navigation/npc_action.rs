use std::collections::VecDeque;

use cgmath::Point3;

/// How an NPC moves to an action's destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Stay on the current block.
    Rest,
    /// Walk level or step down onto the destination.
    Walk,
    /// Jump up onto the destination.
    Jump,
}

/// One discrete move: the ground block an NPC should end up standing on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NpcAction {
    pub kind: ActionKind,
    /// The ground block, the NPC's feet rest on its top face.
    pub destination: Point3<i32>,
}

/// An ordered queue of actions, front first.
pub type Path = VecDeque<NpcAction>;

impl NpcAction {
    pub fn new(kind: ActionKind, destination: Point3<i32>) -> Self {
        Self { kind, destination }
    }

    /// Where the NPC's feet are once the action is complete.
    pub fn standing_point(&self) -> Point3<f32> {
        standing_point(self.destination)
    }
}

/// Feet position of an agent standing centred on top of a ground block.
pub fn standing_point(ground: Point3<i32>) -> Point3<f32> {
    Point3::new(
        ground.x as f32 + 0.5,
        ground.y as f32 + 1.0,
        ground.z as f32 + 0.5,
    )
}

/// Horizontal distance between two points, ignoring Y.
pub fn horizontal_distance(a: Point3<f32>, b: Point3<f32>) -> f32 {
    (b.x - a.x).hypot(b.z - a.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standing_point_is_centred_on_top() {
        let action = NpcAction::new(ActionKind::Walk, Point3::new(-3, 140, 7));
        assert_eq!(action.standing_point(), Point3::new(-2.5, 141.0, 7.5));
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let d = horizontal_distance(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 50.0, 4.0));
        assert_eq!(d, 5.0);
    }
}
