//! # Transform Tree
//!
//! A small scene graph for articulated models. Each node applies one transform to
//! everything below it and may carry a drawable part. Composing the tree yields one
//! model matrix per part, ready for a draw call.

use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3};

/// The transform a node applies, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Identity,
    Translate(Vector3<f32>),
    /// Rotation about `axis`, which need not be normalised.
    Rotate {
        axis: Vector3<f32>,
        angle: Rad<f32>,
    },
    Scale(Vector3<f32>),
}

impl Transform {
    pub fn matrix(&self) -> Matrix4<f32> {
        match *self {
            Transform::Identity => Matrix4::identity(),
            Transform::Translate(offset) => Matrix4::from_translation(offset),
            Transform::Rotate { axis, angle } => {
                if axis.magnitude2() == 0.0 {
                    Matrix4::identity()
                } else {
                    Matrix4::from_axis_angle(axis.normalize(), angle)
                }
            }
            Transform::Scale(factors) => {
                Matrix4::from_nonuniform_scale(factors.x, factors.y, factors.z)
            }
        }
    }
}

/// A node of the transform tree, owning its children.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformNode<P> {
    /// Optional label used to find the node again, e.g. to animate a joint.
    pub name: Option<&'static str>,
    pub transform: Transform,
    pub part: Option<P>,
    pub children: Vec<TransformNode<P>>,
}

impl<P: Copy> TransformNode<P> {
    pub fn new(transform: Transform) -> Self {
        Self {
            name: None,
            transform,
            part: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_part(mut self, part: P) -> Self {
        self.part = Some(part);
        self
    }

    pub fn with_child(mut self, child: TransformNode<P>) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search for the node with the given name.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut TransformNode<P>> {
        if self.name == Some(name) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// Appends `(part, model matrix)` for every part in the subtree, parents before
    /// children.
    pub fn compose(&self, parent: Matrix4<f32>, out: &mut Vec<(P, Matrix4<f32>)>) {
        let world = parent * self.transform.matrix();
        if let Some(part) = self.part {
            out.push((part, world));
        }
        for child in &self.children {
            child.compose(world, out);
        }
    }

    /// Composes the whole tree from the identity.
    pub fn parts(&self) -> Vec<(P, Matrix4<f32>)> {
        let mut out = Vec::new();
        self.compose(Matrix4::identity(), &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Point3, Transform as _};

    #[test]
    fn child_transforms_apply_after_parents() {
        let tree = TransformNode::new(Transform::Translate(Vector3::new(10.0, 0.0, 0.0)))
            .with_child(
                TransformNode::new(Transform::Rotate {
                    axis: Vector3::unit_y(),
                    angle: Deg(90.0).into(),
                })
                .with_child(
                    TransformNode::new(Transform::Translate(Vector3::new(0.0, 0.0, 1.0)))
                        .with_part('h'),
                ),
            );

        let parts = tree.parts();
        assert_eq!(parts.len(), 1);
        let (part, model) = parts[0];
        assert_eq!(part, 'h');

        // +Z rotated 90 degrees about +Y points along +X.
        let p = model.transform_point(Point3::new(0.0, 0.0, 0.0));
        assert!((p.x - 11.0).abs() < 1e-5 && p.y.abs() < 1e-5 && p.z.abs() < 1e-5, "{p:?}");
    }

    #[test]
    fn named_nodes_can_be_retargeted() {
        let mut tree = TransformNode::new(Transform::Identity).with_child(
            TransformNode::new(Transform::Identity)
                .named("joint")
                .with_child(TransformNode::new(Transform::Scale(Vector3::new(2.0, 2.0, 2.0))).with_part(1u8)),
        );

        tree.find_mut("joint").unwrap().transform = Transform::Translate(Vector3::new(0.0, 5.0, 0.0));
        let (_, model) = tree.parts()[0];
        let p = model.transform_point(Point3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Point3::new(2.0, 7.0, 2.0));
        assert!(tree.find_mut("missing").is_none());
    }
}
