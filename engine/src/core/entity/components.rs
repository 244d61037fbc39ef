//! Core components for scene graph nodes

use glam::{Mat4, Quat, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transform value representing position, rotation, and scale in local space
///
/// Scale is never clamped; negative components are legal and mirror the node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position in local space
    pub position: Vec3,
    /// Rotation in local space as a quaternion
    pub rotation: Quat,
    /// Scale in local space
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Zero translation, identity rotation, unit scale
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a new transform with the given position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Overwrite all three components at once
    pub fn set_all(&mut self, position: Vec3, rotation: Quat, scale: Vec3) {
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
    }

    /// Offset the position by `delta`, expressed in the same space as `position`
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Left-multiply the rotation by `delta`
    pub fn rotate(&mut self, delta: Quat) {
        self.rotation = delta * self.rotation;
    }

    /// Rotate by `angle` radians around `axis`
    pub fn rotate_axis(&mut self, angle: f32, axis: Vec3) {
        self.rotate(Quat::from_axis_angle(axis.normalize(), angle));
    }

    /// Convert this transform to a T * R * S model matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Compose a child's local transform with its parent's world transform
    pub fn compose(parent: &Transform, local: &Transform) -> Transform {
        Transform {
            position: parent.position + parent.rotation * (parent.scale * local.position),
            rotation: parent.rotation * local.rotation,
            scale: parent.scale * local.scale,
        }
    }

    /// Express a world-space transform relative to `parent`.
    ///
    /// Exact inverse of [`Transform::compose`]. Division by the parent scale is
    /// per-axis with no zero guard: a zero parent axis yields inf/NaN.
    pub fn to_local(parent: &Transform, world: &Transform) -> Transform {
        Transform {
            position: Self::local_position_in(parent, world.position),
            rotation: Self::local_rotation_in(parent, world.rotation),
            scale: Self::local_scale_in(parent, world.scale),
        }
    }

    pub fn local_position_in(parent: &Transform, world_position: Vec3) -> Vec3 {
        (parent.rotation.inverse() * (world_position - parent.position)) / parent.scale
    }

    pub fn local_rotation_in(parent: &Transform, world_rotation: Quat) -> Quat {
        parent.rotation.inverse() * world_rotation
    }

    pub fn local_scale_in(parent: &Transform, world_scale: Vec3) -> Vec3 {
        world_scale / parent.scale
    }
}

/// Unique node identifier, assigned once and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing node ids
///
/// Passed into the scene graph at construction instead of living in a global.
#[derive(Debug)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start handing out ids from `first`
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Id that the next call to [`IdAllocator::next`] will return
    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }
}

/// Identity and lifecycle flags of a node
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub has_begun_play: bool,
    pub is_destroyed: bool,
}

impl NodeInfo {
    /// Create node info; an empty name becomes `Node_<id>`
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.is_empty() {
            format!("Node_{id}")
        } else {
            name
        };
        Self {
            id,
            name,
            has_begun_play: false,
            is_destroyed: false,
        }
    }
}

/// Parent link and owned, ordered children of a node
///
/// `parent` is a relation only; ownership flows strictly downwards through
/// `children`. The flattened snapshot in `children_cache` is rebuilt lazily
/// after any structural change.
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub(crate) parent: Option<Entity>,
    pub(crate) children: Vec<Entity>,
    children_cache: Option<Arc<[Entity]>>,
}

impl Hierarchy {
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub fn index_of(&self, child: Entity) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    pub(crate) fn push_child(&mut self, child: Entity) {
        self.children.push(child);
        self.children_cache = None;
    }

    pub(crate) fn remove_child(&mut self, child: Entity) -> bool {
        match self.index_of(child) {
            Some(index) => {
                self.children.remove(index);
                self.children_cache = None;
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_children(&mut self) -> Vec<Entity> {
        self.children_cache = None;
        std::mem::take(&mut self.children)
    }

    /// Move the child at `from` to `to`, shifting the siblings in between.
    ///
    /// Returns false (and leaves the order untouched) if either index is out
    /// of range or both are equal.
    pub(crate) fn move_to_index(&mut self, from: usize, to: usize) -> bool {
        let len = self.children.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        if from < to {
            self.children[from..=to].rotate_left(1);
        } else {
            self.children[to..=from].rotate_right(1);
        }
        self.children_cache = None;
        true
    }

    /// Shared snapshot of the children, safe to iterate while mutating the graph
    pub(crate) fn cached_children(&mut self) -> Arc<[Entity]> {
        if let Some(cache) = &self.children_cache {
            return cache.clone();
        }
        let cache: Arc<[Entity]> = self.children.as_slice().into();
        self.children_cache = Some(cache.clone());
        cache
    }

    pub(crate) fn has_cache(&self) -> bool {
        self.children_cache.is_some()
    }
}

/// Cached world-space state of a transformable node
#[derive(Debug, Clone, Copy)]
pub struct GlobalTransformCache {
    pub(crate) transform: Transform,
    pub(crate) matrix: Mat4,
    pub(crate) dirty: bool,
    pub(crate) generation: u64,
}

impl Default for GlobalTransformCache {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            matrix: Mat4::IDENTITY,
            dirty: true,
            generation: 0,
        }
    }
}

impl GlobalTransformCache {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of times the cache has been recomputed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn store(&mut self, transform: Transform) {
        self.transform = transform;
        self.matrix = transform.to_matrix();
        self.dirty = false;
        self.generation += 1;
    }
}

/// Component notified directly whenever its node's transform is dirtied
pub trait DirtyListener {
    fn on_transform_dirtied(&mut self);
}
