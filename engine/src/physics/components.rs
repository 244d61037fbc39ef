//! Physics components for scene graph nodes

use crate::core::entity::{DirtyListener, SceneGraph};
use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Opaque handle of a body inside the physics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Reserved index meaning "no physics presence"
    pub const UNSET: Self = Self(u32::MAX);

    pub fn is_set(self) -> bool {
        self != Self::UNSET
    }
}

impl Default for BodyId {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Associates a node with at most one simulated body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// Body handle in the backend
    pub body: BodyId,
    /// Offset of the body from the node origin, in the node's rotated frame
    pub local_offset: Vec3,
    /// Node moved by game code since the body was last seeded
    #[serde(skip, default = "default_dirty")]
    pub dirty: bool,
}

fn default_dirty() -> bool {
    true
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            body: BodyId::UNSET,
            local_offset: Vec3::ZERO,
            dirty: true,
        }
    }
}

impl PhysicsBody {
    pub fn new(body: BodyId, local_offset: Vec3) -> Self {
        Self {
            body,
            local_offset,
            dirty: true,
        }
    }
}

impl DirtyListener for PhysicsBody {
    fn on_transform_dirtied(&mut self) {
        self.dirty = true;
    }
}

impl SceneGraph {
    /// Associate `node` with `body`, replacing any previous association.
    ///
    /// The body is seeded from the node's world pose on the next outbound sync.
    pub fn attach_physics_body(&mut self, node: Entity, body: BodyId, local_offset: Vec3) -> bool {
        if !self.is_transformable(node) {
            warn!(node = ?node, "Physics bodies need a transformable node");
            return false;
        }
        if self
            .inner_mut()
            .insert_one(node, PhysicsBody::new(body, local_offset))
            .is_err()
        {
            return false;
        }
        debug!(node = ?node, body = ?body, "Attached physics body");
        true
    }

    /// Remove the body association; returns the previous one
    pub fn detach_physics_body(&mut self, node: Entity) -> Option<PhysicsBody> {
        self.inner_mut().remove_one::<PhysicsBody>(node).ok()
    }

    pub fn physics_body(&self, node: Entity) -> Option<PhysicsBody> {
        self.inner().get::<&PhysicsBody>(node).ok().map(|body| *body)
    }

    pub(crate) fn consume_body_dirty(&mut self, node: Entity) {
        if let Ok(body) = self.inner_mut().query_one_mut::<&mut PhysicsBody>(node) {
            body.dirty = false;
        }
    }
}
