//! Render-side view of scene nodes
//!
//! Renderers never read local transforms. They own a [`MeshRenderer`] on the
//! node, which the scene graph flags whenever the node's world transform goes
//! stale, and pull fresh model matrices through [`collect_render_updates`].

use super::uniform::ObjectUniform;
use crate::core::entity::{DirtyListener, SceneGraph};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Identifier of a mesh owned by the rendering collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// Draw association of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRenderer {
    pub mesh: MeshId,
    pub color: [f32; 4],
    /// Model matrix changed since the last upload
    pub needs_upload: bool,
}

impl MeshRenderer {
    pub fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            color: [1.0, 1.0, 1.0, 1.0],
            needs_upload: true,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

impl DirtyListener for MeshRenderer {
    fn on_transform_dirtied(&mut self) {
        self.needs_upload = true;
    }
}

impl SceneGraph {
    /// Attach a mesh renderer to a transformable node
    pub fn attach_mesh_renderer(&mut self, node: Entity, renderer: MeshRenderer) -> bool {
        if !self.is_transformable(node) {
            warn!(node = ?node, "Mesh renderers need a transformable node");
            return false;
        }
        self.inner_mut().insert_one(node, renderer).is_ok()
    }

    pub fn mesh_renderer(&self, node: Entity) -> Option<MeshRenderer> {
        self.inner().get::<&MeshRenderer>(node).ok().map(|r| *r)
    }
}

/// Uniforms for every live renderer whose model matrix changed.
///
/// Visits nodes depth-first from the root and clears `needs_upload` on each
/// renderer it returns.
pub fn collect_render_updates(graph: &mut SceneGraph) -> Vec<(Entity, ObjectUniform)> {
    let mut updates = Vec::new();
    for node in graph.depth_first(graph.root()) {
        let Some(renderer) = graph.mesh_renderer(node) else {
            continue;
        };
        if !renderer.needs_upload {
            continue;
        }
        let Some(model) = graph.model_matrix(node) else {
            continue;
        };
        updates.push((node, ObjectUniform::new(model, renderer.color)));
        if let Ok(r) = graph.inner_mut().query_one_mut::<&mut MeshRenderer>(node) {
            r.needs_upload = false;
        }
    }
    trace!(count = updates.len(), "Collected render updates");
    updates
}
