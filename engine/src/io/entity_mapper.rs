//! Snapshot index to node handle mapping for scene loading

use hecs::Entity;
use std::collections::HashMap;
use tracing::trace;

/// Maps snapshot node indices to the nodes created while loading
///
/// Indices refer to positions in [`Scene::nodes`](super::Scene::nodes).
#[derive(Debug, Default)]
pub struct EntityMapper {
    mapping: HashMap<usize, Entity>,
}

impl EntityMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the node created for snapshot index `index`
    pub fn register(&mut self, index: usize, node: Entity) {
        trace!(index, node = ?node, "Registering node mapping");
        self.mapping.insert(index, node);
    }

    /// Look up the node created for a snapshot index
    pub fn remap(&self, index: usize) -> Option<Entity> {
        self.mapping.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
