//! Scene snapshot serialization and loading
//!
//! Only local transforms are persisted; world transforms are rebuilt from the
//! hierarchy after loading.

use super::entity_mapper::EntityMapper;
use crate::core::entity::{SceneGraph, Transform};
use crate::physics::BodyId;
use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during scene operations
#[derive(Debug, Error)]
pub enum SceneError {
    /// IO error when reading/writing files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A node refers to a parent that does not precede it in the snapshot
    #[error("node {node} refers to invalid parent index {parent}")]
    InvalidParent { node: usize, parent: usize },
}

/// Serialized body association of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SerializedBody {
    pub body: BodyId,
    #[serde(default)]
    pub local_offset: Vec3,
}

/// A single serialized node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub name: String,
    /// Index of the parent in [`Scene::nodes`]; `None` attaches to the root
    #[serde(default)]
    pub parent: Option<usize>,
    /// Local transform; `None` for non-transformable group nodes
    #[serde(default)]
    pub local: Option<Transform>,
    #[serde(default)]
    pub physics: Option<SerializedBody>,
}

/// Scene data structure containing serialized nodes in pre-order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub nodes: Vec<SerializedNode>,
}

impl Scene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every live node below the root of `graph`
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let root = graph.root();
        let order: Vec<Entity> = graph
            .depth_first(root)
            .into_iter()
            .filter(|&node| node != root)
            .collect();
        let index_of: HashMap<Entity, usize> = order
            .iter()
            .enumerate()
            .map(|(index, &node)| (node, index))
            .collect();

        let nodes = order
            .iter()
            .map(|&node| SerializedNode {
                name: graph.name(node).unwrap_or_default(),
                parent: graph
                    .parent(node)
                    .and_then(|parent| index_of.get(&parent).copied()),
                local: graph.local_transform(node),
                physics: graph.physics_body(node).map(|body| SerializedBody {
                    body: body.body,
                    local_offset: body.local_offset,
                }),
            })
            .collect::<Vec<_>>();

        debug!(node_count = nodes.len(), "Captured scene from graph");
        Self { nodes }
    }

    /// Recreate the snapshot under the root of `graph`.
    ///
    /// Every node is dirtied and queued for `begin_play`. Parents must appear
    /// before their children.
    pub fn instantiate(&self, graph: &mut SceneGraph) -> Result<EntityMapper, SceneError> {
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent >= index {
                    return Err(SceneError::InvalidParent {
                        node: index,
                        parent,
                    });
                }
            }
        }

        let mut mapper = EntityMapper::new();
        for (index, serialized) in self.nodes.iter().enumerate() {
            let parent = serialized
                .parent
                .and_then(|parent| mapper.remap(parent))
                .unwrap_or_else(|| graph.root());

            let node = match serialized.local {
                Some(local) => graph.create_node(parent, serialized.name.clone(), local),
                None => graph.create_group(parent, serialized.name.clone()),
            };
            if let Some(body) = serialized.physics {
                graph.attach_physics_body(node, body.body, body.local_offset);
            }
            mapper.register(index, node);
        }

        info!(node_count = mapper.len(), "Instantiated scene");
        Ok(mapper)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!(path = ?path.as_ref(), "Saved scene");
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let json = fs::read_to_string(path.as_ref())?;
        let scene: Scene = serde_json::from_str(&json)?;
        info!(path = ?path.as_ref(), node_count = scene.nodes.len(), "Loaded scene");
        Ok(scene)
    }
}
