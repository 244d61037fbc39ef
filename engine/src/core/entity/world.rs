//! Scene graph arena owning every node and its components

use super::components::{
    GlobalTransformCache, Hierarchy, IdAllocator, NodeId, NodeInfo, Transform,
};
use super::hierarchy::PoseTolerance;
use super::lifecycle::{Behaviour, BehaviourSlot};
use hecs::Entity;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns all nodes of a scene and mediates every structural change.
///
/// Nodes are entities in an internal `hecs::World`. A node handle is a
/// generational [`Entity`], so a handle to a freed node can never resolve to
/// a different node. Parent links are handles (relation only); ownership
/// flows from a node to its children and ultimately from the root.
pub struct SceneGraph {
    inner: hecs::World,
    ids: IdAllocator,
    root: Entity,
    pub(crate) begin_queue: Vec<Entity>,
    pub(crate) deletion_queue: Vec<Entity>,
    pub(crate) pose_tolerance: PoseTolerance,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty scene graph with a fresh id allocator
    pub fn new() -> Self {
        Self::with_id_allocator(IdAllocator::new())
    }

    /// Create an empty scene graph drawing node ids from `ids`
    pub fn with_id_allocator(mut ids: IdAllocator) -> Self {
        let mut inner = hecs::World::new();
        let mut info = NodeInfo::new(ids.next(), "Root");
        info.has_begun_play = true;
        let root = inner.spawn((info, Hierarchy::default()));
        debug!(root = ?root, next_id = %ids.peek(), "Created scene graph");

        Self {
            inner,
            ids,
            root,
            begin_queue: Vec::new(),
            deletion_queue: Vec::new(),
            pose_tolerance: PoseTolerance::default(),
        }
    }

    /// The non-spatial group every other node descends from
    pub fn root(&self) -> Entity {
        self.root
    }

    /// Thresholds used to suppress redundant physics poses
    pub fn pose_tolerance(&self) -> PoseTolerance {
        self.pose_tolerance
    }

    pub fn set_pose_tolerance(&mut self, tolerance: PoseTolerance) {
        self.pose_tolerance = tolerance;
    }

    /// Create a transformable node under `parent` with the given local transform
    pub fn create_node(
        &mut self,
        parent: Entity,
        name: impl Into<String>,
        local: Transform,
    ) -> Entity {
        let info = NodeInfo::new(self.ids.next(), name);
        let node = self.inner.spawn((
            info,
            Hierarchy::default(),
            local,
            GlobalTransformCache::default(),
        ));
        self.attach_new(parent, node);
        node
    }

    /// Create a non-transformable grouping node under `parent`
    pub fn create_group(&mut self, parent: Entity, name: impl Into<String>) -> Entity {
        let info = NodeInfo::new(self.ids.next(), name);
        let node = self.inner.spawn((info, Hierarchy::default()));
        self.attach_new(parent, node);
        node
    }

    fn attach_new(&mut self, parent: Entity, node: Entity) {
        let parent = if self.is_live(parent) {
            parent
        } else {
            warn!(
                parent = ?parent,
                node = ?node,
                "Parent is missing or destroyed, attaching new node to the root"
            );
            self.root
        };

        if let Ok(hierarchy) = self.inner.query_one_mut::<&mut Hierarchy>(node) {
            hierarchy.parent = Some(parent);
        }
        if let Ok(hierarchy) = self.inner.query_one_mut::<&mut Hierarchy>(parent) {
            hierarchy.push_child(node);
        }
        self.dirty(node);
        self.add_to_begin_queue(node);
        debug!(node = ?node, parent = ?parent, "Created node");
    }

    /// Attach a behaviour receiving lifecycle callbacks for `node`
    pub fn set_behaviour(&mut self, node: Entity, behaviour: Box<dyn Behaviour>) -> bool {
        match self.inner.insert_one(node, BehaviourSlot(Some(behaviour))) {
            Ok(()) => true,
            Err(_) => {
                warn!(node = ?node, "Cannot attach behaviour to missing node");
                false
            }
        }
    }

    /// Check if the handle still refers to a node in the arena
    pub fn contains(&self, node: Entity) -> bool {
        self.inner.contains(node)
    }

    /// Node exists and has not been handed to the deletion queue
    pub fn is_live(&self, node: Entity) -> bool {
        self.inner
            .get::<&NodeInfo>(node)
            .map(|info| !info.is_destroyed)
            .unwrap_or(false)
    }

    pub fn is_destroyed(&self, node: Entity) -> bool {
        self.inner
            .get::<&NodeInfo>(node)
            .map(|info| info.is_destroyed)
            .unwrap_or(true)
    }

    pub fn has_begun_play(&self, node: Entity) -> bool {
        self.inner
            .get::<&NodeInfo>(node)
            .map(|info| info.has_begun_play)
            .unwrap_or(false)
    }

    pub fn node_id(&self, node: Entity) -> Option<NodeId> {
        self.inner.get::<&NodeInfo>(node).ok().map(|info| info.id)
    }

    pub fn name(&self, node: Entity) -> Option<String> {
        self.inner
            .get::<&NodeInfo>(node)
            .ok()
            .map(|info| info.name.clone())
    }

    pub fn set_name(&mut self, node: Entity, name: impl Into<String>) {
        if let Ok(info) = self.inner.query_one_mut::<&mut NodeInfo>(node) {
            let name = name.into();
            info.name = if name.is_empty() {
                format!("Node_{}", info.id)
            } else {
                name
            };
        }
    }

    /// Number of nodes in the arena, including the root and pending deletions
    pub fn node_count(&self) -> usize {
        self.inner.len() as usize
    }

    pub fn find_by_id(&self, id: NodeId) -> Option<Entity> {
        self.inner
            .query::<&NodeInfo>()
            .iter()
            .find(|(_, info)| info.id == id)
            .map(|(entity, _)| entity)
    }

    /// First live node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.inner
            .query::<&NodeInfo>()
            .iter()
            .find(|(_, info)| !info.is_destroyed && info.name == name)
            .map(|(entity, _)| entity)
    }

    pub fn parent(&self, node: Entity) -> Option<Entity> {
        self.inner
            .get::<&Hierarchy>(node)
            .ok()
            .and_then(|hierarchy| hierarchy.parent())
    }

    /// Shared snapshot of the node's children in order.
    ///
    /// The snapshot is cached on the node until the next structural change,
    /// and stays valid to iterate while the graph is mutated.
    pub fn children(&mut self, node: Entity) -> Arc<[Entity]> {
        match self.inner.query_one_mut::<&mut Hierarchy>(node) {
            Ok(hierarchy) => hierarchy.cached_children(),
            Err(_) => Arc::from(Vec::new()),
        }
    }

    pub fn child_count(&self, node: Entity) -> usize {
        self.inner
            .get::<&Hierarchy>(node)
            .map(|hierarchy| hierarchy.children.len())
            .unwrap_or(0)
    }

    pub(crate) fn child_list(&self, node: Entity) -> Vec<Entity> {
        self.inner
            .get::<&Hierarchy>(node)
            .map(|hierarchy| hierarchy.children().to_vec())
            .unwrap_or_default()
    }

    /// True if `ancestor` appears on the parent chain of `node`
    pub fn is_ancestor_of(&self, ancestor: Entity, node: Entity) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Live nodes of the subtree under `start` in pre-order.
    ///
    /// Subtrees of destroyed nodes are skipped.
    pub fn depth_first(&self, start: Entity) -> Vec<Entity> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !self.is_live(node) {
                continue;
            }
            order.push(node);
            if let Ok(hierarchy) = self.inner.get::<&Hierarchy>(node) {
                stack.extend(hierarchy.children.iter().rev().copied());
            }
        }
        order
    }

    /// Every node below `start` with children before their parent.
    ///
    /// Unlike [`SceneGraph::depth_first`], destroyed nodes are included.
    pub(crate) fn subtree_post_order(&self, start: Entity) -> Vec<Entity> {
        let mut order = Vec::new();
        let mut stack: Vec<(Entity, bool)> = self
            .child_list(start)
            .into_iter()
            .rev()
            .map(|child| (child, false))
            .collect();
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            stack.push((node, true));
            stack.extend(self.child_list(node).into_iter().rev().map(|child| (child, false)));
        }
        order
    }

    /// Parent of `node`, but only if that parent has a transform of its own
    pub fn transformable_parent(&self, node: Entity) -> Option<Entity> {
        self.parent(node)
            .filter(|&parent| self.inner.get::<&Transform>(parent).is_ok())
    }

    /// Local transform of a transformable node
    pub fn local_transform(&self, node: Entity) -> Option<Transform> {
        self.inner.get::<&Transform>(node).ok().map(|t| *t)
    }

    pub fn is_transformable(&self, node: Entity) -> bool {
        self.inner.get::<&Transform>(node).is_ok()
    }

    /// Read-only access to the underlying arena
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.inner
    }
}
