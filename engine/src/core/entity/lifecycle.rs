//! Deferred node lifecycle: begin queue, per-frame update and deletion queue

use super::components::{Hierarchy, NodeInfo};
use super::world::SceneGraph;
use hecs::Entity;
use tracing::{debug, trace, warn};

/// Per-node game logic driven by the scene graph.
///
/// Each hook receives the graph and the node it belongs to. While a hook
/// runs, the behaviour is temporarily taken out of its node.
pub trait Behaviour: Send + Sync + 'static {
    /// Called once, before the first `update` of the node
    fn begin_play(&mut self, _graph: &mut SceneGraph, _node: Entity) {}

    fn update(&mut self, _graph: &mut SceneGraph, _node: Entity, _delta_time: f32) {}

    /// Called when the node is handed to the deletion queue
    fn begin_destroy(&mut self, _graph: &mut SceneGraph, _node: Entity) {}
}

/// Component holding a node's behaviour
pub struct BehaviourSlot(pub(crate) Option<Box<dyn Behaviour>>);

impl SceneGraph {
    fn with_behaviour(
        &mut self,
        node: Entity,
        hook: impl FnOnce(&mut dyn Behaviour, &mut SceneGraph, Entity),
    ) {
        let taken = match self.inner_mut().query_one_mut::<&mut BehaviourSlot>(node) {
            Ok(slot) => slot.0.take(),
            Err(_) => None,
        };
        let Some(mut behaviour) = taken else {
            return;
        };

        hook(behaviour.as_mut(), self, node);

        if let Ok(slot) = self.inner_mut().query_one_mut::<&mut BehaviourSlot>(node) {
            if slot.0.is_none() {
                slot.0 = Some(behaviour);
            }
        }
    }

    /// Register `node` for a one-time `begin_play` before its first update
    pub fn add_to_begin_queue(&mut self, node: Entity) {
        if !self.begin_queue.contains(&node) {
            self.begin_queue.push(node);
        }
    }

    /// Number of nodes waiting for `begin_play`
    pub fn pending_begin(&self) -> usize {
        self.begin_queue.len()
    }

    /// Number of nodes waiting to be freed
    pub fn pending_deletion(&self) -> usize {
        self.deletion_queue.len()
    }

    /// Run `begin_play` for every node queued so far; returns how many began.
    ///
    /// Nodes queued by a `begin_play` hook wait for the next drain.
    pub fn drain_begin_queue(&mut self) -> usize {
        let queued = std::mem::take(&mut self.begin_queue);
        let mut begun = 0;
        for node in queued {
            match self.inner_mut().query_one_mut::<&mut NodeInfo>(node) {
                Ok(info) if !info.is_destroyed && !info.has_begun_play => {
                    info.has_begun_play = true;
                }
                _ => continue,
            }
            self.with_behaviour(node, |behaviour, graph, node| {
                behaviour.begin_play(graph, node)
            });
            begun += 1;
        }
        if begun > 0 {
            debug!(count = begun, pending = self.begin_queue.len(), "Drained begin queue");
        }
        begun
    }

    /// Update every live, begun node depth-first from the root.
    ///
    /// Nodes destroyed earlier in this pass are skipped.
    pub fn update_nodes(&mut self, delta_time: f32) -> usize {
        let order = self.depth_first(self.root());
        let mut updated = 0;
        for node in order {
            if !self.is_live(node) || !self.has_begun_play(node) {
                continue;
            }
            self.with_behaviour(node, |behaviour, graph, node| {
                behaviour.update(graph, node, delta_time)
            });
            updated += 1;
        }
        trace!(count = updated, "Updated nodes");
        updated
    }

    /// Hand `node` (and anything still owned under it) to the deletion queue.
    ///
    /// The node stays in the arena until [`SceneGraph::drain_deletion_queue`];
    /// its `begin_destroy` hook fires now.
    pub fn add_to_deletion_queue(&mut self, node: Entity) {
        match self.inner_mut().query_one_mut::<&mut NodeInfo>(node) {
            Ok(info) if info.is_destroyed => {
                trace!(node = ?node, "Node already queued for deletion");
                return;
            }
            Ok(info) => info.is_destroyed = true,
            Err(_) => {
                warn!(node = ?node, "Cannot queue missing node for deletion");
                return;
            }
        }
        self.deletion_queue.push(node);
        self.with_behaviour(node, |behaviour, graph, node| {
            behaviour.begin_destroy(graph, node)
        });
        debug!(node = ?node, "Queued node for deletion");
    }

    /// Free every queued node; returns how many nodes were despawned
    pub fn drain_deletion_queue(&mut self) -> usize {
        let mut freed = 0;
        while !self.deletion_queue.is_empty() {
            let queued = std::mem::take(&mut self.deletion_queue);
            for node in queued {
                if !self.contains(node) {
                    continue;
                }

                if let Some(parent) = self.parent(node) {
                    warn!(
                        node = ?node,
                        parent = ?parent,
                        "Node destroyed while still attached to a parent, detaching"
                    );
                    if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(parent) {
                        hierarchy.remove_child(node);
                    }
                }

                let descendants = self.subtree_post_order(node);
                if !descendants.is_empty() {
                    warn!(
                        node = ?node,
                        count = descendants.len(),
                        "Node destroyed with live children, destroying them with it"
                    );
                }
                for &descendant in &descendants {
                    let newly_destroyed = match self.inner_mut().query_one_mut::<&mut NodeInfo>(descendant) {
                        Ok(info) if !info.is_destroyed => {
                            info.is_destroyed = true;
                            true
                        }
                        _ => false,
                    };
                    if newly_destroyed {
                        self.with_behaviour(descendant, |behaviour, graph, node| {
                            behaviour.begin_destroy(graph, node)
                        });
                    }
                }

                for entity in descendants.into_iter().chain(std::iter::once(node)) {
                    if self.inner_mut().despawn(entity).is_ok() {
                        freed += 1;
                    }
                }
            }
        }
        if freed > 0 {
            debug!(count = freed, "Drained deletion queue");
        }
        freed
    }

    /// Destroy everything under the root and free it immediately
    pub fn shutdown(&mut self) -> usize {
        let root = self.root();
        self.recursively_destroy(root);
        self.begin_queue.clear();
        self.drain_deletion_queue()
    }
}
