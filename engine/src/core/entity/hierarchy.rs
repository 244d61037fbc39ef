//! Hierarchy operations: dirty propagation, lazy world transforms, reparenting

use super::components::{DirtyListener, GlobalTransformCache, Hierarchy, NodeInfo, Transform};
use super::world::SceneGraph;
use crate::graphics::MeshRenderer;
use crate::physics::PhysicsBody;
use glam::{Mat4, Quat, Vec3};
use hecs::Entity;
use tracing::{debug, error, trace, warn};

/// Thresholds below which an incoming physics pose counts as unchanged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseTolerance {
    /// Maximum squared distance between positions
    pub position_epsilon_sq: f32,
    /// Poses match while `|dot(a, b)| >= 1 - rotation_dot_epsilon`
    pub rotation_dot_epsilon: f32,
}

impl Default for PoseTolerance {
    fn default() -> Self {
        Self {
            position_epsilon_sq: 1e-6,
            rotation_dot_epsilon: 1e-4,
        }
    }
}

impl PoseTolerance {
    pub fn matches(&self, current: &Transform, position: Vec3, rotation: Quat) -> bool {
        current.position.distance_squared(position) < self.position_epsilon_sq
            && current.rotation.dot(rotation).abs() >= 1.0 - self.rotation_dot_epsilon
    }
}

impl SceneGraph {
    /// Mark `node` and every descendant as needing a world transform refresh.
    ///
    /// Always walks the full subtree, even through children that are already
    /// dirty. Ancestors are never touched.
    pub fn dirty(&mut self, node: Entity) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let inner = self.inner_mut();
            if let Ok(cache) = inner.query_one_mut::<&mut GlobalTransformCache>(current) {
                cache.dirty = true;
            }
            if let Ok(body) = inner.query_one_mut::<&mut PhysicsBody>(current) {
                body.on_transform_dirtied();
            }
            if let Ok(renderer) = inner.query_one_mut::<&mut MeshRenderer>(current) {
                renderer.on_transform_dirtied();
            }
            if let Ok(hierarchy) = inner.query_one_mut::<&Hierarchy>(current) {
                stack.extend(hierarchy.children().iter().rev().copied());
            }
        }
    }

    /// Whether the cached world transform is stale; false for non-transformable nodes
    pub fn is_dirty(&self, node: Entity) -> bool {
        self.inner()
            .get::<&GlobalTransformCache>(node)
            .map(|cache| cache.dirty)
            .unwrap_or(false)
    }

    /// Number of world transform recomputations performed for `node`
    pub fn recompute_count(&self, node: Entity) -> u64 {
        self.inner()
            .get::<&GlobalTransformCache>(node)
            .map(|cache| cache.generation)
            .unwrap_or(0)
    }

    /// World transform of `node`, resolving stale ancestors top-down on demand.
    ///
    /// Climbs to the nearest clean transformable ancestor, then recomputes the
    /// stale chain below it in order.
    pub fn global_transform(&mut self, node: Entity) -> Option<Transform> {
        let cache = *self.inner().get::<&GlobalTransformCache>(node).ok()?;
        if !cache.dirty {
            return Some(cache.transform);
        }

        let mut stale = vec![node];
        let mut parent_world = None;
        let mut current = node;
        while let Some(parent) = self.transformable_parent(current) {
            let Ok(cache) = self.inner().get::<&GlobalTransformCache>(parent).map(|c| *c) else {
                break;
            };
            if !cache.dirty {
                parent_world = Some(cache.transform);
                break;
            }
            stale.push(parent);
            current = parent;
        }

        for &entity in stale.iter().rev() {
            let local = self.local_transform(entity)?;
            let world = match parent_world {
                Some(parent) => Transform::compose(&parent, &local),
                None => local,
            };
            if let Ok(cache) = self
                .inner_mut()
                .query_one_mut::<&mut GlobalTransformCache>(entity)
            {
                cache.store(world);
            }
            trace!(node = ?entity, position = ?world.position, "Recomputed world transform");
            parent_world = Some(world);
        }
        parent_world
    }

    /// Model matrix matching [`SceneGraph::global_transform`]
    pub fn model_matrix(&mut self, node: Entity) -> Option<Mat4> {
        self.global_transform(node)?;
        self.inner()
            .get::<&GlobalTransformCache>(node)
            .ok()
            .map(|cache| cache.matrix)
    }

    fn modify_local(&mut self, node: Entity, edit: impl FnOnce(&mut Transform)) {
        match self.inner_mut().query_one_mut::<&mut Transform>(node) {
            Ok(local) => edit(local),
            Err(_) => {
                debug!(node = ?node, "Ignoring transform edit on non-transformable node");
                return;
            }
        }
        self.dirty(node);
    }

    pub fn set_local_position(&mut self, node: Entity, position: Vec3) {
        self.modify_local(node, |local| local.set_position(position));
    }

    pub fn set_local_rotation(&mut self, node: Entity, rotation: Quat) {
        self.modify_local(node, |local| local.set_rotation(rotation));
    }

    pub fn set_local_scale(&mut self, node: Entity, scale: Vec3) {
        self.modify_local(node, |local| local.set_scale(scale));
    }

    pub fn set_local_transform(&mut self, node: Entity, transform: Transform) {
        self.modify_local(node, |local| *local = transform);
    }

    pub fn translate(&mut self, node: Entity, delta: Vec3) {
        self.modify_local(node, |local| local.translate(delta));
    }

    pub fn rotate(&mut self, node: Entity, delta: Quat) {
        self.modify_local(node, |local| local.rotate(delta));
    }

    pub fn rotate_axis(&mut self, node: Entity, angle: f32, axis: Vec3) {
        self.modify_local(node, |local| local.rotate_axis(angle, axis));
    }

    fn parent_world(&mut self, node: Entity) -> Option<Transform> {
        self.transformable_parent(node)
            .and_then(|parent| self.global_transform(parent))
    }

    pub fn set_global_position(&mut self, node: Entity, position: Vec3) {
        let local = match self.parent_world(node) {
            Some(parent) => Transform::local_position_in(&parent, position),
            None => position,
        };
        self.set_local_position(node, local);
    }

    pub fn set_global_rotation(&mut self, node: Entity, rotation: Quat) {
        let local = match self.parent_world(node) {
            Some(parent) => Transform::local_rotation_in(&parent, rotation),
            None => rotation,
        };
        self.set_local_rotation(node, local);
    }

    pub fn set_global_scale(&mut self, node: Entity, scale: Vec3) {
        let local = match self.parent_world(node) {
            Some(parent) => Transform::local_scale_in(&parent, scale),
            None => scale,
        };
        self.set_local_scale(node, local);
    }

    pub fn set_global_transform(&mut self, node: Entity, transform: Transform) {
        let local = match self.parent_world(node) {
            Some(parent) => Transform::to_local(&parent, &transform),
            None => transform,
        };
        self.set_local_transform(node, local);
    }

    /// Apply a simulated world pose to `node`, keeping its local scale.
    ///
    /// Returns false without dirtying anything if the pose is within the
    /// graph's [`PoseTolerance`] of the current world pose. The node's own
    /// body is left clean so the pose is not echoed back to the simulation.
    pub fn set_global_transform_from_physics(
        &mut self,
        node: Entity,
        position: Vec3,
        rotation: Quat,
    ) -> bool {
        let Some(current) = self.global_transform(node) else {
            return false;
        };
        if self.pose_tolerance.matches(&current, position, rotation) {
            trace!(node = ?node, "Physics pose unchanged, skipping");
            return false;
        }

        let (local_position, local_rotation) = match self.parent_world(node) {
            Some(parent) => (
                Transform::local_position_in(&parent, position),
                Transform::local_rotation_in(&parent, rotation),
            ),
            None => (position, rotation),
        };
        self.modify_local(node, |local| {
            local.position = local_position;
            local.rotation = local_rotation;
        });

        if let Ok(body) = self.inner_mut().query_one_mut::<&mut PhysicsBody>(node) {
            body.dirty = false;
        }
        true
    }

    /// Take `child` under `parent`, detaching it from any previous parent.
    ///
    /// With `retain_world_transform` the child's world transform from before
    /// the move is re-applied afterwards; otherwise it is dirtied and keeps
    /// its local transform.
    pub fn add_child(&mut self, parent: Entity, child: Entity, retain_world_transform: bool) -> bool {
        if !self.is_live(parent) || !self.is_live(child) {
            warn!(parent = ?parent, child = ?child, "Cannot attach missing or destroyed node");
            return false;
        }
        if parent == child || self.is_ancestor_of(child, parent) {
            warn!(
                parent = ?parent,
                child = ?child,
                "Refusing to attach a node under itself or its own descendant"
            );
            return false;
        }

        let snapshot = if retain_world_transform {
            self.global_transform(child)
        } else {
            None
        };

        if let Some(old_parent) = self.parent(child) {
            if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(old_parent) {
                hierarchy.remove_child(child);
            }
        }
        if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(child) {
            hierarchy.parent = Some(parent);
        }
        if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(parent) {
            hierarchy.push_child(child);
        }

        match snapshot {
            Some(world) => self.set_global_transform(child, world),
            None => self.dirty(child),
        }
        debug!(parent = ?parent, child = ?child, "Attached child");
        true
    }

    /// Move `child` from `from` to `to`.
    ///
    /// Returns false without mutating anything if `child` is not one of
    /// `from`'s children.
    pub fn move_child(
        &mut self,
        from: Entity,
        child: Entity,
        to: Entity,
        retain_world_transform: bool,
    ) -> bool {
        let owned = self
            .inner()
            .get::<&Hierarchy>(from)
            .map(|hierarchy| hierarchy.index_of(child).is_some())
            .unwrap_or(false);
        if !owned {
            debug!(from = ?from, child = ?child, "move_child: not a child of the source node");
            return false;
        }
        self.add_child(to, child, retain_world_transform)
    }

    /// Reorder the children of `parent`; out-of-range or equal indices are a no-op
    pub fn move_child_to_index(&mut self, parent: Entity, from: usize, to: usize) -> bool {
        self.inner_mut()
            .query_one_mut::<&mut Hierarchy>(parent)
            .map(|hierarchy| hierarchy.move_to_index(from, to))
            .unwrap_or(false)
    }

    /// Detach `child` from `parent` and hand it to the deletion queue
    pub fn delete_child(&mut self, parent: Entity, child: Entity) -> bool {
        let removed = self
            .inner_mut()
            .query_one_mut::<&mut Hierarchy>(parent)
            .map(|hierarchy| hierarchy.remove_child(child))
            .unwrap_or(false);
        if !removed {
            debug!(parent = ?parent, child = ?child, "delete_child: not a child");
            return false;
        }
        if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(child) {
            hierarchy.parent = None;
        }
        self.add_to_deletion_queue(child);
        true
    }

    /// Destroy `node` alone: its children move up to its parent first.
    pub fn destroy(&mut self, node: Entity) -> bool {
        let Some(parent) = self.parent(node) else {
            warn!(node = ?node, "Node has no parent to delete it from, skipping destroy");
            return false;
        };
        for child in self.child_list(node) {
            self.move_child(node, child, parent, true);
        }
        self.delete_child(parent, node)
    }

    /// Detach and queue every descendant of `node` for deletion.
    ///
    /// Descendants are queued deepest first. `node` itself stays attached;
    /// the caller is expected to delete it.
    pub fn recursively_destroy(&mut self, node: Entity) {
        for descendant in self.subtree_post_order(node) {
            if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(descendant) {
                hierarchy.parent = None;
                hierarchy.take_children();
            }
            self.add_to_deletion_queue(descendant);
        }
        if let Ok(hierarchy) = self.inner_mut().query_one_mut::<&mut Hierarchy>(node) {
            hierarchy.take_children();
        }
    }

    /// Check that every parent link and children list agree.
    ///
    /// Returns the number of inconsistencies found; each one is logged.
    pub fn validate_hierarchy(&self) -> usize {
        let inner = self.inner();
        let links: Vec<(Entity, Option<Entity>, Vec<Entity>)> = inner
            .query::<&Hierarchy>()
            .iter()
            .map(|(entity, h)| (entity, h.parent, h.children.clone()))
            .collect();

        let mut issues = 0;
        for (entity, parent, children) in &links {
            if let Some(parent) = parent {
                let count = inner
                    .get::<&Hierarchy>(*parent)
                    .map(|h| h.children.iter().filter(|&&c| c == *entity).count())
                    .unwrap_or(0);
                if count != 1 {
                    error!(
                        node = ?entity,
                        parent = ?parent,
                        occurrences = count,
                        "Parent's children list disagrees with parent link"
                    );
                    issues += 1;
                }
            }
            for child in children {
                let back = inner.get::<&Hierarchy>(*child).ok().and_then(|h| h.parent);
                if back != Some(*entity) {
                    error!(node = ?entity, child = ?child, "Child does not point back to its parent");
                    issues += 1;
                }
            }
        }

        let destroyed_attached = inner
            .query::<(&NodeInfo, &Hierarchy)>()
            .iter()
            .filter(|(_, (info, h))| info.is_destroyed && h.parent.is_some())
            .count();
        if destroyed_attached > 0 {
            warn!(count = destroyed_attached, "Destroyed nodes still attached to a parent");
        }

        if issues == 0 {
            trace!("Hierarchy validation passed");
        }
        issues
    }
}
