//! Two-way pose synchronization between scene nodes and physics bodies

use super::accumulator::PhysicsAccumulator;
use super::backend::PhysicsBackend;
use super::components::PhysicsBody;
use crate::core::entity::SceneGraph;
use hecs::Entity;
use tracing::trace;

/// Live nodes with a set body id, parents before children
fn bodies_in_order(graph: &SceneGraph) -> Vec<(Entity, PhysicsBody)> {
    graph
        .depth_first(graph.root())
        .into_iter()
        .filter_map(|node| graph.physics_body(node).map(|body| (node, body)))
        .filter(|(_, body)| body.body.is_set())
        .collect()
}

/// Push the world pose of every node moved by game code into its body.
///
/// Returns the number of bodies reseeded.
pub fn push_outbound(graph: &mut SceneGraph, backend: &mut dyn PhysicsBackend) -> usize {
    let mut pushed = 0;
    for (node, body) in bodies_in_order(graph) {
        if !body.dirty {
            continue;
        }
        let Some(world) = graph.global_transform(node) else {
            continue;
        };
        let position = world.position + world.rotation * body.local_offset;
        backend.set_body_pose(body.body, position, world.rotation);
        graph.consume_body_dirty(node);
        pushed += 1;
    }
    if pushed > 0 {
        trace!(count = pushed, "Pushed node poses to physics");
    }
    pushed
}

/// Apply simulated poses of active bodies to their nodes.
///
/// Poses within the graph's tolerance are dropped without dirtying anything.
/// Returns the number of nodes that actually moved.
pub fn pull_inbound(graph: &mut SceneGraph, backend: &dyn PhysicsBackend) -> usize {
    let mut applied = 0;
    for (node, body) in bodies_in_order(graph) {
        if !backend.is_active(body.body) {
            continue;
        }
        let Some((position, rotation)) = backend.body_pose(body.body) else {
            continue;
        };
        let node_position = position - rotation * body.local_offset;
        if graph.set_global_transform_from_physics(node, node_position, rotation) {
            applied += 1;
        }
    }
    if applied > 0 {
        trace!(count = applied, "Applied physics poses to nodes");
    }
    applied
}

/// Run as many fixed physics steps as `delta_time` allows.
///
/// Each step reseeds bodies dirtied by game code, advances the simulation,
/// then pulls the resulting poses back. Returns the number of steps run.
pub fn physics_update_system(
    graph: &mut SceneGraph,
    backend: &mut dyn PhysicsBackend,
    accumulator: &mut PhysicsAccumulator,
    delta_time: f32,
) -> u32 {
    let steps = accumulator.accumulate(delta_time);
    for _ in 0..steps {
        push_outbound(graph, backend);
        backend.step(accumulator.fixed_timestep);
        pull_inbound(graph, backend);
    }
    steps
}
