//! Integration tests for the two-way physics pose bridge

use glam::{Quat, Vec3};
use scene_engine::core::entity::{SceneGraph, Transform};
use scene_engine::physics::{
    physics_update_system, pull_inbound, push_outbound, PhysicsAccumulator, PhysicsBackend,
    SimpleBody, SimplePhysicsWorld,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[test]
fn test_tiny_inbound_deltas_are_suppressed() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let node = graph.create_node(root, "Body", Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
    graph.global_transform(node);
    let computed = graph.recompute_count(node);

    // 5e-4 squared is below the 1e-6 distance threshold.
    let nudged = Vec3::new(5e-4, 1.0, 0.0);
    assert!(!graph.set_global_transform_from_physics(node, nudged, Quat::IDENTITY));
    assert!(!graph.is_dirty(node));
    assert_eq!(graph.local_transform(node).unwrap().position, Vec3::new(0.0, 1.0, 0.0));

    // A 0.01 rad tilt keeps |dot| above 1 - 1e-4.
    let tilted = Quat::from_rotation_z(0.01);
    assert!(!graph.set_global_transform_from_physics(node, Vec3::new(0.0, 1.0, 0.0), tilted));
    assert!(!graph.is_dirty(node));

    // The negated quaternion describes the same orientation.
    assert!(!graph.set_global_transform_from_physics(node, Vec3::new(0.0, 1.0, 0.0), -Quat::IDENTITY));

    assert_eq!(graph.global_transform(node).unwrap().position, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(graph.recompute_count(node), computed);
}

#[test]
fn test_inbound_pose_keeps_scale_and_is_not_echoed() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let parent = graph.create_node(root, "Parent", Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
    let node = graph.create_node(
        parent,
        "Body",
        Transform::from_position(Vec3::ZERO).with_scale(Vec3::splat(2.0)),
    );

    let mut physics = SimplePhysicsWorld::default();
    let id = physics.add_body(SimpleBody::kinematic());
    graph.attach_physics_body(node, id, Vec3::ZERO);
    assert_eq!(push_outbound(&mut graph, &mut physics), 1);

    physics.set_body_pose(id, Vec3::new(12.0, 3.0, 0.0), Quat::from_rotation_y(1.0));
    assert_eq!(pull_inbound(&mut graph, &physics), 1);

    let local = graph.local_transform(node).unwrap();
    assert!(local.position.abs_diff_eq(Vec3::new(2.0, 3.0, 0.0), 1e-5));
    assert_eq!(local.scale, Vec3::splat(2.0));
    assert!(!graph.physics_body(node).unwrap().dirty);
    assert_eq!(push_outbound(&mut graph, &mut physics), 0);
}

#[test]
fn test_falling_body_moves_node_and_children() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let body_node = graph.create_node(root, "Crate", Transform::from_position(Vec3::new(0.0, 10.0, 0.0)));
    let attached = graph.create_node(body_node, "Label", Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));

    let mut physics = SimplePhysicsWorld::default();
    let id = physics.add_body(SimpleBody::dynamic());
    graph.attach_physics_body(body_node, id, Vec3::ZERO);

    let mut accumulator = PhysicsAccumulator::new(1.0 / 60.0, 8);
    let mut steps = 0;
    for _ in 0..30 {
        steps += physics_update_system(&mut graph, &mut physics, &mut accumulator, 1.0 / 60.0);
    }
    assert!(steps >= 29);

    let body_y = physics.body_pose(id).unwrap().0.y;
    assert!(body_y < 10.0);
    let node_world = graph.global_transform(body_node).unwrap();
    assert!((node_world.position.y - body_y).abs() < 1e-4);

    let label_world = graph.global_transform(attached).unwrap();
    assert!((label_world.position.y - (body_y + 1.0)).abs() < 1e-4);
}

#[test]
fn test_resting_body_causes_no_recompute() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let node = graph.create_node(root, "Resting", Transform::IDENTITY);

    let mut physics = SimplePhysicsWorld::default().with_floor(0.0);
    let id = physics.add_body(SimpleBody::dynamic());
    graph.attach_physics_body(node, id, Vec3::ZERO);

    let mut accumulator = PhysicsAccumulator::new(1.0 / 60.0, 8);
    physics_update_system(&mut graph, &mut physics, &mut accumulator, 1.0 / 30.0);
    graph.global_transform(node);
    let computed = graph.recompute_count(node);

    for _ in 0..20 {
        physics_update_system(&mut graph, &mut physics, &mut accumulator, 1.0 / 60.0);
        graph.global_transform(node);
    }
    assert_eq!(graph.recompute_count(node), computed);
    assert_eq!(graph.global_transform(node).unwrap().position, Vec3::ZERO);
}

#[test]
fn test_game_code_move_reseeds_body() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let parent = graph.create_node(root, "Parent", Transform::IDENTITY);
    let node = graph.create_node(parent, "Body", Transform::from_position(Vec3::new(0.0, 5.0, 0.0)));

    let mut physics = SimplePhysicsWorld::new(Vec3::ZERO);
    let id = physics.add_body(SimpleBody::dynamic());
    graph.attach_physics_body(node, id, Vec3::ZERO);
    push_outbound(&mut graph, &mut physics);
    assert_eq!(physics.body_pose(id).unwrap().0, Vec3::new(0.0, 5.0, 0.0));

    // Moving an ancestor dirties the body of its descendant.
    graph.translate(parent, Vec3::new(3.0, 0.0, 0.0));
    assert!(graph.physics_body(node).unwrap().dirty);
    assert_eq!(push_outbound(&mut graph, &mut physics), 1);
    assert_eq!(physics.body_pose(id).unwrap().0, Vec3::new(3.0, 5.0, 0.0));
}

#[test]
fn test_inactive_and_unset_bodies_are_skipped() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let sleeping = graph.create_node(root, "Sleeping", Transform::IDENTITY);
    let unset = graph.create_node(root, "Unset", Transform::IDENTITY);

    let mut physics = SimplePhysicsWorld::default();
    let id = physics.add_body(SimpleBody {
        position: Vec3::new(0.0, 4.0, 0.0),
        active: false,
        ..SimpleBody::dynamic()
    });
    graph.attach_physics_body(sleeping, id, Vec3::ZERO);
    graph.attach_physics_body(unset, Default::default(), Vec3::ZERO);

    assert_eq!(pull_inbound(&mut graph, &physics), 0);
    assert_eq!(graph.global_transform(sleeping).unwrap().position, Vec3::ZERO);
    assert_eq!(push_outbound(&mut graph, &mut physics), 1);
}
