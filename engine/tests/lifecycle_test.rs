//! Integration tests for deferred creation, destruction and frame ordering

use glam::Vec3;
use scene_engine::prelude::*;
use std::sync::{Arc, Mutex};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

type EventLog = Arc<Mutex<Vec<String>>>;

/// Records every hook call as "<hook> <node name>"
struct Recorder {
    events: EventLog,
}

impl Recorder {
    fn boxed(events: &EventLog) -> Box<dyn Behaviour> {
        Box::new(Self {
            events: Arc::clone(events),
        })
    }

    fn record(&self, graph: &SceneGraph, hook: &str, node: Entity) {
        let name = graph.name(node).unwrap_or_default();
        self.events.lock().unwrap().push(format!("{hook} {name}"));
    }
}

impl Behaviour for Recorder {
    fn begin_play(&mut self, graph: &mut SceneGraph, node: Entity) {
        self.record(graph, "begin", node);
    }

    fn update(&mut self, graph: &mut SceneGraph, node: Entity, _delta_time: f32) {
        self.record(graph, "update", node);
    }

    fn begin_destroy(&mut self, graph: &mut SceneGraph, node: Entity) {
        self.record(graph, "destroy", node);
    }
}

/// Deletes a sibling during its own update
struct SiblingKiller {
    target: Entity,
}

impl Behaviour for SiblingKiller {
    fn update(&mut self, graph: &mut SceneGraph, _node: Entity, _delta_time: f32) {
        if let Some(parent) = graph.parent(self.target) {
            graph.delete_child(parent, self.target);
        }
    }
}

#[test]
fn test_recursive_destroy_leaves_no_orphans() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let top = graph.create_node(root, "Top", Transform::IDENTITY);
    let mut nodes = vec![top];
    for i in 0..3 {
        let child = graph.create_node(top, format!("Child{i}"), Transform::IDENTITY);
        nodes.push(child);
        for j in 0..2 {
            nodes.push(graph.create_node(child, format!("Leaf{i}{j}"), Transform::IDENTITY));
        }
    }
    let survivor = graph.create_node(root, "Survivor", Transform::IDENTITY);
    assert_eq!(graph.node_count(), 12);

    graph.recursively_destroy(top);
    assert!(graph.delete_child(root, top));
    assert_eq!(graph.pending_deletion(), nodes.len());

    // Queued nodes stay resolvable until the drain.
    assert!(nodes.iter().all(|&node| graph.contains(node)));
    assert!(nodes.iter().all(|&node| graph.is_destroyed(node)));

    assert_eq!(graph.drain_deletion_queue(), nodes.len());
    assert!(nodes.iter().all(|&node| !graph.contains(node)));
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.children(root).to_vec(), vec![survivor]);
    assert_eq!(graph.validate_hierarchy(), 0);
}

#[test]
fn test_destroy_moves_children_up() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let grandparent = graph.create_node(root, "Grandparent", Transform::from_position(Vec3::X));
    let middle = graph.create_node(grandparent, "Middle", Transform::from_position(Vec3::Y));
    let a = graph.create_node(middle, "A", Transform::from_position(Vec3::Z));
    let b = graph.create_node(middle, "B", Transform::IDENTITY);
    let a_world = graph.global_transform(a).unwrap();

    assert!(graph.destroy(middle));
    assert_eq!(graph.parent(a), Some(grandparent));
    assert_eq!(graph.parent(b), Some(grandparent));
    assert_eq!(graph.global_transform(a).unwrap(), a_world);
    assert!(graph.is_destroyed(middle));

    assert_eq!(graph.drain_deletion_queue(), 1);
    assert!(graph.is_live(a));
    assert!(graph.is_live(b));
    assert_eq!(graph.validate_hierarchy(), 0);
}

#[test]
fn test_destroying_root_is_refused() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    graph.create_node(root, "Child", Transform::IDENTITY);

    assert!(!graph.destroy(root));
    assert!(graph.is_live(root));
    assert_eq!(graph.pending_deletion(), 0);
}

#[test]
fn test_frame_order_of_hooks() {
    init_logging();
    let events: EventLog = Arc::default();
    let mut app = EngineApp::new();
    let root = app.graph.root();
    let first = app.graph.create_node(root, "First", Transform::IDENTITY);
    let second = app.graph.create_node(first, "Second", Transform::IDENTITY);
    app.graph.set_behaviour(first, Recorder::boxed(&events));
    app.graph.set_behaviour(second, Recorder::boxed(&events));

    app.update(1.0 / 60.0);
    app.update(1.0 / 60.0);
    assert!(app.graph.destroy(first));
    app.update(1.0 / 60.0);

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "begin First",
            "begin Second",
            "update First",
            "update Second",
            "update First",
            "update Second",
            "destroy First",
            "update Second",
        ]
    );
    assert!(!app.graph.contains(first));
    assert_eq!(app.graph.parent(second), Some(root));
}

#[test]
fn test_node_deleted_mid_update_is_skipped() {
    init_logging();
    let events: EventLog = Arc::default();
    let mut app = EngineApp::new();
    let root = app.graph.root();
    let killer = app.graph.create_node(root, "Killer", Transform::IDENTITY);
    let victim = app.graph.create_node(root, "Victim", Transform::IDENTITY);
    app.graph.set_behaviour(killer, Box::new(SiblingKiller { target: victim }));
    app.graph.set_behaviour(victim, Recorder::boxed(&events));

    let stats = app.update(1.0 / 60.0);
    assert_eq!(stats.freed, 1);
    assert!(!app.graph.contains(victim));

    let events = events.lock().unwrap().clone();
    assert_eq!(events, vec!["begin Victim", "destroy Victim"]);
}

#[test]
fn test_nodes_created_mid_frame_begin_next_frame() {
    init_logging();
    let mut app = EngineApp::new();
    let root = app.graph.root();

    let first = app.update(1.0 / 60.0);
    assert_eq!(first.begun, 0);

    let node = app.graph.create_node(root, "Late", Transform::IDENTITY);
    assert!(!app.graph.has_begun_play(node));
    assert_eq!(app.graph.pending_begin(), 1);

    let second = app.update(1.0 / 60.0);
    assert_eq!(second.begun, 1);
    assert!(app.graph.has_begun_play(node));
}

#[test]
fn test_stale_handles_are_harmless() {
    init_logging();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let node = graph.create_node(root, "Gone", Transform::from_position(Vec3::X));
    assert!(graph.delete_child(root, node));
    graph.drain_deletion_queue();

    assert!(graph.global_transform(node).is_none());
    graph.translate(node, Vec3::Y);
    graph.dirty(node);
    assert!(!graph.add_child(root, node, true));
    assert!(!graph.delete_child(root, node));

    let replacement = graph.create_node(node, "Replacement", Transform::IDENTITY);
    assert_eq!(graph.parent(replacement), Some(root));
}

#[test]
fn test_shutdown_frees_everything_but_root() {
    init_logging();
    let events: EventLog = Arc::default();
    let mut app = EngineApp::new();
    let root = app.graph.root();
    let parent = app.graph.create_node(root, "Parent", Transform::IDENTITY);
    let child = app.graph.create_node(parent, "Child", Transform::IDENTITY);
    app.graph.set_behaviour(child, Recorder::boxed(&events));
    app.update(1.0 / 60.0);

    app.shutdown();
    assert_eq!(app.graph.node_count(), 1);
    assert!(events.lock().unwrap().contains(&"destroy Child".to_string()));
}
