//! Scene snapshot serialization

mod entity_mapper;
mod scene;

pub use entity_mapper::EntityMapper;
pub use scene::{Scene, SceneError, SerializedBody, SerializedNode};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{SceneGraph, Transform};
    use crate::physics::BodyId;
    use glam::{Quat, Vec3};

    fn sample_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.create_node(
            root,
            "Parent",
            Transform::from_position_rotation(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.5)),
        );
        let group = graph.create_group(parent, "Group");
        let child = graph.create_node(group, "Child", Transform::from_position(Vec3::X));
        graph.attach_physics_body(child, BodyId(2), Vec3::new(0.0, 0.5, 0.0));
        graph
    }

    #[test]
    fn test_scene_round_trip() {
        let graph = sample_graph();
        let scene = Scene::from_graph(&graph);
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.nodes[0].parent, None);
        assert_eq!(scene.nodes[1].parent, Some(0));
        assert_eq!(scene.nodes[1].local, None);
        assert_eq!(scene.nodes[2].parent, Some(1));

        let mut loaded = SceneGraph::new();
        let mapper = scene.instantiate(&mut loaded).unwrap();
        assert_eq!(mapper.len(), 3);

        let parent = mapper.remap(0).unwrap();
        let group = mapper.remap(1).unwrap();
        let child = mapper.remap(2).unwrap();
        assert_eq!(loaded.parent(parent), Some(loaded.root()));
        assert_eq!(loaded.parent(group), Some(parent));
        assert_eq!(loaded.parent(child), Some(group));
        assert!(!loaded.is_transformable(group));
        assert_eq!(loaded.physics_body(child).unwrap().body, BodyId(2));
        assert_eq!(loaded.pending_begin(), 3);

        // Child sits under a group, so its world transform is its local one.
        let world = loaded.global_transform(child).unwrap();
        assert_eq!(world.position, Vec3::X);
        assert_eq!(Scene::from_graph(&loaded), scene);
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{"nodes": [{"name": "Bare"}]}"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        let mut graph = SceneGraph::new();
        let mapper = scene.instantiate(&mut graph).unwrap();
        let node = mapper.remap(0).unwrap();
        assert_eq!(graph.name(node).as_deref(), Some("Bare"));
        assert!(!graph.is_transformable(node));
    }

    #[test]
    fn test_empty_scene() {
        let json = r#"{"nodes": []}"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        let mut graph = SceneGraph::new();
        let mapper = scene.instantiate(&mut graph).unwrap();
        assert!(mapper.is_empty());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_forward_parent_is_rejected() {
        let scene = Scene {
            nodes: vec![
                SerializedNode {
                    name: "A".into(),
                    parent: Some(1),
                    local: None,
                    physics: None,
                },
                SerializedNode {
                    name: "B".into(),
                    parent: None,
                    local: None,
                    physics: None,
                },
            ],
        };
        let mut graph = SceneGraph::new();
        let result = scene.instantiate(&mut graph);
        assert!(matches!(
            result,
            Err(SceneError::InvalidParent { node: 0, parent: 1 })
        ));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_scene_file_io() {
        let scene = Scene::from_graph(&sample_graph());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");

        scene.save_to_file(&path).unwrap();
        let loaded = Scene::load_from_file(&path).unwrap();
        assert_eq!(loaded, scene);

        let missing = Scene::load_from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(SceneError::Io(_))));
    }
}
