//! Headless scene graph demonstration
//!
//! Builds a small hierarchy, drops a crate onto a floor through the physics
//! bridge, spins a turret from a behaviour, and runs a few seconds of frames.

use scene_engine::prelude::*;
use std::f32::consts::TAU;
use tracing::{info, warn};

const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAME_COUNT: u32 = 180;

/// Spins its node around Y at a fixed rate
struct Spinner {
    turns_per_second: f32,
}

impl Behaviour for Spinner {
    fn begin_play(&mut self, graph: &mut SceneGraph, node: Entity) {
        info!(node = ?graph.name(node), "Spinner started");
    }

    fn update(&mut self, graph: &mut SceneGraph, node: Entity, delta_time: f32) {
        graph.rotate_axis(node, self.turns_per_second * TAU * delta_time, Vec3::Y);
    }

    fn begin_destroy(&mut self, graph: &mut SceneGraph, node: Entity) {
        info!(node = ?graph.name(node), "Spinner destroyed");
    }
}

/// Load the config named on the command line and install logging.
///
/// Logging uses the config's filter when it loads; otherwise the default
/// filter is installed first so the failure can be reported.
fn load_config() -> EngineConfig {
    let Some(path) = std::env::args().nth(1) else {
        scene_engine::init_logging();
        return EngineConfig::default();
    };
    match EngineConfig::load_from_file(&path) {
        Ok(config) => {
            scene_engine::init_logging_with_filter(config.log_filter.as_deref());
            config
        }
        Err(error) => {
            scene_engine::init_logging();
            warn!(path = %path, %error, "Failed to load config, using defaults");
            EngineConfig::default()
        }
    }
}

fn main() {
    let config = load_config();
    info!("Starting scene graph demo");

    let mut physics = SimplePhysicsWorld::new(config.physics.gravity).with_floor(0.0);
    let crate_body = physics.add_body(SimpleBody {
        linear_damping: 0.1,
        ..SimpleBody::dynamic()
    });

    let mut app = EngineBuilder::new()
        .config(config)
        .physics(Box::new(physics))
        .build();

    let graph = &mut app.graph;
    let root = graph.root();
    let ship = graph.create_node(root, "Ship", Transform::from_position(Vec3::new(0.0, 1.0, -5.0)));
    let turret = graph.create_node(ship, "Turret", Transform::from_position(Vec3::new(0.0, 0.5, 0.0)));
    let barrel = graph.create_node(
        turret,
        "Barrel",
        Transform::from_position(Vec3::new(0.0, 0.0, 1.0)).with_scale(Vec3::new(0.2, 0.2, 1.0)),
    );
    graph.set_behaviour(turret, Box::new(Spinner { turns_per_second: 0.25 }));
    graph.attach_mesh_renderer(barrel, MeshRenderer::new(MeshId(0)));

    let crate_node = graph.create_node(root, "Crate", Transform::from_position(Vec3::new(2.0, 4.0, 0.0)));
    graph.attach_physics_body(crate_node, crate_body, Vec3::ZERO);
    graph.attach_mesh_renderer(crate_node, MeshRenderer::new(MeshId(1)).with_color([0.8, 0.5, 0.2, 1.0]));

    for frame in 0..FRAME_COUNT {
        let stats = app.update(FRAME_TIME);
        let uploads = collect_render_updates(&mut app.graph);

        if frame % 30 == 0 {
            let crate_world = app.graph.global_transform(crate_node);
            let barrel_world = app.graph.global_transform(barrel);
            info!(
                frame,
                physics_steps = stats.physics_steps,
                uploads = uploads.len(),
                crate_position = ?crate_world.map(|t| t.position),
                barrel_position = ?barrel_world.map(|t| t.position),
                "Frame"
            );
        }

        if frame == 120 && !app.graph.destroy(ship) {
            warn!("Ship could not be destroyed");
        }
    }

    let issues = app.graph.validate_hierarchy();
    info!(nodes = app.graph.node_count(), issues, "Demo finished");
    app.shutdown();
}
