//! Frame driver for the scene graph

use crate::config::{EngineConfig, PhysicsSyncConfig};
use crate::core::entity::SceneGraph;
use crate::physics::{physics_update_system, PhysicsAccumulator, PhysicsBackend, SimplePhysicsWorld};
use tracing::{debug, error, info, trace};

/// Counts of the work done during one [`EngineApp::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub begun: usize,
    pub updated: usize,
    pub physics_steps: u32,
    pub freed: usize,
}

/// Owns a scene graph and its physics backend and advances them frame by frame
pub struct EngineApp {
    /// The scene
    pub graph: SceneGraph,
    /// Physics simulation the scene is synchronized with
    pub physics: Box<dyn PhysicsBackend>,
    accumulator: PhysicsAccumulator,
    config: EngineConfig,
    frame: u64,
}

impl EngineApp {
    /// Create a new engine app with default configuration
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    /// Create a new engine app with custom configuration and backend.
    ///
    /// Invalid physics settings are logged and replaced by the defaults.
    pub fn with_config(mut config: EngineConfig, physics: Box<dyn PhysicsBackend>) -> Self {
        if let Err(err) = config.validate() {
            error!(
                error = %err,
                physics = ?config.physics,
                "Invalid engine config, using default physics settings"
            );
            config.physics = PhysicsSyncConfig::default();
        }

        let mut graph = SceneGraph::new();
        graph.set_pose_tolerance(config.physics.tolerance());
        let accumulator = PhysicsAccumulator::new(
            config.physics.fixed_timestep,
            config.physics.max_steps_per_frame,
        );
        info!(config = ?config, "Creating EngineApp");

        Self {
            graph,
            physics,
            accumulator,
            config,
            frame: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of completed frames
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance one frame.
    ///
    /// Order: begin queue, node updates, physics sync and steps, deletion
    /// queue. Nodes queued for deletion during the frame are freed last.
    pub fn update(&mut self, delta_time: f32) -> FrameStats {
        let begun = self.graph.drain_begin_queue();
        let updated = self.graph.update_nodes(delta_time);
        let physics_steps = physics_update_system(
            &mut self.graph,
            self.physics.as_mut(),
            &mut self.accumulator,
            delta_time,
        );
        let freed = self.graph.drain_deletion_queue();

        self.frame += 1;
        let stats = FrameStats {
            begun,
            updated,
            physics_steps,
            freed,
        };
        trace!(frame = self.frame, stats = ?stats, "Frame complete");
        stats
    }

    /// Destroy every node and free it
    pub fn shutdown(&mut self) {
        let freed = self.graph.shutdown();
        self.accumulator.reset();
        debug!(freed, "Engine shut down");
    }
}

impl Default for EngineApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for EngineApp configuration
pub struct EngineBuilder {
    config: EngineConfig,
    physics: Option<Box<dyn PhysicsBackend>>,
}

impl EngineBuilder {
    /// Create a new engine builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            physics: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom physics backend instead of [`SimplePhysicsWorld`]
    pub fn physics(mut self, backend: Box<dyn PhysicsBackend>) -> Self {
        self.physics = Some(backend);
        self
    }

    pub fn fixed_timestep(mut self, seconds: f32) -> Self {
        self.config.physics.fixed_timestep = seconds;
        self
    }

    /// Set a custom log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = Some(filter.into());
        self
    }

    /// Build the EngineApp
    pub fn build(self) -> EngineApp {
        let gravity = self.config.physics.gravity;
        let physics = self
            .physics
            .unwrap_or_else(|| Box::new(SimplePhysicsWorld::new(gravity)));
        EngineApp::with_config(self.config, physics)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
