//! Hierarchical scene graph engine
//!
//! This crate provides the transform hierarchy of a game engine: nodes with
//! local transforms, lazily resolved world transforms with dirty tracking,
//! deferred creation and destruction, and two-way pose synchronization with a
//! physics simulation.

pub mod app;
pub mod config;
pub mod core;
pub mod graphics;
pub mod io;
pub mod physics;

// Re-export commonly used types
pub mod prelude {
    // Scene graph types
    pub use crate::core::entity::{
        Behaviour, Entity, IdAllocator, NodeId, PoseTolerance, SceneGraph, Transform,
    };

    // Math types
    pub use glam::{Mat4, Quat, Vec3};

    // Physics types
    pub use crate::physics::{
        BodyId, PhysicsAccumulator, PhysicsBackend, PhysicsBody, SimpleBody, SimplePhysicsWorld,
    };

    // Render bridge types
    pub use crate::graphics::{collect_render_updates, MeshId, MeshRenderer, ObjectUniform};

    // IO types
    pub use crate::io::{Scene, SceneError};

    // Config types
    pub use crate::config::{ConfigError, EngineConfig, PhysicsSyncConfig};

    // App types
    pub use crate::app::{EngineApp, EngineBuilder, FrameStats};
}

/// Initialize logging for the engine
pub fn init_logging() {
    init_logging_with_filter(None);
}

/// Initialize logging with an explicit filter directive.
///
/// Falls back to `RUST_LOG`, then to `info`. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_logging_with_filter(filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = match filter {
        Some(directive) => tracing_subscriber::EnvFilter::new(directive),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_can_be_installed_twice() {
        init_logging_with_filter(Some("scene_engine=debug"));
        init_logging();
        tracing::warn!("Logging installed");
    }
}
