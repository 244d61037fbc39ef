//! Physics synchronization for scene graph nodes
//!
//! The simulation itself is an external collaborator behind
//! [`PhysicsBackend`]. This module keeps node world poses and body poses
//! consistent in both directions, once per fixed simulation step.

pub mod accumulator;
pub mod backend;
pub mod components;
pub mod sync;

// Re-export commonly used types
pub use accumulator::PhysicsAccumulator;
pub use backend::{PhysicsBackend, SimpleBody, SimplePhysicsWorld};
pub use components::{BodyId, PhysicsBody};
pub use sync::{physics_update_system, pull_inbound, push_outbound};
