//! Scene graph nodes
//!
//! Nodes live in a `hecs` arena owned by [`SceneGraph`]. This module holds the
//! node components, the hierarchy and dirty-propagation operations, and the
//! deferred begin/deletion lifecycle.

pub mod components;
pub mod hierarchy;
pub mod lifecycle;
pub mod world;

// Re-export commonly used types
pub use components::{
    DirtyListener, GlobalTransformCache, Hierarchy, IdAllocator, NodeId, NodeInfo, Transform,
};
pub use hierarchy::PoseTolerance;
pub use lifecycle::{Behaviour, BehaviourSlot};
pub use world::SceneGraph;

// Re-export hecs types that users will need
pub use hecs::Entity;
