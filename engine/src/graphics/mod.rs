//! Bridge between scene nodes and the rendering collaborator

pub mod render_proxy;
pub mod uniform;

pub use render_proxy::{collect_render_updates, MeshId, MeshRenderer};
pub use uniform::ObjectUniform;
