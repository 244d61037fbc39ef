//! GPU uniform data handed to the rendering collaborator

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-object uniform data
///
/// Contains the world model matrix and material color, laid out to match a
/// std140 `ObjectUniform` struct on the GPU side.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    /// Model matrix for world transformation
    pub model: [[f32; 4]; 4],
    /// Material color (RGBA)
    pub color: [f32; 4],
}

impl ObjectUniform {
    /// Create a new object uniform
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color,
        }
    }

    /// Raw bytes ready for a buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_uniform_size() {
        use std::mem;
        // 16 floats for the matrix + 4 floats for color
        assert_eq!(mem::size_of::<ObjectUniform>(), 80);
        assert_eq!(ObjectUniform::default().as_bytes().len(), 80);
    }

    #[test]
    fn test_object_uniform_creation() {
        let model = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let color = [1.0, 0.0, 0.0, 1.0];
        let uniform = ObjectUniform::new(model, color);
        assert_eq!(uniform.model, model.to_cols_array_2d());
        assert_eq!(uniform.color, color);
    }
}
