//! Vertex data structures and input descriptions.
//!
//! This module defines the vertex format used by the mesh pipeline:
//! position, color, normal, and UV, matching the layout consumed by the
//! forward shaders.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Vertex format for mesh rendering.
///
/// Each vertex contains:
/// - Position (Vec3): 3D position in model space
/// - Color (Vec3): per-vertex RGB color
/// - Normal (Vec3): surface normal
/// - UV (Vec2): texture coordinates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    /// Creates a new vertex.
    #[inline]
    pub const fn new(position: Vec3, color: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }

    /// Get the vertex input binding description.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, position) as u32,
            },
            // Color at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, color) as u32,
            },
            // Normal at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, normal) as u32,
            },
            // UV at location 3
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, uv) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride_matches_layout() {
        // 3 + 3 + 3 + 2 floats, tightly packed
        assert_eq!(std::mem::size_of::<Vertex>(), 11 * 4);
        assert_eq!(
            Vertex::binding_description().stride,
            std::mem::size_of::<Vertex>() as u32
        );
    }

    #[test]
    fn test_attribute_offsets_are_increasing() {
        let attrs = Vertex::attribute_descriptions();
        assert_eq!(attrs[0].offset, 0);
        for pair in attrs.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
        // Locations are consecutive from 0
        for (i, attr) in attrs.iter().enumerate() {
            assert_eq!(attr.location, i as u32);
            assert_eq!(attr.binding, 0);
        }
    }
}
