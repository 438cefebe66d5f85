//! Vertex layout for the colored triangle.
//!
//! # Memory Layout
//!
//! - Offset 0: position (`Vec2`, 8 bytes) at shader location 0
//! - Offset 8: color (`Vec3`, 12 bytes) at shader location 1
//! - Stride: 20 bytes

use std::mem::{offset_of, size_of};

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Clip-space position plus RGB color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec2,
    pub color: Vec3,
}

impl Vertex {
    #[inline]
    pub const fn new(position: Vec2, color: Vec3) -> Self {
        Self { position, color }
    }

    /// Binding 0, advanced per vertex.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(Self, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Self, color) as u32,
            },
        ]
    }
}

/// Red top, green bottom-right, blue bottom-left; clockwise in Vulkan clip space.
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new(Vec2::new(0.0, -0.5), Vec3::new(1.0, 0.0, 0.0)),
    Vertex::new(Vec2::new(0.5, 0.5), Vec3::new(0.0, 1.0, 0.0)),
    Vertex::new(Vec2::new(-0.5, 0.5), Vec3::new(0.0, 0.0, 1.0)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size_and_stride() {
        assert_eq!(size_of::<Vertex>(), 20);
        assert_eq!(Vertex::binding_description().stride, 20);
        assert_eq!(Vertex::binding_description().binding, 0);
        assert_eq!(
            Vertex::binding_description().input_rate,
            vk::VertexInputRate::VERTEX
        );
    }

    #[test]
    fn test_attribute_descriptions() {
        let [position, color] = Vertex::attribute_descriptions();

        assert_eq!(position.location, 0);
        assert_eq!(position.format, vk::Format::R32G32_SFLOAT);
        assert_eq!(position.offset, 0);

        assert_eq!(color.location, 1);
        assert_eq!(color.format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(color.offset, 8);
    }

    #[test]
    fn test_triangle_bytes() {
        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE_VERTICES);
        assert_eq!(bytes.len(), 60);

        let first: &Vertex = bytemuck::from_bytes(&bytes[..20]);
        assert_eq!(first.position, Vec2::new(0.0, -0.5));
        assert_eq!(first.color, Vec3::X);
    }

    #[test]
    fn test_triangle_is_clockwise() {
        // Signed area in a y-down space is positive for clockwise winding.
        let [a, b, c] = TRIANGLE_VERTICES.map(|v| v.position);
        let area = (b - a).perp_dot(c - a);
        assert!(area > 0.0);
    }
}
