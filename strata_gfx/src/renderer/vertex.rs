/// Screen-space vertex streamed by the UI renderer

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::graphics_device::{BufferFormat, VertexLayout};
use crate::renderer::Color;

/// 2D vertex: position in projection space, texture coordinates, RGBA8 color
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex2D {
    pub position: Vec2,
    pub uv: Vec2,
    pub color: [u8; 4],
}

impl Vertex2D {
    /// Size of one vertex in bytes
    pub const SIZE: u64 = std::mem::size_of::<Vertex2D>() as u64;

    pub fn new(position: Vec2, uv: Vec2, color: Color) -> Self {
        Self {
            position,
            uv,
            color: color.to_u8(),
        }
    }

    /// Interleaved layout matching the UI vertex shader inputs
    pub fn layout() -> VertexLayout {
        VertexLayout::packed(&[
            BufferFormat::R32G32_SFLOAT,
            BufferFormat::R32G32_SFLOAT,
            BufferFormat::R8G8B8A8_UNORM,
        ])
    }
}

#[cfg(test)]
#[path = "vertex_tests.rs"]
mod tests;
