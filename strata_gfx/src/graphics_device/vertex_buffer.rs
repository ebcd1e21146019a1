/// Vertex buffer resource consumed by the terrain and shadow renderers
///
/// The buffer is owned elsewhere (mesh loading, scene); renderers only read
/// enough of it to issue a draw.

use crate::graphics_device::{PrimitiveTopology, VertexArrayId};

pub trait VertexBuffer {
    /// Topology of the stored geometry
    fn topology(&self) -> PrimitiveTopology;

    /// Vertex array binding the buffer to its layout
    fn vertex_array(&self) -> VertexArrayId;

    /// Number of vertices
    fn vertex_count(&self) -> u32;

    /// Number of indices, 0 for non-indexed geometry
    fn index_count(&self) -> u32 {
        0
    }
}
