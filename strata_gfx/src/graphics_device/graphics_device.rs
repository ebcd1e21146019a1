/// GraphicsDevice trait - the renderers' only channel to the GPU

use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::graphics_device::{
    BlendFunc, BufferDesc, BufferId, ClearValue, CullMode, DepthState,
    FramebufferDesc, FramebufferId, PolygonOffset, PrimitiveTopology,
    ProgramDesc, ProgramId, Texture, TextureDesc, TextureId, UniformLocation,
    UniformValue, VertexArrayId, VertexLayout, Viewport,
};

/// Device shared by every renderer
///
/// Renderers hold a clone of this handle; the device outlives all of them.
/// Callers serialize renderer passes, the mutex only guards the handle.
pub type SharedGraphicsDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Lock the shared device, mapping a poisoned lock to a backend error
pub fn lock_device(device: &SharedGraphicsDevice) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))
}

/// Low-level graphics device
///
/// Implemented by backend-specific devices. Every call either updates
/// driver state or queues a GPU command; none blocks on GPU completion.
pub trait GraphicsDevice: Send {
    // ===== BUFFERS =====

    /// Create a buffer with undefined contents
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<BufferId>;

    /// Copy `data` into the buffer at `offset` bytes
    fn update_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()>;

    /// Give the buffer fresh storage of `size` bytes
    ///
    /// Previously queued draws keep reading the old storage.
    fn reallocate_buffer(&mut self, buffer: BufferId, size: u64) -> Result<()>;

    /// Map `size` bytes at `offset` for unsynchronized writing
    ///
    /// Returns `None` when the device declines the mapping; callers must
    /// then upload with `update_buffer`. The pointer stays valid until
    /// `unmap_buffer` is called for the same buffer.
    fn map_buffer(&mut self, buffer: BufferId, offset: u64, size: u64) -> Option<NonNull<u8>>;

    /// Finish a mapping; returns false if the mapped contents were lost
    fn unmap_buffer(&mut self, buffer: BufferId) -> bool;

    /// Destroy a buffer
    fn destroy_buffer(&mut self, buffer: BufferId);

    // ===== VERTEX INPUT =====

    /// Bind a buffer to a vertex layout
    fn create_vertex_array(&mut self, buffer: BufferId, layout: &VertexLayout) -> Result<VertexArrayId>;

    /// Make a vertex array current for subsequent draws
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Destroy a vertex array
    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId);

    // ===== TEXTURES =====

    /// Create a texture
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Texture>;

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureId);

    // ===== PROGRAMS =====

    /// Compile and link a program
    fn create_program(&mut self, desc: ProgramDesc) -> Result<ProgramId>;

    /// Make a program current, `None` unbinds
    fn use_program(&mut self, program: Option<ProgramId>);

    /// Look up a uniform by name, `None` if the program does not use it
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Write a uniform of the current program
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Attach a uniform buffer to a named uniform block of `program`
    fn bind_uniform_block(&mut self, program: ProgramId, block: &str, binding: u32, buffer: BufferId) -> Result<()>;

    /// Destroy a program
    fn destroy_program(&mut self, program: ProgramId);

    // ===== FRAMEBUFFERS =====

    /// Create a framebuffer; fails if the attachments are incomplete
    fn create_framebuffer(&mut self, desc: FramebufferDesc) -> Result<FramebufferId>;

    /// Bind a framebuffer, `None` selects the default one
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Destroy a framebuffer
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    // ===== FIXED-FUNCTION STATE =====

    fn set_viewport(&mut self, viewport: Viewport);

    /// `None` disables blending
    fn set_blend(&mut self, blend: Option<BlendFunc>);

    fn set_depth_state(&mut self, state: DepthState);

    fn set_cull_mode(&mut self, mode: CullMode);

    fn set_color_write(&mut self, enabled: bool);

    /// `None` disables depth bias
    fn set_polygon_offset(&mut self, offset: Option<PolygonOffset>);

    /// Clear the bound framebuffer
    fn clear(&mut self, value: ClearValue);

    // ===== DRAWS =====

    /// Draw `count` vertices starting at `first` from the bound vertex array
    fn draw(&mut self, topology: PrimitiveTopology, first: u32, count: u32) -> Result<()>;

    /// Draw `count` indices from the bound vertex array
    fn draw_indexed(&mut self, topology: PrimitiveTopology, count: u32) -> Result<()>;

    /// Draw several independent ranges in one submission
    ///
    /// `firsts` and `counts` have the same length.
    fn multi_draw(&mut self, topology: PrimitiveTopology, firsts: &[u32], counts: &[u32]) -> Result<()>;
}
