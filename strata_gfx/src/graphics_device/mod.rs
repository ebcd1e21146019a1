/// Graphics device module - the device boundary the renderers are written against

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod program;
pub mod pipeline;
pub mod frame_buffer;
pub mod vertex_buffer;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use texture::*;
pub use program::*;
pub use pipeline::*;
pub use frame_buffer::*;
pub use vertex_buffer::*;

// Recording graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
