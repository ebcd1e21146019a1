/// Renderer module - the UI, terrain and shadow renderers and their shared pieces

// Module declarations
pub mod renderer;
pub mod config;
pub mod color;
pub mod vertex;
pub mod pass_state;
pub mod ui_renderer;
pub mod terrain_renderer;
pub mod shadow_renderer;
pub(crate) mod shaders;
pub(crate) mod texture_slot;
pub(crate) mod uniform_table;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use config::*;
pub use color::*;
pub use vertex::*;
pub use pass_state::*;
pub use ui_renderer::*;
pub use terrain_renderer::*;
pub use shadow_renderer::*;
