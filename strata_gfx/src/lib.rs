/*!
# Strata GFX

Real-time rendering backend built from three renderers sharing one
graphics device:

- **UiRenderer**: screen-space 2D primitives streamed through a mapped
  vertex buffer, with a staged upload path when mapping is unavailable
- **TerrainRenderer**: lit 3D geometry with PBR material parameters,
  one light, sky ambient, distance fog and up to four shadow regions
- **ShadowRenderer**: depth-only pass into an owned framebuffer with
  per-region viewports and an alpha scissor for transparent casters

Renderers talk to the GPU only through the [`GraphicsDevice`] trait, held
as a [`SharedGraphicsDevice`]. Each renderer is a small state machine:
`begin` opens a pass, setters and draws are valid while it is open, and
`end` closes it.

[`GraphicsDevice`]: graphics_device::GraphicsDevice
[`SharedGraphicsDevice`]: graphics_device::SharedGraphicsDevice
*/

pub mod error;
pub mod log;
pub mod graphics_device;
pub mod renderer;

// Main strata namespace module
pub mod strata {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{
            reset_logger, set_logger, set_min_severity, DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }

    // Device boundary
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Renderers and their shared types
    pub mod render {
        pub use crate::renderer::*;
    }
}

// Re-export math library at crate root
pub use glam;
