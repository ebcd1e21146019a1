/// Renderer traits - the contract shared by the UI, terrain and shadow renderers

use glam::Mat4;

use crate::error::Result;

// ============================================================================
// Statistics
// ============================================================================

/// Per-pass counters, reset by `begin`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Draw submissions (a multi-draw counts once)
    pub draw_calls: u32,
    /// Vertices (or indices) submitted
    pub vertices: u32,
    /// Texture binds that reached the device
    pub texture_binds: u32,
    /// Uniform writes: single uniforms, or whole uniform blocks
    pub uniform_uploads: u32,
    /// UI batches uploaded through the staging copy instead of a mapping
    pub staged_flushes: u32,
}

// ============================================================================
// Traits
// ============================================================================

/// A renderer with an explicit Idle/Active pass
///
/// Every drawing or state operation requires an active pass. Calls made
/// while idle return `Error::InvalidState` and issue no device command.
pub trait PassRenderer {
    /// Enter the pass and bind this renderer's program and fixed-function state
    fn begin(&mut self) -> Result<()>;

    /// Leave the pass
    fn end(&mut self) -> Result<()>;

    fn is_active(&self) -> bool;

    /// Counters accumulated since the last `begin`
    fn stats(&self) -> RendererStats;
}

/// A pass renderer drawing world-space geometry
///
/// Matrix setters only record state; it is uploaded at the next draw.
pub trait SceneRenderer: PassRenderer {
    fn set_projection_matrix(&mut self, matrix: &Mat4) -> Result<()>;

    fn set_view_matrix(&mut self, matrix: &Mat4) -> Result<()>;

    fn set_model_matrix(&mut self, matrix: &Mat4) -> Result<()>;
}
