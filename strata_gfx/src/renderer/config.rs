/// Renderer configuration

use crate::graphics_device::PolygonOffset;

/// Construction-time settings for the renderers
///
/// `Default` gives the values the shaders were tuned with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Capacity of the UI stream buffer, in vertices
    pub ui_buffer_capacity: u32,
    /// Alpha below which transparent shadow casters are discarded
    pub alpha_scissor: f32,
    /// Depth bias applied while rendering shadow maps
    pub shadow_depth_bias: PolygonOffset,
    /// First texture unit used by the terrain renderer
    pub terrain_texture_base_unit: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            ui_buffer_capacity: 131_072,
            alpha_scissor: 0.5,
            shadow_depth_bias: PolygonOffset { factor: 2.0, units: 8.0 },
            terrain_texture_base_unit: 4,
        }
    }
}

impl RendererConfig {
    pub fn with_ui_buffer_capacity(mut self, capacity: u32) -> Self {
        self.ui_buffer_capacity = capacity;
        self
    }

    pub fn with_alpha_scissor(mut self, alpha: f32) -> Self {
        self.alpha_scissor = alpha;
        self
    }

    pub fn with_shadow_depth_bias(mut self, factor: f32, units: f32) -> Self {
        self.shadow_depth_bias = PolygonOffset { factor, units };
        self
    }

    pub fn with_terrain_texture_base_unit(mut self, unit: u32) -> Self {
        self.terrain_texture_base_unit = unit;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
