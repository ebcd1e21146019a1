/// Shadow renderer - depth-only pass from the light into an owned framebuffer
///
/// The framebuffer wraps the depth texture given to `set_shadow_map`.
/// Several regions of that texture can be filled in one pass by moving the
/// viewport with `set_shadow_region`, which is how cascades share one atlas.

use bitflags::bitflags;
use glam::{Mat4, Vec2};

use crate::error::Result;
use crate::graphics_device::{
    lock_device, ClearValue, CullMode, DepthState, FramebufferDesc, FramebufferId,
    GraphicsDevice, PolygonOffset, ProgramId, SharedGraphicsDevice, Texture, TextureId,
    UniformValue, VertexBuffer, Viewport,
};
use crate::renderer::shaders;
use crate::renderer::texture_slot::{create_white_texture, TextureSlot};
use crate::renderer::uniform_table::UniformTable;
use crate::renderer::{PassRenderer, PassState, RendererConfig, RendererStats, SceneRenderer};
use crate::{gfx_bail, gfx_debug, gfx_info};

const SOURCE: &str = "strata::ShadowRenderer";

const TEXTURE_UNIT: u32 = 0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ShadowDirty: u32 {
        const PROJECTION    = 1 << 0;
        const VIEW          = 1 << 1;
        const MODEL         = 1 << 2;
        const ALPHA_SCISSOR = 1 << 3;
    }
}

/// Framebuffer wrapping the current shadow map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShadowTarget {
    framebuffer: FramebufferId,
    texture: TextureId,
    width: u32,
    height: u32,
}

impl ShadowTarget {
    fn full_viewport(&self) -> Viewport {
        Viewport { x: 0, y: 0, width: self.width, height: self.height }
    }

    /// Sub-rectangle of the target; `offset` and `scale` are fractions of its size
    fn region_viewport(&self, offset: Vec2, scale: Vec2) -> Viewport {
        let size = Vec2::new(self.width as f32, self.height as f32);
        let origin = (offset * size).round();
        let extent = (scale * size).round().max(Vec2::ZERO);
        Viewport {
            x: origin.x as i32,
            y: origin.y as i32,
            width: extent.x as u32,
            height: extent.y as u32,
        }
    }
}

/// Renders shadow casters into a depth texture
pub struct ShadowRenderer {
    device: SharedGraphicsDevice,
    state: PassState,

    program: ProgramId,
    uniform_table: UniformTable,
    projection: Mat4,
    view: Mat4,
    model: Mat4,
    alpha_scissor: f32,
    dirty: ShadowDirty,

    /// Threshold used for transparent casters
    transparent_scissor: f32,
    depth_bias: PolygonOffset,

    target: Option<ShadowTarget>,

    white_texture: TextureId,
    texture_slot: TextureSlot,

    stats: RendererStats,
}

impl ShadowRenderer {
    pub fn new(device: SharedGraphicsDevice, config: &RendererConfig) -> Result<Self> {
        let shared = device.clone();
        let mut guard = lock_device(&shared)?;

        let program = guard.create_program(shaders::SHADOW_PROGRAM)?;
        let white_texture = create_white_texture(&mut *guard)?;

        let mut uniform_table = UniformTable::new(program);
        uniform_table.bind_samplers(&mut *guard, &[("u_texture", TEXTURE_UNIT)]);
        guard.use_program(None);
        drop(guard);

        gfx_info!(SOURCE, "Shadow renderer created");

        Ok(Self {
            device,
            state: PassState::Idle,
            program,
            uniform_table,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            alpha_scissor: 0.0,
            dirty: ShadowDirty::all(),
            transparent_scissor: config.alpha_scissor,
            depth_bias: config.shadow_depth_bias,
            target: None,
            white_texture,
            texture_slot: TextureSlot::new(TEXTURE_UNIT),
            stats: RendererStats::default(),
        })
    }

    /// Attach the depth texture the pass renders into
    ///
    /// Allowed in either state. The framebuffer is rebuilt only when the
    /// texture or its size changes; during a pass the new target is bound
    /// immediately.
    pub fn set_shadow_map(&mut self, texture: &Texture) -> Result<()> {
        let Some(id) = texture.id else {
            gfx_bail!(SOURCE, InvalidArgument, "set_shadow_map requires a valid texture");
        };
        let (width, height) = (texture.size.x, texture.size.y);
        if width == 0 || height == 0 {
            gfx_bail!(SOURCE, InvalidArgument, "shadow map has zero size ({}x{})", width, height);
        }
        if let Some(target) = &self.target {
            if target.texture == id && target.width == width && target.height == height {
                return Ok(());
            }
        }

        let device = self.device.clone();
        let mut device = lock_device(&device)?;

        let framebuffer = device.create_framebuffer(FramebufferDesc {
            color_attachment: None,
            depth_attachment: Some(id),
            width,
            height,
        })?;
        if let Some(old) = self.target.take() {
            device.destroy_framebuffer(old.framebuffer);
        }
        let target = ShadowTarget { framebuffer, texture: id, width, height };
        self.target = Some(target);
        gfx_debug!(SOURCE, "Shadow framebuffer rebuilt ({}x{})", width, height);

        if self.state == PassState::Active {
            device.bind_framebuffer(Some(framebuffer));
            device.set_viewport(target.full_viewport());
        }
        Ok(())
    }

    /// Size of the attached shadow map
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.target.map(|target| (target.width, target.height))
    }

    /// Surface texture whose alpha is tested for transparent casters
    pub fn set_texture(&mut self, texture: &Texture) -> Result<()> {
        self.state.require_active(SOURCE, "set_texture")?;
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        if self.texture_slot.bind(&mut *device, texture, self.white_texture) {
            self.stats.texture_binds += 1;
        }
        Ok(())
    }

    /// Restrict rendering to one region of the shadow map
    ///
    /// `offset` and `scale` are fractions of the map size.
    pub fn set_shadow_region(&mut self, offset: Vec2, scale: Vec2) -> Result<()> {
        self.state.require_active(SOURCE, "set_shadow_region")?;
        let Some(target) = self.target else {
            gfx_bail!(SOURCE, InvalidState, "set_shadow_region called without a shadow map");
        };
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        device.set_viewport(target.region_viewport(offset, scale));
        Ok(())
    }

    /// Draw a caster; transparent casters discard fragments below the alpha scissor
    pub fn draw_object(&mut self, buffer: &dyn VertexBuffer, transparent: bool) -> Result<()> {
        self.state.require_active(SOURCE, "draw_object")?;

        let scissor = if transparent { self.transparent_scissor } else { 0.0 };
        if scissor != self.alpha_scissor {
            self.alpha_scissor = scissor;
            self.dirty |= ShadowDirty::ALPHA_SCISSOR;
        }

        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        self.flush_uniforms(&mut *device);

        device.bind_vertex_array(buffer.vertex_array());
        let count = if buffer.index_count() > 0 {
            device.draw_indexed(buffer.topology(), buffer.index_count())?;
            buffer.index_count()
        } else {
            device.draw(buffer.topology(), 0, buffer.vertex_count())?;
            buffer.vertex_count()
        };

        self.stats.draw_calls += 1;
        self.stats.vertices += count;
        Ok(())
    }

    fn flush_uniforms(&mut self, device: &mut dyn GraphicsDevice) {
        let table = &mut self.uniform_table;
        let uploads = &mut self.stats.uniform_uploads;
        let mut upload = |name: &'static str, value: UniformValue| {
            if table.set(device, name, value) {
                *uploads += 1;
            }
        };
        if self.dirty.contains(ShadowDirty::PROJECTION) {
            upload("u_projection_matrix", UniformValue::Mat4(self.projection));
        }
        if self.dirty.contains(ShadowDirty::VIEW) {
            upload("u_view_matrix", UniformValue::Mat4(self.view));
        }
        if self.dirty.contains(ShadowDirty::MODEL) {
            upload("u_model_matrix", UniformValue::Mat4(self.model));
        }
        if self.dirty.contains(ShadowDirty::ALPHA_SCISSOR) {
            upload("u_alpha_scissor", UniformValue::Float(self.alpha_scissor));
        }
        self.dirty = ShadowDirty::empty();
    }
}

impl PassRenderer for ShadowRenderer {
    /// Bind the shadow framebuffer and clear its depth
    ///
    /// Fails if no shadow map is attached.
    fn begin(&mut self) -> Result<()> {
        let Some(target) = self.target else {
            gfx_bail!(SOURCE, InvalidState, "begin called without a shadow map");
        };
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        self.state.enter(SOURCE)?;
        self.stats = RendererStats::default();

        device.bind_framebuffer(Some(target.framebuffer));
        device.set_viewport(target.full_viewport());
        device.use_program(Some(self.program));
        device.set_depth_state(DepthState::READ_WRITE);
        device.set_cull_mode(CullMode::None);
        device.set_blend(None);
        device.set_color_write(false);
        device.set_polygon_offset(Some(self.depth_bias));
        device.clear(ClearValue::Depth(1.0));

        self.texture_slot.reset();
        if self.texture_slot.bind(&mut *device, &Texture::default(), self.white_texture) {
            self.stats.texture_binds += 1;
        }
        self.dirty = ShadowDirty::all();
        Ok(())
    }

    /// Restore color writes and the default framebuffer
    fn end(&mut self) -> Result<()> {
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        self.state.leave(SOURCE)?;

        device.set_color_write(true);
        device.set_polygon_offset(None);
        device.bind_framebuffer(None);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state == PassState::Active
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }
}

impl SceneRenderer for ShadowRenderer {
    fn set_projection_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        self.state.require_active(SOURCE, "set_projection_matrix")?;
        self.projection = *matrix;
        self.dirty |= ShadowDirty::PROJECTION;
        Ok(())
    }

    fn set_view_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        self.state.require_active(SOURCE, "set_view_matrix")?;
        self.view = *matrix;
        self.dirty |= ShadowDirty::VIEW;
        Ok(())
    }

    fn set_model_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        self.state.require_active(SOURCE, "set_model_matrix")?;
        self.model = *matrix;
        self.dirty |= ShadowDirty::MODEL;
        Ok(())
    }
}

impl Drop for ShadowRenderer {
    fn drop(&mut self) {
        let Ok(mut device) = self.device.lock() else {
            return;
        };
        if let Some(target) = self.target.take() {
            device.destroy_framebuffer(target.framebuffer);
        }
        device.destroy_texture(self.white_texture);
        device.destroy_program(self.program);
        drop(device);
        gfx_info!(SOURCE, "Shadow renderer destroyed");
    }
}

#[cfg(test)]
#[path = "shadow_renderer_tests.rs"]
mod tests;
