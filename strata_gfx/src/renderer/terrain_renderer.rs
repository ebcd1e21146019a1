/// Terrain renderer - lit 3D geometry with PBR materials, fog and shadow regions

use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::Result;
use crate::graphics_device::{
    lock_device, CullMode, DepthState, GraphicsDevice, ProgramId, SharedGraphicsDevice,
    Texture, TextureId, UniformValue, VertexBuffer,
};
use crate::renderer::shaders;
use crate::renderer::texture_slot::{create_white_texture, TextureSlot};
use crate::renderer::uniform_table::UniformTable;
use crate::renderer::{Color, PassRenderer, PassState, RendererConfig, RendererStats, SceneRenderer};
use crate::{gfx_info, gfx_warn};

const SOURCE: &str = "strata::TerrainRenderer";

/// Shadow regions the terrain shader samples
pub const MAX_SHADOW_REGIONS: usize = 4;

const SHADOW_TRANSFORM: [&str; MAX_SHADOW_REGIONS] = [
    "u_shadows[0].transform",
    "u_shadows[1].transform",
    "u_shadows[2].transform",
    "u_shadows[3].transform",
];
const SHADOW_OFFSET: [&str; MAX_SHADOW_REGIONS] = [
    "u_shadows[0].offset",
    "u_shadows[1].offset",
    "u_shadows[2].offset",
    "u_shadows[3].offset",
];
const SHADOW_SCALE: [&str; MAX_SHADOW_REGIONS] = [
    "u_shadows[0].scale",
    "u_shadows[1].scale",
    "u_shadows[2].scale",
    "u_shadows[3].scale",
];

/// One shadow region: light-space transform and its rectangle in the shadow atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParam {
    pub transform: Mat4,
    pub offset: Vec2,
    pub scale: Vec2,
}

impl Default for ShadowParam {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
        }
    }
}

/// Normal matrix for `model`: inverse-transpose of its upper 3x3 block
///
/// A singular model matrix yields its linear part unchanged.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(*model);
    let determinant = linear.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return linear;
    }
    let normal = linear.inverse().transpose();
    if normal.is_finite() { normal } else { linear }
}

bitflags! {
    /// Uniform groups changed since the last draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TerrainDirty: u32 {
        const PROJECTION = 1 << 0;
        const VIEW       = 1 << 1;
        const MODEL      = 1 << 2;
        const ALBEDO     = 1 << 3;
        const EMISSIVE   = 1 << 4;
        const MATERIAL   = 1 << 5;
        const LIGHT      = 1 << 6;
        const SKY        = 1 << 7;
        const FOG        = 1 << 8;
        const SHADOWS    = 1 << 9;
    }
}

/// Texture units, in order from the configured base unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerrainTexture {
    Albedo = 0,
    Detail = 1,
    Emissive = 2,
    Material = 3,
    ShadowMap = 4,
}

const TEXTURE_COUNT: usize = 5;

const SAMPLERS: [&str; TEXTURE_COUNT] = [
    "u_albedo_texture",
    "u_detail_texture",
    "u_emissive_texture",
    "u_material_texture",
    "u_shadow_map",
];

/// Host copy of every terrain uniform
#[derive(Debug, Clone)]
struct TerrainUniforms {
    projection: Mat4,
    view: Mat4,
    camera_position: Vec3,
    model: Mat4,
    normal: Mat3,

    albedo_color: Color,
    emissive_color: Color,
    roughness: f32,
    metalness: f32,
    ao_strength: f32,

    light_position: Vec4,
    light_intensity: f32,
    light_color: Vec3,

    sky_color: Color,
    sky_intensity: f32,

    fog_range: Vec2,
    fog_color: Vec3,

    shadow_count: usize,
    shadows: [ShadowParam; MAX_SHADOW_REGIONS],
}

impl Default for TerrainUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            model: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
            albedo_color: Color::WHITE,
            emissive_color: Color::BLACK,
            roughness: 1.0,
            metalness: 0.0,
            ao_strength: 1.0,
            light_position: Vec4::new(0.0, 1.0, 0.0, 0.0),
            light_intensity: 1.0,
            light_color: Vec3::ONE,
            sky_color: Color::WHITE,
            sky_intensity: 0.0,
            fog_range: Vec2::new(f32::MAX, f32::MAX),
            fog_color: Vec3::ONE,
            shadow_count: 0,
            shadows: [ShadowParam::default(); MAX_SHADOW_REGIONS],
        }
    }
}

/// Renders opaque lit geometry
///
/// Setters record state; uniforms are written in groups by the next
/// [`draw_object`](Self::draw_object), textures are bound immediately.
pub struct TerrainRenderer {
    device: SharedGraphicsDevice,
    state: PassState,

    program: ProgramId,
    uniform_table: UniformTable,
    uniforms: TerrainUniforms,
    dirty: TerrainDirty,

    white_texture: TextureId,
    texture_slots: [TextureSlot; TEXTURE_COUNT],

    stats: RendererStats,
}

impl TerrainRenderer {
    pub fn new(device: SharedGraphicsDevice, config: &RendererConfig) -> Result<Self> {
        let base = config.terrain_texture_base_unit;
        let texture_slots: [TextureSlot; TEXTURE_COUNT] =
            std::array::from_fn(|index| TextureSlot::new(base + index as u32));

        let shared = device.clone();
        let mut guard = lock_device(&shared)?;

        let program = guard.create_program(shaders::TERRAIN_PROGRAM)?;
        let white_texture = create_white_texture(&mut *guard)?;

        let mut uniform_table = UniformTable::new(program);
        let samplers: [(&'static str, u32); TEXTURE_COUNT] =
            std::array::from_fn(|index| (SAMPLERS[index], texture_slots[index].unit()));
        uniform_table.bind_samplers(&mut *guard, &samplers);
        guard.use_program(None);
        drop(guard);

        gfx_info!(SOURCE, "Terrain renderer created (texture units {}..{})", base, base + TEXTURE_COUNT as u32);

        Ok(Self {
            device,
            state: PassState::Idle,
            program,
            uniform_table,
            uniforms: TerrainUniforms::default(),
            dirty: TerrainDirty::all(),
            white_texture,
            texture_slots,
            stats: RendererStats::default(),
        })
    }

    // ===== MATERIAL =====

    pub fn set_albedo_color(&mut self, color: Color) -> Result<()> {
        self.state.require_active(SOURCE, "set_albedo_color")?;
        self.uniforms.albedo_color = color;
        self.dirty |= TerrainDirty::ALBEDO;
        Ok(())
    }

    pub fn set_albedo_texture(&mut self, texture: &Texture) -> Result<()> {
        self.bind_texture(TerrainTexture::Albedo, texture, "set_albedo_texture")
    }

    pub fn set_emissive_color(&mut self, color: Color) -> Result<()> {
        self.state.require_active(SOURCE, "set_emissive_color")?;
        self.uniforms.emissive_color = color;
        self.dirty |= TerrainDirty::EMISSIVE;
        Ok(())
    }

    pub fn set_emissive_texture(&mut self, texture: &Texture) -> Result<()> {
        self.bind_texture(TerrainTexture::Emissive, texture, "set_emissive_texture")
    }

    /// Scale factors applied to the material texture's channels
    /// (occlusion in red, roughness in green, metalness in blue)
    pub fn set_material_params(&mut self, roughness: f32, metalness: f32, ao_strength: f32) -> Result<()> {
        self.state.require_active(SOURCE, "set_material_params")?;
        self.uniforms.roughness = roughness;
        self.uniforms.metalness = metalness;
        self.uniforms.ao_strength = ao_strength;
        self.dirty |= TerrainDirty::MATERIAL;
        Ok(())
    }

    pub fn set_material_texture(&mut self, texture: &Texture) -> Result<()> {
        self.bind_texture(TerrainTexture::Material, texture, "set_material_texture")
    }

    pub fn set_detail_texture(&mut self, texture: &Texture) -> Result<()> {
        self.bind_texture(TerrainTexture::Detail, texture, "set_detail_texture")
    }

    // ===== LIGHTING =====

    /// Depth texture rendered by the shadow pass
    pub fn set_shadow_map(&mut self, texture: &Texture) -> Result<()> {
        self.bind_texture(TerrainTexture::ShadowMap, texture, "set_shadow_map")
    }

    /// Single light; `position.w == 0` makes it directional
    pub fn set_light(&mut self, position: Vec4, intensity: f32, color: Vec3) -> Result<()> {
        self.state.require_active(SOURCE, "set_light")?;
        self.uniforms.light_position = position;
        self.uniforms.light_intensity = intensity;
        self.uniforms.light_color = color;
        self.dirty |= TerrainDirty::LIGHT;
        Ok(())
    }

    /// Ambient term
    pub fn set_sky(&mut self, color: Color, intensity: f32) -> Result<()> {
        self.state.require_active(SOURCE, "set_sky")?;
        self.uniforms.sky_color = color;
        self.uniforms.sky_intensity = intensity;
        self.dirty |= TerrainDirty::SKY;
        Ok(())
    }

    /// Replace the shadow region set
    ///
    /// At most [`MAX_SHADOW_REGIONS`] entries are used; extra entries are
    /// ignored with a warning.
    pub fn set_shadow_params(&mut self, params: &[ShadowParam]) -> Result<()> {
        self.state.require_active(SOURCE, "set_shadow_params")?;
        if params.len() > MAX_SHADOW_REGIONS {
            gfx_warn!(
                SOURCE,
                "{} shadow regions given, only the first {} are used",
                params.len(),
                MAX_SHADOW_REGIONS
            );
        }
        let count = params.len().min(MAX_SHADOW_REGIONS);
        self.uniforms.shadows[..count].copy_from_slice(&params[..count]);
        self.uniforms.shadow_count = count;
        self.dirty |= TerrainDirty::SHADOWS;
        Ok(())
    }

    /// Linear fog between view distances `min` and `max`
    pub fn set_fog(&mut self, min: f32, max: f32, color: Vec3) -> Result<()> {
        self.state.require_active(SOURCE, "set_fog")?;
        self.uniforms.fog_range = Vec2::new(min, max);
        self.uniforms.fog_color = color;
        self.dirty |= TerrainDirty::FOG;
        Ok(())
    }

    // ===== DRAWING =====

    /// Draw `buffer` with `matrix` as its model matrix
    pub fn draw_object(&mut self, matrix: &Mat4, buffer: &dyn VertexBuffer) -> Result<()> {
        self.state.require_active(SOURCE, "draw_object")?;
        self.store_model_matrix(matrix);

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

    /// Normal matrix derived from the current model matrix
    pub fn normal_matrix(&self) -> Mat3 {
        self.uniforms.normal
    }

    /// Camera position derived from the current view matrix
    pub fn camera_position(&self) -> Vec3 {
        self.uniforms.camera_position
    }

    // ===== INTERNALS =====

    fn bind_texture(&mut self, which: TerrainTexture, texture: &Texture, operation: &str) -> Result<()> {
        self.state.require_active(SOURCE, operation)?;
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        if self.texture_slots[which as usize].bind(&mut *device, texture, self.white_texture) {
            self.stats.texture_binds += 1;
        }
        Ok(())
    }

    fn store_model_matrix(&mut self, matrix: &Mat4) {
        self.uniforms.model = *matrix;
        self.uniforms.normal = normal_matrix(matrix);
        self.dirty |= TerrainDirty::MODEL;
    }

    fn flush_uniforms(&mut self, device: &mut dyn GraphicsDevice) {
        if self.dirty.is_empty() {
            return;
        }
        let u = &self.uniforms;
        let table = &mut self.uniform_table;
        let uploads = &mut self.stats.uniform_uploads;
        let mut upload = |name: &'static str, value: UniformValue| {
            if table.set(device, name, value) {
                *uploads += 1;
            }
        };

        if self.dirty.contains(TerrainDirty::PROJECTION) {
            upload("u_projection_matrix", UniformValue::Mat4(u.projection));
        }
        if self.dirty.contains(TerrainDirty::VIEW) {
            upload("u_view_matrix", UniformValue::Mat4(u.view));
            upload("u_camera_position", UniformValue::Vec3(u.camera_position));
        }
        if self.dirty.contains(TerrainDirty::MODEL) {
            upload("u_model_matrix", UniformValue::Mat4(u.model));
            upload("u_normal_matrix", UniformValue::Mat3(u.normal));
        }
        if self.dirty.contains(TerrainDirty::ALBEDO) {
            upload("u_albedo_color", UniformValue::Vec4(u.albedo_color.into()));
        }
        if self.dirty.contains(TerrainDirty::EMISSIVE) {
            upload("u_emissive_color", UniformValue::Vec4(u.emissive_color.into()));
        }
        if self.dirty.contains(TerrainDirty::MATERIAL) {
            upload("u_roughness", UniformValue::Float(u.roughness));
            upload("u_metalness", UniformValue::Float(u.metalness));
            upload("u_ao_strength", UniformValue::Float(u.ao_strength));
        }
        if self.dirty.contains(TerrainDirty::LIGHT) {
            upload("u_light_position", UniformValue::Vec4(u.light_position));
            upload("u_light_intensity", UniformValue::Float(u.light_intensity));
            upload("u_light_color", UniformValue::Vec3(u.light_color));
        }
        if self.dirty.contains(TerrainDirty::SKY) {
            upload("u_sky_color", UniformValue::Vec4(u.sky_color.into()));
            upload("u_sky_intensity", UniformValue::Float(u.sky_intensity));
        }
        if self.dirty.contains(TerrainDirty::FOG) {
            upload("u_fog_range", UniformValue::Vec2(u.fog_range));
            upload("u_fog_color", UniformValue::Vec3(u.fog_color));
        }
        if self.dirty.contains(TerrainDirty::SHADOWS) {
            upload("u_shadow_regions", UniformValue::Int(u.shadow_count as i32));
            for (index, shadow) in u.shadows[..u.shadow_count].iter().enumerate() {
                upload(SHADOW_TRANSFORM[index], UniformValue::Mat4(shadow.transform));
                upload(SHADOW_OFFSET[index], UniformValue::Vec2(shadow.offset));
                upload(SHADOW_SCALE[index], UniformValue::Vec2(shadow.scale));
            }
        }

        self.dirty = TerrainDirty::empty();
    }
}

impl PassRenderer for TerrainRenderer {
    fn begin(&mut self) -> Result<()> {
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        self.state.enter(SOURCE)?;
        self.stats = RendererStats::default();

        device.use_program(Some(self.program));
        device.set_depth_state(DepthState::READ_WRITE);
        device.set_cull_mode(CullMode::Back);
        device.set_blend(None);

        for slot in &mut self.texture_slots {
            slot.reset();
            if slot.bind(&mut *device, &Texture::default(), self.white_texture) {
                self.stats.texture_binds += 1;
            }
        }
        self.dirty = TerrainDirty::all();
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.state.leave(SOURCE)
    }

    fn is_active(&self) -> bool {
        self.state == PassState::Active
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }
}

impl SceneRenderer for TerrainRenderer {
    fn set_projection_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        self.state.require_active(SOURCE, "set_projection_matrix")?;
        self.uniforms.projection = *matrix;
        self.dirty |= TerrainDirty::PROJECTION;
        Ok(())
    }

    fn set_view_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        self.state.require_active(SOURCE, "set_view_matrix")?;
        self.uniforms.view = *matrix;
        self.uniforms.camera_position = matrix.inverse().w_axis.truncate();
        self.dirty |= TerrainDirty::VIEW;
        Ok(())
    }

    fn set_model_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        self.state.require_active(SOURCE, "set_model_matrix")?;
        self.store_model_matrix(matrix);
        Ok(())
    }
}

impl Drop for TerrainRenderer {
    fn drop(&mut self) {
        let Ok(mut device) = self.device.lock() else {
            return;
        };
        device.destroy_texture(self.white_texture);
        device.destroy_program(self.program);
        drop(device);
        gfx_info!(SOURCE, "Terrain renderer destroyed");
    }
}

#[cfg(test)]
#[path = "terrain_renderer_tests.rs"]
mod tests;
