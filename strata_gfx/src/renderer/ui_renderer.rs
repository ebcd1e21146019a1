/// UI renderer - streams screen-space 2D primitives through one vertex buffer
///
/// Vertices are appended to a fixed-capacity stream buffer. A batch is
/// written straight into mapped GPU memory when the device grants a
/// mapping; otherwise it is staged in host memory and uploaded when the
/// batch is closed. Both paths end in one multi-draw per batch.

use std::ptr::NonNull;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::error::Result;
use crate::graphics_device::{
    lock_device, BlendFactor, BlendFunc, BufferDesc, BufferId, BufferUpdateRate,
    BufferUsage, CullMode, DepthState, GraphicsDevice, PrimitiveTopology, ProgramId,
    SharedGraphicsDevice, Texture, TextureId, VertexArrayId,
};
use crate::renderer::shaders;
use crate::renderer::texture_slot::{create_white_texture, TextureSlot};
use crate::renderer::uniform_table::UniformTable;
use crate::renderer::{Color, PassRenderer, PassState, RendererConfig, RendererStats, Vertex2D};
use crate::{gfx_bail, gfx_debug, gfx_err, gfx_info, gfx_trace, gfx_warn};

const SOURCE: &str = "strata::UiRenderer";

const TEXTURE_UNIT: u32 = 0;
const UNIFORM_BLOCK: &str = "UiUniforms";
const UNIFORM_BINDING: u32 = 0;

// ============================================================================
// Public types
// ============================================================================

/// Blend configuration applied to UI draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransparencyMode {
    /// No blending
    Opaque,
    /// Classic alpha blending
    #[default]
    Alpha,
    /// Black is transparent, brighter colors add on top
    Black,
    /// White is transparent, darker colors multiply
    White,
    /// Additive
    Additive,
}

impl TransparencyMode {
    /// Blend function for this mode, `None` disables blending
    pub fn blend_func(self) -> Option<BlendFunc> {
        let (src, dst) = match self {
            TransparencyMode::Opaque => return None,
            TransparencyMode::Alpha => (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            TransparencyMode::Black => (BlendFactor::One, BlendFactor::OneMinusSrcColor),
            TransparencyMode::White => (BlendFactor::DstColor, BlendFactor::Zero),
            TransparencyMode::Additive => (BlendFactor::One, BlendFactor::One),
        };
        Some(BlendFunc { src, dst })
    }
}

/// How a primitive batch reached the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPath {
    /// Written in place through a buffer mapping
    Mapped,
    /// Staged in host memory and copied with a buffer update
    Staged,
}

// ============================================================================
// Internal state
// ============================================================================

/// Host mirror of the `UiUniforms` block (std140 compatible)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct UiUniforms {
    pub projection: Mat4,
    pub color: Vec4,
}

impl Default for UiUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            color: Vec4::ONE,
        }
    }
}

/// Where the open batch is being written
#[derive(Debug, Clone, Copy)]
enum StreamTarget {
    Mapped(NonNull<Vertex2D>),
    Staged,
}

#[derive(Debug)]
struct PrimitiveBatch {
    topology: PrimitiveTopology,
    total: u32,
    target: StreamTarget,
}

// ============================================================================
// UiRenderer
// ============================================================================

/// Immediate-mode 2D renderer
///
/// # Example
///
/// ```no_run
/// # use strata_gfx::strata::{device::PrimitiveTopology, render::*, Result};
/// # fn frame(ui: &mut UiRenderer, quad: &[Vertex2D]) -> Result<()> {
/// ui.begin()?;
/// ui.set_projection(0.0, 1280.0, 720.0, 0.0)?;
/// ui.set_transparency(TransparencyMode::Alpha)?;
/// ui.draw_primitive(PrimitiveTopology::TriangleStrip, quad)?;
/// ui.end()?;
/// # Ok(())
/// # }
/// ```
pub struct UiRenderer {
    device: SharedGraphicsDevice,
    state: PassState,

    program: ProgramId,
    uniforms: UiUniforms,
    uniforms_dirty: bool,
    uniform_buffer: BufferId,

    vertex_buffer: BufferId,
    vertex_array: VertexArrayId,
    /// Stream buffer capacity in vertices
    capacity: u32,
    /// First free vertex in the stream buffer
    offset: u32,

    batch: Option<PrimitiveBatch>,
    firsts: Vec<u32>,
    counts: Vec<u32>,
    staging: Vec<Vertex2D>,

    white_texture: TextureId,
    texture_slot: TextureSlot,
    transparency: TransparencyMode,
    applied_transparency: Option<TransparencyMode>,

    stats: RendererStats,
}

impl UiRenderer {
    /// Create the UI program, its uniform buffer and the stream buffer
    pub fn new(device: SharedGraphicsDevice, config: &RendererConfig) -> Result<Self> {
        if config.ui_buffer_capacity == 0 {
            gfx_bail!(SOURCE, InvalidArgument, "ui_buffer_capacity must be at least one vertex");
        }
        let capacity = config.ui_buffer_capacity;

        let shared = device.clone();
        let mut guard = lock_device(&shared)?;

        let program = guard.create_program(shaders::UI_PROGRAM)?;
        let uniform_buffer = guard.create_buffer(BufferDesc {
            size: std::mem::size_of::<UiUniforms>() as u64,
            usage: BufferUsage::Uniform,
            update_rate: BufferUpdateRate::Stream,
        })?;
        guard.bind_uniform_block(program, UNIFORM_BLOCK, UNIFORM_BINDING, uniform_buffer)?;

        let vertex_buffer = guard.create_buffer(BufferDesc {
            size: capacity as u64 * Vertex2D::SIZE,
            usage: BufferUsage::Vertex,
            update_rate: BufferUpdateRate::Stream,
        })?;
        let vertex_array = guard.create_vertex_array(vertex_buffer, &Vertex2D::layout())?;
        let white_texture = create_white_texture(&mut *guard)?;

        UniformTable::new(program).bind_samplers(&mut *guard, &[("u_texture", TEXTURE_UNIT)]);
        guard.use_program(None);
        drop(guard);

        gfx_info!(SOURCE, "UI renderer created ({} vertex stream buffer)", capacity);

        Ok(Self {
            device,
            state: PassState::Idle,
            program,
            uniforms: UiUniforms::default(),
            uniforms_dirty: true,
            uniform_buffer,
            vertex_buffer,
            vertex_array,
            capacity,
            offset: 0,
            batch: None,
            firsts: Vec::new(),
            counts: Vec::new(),
            staging: Vec::new(),
            white_texture,
            texture_slot: TextureSlot::new(TEXTURE_UNIT),
            transparency: TransparencyMode::default(),
            applied_transparency: None,
            stats: RendererStats::default(),
        })
    }

    // ===== SETTERS =====

    /// Orthographic projection mapping the given edges to clip space
    pub fn set_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32) -> Result<()> {
        self.state.require_active(SOURCE, "set_projection")?;
        self.uniforms.projection = Mat4::orthographic_rh_gl(left, right, bottom, top, -1.0, 1.0);
        self.uniforms_dirty = true;
        Ok(())
    }

    /// Bind the texture sampled by subsequent draws
    ///
    /// `Texture::default()` selects the built-in white texture.
    pub fn set_texture(&mut self, texture: &Texture) -> Result<()> {
        self.state.require_active(SOURCE, "set_texture")?;
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        if self.texture_slot.bind(&mut *device, texture, self.white_texture) {
            self.stats.texture_binds += 1;
        }
        Ok(())
    }

    /// Tint multiplied into every fragment
    pub fn set_color(&mut self, color: Color) -> Result<()> {
        self.state.require_active(SOURCE, "set_color")?;
        self.uniforms.color = color.into();
        self.uniforms_dirty = true;
        Ok(())
    }

    pub fn set_transparency(&mut self, mode: TransparencyMode) -> Result<()> {
        self.state.require_active(SOURCE, "set_transparency")?;
        self.transparency = mode;
        Ok(())
    }

    // ===== DRAWING =====

    /// Draw one primitive from fully-formed vertex data
    ///
    /// An empty slice draws nothing.
    pub fn draw_primitive(&mut self, topology: PrimitiveTopology, vertices: &[Vertex2D]) -> Result<()> {
        self.state.require_active(SOURCE, "draw_primitive")?;
        if vertices.is_empty() {
            gfx_trace!(SOURCE, "draw_primitive with no vertices skipped");
            return Ok(());
        }
        let count = u32::try_from(vertices.len())
            .map_err(|_| gfx_err!(SOURCE, InvalidArgument, "{} vertices exceed one draw", vertices.len()))?;

        self.begin_primitive(topology, count)?.copy_from_slice(vertices);
        self.end_primitive()?;
        Ok(())
    }

    /// Open a batch of `count` vertices and return the memory to write them to
    ///
    /// The batch must be closed with [`end_primitive`](Self::end_primitive)
    /// before another one is opened.
    pub fn begin_primitive(&mut self, topology: PrimitiveTopology, count: u32) -> Result<&mut [Vertex2D]> {
        self.begin_primitives(topology, &[count])
    }

    /// Open one batch holding several independent primitives
    ///
    /// `counts[i]` vertices of primitive `i` follow those of primitive `i - 1`
    /// in the returned slice; `end_primitive` draws them in one submission.
    pub fn begin_primitives(&mut self, topology: PrimitiveTopology, counts: &[u32]) -> Result<&mut [Vertex2D]> {
        self.state.require_active(SOURCE, "begin_primitives")?;
        if self.batch.is_some() {
            gfx_bail!(SOURCE, InvalidState, "begin_primitives called while a primitive batch is open");
        }
        let total = counts
            .iter()
            .try_fold(0u32, |total, &count| total.checked_add(count))
            .ok_or_else(|| gfx_err!(SOURCE, InvalidArgument, "primitive counts overflow"))?;
        if total == 0 {
            gfx_bail!(SOURCE, InvalidArgument, "begin_primitives called with no vertices");
        }

        let target = if self.offset as u64 + total as u64 <= self.capacity as u64 {
            self.map_region(total)?
        } else {
            gfx_debug!(
                SOURCE,
                "Stream buffer exhausted ({} + {} > {}), staging batch",
                self.offset, total, self.capacity
            );
            StreamTarget::Staged
        };

        self.counts.clear();
        self.counts.extend_from_slice(counts);
        self.batch = Some(PrimitiveBatch { topology, total, target });

        match target {
            // SAFETY: the device granted `total` vertices of writable memory at
            // a Vertex2D-aligned address, valid until `unmap_buffer`. The batch
            // is unmapped only by `end_primitive` or `Drop`, both of which need
            // `&mut self`, so the returned borrow cannot outlive the mapping.
            // Vertex2D is Pod, so any byte pattern already there is a valid value.
            StreamTarget::Mapped(pointer) => Ok(unsafe {
                std::slice::from_raw_parts_mut(pointer.as_ptr(), total as usize)
            }),
            StreamTarget::Staged => {
                self.staging.clear();
                self.staging.resize(total as usize, Vertex2D::default());
                Ok(self.staging.as_mut_slice())
            }
        }
    }

    /// Close the open batch and draw it
    ///
    /// Uploads the uniform block if dirty, applies the blend mode, then
    /// issues one multi-draw covering every primitive of the batch.
    pub fn end_primitive(&mut self) -> Result<FlushPath> {
        let Some(batch) = self.batch.take() else {
            gfx_bail!(SOURCE, InvalidState, "end_primitive called without an open primitive batch");
        };

        let device = self.device.clone();
        let mut device = lock_device(&device)?;

        let path = match batch.target {
            StreamTarget::Mapped(_) => {
                if !device.unmap_buffer(self.vertex_buffer) {
                    gfx_warn!(SOURCE, "Device lost the contents of a mapped vertex batch");
                }
                FlushPath::Mapped
            }
            StreamTarget::Staged => {
                self.upload_staged(&mut *device, batch.total)?;
                self.stats.staged_flushes += 1;
                FlushPath::Staged
            }
        };

        self.firsts.clear();
        let mut first = self.offset;
        for &count in &self.counts {
            self.firsts.push(first);
            first += count;
        }

        self.flush_uniforms(&mut *device)?;
        if self.applied_transparency != Some(self.transparency) {
            device.set_blend(self.transparency.blend_func());
            self.applied_transparency = Some(self.transparency);
        }

        device.multi_draw(batch.topology, &self.firsts, &self.counts)?;
        self.offset += batch.total;

        self.stats.draw_calls += 1;
        self.stats.vertices += batch.total;
        Ok(path)
    }

    /// Whether a primitive batch is open
    pub fn is_mapped(&self) -> bool {
        self.batch.is_some()
    }

    /// Current stream buffer capacity, in vertices
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    // ===== INTERNALS =====

    /// Try to map `total` vertices at the current offset
    fn map_region(&mut self, total: u32) -> Result<StreamTarget> {
        let device = self.device.clone();
        let mut device = lock_device(&device)?;

        let Some(pointer) = device.map_buffer(
            self.vertex_buffer,
            self.offset as u64 * Vertex2D::SIZE,
            total as u64 * Vertex2D::SIZE,
        ) else {
            gfx_debug!(SOURCE, "Vertex buffer mapping declined, staging batch");
            return Ok(StreamTarget::Staged);
        };

        let pointer = pointer.cast::<Vertex2D>();
        if pointer.as_ptr().is_aligned() {
            Ok(StreamTarget::Mapped(pointer))
        } else {
            device.unmap_buffer(self.vertex_buffer);
            gfx_debug!(SOURCE, "Vertex buffer mapping misaligned, staging batch");
            Ok(StreamTarget::Staged)
        }
    }

    /// Copy the staged batch into the stream buffer, orphaning it if full
    fn upload_staged(&mut self, device: &mut dyn GraphicsDevice, total: u32) -> Result<()> {
        if self.offset as u64 + total as u64 > self.capacity as u64 {
            if total > self.capacity {
                self.capacity = total.checked_next_power_of_two().unwrap_or(total);
                gfx_debug!(SOURCE, "Stream buffer grown to {} vertices", self.capacity);
            } else {
                gfx_debug!(SOURCE, "Stream buffer orphaned after {} vertices", self.offset);
            }
            device.reallocate_buffer(self.vertex_buffer, self.capacity as u64 * Vertex2D::SIZE)?;
            self.offset = 0;
        }

        device.update_buffer(
            self.vertex_buffer,
            self.offset as u64 * Vertex2D::SIZE,
            bytemuck::cast_slice(&self.staging[..total as usize]),
        )
    }

    fn flush_uniforms(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.uniforms_dirty {
            device.update_buffer(self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms))?;
            self.uniforms_dirty = false;
            self.stats.uniform_uploads += 1;
        }
        Ok(())
    }
}

impl PassRenderer for UiRenderer {
    fn begin(&mut self) -> Result<()> {
        let device = self.device.clone();
        let mut device = lock_device(&device)?;
        self.state.enter(SOURCE)?;
        self.stats = RendererStats::default();

        device.use_program(Some(self.program));
        device.bind_vertex_array(self.vertex_array);
        device.set_depth_state(DepthState::DISABLED);
        device.set_cull_mode(CullMode::None);

        self.texture_slot.reset();
        if self.texture_slot.bind(&mut *device, &Texture::default(), self.white_texture) {
            self.stats.texture_binds += 1;
        }
        self.applied_transparency = None;
        self.uniforms_dirty = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if self.batch.is_some() {
            gfx_bail!(SOURCE, InvalidState, "end called with an open primitive batch");
        }
        self.state.leave(SOURCE)?;
        gfx_trace!(
            SOURCE,
            "Pass ended: {} draws, {} vertices, {} staged",
            self.stats.draw_calls, self.stats.vertices, self.stats.staged_flushes
        );
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state == PassState::Active
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }
}

impl Drop for UiRenderer {
    fn drop(&mut self) {
        let Ok(mut device) = self.device.lock() else {
            return;
        };
        if let Some(PrimitiveBatch { target: StreamTarget::Mapped(_), .. }) = self.batch.take() {
            device.unmap_buffer(self.vertex_buffer);
        }
        device.destroy_vertex_array(self.vertex_array);
        device.destroy_buffer(self.vertex_buffer);
        device.destroy_buffer(self.uniform_buffer);
        device.destroy_texture(self.white_texture);
        device.destroy_program(self.program);
        drop(device);
        gfx_info!(SOURCE, "UI renderer destroyed");
    }
}

#[cfg(test)]
#[path = "ui_renderer_tests.rs"]
mod tests;
