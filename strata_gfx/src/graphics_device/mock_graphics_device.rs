/// Recording graphics device for unit tests (no GPU required)
///
/// Keeps real buffer storage so mapped writes and uploads can be read back,
/// records every call in order, and snapshots the vertex bytes each draw
/// reads so tests can check what actually reached the "GPU".

use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BlendFunc, BufferDesc, BufferId, ClearValue, CullMode, DepthState,
    FramebufferDesc, FramebufferId, GraphicsDevice, PolygonOffset,
    PrimitiveTopology, ProgramDesc, ProgramId, SharedGraphicsDevice, Texture,
    TextureDesc, TextureId, UniformLocation, UniformValue, VertexArrayId,
    VertexBuffer, VertexLayout, Viewport,
};

// ============================================================================
// Recorded calls
// ============================================================================

/// Which draw entry point produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Arrays,
    Indexed,
    Multi,
}

/// One recorded draw submission
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub kind: DrawKind,
    pub topology: PrimitiveTopology,
    pub firsts: Vec<u32>,
    pub counts: Vec<u32>,
    pub vertex_array: Option<VertexArrayId>,
    pub program: Option<ProgramId>,
    /// Vertex bytes read by each range at submission time
    pub vertices: Vec<Vec<u8>>,
}

impl DrawRecord {
    pub fn total_vertices(&self) -> u32 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer { buffer: BufferId, size: u64 },
    UpdateBuffer { buffer: BufferId, offset: u64, len: usize },
    ReallocateBuffer { buffer: BufferId, size: u64 },
    MapBuffer { buffer: BufferId, offset: u64, size: u64, granted: bool },
    UnmapBuffer(BufferId),
    DestroyBuffer(BufferId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(VertexArrayId),
    DestroyVertexArray(VertexArrayId),
    CreateTexture(TextureId),
    BindTexture { unit: u32, texture: TextureId },
    DestroyTexture(TextureId),
    CreateProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform { name: String, value: UniformValue },
    BindUniformBlock { program: ProgramId, block: String, binding: u32, buffer: BufferId },
    DestroyProgram(ProgramId),
    CreateFramebuffer { framebuffer: FramebufferId, width: u32, height: u32 },
    BindFramebuffer(Option<FramebufferId>),
    DestroyFramebuffer(FramebufferId),
    SetViewport(Viewport),
    SetBlend(Option<BlendFunc>),
    SetDepthState(DepthState),
    SetCullMode(CullMode),
    SetColorWrite(bool),
    SetPolygonOffset(Option<PolygonOffset>),
    Clear(ClearValue),
    Draw(DrawRecord),
}

// ============================================================================
// Mock storage
// ============================================================================

#[derive(Debug)]
struct MockBufferStorage {
    /// Word storage keeps mapped pointers 4-byte aligned
    words: Vec<u32>,
    size: u64,
    mapped: bool,
}

impl MockBufferStorage {
    fn new(size: u64) -> Self {
        Self {
            words: vec![0; (size as usize).div_ceil(4)],
            size,
            mapped: false,
        }
    }

    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u32, u8>(&self.words)[..self.size as usize]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size as usize;
        &mut bytemuck::cast_slice_mut::<u32, u8>(&mut self.words)[..size]
    }
}

#[derive(Debug, Clone, Copy)]
struct MockVertexArray {
    buffer: BufferId,
    stride: u32,
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Graphics device that records calls instead of talking to a GPU
#[derive(Debug, Default)]
pub struct MockGraphicsDevice {
    /// When true every `map_buffer` is declined
    pub fail_mapping: bool,
    /// When true granted mappings are offset by one byte
    pub misalign_mapping: bool,
    /// When true `create_framebuffer` reports incomplete attachments
    pub fail_framebuffers: bool,

    calls: Vec<DeviceCall>,
    next_id: u32,

    buffers: FxHashMap<BufferId, MockBufferStorage>,
    vertex_arrays: FxHashMap<VertexArrayId, MockVertexArray>,
    textures: FxHashMap<TextureId, TextureDesc>,
    programs: FxHashMap<ProgramId, &'static str>,
    framebuffers: FxHashMap<FramebufferId, FramebufferDesc>,
    uniform_locations: FxHashMap<(ProgramId, String), UniformLocation>,
    uniform_names: FxHashMap<UniformLocation, String>,

    current_program: Option<ProgramId>,
    current_vertex_array: Option<VertexArrayId>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device and the type-erased handle renderers expect
    pub fn shared() -> (Arc<Mutex<MockGraphicsDevice>>, SharedGraphicsDevice) {
        let device = Arc::new(Mutex::new(MockGraphicsDevice::new()));
        let shared: SharedGraphicsDevice = device.clone();
        (device, shared)
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    // ===== QUERIES =====

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn texture_binds(&self) -> Vec<(u32, TextureId)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::BindTexture { unit, texture } => Some((*unit, *texture)),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> Vec<&DrawRecord> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Draw(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Every value written to the named uniform, oldest first
    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetUniform { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniform_writes(name).last().copied()
    }

    /// Names of uniforms written, in call order
    pub fn uniform_write_names(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn buffer_bytes(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|storage| storage.bytes())
    }

    pub fn buffer_size(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(&buffer).map(|storage| storage.size)
    }

    pub fn framebuffer(&self, framebuffer: FramebufferId) -> Option<&FramebufferDesc> {
        self.framebuffers.get(&framebuffer)
    }

    /// Buffers, vertex arrays, textures, programs and framebuffers still alive
    pub fn live_resource_count(&self) -> usize {
        self.buffers.len()
            + self.vertex_arrays.len()
            + self.textures.len()
            + self.programs.len()
            + self.framebuffers.len()
    }

    fn snapshot_ranges(&self, firsts: &[u32], counts: &[u32]) -> Vec<Vec<u8>> {
        let Some(array) = self.current_vertex_array.and_then(|id| self.vertex_arrays.get(&id)) else {
            return Vec::new();
        };
        let Some(storage) = self.buffers.get(&array.buffer) else {
            return Vec::new();
        };
        let bytes = storage.bytes();
        let stride = array.stride as usize;

        firsts
            .iter()
            .zip(counts)
            .map(|(&first, &count)| {
                let start = (first as usize * stride).min(bytes.len());
                let end = ((first + count) as usize * stride).min(bytes.len());
                bytes[start..end].to_vec()
            })
            .collect()
    }

    fn record_draw(&mut self, kind: DrawKind, topology: PrimitiveTopology, firsts: &[u32], counts: &[u32]) {
        let vertices = match kind {
            DrawKind::Indexed => Vec::new(),
            _ => self.snapshot_ranges(firsts, counts),
        };
        self.calls.push(DeviceCall::Draw(DrawRecord {
            kind,
            topology,
            firsts: firsts.to_vec(),
            counts: counts.to_vec(),
            vertex_array: self.current_vertex_array,
            program: self.current_program,
            vertices,
        }));
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<BufferId> {
        let buffer = BufferId(self.allocate_id());
        self.buffers.insert(buffer, MockBufferStorage::new(desc.size));
        self.calls.push(DeviceCall::CreateBuffer { buffer, size: desc.size });
        Ok(buffer)
    }

    fn update_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        let storage = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| Error::InvalidResource(format!("buffer {:?} does not exist", buffer)))?;
        let end = offset + data.len() as u64;
        if end > storage.size {
            return Err(Error::InvalidResource(format!(
                "update of {} bytes at {} overflows buffer of {} bytes",
                data.len(),
                offset,
                storage.size
            )));
        }
        storage.bytes_mut()[offset as usize..end as usize].copy_from_slice(data);
        self.calls.push(DeviceCall::UpdateBuffer { buffer, offset, len: data.len() });
        Ok(())
    }

    fn reallocate_buffer(&mut self, buffer: BufferId, size: u64) -> Result<()> {
        if !self.buffers.contains_key(&buffer) {
            return Err(Error::InvalidResource(format!("buffer {:?} does not exist", buffer)));
        }
        self.buffers.insert(buffer, MockBufferStorage::new(size));
        self.calls.push(DeviceCall::ReallocateBuffer { buffer, size });
        Ok(())
    }

    fn map_buffer(&mut self, buffer: BufferId, offset: u64, size: u64) -> Option<NonNull<u8>> {
        let fail = self.fail_mapping;
        let skew = usize::from(self.misalign_mapping);
        let pointer = self.buffers.get_mut(&buffer).and_then(|storage| {
            if fail || storage.mapped || offset + size > storage.size {
                return None;
            }
            storage.mapped = true;
            NonNull::new(storage.bytes_mut()[offset as usize..].as_mut_ptr().wrapping_add(skew))
        });
        self.calls.push(DeviceCall::MapBuffer { buffer, offset, size, granted: pointer.is_some() });
        pointer
    }

    fn unmap_buffer(&mut self, buffer: BufferId) -> bool {
        self.calls.push(DeviceCall::UnmapBuffer(buffer));
        match self.buffers.get_mut(&buffer) {
            Some(storage) if storage.mapped => {
                storage.mapped = false;
                true
            }
            _ => false,
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.calls.push(DeviceCall::DestroyBuffer(buffer));
    }

    fn create_vertex_array(&mut self, buffer: BufferId, layout: &VertexLayout) -> Result<VertexArrayId> {
        if !self.buffers.contains_key(&buffer) {
            return Err(Error::InvalidResource(format!("buffer {:?} does not exist", buffer)));
        }
        let vertex_array = VertexArrayId(self.allocate_id());
        self.vertex_arrays.insert(vertex_array, MockVertexArray { buffer, stride: layout.stride });
        self.calls.push(DeviceCall::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.current_vertex_array = Some(vertex_array);
        self.calls.push(DeviceCall::BindVertexArray(vertex_array));
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
        if self.current_vertex_array == Some(vertex_array) {
            self.current_vertex_array = None;
        }
        self.calls.push(DeviceCall::DestroyVertexArray(vertex_array));
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Texture> {
        let texture = TextureId(self.allocate_id());
        let (width, height) = (desc.width, desc.height);
        self.textures.insert(texture, desc);
        self.calls.push(DeviceCall::CreateTexture(texture));
        Ok(Texture::new(texture, width, height))
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.calls.push(DeviceCall::BindTexture { unit, texture });
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.calls.push(DeviceCall::DestroyTexture(texture));
    }

    fn create_program(&mut self, desc: ProgramDesc) -> Result<ProgramId> {
        if desc.vertex_source.is_empty() || desc.fragment_source.is_empty() {
            return Err(Error::InitializationFailed(format!("program '{}' has an empty stage", desc.name)));
        }
        let program = ProgramId(self.allocate_id());
        self.programs.insert(program, desc.name);
        self.calls.push(DeviceCall::CreateProgram(program));
        Ok(program)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains_key(&program) {
            return None;
        }
        let key = (program, name.to_string());
        if let Some(location) = self.uniform_locations.get(&key) {
            return Some(*location);
        }
        let location = UniformLocation(self.allocate_id() as i32);
        self.uniform_locations.insert(key, location);
        self.uniform_names.insert(location, name.to_string());
        Some(location)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let name = self
            .uniform_names
            .get(&location)
            .cloned()
            .unwrap_or_else(|| format!("<location {}>", location.0));
        self.calls.push(DeviceCall::SetUniform { name, value });
    }

    fn bind_uniform_block(&mut self, program: ProgramId, block: &str, binding: u32, buffer: BufferId) -> Result<()> {
        if !self.programs.contains_key(&program) || !self.buffers.contains_key(&buffer) {
            return Err(Error::InvalidResource(format!("cannot bind uniform block '{}'", block)));
        }
        self.calls.push(DeviceCall::BindUniformBlock {
            program,
            block: block.to_string(),
            binding,
            buffer,
        });
        Ok(())
    }

    fn destroy_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.calls.push(DeviceCall::DestroyProgram(program));
    }

    fn create_framebuffer(&mut self, desc: FramebufferDesc) -> Result<FramebufferId> {
        if self.fail_framebuffers || (desc.color_attachment.is_none() && desc.depth_attachment.is_none()) {
            return Err(Error::BackendError("framebuffer incomplete".to_string()));
        }
        let framebuffer = FramebufferId(self.allocate_id());
        self.calls.push(DeviceCall::CreateFramebuffer {
            framebuffer,
            width: desc.width,
            height: desc.height,
        });
        self.framebuffers.insert(framebuffer, desc);
        Ok(framebuffer)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.calls.push(DeviceCall::BindFramebuffer(framebuffer));
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffers.remove(&framebuffer);
        self.calls.push(DeviceCall::DestroyFramebuffer(framebuffer));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(DeviceCall::SetViewport(viewport));
    }

    fn set_blend(&mut self, blend: Option<BlendFunc>) {
        self.calls.push(DeviceCall::SetBlend(blend));
    }

    fn set_depth_state(&mut self, state: DepthState) {
        self.calls.push(DeviceCall::SetDepthState(state));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.calls.push(DeviceCall::SetCullMode(mode));
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::SetColorWrite(enabled));
    }

    fn set_polygon_offset(&mut self, offset: Option<PolygonOffset>) {
        self.calls.push(DeviceCall::SetPolygonOffset(offset));
    }

    fn clear(&mut self, value: ClearValue) {
        self.calls.push(DeviceCall::Clear(value));
    }

    fn draw(&mut self, topology: PrimitiveTopology, first: u32, count: u32) -> Result<()> {
        self.record_draw(DrawKind::Arrays, topology, &[first], &[count]);
        Ok(())
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, count: u32) -> Result<()> {
        self.record_draw(DrawKind::Indexed, topology, &[0], &[count]);
        Ok(())
    }

    fn multi_draw(&mut self, topology: PrimitiveTopology, firsts: &[u32], counts: &[u32]) -> Result<()> {
        if firsts.len() != counts.len() {
            return Err(Error::BackendError("multi_draw range arrays differ in length".to_string()));
        }
        self.record_draw(DrawKind::Multi, topology, firsts, counts);
        Ok(())
    }
}

// ============================================================================
// Mock VertexBuffer
// ============================================================================

/// Externally owned geometry as the terrain and shadow renderers see it
#[derive(Debug, Clone)]
pub struct MockVertexBuffer {
    pub topology: PrimitiveTopology,
    pub vertex_array: VertexArrayId,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl MockVertexBuffer {
    /// Allocate backing storage on `device` for `vertex_count` vertices of `stride` bytes
    pub fn new(device: &mut MockGraphicsDevice, topology: PrimitiveTopology, vertex_count: u32, stride: u32) -> Self {
        let buffer = device
            .create_buffer(BufferDesc {
                size: (vertex_count * stride) as u64,
                usage: crate::graphics_device::BufferUsage::Vertex,
                update_rate: crate::graphics_device::BufferUpdateRate::Static,
            })
            .unwrap();
        let layout = VertexLayout { stride, attributes: Vec::new() };
        let vertex_array = device.create_vertex_array(buffer, &layout).unwrap();
        Self {
            topology,
            vertex_array,
            vertex_count,
            index_count: 0,
        }
    }

    pub fn indexed(mut self, index_count: u32) -> Self {
        self.index_count = index_count;
        self
    }
}

impl VertexBuffer for MockVertexBuffer {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
