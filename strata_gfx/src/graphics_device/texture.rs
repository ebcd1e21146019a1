/// Texture handle, texture descriptor and the texture value passed to renderers

use glam::UVec2;

/// Opaque handle to a device texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    D24_UNORM,
    D32_FLOAT,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Optional initial pixel data
    pub data: Option<Vec<u8>>,
}

/// Texture as seen by the renderers
///
/// `Texture::default()` is the "no texture" value. Renderers resolve it to
/// their own 1x1 white texture so untextured draws still sample correctly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Texture {
    /// Device handle, `None` when no texture is set
    pub id: Option<TextureId>,
    /// Size in pixels
    pub size: UVec2,
}

impl Texture {
    /// Wrap a device texture handle
    pub fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self {
            id: Some(id),
            size: UVec2::new(width, height),
        }
    }

    /// Returns true if this refers to a real device texture
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }
}
