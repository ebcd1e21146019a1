/// Per-unit texture binding cache

use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, Texture, TextureDesc, TextureFormat, TextureId};

/// One texture unit and the texture last bound to it
///
/// Binding the texture that is already bound is a no-op.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextureSlot {
    unit: u32,
    bound: Option<TextureId>,
}

impl TextureSlot {
    pub(crate) fn new(unit: u32) -> Self {
        Self { unit, bound: None }
    }

    pub(crate) fn unit(&self) -> u32 {
        self.unit
    }

    /// Forget the cached binding so the next `bind` always reaches the device
    pub(crate) fn reset(&mut self) {
        self.bound = None;
    }

    /// Bind `texture`, or `fallback` when the texture is invalid
    ///
    /// Returns true if a bind was issued.
    pub(crate) fn bind(&mut self, device: &mut dyn GraphicsDevice, texture: &Texture, fallback: TextureId) -> bool {
        let id = texture.id.unwrap_or(fallback);
        if self.bound == Some(id) {
            return false;
        }
        device.bind_texture(self.unit, id);
        self.bound = Some(id);
        true
    }
}

/// Create the 1x1 opaque white texture bound in place of missing textures
pub(crate) fn create_white_texture(device: &mut dyn GraphicsDevice) -> Result<TextureId> {
    let texture = device.create_texture(TextureDesc {
        width: 1,
        height: 1,
        format: TextureFormat::R8G8B8A8_UNORM,
        data: Some(vec![255; 4]),
    })?;
    texture
        .id
        .ok_or_else(|| Error::InitializationFailed("white texture has no id".to_string()))
}

#[cfg(test)]
#[path = "texture_slot_tests.rs"]
mod tests;
