/// Framebuffer handle and descriptor, viewport and clear values
///
/// A framebuffer groups the attachments a pass renders into. The shadow
/// renderer owns one with a depth attachment only.

use crate::graphics_device::TextureId;

/// Opaque handle to a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// Descriptor for creating a framebuffer
#[derive(Debug, Clone)]
pub struct FramebufferDesc {
    /// Optional color attachment
    pub color_attachment: Option<TextureId>,
    /// Optional depth attachment
    pub depth_attachment: Option<TextureId>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for the bound framebuffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth clear value
    Depth(f32),
}
