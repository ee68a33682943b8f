//! Window sizing and the GPU texture the engine's canvas is blitted through.

use nannou::prelude::*;
use tracing::warn;

/// Initial window configuration
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Resolution {
    pub fn debug() -> Self {
        Self {
            width: 800,
            height: 450,
            fullscreen: false,
        }
    }

    pub fn release() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: true,
        }
    }

    pub fn current(windowed: bool) -> Self {
        if cfg!(debug_assertions) || windowed {
            Self::debug()
        } else {
            Self::release()
        }
    }
}

/// Drawing surface size for a window of `pixels`, never below 1x1.
pub fn scaled_size(pixels: (u32, u32), scale: f32) -> (u32, u32) {
    let scale_dim = |d: u32| ((d as f32 * scale).round() as u32).max(1);
    (scale_dim(pixels.0), scale_dim(pixels.1))
}

/// RGBA texture mirroring the engine canvas; rebuilt when the canvas is resized.
pub struct SurfaceTexture {
    texture: wgpu::Texture,
    size: [u32; 2],
}

impl SurfaceTexture {
    pub fn new(device: &wgpu::Device, size: [u32; 2]) -> Self {
        Self {
            texture: Self::create_texture(device, size),
            size,
        }
    }

    fn create_texture(device: &wgpu::Device, size: [u32; 2]) -> wgpu::Texture {
        wgpu::TextureBuilder::new()
            .size(size)
            .usage(wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING)
            .sample_count(1)
            .format(wgpu::TextureFormat::Rgba8UnormSrgb)
            .build(device)
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.texture = Self::create_texture(device, size);
    }

    /// Copies a tightly packed RGBA frame into the texture.
    pub fn upload(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, rgba: &[u8]) {
        let expected = self.size[0] as usize * self.size[1] as usize * 4;
        if rgba.len() != expected {
            warn!(got = rgba.len(), expected, "frame size mismatch, skipping upload");
            return;
        }
        self.texture.upload_data(device, encoder, rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_size() {
        assert_eq!(scaled_size((1280, 720), 0.5), (640, 360));
        assert_eq!(scaled_size((1, 1), 0.25), (1, 1));
        assert_eq!(scaled_size((801, 451), 1.0), (801, 451));
    }
}
