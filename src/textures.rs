//! Sprite textures for particle quads.
//!
//! Every emitter samples one texture across each quad. The renderer starts
//! with a procedural soft dot ([`TextureConfig::radial`]) and can be given
//! any other texture with [`EmitterRenderer::set_texture`].
//!
//! ```ignore
//! let sprite = TextureConfig::from_file("assets/smoke.png")?;
//! renderer.set_texture(&device, sprite.upload(&device, &queue));
//! renderer.set_sampler(&device, sprite.create_sampler(&device));
//! ```
//!
//! [`EmitterRenderer::set_texture`]: crate::gpu::EmitterRenderer::set_texture

use std::path::Path;

use wgpu::util::DeviceExt;

use crate::error::TextureError;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering. Good for pixel art.
    Nearest,
}

impl FilterMode {
    fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Linear => wgpu::FilterMode::Linear,
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

/// Address mode for texture wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Clamp to edge color (default).
    #[default]
    ClampToEdge,
    /// Repeat/tile the texture.
    Repeat,
    /// Mirror the texture at boundaries.
    MirrorRepeat,
}

impl AddressMode {
    fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// CPU-side RGBA8 image plus sampling options.
#[derive(Debug, Clone)]
pub struct TextureConfig {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
    pub address_mode: AddressMode,
}

impl TextureConfig {
    /// Wrap raw RGBA data.
    ///
    /// Returns `None` if `data` is not exactly `width * height * 4` bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 || width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            filter: FilterMode::Linear,
            address_mode: AddressMode::ClampToEdge,
        })
    }

    /// Load a PNG or JPEG from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path.as_ref())?;
        let img = image::load_from_memory(&bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        log::debug!("loaded sprite {} ({}x{})", path.as_ref().display(), width, height);
        Ok(Self {
            data: img.into_raw(),
            width,
            height,
            filter: FilterMode::Linear,
            address_mode: AddressMode::ClampToEdge,
        })
    }

    /// 1x1 texture of a single color.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
            filter: FilterMode::Nearest,
            address_mode: AddressMode::ClampToEdge,
        }
    }

    /// White dot whose alpha falls off smoothly from the center to the edge.
    ///
    /// The default particle sprite.
    pub fn radial(size: u32) -> Self {
        let size = size.max(2);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        let half = size as f32 / 2.0;
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 + 0.5 - half) / half;
                let dy = (y as f32 + 0.5 - half) / half;
                let d = (dx * dx + dy * dy).sqrt().min(1.0);
                // smoothstep falloff
                let t = 1.0 - d;
                let a = t * t * (3.0 - 2.0 * t);
                data.extend_from_slice(&[255, 255, 255, (a * 255.0).round() as u8]);
            }
        }
        Self {
            data,
            width: size,
            height: size,
            filter: FilterMode::Linear,
            address_mode: AddressMode::ClampToEdge,
        }
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    /// Create the GPU texture and return a view of it.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Particle Sprite"),
                size: wgpu::Extent3d {
                    width: self.width,
                    height: self.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &self.data,
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Create a sampler using this texture's filter and address modes.
    pub fn create_sampler(&self, device: &wgpu::Device) -> wgpu::Sampler {
        let filter = self.filter.to_wgpu();
        let address = self.address_mode.to_wgpu();
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Particle Sampler"),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_size() {
        assert!(TextureConfig::from_rgba(vec![0; 16], 2, 2).is_some());
        assert!(TextureConfig::from_rgba(vec![0; 15], 2, 2).is_none());
        assert!(TextureConfig::from_rgba(vec![], 0, 0).is_none());
    }

    #[test]
    fn test_radial_fades_to_edge() {
        let tex = TextureConfig::radial(32);
        assert_eq!(tex.data.len(), 32 * 32 * 4);

        let alpha = |x: u32, y: u32| tex.data[((y * 32 + x) * 4 + 3) as usize];
        assert!(alpha(16, 16) > 200);
        assert_eq!(alpha(0, 0), 0);
        assert!(alpha(16, 16) > alpha(24, 16));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TextureConfig::from_file("does/not/exist.png").unwrap_err();
        assert!(matches!(err, TextureError::Io(_)));
    }
}
