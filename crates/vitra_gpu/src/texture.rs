//! Backdrop textures on the GPU
//!
//! Composites are uploaded as linear `Rgba8Unorm` with a single mip level.
//! The bytes are already premultiplied; sampling them through an sRGB view
//! would shift every color, so the format is never reinterpreted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use wgpu::util::DeviceExt;

use vitra_core::{CaptureError, CompositeImage, TextureUploader};

/// Format every backdrop texture uses
pub const BACKDROP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn next_texture_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A captured backdrop ready for sampling
///
/// Cheap to clone; clones share the GPU texture. `id` is unique per upload and
/// keys the render loop's bind group cache.
#[derive(Clone, Debug)]
pub struct GlassTexture {
    id: u64,
    texture: Arc<wgpu::Texture>,
    view: Arc<wgpu::TextureView>,
    size: (u32, u32),
}

impl PartialEq for GlassTexture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl GlassTexture {
    /// Create a texture from tightly packed RGBA8 pixels
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: BACKDROP_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            id: next_texture_id(),
            texture: Arc::new(texture),
            view: Arc::new(view),
            size: (width, height),
        }
    }

    /// 1x1 fully transparent texture bound while nothing has been captured
    pub fn transparent(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba(device, queue, &[0, 0, 0, 0], 1, 1, Some("Glass Fallback Texture"))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the texture view for binding
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// Uploads composites to the GPU for the capture scheduler
#[derive(Clone, Debug)]
pub struct WgpuUploader {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    max_dimension: u32,
}

impl WgpuUploader {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        Self {
            device,
            queue,
            max_dimension,
        }
    }

    /// Reject composites larger than `max` per edge; never above the
    /// device limit
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max.clamp(1, self.device.limits().max_texture_dimension_2d);
        self
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

impl TextureUploader for WgpuUploader {
    type Texture = GlassTexture;

    fn upload(&self, image: &CompositeImage) -> vitra_core::Result<GlassTexture> {
        let (width, height) = (image.width(), image.height());
        if width > self.max_dimension || height > self.max_dimension {
            return Err(CaptureError::Upload(format!(
                "{}x{} exceeds the device limit of {}",
                width, height, self.max_dimension
            )));
        }

        let texture = GlassTexture::from_rgba(
            &self.device,
            &self.queue,
            image.data(),
            width,
            height,
            Some("Glass Backdrop Texture"),
        );
        tracing::trace!(id = texture.id(), width, height, "backdrop uploaded");
        Ok(texture)
    }
}
