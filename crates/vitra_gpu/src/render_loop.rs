//! Frame render loop for the glass pass
//!
//! Each tick binds the texture the scheduler holds for the surface being
//! drawn, never waiting on a capture. When there is none (nothing captured
//! yet, or the cache belongs to another surface) a transparent fallback is
//! bound, so a frame is still drawn.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use vitra_core::{CaptureScheduler, GlassSurface, TextureUploader};

use crate::context::GpuContext;
use crate::error::{RendererError, Result};
use crate::pipeline::GlassPipeline;
use crate::texture::GlassTexture;
use crate::uniforms::UniformBlock;

/// Outcome of one [`RenderLoop::tick`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    /// No drawable this tick; try again next frame
    Skipped,
}

/// Window surface the glass is presented to
pub struct GlassPresenter {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    configured: bool,
}

impl GlassPresenter {
    pub fn new(context: &GpuContext, surface: wgpu::Surface<'static>, size: (u32, u32)) -> Self {
        let caps = surface.get_capabilities(&context.adapter);
        tracing::debug!("Surface capabilities - formats: {:?}", caps.formats);
        tracing::debug!("Surface capabilities - alpha modes: {:?}", caps.alpha_modes);

        // The backdrop is linear and the shader writes linear values, so avoid
        // implicit gamma encoding on the swapchain
        let format = context.config.texture_format.unwrap_or_else(|| {
            caps.formats
                .iter()
                .find(|f| !f.is_srgb())
                .or(caps.formats.first())
                .copied()
                .unwrap_or(wgpu::TextureFormat::Bgra8Unorm)
        });
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        tracing::info!("Selected surface format: {:?} ({:?})", format, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0,
            height: size.1,
            present_mode: context.config.present_mode,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };

        let mut presenter = Self {
            surface,
            config,
            configured: false,
        };
        presenter.configure(&context.device);
        presenter
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Drawable size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if size == self.size() && self.configured {
            return;
        }
        self.config.width = size.0;
        self.config.height = size.1;
        self.configure(device);
    }

    fn configure(&mut self, device: &wgpu::Device) {
        // zero-sized surfaces (minimized windows) can't be configured
        self.configured = self.config.width > 0 && self.config.height > 0;
        if self.configured {
            self.surface.configure(device, &self.config);
        }
    }

    /// Next drawable, or `None` when this frame should be skipped
    fn acquire(&mut self, device: &wgpu::Device) -> Result<Option<wgpu::SurfaceTexture>> {
        if !self.configured {
            tracing::trace!("surface not configured, skipping frame");
            return Ok(None);
        }
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("Out of GPU memory");
                Err(RendererError::OutOfMemory)
            }
            Err(e) => {
                tracing::trace!("no drawable this frame: {:?}", e);
                Ok(None)
            }
        }
    }
}

/// Draws the glass pass every frame from the cached backdrop
pub struct RenderLoop {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: GlassPipeline,
    fallback: GlassTexture,
    /// Bind groups by texture id; holds the fallback and the latest capture
    bind_groups: FxHashMap<u64, Arc<wgpu::BindGroup>>,
    start: Instant,
    frames: u64,
}

impl RenderLoop {
    pub fn new(context: &GpuContext, format: wgpu::TextureFormat) -> Result<Self> {
        Self::with_device(Arc::clone(&context.device), Arc::clone(&context.queue), format)
    }

    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let pipeline = GlassPipeline::new(&device, format)?;
        let fallback = GlassTexture::transparent(&device, &queue);
        Ok(Self {
            device,
            queue,
            pipeline,
            fallback,
            bind_groups: FxHashMap::default(),
            start: Instant::now(),
            frames: 0,
        })
    }

    /// Seconds since the loop was created
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render one frame to the presenter with the backdrop `scheduler`
    /// captured for `surface`
    ///
    /// Only running out of GPU memory is an error; every other acquisition
    /// failure skips the frame.
    pub fn tick<U>(
        &mut self,
        presenter: &mut GlassPresenter,
        scheduler: &CaptureScheduler<U>,
        surface: &GlassSurface,
    ) -> Result<FrameStatus>
    where
        U: TextureUploader<Texture = GlassTexture>,
    {
        let Some(frame) = presenter.acquire(&self.device)? else {
            return Ok(FrameStatus::Skipped);
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let backdrop = scheduler.current(surface);
        self.render_to_view(&view, presenter.size(), backdrop.as_ref(), surface);
        frame.present();

        Ok(FrameStatus::Rendered)
    }

    /// Render the glass pass into any view of the pipeline's format
    pub fn render_to_view(
        &mut self,
        view: &wgpu::TextureView,
        size: (u32, u32),
        backdrop: Option<&GlassTexture>,
        surface: &GlassSurface,
    ) {
        let uniforms = UniformBlock::new(
            size,
            self.elapsed(),
            surface.box_size(),
            surface.corner_radius,
        );
        self.pipeline.write_uniforms(&self.queue, &uniforms);

        let backdrop = backdrop.unwrap_or(&self.fallback).clone();
        let bind_group = self.bind_group_for(&backdrop);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Glass Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glass Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(self.pipeline.pipeline());
            pass.set_bind_group(0, bind_group.as_ref(), &[]);
            pass.draw(0..6, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.frames += 1;
    }

    fn bind_group_for(&mut self, texture: &GlassTexture) -> Arc<wgpu::BindGroup> {
        if let Some(group) = self.bind_groups.get(&texture.id()) {
            return Arc::clone(group);
        }

        // a new capture supersedes every older one
        let fallback_id = self.fallback.id();
        self.bind_groups.retain(|id, _| *id == fallback_id);

        let group = Arc::new(self.pipeline.bind_group(&self.device, texture));
        self.bind_groups.insert(texture.id(), Arc::clone(&group));
        tracing::trace!(texture = texture.id(), "bind group created");
        group
    }
}
