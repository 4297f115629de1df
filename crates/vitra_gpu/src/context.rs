//! Adapter, device and surface setup

use std::sync::Arc;

use vitra_core::HierarchyComposer;

use crate::config::{log_renderer_config, RendererConfig};
use crate::error::{RendererError, Result};
use crate::render_loop::GlassPresenter;
use crate::texture::WgpuUploader;

/// Shared GPU state: the device and queue are used by both the uploader and
/// the render loop
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub config: RendererConfig,
}

impl GpuContext {
    /// Create a context without a surface (for headless rendering)
    pub async fn headless(config: RendererConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: preferred_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        Self::from_adapter(instance, adapter, config).await
    }

    /// Create a context and a configured presenter for a window
    pub async fn with_surface<W>(
        window: Arc<W>,
        size: (u32, u32),
        config: RendererConfig,
    ) -> Result<(Self, GlassPresenter)>
    where
        W: raw_window_handle::HasWindowHandle
            + raw_window_handle::HasDisplayHandle
            + Send
            + Sync
            + 'static,
    {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: preferred_backends(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        let context = Self::from_adapter(instance, adapter, config).await?;
        let presenter = GlassPresenter::new(&context, surface, size);
        Ok((context, presenter))
    }

    async fn from_adapter(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        config: RendererConfig,
    ) -> Result<Self> {
        let info = adapter.get_info();
        tracing::info!("Using adapter {} ({:?})", info.name, info.backend);

        // default limits, but allow the adapter's full texture resolution
        let required_limits = wgpu::Limits::default().using_resolution(adapter.limits());
        let config = config.clamp_to_limits(&required_limits);
        log_renderer_config(&config);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Vitra GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
        })
    }

    /// Uploader sharing this context's device and queue
    pub fn uploader(&self) -> WgpuUploader {
        WgpuUploader::new(Arc::clone(&self.device), Arc::clone(&self.queue))
            .with_max_dimension(self.config.max_capture_dimension)
    }

    /// Composer whose canvases fit in a texture on this device
    pub fn composer(&self) -> HierarchyComposer {
        HierarchyComposer::new().with_max_dimension(self.config.max_capture_dimension)
    }
}

fn preferred_backends() -> wgpu::Backends {
    #[cfg(target_os = "macos")]
    {
        wgpu::Backends::METAL
    }
    #[cfg(target_os = "windows")]
    {
        wgpu::Backends::DX12
    }
    #[cfg(target_os = "linux")]
    {
        wgpu::Backends::VULKAN
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        wgpu::Backends::PRIMARY
    }
}
