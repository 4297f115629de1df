//! Renderer configuration with environment overrides

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Parse a present mode name as accepted by `VITRA_GPU_PRESENT_MODE`
pub fn parse_present_mode(name: &str) -> Option<wgpu::PresentMode> {
    match name.trim().to_ascii_lowercase().as_str() {
        "fifo" | "vsync" => Some(wgpu::PresentMode::Fifo),
        "fifo_relaxed" => Some(wgpu::PresentMode::FifoRelaxed),
        "mailbox" => Some(wgpu::PresentMode::Mailbox),
        "immediate" => Some(wgpu::PresentMode::Immediate),
        "auto" | "auto_vsync" => Some(wgpu::PresentMode::AutoVsync),
        "auto_no_vsync" => Some(wgpu::PresentMode::AutoNoVsync),
        _ => None,
    }
}

/// Configuration for creating the glass renderer
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Preferred output format (None = use surface preferred)
    pub texture_format: Option<wgpu::TextureFormat>,
    /// Swapchain present mode
    pub present_mode: wgpu::PresentMode,
    /// Upper bound for capture canvas edges, further clamped to the device's
    /// maximum 2D texture size
    pub max_capture_dimension: u32,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            texture_format: None,
            present_mode: wgpu::PresentMode::AutoVsync,
            max_capture_dimension: vitra_core::DEFAULT_MAX_CAPTURE_DIMENSION,
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl RendererConfig {
    /// Apply startup overrides from the environment
    ///
    /// Env:
    /// - VITRA_GPU_MAX_CAPTURE_DIM=4096
    /// - VITRA_GPU_PRESENT_MODE=fifo|mailbox|immediate|auto
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_u32("VITRA_GPU_MAX_CAPTURE_DIM") {
            self.max_capture_dimension = v.max(1);
        }
        if let Some(name) = env_string("VITRA_GPU_PRESENT_MODE") {
            match parse_present_mode(&name) {
                Some(mode) => self.present_mode = mode,
                None => tracing::warn!("ignoring unknown VITRA_GPU_PRESENT_MODE={}", name),
            }
        }
        self
    }

    /// Clamp to what the device supports
    pub(crate) fn clamp_to_limits(mut self, limits: &wgpu::Limits) -> Self {
        self.max_capture_dimension = self
            .max_capture_dimension
            .clamp(1, limits.max_texture_dimension_2d);
        self
    }
}

pub(crate) fn log_renderer_config(config: &RendererConfig) {
    tracing::info!(
        "gpu config: present_mode={:?}, max_capture_dimension={}, power_preference={:?}",
        config.present_mode,
        config.max_capture_dimension,
        config.power_preference
    );
}
