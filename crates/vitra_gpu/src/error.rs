//! Renderer error types

use thiserror::Error;

/// Error type for renderer setup and frame submission
#[derive(Error, Debug)]
pub enum RendererError {
    /// Failed to request GPU adapter
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    /// Failed to request GPU device
    #[error("failed to request GPU device: {0}")]
    DeviceError(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface
    #[error("failed to create surface: {0}")]
    SurfaceError(#[from] wgpu::CreateSurfaceError),

    /// Shader or pipeline creation was rejected by validation
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),

    /// The surface reported it is out of memory; the render loop cannot
    /// continue
    #[error("out of GPU memory")]
    OutOfMemory,
}

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, RendererError>;
