//! Capture error types

use thiserror::Error;

use crate::surface::SurfaceId;

/// Why a backdrop capture produced no texture
///
/// None of these are fatal. The scheduler logs them and keeps serving the
/// previously cached texture.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The surface's layer is not attached to a host window
    #[error("glass surface {0:?} is not attached to a host window")]
    Detached(SurfaceId),

    /// The surface covers no pixels
    #[error("capture bounds are empty ({width}x{height})")]
    EmptyBounds { width: f32, height: f32 },

    /// The raster canvas could not be allocated
    #[error("failed to allocate a {width}x{height} capture canvas")]
    CanvasAllocation { width: u32, height: u32 },

    /// Uploading the composite to the GPU failed
    #[error("texture upload failed: {0}")]
    Upload(String),
}

/// Result type for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;
