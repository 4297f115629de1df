//! Vitra GPU Renderer
//!
//! Liquid glass refraction pass using wgpu: uploads captured backdrops and
//! draws them through the glass shader every frame.

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod render_loop;
pub mod shaders;
pub mod texture;
pub mod uniforms;

#[cfg(test)]
mod test_support;

pub use config::RendererConfig;
pub use context::GpuContext;
pub use error::{RendererError, Result};
pub use pipeline::GlassPipeline;
pub use render_loop::{FrameStatus, GlassPresenter, RenderLoop};
pub use texture::{GlassTexture, WgpuUploader, BACKDROP_FORMAT};
pub use uniforms::UniformBlock;
