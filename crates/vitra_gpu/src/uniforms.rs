//! Per-frame uniform block for the glass shader

use bytemuck::{Pod, Zeroable};
use vitra_core::Size;

/// Uniforms for the refraction pass
///
/// Layout must match the WGSL `Uniforms` struct exactly: two 16-byte groups,
/// 32 bytes total.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct UniformBlock {
    /// Drawable size in pixels
    pub resolution: [f32; 2],
    /// Seconds since the render loop started
    pub time: f32,
    pub _pad0: f32,
    /// Glass surface size in logical units
    pub box_size: [f32; 2],
    /// Corner radius in logical units
    pub corner_radius: f32,
    pub _pad1: f32,
}

impl UniformBlock {
    pub fn new(resolution: (u32, u32), time: f32, box_size: Size, corner_radius: f32) -> Self {
        Self {
            resolution: [resolution.0 as f32, resolution.1 as f32],
            time,
            _pad0: 0.0,
            box_size: box_size.to_array(),
            corner_radius,
            _pad1: 0.0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
