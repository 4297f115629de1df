//! Glass surfaces and the host windows that contain them

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{Color, Rect, Size};
use crate::tree::LayerId;

/// Hosts clip the rendered glass to a rounded rect of
/// `corner_radius * CLIP_RADIUS_FACTOR`.
pub const CLIP_RADIUS_FACTOR: f32 = 0.32;

/// Identity of a glass surface, used to associate cached textures with the
/// surface they were captured for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Allocate a process-unique id
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The visual element requesting the glass effect
///
/// Owned by the embedding UI; the capture engine only copies it around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlassSurface {
    /// Cache/target identity
    pub id: SurfaceId,
    /// The layer this surface paints into
    pub layer: LayerId,
    /// Bounds in the layer's local space
    pub bounds: Rect,
    /// Corner radius in logical units
    pub corner_radius: f32,
    /// Backdrop resolution multiplier. The refraction kernel blurs the
    /// backdrop, so captures below 1.0 lose little visible detail.
    pub capture_scale: f32,
}

impl GlassSurface {
    pub fn new(layer: LayerId, bounds: Rect) -> Self {
        Self {
            id: SurfaceId::fresh(),
            layer,
            bounds,
            corner_radius: 20.0,
            capture_scale: 1.0,
        }
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius.max(0.0);
        self
    }

    pub fn with_capture_scale(mut self, scale: f32) -> Self {
        self.capture_scale = scale;
        self
    }

    /// Logical size passed to the shader as `box_size`
    pub fn box_size(&self) -> Size {
        self.bounds.size
    }

    /// Radius of the rounded-rect clip hosts apply to the rendered output
    pub fn clip_radius(&self) -> f32 {
        self.corner_radius * CLIP_RADIUS_FACTOR
    }
}

/// The root compositing surface containing a glass surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostWindow {
    /// Root layer of the window's paint hierarchy
    pub root: LayerId,
    /// Window-space bounds
    pub bounds: Rect,
    /// Seeds every composite so uncovered regions aren't transparent
    pub background: Color,
    /// Device pixels per logical unit
    pub scale_factor: f32,
}

impl HostWindow {
    pub fn new(root: LayerId, bounds: Rect) -> Self {
        Self {
            root,
            bounds,
            background: Color::WHITE,
            scale_factor: 1.0,
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn with_scale_factor(mut self, scale: f32) -> Self {
        self.scale_factor = scale;
        self
    }
}
