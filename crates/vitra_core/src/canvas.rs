//! Software raster canvas that host layers draw themselves into
//!
//! A thin transform-stack wrapper over a `tiny_skia::Pixmap`. The composer
//! positions the canvas before handing it to [`LayerTree::rasterize`], so
//! layers always draw in their own local coordinate space.
//!
//! [`LayerTree::rasterize`]: crate::tree::LayerTree::rasterize

use smallvec::SmallVec;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Transform};

use crate::geometry::{Affine2D, Color, Rect};

/// Cubic bezier control distance for a quarter circle
const KAPPA: f32 = 0.552_284_8;

/// Raster target with a save/restore transform stack
pub struct RasterCanvas {
    pixmap: Pixmap,
    transform: Transform,
    stack: SmallVec<[Transform; 8]>,
}

impl std::fmt::Debug for RasterCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterCanvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("transform", &self.transform)
            .field("depth", &self.stack.len())
            .finish()
    }
}

impl RasterCanvas {
    /// Allocate a transparent canvas. Returns `None` for zero-sized canvases.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            transform: Transform::identity(),
            stack: SmallVec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Push the current transform
    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    /// Pop the most recently saved transform. Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    /// Number of unmatched `save` calls
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.pre_translate(dx, dy);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.transform = self.transform.pre_scale(sx, sy);
    }

    /// Apply `transform` to everything drawn afterwards (local space first)
    pub fn concat(&mut self, transform: &Affine2D) {
        self.transform = self.transform.pre_concat(transform.to_skia());
    }

    /// Fill the whole canvas, ignoring the current transform
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(r) = tiny_skia::Rect::from_xywh(rect.x(), rect.y(), rect.width(), rect.height())
        else {
            return;
        };
        let paint = solid_paint(color);
        self.pixmap.fill_rect(r, &paint, self.transform, None);
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
        if radius <= 0.0 {
            self.fill_rect(rect, color);
            return;
        }
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let paint = solid_paint(color);
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, self.transform, None);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let Some(path) = PathBuilder::from_circle(cx, cy, radius) else {
            return;
        };
        let paint = solid_paint(color);
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, self.transform, None);
    }

    /// Draw another pixmap with its top-left corner at local (x, y)
    pub fn draw_pixmap(&mut self, x: f32, y: f32, pixmap: &Pixmap) {
        let transform = self.transform.pre_translate(x, y);
        self.pixmap
            .draw_pixmap(0, 0, pixmap.as_ref(), &PixmapPaint::default(), transform, None);
    }

    pub(crate) fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn rounded_rect_path(rect: Rect, r: f32) -> Option<tiny_skia::Path> {
    let (x0, y0, x1, y1) = (rect.x(), rect.y(), rect.max_x(), rect.max_y());
    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(x0 + r, y0);
    pb.line_to(x1 - r, y0);
    pb.cubic_to(x1 - r + k, y0, x1, y0 + r - k, x1, y0 + r);
    pb.line_to(x1, y1 - r);
    pb.cubic_to(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1);
    pb.line_to(x0 + r, y1);
    pb.cubic_to(x0 + r - k, y1, x0, y1 - r + k, x0, y1 - r);
    pb.line_to(x0, y0 + r);
    pb.cubic_to(x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0);
    pb.close();
    pb.finish()
}
