//! Geometry and color types shared by the capture pipeline
//!
//! All coordinates are logical units (points). Conversion to device pixels
//! happens once, when a capture canvas is allocated.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Rect of this size anchored at the window origin
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::new(0.0, 0.0),
            size: self,
        }
    }

    /// Nothing can be drawn into it: a side is zero, negative or NaN
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Packed for uniform upload
    pub fn to_array(&self) -> [f32; 2] {
        [self.width, self.height]
    }
}

/// Axis-aligned rectangle in logical units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn max_x(&self) -> f32 {
        self.x() + self.width()
    }

    pub fn max_y(&self) -> f32 {
        self.y() + self.height()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }
}

/// Affine map from a layer's space into its parent's
///
/// Stored column-major as `[a, b, c, d, tx, ty]`, so a point maps to
/// `(a*x + c*y + tx, b*x + d*y + ty)`. Same layout as `tiny_skia::Transform`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D::from_row(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    const fn from_row(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub const fn translation(x: f32, y: f32) -> Self {
        Self::from_row(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::from_row(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn transform_point(&self, p: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point {
            x: a * p.x + c * p.y + tx,
            y: b * p.x + d * p.y + ty,
        }
    }

    /// Smallest axis-aligned rect holding the four mapped corners of `rect`
    pub fn transform_rect_bounds(&self, rect: Rect) -> Rect {
        let corners = [
            Point::new(rect.x(), rect.y()),
            Point::new(rect.max_x(), rect.y()),
            Point::new(rect.x(), rect.max_y()),
            Point::new(rect.max_x(), rect.max_y()),
        ]
        .map(|p| self.transform_point(p));

        let mut min = corners[0];
        let mut max = corners[0];
        for p in &corners[1..] {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// `self ∘ inner`: map through `inner` first, then through `self`
    ///
    /// Walking up a layer chain, `parent.then(&child)` turns child space
    /// straight into grandparent space.
    pub fn then(&self, inner: &Affine2D) -> Affine2D {
        let [a, b, c, d, tx, ty] = self.elements;
        let [ia, ib, ic, id, itx, ity] = inner.elements;
        Affine2D::from_row(
            a * ia + c * ib,
            b * ia + d * ib,
            a * ic + c * id,
            b * ic + d * id,
            a * itx + c * ity + tx,
            b * itx + d * ity + ty,
        )
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Transform {
        let [a, b, c, d, tx, ty] = self.elements;
        tiny_skia::Transform::from_row(a, b, c, d, tx, ty)
    }
}

/// Straight-alpha RGBA, components in `0.0..=1.0`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from `0xRRGGBB`
    pub fn from_hex(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xFF) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Blend toward `other`; `t` is clamped to `0.0..=1.0`
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |from: f32, to: f32| from + (to - from) * t;
        Color::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        tiny_skia::Color::from_rgba8(byte(self.r), byte(self.g), byte(self.b), byte(self.a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_sizes_are_empty() {
        assert!(Size::new(0.0, 40.0).is_empty());
        assert!(Size::new(40.0, -1.0).is_empty());
        assert!(Size::new(f32::NAN, 40.0).is_empty());
        assert!(!Size::new(0.5, 0.5).is_empty());

        let window = Size::new(390.0, 844.0).to_rect();
        assert_eq!(window, Rect::new(0.0, 0.0, 390.0, 844.0));
        assert_eq!((window.max_x(), window.max_y()), (390.0, 844.0));
    }

    #[test]
    fn test_then_maps_inner_first() {
        let offset = Affine2D::translation(8.0, -4.0);
        let zoom = Affine2D::scale(3.0, 3.0);
        let p = Point::new(2.0, 5.0);

        assert_eq!(offset.then(&zoom).transform_point(p), Point::new(14.0, 11.0));
        assert_eq!(zoom.then(&offset).transform_point(p), Point::new(30.0, 3.0));
        assert_eq!(Affine2D::IDENTITY.then(&offset), offset);
    }

    #[test]
    fn test_rect_bounds_under_translation_and_flip() {
        let moved = Affine2D::translation(50.0, 100.0)
            .transform_rect_bounds(Rect::new(0.0, 0.0, 300.0, 600.0));
        assert_eq!(moved, Rect::new(50.0, 100.0, 300.0, 600.0));

        // mirror across the y axis keeps the extent, flips the origin
        let flipped =
            Affine2D::scale(-1.0, 2.0).transform_rect_bounds(Rect::new(10.0, 5.0, 20.0, 4.0));
        assert_eq!(flipped, Rect::new(-30.0, 10.0, 20.0, 8.0));
    }

    #[test]
    fn test_hex_and_blend() {
        let orange = Color::from_hex(0xFF80_00);
        assert_eq!((orange.r, orange.b, orange.a), (1.0, 0.0, 1.0));
        assert!((orange.g - 128.0 / 255.0).abs() < 1e-6);

        let half = Color::RED.lerp(&Color::BLUE.with_alpha(0.0), 0.5);
        assert_eq!(half, Color::rgba(0.5, 0.0, 0.5, 0.5));
        assert_eq!(Color::RED.lerp(&Color::BLUE, 4.0), Color::BLUE);
    }
}
