//! Backdrop compositing
//!
//! Produces a picture of everything painted *behind* a glass surface by
//! replaying the host hierarchy from the window root down to the surface's
//! own siblings. At every ancestor level only the siblings with a lower paint
//! index are drawn, so the surface itself and anything painted after it never
//! reach the canvas.
//!
//! ```text
//! window root
//! ├── A            <- drawn
//! ├── B            <- drawn
//! │   ├── B1       <- not visited (B is not an ancestor)
//! ├── panel        <- ancestor
//! │   ├── P1       <- drawn
//! │   ├── glass    <- the surface, never drawn
//! │   └── P2       <- painted after, never drawn
//! └── C            <- painted after panel, never drawn
//! ```

use std::path::Path;

use smallvec::SmallVec;
use tiny_skia::Pixmap;

use crate::canvas::RasterCanvas;
use crate::error::{CaptureError, Result};
use crate::geometry::{Affine2D, Rect};
use crate::surface::GlassSurface;
use crate::tree::{LayerId, LayerTree};

/// Largest capture edge in pixels when no GPU limit is known
pub const DEFAULT_MAX_CAPTURE_DIMENSION: u32 = 8192;

/// Rasterized picture of everything behind a glass surface
///
/// Pixels are premultiplied RGBA8 in the surface's window-space rectangle.
#[derive(Clone, Debug)]
pub struct CompositeImage {
    pixmap: Pixmap,
    window_rect: Rect,
    scale: f32,
    layers: SmallVec<[LayerId; 8]>,
}

impl CompositeImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA8 pixel data, rows tightly packed
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// The window-space rectangle this image covers
    pub fn window_rect(&self) -> Rect {
        self.window_rect
    }

    /// Pixels per logical unit
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Layers drawn into the image, in paint order
    pub fn rasterized_layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Pixel at (x, y) as premultiplied RGBA
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?;
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Write the composite to disk, for debugging captures
    pub fn save_png(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        self.pixmap
            .save_png(path)
            .map_err(std::io::Error::other)
    }
}

/// Walks a [`LayerTree`] and rasterizes what lies behind a glass surface
#[derive(Clone, Debug)]
pub struct HierarchyComposer {
    max_dimension: u32,
}

impl Default for HierarchyComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyComposer {
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_CAPTURE_DIMENSION,
        }
    }

    /// Clamp capture canvases to `max` pixels per edge (usually the GPU's
    /// maximum 2D texture size)
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max.max(1);
        self
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Rasterize everything painted behind `surface`
    ///
    /// Fails with [`CaptureError::Detached`] when the surface has no host
    /// window. A hierarchy that changes shape mid-walk yields a partial
    /// composite rather than an error.
    pub fn compose<T>(&self, tree: &T, surface: &GlassSurface) -> Result<CompositeImage>
    where
        T: LayerTree + ?Sized,
    {
        let window = tree
            .host_window(surface.layer)
            .ok_or(CaptureError::Detached(surface.id))?;

        // 1. surface rect in window space
        let to_window = window_space_transform(tree, surface.layer, window.root);
        let rect = to_window.transform_rect_bounds(surface.bounds);
        if rect.is_empty() {
            return Err(CaptureError::EmptyBounds {
                width: rect.width(),
                height: rect.height(),
            });
        }

        // 2. canvas mapped so window coordinates land on the surface rect
        let scale = {
            let s = window.scale_factor * surface.capture_scale;
            if s.is_finite() && s > 0.0 {
                s
            } else {
                1.0
            }
        };
        let (width, height, scale) = self.pixel_size(rect, scale);
        let mut canvas = RasterCanvas::new(width, height)
            .ok_or(CaptureError::CanvasAllocation { width, height })?;
        canvas.scale(scale, scale);
        canvas.translate(-rect.x(), -rect.y());
        canvas.clear(window.background);

        // 3-4. ancestor chain, outermost first
        let chain = ancestor_chain(tree, surface.layer, window.root);

        // 5-6. draw earlier siblings level by level
        let mut layers = SmallVec::new();
        let mut level_parent = window.root;
        let mut level_transform = Affine2D::IDENTITY;
        for wanted in chain {
            let siblings = tree.children(level_parent);
            let Some(index) = siblings.iter().position(|&s| s == wanted) else {
                tracing::debug!(
                    ?wanted,
                    ?level_parent,
                    "layer missing from its parent mid-walk, keeping partial composite"
                );
                break;
            };

            for &sibling in &siblings[..index] {
                let transform = tree
                    .window_transform(sibling)
                    .unwrap_or_else(|| level_transform.then(&tree.transform(sibling)));
                canvas.save();
                canvas.concat(&transform);
                tree.rasterize(sibling, &mut canvas);
                canvas.restore();
                layers.push(sibling);
            }

            level_transform = level_transform.then(&tree.transform(wanted));
            level_parent = wanted;
        }

        tracing::trace!(
            surface = ?surface.id,
            width,
            height,
            layers = layers.len(),
            "composed backdrop"
        );

        Ok(CompositeImage {
            pixmap: canvas.into_pixmap(),
            window_rect: rect,
            scale,
            layers,
        })
    }

    /// Canvas size in pixels, shrinking the scale if an edge would exceed the
    /// maximum dimension
    fn pixel_size(&self, rect: Rect, scale: f32) -> (u32, u32, f32) {
        let longest = rect.width().max(rect.height()) * scale;
        let max = self.max_dimension as f32;
        let scale = if longest > max { scale * max / longest } else { scale };
        let width = ((rect.width() * scale).ceil() as u32).clamp(1, self.max_dimension);
        let height = ((rect.height() * scale).ceil() as u32).clamp(1, self.max_dimension);
        (width, height, scale)
    }
}

/// Local-to-window transform of `layer`: the absolute reference when the
/// layer has one, otherwise relative transforms accumulated up to `root`
fn window_space_transform<T>(tree: &T, layer: LayerId, root: LayerId) -> Affine2D
where
    T: LayerTree + ?Sized,
{
    if let Some(absolute) = tree.window_transform(layer) {
        return absolute;
    }
    let mut transform = Affine2D::IDENTITY;
    let mut current = layer;
    while current != root {
        transform = tree.transform(current).then(&transform);
        match tree.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    transform
}

/// `layer` and its ancestors up to (excluding) `root`, outermost first
fn ancestor_chain<T>(tree: &T, layer: LayerId, root: LayerId) -> SmallVec<[LayerId; 8]>
where
    T: LayerTree + ?Sized,
{
    let mut chain = SmallVec::new();
    let mut target = layer;
    while target != root {
        let Some(parent) = tree.parent(target) else {
            break;
        };
        chain.push(target);
        target = parent;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use crate::surface::HostWindow;
    use crate::tree::{LayerArena, LayerContent, LayerNode};
    use rustc_hash::FxHashMap;

    fn fill(rect: Rect, color: Color) -> LayerNode {
        LayerNode::new(LayerContent::Fill { rect, color })
    }

    /// Arena whose host reports its own window transforms and child lists
    /// for some layers, the way a live view tree can disagree with its
    /// layers
    struct HostOverrides {
        arena: LayerArena,
        absolute: FxHashMap<LayerId, Affine2D>,
        children: FxHashMap<LayerId, Vec<LayerId>>,
    }

    impl HostOverrides {
        fn new(arena: LayerArena) -> Self {
            Self {
                arena,
                absolute: FxHashMap::default(),
                children: FxHashMap::default(),
            }
        }
    }

    impl LayerTree for HostOverrides {
        fn parent(&self, layer: LayerId) -> Option<LayerId> {
            self.arena.parent(layer)
        }

        fn children(&self, layer: LayerId) -> &[LayerId] {
            match self.children.get(&layer) {
                Some(children) => children.as_slice(),
                None => self.arena.children(layer),
            }
        }

        fn transform(&self, layer: LayerId) -> Affine2D {
            self.arena.transform(layer)
        }

        fn window_transform(&self, layer: LayerId) -> Option<Affine2D> {
            self.absolute
                .get(&layer)
                .copied()
                .or_else(|| self.arena.window_transform(layer))
        }

        fn host_window(&self, layer: LayerId) -> Option<HostWindow> {
            self.arena.host_window(layer)
        }

        fn rasterize(&self, layer: LayerId, canvas: &mut RasterCanvas) {
            self.arena.rasterize(layer, canvas);
        }
    }

    #[test]
    fn test_ancestor_chain_is_outermost_first() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        let a = arena.push(root, LayerNode::default());
        let b = arena.push(a, LayerNode::default());
        let c = arena.push(b, LayerNode::default());

        assert_eq!(ancestor_chain(&arena, c, root).as_slice(), &[a, b, c]);
        assert!(ancestor_chain(&arena, root, root).is_empty());
    }

    #[test]
    fn test_window_space_transform_accumulates() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE);
        let a = arena.push(root, LayerNode::default().at(10.0, 10.0));
        let b = arena.push(a, LayerNode::default().at(5.0, 0.0));

        let t = window_space_transform(&arena, b, root);
        assert_eq!(t, Affine2D::translation(15.0, 10.0));
    }

    #[test]
    fn test_background_fill_covers_gaps() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 50.0, 50.0), Color::BLUE);
        let glass = arena.push(root, LayerNode::default().at(10.0, 10.0));
        let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 20.0, 20.0));

        let image = HierarchyComposer::new().compose(&arena, &surface).unwrap();
        assert_eq!((image.width(), image.height()), (20, 20));
        assert_eq!(image.pixel(5, 5), Some([0, 0, 255, 255]));
        assert!(image.rasterized_layers().is_empty());
    }

    #[test]
    fn test_detached_surface_fails() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 50.0, 50.0), Color::WHITE);
        let glass = arena.push(root, LayerNode::default());
        arena.detach(glass);
        let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 20.0, 20.0));

        let err = HierarchyComposer::new().compose(&arena, &surface).unwrap_err();
        assert_eq!(err, CaptureError::Detached(surface.id));
    }

    #[test]
    fn test_empty_bounds_fail() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 50.0, 50.0), Color::WHITE);
        let glass = arena.push(root, LayerNode::default());
        let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 0.0, 20.0));

        let err = HierarchyComposer::new().compose(&arena, &surface).unwrap_err();
        assert!(matches!(err, CaptureError::EmptyBounds { .. }));
    }

    #[test]
    fn test_nested_levels_only_draw_earlier_siblings() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE);
        let a = arena.push(root, fill(Rect::new(0.0, 0.0, 100.0, 100.0), Color::RED));
        let panel = arena.push(root, LayerNode::default().at(20.0, 20.0));
        let c = arena.push(root, fill(Rect::new(0.0, 0.0, 100.0, 100.0), Color::BLACK));
        let p1 = arena.push(panel, fill(Rect::new(0.0, 0.0, 10.0, 10.0), Color::GREEN));
        let glass = arena.push(panel, LayerNode::default());
        let p2 = arena.push(panel, fill(Rect::new(0.0, 0.0, 60.0, 60.0), Color::BLACK));
        let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 60.0, 60.0));

        let image = HierarchyComposer::new().compose(&arena, &surface).unwrap();
        assert_eq!(image.rasterized_layers(), &[a, p1]);
        assert!(!image.rasterized_layers().contains(&c));
        assert!(!image.rasterized_layers().contains(&p2));

        // p1 sits at the panel origin, which is the surface origin
        assert_eq!(image.pixel(5, 5), Some([0, 255, 0, 255]));
        assert_eq!(image.pixel(30, 30), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_capture_scale_and_clamp() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 400.0, 400.0), Color::WHITE);
        let glass = arena.push(root, LayerNode::default());
        let surface =
            GlassSurface::new(glass, Rect::new(0.0, 0.0, 200.0, 100.0)).with_capture_scale(0.5);

        let image = HierarchyComposer::new().compose(&arena, &surface).unwrap();
        assert_eq!((image.width(), image.height()), (100, 50));

        let image = HierarchyComposer::new()
            .with_max_dimension(64)
            .compose(&arena, &surface.with_capture_scale(1.0))
            .unwrap();
        assert_eq!((image.width(), image.height()), (64, 32));
    }

    #[test]
    fn test_sibling_with_view_uses_absolute_transform() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE);
        let panel = arena.push(root, LayerNode::default().at(20.0, 20.0));
        let badge = arena.push(panel, fill(Rect::new(0.0, 0.0, 10.0, 10.0), Color::GREEN));
        let glass = arena.push(panel, LayerNode::default());
        let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 60.0, 60.0));

        // relative placement would put the badge at (20, 20) in the window
        let mut tree = HostOverrides::new(arena);
        tree.absolute.insert(badge, Affine2D::translation(60.0, 60.0));

        let image = HierarchyComposer::new().compose(&tree, &surface).unwrap();
        assert_eq!(image.window_rect(), Rect::new(20.0, 20.0, 60.0, 60.0));
        assert_eq!(image.rasterized_layers(), &[badge]);
        assert_eq!(image.pixel(45, 45), Some([0, 255, 0, 255]));
        assert_eq!(image.pixel(5, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_layer_missing_from_parent_keeps_partial_composite() {
        let mut arena = LayerArena::new();
        let root = arena.add_window(Rect::new(0.0, 0.0, 50.0, 50.0), Color::WHITE);
        let a = arena.push(root, fill(Rect::new(0.0, 0.0, 50.0, 50.0), Color::RED));
        let panel = arena.push(root, LayerNode::default());
        let p1 = arena.push(panel, fill(Rect::new(0.0, 0.0, 10.0, 10.0), Color::GREEN));
        let glass = arena.push(panel, LayerNode::default());
        let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 50.0, 50.0));

        // the glass still points at its parent, but the parent lost track of it
        let mut tree = HostOverrides::new(arena);
        tree.children.insert(panel, vec![p1]);

        let image = HierarchyComposer::new().compose(&tree, &surface).unwrap();
        assert_eq!(image.rasterized_layers(), &[a]);
        assert_eq!(image.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(40, 40), Some([255, 0, 0, 255]));
    }
}
