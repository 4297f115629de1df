//! Read-only view of the host's paint hierarchy
//!
//! The capture engine never walks a concrete view type. Any host UI layer
//! exposes its hierarchy through [`LayerTree`]; [`LayerArena`] is a ready-made
//! in-memory implementation used by the demo and tests.
//!
//! # Paint order
//!
//! Children paint in slice order: index 0 first (visually furthest back),
//! the last child on top.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tiny_skia::Pixmap;

use std::sync::Arc;

use crate::canvas::RasterCanvas;
use crate::geometry::{Affine2D, Color, Rect};
use crate::surface::HostWindow;

new_key_type! {
    /// Handle to one node of the paint hierarchy
    pub struct LayerId;
}

/// Hierarchy queries the capture engine needs from the host
pub trait LayerTree {
    /// Parent layer, or `None` for roots and detached layers
    fn parent(&self, layer: LayerId) -> Option<LayerId>;

    /// Children in paint order
    fn children(&self, layer: LayerId) -> &[LayerId];

    /// Transform from the layer's local space into its parent's space
    fn transform(&self, layer: LayerId) -> Affine2D;

    /// Absolute local-to-window transform, available only for layers that
    /// carry a back-reference to a logical view
    fn window_transform(&self, layer: LayerId) -> Option<Affine2D>;

    /// The window hosting this layer, or `None` if it is detached
    fn host_window(&self, layer: LayerId) -> Option<HostWindow>;

    /// Draw the layer and its subtree in the layer's local space
    fn rasterize(&self, layer: LayerId, canvas: &mut RasterCanvas);
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory tree
// ─────────────────────────────────────────────────────────────────────────────

/// What a layer paints before its children
#[derive(Clone, Debug, Default)]
pub enum LayerContent {
    /// Pure container
    #[default]
    Empty,
    /// Solid fill of the given local rect
    Fill { rect: Rect, color: Color },
    /// Rounded fill of the given local rect
    RoundedFill {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    /// Horizontal bands interpolating between two colors
    Gradient {
        rect: Rect,
        from: Color,
        to: Color,
        bands: u32,
    },
    /// Pre-rendered pixels with their top-left corner at the local origin
    Image(Arc<Pixmap>),
}

/// One node of a [`LayerArena`]
#[derive(Clone, Debug, Default)]
pub struct LayerNode {
    pub parent: Option<LayerId>,
    pub children: SmallVec<[LayerId; 4]>,
    pub transform: Affine2D,
    /// Logical view this layer renders, if any
    pub view: Option<u64>,
    pub content: LayerContent,
    pub hidden: bool,
}

impl LayerNode {
    pub fn new(content: LayerContent) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Affine2D) -> Self {
        self.transform = transform;
        self
    }

    /// Place the layer at (x, y) in its parent
    pub fn at(self, x: f32, y: f32) -> Self {
        self.with_transform(Affine2D::translation(x, y))
    }

    pub fn with_view(mut self, view: u64) -> Self {
        self.view = Some(view);
        self
    }
}

/// Slotmap-backed paint hierarchy with any number of windows
#[derive(Debug, Default)]
pub struct LayerArena {
    nodes: SlotMap<LayerId, LayerNode>,
    windows: FxHashMap<LayerId, HostWindow>,
}

impl LayerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a window and its root layer
    pub fn add_window(&mut self, bounds: Rect, background: Color) -> LayerId {
        let root = self.nodes.insert(LayerNode::default());
        self.windows
            .insert(root, HostWindow::new(root, bounds).with_background(background));
        root
    }

    /// Replace the window description for an existing root
    pub fn set_window(&mut self, window: HostWindow) {
        self.windows.insert(window.root, window);
    }

    pub fn window(&self, root: LayerId) -> Option<&HostWindow> {
        self.windows.get(&root)
    }

    /// Append `node` as the topmost child of `parent`
    pub fn push(&mut self, parent: LayerId, node: LayerNode) -> LayerId {
        let index = self.nodes.get(parent).map_or(0, |p| p.children.len());
        self.insert(parent, index, node)
    }

    /// Insert `node` into `parent`'s children at paint position `index`
    ///
    /// Indices past the end append. A missing parent leaves the node detached.
    pub fn insert(&mut self, parent: LayerId, index: usize, mut node: LayerNode) -> LayerId {
        let has_parent = self.nodes.contains_key(parent);
        node.parent = has_parent.then_some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id);
        }
        id
    }

    /// Unlink a layer from its parent, keeping its subtree intact
    pub fn detach(&mut self, layer: LayerId) {
        let Some(parent) = self.nodes.get_mut(layer).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != layer);
        }
    }

    /// Re-link a detached layer on top of `parent`
    pub fn attach(&mut self, parent: LayerId, layer: LayerId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(layer) {
            return;
        }
        self.detach(layer);
        self.nodes[layer].parent = Some(parent);
        self.nodes[parent].children.push(layer);
    }

    /// Remove a layer and its whole subtree
    pub fn remove(&mut self, layer: LayerId) {
        self.detach(layer);
        let mut pending = vec![layer];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(id) {
                pending.extend(node.children);
            }
            self.windows.remove(&id);
        }
    }

    pub fn get(&self, layer: LayerId) -> Option<&LayerNode> {
        self.nodes.get(layer)
    }

    pub fn get_mut(&mut self, layer: LayerId) -> Option<&mut LayerNode> {
        self.nodes.get_mut(layer)
    }

    pub fn set_transform(&mut self, layer: LayerId, transform: Affine2D) {
        if let Some(node) = self.nodes.get_mut(layer) {
            node.transform = transform;
        }
    }

    pub fn set_content(&mut self, layer: LayerId, content: LayerContent) {
        if let Some(node) = self.nodes.get_mut(layer) {
            node.content = content;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn root_of(&self, layer: LayerId) -> Option<LayerId> {
        let mut current = layer;
        // Bounded by node count so a corrupted parent cycle can't hang us
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(current)?.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
        None
    }

    fn accumulated_transform(&self, layer: LayerId) -> Affine2D {
        let mut transform = Affine2D::IDENTITY;
        let mut current = Some(layer);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            if node.parent.is_none() {
                // root space is window space
                break;
            }
            transform = node.transform.then(&transform);
            current = node.parent;
        }
        transform
    }

    fn paint_content(content: &LayerContent, canvas: &mut RasterCanvas) {
        match content {
            LayerContent::Empty => {}
            LayerContent::Fill { rect, color } => canvas.fill_rect(*rect, *color),
            LayerContent::RoundedFill {
                rect,
                radius,
                color,
            } => canvas.fill_rounded_rect(*rect, *radius, *color),
            LayerContent::Gradient {
                rect,
                from,
                to,
                bands,
            } => {
                let bands = (*bands).max(1);
                let band_height = rect.height() / bands as f32;
                for i in 0..bands {
                    let t = if bands == 1 {
                        0.0
                    } else {
                        i as f32 / (bands - 1) as f32
                    };
                    let band = Rect::new(
                        rect.x(),
                        rect.y() + band_height * i as f32,
                        rect.width(),
                        band_height,
                    );
                    canvas.fill_rect(band, from.lerp(to, t));
                }
            }
            LayerContent::Image(pixmap) => canvas.draw_pixmap(0.0, 0.0, pixmap),
        }
    }
}

impl LayerTree for LayerArena {
    fn parent(&self, layer: LayerId) -> Option<LayerId> {
        self.nodes.get(layer)?.parent
    }

    fn children(&self, layer: LayerId) -> &[LayerId] {
        self.nodes.get(layer).map_or(&[], |n| n.children.as_slice())
    }

    fn transform(&self, layer: LayerId) -> Affine2D {
        self.nodes
            .get(layer)
            .map_or(Affine2D::IDENTITY, |n| n.transform)
    }

    fn window_transform(&self, layer: LayerId) -> Option<Affine2D> {
        if self.nodes.get(layer)?.view.is_none() {
            return None;
        }
        self.host_window(layer)?;
        Some(self.accumulated_transform(layer))
    }

    fn host_window(&self, layer: LayerId) -> Option<HostWindow> {
        let root = self.root_of(layer)?;
        self.windows.get(&root).copied()
    }

    fn rasterize(&self, layer: LayerId, canvas: &mut RasterCanvas) {
        let Some(node) = self.nodes.get(layer) else {
            return;
        };
        if node.hidden {
            return;
        }
        Self::paint_content(&node.content, canvas);
        for &child in &node.children {
            let transform = self.transform(child);
            canvas.save();
            canvas.concat(&transform);
            self.rasterize(child, canvas);
            canvas.restore();
        }
    }
}
