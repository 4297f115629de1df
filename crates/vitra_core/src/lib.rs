//! Vitra Core
//!
//! Backdrop capture for liquid glass surfaces:
//!
//! - **Layer hierarchy**: the [`LayerTree`] trait the host implements, plus an
//!   in-memory [`LayerArena`]
//! - **Compositing**: [`HierarchyComposer`] rasterizes everything painted
//!   behind a surface, never the surface itself or anything above it
//! - **Caching**: [`TextureCache`] holds one texture and notifies on change
//! - **Scheduling**: [`CaptureScheduler`] applies a [`RefreshPolicy`] with a
//!   re-entrancy guard
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use vitra_core::{
//!     CaptureScheduler, Color, CompositeImage, GlassSurface, LayerArena, LayerNode, Rect,
//!     RefreshPolicy, TextureUploader,
//! };
//!
//! struct Counter(Cell<u32>);
//!
//! impl TextureUploader for Counter {
//!     type Texture = u32;
//!
//!     fn upload(&self, _image: &CompositeImage) -> vitra_core::Result<u32> {
//!         self.0.set(self.0.get() + 1);
//!         Ok(self.0.get())
//!     }
//! }
//!
//! let mut tree = LayerArena::new();
//! let root = tree.add_window(Rect::new(0.0, 0.0, 400.0, 800.0), Color::WHITE);
//! let glass = tree.push(root, LayerNode::default().at(50.0, 100.0));
//! let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 300.0, 600.0));
//!
//! let scheduler = CaptureScheduler::new(Counter(Cell::new(0)), RefreshPolicy::Once);
//! assert_eq!(scheduler.texture_for(&tree, &surface), Some(1));
//! // served from the cache until invalidated
//! assert_eq!(scheduler.texture_for(&tree, &surface), Some(1));
//! ```

pub mod cache;
pub mod canvas;
pub mod composer;
pub mod error;
pub mod geometry;
pub mod policy;
pub mod scheduler;
pub mod surface;
pub mod tree;

pub use cache::{ListenerId, TextureCache};
pub use canvas::RasterCanvas;
pub use composer::{CompositeImage, HierarchyComposer, DEFAULT_MAX_CAPTURE_DIMENSION};
pub use error::{CaptureError, Result};
pub use geometry::{Affine2D, Color, Point, Rect, Size};
pub use policy::{RefreshPolicy, RepeatingTimer, DEFAULT_REFRESH_INTERVAL};
pub use scheduler::{CaptureScheduler, CaptureStats, TextureUploader};
pub use surface::{GlassSurface, HostWindow, SurfaceId, CLIP_RADIUS_FACTOR};
pub use tree::{LayerArena, LayerContent, LayerId, LayerNode, LayerTree};
