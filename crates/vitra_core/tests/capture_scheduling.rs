//! Integration tests for capture scheduling + hierarchy compositing
//!
//! These tests verify that:
//! - Each refresh policy captures exactly when it should
//! - The composer draws only what is painted behind the surface
//! - The re-entrancy guard drops nested captures and is always released
//! - Cached textures survive detaching and never leak across surfaces

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use vitra_core::{
    Affine2D, CaptureScheduler, Color, CompositeImage, GlassSurface, HostWindow, LayerArena,
    LayerContent, LayerId, LayerNode, LayerTree, RasterCanvas, Rect, RefreshPolicy,
    TextureUploader,
};

/// Uploader that keeps every composite it sees and returns its index
#[derive(Default)]
struct Recorder {
    images: RefCell<Vec<CompositeImage>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.images.borrow().len()
    }
}

impl TextureUploader for Recorder {
    type Texture = usize;

    fn upload(&self, image: &CompositeImage) -> vitra_core::Result<usize> {
        let mut images = self.images.borrow_mut();
        images.push(image.clone());
        Ok(images.len() - 1)
    }
}

fn fill(rect: Rect, color: Color) -> LayerNode {
    LayerNode::new(LayerContent::Fill { rect, color })
}

struct Scene {
    tree: LayerArena,
    a: LayerId,
    b: LayerId,
    c: LayerId,
    surface: GlassSurface,
}

/// 400x800 window: A (red, full), B (blue square at 50,100), the glass
/// surface (300x600 at 50,100), then C (green, full)
fn scene() -> Scene {
    let mut tree = LayerArena::new();
    let root = tree.add_window(Rect::new(0.0, 0.0, 400.0, 800.0), Color::WHITE);
    let a = tree.push(root, fill(Rect::new(0.0, 0.0, 400.0, 800.0), Color::RED));
    let b = tree.push(
        root,
        fill(Rect::new(0.0, 0.0, 100.0, 100.0), Color::BLUE).at(50.0, 100.0),
    );
    let glass = tree.push(root, LayerNode::default().at(50.0, 100.0));
    let c = tree.push(root, fill(Rect::new(0.0, 0.0, 400.0, 800.0), Color::GREEN));
    let surface = GlassSurface::new(glass, Rect::new(0.0, 0.0, 300.0, 600.0));
    Scene {
        tree,
        a,
        b,
        c,
        surface,
    }
}

#[test]
fn test_composite_excludes_surface_and_later_siblings() {
    let s = scene();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);

    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));

    let images = scheduler.uploader().images.borrow();
    let image = &images[0];
    assert_eq!((image.width(), image.height()), (300, 600));
    assert_eq!(image.window_rect(), Rect::new(50.0, 100.0, 300.0, 600.0));
    assert_eq!(image.rasterized_layers(), &[s.a, s.b]);
    assert!(!image.rasterized_layers().contains(&s.c));

    // B lands on the composite origin, A everywhere else, C nowhere
    assert_eq!(image.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(image.pixel(200, 300), Some([255, 0, 0, 255]));
    assert_eq!(image.pixel(299, 599), Some([255, 0, 0, 255]));
}

#[test]
fn test_once_captures_exactly_once() {
    let s = scene();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);

    for _ in 0..5 {
        assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));
    }
    assert!(!scheduler.tick(&s.tree, Instant::now() + Duration::from_secs(60)));

    assert_eq!(scheduler.uploader().count(), 1);
    assert_eq!(scheduler.stats().captures, 1);
}

#[test]
fn test_manual_waits_for_invalidate() {
    let s = scene();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Manual);

    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), None);
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), None);
    assert!(!scheduler.tick(&s.tree, Instant::now() + Duration::from_secs(60)));
    assert_eq!(scheduler.uploader().count(), 0);

    scheduler.invalidate();
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));
    assert_eq!(scheduler.uploader().count(), 1);
}

#[test]
fn test_invalidate_recaptures_on_next_request() {
    let s = scene();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);

    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));
    scheduler.invalidate();
    assert_eq!(scheduler.cache().current(), None);
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(1));
}

#[test]
fn test_continuous_to_manual_disarms_timer() {
    let s = scene();
    let t0 = Instant::now();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Manual);
    scheduler.set_policy_at(RefreshPolicy::Continuous(Duration::from_millis(200)), t0);

    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));
    assert!(scheduler.tick(&s.tree, t0 + Duration::from_millis(200)));
    assert_eq!(scheduler.uploader().count(), 2);

    scheduler.set_policy_at(RefreshPolicy::Manual, t0 + Duration::from_millis(250));
    assert_eq!(scheduler.next_deadline(), None);
    for secs in 1..10 {
        assert!(!scheduler.tick(&s.tree, t0 + Duration::from_secs(secs)));
    }
    assert_eq!(scheduler.uploader().count(), 2);
}

#[test]
fn test_continuous_skips_missed_periods() {
    let s = scene();
    let t0 = Instant::now();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Manual);
    scheduler.set_policy_at(RefreshPolicy::Continuous(Duration::from_millis(100)), t0);
    scheduler.invalidate();
    scheduler.texture_for(&s.tree, &s.surface);

    // ten periods late: one capture, not ten
    assert!(scheduler.tick(&s.tree, t0 + Duration::from_millis(1050)));
    assert!(!scheduler.tick(&s.tree, t0 + Duration::from_millis(1060)));
    assert_eq!(scheduler.uploader().count(), 2);
    assert_eq!(
        scheduler.next_deadline(),
        Some(t0 + Duration::from_millis(1100))
    );
}

#[test]
fn test_invalidate_is_idempotent() {
    let s = scene();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);
    let notifications = Rc::new(Cell::new(0));

    let n = Rc::clone(&notifications);
    scheduler.cache().on_update(move |_| n.set(n.get() + 1));

    scheduler.texture_for(&s.tree, &s.surface);
    scheduler.invalidate();
    scheduler.invalidate();

    assert_eq!(notifications.get(), 2);
    assert_eq!(scheduler.cache().generation(), 2);
    assert!(scheduler.cache().is_empty());
}

#[test]
fn test_each_capture_notifies_once() {
    let s = scene();
    let t0 = Instant::now();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);
    scheduler.set_policy_at(RefreshPolicy::Continuous(Duration::from_millis(10)), t0);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&seen);
    scheduler.cache().on_update(move |t| log.borrow_mut().push(t.copied()));

    scheduler.texture_for(&s.tree, &s.surface);
    scheduler.tick(&s.tree, t0 + Duration::from_millis(10));
    scheduler.tick(&s.tree, t0 + Duration::from_millis(20));

    assert_eq!(*seen.borrow(), vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn test_detached_surface_keeps_cached_texture() {
    let mut s = scene();
    let t0 = Instant::now();
    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);
    scheduler.set_policy_at(RefreshPolicy::Continuous(Duration::from_millis(50)), t0);

    let first = scheduler.texture_for(&s.tree, &s.surface);
    assert_eq!(first, Some(0));

    s.tree.detach(s.surface.layer);
    assert!(!scheduler.tick(&s.tree, t0 + Duration::from_millis(50)));
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), first);
    assert_eq!(scheduler.stats().failures, 1);
    assert_eq!(scheduler.uploader().count(), 1);
}

#[test]
fn test_switching_surface_never_serves_other_texture() {
    let mut s = scene();
    let root = s.tree.parent(s.surface.layer).unwrap();
    let other_layer = s.tree.push(root, LayerNode::default().at(0.0, 0.0));
    let other = GlassSurface::new(other_layer, Rect::new(0.0, 0.0, 40.0, 40.0));

    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Manual);
    scheduler.invalidate();
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));

    // Manual has no pending request for the new target
    assert_eq!(scheduler.texture_for(&s.tree, &other), None);
    assert_eq!(scheduler.target().map(|t| t.id), Some(other.id));
    // the old texture stays cached until overwritten
    assert_eq!(scheduler.cache().current(), Some(0));

    scheduler.set_policy(RefreshPolicy::Once);
    assert_eq!(scheduler.texture_for(&s.tree, &other), Some(1));
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(2));
}

/// Tree whose rasterize callback asks the scheduler for a texture, as a
/// layer that itself hosts glass would
struct ReentrantTree {
    inner: LayerArena,
    scheduler: RefCell<Option<Rc<CaptureScheduler<Recorder>>>>,
    surface: GlassSurface,
    nested: RefCell<Vec<(bool, Option<usize>)>>,
}

impl LayerTree for ReentrantTree {
    fn parent(&self, layer: LayerId) -> Option<LayerId> {
        self.inner.parent(layer)
    }

    fn children(&self, layer: LayerId) -> &[LayerId] {
        self.inner.children(layer)
    }

    fn transform(&self, layer: LayerId) -> Affine2D {
        self.inner.transform(layer)
    }

    fn window_transform(&self, layer: LayerId) -> Option<Affine2D> {
        self.inner.window_transform(layer)
    }

    fn host_window(&self, layer: LayerId) -> Option<HostWindow> {
        self.inner.host_window(layer)
    }

    fn rasterize(&self, layer: LayerId, canvas: &mut RasterCanvas) {
        if let Some(scheduler) = self.scheduler.borrow().as_ref() {
            let texture = scheduler.texture_for(self, &self.surface);
            self.nested
                .borrow_mut()
                .push((scheduler.is_capturing(), texture));
        }
        self.inner.rasterize(layer, canvas);
    }
}

#[test]
fn test_reentrant_request_is_dropped() {
    let s = scene();
    let tree = ReentrantTree {
        inner: s.tree,
        scheduler: RefCell::new(None),
        surface: s.surface,
        nested: RefCell::new(Vec::new()),
    };
    let scheduler = Rc::new(CaptureScheduler::new(
        Recorder::default(),
        RefreshPolicy::Once,
    ));
    *tree.scheduler.borrow_mut() = Some(Rc::clone(&scheduler));

    assert_eq!(scheduler.texture_for(&tree, &s.surface), Some(0));

    // A and B each asked once, mid-capture, and got nothing
    assert_eq!(*tree.nested.borrow(), vec![(true, None), (true, None)]);
    assert_eq!(scheduler.uploader().count(), 1);
    assert_eq!(scheduler.stats().skipped_busy, 2);
    assert!(!scheduler.is_capturing());
}

#[test]
fn test_renderer_never_reads_other_surface_texture() {
    let mut s = scene();
    let root = s.tree.parent(s.surface.layer).unwrap();
    let other_layer = s.tree.push(root, LayerNode::default());
    let other = GlassSurface::new(other_layer, Rect::new(0.0, 0.0, 40.0, 40.0));

    let scheduler = CaptureScheduler::new(Recorder::default(), RefreshPolicy::Once);
    assert_eq!(scheduler.texture_for(&s.tree, &s.surface), Some(0));
    assert_eq!(scheduler.current(&s.surface), Some(0));

    // the second surface can't be captured, so the first one's texture lingers
    s.tree.detach(other_layer);
    assert_eq!(scheduler.texture_for(&s.tree, &other), None);
    assert_eq!(scheduler.cache().current(), Some(0));
    assert_eq!(scheduler.current(&other), None);
    assert_eq!(scheduler.current(&s.surface), Some(0));
}

/// Tree that invalidates the scheduler from inside the first rasterize call,
/// as a host reacting to a layout change mid-capture would
struct InvalidatingTree {
    inner: LayerArena,
    scheduler: RefCell<Option<Rc<CaptureScheduler<Recorder>>>>,
    armed: Cell<bool>,
}

impl LayerTree for InvalidatingTree {
    fn parent(&self, layer: LayerId) -> Option<LayerId> {
        self.inner.parent(layer)
    }

    fn children(&self, layer: LayerId) -> &[LayerId] {
        self.inner.children(layer)
    }

    fn transform(&self, layer: LayerId) -> Affine2D {
        self.inner.transform(layer)
    }

    fn window_transform(&self, layer: LayerId) -> Option<Affine2D> {
        self.inner.window_transform(layer)
    }

    fn host_window(&self, layer: LayerId) -> Option<HostWindow> {
        self.inner.host_window(layer)
    }

    fn rasterize(&self, layer: LayerId, canvas: &mut RasterCanvas) {
        if self.armed.replace(false) {
            if let Some(scheduler) = self.scheduler.borrow().as_ref() {
                scheduler.invalidate();
            }
        }
        self.inner.rasterize(layer, canvas);
    }
}

#[test]
fn test_invalidate_during_capture_discards_result() {
    let s = scene();
    let tree = InvalidatingTree {
        inner: s.tree,
        scheduler: RefCell::new(None),
        armed: Cell::new(true),
    };
    let scheduler = Rc::new(CaptureScheduler::new(
        Recorder::default(),
        RefreshPolicy::Once,
    ));
    *tree.scheduler.borrow_mut() = Some(Rc::clone(&scheduler));

    // the composite predates the invalidation, so it isn't served
    assert_eq!(scheduler.texture_for(&tree, &s.surface), None);
    assert!(scheduler.cache().is_empty());
    assert_eq!(scheduler.uploader().count(), 1);
    assert_eq!(scheduler.stats().captures, 0);

    // the request survives and the next call captures afresh
    assert_eq!(scheduler.texture_for(&tree, &s.surface), Some(1));
    assert_eq!(scheduler.texture_for(&tree, &s.surface), Some(1));
    assert_eq!(scheduler.stats().captures, 1);
}
