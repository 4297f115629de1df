//! Demo scene: a gradient with drifting color blobs behind a glass pane
//!
//! ```text
//! window root
//! ├── background   gradient
//! ├── content      container for the blobs
//! │   ├── blob ...
//! ├── glass        the glass surface (has a view, so an absolute transform)
//! └── caption      painted above the glass, never captured
//! ```

use vitra_core::{
    Affine2D, Color, GlassSurface, HostWindow, LayerArena, LayerContent, LayerId, LayerNode, Rect,
    Size,
};

const BACKGROUND: Color = Color::rgb(0.06, 0.06, 0.1);
const GRADIENT_BANDS: u32 = 48;

/// One drifting blob; orbit values are fractions of the window size
#[derive(Clone, Copy, Debug)]
struct Blob {
    layer: LayerId,
    center: (f32, f32),
    orbit: (f32, f32),
    speed: f32,
    phase: f32,
}

const BLOBS: &[(u32, f32, (f32, f32), (f32, f32), f32)] = &[
    // color, radius, center, orbit, speed
    (0xFF5E7E, 0.22, (0.3, 0.35), (0.18, 0.12), 0.7),
    (0x4FC3F7, 0.26, (0.7, 0.6), (0.15, 0.2), 0.5),
    (0xFFD54F, 0.16, (0.5, 0.2), (0.25, 0.08), 0.9),
    (0x81C784, 0.2, (0.25, 0.8), (0.1, 0.15), 0.6),
];

pub struct DemoScene {
    tree: LayerArena,
    root: LayerId,
    background: LayerId,
    content: LayerId,
    caption: LayerId,
    blobs: Vec<Blob>,
    surface: GlassSurface,
    size: Size,
    scale_factor: f32,
}

impl DemoScene {
    /// Build the scene for a window of `size` logical units
    pub fn new(size: Size, scale_factor: f32, corner_radius: f32) -> Self {
        let mut tree = LayerArena::new();
        let root = tree.add_window(size.to_rect(), BACKGROUND);
        let background = tree.push(root, LayerNode::new(gradient(size)));
        let content = tree.push(root, LayerNode::default());

        let unit = size.width.min(size.height);
        let blobs = BLOBS
            .iter()
            .enumerate()
            .map(|(i, &(hex, radius, center, orbit, speed))| {
                let r = radius * unit;
                let layer = tree.push(
                    content,
                    LayerNode::new(LayerContent::RoundedFill {
                        rect: Rect::new(-r, -r, 2.0 * r, 2.0 * r),
                        radius: r,
                        color: Color::from_hex(hex),
                    }),
                );
                Blob {
                    layer,
                    center,
                    orbit,
                    speed,
                    phase: i as f32 * 1.7,
                }
            })
            .collect();

        let glass = tree.push(root, LayerNode::default().with_view(1));
        let caption = tree.push(root, LayerNode::new(caption(size)));

        let mut scene = Self {
            tree,
            root,
            background,
            content,
            caption,
            blobs,
            surface: GlassSurface::new(glass, size.to_rect()).with_corner_radius(corner_radius),
            size,
            scale_factor,
        };
        scene.set_window();
        scene.animate(0.0);
        scene
    }

    pub fn tree(&self) -> &LayerArena {
        &self.tree
    }

    pub fn surface(&self) -> GlassSurface {
        self.surface
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn caption(&self) -> LayerId {
        self.caption
    }

    pub fn content(&self) -> LayerId {
        self.content
    }

    /// Move the blobs to their positions at `t` seconds
    pub fn animate(&mut self, t: f32) {
        let (w, h) = (self.size.width, self.size.height);
        for blob in &self.blobs {
            let angle = t * blob.speed + blob.phase;
            let x = (blob.center.0 + blob.orbit.0 * angle.cos()) * w;
            let y = (blob.center.1 + blob.orbit.1 * (angle * 1.3).sin()) * h;
            self.tree
                .set_transform(blob.layer, Affine2D::translation(x, y));
        }
    }

    /// Follow a window resize or scale change
    pub fn resize(&mut self, size: Size, scale_factor: f32) {
        self.size = size;
        self.scale_factor = scale_factor;
        self.surface.bounds = size.to_rect();
        self.tree.set_content(self.background, gradient(size));
        self.tree.set_content(self.caption, caption(size));
        self.set_window();
    }

    fn set_window(&mut self) {
        self.tree.set_window(
            HostWindow::new(self.root, self.size.to_rect())
                .with_background(BACKGROUND)
                .with_scale_factor(self.scale_factor),
        );
    }
}

fn gradient(size: Size) -> LayerContent {
    LayerContent::Gradient {
        rect: size.to_rect(),
        from: Color::from_hex(0x1A237E),
        to: Color::from_hex(0x880E4F),
        bands: GRADIENT_BANDS,
    }
}

fn caption(size: Size) -> LayerContent {
    let width = size.width * 0.5;
    LayerContent::RoundedFill {
        rect: Rect::new((size.width - width) / 2.0, size.height - 64.0, width, 32.0),
        radius: 16.0,
        color: Color::WHITE.with_alpha(0.9),
    }
}
