//! Desktop window driving capture and rendering
//!
//! One redraw = animate the scene, let the scheduler fire its timer, ask for
//! the backdrop texture, draw the glass pass. Between redraws the event loop
//! sleeps until the next frame or the next capture deadline, whichever comes
//! first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use vitra_core::{CaptureScheduler, RefreshPolicy, Size};
use vitra_gpu::{FrameStatus, GlassPresenter, GpuContext, RenderLoop, RendererError, WgpuUploader};

use crate::config::AppConfig;
use crate::dump::DumpingUploader;
use crate::scene::DemoScene;

const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Open the demo window and run until it is closed
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = GlassApp::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct WindowState {
    window: Arc<Window>,
    context: GpuContext,
    presenter: GlassPresenter,
    render_loop: RenderLoop,
    scheduler: CaptureScheduler<DumpingUploader<WgpuUploader>>,
    scene: DemoScene,
}

impl WindowState {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> anyhow::Result<Self> {
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_transparent(true);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let physical = window.inner_size();
        let scale_factor = window.scale_factor() as f32;
        let (context, presenter) = pollster::block_on(GpuContext::with_surface(
            Arc::clone(&window),
            (physical.width, physical.height),
            config.renderer.clone(),
        ))?;
        let render_loop = RenderLoop::new(&context, presenter.format())?;

        let uploader = DumpingUploader::new(context.uploader(), config.dump_dir.clone());
        let scheduler =
            CaptureScheduler::new(uploader, config.policy).with_composer(context.composer());

        let redraw = Arc::clone(&window);
        scheduler.cache().on_update(move |_| redraw.request_redraw());

        let scene = DemoScene::new(
            logical_size(&window),
            scale_factor,
            config.corner_radius,
        );

        tracing::info!(policy = ?config.policy, "glass demo ready");

        Ok(Self {
            window,
            context,
            presenter,
            render_loop,
            scheduler,
            scene,
        })
    }

    fn resize(&mut self) {
        let physical = self.window.inner_size();
        self.presenter
            .resize(&self.context.device, (physical.width, physical.height));
        self.scene
            .resize(logical_size(&self.window), self.window.scale_factor() as f32);
        // the backdrop no longer matches the surface
        self.scheduler.invalidate();
        self.window.request_redraw();
    }

    fn redraw(&mut self) -> Result<FrameStatus, RendererError> {
        let now = Instant::now();
        self.scene.animate(self.render_loop.elapsed());

        let surface = self.scene.surface();
        self.scheduler.tick(self.scene.tree(), now);
        self.scheduler.texture_for(self.scene.tree(), &surface);

        self.render_loop.tick(&mut self.presenter, &self.scheduler, &surface)
    }

    fn set_policy(&self, policy: RefreshPolicy) {
        self.scheduler.set_policy(policy);
        tracing::info!(?policy, "refresh policy");
    }

    fn handle_key(&self, key: &Key) {
        match key.as_ref() {
            Key::Character("r") => {
                self.scheduler.invalidate();
                self.window.request_redraw();
            }
            Key::Character("c") => self.set_policy(RefreshPolicy::default()),
            Key::Character("o") => self.set_policy(RefreshPolicy::Once),
            Key::Character("m") => self.set_policy(RefreshPolicy::Manual),
            Key::Character("s") => {
                let stats = self.scheduler.stats();
                tracing::info!(
                    "captures={}, failures={}, skipped_busy={}, frames={}",
                    stats.captures,
                    stats.failures,
                    stats.skipped_busy,
                    self.render_loop.frames()
                );
            }
            _ => {}
        }
    }

    fn next_wake(&self, last_frame: Instant) -> Instant {
        let frame = last_frame + FRAME_INTERVAL;
        match self.scheduler.next_deadline() {
            Some(capture) => capture.min(frame),
            None => frame,
        }
    }
}

fn logical_size(window: &Window) -> Size {
    let logical: LogicalSize<f32> = window.inner_size().to_logical(window.scale_factor());
    Size::new(logical.width, logical.height)
}

struct GlassApp {
    config: AppConfig,
    state: Option<WindowState>,
    last_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl GlassApp {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            last_frame: Instant::now(),
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{:#}", err);
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for GlassApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Create window if we don't have one
        if self.state.is_some() {
            return;
        }
        match WindowState::new(event_loop, &self.config) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        // Request redraw on wait timeout (frame tick)
        if matches!(cause, StartCause::ResumeTimeReached { .. } | StartCause::Poll) {
            if let Some(ref state) = self.state {
                state.window.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => state.resize(),

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    event_loop.exit();
                } else {
                    state.handle_key(&event.logical_key);
                }
            }

            WindowEvent::RedrawRequested => {
                self.last_frame = Instant::now();
                match state.redraw() {
                    Ok(FrameStatus::Rendered) => {}
                    Ok(FrameStatus::Skipped) => tracing::trace!("frame skipped"),
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(ref state) = self.state {
            event_loop.set_control_flow(ControlFlow::WaitUntil(state.next_wake(self.last_frame)));
        }
    }
}
