//! Vitra Demo
//!
//! A desktop window showing an animated scene through a liquid glass pane.
//! The scene is a [`vitra_core::LayerArena`]; the pane is the glass surface,
//! captured by a [`vitra_core::CaptureScheduler`] and drawn with
//! [`vitra_gpu::RenderLoop`].
//!
//! Keys: `r` invalidate, `c`/`o`/`m` switch to continuous/once/manual refresh,
//! `s` log capture stats, `Esc` quit.

pub mod config;
pub mod dump;
pub mod scene;
pub mod windowed;

pub use config::AppConfig;
pub use windowed::run;
