//! Capture scheduling
//!
//! [`CaptureScheduler`] decides when the backdrop behind a glass surface is
//! re-captured, runs the composer and uploader, and publishes the result
//! through its [`TextureCache`]. It lives on the UI thread; the host drives
//! [`tick`](CaptureScheduler::tick) from its event loop and sleeps until
//! [`next_deadline`](CaptureScheduler::next_deadline).

use std::cell::Cell;
use std::time::Instant;

use crate::cache::TextureCache;
use crate::composer::{CompositeImage, HierarchyComposer};
use crate::error::Result;
use crate::policy::{RefreshPolicy, RepeatingTimer};
use crate::surface::{GlassSurface, SurfaceId};
use crate::tree::LayerTree;

/// Turns a composite into a GPU-resident texture
pub trait TextureUploader {
    type Texture: Clone;

    fn upload(&self, image: &CompositeImage) -> Result<Self::Texture>;
}

/// Counters for diagnostics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Successful captures
    pub captures: u64,
    /// Captures that failed to compose or upload
    pub failures: u64,
    /// Requests dropped because a capture was already running
    pub skipped_busy: u64,
}

/// Owns the capture cadence and the cached backdrop texture for one surface
pub struct CaptureScheduler<U: TextureUploader> {
    uploader: U,
    composer: HierarchyComposer,
    cache: TextureCache<U::Texture>,
    policy: Cell<RefreshPolicy>,
    timer: Cell<Option<RepeatingTimer>>,
    /// Surface the timer captures
    target: Cell<Option<GlassSurface>>,
    /// Surface the cached texture was captured for
    cached_for: Cell<Option<SurfaceId>>,
    /// Set by `invalidate`; the only thing that lets `Manual` capture
    capture_requested: Cell<bool>,
    /// Bumped by every `invalidate`, so a capture can tell it went stale
    invalidations: Cell<u64>,
    capturing: Cell<bool>,
    stats: Cell<CaptureStats>,
}

impl<U: TextureUploader> CaptureScheduler<U> {
    pub fn new(uploader: U, policy: RefreshPolicy) -> Self {
        let scheduler = Self {
            uploader,
            composer: HierarchyComposer::new(),
            cache: TextureCache::new(),
            policy: Cell::new(policy),
            timer: Cell::new(None),
            target: Cell::new(None),
            cached_for: Cell::new(None),
            capture_requested: Cell::new(false),
            invalidations: Cell::new(0),
            capturing: Cell::new(false),
            stats: Cell::new(CaptureStats::default()),
        };
        scheduler.arm_timer(policy, Instant::now());
        scheduler
    }

    pub fn with_composer(mut self, composer: HierarchyComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy.get()
    }

    pub fn set_policy(&self, policy: RefreshPolicy) {
        self.set_policy_at(policy, Instant::now());
    }

    /// Switch policy, re-arming the timer relative to `now`
    pub fn set_policy_at(&self, policy: RefreshPolicy, now: Instant) {
        // disarm first so two timers never coexist
        self.timer.set(None);
        self.policy.set(policy);
        self.arm_timer(policy, now);
        tracing::debug!(?policy, "refresh policy changed");
    }

    /// Drop the cached texture and allow the next request to capture
    ///
    /// Clearing an already empty cache doesn't notify listeners again.
    pub fn invalidate(&self) {
        self.cached_for.set(None);
        self.capture_requested.set(true);
        self.invalidations.set(self.invalidations.get() + 1);
        if !self.cache.is_empty() {
            self.cache.set(None);
        }
    }

    /// Texture for `surface`, capturing inline when the cache can't serve it
    ///
    /// Never returns a texture captured for a different surface. Retargets
    /// the repeating timer to `surface`; the previous texture stays cached
    /// until a capture replaces it.
    pub fn texture_for<T>(&self, tree: &T, surface: &GlassSurface) -> Option<U::Texture>
    where
        T: LayerTree + ?Sized,
    {
        self.retarget(surface);

        if let Some(texture) = self.cached_texture(surface.id) {
            return Some(texture);
        }

        if self.policy.get() == RefreshPolicy::Manual && !self.capture_requested.get() {
            return None;
        }

        if self.capture(tree, surface) {
            self.capture_requested.set(false);
        }
        self.cached_texture(surface.id)
    }

    /// Cached texture if it was captured for `surface`, without capturing
    ///
    /// This is what a renderer drawing `surface` should bind.
    pub fn current(&self, surface: &GlassSurface) -> Option<U::Texture> {
        self.cached_texture(surface.id)
    }

    /// Fire the repeating timer if it is due. Returns true if a capture
    /// completed.
    pub fn tick<T>(&self, tree: &T, now: Instant) -> bool
    where
        T: LayerTree + ?Sized,
    {
        let Some(mut timer) = self.timer.get() else {
            return false;
        };
        if !timer.poll(now) {
            return false;
        }
        self.timer.set(Some(timer));

        let Some(surface) = self.target.get() else {
            tracing::trace!("refresh timer fired with no target");
            return false;
        };
        self.capture(tree, &surface)
    }

    /// When the host should call [`tick`](Self::tick) next, if a timer is
    /// armed
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.get().map(|t| t.next_fire())
    }

    pub fn cache(&self) -> &TextureCache<U::Texture> {
        &self.cache
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn target(&self) -> Option<GlassSurface> {
        self.target.get()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats.get()
    }

    /// True while a compose+upload is running
    pub fn is_capturing(&self) -> bool {
        self.capturing.get()
    }

    fn arm_timer(&self, policy: RefreshPolicy, now: Instant) {
        if let Some(interval) = policy.interval() {
            self.timer.set(Some(RepeatingTimer::start(interval, now)));
            tracing::trace!(?interval, "refresh timer armed");
        }
    }

    fn retarget(&self, surface: &GlassSurface) {
        if self.target.get().map(|t| t.id) != Some(surface.id) {
            tracing::debug!(surface = ?surface.id, "capture target changed");
        }
        self.target.set(Some(*surface));
    }

    fn cached_texture(&self, id: SurfaceId) -> Option<U::Texture> {
        if self.cached_for.get() == Some(id) {
            self.cache.current()
        } else {
            None
        }
    }

    fn update_stats(&self, f: impl FnOnce(&mut CaptureStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Compose and upload under the re-entrancy guard. Returns true if the
    /// cache was updated.
    fn capture<T>(&self, tree: &T, surface: &GlassSurface) -> bool
    where
        T: LayerTree + ?Sized,
    {
        if self.capturing.get() {
            self.update_stats(|s| s.skipped_busy += 1);
            tracing::trace!(surface = ?surface.id, "capture in progress, dropping request");
            return false;
        }

        self.capturing.set(true);
        let invalidations = self.invalidations.get();
        let result = self
            .composer
            .compose(tree, surface)
            .and_then(|image| self.uploader.upload(&image));
        self.capturing.set(false);

        match result {
            Ok(_) if self.invalidations.get() != invalidations => {
                // invalidated mid-capture; the composite may predate the change
                tracing::debug!(surface = ?surface.id, "backdrop went stale while capturing");
                false
            }
            Ok(texture) => {
                self.cached_for.set(Some(surface.id));
                self.update_stats(|s| s.captures += 1);
                self.cache.set(Some(texture));
                tracing::debug!(surface = ?surface.id, "backdrop captured");
                true
            }
            Err(err) => {
                self.update_stats(|s| s.failures += 1);
                tracing::debug!(
                    surface = ?surface.id,
                    %err,
                    "backdrop capture failed, keeping cache"
                );
                false
            }
        }
    }
}
