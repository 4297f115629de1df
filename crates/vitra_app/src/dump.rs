//! Optional PNG dump of every composite, for debugging captures

use std::cell::Cell;
use std::path::PathBuf;

use vitra_core::{CompositeImage, TextureUploader};

/// Wraps an uploader and writes each composite to `dir` before uploading it
pub struct DumpingUploader<U> {
    inner: U,
    dir: Option<PathBuf>,
    written: Cell<u64>,
}

impl<U> DumpingUploader<U> {
    /// `dir = None` disables dumping
    pub fn new(inner: U, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!("cannot create capture dump dir {}: {}", dir.display(), e);
            }
        }
        Self {
            inner,
            dir,
            written: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }

    /// PNG files written so far
    pub fn written(&self) -> u64 {
        self.written.get()
    }
}

impl<U: TextureUploader> TextureUploader for DumpingUploader<U> {
    type Texture = U::Texture;

    fn upload(&self, image: &CompositeImage) -> vitra_core::Result<U::Texture> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("capture-{:05}.png", self.written.get()));
            match image.save_png(&path) {
                Ok(()) => {
                    self.written.set(self.written.get() + 1);
                    tracing::debug!("wrote {}", path.display());
                }
                Err(e) => tracing::warn!("failed to write {}: {}", path.display(), e),
            }
        }
        self.inner.upload(image)
    }
}
