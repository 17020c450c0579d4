//! Named nine-slice image region store.
//!
//! The same shape as the glyph cache, but for UI chrome images: each entry
//! is decoded from disk, packed into the store's own atlas bottom-up, and
//! exposed as normalized UVs plus nine-slice margins. On atlas exhaustion
//! the store grows and reloads every image from its source path; sources
//! that have become unreadable are logged and dropped, not fatal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::atlas::{Atlas, Region};
use crate::error::ImageStoreError;
use crate::primitives::UvRect;

/// Nine-slice margins in source pixels. All-zero margins mean the image is
/// drawn unsliced at its natural size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SliceMargins {
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub bottom: u32,
}

/// Handle to a stored image region. Like glyph indices, handles are
/// invalidated when the atlas is resized and the store reloaded; names stay
/// stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(usize);

/// One stored image: identity, source, natural size, UVs, and margins.
#[derive(Debug, Clone)]
pub struct ImageRegion {
    pub name: String,
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub uv: UvRect,
    pub margins: SliceMargins,
}

/// Owns an atlas and the nine-slice images packed into it.
pub struct ImageStore {
    atlas: Atlas,
    images: Vec<ImageRegion>,
    max_atlas_size: u32,
}

impl ImageStore {
    /// Create a store with an atlas of `atlas_size`, allowed to double up
    /// to `max_atlas_size`.
    pub fn new(atlas_size: u32, max_atlas_size: u32) -> Self {
        Self {
            atlas: Atlas::new(atlas_size),
            images: Vec::new(),
            max_atlas_size,
        }
    }

    /// Decode `source` and pack it under `name`. On atlas exhaustion the
    /// atlas is doubled (reloading every resident image) and the add retried
    /// exactly once before escalating. A source that fails to decode here,
    /// at initial load, is an error — only reloads tolerate disappearing
    /// files.
    pub fn add_image(
        &mut self,
        name: &str,
        source: &Path,
        margins: SliceMargins,
    ) -> Result<ImageHandle, ImageStoreError> {
        let rgba = image::open(source)?.to_rgba8();
        match self.place(name, source, margins, &rgba) {
            Some(handle) => Ok(handle),
            None => {
                self.grow()?;
                self.place(name, source, margins, &rgba)
                    .ok_or(ImageStoreError::AtlasExhausted(self.atlas.size()))
            }
        }
    }

    /// Allocate, write bottom-up, and record one image. `None` = atlas full.
    fn place(
        &mut self,
        name: &str,
        source: &Path,
        margins: SliceMargins,
        rgba: &image::RgbaImage,
    ) -> Option<ImageHandle> {
        let (width, height) = rgba.dimensions();
        // +1 reserves the separator row/column, same convention as glyphs.
        let region = self.atlas.allocate(width + 1, height + 1)?;
        let bitmap = Region {
            x: region.x,
            y: region.y + 1,
            width,
            height,
        };
        self.atlas
            .write_rows_bottom_up(bitmap, rgba.as_raw(), width as usize * 4, 4);

        self.images.push(ImageRegion {
            name: name.to_string(),
            source: source.to_path_buf(),
            width,
            height,
            uv: bitmap.uv(self.atlas.size()),
            margins,
        });
        Some(ImageHandle(self.images.len() - 1))
    }

    /// Re-read every image's source and re-pack it into the current atlas.
    /// Unreadable sources are logged and dropped; running out of atlas while
    /// re-packing the resident set escalates.
    pub fn reload_images(&mut self) -> Result<(), ImageStoreError> {
        let entries = std::mem::take(&mut self.images);
        self.atlas.clear();

        for entry in entries {
            let rgba = match image::open(&entry.source) {
                Ok(img) => img.to_rgba8(),
                Err(err) => {
                    warn!(name = %entry.name, source = %entry.source.display(), %err,
                        "dropping unreadable image on reload");
                    continue;
                }
            };
            if self
                .place(&entry.name, &entry.source, entry.margins, &rgba)
                .is_none()
            {
                return Err(ImageStoreError::AtlasExhausted(self.atlas.size()));
            }
        }
        Ok(())
    }

    /// Double the atlas and reflow. Every previously issued UV and handle is
    /// invalid afterwards; names remain the lookup key.
    fn grow(&mut self) -> Result<(), ImageStoreError> {
        let next = self.atlas.size() * 2;
        if next > self.max_atlas_size {
            return Err(ImageStoreError::AtlasExhausted(self.atlas.size()));
        }
        debug!(from = self.atlas.size(), to = next, "growing image atlas");
        self.atlas = Atlas::new(next);
        self.reload_images()
    }

    /// Look an image up by name.
    pub fn find(&self, name: &str) -> Option<&ImageRegion> {
        self.images.iter().find(|img| img.name == name)
    }

    /// Handle for a name, for callers that want stable-ish indexed access
    /// between reloads.
    pub fn handle_of(&self, name: &str) -> Option<ImageHandle> {
        self.images
            .iter()
            .position(|img| img.name == name)
            .map(ImageHandle)
    }

    #[inline]
    pub fn get(&self, handle: ImageHandle) -> &ImageRegion {
        &self.images[handle.0]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Read access for the embedder's texture upload step.
    #[inline]
    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    /// Take the atlas dirty rectangle for a partial upload.
    #[inline]
    pub fn take_dirty(&mut self) -> Option<(u32, u32, u32, u32)> {
        self.atlas.take_dirty()
    }
}
