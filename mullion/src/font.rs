//! Glyph cache and font store.
//!
//! Each font owns a [`GlyphCache`]: a lazily populated glyph table backed by
//! a rasterizer. The [`FontStore`] owns every cache plus the shared texture
//! atlas, and is the only layer that reacts to atlas exhaustion — it doubles
//! the atlas and reloads every font, exactly once per request, before
//! escalating.
//!
//! Glyph lookup is a deliberate linear scan. Glyph sets stay small (typically
//! under 200 per font) and the scan semantics, including the sentinel's
//! ignore-style special case, are part of the contract.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::atlas::{Atlas, Region};
use crate::error::FontError;
use crate::primitives::UvRect;
use crate::raster::{FontMetrics, GlyphStyle, Rasterizer};

/// Codepoint of the sentinel glyph: a small solid-white patch used for
/// underline, strikethrough, and background quads through the same texturing
/// pipeline as text. Always the first glyph loaded into a cache.
pub const SENTINEL_CODEPOINT: u32 = u32::MAX;

/// Pixel edge of the sentinel's white patch.
const SENTINEL_PATCH: u32 = 4;

/// Index of a glyph within one font's cache.
///
/// Invalidated, like the UVs it leads to, whenever the atlas is resized and
/// the cache reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphIx(pub(crate) usize);

/// One cached glyph: metrics, atlas UVs, and its kerning table.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub codepoint: u32,
    pub style: GlyphStyle,
    /// Bitmap size in pixels.
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the bitmap's left edge.
    pub bearing_x: i32,
    /// Offset from the baseline up to the bitmap's top edge.
    pub bearing_y: i32,
    pub advance_x: f32,
    pub advance_y: f32,
    pub uv: UvRect,
    /// Preceding codepoint -> signed horizontal adjustment. Only non-zero
    /// pairs are stored.
    kerning: HashMap<u32, f32>,
}

impl Glyph {
    /// Kerning adjustment when this glyph follows `preceding`. 0.0 for any
    /// pair absent from the table.
    #[inline]
    pub fn kerning_with(&self, preceding: u32) -> f32 {
        self.kerning.get(&preceding).copied().unwrap_or(0.0)
    }
}

/// Per-font glyph table.
pub struct GlyphCache {
    rasterizer: Box<dyn Rasterizer>,
    glyphs: Vec<Glyph>,
    metrics: FontMetrics,
    /// Count of glyph loads that failed at the rasterizer.
    missed: u32,
}

impl GlyphCache {
    fn new(rasterizer: Box<dyn Rasterizer>) -> Self {
        let metrics = rasterizer.line_metrics();
        Self {
            rasterizer,
            glyphs: Vec::new(),
            metrics,
            missed: 0,
        }
    }

    /// Find or load a glyph, placing its bitmap in `atlas`.
    ///
    /// Returns [`FontError::AtlasFull`] when the atlas cannot place the
    /// bitmap; the owning store grows and retries. Rasterizer failures bump
    /// the missed count and propagate.
    pub fn get_or_load(
        &mut self,
        atlas: &mut Atlas,
        codepoint: u32,
        style: GlyphStyle,
    ) -> Result<GlyphIx, FontError> {
        // The sentinel ignores the style fields: one entry serves every
        // caller regardless of the requested outline.
        let found = self.glyphs.iter().position(|g| {
            g.codepoint == codepoint && (codepoint == SENTINEL_CODEPOINT || g.style == style)
        });
        if let Some(ix) = found {
            return Ok(GlyphIx(ix));
        }

        if codepoint == SENTINEL_CODEPOINT {
            return self.load_sentinel(atlas);
        }
        self.load_glyph(atlas, codepoint, style)
    }

    /// Allocate the solid-white patch and register the sentinel glyph.
    fn load_sentinel(&mut self, atlas: &mut Atlas) -> Result<GlyphIx, FontError> {
        let region = atlas
            .allocate(SENTINEL_PATCH, SENTINEL_PATCH)
            .ok_or(FontError::AtlasFull)?;
        let white = [255u8; (SENTINEL_PATCH * SENTINEL_PATCH * 4) as usize];
        atlas.write_rows_top_down(region, &white, (SENTINEL_PATCH * 4) as usize, 4);

        // Sample a single interior texel so bilinear filtering never reaches
        // a neighbor or the diagnostic border.
        let size = atlas.size() as f32;
        let uv = UvRect {
            s0: (region.x + 2) as f32 / size,
            t0: (region.y + 2) as f32 / size,
            s1: (region.x + 3) as f32 / size,
            t1: (region.y + 3) as f32 / size,
        };

        self.glyphs.push(Glyph {
            codepoint: SENTINEL_CODEPOINT,
            style: GlyphStyle::PLAIN,
            width: SENTINEL_PATCH,
            height: SENTINEL_PATCH,
            bearing_x: 0,
            bearing_y: 0,
            advance_x: 0.0,
            advance_y: 0.0,
            uv,
            kerning: HashMap::new(),
        });
        Ok(GlyphIx(self.glyphs.len() - 1))
    }

    /// Rasterize, place, and register a regular glyph.
    fn load_glyph(
        &mut self,
        atlas: &mut Atlas,
        codepoint: u32,
        style: GlyphStyle,
    ) -> Result<GlyphIx, FontError> {
        let raster = match self.rasterizer.raster_glyph(codepoint, style) {
            Ok(raster) => raster,
            Err(err) => {
                self.missed += 1;
                warn!(codepoint, %err, "glyph load failed");
                return Err(err);
            }
        };

        let pixel_width = raster.width / raster.channels.max(1);
        // The +1 reserves a separator row/column so adjacent glyphs never
        // bleed into each other under bilinear sampling.
        let region = atlas
            .allocate(pixel_width + 1, raster.rows + 1)
            .ok_or(FontError::AtlasFull)?;

        let bitmap = Region {
            x: region.x,
            y: region.y + 1,
            width: pixel_width,
            height: raster.rows,
        };
        if raster.rows > 0 && pixel_width > 0 {
            atlas.write_rows_top_down(
                bitmap,
                &raster.buffer,
                raster.width as usize,
                raster.channels as usize,
            );
        }

        // The rasterized advance may be hinted; layout wants the metric one.
        let advance_x = self
            .rasterizer
            .layout_advance(codepoint)
            .unwrap_or(raster.advance_x);

        self.glyphs.push(Glyph {
            codepoint,
            style,
            width: pixel_width,
            height: raster.rows,
            bearing_x: raster.bearing_x,
            bearing_y: raster.bearing_y,
            advance_x,
            advance_y: raster.advance_y,
            uv: bitmap.uv(atlas.size()),
            kerning: HashMap::new(),
        });
        Ok(GlyphIx(self.glyphs.len() - 1))
    }

    /// Drop every glyph and reinsert the previously-resident keys into a
    /// fresh atlas. Reinsertion order follows current storage order; the
    /// prior packing layout is not reproduced. Rasterizer failures are
    /// skipped (the key is dropped), atlas failures propagate.
    pub fn reload(&mut self, atlas: &mut Atlas) -> Result<(), FontError> {
        let keys: Vec<(u32, GlyphStyle)> = self
            .glyphs
            .iter()
            .map(|g| (g.codepoint, g.style))
            .collect();
        self.glyphs.clear();

        for (codepoint, style) in keys {
            match self.get_or_load(atlas, codepoint, style) {
                Ok(_) => {}
                Err(FontError::AtlasFull) => return Err(FontError::AtlasFull),
                Err(_) => {}
            }
        }
        self.generate_kerning();
        Ok(())
    }

    /// Rebuild every glyph's kerning table from the rasterizer. O(n^2) in
    /// the glyph set; run after bulk population, not per glyph.
    pub fn generate_kerning(&mut self) {
        let codepoints: Vec<u32> = self
            .glyphs
            .iter()
            .map(|g| g.codepoint)
            .filter(|&cp| cp != SENTINEL_CODEPOINT)
            .collect();

        for i in 0..self.glyphs.len() {
            if self.glyphs[i].codepoint == SENTINEL_CODEPOINT {
                continue;
            }
            self.glyphs[i].kerning.clear();
            for &left in &codepoints {
                let value = self.rasterizer.kerning(left, self.glyphs[i].codepoint);
                if value != 0.0 {
                    self.glyphs[i].kerning.insert(left, value);
                }
            }
        }
    }

    /// Kerning adjustment for `right` following `left`. 0.0 when either
    /// glyph is unknown or the pair is not in the table.
    pub fn kerning(&self, left: u32, right: u32) -> f32 {
        self.glyphs
            .iter()
            .find(|g| g.codepoint == right)
            .map(|g| g.kerning_with(left))
            .unwrap_or(0.0)
    }

    #[inline]
    pub fn glyph_at(&self, ix: GlyphIx) -> &Glyph {
        &self.glyphs[ix.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Handle to a font registered with a [`FontStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(usize);

/// Owns the glyph atlas and every font sharing it.
pub struct FontStore {
    atlas: Atlas,
    fonts: Vec<GlyphCache>,
    max_atlas_size: u32,
}

impl FontStore {
    /// Create a store with an atlas of `atlas_size`, allowed to double up to
    /// `max_atlas_size` before exhaustion becomes fatal.
    pub fn new(atlas_size: u32, max_atlas_size: u32) -> Self {
        Self {
            atlas: Atlas::new(atlas_size),
            fonts: Vec::new(),
            max_atlas_size,
        }
    }

    /// Register a font. Captures its line metrics and seeds the sentinel
    /// glyph so it is resident before any text load.
    pub fn add_font(&mut self, rasterizer: Box<dyn Rasterizer>) -> Result<FontId, FontError> {
        self.fonts.push(GlyphCache::new(rasterizer));
        let id = FontId(self.fonts.len() - 1);
        self.glyph(id, SENTINEL_CODEPOINT, GlyphStyle::PLAIN)?;
        Ok(id)
    }

    /// Cache hit or lazy load. On atlas exhaustion the atlas is doubled and
    /// the load retried exactly once; a second failure escalates.
    pub fn glyph(
        &mut self,
        font: FontId,
        codepoint: u32,
        style: GlyphStyle,
    ) -> Result<GlyphIx, FontError> {
        match self.fonts[font.0].get_or_load(&mut self.atlas, codepoint, style) {
            Err(FontError::AtlasFull) => {
                self.grow_atlas()?;
                match self.fonts[font.0].get_or_load(&mut self.atlas, codepoint, style) {
                    Err(FontError::AtlasFull) => {
                        Err(FontError::AtlasExhausted(self.atlas.size()))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    #[inline]
    pub fn glyph_at(&self, font: FontId, ix: GlyphIx) -> &Glyph {
        self.fonts[font.0].glyph_at(ix)
    }

    #[inline]
    pub fn kerning(&self, font: FontId, left: u32, right: u32) -> f32 {
        self.fonts[font.0].kerning(left, right)
    }

    #[inline]
    pub fn line_metrics(&self, font: FontId) -> FontMetrics {
        self.fonts[font.0].metrics
    }

    /// Count of glyph loads that failed for this font.
    #[inline]
    pub fn missed(&self, font: FontId) -> u32 {
        self.fonts[font.0].missed
    }

    /// Bulk-populate a character set, skipping individual load failures,
    /// then regenerate the font's kerning tables once. Atlas exhaustion is
    /// the only failure that propagates.
    pub fn precache(&mut self, font: FontId, chars: &str) -> Result<(), FontError> {
        for ch in chars.chars() {
            match self.glyph(font, ch as u32, GlyphStyle::PLAIN) {
                Ok(_) | Err(FontError::GlyphLoad { .. }) => {}
                Err(err @ FontError::AtlasExhausted(_)) => return Err(err),
                Err(_) => {}
            }
        }
        self.fonts[font.0].generate_kerning();
        Ok(())
    }

    /// Advance-plus-kerning width of a string. Codepoints the font cannot
    /// load are skipped. Kerning comes from the cached tables, so run
    /// `precache` (or `generate_kerning` indirectly) first for kerned text.
    pub fn measure(&mut self, font: FontId, text: &str) -> f32 {
        let mut width = 0.0;
        let mut previous: Option<u32> = None;
        for ch in text.chars() {
            let codepoint = ch as u32;
            let Ok(ix) = self.glyph(font, codepoint, GlyphStyle::PLAIN) else {
                continue;
            };
            let glyph = self.fonts[font.0].glyph_at(ix);
            width += glyph.advance_x;
            if let Some(previous) = previous {
                width += glyph.kerning_with(previous);
            }
            previous = Some(codepoint);
        }
        width
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

    /// Double the atlas and reflow every font into it. Every previously
    /// issued UV and [`GlyphIx`] is invalid afterwards.
    fn grow_atlas(&mut self) -> Result<(), FontError> {
        let next = self.atlas.size() * 2;
        if next > self.max_atlas_size {
            return Err(FontError::AtlasExhausted(self.atlas.size()));
        }
        debug!(from = self.atlas.size(), to = next, "growing glyph atlas");
        self.atlas = Atlas::new(next);
        for font in &mut self.fonts {
            if let Err(FontError::AtlasFull) = font.reload(&mut self.atlas) {
                // The resident set no longer fits even after doubling.
                return Err(FontError::AtlasExhausted(next));
            }
        }
        Ok(())
    }
}
