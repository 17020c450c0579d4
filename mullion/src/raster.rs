//! Glyph rasterization seam.
//!
//! The glyph cache consumes rasterization through the [`Rasterizer`] trait
//! and never looks behind it. The shipped backend wraps `fontdue`; outline
//! variants are produced by morphological dilation/erosion of the coverage
//! bitmap, so the backend stays a pure bitmap producer.

use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::error::FontError;

/// Outline variant of a glyph. Part of the glyph cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlineKind {
    /// Plain filled glyph.
    #[default]
    None,
    /// A band straddling the glyph edge.
    Line,
    /// A band just inside the glyph edge.
    Inner,
    /// A halo just outside the glyph edge.
    Outer,
}

/// Rasterization style: outline variant plus its thickness in pixels.
///
/// Two styles compare equal only when both fields match; the cache keys
/// glyphs on `(codepoint, style)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphStyle {
    pub outline: OutlineKind,
    pub thickness: f32,
}

impl GlyphStyle {
    pub const PLAIN: Self = Self {
        outline: OutlineKind::None,
        thickness: 0.0,
    };
}

/// One rasterized glyph bitmap plus its metrics.
///
/// `width` is the row length in *samples* (bytes), not pixels; divide by
/// `channels` for the pixel width. Coverage masks have 1 channel, subpixel
/// masks 3. Rows are delivered top-down.
#[derive(Debug, Clone)]
pub struct RasterGlyph {
    pub width: u32,
    pub rows: u32,
    pub channels: u32,
    pub buffer: Vec<u8>,
    /// Horizontal offset from the pen position to the bitmap's left edge.
    pub bearing_x: i32,
    /// Vertical offset from the baseline up to the bitmap's top edge.
    pub bearing_y: i32,
    pub advance_x: f32,
    pub advance_y: f32,
}

/// Line metrics of a font at its configured size.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

/// The seam between the glyph cache and whatever produces bitmaps.
///
/// The cache calls `raster_glyph` once per uncached glyph and
/// `layout_advance` once more for the metric (hinting-free) advance; it
/// retains no handles beyond per-font ownership of the rasterizer itself.
pub trait Rasterizer {
    /// Rasterize one codepoint. Unmapped codepoints are an error, not an
    /// empty bitmap.
    fn raster_glyph(&self, codepoint: u32, style: GlyphStyle) -> Result<RasterGlyph, FontError>;

    /// Metric advance of a codepoint, independent of any hinting applied
    /// during rasterization. `None` when the font does not map it.
    fn layout_advance(&self, codepoint: u32) -> Option<f32>;

    /// Horizontal kerning adjustment for the pair, 0.0 when the font has
    /// none.
    fn kerning(&self, left: u32, right: u32) -> f32;

    fn line_metrics(&self) -> FontMetrics;
}

/// `fontdue`-backed rasterizer.
pub struct FontdueRasterizer {
    font: Font,
    size: f32,
    /// Emit 3-channel subpixel masks instead of 1-channel coverage.
    subpixel: bool,
    metrics: FontMetrics,
}

impl FontdueRasterizer {
    /// Parse a face from raw font bytes. An unparseable face is fatal here:
    /// no usable font object can exist without one.
    pub fn from_bytes(bytes: &[u8], size: f32, subpixel: bool) -> Result<Self, FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|err| FontError::FaceLoad(err.to_string()))?;
        let line = font
            .horizontal_line_metrics(size)
            .ok_or_else(|| FontError::FaceLoad("face has no horizontal metrics".into()))?;
        Ok(Self {
            font,
            size,
            subpixel,
            metrics: FontMetrics {
                ascent: line.ascent,
                descent: line.descent,
                line_height: line.new_line_size,
            },
        })
    }

    /// Read and parse a face from disk.
    pub fn from_file(path: impl AsRef<Path>, size: f32, subpixel: bool) -> Result<Self, FontError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, size, subpixel)
    }
}

impl Rasterizer for FontdueRasterizer {
    fn raster_glyph(&self, codepoint: u32, style: GlyphStyle) -> Result<RasterGlyph, FontError> {
        let ch = char::from_u32(codepoint).ok_or(FontError::GlyphLoad { codepoint })?;
        if self.font.lookup_glyph_index(ch) == 0 {
            return Err(FontError::GlyphLoad { codepoint });
        }

        let (metrics, buffer, channels) = if self.subpixel {
            let (m, b) = self.font.rasterize_subpixel(ch, self.size);
            (m, b, 3u32)
        } else {
            let (m, b) = self.font.rasterize(ch, self.size);
            (m, b, 1u32)
        };

        let mut glyph = RasterGlyph {
            width: metrics.width as u32 * channels,
            rows: metrics.height as u32,
            channels,
            buffer,
            bearing_x: metrics.xmin,
            bearing_y: metrics.ymin + metrics.height as i32,
            advance_x: metrics.advance_width,
            advance_y: metrics.advance_height,
        };

        if style.outline != OutlineKind::None {
            apply_outline(&mut glyph, style);
        }
        Ok(glyph)
    }

    fn layout_advance(&self, codepoint: u32) -> Option<f32> {
        let ch = char::from_u32(codepoint)?;
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }
        Some(self.font.metrics(ch, self.size).advance_width)
    }

    fn kerning(&self, left: u32, right: u32) -> f32 {
        let (Some(left), Some(right)) = (char::from_u32(left), char::from_u32(right)) else {
            return 0.0;
        };
        self.font
            .horizontal_kern(left, right, self.size)
            .unwrap_or(0.0)
    }

    fn line_metrics(&self) -> FontMetrics {
        self.metrics
    }
}

/// Rewrite a glyph's bitmap as its outline band. The bitmap grows by the
/// outline radius on every side; bearings shift to match so the visual
/// position of the original edge is preserved.
fn apply_outline(glyph: &mut RasterGlyph, style: GlyphStyle) {
    let radius = style.thickness.ceil().max(1.0) as usize;
    let channels = glyph.channels as usize;
    let width = glyph.width as usize / channels.max(1);
    let rows = glyph.rows as usize;

    let (padded, pw, ph) = pad(&glyph.buffer, width, rows, channels, radius);
    let buffer = match style.outline {
        OutlineKind::Line => {
            let dilated = dilate(&padded, pw, ph, channels, radius);
            let eroded = erode(&padded, pw, ph, channels, radius);
            subtract(&dilated, &eroded)
        }
        OutlineKind::Outer => {
            let dilated = dilate(&padded, pw, ph, channels, radius);
            subtract(&dilated, &padded)
        }
        OutlineKind::Inner => {
            let eroded = erode(&padded, pw, ph, channels, radius);
            subtract(&padded, &eroded)
        }
        OutlineKind::None => padded,
    };

    glyph.buffer = buffer;
    glyph.width = (pw * channels) as u32;
    glyph.rows = ph as u32;
    glyph.bearing_x -= radius as i32;
    glyph.bearing_y += radius as i32;
}

/// Copy a bitmap into a buffer padded by `radius` transparent pixels on all
/// sides. Returns the padded buffer and its pixel dimensions.
fn pad(src: &[u8], width: usize, rows: usize, channels: usize, radius: usize) -> (Vec<u8>, usize, usize) {
    let pw = width + 2 * radius;
    let ph = rows + 2 * radius;
    let mut out = vec![0u8; pw * ph * channels];
    for row in 0..rows {
        let dst_start = ((row + radius) * pw + radius) * channels;
        let src_start = row * width * channels;
        out[dst_start..dst_start + width * channels]
            .copy_from_slice(&src[src_start..src_start + width * channels]);
    }
    (out, pw, ph)
}

/// Morphological max filter with a square structuring element.
fn dilate(src: &[u8], width: usize, rows: usize, channels: usize, radius: usize) -> Vec<u8> {
    morph(src, width, rows, channels, radius, 0, u8::max)
}

/// Morphological min filter with a square structuring element.
fn erode(src: &[u8], width: usize, rows: usize, channels: usize, radius: usize) -> Vec<u8> {
    morph(src, width, rows, channels, radius, u8::MAX, u8::min)
}

fn morph(
    src: &[u8],
    width: usize,
    rows: usize,
    channels: usize,
    radius: usize,
    seed: u8,
    fold: fn(u8, u8) -> u8,
) -> Vec<u8> {
    let r = radius as isize;
    let mut out = vec![0u8; src.len()];
    for y in 0..rows as isize {
        for x in 0..width as isize {
            for c in 0..channels {
                let mut value = seed;
                for dy in -r..=r {
                    for dx in -r..=r {
                        let (sx, sy) = (x + dx, y + dy);
                        // Pixels beyond the edge are transparent.
                        let sample = if sx < 0 || sy < 0 || sx >= width as isize || sy >= rows as isize
                        {
                            0
                        } else {
                            src[(sy as usize * width + sx as usize) * channels + c]
                        };
                        value = fold(value, sample);
                    }
                }
                out[(y as usize * width + x as usize) * channels + c] = value;
            }
        }
    }
    out
}

/// Per-sample saturating difference.
fn subtract(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(a, b)| a.saturating_sub(*b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 5x5 coverage bitmap with a single solid center pixel.
    fn dot() -> Vec<u8> {
        let mut buf = vec![0u8; 25];
        buf[12] = 255;
        buf
    }

    // =========================================================================
    // Morphology tests
    // =========================================================================

    #[test]
    fn dilate_grows_a_dot_into_a_square() {
        let out = dilate(&dot(), 5, 5, 1, 1);
        for y in 0..5usize {
            for x in 0..5usize {
                let expect = if (1..=3).contains(&x) && (1..=3).contains(&y) {
                    255
                } else {
                    0
                };
                assert_eq!(out[y * 5 + x], expect, "at ({x},{y})");
            }
        }
    }

    #[test]
    fn erode_removes_an_isolated_dot() {
        let out = erode(&dot(), 5, 5, 1, 1);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn erode_keeps_the_interior_of_a_solid_block() {
        let solid = vec![255u8; 25];
        let out = erode(&solid, 5, 5, 1, 1);
        // Edge pixels see the transparent outside and vanish.
        assert_eq!(out[0], 0);
        assert_eq!(out[4], 0);
        // The center survives.
        assert_eq!(out[12], 255);
    }

    #[test]
    fn subtract_saturates() {
        assert_eq!(subtract(&[10, 200, 0], &[20, 50, 0]), vec![0, 150, 0]);
    }

    #[test]
    fn pad_offsets_content_by_radius() {
        let (out, pw, ph) = pad(&dot(), 5, 5, 1, 2);
        assert_eq!((pw, ph), (9, 9));
        assert_eq!(out[4 * 9 + 4], 255);
        assert_eq!(out.iter().filter(|&&v| v != 0).count(), 1);
    }

    // =========================================================================
    // Outline application tests
    // =========================================================================

    fn dot_glyph() -> RasterGlyph {
        RasterGlyph {
            width: 5,
            rows: 5,
            channels: 1,
            buffer: dot(),
            bearing_x: 1,
            bearing_y: 5,
            advance_x: 6.0,
            advance_y: 0.0,
        }
    }

    #[test]
    fn outer_outline_is_a_hollow_ring() {
        let mut glyph = dot_glyph();
        apply_outline(&mut glyph, GlyphStyle { outline: OutlineKind::Outer, thickness: 1.0 });

        assert_eq!(glyph.width, 7);
        assert_eq!(glyph.rows, 7);
        assert_eq!(glyph.bearing_x, 0);
        assert_eq!(glyph.bearing_y, 6);
        // The original center pixel is carved out of the dilated square.
        assert_eq!(glyph.buffer[3 * 7 + 3], 0);
        assert_eq!(glyph.buffer[2 * 7 + 3], 255);
    }

    #[test]
    fn line_outline_covers_the_edge() {
        let mut glyph = dot_glyph();
        apply_outline(&mut glyph, GlyphStyle { outline: OutlineKind::Line, thickness: 1.0 });
        // An isolated dot erodes to nothing, so Line == dilated square here.
        assert_eq!(glyph.buffer[3 * 7 + 3], 255);
        assert_eq!(glyph.buffer[2 * 7 + 2], 255);
        assert_eq!(glyph.buffer[0], 0);
    }

    #[test]
    fn style_equality_includes_thickness() {
        let a = GlyphStyle { outline: OutlineKind::Line, thickness: 1.0 };
        let b = GlyphStyle { outline: OutlineKind::Line, thickness: 2.0 };
        assert_ne!(a, b);
        assert_eq!(GlyphStyle::PLAIN, GlyphStyle::default());
    }
}
