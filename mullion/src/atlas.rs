//! Skyline texture atlas.
//!
//! An online 2D rectangle bin-packer over a CPU-side RGBA buffer. Glyph and
//! image managers allocate regions, write converted pixel data into them, and
//! hand the buffer (plus a dirty rectangle) to the embedder for texture
//! upload. The atlas never grows itself: when `allocate` returns `None` the
//! owning manager recreates it at double size and reflows its contents.
//!
//! The packer keeps a "skyline" of horizontal segments, one per occupied
//! height, sorted by x. New rectangles are placed on the lowest segment run
//! that can hold them; the segment list is then patched and coalesced so it
//! always tiles the full packable width.

use crate::primitives::UvRect;

/// Color painted into the reserved 1px border so sampling bleed is loud
/// during development.
const BORDER_TEXEL: [u8; 4] = [255, 0, 255, 255];

/// A horizontal skyline segment at height `y`, starting at `x`, spanning
/// `width` pixels.
///
/// Invariant: the node list is sorted by `x`, tiles `[1, size-1)` exactly,
/// and no two adjacent nodes share the same `y` (they are coalesced after
/// every allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasNode {
    pub x: u32,
    pub y: u32,
    pub width: u32,
}

/// A rectangular region of the atlas, in pixel space.
///
/// Immutable once returned, but its UVs become meaningless after the atlas
/// is recreated at a larger size — callers must reflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Normalized texture coordinates of this region within an atlas of the
    /// given size.
    #[inline]
    pub fn uv(&self, atlas_size: u32) -> UvRect {
        let s = atlas_size as f32;
        UvRect {
            s0: self.x as f32 / s,
            t0: self.y as f32 / s,
            s1: (self.x + self.width) as f32 / s,
            t1: (self.y + self.height) as f32 / s,
        }
    }
}

/// Square RGBA texture atlas with skyline packing state.
pub struct Atlas {
    size: u32,
    pixels: Vec<u8>,
    nodes: Vec<AtlasNode>,
    /// Bounding box of texels mutated since the last `take_dirty`, as
    /// `(min_x, min_y, max_x, max_y)`, max exclusive.
    dirty: Option<(u32, u32, u32, u32)>,
}

impl Atlas {
    /// Create an atlas of the given power-of-two size.
    pub fn new(size: u32) -> Self {
        assert!(size.is_power_of_two(), "atlas size must be a power of two");
        assert!(size >= 4, "atlas too small for the reserved border");

        let mut atlas = Self {
            size,
            pixels: vec![0u8; (size * size * 4) as usize],
            nodes: Vec::new(),
            dirty: None,
        };
        atlas.clear();
        atlas
    }

    /// Atlas edge length in pixels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The raw RGBA buffer, `size * size * 4` bytes, row-major from the
    /// first row.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Current skyline. Exposed for diagnostics and tests.
    #[inline]
    pub fn nodes(&self) -> &[AtlasNode] {
        &self.nodes
    }

    /// Reset to a single full-width node, zero the pixel buffer, and repaint
    /// the diagnostic border. Everything is dirty afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(AtlasNode {
            x: 1,
            y: 1,
            width: self.size - 2,
        });
        self.pixels.fill(0);
        self.paint_border();
        self.dirty = Some((0, 0, self.size, self.size));
    }

    /// Allocate a `width` x `height` region.
    ///
    /// Returns `None` when no skyline run can hold the request. That is a
    /// normal outcome: the owning manager recreates the atlas at double size
    /// and reflows, and only a second failure is escalated.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<Region> {
        // Candidate search: lowest resulting top edge wins, ties broken by
        // the narrowest starting shelf so wide shelves stay available.
        let mut best: Option<(u32, u32, usize)> = None;
        for index in 0..self.nodes.len() {
            if let Some(top) = self.fit(index, width, height) {
                let shelf_width = self.nodes[index].width;
                let better = match best {
                    None => true,
                    Some((best_top, best_width, _)) => {
                        top < best_top || (top == best_top && shelf_width < best_width)
                    }
                };
                if better {
                    best = Some((top, shelf_width, index));
                }
            }
        }

        let (y, _, index) = best?;
        let region = Region {
            x: self.nodes[index].x,
            y,
            width,
            height,
        };
        self.place(index, region);
        Some(region)
    }

    /// Fit test: can a `width` x `height` region sit on the node run starting
    /// at `index`? Returns the resulting bottom `y` (the maximum height among
    /// all spanned nodes) if it fits inside the border on both axes.
    fn fit(&self, index: usize, width: u32, height: u32) -> Option<u32> {
        let x = self.nodes[index].x;
        if x + width > self.size - 1 {
            return None;
        }

        let mut top = 0u32;
        let mut remaining = width as i64;
        let mut i = index;
        while remaining > 0 {
            let node = self.nodes.get(i)?;
            top = top.max(node.y);
            if top + height > self.size - 1 {
                return None;
            }
            remaining -= node.width as i64;
            i += 1;
        }
        Some(top)
    }

    /// Patch the skyline after placing `region` on the node at `index`:
    /// insert the segment created by the region's top edge, consume the
    /// nodes it covers, and coalesce.
    fn place(&mut self, index: usize, region: Region) {
        self.nodes.insert(
            index,
            AtlasNode {
                x: region.x,
                y: region.y + region.height,
                width: region.width,
            },
        );

        let covered_end = region.x + region.width;
        let mut i = index + 1;
        while i < self.nodes.len() {
            let node = self.nodes[i];
            if node.x >= covered_end {
                break;
            }
            let shrink = covered_end - node.x;
            if shrink >= node.width {
                self.nodes.remove(i);
            } else {
                self.nodes[i].x += shrink;
                self.nodes[i].width -= shrink;
                break;
            }
        }

        self.coalesce();
    }

    /// Merge adjacent nodes with equal `y`. Reaches a fixed point in one
    /// front-to-back pass.
    fn coalesce(&mut self) {
        let mut i = 0;
        while i + 1 < self.nodes.len() {
            if self.nodes[i].y == self.nodes[i + 1].y {
                self.nodes[i].width += self.nodes[i + 1].width;
                self.nodes.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    /// Write source rows into `region` with the source's first row landing on
    /// the region's first row. Glyph bitmaps arrive in this orientation.
    ///
    /// `stride` is the source row pitch in bytes; `bytes_per_pixel` selects
    /// the conversion (1 = coverage, 3 = RGB, 4 = RGBA).
    pub fn write_rows_top_down(
        &mut self,
        region: Region,
        src: &[u8],
        stride: usize,
        bytes_per_pixel: usize,
    ) {
        for row in 0..region.height {
            let src_row = &src[row as usize * stride..];
            self.write_row(region.x, region.y + row, region.width, src_row, bytes_per_pixel);
        }
        self.mark_dirty(region);
    }

    /// Write source rows into `region` with the source's *last* row landing
    /// on the region's first row. UI images are typically stored bottom-up.
    pub fn write_rows_bottom_up(
        &mut self,
        region: Region,
        src: &[u8],
        stride: usize,
        bytes_per_pixel: usize,
    ) {
        for row in 0..region.height {
            let src_row = &src[(region.height - 1 - row) as usize * stride..];
            self.write_row(region.x, region.y + row, region.width, src_row, bytes_per_pixel);
        }
        self.mark_dirty(region);
    }

    /// Convert and store one row of source pixels at `(x, y)`.
    ///
    /// Missing alpha is synthesized as `min(r+g+b, 255)` so 3-channel glyph
    /// coverage masks become a coverage-derived alpha; 1-channel coverage
    /// becomes white with the coverage as alpha.
    fn write_row(&mut self, x: u32, y: u32, width: u32, src: &[u8], bytes_per_pixel: usize) {
        let size = self.size;
        let texels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut self.pixels);
        for col in 0..width as usize {
            let texel = &mut texels[(y * size + x + col as u32) as usize];
            let p = &src[col * bytes_per_pixel..];
            *texel = match bytes_per_pixel {
                1 => [255, 255, 255, p[0]],
                3 => {
                    let sum = p[0] as u16 + p[1] as u16 + p[2] as u16;
                    [p[0], p[1], p[2], sum.min(255) as u8]
                }
                _ => [p[0], p[1], p[2], p[3]],
            };
        }
    }

    /// Return and reset the rectangle covering every texel mutated since the
    /// last call, as `(x, y, width, height)`. `None` means nothing to upload.
    pub fn take_dirty(&mut self) -> Option<(u32, u32, u32, u32)> {
        self.dirty
            .take()
            .map(|(min_x, min_y, max_x, max_y)| (min_x, min_y, max_x - min_x, max_y - min_y))
    }

    fn mark_dirty(&mut self, region: Region) {
        let (min_x, min_y) = (region.x, region.y);
        let (max_x, max_y) = (region.x + region.width, region.y + region.height);
        self.dirty = Some(match self.dirty {
            Some((ox, oy, ow, oh)) => (ox.min(min_x), oy.min(min_y), ow.max(max_x), oh.max(max_y)),
            None => (min_x, min_y, max_x, max_y),
        });
    }

    fn paint_border(&mut self) {
        let size = self.size;
        let texels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut self.pixels);
        for i in 0..size {
            texels[i as usize] = BORDER_TEXEL;
            texels[((size - 1) * size + i) as usize] = BORDER_TEXEL;
            texels[(i * size) as usize] = BORDER_TEXEL;
            texels[(i * size + size - 1) as usize] = BORDER_TEXEL;
        }
    }

    #[cfg(test)]
    fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.size + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}
