//! Mullion: texture atlas, glyph cache, and chain layout core
//!
//! Mullion is the core of a small GUI toolkit:
//! - A skyline rectangle bin-packer (`Atlas`) over a CPU-side RGBA buffer,
//!   with dirty-rect tracking for partial texture uploads
//! - A lazy glyph cache (`FontStore`) fed by a pluggable `Rasterizer`
//!   (shipped backend: fontdue), sharing one atlas across fonts with
//!   grow-and-reflow on exhaustion
//! - A named nine-slice image store (`ImageStore`) on the same atlas
//!   machinery
//! - A chain-based constraint layout solver (`ChainArena`, `Strip`) with a
//!   packer that lays out a widget tree in one two-pass fit
//!
//! Rendering is out of scope: the atlases hand over `pixels()` and
//! `take_dirty()`, widgets expose solved rectangles, and the embedder does
//! the drawing. Everything here is single-threaded; a layout pass builds
//! its chain tree in a per-pass arena and discards it afterwards.
//!
//! # Usage
//!
//! ```ignore
//! use mullion::{fit, FontStore, Rect, Widget, Widgets};
//! use mullion::layout::Direction;
//!
//! let mut fonts = FontStore::new(256, 4096);
//! let body = fonts.load_fonts(&config.fonts)?["body"];
//!
//! let mut widgets = Widgets::new();
//! let root = widgets.insert(Widget::panel(Direction::Up, 4.0));
//! let label = widgets.insert(Widget::text_box(&mut fonts, body, "hello"));
//! widgets.add_child(root, label);
//!
//! fit(&mut widgets, root, Rect::new(0.0, 0.0, 800.0, 600.0))?;
//! ```

// Core primitives
pub mod primitives;

// Errors
pub mod error;

// Atlas and the stores packed into it
pub mod atlas;
pub mod font;
pub mod images;
pub mod raster;

// Layout system (chain solver, strips, packer)
pub mod layout;

// Widget arena
pub mod widget;

// Config descriptors and loader
pub mod config;

pub use atlas::{Atlas, AtlasNode, Region};
pub use config::{FontSpec, ImageSpec, UiConfig};
pub use error::{ConfigError, FontError, ImageStoreError, LayoutError};
pub use font::{FontId, FontStore, Glyph, GlyphCache, GlyphIx, SENTINEL_CODEPOINT};
pub use images::{ImageHandle, ImageRegion, ImageStore, SliceMargins};
pub use layout::{fit, Axis, ChainArena, ChainId, Direction, LayoutTable, Strip};
pub use primitives::{Point, Rect, Size, UvRect};
pub use raster::{FontMetrics, FontdueRasterizer, GlyphStyle, OutlineKind, RasterGlyph, Rasterizer};
pub use widget::{Widget, WidgetId, WidgetKind, Widgets};
