//! Widget arena and the closed widget variant set.
//!
//! The layout solver consumes widgets through a deliberately narrow surface:
//! `minimum_size`, `maximum_size`, and `set_rect`. Everything else about a
//! widget (drawing, input) lives outside this crate. Widgets are stored in a
//! slot arena and addressed by [`WidgetId`]; chain leaves hold ids, never
//! references.

use crate::font::{FontId, FontStore};
use crate::images::{ImageHandle, ImageRegion};
use crate::layout::Direction;
use crate::primitives::{Rect, Size};

/// Horizontal label padding inside a button.
const BUTTON_PADDING_X: f32 = 8.0;
/// Vertical label padding inside a button.
const BUTTON_PADDING_Y: f32 = 4.0;

/// Handle to a widget slot. Stable until the widget is removed; a removed
/// widget's id simply resolves to nothing, which chain leaves treat as a
/// zero-sized contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u32);

/// The closed set of widget variants.
#[derive(Debug, Clone)]
pub enum WidgetKind {
    /// A plain rectangle with explicit size bounds.
    Frame,
    /// Single line of text; minimum size derived from the font.
    TextBox { text: String, font: FontId },
    /// A labelled button.
    Button { label: String, font: FontId },
    /// A nine-slice image.
    Picture { image: ImageHandle },
    /// A layout container; the packer translates it into a strip.
    Panel {
        direction: Direction,
        spacing: f32,
        children: Vec<WidgetId>,
    },
}

/// One widget: variant, size bounds, stretch weight, and its solved
/// rectangle.
#[derive(Debug, Clone)]
pub struct Widget {
    kind: WidgetKind,
    min: Size,
    max: Size,
    stretch: f32,
    rect: Rect,
}

impl Widget {
    /// A plain frame with explicit bounds.
    pub fn frame(min: Size, max: Size) -> Self {
        Self {
            kind: WidgetKind::Frame,
            min,
            max,
            stretch: 0.0,
            rect: Rect::ZERO,
        }
    }

    /// A rigid frame: minimum and maximum are the same.
    pub fn fixed_frame(size: Size) -> Self {
        Self::frame(size, size)
    }

    /// A single-line text box. Minimum width is the measured text, height is
    /// the font's line height; the box may stretch horizontally.
    pub fn text_box(fonts: &mut FontStore, font: FontId, text: impl Into<String>) -> Self {
        let text = text.into();
        let width = fonts.measure(font, &text);
        let line_height = fonts.line_metrics(font).line_height;
        Self {
            kind: WidgetKind::TextBox { text, font },
            min: Size::new(width, line_height),
            max: Size::new(f32::INFINITY, line_height),
            stretch: 0.0,
            rect: Rect::ZERO,
        }
    }

    /// A button sized to its label plus padding.
    pub fn button(fonts: &mut FontStore, font: FontId, label: impl Into<String>) -> Self {
        let label = label.into();
        let width = fonts.measure(font, &label) + 2.0 * BUTTON_PADDING_X;
        let height = fonts.line_metrics(font).line_height + 2.0 * BUTTON_PADDING_Y;
        Self {
            kind: WidgetKind::Button { label, font },
            min: Size::new(width, height),
            max: Size::new(f32::INFINITY, height),
            stretch: 0.0,
            rect: Rect::ZERO,
        }
    }

    /// A picture showing an atlas image region. With zero slice margins the
    /// picture is rigid at the source size; with nine-slice margins it can
    /// stretch, bounded below by the fixed corners.
    pub fn picture(image: ImageHandle, region: &ImageRegion) -> Self {
        let margins = region.margins;
        let sliced = margins.left + margins.right + margins.top + margins.bottom > 0;
        let natural = Size::new(region.width as f32, region.height as f32);
        let (min, max) = if sliced {
            (
                Size::new(
                    (margins.left + margins.right) as f32,
                    (margins.top + margins.bottom) as f32,
                ),
                Size::UNBOUNDED,
            )
        } else {
            (natural, natural)
        };
        Self {
            kind: WidgetKind::Picture { image },
            min,
            max,
            stretch: 0.0,
            rect: Rect::ZERO,
        }
    }

    /// A layout container. Its own bounds are open; the chains it expands
    /// into constrain the children.
    pub fn panel(direction: Direction, spacing: f32) -> Self {
        Self {
            kind: WidgetKind::Panel {
                direction,
                spacing,
                children: Vec::new(),
            },
            min: Size::ZERO,
            max: Size::UNBOUNDED,
            stretch: 0.0,
            rect: Rect::ZERO,
        }
    }

    /// Set the stretch weight used when this widget joins a serial chain.
    pub fn with_stretch(mut self, stretch: f32) -> Self {
        self.stretch = stretch;
        self
    }

    // --- the surface the layout solver consumes ---

    #[inline]
    pub fn minimum_size(&self) -> Size {
        self.min
    }

    #[inline]
    pub fn maximum_size(&self) -> Size {
        self.max
    }

    #[inline]
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn stretch(&self) -> f32 {
        self.stretch
    }

    #[inline]
    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }
}

/// Slot arena of widgets.
#[derive(Default)]
pub struct Widgets {
    slots: Vec<Option<Widget>>,
    free: Vec<u32>,
}

impl Widgets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a widget, reusing a free slot when one exists.
    pub fn insert(&mut self, widget: Widget) -> WidgetId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(widget);
            WidgetId(slot)
        } else {
            self.slots.push(Some(widget));
            WidgetId(self.slots.len() as u32 - 1)
        }
    }

    /// Remove a widget. Chain leaves still holding the id degrade to a
    /// zero-sized contribution; they are not invalidated.
    pub fn remove(&mut self, id: WidgetId) -> Option<Widget> {
        let slot = self.slots.get_mut(id.0 as usize)?;
        let widget = slot.take()?;
        self.free.push(id.0);
        Some(widget)
    }

    #[inline]
    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Append a child to a panel. Returns false when `panel` is not a panel
    /// or no longer exists.
    pub fn add_child(&mut self, panel: WidgetId, child: WidgetId) -> bool {
        match self.get_mut(panel).map(|w| &mut w.kind) {
            Some(WidgetKind::Panel { children, .. }) => {
                children.push(child);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Arena tests
    // =========================================================================

    #[test]
    fn insert_and_get() {
        let mut widgets = Widgets::new();
        let id = widgets.insert(Widget::fixed_frame(Size::new(10.0, 20.0)));
        let widget = widgets.get(id).unwrap();
        assert_eq!(widget.minimum_size(), Size::new(10.0, 20.0));
        assert_eq!(widget.maximum_size(), Size::new(10.0, 20.0));
    }

    #[test]
    fn remove_frees_the_slot_for_reuse() {
        let mut widgets = Widgets::new();
        let a = widgets.insert(Widget::fixed_frame(Size::new(1.0, 1.0)));
        widgets.remove(a).unwrap();
        assert!(widgets.get(a).is_none());

        let b = widgets.insert(Widget::fixed_frame(Size::new(2.0, 2.0)));
        assert_eq!(a, b); // slot reused
        assert_eq!(widgets.len(), 1);
    }

    #[test]
    fn set_rect_round_trips() {
        let mut widgets = Widgets::new();
        let id = widgets.insert(Widget::frame(Size::ZERO, Size::UNBOUNDED));
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        widgets.get_mut(id).unwrap().set_rect(rect);
        assert_eq!(widgets.get(id).unwrap().rect(), rect);
    }

    #[test]
    fn add_child_only_works_on_panels() {
        let mut widgets = Widgets::new();
        let panel = widgets.insert(Widget::panel(Direction::Up, 2.0));
        let frame = widgets.insert(Widget::fixed_frame(Size::new(5.0, 5.0)));

        assert!(widgets.add_child(panel, frame));
        assert!(!widgets.add_child(frame, panel));

        match widgets.get(panel).unwrap().kind() {
            WidgetKind::Panel { children, .. } => assert_eq!(children, &[frame]),
            _ => panic!("not a panel"),
        }
    }

    #[test]
    fn stretch_builder() {
        let widget = Widget::fixed_frame(Size::ZERO).with_stretch(2.5);
        assert_eq!(widget.stretch(), 2.5);
    }
}
