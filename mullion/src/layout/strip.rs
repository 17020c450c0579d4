//! Strip: one "line" of layout.
//!
//! A strip pairs a serial chain along its primary axis with a parallel
//! chain across it, and exposes the add/nest operations the packer drives.
//! The strip owns no chains; they live in the pass's [`ChainArena`] and die
//! with it.

use crate::error::LayoutError;
use crate::primitives::{Rect, Size};
use crate::widget::{WidgetId, Widgets};

use super::chain::{ChainArena, ChainId, LayoutTable};
use super::{Axis, Direction};

/// A serial/parallel chain pair with builder operations.
pub struct Strip {
    serial: ChainId,
    cross: ChainId,
    direction: Direction,
    border: f32,
    /// Whether the previous addition was a content item (widget or nested
    /// strip); the default border is inserted only between two of those.
    pending_border: bool,
}

impl Strip {
    /// Create a strip running along `direction`. `border` is both the
    /// default spacing between content items and the outer margin applied
    /// once by [`Strip::resize_all`].
    pub fn new(arena: &mut ChainArena, direction: Direction, border: f32) -> Self {
        let serial = arena.serial(direction);
        let cross = arena.parallel(direction.cross());
        Self {
            serial,
            cross,
            direction,
            border,
            pending_border: false,
        }
    }

    /// Add a widget. It joins the serial chain along the primary axis with
    /// the given stretch weight, and the parallel chain across it. A widget
    /// may appear at most once per strip.
    pub fn add_widget(
        &mut self,
        arena: &mut ChainArena,
        widget: WidgetId,
        stretch: f32,
    ) -> Result<(), LayoutError> {
        if arena.contains_widget(self.serial, widget) {
            return Err(LayoutError::DuplicateWidget);
        }
        self.separate(arena);

        let main = arena.widget(self.direction, widget, stretch);
        arena.add_child(self.serial, main)?;
        let across = arena.widget(self.direction.cross(), widget, 0.0);
        arena.add_child(self.cross, across)?;

        self.pending_border = true;
        Ok(())
    }

    /// Add a fixed amount of space along the primary axis. Explicit spacing
    /// replaces the default border for the next item.
    pub fn add_spacing(&mut self, arena: &mut ChainArena, amount: f32) {
        let space = arena.space(self.direction, amount, amount, 0.0);
        // Infallible: the space chain shares the strip's axis.
        let _ = arena.add_child(self.serial, space);
        self.pending_border = false;
    }

    /// Add an unbounded stretchable gap with the given weight.
    pub fn add_stretch(&mut self, arena: &mut ChainArena, weight: f32) {
        let space = arena.space(self.direction, 0.0, f32::INFINITY, weight);
        let _ = arena.add_child(self.serial, space);
        self.pending_border = false;
    }

    /// Force a minimum extent across the strip without adding anything
    /// along it.
    pub fn add_strut(&mut self, arena: &mut ChainArena, size: f32) {
        let strut = arena.space(self.direction.cross(), size, f32::INFINITY, 0.0);
        let _ = arena.add_child(self.cross, strut);
    }

    /// Nest another strip. The child chain sharing this strip's axis joins
    /// the serial chain (carrying `stretch`); the other joins the parallel
    /// chain — so both same-axis and perpendicular nesting compose.
    pub fn add_strip(
        &mut self,
        arena: &mut ChainArena,
        child: &Strip,
        stretch: f32,
    ) -> Result<(), LayoutError> {
        self.separate(arena);

        let (main, across) = if child.direction.axis() == self.direction.axis() {
            (child.serial, child.cross)
        } else {
            (child.cross, child.serial)
        };
        arena.set_stretch(main, stretch);
        arena.add_child(self.serial, main)?;
        arena.add_child(self.cross, across)?;

        self.pending_border = true;
        Ok(())
    }

    /// Insert the default border ahead of a content item when one is due.
    fn separate(&mut self, arena: &mut ChainArena) {
        if self.pending_border && self.border > 0.0 {
            let space = arena.space(self.direction, self.border, self.border, 0.0);
            let _ = arena.add_child(self.serial, space);
        }
    }

    /// Drive one layout pass against `rect`: recalc both chains, clamp the
    /// requested extent on each axis into `[min + 2*border, max]`, distribute
    /// from the border offset, and apply the solved spans to the widgets.
    /// Returns the clamped size actually laid out.
    pub fn resize_all(&self, arena: &mut ChainArena, widgets: &mut Widgets, rect: Rect) -> Size {
        arena.recalc(self.serial, widgets);
        arena.recalc(self.cross, widgets);

        let border = self.border;
        let (main_request, cross_request, main_origin, cross_origin) = match self.direction.axis() {
            Axis::Horizontal => (rect.width, rect.height, rect.x, rect.y),
            Axis::Vertical => (rect.height, rect.width, rect.y, rect.x),
        };

        let main = clamp_span(
            main_request,
            arena.min(self.serial) + 2.0 * border,
            arena.max(self.serial),
        );
        let cross = clamp_span(
            cross_request,
            arena.min(self.cross) + 2.0 * border,
            arena.max(self.cross),
        );

        let mut table = LayoutTable::new();
        arena.distribute(self.serial, main_origin + border, main - 2.0 * border, &mut table);
        arena.distribute(self.cross, cross_origin + border, cross - 2.0 * border, &mut table);
        table.apply(widgets);

        match self.direction.axis() {
            Axis::Horizontal => Size::new(main, cross),
            Axis::Vertical => Size::new(cross, main),
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Clamp a requested extent into `[lo, hi]`, with the minimum winning when
/// the two bounds cross.
#[inline]
fn clamp_span(request: f32, lo: f32, hi: f32) -> f32 {
    request.max(lo).min(hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Widget;

    fn rigid(widgets: &mut Widgets, width: f32, height: f32) -> WidgetId {
        widgets.insert(Widget::fixed_frame(Size::new(width, height)))
    }

    // =========================================================================
    // Border policy tests
    // =========================================================================

    #[test]
    fn border_goes_between_content_items_only() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = rigid(&mut widgets, 10.0, 10.0);
        let b = rigid(&mut widgets, 10.0, 10.0);

        let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 4.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();
        strip.add_widget(&mut arena, b, 0.0).unwrap();
        strip.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 100.0, 20.0));

        // Rigid content: 10 + 4 + 10 inside a 4px outer border.
        assert_eq!(widgets.get(a).unwrap().rect(), Rect::new(4.0, 4.0, 10.0, 10.0));
        assert_eq!(widgets.get(b).unwrap().rect(), Rect::new(18.0, 4.0, 10.0, 10.0));
    }

    #[test]
    fn explicit_spacing_replaces_the_default_border() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = rigid(&mut widgets, 10.0, 10.0);
        let b = rigid(&mut widgets, 10.0, 10.0);

        let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 4.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();
        strip.add_spacing(&mut arena, 1.0);
        strip.add_widget(&mut arena, b, 0.0).unwrap();
        strip.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 100.0, 20.0));

        assert_eq!(widgets.get(b).unwrap().rect().x, 15.0);
    }

    #[test]
    fn duplicate_widget_is_rejected() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = rigid(&mut widgets, 10.0, 10.0);

        let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 0.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();
        assert_eq!(
            strip.add_widget(&mut arena, a, 0.0),
            Err(LayoutError::DuplicateWidget)
        );
    }

    // =========================================================================
    // resize_all tests
    // =========================================================================

    #[test]
    fn stretch_pushes_content_apart() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = rigid(&mut widgets, 10.0, 10.0);
        let b = rigid(&mut widgets, 10.0, 10.0);

        let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 0.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();
        strip.add_stretch(&mut arena, 1.0);
        strip.add_widget(&mut arena, b, 0.0).unwrap();
        strip.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 100.0, 10.0));

        assert_eq!(widgets.get(a).unwrap().rect().x, 0.0);
        assert_eq!(widgets.get(b).unwrap().rect().x, 90.0);
    }

    #[test]
    fn requested_size_is_clamped_to_content() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = rigid(&mut widgets, 30.0, 10.0);

        let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 2.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();

        // Far too small a rect: the strip holds its minimum.
        let size = strip.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(size, Size::new(34.0, 14.0));
        assert_eq!(widgets.get(a).unwrap().rect(), Rect::new(2.0, 2.0, 30.0, 10.0));
    }

    #[test]
    fn strut_forces_cross_extent() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = widgets.insert(Widget::frame(
            Size::new(10.0, 5.0),
            Size::new(10.0, f32::INFINITY),
        ));

        let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 0.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();
        strip.add_strut(&mut arena, 40.0);
        strip.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 10.0, 10.0));

        // Cross minimum is the strut's 40, not the widget's 5.
        assert_eq!(widgets.get(a).unwrap().rect().height, 40.0);
    }

    #[test]
    fn vertical_strip_assigns_the_vertical_axis() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let a = rigid(&mut widgets, 10.0, 10.0);
        let b = rigid(&mut widgets, 10.0, 10.0);

        let mut strip = Strip::new(&mut arena, Direction::Up, 2.0);
        strip.add_widget(&mut arena, a, 0.0).unwrap();
        strip.add_widget(&mut arena, b, 0.0).unwrap();
        strip.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 50.0, 50.0));

        assert_eq!(widgets.get(a).unwrap().rect(), Rect::new(2.0, 2.0, 10.0, 10.0));
        assert_eq!(widgets.get(b).unwrap().rect(), Rect::new(2.0, 14.0, 10.0, 10.0));
    }

    #[test]
    fn nested_perpendicular_strip_composes() {
        let mut widgets = Widgets::new();
        let mut arena = ChainArena::new();
        let top = rigid(&mut widgets, 20.0, 10.0);
        let left = rigid(&mut widgets, 8.0, 8.0);
        let right = rigid(&mut widgets, 8.0, 8.0);

        let mut row = Strip::new(&mut arena, Direction::LeftToRight, 0.0);
        row.add_widget(&mut arena, left, 0.0).unwrap();
        row.add_widget(&mut arena, right, 0.0).unwrap();

        let mut column = Strip::new(&mut arena, Direction::Up, 0.0);
        column.add_widget(&mut arena, top, 0.0).unwrap();
        column.add_strip(&mut arena, &row, 0.0).unwrap();
        column.resize_all(&mut arena, &mut widgets, Rect::new(0.0, 0.0, 100.0, 100.0));

        // The row sits below the top widget, its children side by side.
        let top_rect = widgets.get(top).unwrap().rect();
        let left_rect = widgets.get(left).unwrap().rect();
        let right_rect = widgets.get(right).unwrap().rect();
        assert_eq!(top_rect.y, 0.0);
        assert_eq!(left_rect.y, 10.0);
        assert_eq!(right_rect.y, 10.0);
        assert_eq!(left_rect.x, 0.0);
        assert_eq!(right_rect.x, 8.0);
    }
}
