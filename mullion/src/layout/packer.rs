//! Widget-tree layout driver.
//!
//! `fit` runs one complete layout pass: it builds a fresh chain arena,
//! translates the panel tree under `root` into nested strips, solves, and
//! writes the resulting rectangles back onto the widgets. Nothing from the
//! pass survives into the next one.

use crate::error::LayoutError;
use crate::primitives::Rect;
use crate::widget::{WidgetId, WidgetKind, Widgets};

use super::chain::ChainArena;
use super::strip::Strip;
use super::Direction;

/// Lay out the widget tree rooted at `root` inside `rect`.
///
/// A `Panel` becomes a strip: its direction is the strip's primary axis,
/// its spacing the strip border, non-panel children join as widgets, and
/// panel children recurse as nested strips carrying their stretch weight.
/// A non-panel root is laid out as the sole content of a borderless strip.
pub fn fit(widgets: &mut Widgets, root: WidgetId, rect: Rect) -> Result<(), LayoutError> {
    let mut arena = ChainArena::new();

    let strip = match widgets.get(root).map(|w| w.kind()) {
        Some(WidgetKind::Panel { .. }) => {
            let strip = build_panel(&mut arena, widgets, root)?;
            if let Some(panel) = widgets.get_mut(root) {
                panel.set_rect(rect);
            }
            strip
        }
        Some(_) => {
            let mut strip = Strip::new(&mut arena, Direction::LeftToRight, 0.0);
            let stretch = widgets.get(root).map(|w| w.stretch()).unwrap_or(0.0);
            strip.add_widget(&mut arena, root, stretch)?;
            strip
        }
        None => return Ok(()),
    };

    strip.resize_all(&mut arena, widgets, rect);
    Ok(())
}

/// Recursively translate a panel into a strip.
fn build_panel(
    arena: &mut ChainArena,
    widgets: &Widgets,
    panel: WidgetId,
) -> Result<Strip, LayoutError> {
    let (direction, spacing, children) = match widgets.get(panel).map(|w| w.kind()) {
        Some(WidgetKind::Panel {
            direction,
            spacing,
            children,
        }) => (*direction, *spacing, children.clone()),
        _ => (Direction::LeftToRight, 0.0, Vec::new()),
    };

    let mut strip = Strip::new(arena, direction, spacing);
    for child in children {
        let Some(widget) = widgets.get(child) else {
            // Removed widgets simply drop out of the pass.
            continue;
        };
        match widget.kind() {
            WidgetKind::Panel { .. } => {
                let nested = build_panel(arena, widgets, child)?;
                strip.add_strip(arena, &nested, widget.stretch())?;
            }
            _ => strip.add_widget(arena, child, widget.stretch())?,
        }
    }
    Ok(strip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Size;
    use crate::widget::Widget;

    // =========================================================================
    // fit tests
    // =========================================================================

    #[test]
    fn single_widget_fills_its_bounds() {
        let mut widgets = Widgets::new();
        let id = widgets.insert(Widget::frame(Size::new(10.0, 10.0), Size::UNBOUNDED));

        fit(&mut widgets, id, Rect::new(0.0, 0.0, 80.0, 60.0)).unwrap();
        assert_eq!(widgets.get(id).unwrap().rect(), Rect::new(0.0, 0.0, 80.0, 60.0));
    }

    #[test]
    fn panel_lays_children_along_its_direction() {
        let mut widgets = Widgets::new();
        let panel = widgets.insert(Widget::panel(Direction::Up, 2.0));
        let a = widgets.insert(Widget::fixed_frame(Size::new(30.0, 10.0)));
        let b = widgets.insert(Widget::fixed_frame(Size::new(30.0, 10.0)));
        widgets.add_child(panel, a);
        widgets.add_child(panel, b);

        fit(&mut widgets, panel, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();

        assert_eq!(widgets.get(a).unwrap().rect(), Rect::new(2.0, 2.0, 30.0, 10.0));
        assert_eq!(widgets.get(b).unwrap().rect(), Rect::new(2.0, 14.0, 30.0, 10.0));
        // The root panel takes the full requested rect.
        assert_eq!(
            widgets.get(panel).unwrap().rect(),
            Rect::new(0.0, 0.0, 100.0, 100.0)
        );
    }

    #[test]
    fn nested_panels_become_nested_strips() {
        let mut widgets = Widgets::new();
        let column = widgets.insert(Widget::panel(Direction::Up, 0.0));
        let header = widgets.insert(Widget::fixed_frame(Size::new(20.0, 10.0)));
        let row = widgets.insert(Widget::panel(Direction::LeftToRight, 0.0));
        let left = widgets.insert(Widget::fixed_frame(Size::new(8.0, 8.0)));
        let right = widgets.insert(Widget::fixed_frame(Size::new(8.0, 8.0)));

        widgets.add_child(column, header);
        widgets.add_child(column, row);
        widgets.add_child(row, left);
        widgets.add_child(row, right);

        fit(&mut widgets, column, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();

        let header_rect = widgets.get(header).unwrap().rect();
        let left_rect = widgets.get(left).unwrap().rect();
        let right_rect = widgets.get(right).unwrap().rect();

        assert_eq!(header_rect.y, 0.0);
        assert_eq!(left_rect.y, header_rect.top());
        assert_eq!(right_rect.y, left_rect.y);
        assert_eq!(right_rect.x, left_rect.right());
    }

    #[test]
    fn removed_children_drop_out_of_the_pass() {
        let mut widgets = Widgets::new();
        let panel = widgets.insert(Widget::panel(Direction::LeftToRight, 0.0));
        let a = widgets.insert(Widget::fixed_frame(Size::new(10.0, 10.0)));
        let b = widgets.insert(Widget::fixed_frame(Size::new(10.0, 10.0)));
        widgets.add_child(panel, a);
        widgets.add_child(panel, b);
        widgets.remove(a);

        fit(&mut widgets, panel, Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(widgets.get(b).unwrap().rect().x, 0.0);
    }

    #[test]
    fn fit_of_a_missing_root_is_a_no_op() {
        let mut widgets = Widgets::new();
        let id = widgets.insert(Widget::fixed_frame(Size::new(1.0, 1.0)));
        widgets.remove(id);
        assert!(fit(&mut widgets, id, Rect::new(0.0, 0.0, 10.0, 10.0)).is_ok());
    }

    #[test]
    fn duplicate_child_registration_errors() {
        let mut widgets = Widgets::new();
        let panel = widgets.insert(Widget::panel(Direction::LeftToRight, 0.0));
        let a = widgets.insert(Widget::fixed_frame(Size::new(10.0, 10.0)));
        widgets.add_child(panel, a);
        widgets.add_child(panel, a);

        assert_eq!(
            fit(&mut widgets, panel, Rect::new(0.0, 0.0, 50.0, 50.0)),
            Err(LayoutError::DuplicateWidget)
        );
    }
}
