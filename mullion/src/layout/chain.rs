//! Chain arena, the two-pass solver, and the layout table.
//!
//! Chains are arena-owned nodes addressed by [`ChainId`]; the arena lives
//! for one layout pass. `recalc` aggregates min/max bottom-up, `distribute`
//! assigns spans top-down, and widget leaves record their spans in a
//! [`LayoutTable`] that is applied to widgets once both axes are solved —
//! widgets never see a half-updated pass.

use std::collections::HashMap;

use tracing::warn;

use crate::error::LayoutError;
use crate::widget::{WidgetId, Widgets};

use super::{Axis, Direction};

/// Index of a chain in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainId(usize);

#[derive(Debug, Clone)]
enum ChainKind {
    /// Fixed `[min, max]` range, set at construction.
    Space,
    /// Wraps one widget; min/max are queried live at every recalc. `None`
    /// after the widget was removed — the leaf stays, contributing zero.
    Widget(Option<WidgetId>),
    /// Children overlay the same span. `min = max(child.min)`,
    /// `max = min(child.max)`.
    Parallel(Vec<ChainId>),
    /// Children laid end to end. `min = sum(child.min)`,
    /// `max = sum(child.max)`. Holds the distribution algorithm.
    Serial(Vec<ChainId>),
}

/// One chain node.
#[derive(Debug, Clone)]
pub struct Chain {
    direction: Direction,
    stretch: f32,
    /// Cached by `recalc`; stale until the next recalc.
    min: f32,
    max: f32,
    kind: ChainKind,
}

/// Arena owning every chain of one layout pass.
#[derive(Default)]
pub struct ChainArena {
    chains: Vec<Chain>,
}

impl ChainArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, chain: Chain) -> ChainId {
        self.chains.push(chain);
        ChainId(self.chains.len() - 1)
    }

    /// A leaf with a fixed size range.
    pub fn space(&mut self, direction: Direction, min: f32, max: f32, stretch: f32) -> ChainId {
        self.push(Chain {
            direction,
            stretch,
            min,
            max,
            kind: ChainKind::Space,
        })
    }

    /// A leaf wrapping one widget.
    pub fn widget(&mut self, direction: Direction, widget: WidgetId, stretch: f32) -> ChainId {
        self.push(Chain {
            direction,
            stretch,
            min: 0.0,
            max: 0.0,
            kind: ChainKind::Widget(Some(widget)),
        })
    }

    /// An empty serial group.
    pub fn serial(&mut self, direction: Direction) -> ChainId {
        self.push(Chain {
            direction,
            stretch: 0.0,
            min: 0.0,
            max: 0.0,
            kind: ChainKind::Serial(Vec::new()),
        })
    }

    /// An empty parallel group.
    pub fn parallel(&mut self, direction: Direction) -> ChainId {
        self.push(Chain {
            direction,
            stretch: 0.0,
            min: 0.0,
            max: f32::INFINITY,
            kind: ChainKind::Parallel(Vec::new()),
        })
    }

    /// Append `child` to the group `parent`.
    ///
    /// Rejected when `parent` is a leaf, or when the axes differ — a
    /// horizontal chain never accepts a vertical child, and the mismatch is
    /// an error at the call site, never silently coerced.
    pub fn add_child(&mut self, parent: ChainId, child: ChainId) -> Result<(), LayoutError> {
        if self.chains[parent.0].direction.axis() != self.chains[child.0].direction.axis() {
            return Err(LayoutError::OrientationMismatch);
        }
        match &mut self.chains[parent.0].kind {
            ChainKind::Serial(children) | ChainKind::Parallel(children) => {
                children.push(child);
                Ok(())
            }
            _ => Err(LayoutError::NotAGroup),
        }
    }

    pub fn set_stretch(&mut self, id: ChainId, stretch: f32) {
        self.chains[id.0].stretch = stretch;
    }

    #[inline]
    pub fn direction(&self, id: ChainId) -> Direction {
        self.chains[id.0].direction
    }

    /// Minimum size from the last `recalc`.
    #[inline]
    pub fn min(&self, id: ChainId) -> f32 {
        self.chains[id.0].min
    }

    /// Maximum size from the last `recalc`.
    #[inline]
    pub fn max(&self, id: ChainId) -> f32 {
        self.chains[id.0].max
    }

    /// Depth-first search for a widget leaf holding `widget`.
    pub fn contains_widget(&self, root: ChainId, widget: WidgetId) -> bool {
        match &self.chains[root.0].kind {
            ChainKind::Widget(Some(id)) => *id == widget,
            ChainKind::Serial(children) | ChainKind::Parallel(children) => children
                .iter()
                .any(|&child| self.contains_widget(child, widget)),
            _ => false,
        }
    }

    /// Null the first widget leaf (in depth-first order) holding `widget`
    /// and stop. The leaf itself stays valid and contributes `[0, 0]` from
    /// then on. Returns whether a leaf was found.
    pub fn remove_widget(&mut self, root: ChainId, widget: WidgetId) -> bool {
        match &self.chains[root.0].kind {
            ChainKind::Widget(Some(id)) if *id == widget => {
                self.chains[root.0].kind = ChainKind::Widget(None);
                true
            }
            ChainKind::Serial(children) | ChainKind::Parallel(children) => {
                let children = children.clone();
                children
                    .into_iter()
                    .any(|child| self.remove_widget(child, widget))
            }
            _ => false,
        }
    }

    /// Bottom-up pass: recompute `[min, max]` post-order. Widget leaves are
    /// queried live from the arena on every recalc, never cached across
    /// passes.
    pub fn recalc(&mut self, id: ChainId, widgets: &Widgets) {
        match self.chains[id.0].kind.clone() {
            ChainKind::Space => {}
            ChainKind::Widget(slot) => {
                let axis = self.chains[id.0].direction.axis();
                let (min, max) = match slot.and_then(|w| widgets.get(w)) {
                    Some(widget) => {
                        (axis.pick(widget.minimum_size()), axis.pick(widget.maximum_size()))
                    }
                    None => (0.0, 0.0),
                };
                self.chains[id.0].min = min;
                self.chains[id.0].max = max;
            }
            ChainKind::Parallel(children) => {
                for &child in &children {
                    self.recalc(child, widgets);
                }
                let mut min = 0.0f32;
                let mut max = f32::INFINITY;
                for &child in &children {
                    min = min.max(self.chains[child.0].min);
                    max = max.min(self.chains[child.0].max);
                }
                self.chains[id.0].min = min;
                self.chains[id.0].max = max;
            }
            ChainKind::Serial(children) => {
                for &child in &children {
                    self.recalc(child, widgets);
                }
                let mut min = 0.0f32;
                let mut max = 0.0f32;
                for &child in &children {
                    min += self.chains[child.0].min;
                    max += self.chains[child.0].max;
                }
                self.chains[id.0].min = min;
                self.chains[id.0].max = max;
            }
        }
    }

    /// Top-down pass: assign each child a `(position, size)` span along the
    /// chain's axis. `recalc` must have run since the last structural or
    /// widget-size change.
    pub fn distribute(&self, id: ChainId, position: f32, space: f32, table: &mut LayoutTable) {
        let chain = &self.chains[id.0];
        match &chain.kind {
            ChainKind::Space => {}
            ChainKind::Widget(None) => {}
            ChainKind::Widget(Some(widget)) => {
                table.set(*widget, chain.direction.axis(), position, space);
            }
            ChainKind::Parallel(children) => {
                for &child in children {
                    self.distribute(child, position, space, table);
                }
            }
            ChainKind::Serial(children) => {
                let sizes = self.distribute_serial(children, space);

                let mut spans = Vec::with_capacity(children.len());
                let mut pen = position;
                for &size in &sizes {
                    spans.push((pen, size));
                    pen += size;
                }

                if chain.direction.is_reversed() {
                    for (pos, size) in &mut spans {
                        *pos = 2.0 * position + space - *pos - *size;
                    }
                }

                for (&child, (pos, size)) in children.iter().zip(spans) {
                    self.distribute(child, pos, size, table);
                }
            }
        }
    }

    /// The serial redistribution algorithm: start every child at its
    /// minimum, hand out the slack proportionally to stretch weight (or
    /// evenly when no child stretches), and whenever a child would exceed
    /// its maximum, pin it there, return its freed slack to the pool, and
    /// restart over the remaining children until a full pass pins nobody.
    fn distribute_serial(&self, children: &[ChainId], space: f32) -> Vec<f32> {
        let n = children.len();
        let mut sizes: Vec<f32> = children.iter().map(|&c| self.chains[c.0].min).collect();
        if n == 0 {
            return sizes;
        }

        let sum_min: f32 = sizes.iter().sum();
        let mut slack = space - sum_min;
        if slack < 0.0 {
            // Overflow: the chain demands more than is available. Degrade to
            // minimum sizes and clip rather than fail the pass.
            warn!(needed = sum_min, available = space, "serial chain overflow, clamping to minimums");
            slack = 0.0;
        }

        let mut total_stretch: f32 = children.iter().map(|&c| self.chains[c.0].stretch).sum();
        let mut fixed = vec![false; n];
        let mut remaining = n;

        loop {
            let mut pinned = false;
            for (i, &child) in children.iter().enumerate() {
                if fixed[i] {
                    continue;
                }
                let chain = &self.chains[child.0];
                let share = if total_stretch > 0.0 {
                    slack * chain.stretch / total_stretch
                } else {
                    slack / remaining as f32
                };
                let candidate = chain.min + share;
                if candidate > chain.max {
                    sizes[i] = chain.max;
                    fixed[i] = true;
                    remaining -= 1;
                    slack = (slack - (chain.max - chain.min)).max(0.0);
                    total_stretch -= chain.stretch;
                    pinned = true;
                    break;
                }
                sizes[i] = candidate;
            }
            if !pinned || remaining == 0 {
                break;
            }
        }
        sizes
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Spans solved for one widget, per axis.
#[derive(Debug, Clone, Copy, Default)]
struct Spans {
    horizontal: Option<(f32, f32)>,
    vertical: Option<(f32, f32)>,
}

/// Solved `(position, size)` spans keyed by widget identity.
///
/// Distribution writes here instead of into widgets directly so a pass never
/// exposes partially updated geometry; `apply` flushes both axes at once.
#[derive(Default)]
pub struct LayoutTable {
    spans: HashMap<WidgetId, Spans>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, widget: WidgetId, axis: Axis, position: f32, size: f32) {
        let entry = self.spans.entry(widget).or_default();
        match axis {
            Axis::Horizontal => entry.horizontal = Some((position, size)),
            Axis::Vertical => entry.vertical = Some((position, size)),
        }
    }

    /// Solved span for a widget along one axis, if the pass produced one.
    pub fn get(&self, widget: WidgetId, axis: Axis) -> Option<(f32, f32)> {
        let spans = self.spans.get(&widget)?;
        match axis {
            Axis::Horizontal => spans.horizontal,
            Axis::Vertical => spans.vertical,
        }
    }

    /// Write the solved spans onto the widgets. An axis the pass did not
    /// solve keeps the widget's current value on that axis.
    pub fn apply(&self, widgets: &mut Widgets) {
        for (&id, spans) in &self.spans {
            if let Some(widget) = widgets.get_mut(id) {
                let mut rect = widget.rect();
                if let Some((x, width)) = spans.horizontal {
                    rect.x = x;
                    rect.width = width;
                }
                if let Some((y, height)) = spans.vertical {
                    rect.y = y;
                    rect.height = height;
                }
                widget.set_rect(rect);
            }
        }
    }
}
