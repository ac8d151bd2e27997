// SPDX-License-Identifier: MIT OR Apache-2.0
//! Zoom scrollbar model.
//!
//! The bar shows the visible part of the timeline as a thumb spanning
//! `[start, end]` in normalized timeline units. Dragging the thumb scrolls,
//! dragging either edge zooms, and clicking beside the thumb centres it on
//! the click.

use crate::controller::TimelineController;
use crate::events::TimelineEvent;
use crate::gesture::PointerEvent;
use crate::state::TimelineState;

/// Narrowest visible range, as a fraction of the timeline
pub const MIN_VISIBLE_RANGE: f64 = 0.01;

/// Distance from a thumb edge that still grabs the edge
pub const EDGE_HIT_PX: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BarDrag {
    None,
    Scroll { grab_offset: f64 },
    ResizeStart,
    ResizeEnd,
}

/// Thumb position and drag state of the zoom scrollbar
#[derive(Debug, Clone)]
pub struct ZoomScrollBar {
    visible_start: f64,
    visible_end: f64,
    width_px: i32,
    drag: BarDrag,
}

impl ZoomScrollBar {
    /// Create a bar `width_px` wide showing the whole timeline
    pub fn new(width_px: i32) -> Self {
        Self {
            visible_start: 0.0,
            visible_end: 1.0,
            width_px,
            drag: BarDrag::None,
        }
    }

    /// Visible range as `(start, end)` fractions of the timeline
    pub fn visible_range(&self) -> (f64, f64) {
        (self.visible_start, self.visible_end)
    }

    /// Thumb extent in bar pixels
    pub fn thumb_px(&self) -> (i32, i32) {
        let w = f64::from(self.width_px);
        ((self.visible_start * w).round() as i32, (self.visible_end * w).round() as i32)
    }

    /// Bar width in pixels
    pub fn width_px(&self) -> i32 {
        self.width_px
    }

    /// Resize the bar
    pub fn set_width(&mut self, width_px: i32) {
        self.width_px = width_px.max(0);
    }

    /// Whether the thumb is being dragged
    pub fn is_dragging(&self) -> bool {
        self.drag != BarDrag::None
    }

    /// Refresh the thumb from the controller state
    pub fn sync(&mut self, state: &TimelineState) {
        if self.is_dragging() {
            return;
        }
        let total = state.timeline_length * state.zoom.horizontal_zoom;
        if !(total > 0.0) {
            return;
        }
        let range = f64::from(state.zoom.viewport_width) / total;
        let start = f64::from(state.zoom.scroll_x) / total;
        self.set_range(start, start + range);
    }

    fn set_range(&mut self, start: f64, end: f64) {
        let width = (end - start).clamp(MIN_VISIBLE_RANGE, 1.0);
        let start = start.clamp(0.0, 1.0 - width);
        self.visible_start = start;
        self.visible_end = start + width;
    }

    fn fraction(&self, x: i32) -> f64 {
        f64::from(x) / f64::from(self.width_px)
    }

    /// Button pressed on the bar
    pub fn pointer_down(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        if self.width_px <= 0 {
            return;
        }
        let (start_px, end_px) = self.thumb_px();
        let pos = self.fraction(ev.x);

        self.drag = if (ev.x - start_px).abs() <= EDGE_HIT_PX {
            BarDrag::ResizeStart
        } else if (ev.x - end_px).abs() <= EDGE_HIT_PX {
            BarDrag::ResizeEnd
        } else if ev.x > start_px && ev.x < end_px {
            BarDrag::Scroll {
                grab_offset: pos - self.visible_start,
            }
        } else {
            let width = self.visible_end - self.visible_start;
            self.set_range(pos - width / 2.0, pos + width / 2.0);
            self.apply_scroll(c);
            BarDrag::Scroll {
                grab_offset: pos - self.visible_start,
            }
        };
        tracing::debug!(drag = ?self.drag, x = ev.x, "Zoom bar pointer down");
    }

    /// Pointer moved with the button held
    pub fn pointer_drag(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        if self.width_px <= 0 {
            return;
        }
        let pos = self.fraction(ev.x);
        match self.drag {
            BarDrag::None => {}
            BarDrag::Scroll { grab_offset } => {
                let width = self.visible_end - self.visible_start;
                let start = (pos - grab_offset).clamp(0.0, 1.0 - width);
                self.visible_start = start;
                self.visible_end = start + width;
                self.apply_scroll(c);
            }
            BarDrag::ResizeStart => {
                self.visible_start = pos.clamp(0.0, self.visible_end - MIN_VISIBLE_RANGE);
                self.apply_zoom(c);
            }
            BarDrag::ResizeEnd => {
                self.visible_end = pos.clamp(self.visible_start + MIN_VISIBLE_RANGE, 1.0);
                self.apply_zoom(c);
            }
        }
    }

    /// Button released
    pub fn pointer_up(&mut self, c: &TimelineController) {
        self.drag = BarDrag::None;
        self.sync(c.state());
    }

    /// Abort the drag
    pub fn cancel(&mut self, c: &TimelineController) {
        self.pointer_up(c);
    }

    fn apply_scroll(&self, c: &mut TimelineController) {
        let state = c.state();
        let x = self.visible_start * state.timeline_length * state.zoom.horizontal_zoom;
        c.dispatch(TimelineEvent::SetScroll {
            x: x.round() as i32,
            y: None,
        });
    }

    fn apply_zoom(&self, c: &mut TimelineController) {
        let state = c.state();
        let range = self.visible_end - self.visible_start;
        let len = state.timeline_length;
        if !(range > 0.0 && len > 0.0) {
            return;
        }
        let zoom = c.clamp_zoom(f64::from(state.zoom.viewport_width) / (range * len));
        let x = self.visible_start * len * zoom;
        c.dispatch(TimelineEvent::SetZoom(zoom));
        c.dispatch(TimelineEvent::SetScroll {
            x: x.round() as i32,
            y: None,
        });
    }
}

impl Default for ZoomScrollBar {
    fn default() -> Self {
        Self::new(0)
    }
}
