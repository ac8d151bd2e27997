// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ruler gesture machine.
//!
//! The ruler is split vertically into an arrangement-section band, an upper
//! zoom/click area and a lower selection area (see
//! [`RulerLayout`](crate::config::RulerLayout)). Loop markers are grabbed
//! from any height and win over everything else.

use super::{below_min_selection, beyond_threshold, resolved_selection, PointerEvent};
use crate::config::TimelineConfig;
use crate::controller::TimelineController;
use crate::events::TimelineEvent;
use crate::state::{CursorHint, SectionId, TimelineState, MIN_SECTION_DURATION};
use crate::zoom::ZoomDrag;
use std::collections::BTreeSet;
use std::time::Instant;

/// Loop edges are kept at least this far apart while dragging
const MIN_LOOP_GAP: f64 = 0.01;

/// Pixels inside each loop marker where the top border stops being grabbable
const LOOP_BORDER_MARGIN: i32 = 10;

/// Which edge of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Start edge
    Start,
    /// End edge
    End,
}

/// What lies under a ruler position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulerHit {
    /// A loop marker
    LoopMarker(Edge),
    /// The loop's top border, between the markers
    LoopBorder,
    /// The lower selection area
    SelectionArea,
    /// The upper click/zoom area
    ZoomArea,
    /// Edge of an arrangement section
    SectionEdge(SectionId, Edge),
    /// Body of an arrangement section
    SectionBody(SectionId),
    /// Below the ruler
    Outside,
}

impl RulerHit {
    /// Cursor to show while hovering
    pub fn cursor(self) -> CursorHint {
        match self {
            RulerHit::LoopMarker(_) | RulerHit::SectionEdge(..) => CursorHint::LeftRightResize,
            RulerHit::LoopBorder | RulerHit::SectionBody(_) => CursorHint::DraggingHand,
            RulerHit::SelectionArea => CursorHint::IBeam,
            RulerHit::ZoomArea => CursorHint::Crosshair,
            RulerHit::Outside => CursorHint::Normal,
        }
    }
}

/// Classify a ruler position
pub fn hit_test(state: &TimelineState, config: &TimelineConfig, x: i32, y: i32) -> RulerHit {
    let layout = &config.ruler;
    let region = &state.loop_region;

    if region.is_valid() {
        let start_px = state.time_to_pixel(region.start);
        let end_px = state.time_to_pixel(region.end);
        let to_start = (x - start_px).abs();
        let to_end = (x - end_px).abs();
        let reach = config.loop_marker_hit_px;

        if to_start <= reach || to_end <= reach {
            return if to_start <= to_end {
                RulerHit::LoopMarker(Edge::Start)
            } else {
                RulerHit::LoopMarker(Edge::End)
            };
        }

        if (y - layout.ruler_top()).abs() <= config.loop_border_hit_px
            && x > start_px + LOOP_BORDER_MARGIN
            && x < end_px - LOOP_BORDER_MARGIN
        {
            return RulerHit::LoopBorder;
        }
    }

    if y >= layout.ruler_bottom() {
        return RulerHit::Outside;
    }
    if y >= layout.zoom_area_bottom() {
        return RulerHit::SelectionArea;
    }

    if y < layout.ruler_top() && !state.display.arrangement_locked {
        let time = state.pixel_to_time(x);
        if let Some(section) = state.section_at(time) {
            let edge_reach = config.section_edge_hit_px;
            if (x - state.time_to_pixel(section.start)).abs() <= edge_reach {
                return RulerHit::SectionEdge(section.id, Edge::Start);
            }
            if (x - state.time_to_pixel(section.end)).abs() <= edge_reach {
                return RulerHit::SectionEdge(section.id, Edge::End);
            }
            return RulerHit::SectionBody(section.id);
        }
    }

    RulerHit::ZoomArea
}

#[derive(Debug, Clone, PartialEq)]
enum RulerDrag {
    None,
    /// Upper area press: becomes a playhead click or a zoom drag
    PendingClick,
    Zooming,
    Selecting { anchor: f64, range: Option<(f64, f64)> },
    LoopEdge(Edge),
    LoopMove { grab_offset: f64 },
    SectionMove { id: SectionId, grab_offset: f64 },
    SectionResize { id: SectionId, edge: Edge },
}

/// Gesture state for the ruler surface
#[derive(Debug, Clone)]
pub struct RulerGesture {
    drag: RulerDrag,
    zoom: ZoomDrag,
    down: (i32, i32),
    moved: bool,
    last_click: Option<Instant>,
}

impl RulerGesture {
    /// Create an idle ruler machine
    pub fn new() -> Self {
        Self {
            drag: RulerDrag::None,
            zoom: ZoomDrag::new(),
            down: (0, 0),
            moved: false,
            last_click: None,
        }
    }

    /// Whether a drag-to-zoom is in progress
    pub fn is_zooming(&self) -> bool {
        self.drag == RulerDrag::Zooming
    }

    /// Whether any gesture is in progress
    pub fn is_active(&self) -> bool {
        self.drag != RulerDrag::None
    }

    /// Pointer moved without a button held
    pub fn hover(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        if self.is_active() {
            return;
        }
        let hint = hit_test(c.state(), c.config(), ev.x, ev.y).cursor();
        c.dispatch(TimelineEvent::SetCursorHint(hint));
    }

    /// Button pressed
    pub fn pointer_down(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        self.cancel(c);
        self.down = (ev.x, ev.y);
        self.moved = false;

        let hit = hit_test(c.state(), c.config(), ev.x, ev.y);
        let state = c.state();
        let time = state.pixel_to_time(ev.x);

        self.drag = match hit {
            RulerHit::LoopMarker(edge) => {
                c.begin_undo_group("Resize Loop");
                RulerDrag::LoopEdge(edge)
            }
            RulerHit::LoopBorder => {
                let grab_offset = time - state.loop_region.start;
                c.begin_undo_group("Move Loop");
                RulerDrag::LoopMove { grab_offset }
            }
            RulerHit::SelectionArea => {
                let anchor = state.clamp_time(state.snap_time_to_grid(time));
                RulerDrag::Selecting { anchor, range: None }
            }
            RulerHit::SectionEdge(id, edge) => {
                c.dispatch(TimelineEvent::SelectSection(Some(id)));
                c.begin_undo_group("Resize Section");
                RulerDrag::SectionResize { id, edge }
            }
            RulerHit::SectionBody(id) => {
                let grab_offset = state.section(id).map_or(0.0, |s| time - s.start);
                c.dispatch(TimelineEvent::SelectSection(Some(id)));
                c.begin_undo_group("Move Section");
                RulerDrag::SectionMove { id, grab_offset }
            }
            RulerHit::ZoomArea | RulerHit::Outside => {
                let state = c.state();
                self.zoom.arm(ev.x, ev.y, state.zoom.horizontal_zoom, state.pixel_to_time(ev.x));
                if hit == RulerHit::ZoomArea {
                    RulerDrag::PendingClick
                } else {
                    RulerDrag::None
                }
            }
        };

        tracing::debug!(?hit, x = ev.x, y = ev.y, "Ruler pointer down");
        c.dispatch(TimelineEvent::SetCursorHint(hit.cursor()));
    }

    /// Pointer moved with the button held
    pub fn pointer_drag(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        let threshold = c.config().ruler_drag_threshold;
        if !self.moved && beyond_threshold(self.down, ev.x, ev.y, threshold) {
            self.moved = true;
        }

        if self.zoom.is_armed() || self.zoom.is_zooming() {
            self.update_zoom(ev, c);
            return;
        }

        let state = c.state();
        let time = state.pixel_to_time(ev.x);
        let snapped = state.snap_time_to_grid(time);

        match self.drag.clone() {
            RulerDrag::Selecting { anchor, .. } => {
                if self.moved {
                    let range = (anchor, state.clamp_time(snapped));
                    self.drag = RulerDrag::Selecting {
                        anchor,
                        range: Some(range),
                    };
                    c.dispatch(resolved_selection(range, BTreeSet::new()));
                }
            }
            RulerDrag::LoopEdge(edge) => {
                let region = state.loop_region.clone();
                let (start, end) = match edge {
                    Edge::Start => (snapped.min(region.end - MIN_LOOP_GAP).max(0.0), region.end),
                    Edge::End => (region.start, snapped.max(region.start + MIN_LOOP_GAP).min(state.timeline_length)),
                };
                c.dispatch(TimelineEvent::SetLoopRegion { start, end });
            }
            RulerDrag::LoopMove { grab_offset } => {
                let target = state.snap_time_to_grid(time - grab_offset);
                let delta = target - state.loop_region.start;
                c.dispatch(TimelineEvent::MoveLoopBy(delta));
            }
            RulerDrag::SectionMove { id, grab_offset } => {
                let start = state.snap_time_to_grid(time - grab_offset);
                c.dispatch(TimelineEvent::MoveSection { id, start });
            }
            RulerDrag::SectionResize { id, edge } => {
                if let Some(section) = state.section(id) {
                    let (start, end) = match edge {
                        Edge::Start => (snapped.min(section.end - MIN_SECTION_DURATION).max(0.0), section.end),
                        Edge::End => (section.start, snapped.max(section.start + MIN_SECTION_DURATION)),
                    };
                    c.dispatch(TimelineEvent::ResizeSection { id, start, end });
                }
            }
            RulerDrag::None | RulerDrag::PendingClick | RulerDrag::Zooming => {}
        }
    }

    fn update_zoom(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        let config = c.config();
        let sensitivity = if ev.modifiers.shift {
            config.zoom_drag_sensitivity_fast
        } else {
            config.zoom_drag_sensitivity
        };
        let threshold = config.ruler_drag_threshold;
        let max_zoom = config.max_zoom;
        let floor = c.drag_zoom_floor();

        let Some(step) = self.zoom.update(ev.y, threshold, sensitivity, floor, max_zoom) else {
            return;
        };

        if step.began {
            tracing::debug!(anchor_time = step.anchor_time, "Ruler drag escalated to zoom");
            self.drag = RulerDrag::Zooming;
            c.dispatch(TimelineEvent::SetZoomGestureActive(true));
            c.dispatch(TimelineEvent::SetCursorHint(CursorHint::UpDownResize));
        }
        c.dispatch(TimelineEvent::SetZoomAnchored {
            zoom: step.zoom,
            time: step.anchor_time,
            screen_x: step.anchor_x,
        });
    }

    /// Button released
    pub fn pointer_up(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        let drag = std::mem::replace(&mut self.drag, RulerDrag::None);
        let zoomed = self.zoom.release();
        c.end_undo_group();

        if zoomed {
            c.dispatch(TimelineEvent::SetZoomGestureActive(false));
        }

        match drag {
            RulerDrag::PendingClick if !self.moved => self.click(ev, c),
            RulerDrag::Selecting { range, .. } => {
                if !self.moved {
                    let state = c.state();
                    let time = state.clamp_time(state.snap_time_to_grid(state.pixel_to_time(self.down.0)));
                    c.dispatch(TimelineEvent::ClearSelection);
                    c.dispatch(TimelineEvent::SetPlayhead(time));
                } else if below_min_selection(range, c.config().min_selection_duration) {
                    tracing::trace!(?range, "Discarded short ruler selection");
                    c.dispatch(TimelineEvent::ClearSelection);
                }
            }
            _ => {}
        }

        let hint = hit_test(c.state(), c.config(), ev.x, ev.y).cursor();
        c.dispatch(TimelineEvent::SetCursorHint(hint));
    }

    fn click(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        let window = c.config().double_click_window();
        let double = self
            .last_click
            .is_some_and(|previous| ev.time.saturating_duration_since(previous) <= window);

        if double && c.loop_region().enabled {
            self.last_click = None;
            tracing::debug!("Ruler double-click, zooming to loop");
            c.zoom_to_loop();
            return;
        }

        self.last_click = Some(ev.time);
        let time = c.state().pixel_to_time(self.down.0);
        c.dispatch(TimelineEvent::SetPlayhead(time));
    }

    /// Abort the current gesture without committing it
    pub fn cancel(&mut self, c: &mut TimelineController) {
        if self.zoom.release() {
            c.dispatch(TimelineEvent::SetZoomGestureActive(false));
        }
        if self.is_active() {
            c.end_undo_group();
        }
        self.drag = RulerDrag::None;
        self.moved = false;
    }
}

impl Default for RulerGesture {
    fn default() -> Self {
        Self::new()
    }
}
