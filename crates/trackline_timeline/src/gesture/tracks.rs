// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track-content selection gestures.
//!
//! A press inside an existing selection moves it; anywhere else inside the
//! lane stack it starts a new selection. A press and release without
//! movement schedules a playhead move that fires after the double-click
//! window unless a second click turns it into a double-click, which clears
//! the selection instead.

use super::{below_min_selection, beyond_threshold, resolved_selection, PointerEvent};
use crate::controller::TimelineController;
use crate::events::TimelineEvent;
use crate::state::CursorHint;
use std::collections::BTreeSet;
use std::time::Instant;

/// Base heights of the track lanes, top to bottom
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackLanes {
    heights: Vec<i32>,
}

impl TrackLanes {
    /// Create from base lane heights (before vertical zoom)
    pub fn new(heights: Vec<i32>) -> Self {
        Self { heights }
    }

    /// Number of lanes
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Whether there are no lanes
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    fn scaled(height: i32, vertical_zoom: f64) -> i32 {
        ((f64::from(height) * vertical_zoom) as i32).max(1)
    }

    /// Lane under a content-space `y`, if any
    pub fn lane_at(&self, y: i32, vertical_zoom: f64) -> Option<usize> {
        if y < 0 {
            return None;
        }
        let mut top = 0;
        for (index, &height) in self.heights.iter().enumerate() {
            let bottom = top + Self::scaled(height, vertical_zoom);
            if y < bottom {
                return Some(index);
            }
            top = bottom;
        }
        None
    }

    /// Lane under `y`, pinned to the first/last lane outside the stack
    pub fn clamped_lane_at(&self, y: i32, vertical_zoom: f64) -> Option<usize> {
        if self.heights.is_empty() {
            return None;
        }
        if y < 0 {
            return Some(0);
        }
        Some(self.lane_at(y, vertical_zoom).unwrap_or(self.heights.len() - 1))
    }
}

/// A playhead move waiting for the double-click window to pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPlayhead {
    /// Target time (already snapped)
    pub time: f64,
    /// Where the first click landed
    pub position: (i32, i32),
    /// When the first click was released
    pub clicked_at: Instant,
    /// When the move fires
    pub deadline: Instant,
}

#[derive(Debug, Clone, PartialEq)]
enum TrackDrag {
    None,
    Creating {
        start_time: f64,
        start_lane: usize,
        all_tracks: bool,
        /// Last range resolved by the drag, in drag order
        range: Option<(f64, f64)>,
    },
    Moving {
        grab_offset: f64,
        duration: f64,
        tracks: BTreeSet<usize>,
    },
    /// Second click of a double-click; the rest of the gesture is ignored
    DoubleClicked,
}

/// Gesture state for the track-content surface
#[derive(Debug, Clone)]
pub struct TrackSelectionGesture {
    lanes: TrackLanes,
    drag: TrackDrag,
    down: (i32, i32),
    moved: bool,
    pending: Option<PendingPlayhead>,
}

impl TrackSelectionGesture {
    /// Create an idle machine for the given lanes
    pub fn new(lanes: TrackLanes) -> Self {
        Self {
            lanes,
            drag: TrackDrag::None,
            down: (0, 0),
            moved: false,
            pending: None,
        }
    }

    /// Replace the lane layout
    pub fn set_lanes(&mut self, lanes: TrackLanes) {
        self.lanes = lanes;
    }

    /// Current lane layout
    pub fn lanes(&self) -> &TrackLanes {
        &self.lanes
    }

    /// Scheduled playhead move, if any
    pub fn pending_playhead(&self) -> Option<&PendingPlayhead> {
        self.pending.as_ref()
    }

    /// When the host should next call [`poll`](Self::poll)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Whether a press is in progress
    pub fn is_active(&self) -> bool {
        self.drag != TrackDrag::None
    }

    fn content_y(y: i32, c: &TimelineController) -> i32 {
        y + c.state().zoom.scroll_y
    }

    /// Pointer moved without a button held
    pub fn hover(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        if self.is_active() {
            return;
        }
        let state = c.state();
        let lane = self.lanes.lane_at(Self::content_y(ev.y, c), state.zoom.vertical_zoom);
        let hint = match lane {
            Some(lane)
                if state.selection.is_visually_active()
                    && state.selection.includes_track(lane)
                    && state.selection.contains_time(state.pixel_to_time(ev.x)) =>
            {
                CursorHint::DraggingHand
            }
            Some(_) => CursorHint::IBeam,
            None => CursorHint::Normal,
        };
        c.dispatch(TimelineEvent::SetCursorHint(hint));
    }

    /// Button pressed
    pub fn pointer_down(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        self.poll(ev.time, c);
        self.down = (ev.x, ev.y);
        self.moved = false;

        let threshold = c.config().track_drag_threshold;
        let second_click = self
            .pending
            .filter(|p| !beyond_threshold(p.position, ev.x, ev.y, threshold));
        if let Some(pending) = second_click {
            // Still inside the window, or poll would have fired it
            self.pending = None;
            tracing::debug!(time = pending.time, "Double-click on tracks, clearing selection");
            c.dispatch(TimelineEvent::ClearSelection);
            self.drag = TrackDrag::DoubleClicked;
            return;
        }

        let state = c.state();
        let Some(lane) = self.lanes.lane_at(Self::content_y(ev.y, c), state.zoom.vertical_zoom) else {
            self.drag = TrackDrag::None;
            return;
        };
        let time = state.pixel_to_time(ev.x);
        let selection = &state.selection;

        self.drag = if selection.is_visually_active() && selection.contains_time(time) && selection.includes_track(lane) {
            TrackDrag::Moving {
                grab_offset: time - selection.start,
                duration: selection.duration(),
                tracks: selection.track_indices.clone(),
            }
        } else {
            TrackDrag::Creating {
                start_time: state.clamp_time(state.snap_time_to_grid(time)),
                start_lane: lane,
                all_tracks: ev.modifiers.shift,
                range: None,
            }
        };
        tracing::trace!(lane, time, drag = ?self.drag, "Track pointer down");
    }

    /// Pointer moved with the button held
    pub fn pointer_drag(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        if !self.moved {
            if !beyond_threshold(self.down, ev.x, ev.y, c.config().track_drag_threshold) {
                return;
            }
            self.moved = true;
        }

        let state = c.state();
        let time = state.pixel_to_time(ev.x);

        let event = match &mut self.drag {
            TrackDrag::Creating {
                start_time,
                start_lane,
                all_tracks,
                range,
            } => {
                let end_time = state.clamp_time(state.snap_time_to_grid(time));
                let tracks = if *all_tracks {
                    BTreeSet::new()
                } else {
                    let end_lane = self
                        .lanes
                        .clamped_lane_at(Self::content_y(ev.y, c), state.zoom.vertical_zoom)
                        .unwrap_or(*start_lane);
                    let (low, high) = if end_lane < *start_lane {
                        (end_lane, *start_lane)
                    } else {
                        (*start_lane, end_lane)
                    };
                    (low..=high).collect()
                };
                *range = Some((*start_time, end_time));
                resolved_selection((*start_time, end_time), tracks)
            }
            TrackDrag::Moving { grab_offset, duration, tracks } => {
                let latest = (state.timeline_length - *duration).max(0.0);
                let start = state.snap_time_to_grid(time - *grab_offset).clamp(0.0, latest);
                TimelineEvent::SetSelection {
                    start,
                    end: start + *duration,
                    tracks: tracks.clone(),
                }
            }
            TrackDrag::None | TrackDrag::DoubleClicked => return,
        };
        c.dispatch(event);
    }

    /// Button released
    pub fn pointer_up(&mut self, ev: &PointerEvent, c: &mut TimelineController) {
        let drag = std::mem::replace(&mut self.drag, TrackDrag::None);
        match drag {
            TrackDrag::Creating { .. } | TrackDrag::Moving { .. } if !self.moved => {
                let state = c.state();
                let time = state.clamp_time(state.snap_time_to_grid(state.pixel_to_time(self.down.0)));
                let window = c.config().double_click_window();
                self.pending = Some(PendingPlayhead {
                    time,
                    position: self.down,
                    clicked_at: ev.time,
                    deadline: ev.time + window,
                });
                tracing::trace!(time, "Scheduled playhead move");
            }
            TrackDrag::Creating { range, .. } => {
                if below_min_selection(range, c.config().min_selection_duration) {
                    tracing::trace!(?range, "Discarded short track selection");
                    c.dispatch(TimelineEvent::ClearSelection);
                }
            }
            _ => {}
        }
        self.moved = false;
    }

    /// Fire the scheduled playhead move if its deadline has passed.
    /// Returns `true` when it fired.
    pub fn poll(&mut self, now: Instant, c: &mut TimelineController) -> bool {
        let Some(pending) = self.pending.filter(|p| now >= p.deadline) else {
            return false;
        };
        self.pending = None;
        c.dispatch(TimelineEvent::SetPlayhead(pending.time));
        true
    }

    /// Pointer left the surface or the gesture was interrupted. Nothing is
    /// committed; a scheduled playhead move stays scheduled.
    pub fn cancel(&mut self) {
        self.drag = TrackDrag::None;
        self.moved = false;
    }
}
