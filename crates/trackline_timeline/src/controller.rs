// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline controller.
//!
//! The controller is the only writer of [`TimelineState`]. Every mutation is
//! a [`TimelineEvent`]: it is validated and clamped, applied to a copy of the
//! current state, published as a new immutable snapshot, and then announced
//! to the listeners of each topic it changed.
//!
//! Listeners receive a shared reference to the new state and cannot call
//! back into the controller while it is notifying.

use crate::config::TimelineConfig;
use crate::coords::LEFT_PADDING;
use crate::events::TimelineEvent;
use crate::history::{self, History, HistoryEntry};
use crate::listeners::{Changes, ListenerRegistry, SubscriptionId, Topic};
use crate::state::{
    ArrangementSection, CursorHint, GridDivision, LoopRegion, PlayheadState, PunchRegion, SectionId,
    TempoState, TimeSelection, TimelineState, MAX_BPM, MAX_SIGNATURE, MAX_VERTICAL_ZOOM, MIN_BPM,
    MIN_PUNCH_DURATION, MIN_SECTION_DURATION, MIN_SIGNATURE, MIN_VERTICAL_ZOOM,
};
use crate::zoom;
use std::collections::BTreeSet;
use std::sync::Arc;

/// An open undo group: undoable events applied while it is open share one
/// undo point.
#[derive(Debug)]
struct UndoGroup {
    description: String,
    before: Arc<TimelineState>,
    recorded: bool,
}

/// Owner and sole writer of the timeline state
#[derive(Debug)]
pub struct TimelineController {
    config: TimelineConfig,
    state: Arc<TimelineState>,
    listeners: ListenerRegistry,
    history: History,
    undo_group: Option<UndoGroup>,
}

impl TimelineController {
    /// Create a controller with the initial state for `config`
    pub fn new(config: TimelineConfig) -> Self {
        let state = TimelineState::new(&config);
        Self {
            config,
            state: Arc::new(state),
            listeners: ListenerRegistry::new(),
            history: History::new(),
            undo_group: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    /// Shared snapshot of the current state
    pub fn snapshot(&self) -> Arc<TimelineState> {
        Arc::clone(&self.state)
    }

    /// Active configuration
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Timeline length in seconds
    pub fn timeline_length(&self) -> f64 {
        self.state.timeline_length
    }

    /// Tempo and time signature
    pub fn tempo(&self) -> &TempoState {
        &self.state.tempo
    }

    /// Loop region
    pub fn loop_region(&self) -> &LoopRegion {
        &self.state.loop_region
    }

    /// Clamp a zoom value into the configured bounds
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        self.config.clamp_zoom(zoom)
    }

    /// Lowest zoom reachable by dragging, for the current viewport and length
    pub fn drag_zoom_floor(&self) -> f64 {
        zoom::fit_zoom_floor(&self.config, self.state.zoom.viewport_width, self.state.timeline_length)
    }

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------

    /// Apply an event and notify listeners of every topic it changed
    pub fn dispatch(&mut self, event: TimelineEvent) -> Changes {
        let before = Arc::clone(&self.state);
        let mut next = (*before).clone();
        self.apply(&mut next, &event);

        let changes = diff(&before, &next);
        if changes.is_empty() {
            tracing::trace!(event = event.description(), "Timeline event had no effect");
            return Changes::NONE;
        }

        next.version = before.version + 1;
        if event.is_undoable() {
            self.record_undo(&event, Arc::clone(&before));
            tracing::debug!(event = event.description(), ?changes, version = next.version, "Applied timeline event");
        } else {
            tracing::trace!(event = event.description(), ?changes, version = next.version, "Applied timeline event");
        }

        self.publish(next, changes);
        changes
    }

    fn publish(&mut self, next: TimelineState, changes: Changes) {
        self.state = Arc::new(next);
        self.listeners.notify(&self.state, changes);
    }

    fn apply(&mut self, s: &mut TimelineState, event: &TimelineEvent) {
        match event {
            TimelineEvent::SetZoom(z) => {
                s.zoom.horizontal_zoom = self.config.clamp_zoom(*z);
                clamp_scroll(s);
            }
            TimelineEvent::SetZoomCentered { zoom, time } => {
                let z = self.config.clamp_zoom(*zoom);
                s.zoom.horizontal_zoom = z;
                s.zoom.scroll_x = zoom::centered_scroll(*time, z, s.zoom.viewport_width);
                clamp_scroll(s);
            }
            TimelineEvent::SetZoomAnchored { zoom, time, screen_x } => {
                let z = self.config.clamp_zoom(*zoom);
                s.zoom.horizontal_zoom = z;
                s.zoom.scroll_x = zoom::anchored_scroll(*time, z, *screen_x);
                clamp_scroll(s);
            }
            TimelineEvent::SetZoomFromPointer { zoom, pointer_x, viewport_width } => {
                if *viewport_width > 0 {
                    s.zoom.viewport_width = *viewport_width;
                }
                let anchor = s.pixel_to_time_local(pointer_x + s.zoom.scroll_x);
                let z = self.config.clamp_zoom(*zoom);
                s.zoom.horizontal_zoom = z;
                s.zoom.scroll_x = zoom::anchored_scroll(anchor, z, *pointer_x);
                clamp_scroll(s);
            }
            TimelineEvent::ZoomToFit { start, end, padding } => {
                if let Some((z, left)) = zoom::fit_range(*start, *end, *padding, s.zoom.viewport_width) {
                    let z = self.config.clamp_zoom(z);
                    s.zoom.horizontal_zoom = z;
                    s.zoom.scroll_x = zoom::anchored_scroll(left, z, LEFT_PADDING);
                    clamp_scroll(s);
                }
            }
            TimelineEvent::ResetZoom => {
                let usable = f64::from(s.zoom.viewport_width - LEFT_PADDING);
                if usable > 0.0 && s.timeline_length > 0.0 {
                    s.zoom.horizontal_zoom = self.config.clamp_zoom(usable / s.timeline_length);
                }
                s.zoom.scroll_x = 0;
                clamp_scroll(s);
            }
            TimelineEvent::SetZoomBounds { min, max } => {
                if !(min.is_finite() && *min > 0.0 && max.is_finite() && max >= min) {
                    tracing::warn!(min, max, "Ignoring invalid zoom bounds");
                    return;
                }
                self.config.min_zoom = *min;
                self.config.max_zoom = *max;
                s.zoom.horizontal_zoom = self.config.clamp_zoom(s.zoom.horizontal_zoom);
                clamp_scroll(s);
            }
            TimelineEvent::SetVerticalZoom(m) => {
                if m.is_finite() {
                    s.zoom.vertical_zoom = m.clamp(MIN_VERTICAL_ZOOM, MAX_VERTICAL_ZOOM);
                }
            }

            TimelineEvent::SetScroll { x, y } => {
                s.zoom.scroll_x = *x;
                if let Some(y) = y {
                    s.zoom.scroll_y = *y;
                }
                clamp_scroll(s);
            }
            TimelineEvent::ScrollBy { dx, dy } => {
                s.zoom.scroll_x = s.zoom.scroll_x.saturating_add(*dx);
                s.zoom.scroll_y = s.zoom.scroll_y.saturating_add(*dy);
                clamp_scroll(s);
            }
            TimelineEvent::ScrollToTime { time, center } => {
                let z = s.zoom.horizontal_zoom;
                s.zoom.scroll_x = if *center {
                    zoom::centered_scroll(*time, z, s.zoom.viewport_width)
                } else {
                    zoom::anchored_scroll(*time, z, LEFT_PADDING)
                };
                clamp_scroll(s);
            }
            TimelineEvent::SetViewportSize { width, height } => {
                s.zoom.viewport_width = (*width).max(0);
                s.zoom.viewport_height = (*height).max(0);
                clamp_scroll(s);
            }

            TimelineEvent::SetPlayhead(t) | TimelineEvent::SetEditPosition(t) => {
                set_edit_position(s, *t);
            }
            TimelineEvent::MovePlayheadBy(dt) => {
                set_edit_position(s, s.playhead.edit_position + dt);
            }
            TimelineEvent::SetPlaybackPosition(t) => {
                s.playhead.playback_position = s.clamp_time(*t);
            }
            TimelineEvent::StartPlayback => {
                if !s.playhead.is_playing {
                    s.playhead.is_playing = true;
                    s.playhead.playback_position = s.playhead.edit_position;
                }
            }
            TimelineEvent::StopPlayback => {
                if s.playhead.is_playing {
                    s.playhead.is_playing = false;
                    s.playhead.is_recording = false;
                    s.playhead.playback_position = s.playhead.edit_position;
                }
            }
            TimelineEvent::SetTransportState { playing, recording } => {
                if s.playhead.is_playing != *playing {
                    s.playhead.playback_position = s.playhead.edit_position;
                }
                s.playhead.is_playing = *playing;
                s.playhead.is_recording = *recording;
            }
            TimelineEvent::SetEditCursor(position) => {
                s.edit_cursor = match position {
                    Some(t) if t.is_finite() && *t >= 0.0 => Some(s.clamp_time(*t)),
                    _ => None,
                };
            }

            TimelineEvent::SetSelection { start, end, tracks } => {
                if let Some((a, b)) = normalized_range(s, *start, *end) {
                    s.selection = TimeSelection {
                        start: a,
                        end: b,
                        track_indices: tracks.clone(),
                        visually_hidden: false,
                    };
                } else {
                    tracing::trace!(start, end, "Rejected degenerate selection");
                }
            }
            TimelineEvent::ClearSelection => {
                s.selection.clear();
            }
            TimelineEvent::HideSelection => {
                if s.selection.is_active() {
                    s.selection.visually_hidden = true;
                }
            }
            TimelineEvent::CreateLoopFromSelection => {
                if s.selection.is_active() {
                    s.loop_region = LoopRegion {
                        start: s.selection.start,
                        end: s.selection.end,
                        enabled: true,
                    };
                    s.selection.visually_hidden = true;
                }
            }

            TimelineEvent::SetLoopRegion { start, end } => {
                if let Some((a, b)) = normalized_range(s, *start, *end) {
                    let was_valid = s.loop_region.is_valid();
                    s.loop_region.start = a;
                    s.loop_region.end = b;
                    if !was_valid {
                        s.loop_region.enabled = true;
                    }
                } else {
                    tracing::trace!(start, end, "Rejected degenerate loop");
                }
            }
            TimelineEvent::ClearLoop => {
                s.loop_region.clear();
            }
            TimelineEvent::SetLoopEnabled(enabled) => {
                if s.loop_region.is_valid() {
                    s.loop_region.enabled = *enabled;
                }
            }
            TimelineEvent::MoveLoopBy(dt) => {
                if s.loop_region.is_valid() && dt.is_finite() {
                    let duration = s.loop_region.duration();
                    let latest = (s.timeline_length - duration).max(0.0);
                    let start = (s.loop_region.start + dt).clamp(0.0, latest);
                    s.loop_region.start = start;
                    s.loop_region.end = start + duration;
                }
            }

            TimelineEvent::SetPunchRegion { start, end } => match punch_range(s, *start, *end) {
                Some((a, b)) => {
                    let was_valid = s.punch.is_valid();
                    s.punch.start = a;
                    s.punch.end = b;
                    if !was_valid {
                        s.punch.punch_in_enabled = true;
                        s.punch.punch_out_enabled = true;
                    }
                }
                None => tracing::trace!(start, end, "Rejected punch range"),
            },
            TimelineEvent::ClearPunchRegion => {
                s.punch.clear();
            }
            TimelineEvent::SetPunchInEnabled(enabled) => {
                if s.punch.is_valid() {
                    s.punch.punch_in_enabled = *enabled;
                }
            }
            TimelineEvent::SetPunchOutEnabled(enabled) => {
                if s.punch.is_valid() {
                    s.punch.punch_out_enabled = *enabled;
                }
            }

            TimelineEvent::SetTempo(bpm) => {
                if bpm.is_finite() {
                    retime(s, bpm.clamp(MIN_BPM, MAX_BPM));
                }
            }
            TimelineEvent::SetTimeSignature { numerator, denominator } => {
                s.tempo.numerator = (*numerator).clamp(MIN_SIGNATURE, MAX_SIGNATURE);
                s.tempo.denominator = (*denominator).clamp(MIN_SIGNATURE, MAX_SIGNATURE);
            }
            TimelineEvent::SetTimeDisplayMode(mode) => {
                s.display.time_display_mode = *mode;
            }
            TimelineEvent::SetSnapEnabled(enabled) => {
                s.display.snap_enabled = *enabled;
            }
            TimelineEvent::SetArrangementLocked(locked) => {
                s.display.arrangement_locked = *locked;
            }
            TimelineEvent::SetGridQuantize(division) => {
                s.display.grid_quantize = division.and_then(|d| GridDivision::new(d.numerator, d.denominator));
            }

            TimelineEvent::AddSection { id, name, start, end } => match normalized_range(s, *start, *end) {
                Some((a, b)) if b - a >= MIN_SECTION_DURATION && s.section(*id).is_none() => {
                    s.sections.push(ArrangementSection {
                        id: *id,
                        name: name.clone(),
                        start: a,
                        end: b,
                    });
                }
                _ => tracing::trace!(name = %name, start, end, "Rejected section"),
            },
            TimelineEvent::RemoveSection(id) => {
                s.sections.retain(|section| section.id != *id);
                if s.selected_section == Some(*id) {
                    s.selected_section = None;
                }
            }
            TimelineEvent::MoveSection { id, start } => {
                let length = s.timeline_length;
                if let Some(section) = s.sections.iter_mut().find(|section| section.id == *id) {
                    if start.is_finite() {
                        let duration = section.duration();
                        let new_start = start.clamp(0.0, (length - duration).max(0.0));
                        section.start = new_start;
                        section.end = new_start + duration;
                    }
                }
            }
            TimelineEvent::ResizeSection { id, start, end } => {
                if let Some((a, b)) = normalized_range(s, *start, *end) {
                    if b - a >= MIN_SECTION_DURATION {
                        if let Some(section) = s.sections.iter_mut().find(|section| section.id == *id) {
                            section.start = a;
                            section.end = b;
                        }
                    }
                }
            }
            TimelineEvent::SelectSection(id) => match id {
                Some(id) if s.section(*id).is_none() => {}
                _ => s.selected_section = *id,
            },

            TimelineEvent::SetTimelineLength(length) => {
                if length.is_finite() && *length > 0.0 {
                    set_timeline_length(s, *length);
                } else {
                    tracing::warn!(length, "Ignoring non-positive timeline length");
                }
            }

            TimelineEvent::SetCursorHint(hint) => {
                s.pointer.cursor = *hint;
            }
            TimelineEvent::SetZoomGestureActive(active) => {
                s.pointer.zoom_gesture_active = *active;
            }
        }
    }

    // ---------------------------------------------------------------------
    // Undo / redo
    // ---------------------------------------------------------------------

    fn record_undo(&mut self, event: &TimelineEvent, before: Arc<TimelineState>) {
        match &mut self.undo_group {
            Some(group) => {
                if !group.recorded {
                    self.history.record(group.description.clone(), Arc::clone(&group.before), false);
                    group.recorded = true;
                }
            }
            None => self.history.record(event.description(), before, event.restores_view()),
        }
    }

    /// Open an undo group. Undoable events applied until
    /// [`end_undo_group`](Self::end_undo_group) collapse into one undo point.
    pub fn begin_undo_group(&mut self, description: impl Into<String>) {
        self.undo_group = Some(UndoGroup {
            description: description.into(),
            before: Arc::clone(&self.state),
            recorded: false,
        });
    }

    /// Close the current undo group
    pub fn end_undo_group(&mut self) {
        self.undo_group = None;
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Restore the state before the last undoable change
    pub fn undo(&mut self) -> history::Result<()> {
        self.undo_group = None;
        let entry = self.history.undo(Arc::clone(&self.state))?;
        tracing::debug!("Undo {} to version {}", entry.description, entry.state.version);
        self.restore(&entry);
        Ok(())
    }

    /// Re-apply the last undone change
    pub fn redo(&mut self) -> history::Result<()> {
        self.undo_group = None;
        let entry = self.history.redo(Arc::clone(&self.state))?;
        tracing::debug!("Redo {} to version {}", entry.description, entry.state.version);
        self.restore(&entry);
        Ok(())
    }

    /// Replace the whole state, e.g. after loading a project.
    ///
    /// The current viewport size and pointer feedback are kept and history is
    /// cleared.
    pub fn replace_state(&mut self, state: TimelineState) {
        self.history.clear();
        self.undo_group = None;
        self.install(state);
        tracing::info!(length = self.state.timeline_length, "Timeline state replaced");
    }

    /// Bring back the edited parts of a history snapshot. Transport, playhead,
    /// selection and edit cursor stay where they are now; zoom and scroll only
    /// come back for entries that changed the view.
    fn restore(&mut self, entry: &HistoryEntry) {
        let current = &self.state;
        let mut next = (*entry.state).clone();
        next.playhead = current.playhead.clone();
        next.selection = current.selection.clone();
        next.edit_cursor = current.edit_cursor;
        if !entry.restores_view {
            next.zoom = current.zoom.clone();
        }
        let length = next.timeline_length;
        set_timeline_length(&mut next, length);
        self.install(next);
    }

    fn install(&mut self, mut next: TimelineState) {
        next.zoom.viewport_width = self.state.zoom.viewport_width;
        next.zoom.viewport_height = self.state.zoom.viewport_height;
        next.zoom.horizontal_zoom = self.config.clamp_zoom(next.zoom.horizontal_zoom);
        next.pointer = self.state.pointer.clone();
        clamp_scroll(&mut next);
        next.version = self.state.version + 1;
        self.publish(next, Changes::all());
    }

    // ---------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------

    /// Register a listener for one topic
    pub fn subscribe(&mut self, topic: Topic, listener: impl FnMut(&TimelineState) + 'static) -> SubscriptionId {
        self.listeners.subscribe(topic, Box::new(listener))
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Called with the new zoom (pixels per second)
    pub fn on_zoom_changed(&mut self, mut f: impl FnMut(f64) + 'static) -> SubscriptionId {
        self.subscribe(Topic::Zoom, move |s| f(s.zoom.horizontal_zoom))
    }

    /// Called with the new horizontal scroll offset
    pub fn on_scroll_changed(&mut self, mut f: impl FnMut(i32) + 'static) -> SubscriptionId {
        self.subscribe(Topic::Scroll, move |s| f(s.zoom.scroll_x))
    }

    /// Called with the new content width
    pub fn on_content_size_changed(&mut self, mut f: impl FnMut(i32) + 'static) -> SubscriptionId {
        self.subscribe(Topic::ContentSize, move |s| f(s.content_width()))
    }

    /// Called with the new playhead state
    pub fn on_playhead_changed(&mut self, mut f: impl FnMut(&PlayheadState) + 'static) -> SubscriptionId {
        self.subscribe(Topic::Playhead, move |s| f(&s.playhead))
    }

    /// Called with the new selection
    pub fn on_selection_changed(&mut self, mut f: impl FnMut(&TimeSelection) + 'static) -> SubscriptionId {
        self.subscribe(Topic::Selection, move |s| f(&s.selection))
    }

    /// Called with the new loop region
    pub fn on_loop_changed(&mut self, mut f: impl FnMut(&LoopRegion) + 'static) -> SubscriptionId {
        self.subscribe(Topic::Loop, move |s| f(&s.loop_region))
    }

    /// Called with the new punch region
    pub fn on_punch_changed(&mut self, mut f: impl FnMut(&PunchRegion) + 'static) -> SubscriptionId {
        self.subscribe(Topic::Punch, move |s| f(&s.punch))
    }

    /// Called with the new cursor hint
    pub fn on_cursor_hint_changed(&mut self, mut f: impl FnMut(CursorHint) + 'static) -> SubscriptionId {
        self.subscribe(Topic::CursorHint, move |s| f(s.pointer.cursor))
    }

    // ---------------------------------------------------------------------
    // Convenience
    // ---------------------------------------------------------------------

    /// Zoom to `zoom` and center `time` in the viewport
    pub fn set_zoom_centered(&mut self, zoom: f64, time: f64) -> Changes {
        self.dispatch(TimelineEvent::SetZoomCentered { zoom, time })
    }

    /// Zoom to `zoom`, keeping the time under `pointer_x` where it is
    pub fn set_zoom_from_pointer(&mut self, zoom: f64, pointer_x: i32, viewport_width: i32) -> Changes {
        self.dispatch(TimelineEvent::SetZoomFromPointer { zoom, pointer_x, viewport_width })
    }

    /// Move the playhead
    pub fn set_playhead(&mut self, time: f64) -> Changes {
        self.dispatch(TimelineEvent::SetPlayhead(time))
    }

    /// Replace the time selection
    pub fn set_selection(&mut self, start: f64, end: f64, tracks: BTreeSet<usize>) -> Changes {
        self.dispatch(TimelineEvent::SetSelection { start, end, tracks })
    }

    /// Replace the loop range
    pub fn set_loop_region(&mut self, start: f64, end: f64) -> Changes {
        self.dispatch(TimelineEvent::SetLoopRegion { start, end })
    }

    /// Replace the punch range
    pub fn set_punch_region(&mut self, start: f64, end: f64) -> Changes {
        self.dispatch(TimelineEvent::SetPunchRegion { start, end })
    }

    /// Add an arrangement section. Returns its ID if it was accepted.
    pub fn add_section(&mut self, name: impl Into<String>, start: f64, end: f64) -> Option<SectionId> {
        let id = SectionId::new();
        let changes = self.dispatch(TimelineEvent::AddSection {
            id,
            name: name.into(),
            start,
            end,
        });
        changes.contains(Topic::Sections).then_some(id)
    }

    /// Zoom to fit the enabled loop, if there is one
    pub fn zoom_to_loop(&mut self) -> Changes {
        let region = self.state.loop_region.clone();
        if !region.is_valid() {
            return Changes::NONE;
        }
        self.dispatch(TimelineEvent::ZoomToFit {
            start: region.start,
            end: region.end,
            padding: crate::events::DEFAULT_FIT_PADDING,
        })
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

/// Topics whose data differs between two states
fn diff(old: &TimelineState, new: &TimelineState) -> Changes {
    let mut changes = Changes::NONE;
    let (a, b) = (&old.zoom, &new.zoom);
    if a.horizontal_zoom != b.horizontal_zoom
        || a.vertical_zoom != b.vertical_zoom
        || a.viewport_width != b.viewport_width
        || a.viewport_height != b.viewport_height
    {
        changes.insert(Topic::Zoom);
    }
    if a.scroll_x != b.scroll_x || a.scroll_y != b.scroll_y {
        changes.insert(Topic::Scroll);
    }
    if old.content_width() != new.content_width() {
        changes.insert(Topic::ContentSize);
    }
    if old.playhead != new.playhead {
        changes.insert(Topic::Playhead);
    }
    if old.selection != new.selection || old.edit_cursor != new.edit_cursor {
        changes.insert(Topic::Selection);
    }
    if old.loop_region != new.loop_region {
        changes.insert(Topic::Loop);
    }
    if old.punch != new.punch {
        changes.insert(Topic::Punch);
    }
    if old.tempo != new.tempo {
        changes.insert(Topic::Tempo);
    }
    if old.display != new.display {
        changes.insert(Topic::Display);
    }
    if old.sections != new.sections || old.selected_section != new.selected_section {
        changes.insert(Topic::Sections);
    }
    if old.timeline_length != new.timeline_length {
        changes.insert(Topic::Timeline);
    }
    if old.pointer.cursor != new.pointer.cursor {
        changes.insert(Topic::CursorHint);
    }
    if old.pointer.zoom_gesture_active != new.pointer.zoom_gesture_active {
        changes.insert(Topic::ZoomGesture);
    }
    changes
}

fn clamp_scroll(s: &mut TimelineState) {
    let max = s.max_scroll_x();
    s.zoom.scroll_x = s.zoom.scroll_x.clamp(0, max);
    s.zoom.scroll_y = s.zoom.scroll_y.max(0);
}

/// Order, clamp into the timeline and reject empty ranges
fn normalized_range(s: &TimelineState, start: f64, end: f64) -> Option<(f64, f64)> {
    if !start.is_finite() || !end.is_finite() {
        return None;
    }
    let (a, b) = if start <= end { (start, end) } else { (end, start) };
    let (a, b) = (s.clamp_time(a), s.clamp_time(b));
    (b > a).then_some((a, b))
}

/// Order and clamp a punch range, widening it to the minimum length
fn punch_range(s: &TimelineState, start: f64, end: f64) -> Option<(f64, f64)> {
    if !start.is_finite() || !end.is_finite() {
        return None;
    }
    let (a, b) = if start <= end { (start, end) } else { (end, start) };
    let (mut a, mut b) = (s.clamp_time(a), s.clamp_time(b));
    if b - a < MIN_PUNCH_DURATION {
        if a + MIN_PUNCH_DURATION <= s.timeline_length {
            b = a + MIN_PUNCH_DURATION;
        } else {
            b = s.timeline_length;
            a = (b - MIN_PUNCH_DURATION).max(0.0);
        }
    }
    (b > a).then_some((a, b))
}

/// Move the edit position; the playback cursor follows while stopped
fn set_edit_position(s: &mut TimelineState, time: f64) {
    if time.is_nan() {
        return;
    }
    s.playhead.edit_position = s.clamp_time(time);
    if !s.playhead.is_playing {
        s.playhead.playback_position = s.playhead.edit_position;
    }
}

/// Change the tempo and move time positions so they keep their beat
fn retime(s: &mut TimelineState, bpm: f64) {
    let ratio = s.tempo.bpm / bpm;
    s.tempo.bpm = bpm;
    if ratio == 1.0 {
        return;
    }

    let length = s.timeline_length;
    let scale = |t: f64| (t * ratio).clamp(0.0, length);

    s.playhead.edit_position = scale(s.playhead.edit_position);
    s.playhead.playback_position = scale(s.playhead.playback_position);
    s.edit_cursor = s.edit_cursor.map(scale);

    if s.selection.is_active() {
        s.selection.start = scale(s.selection.start);
        s.selection.end = scale(s.selection.end);
        if !s.selection.is_active() {
            s.selection.clear();
        }
    }
    if s.loop_region.is_valid() {
        s.loop_region.start = scale(s.loop_region.start);
        s.loop_region.end = scale(s.loop_region.end);
        if !s.loop_region.is_valid() {
            s.loop_region.clear();
        }
    }
    for section in &mut s.sections {
        section.start = scale(section.start);
        section.end = scale(section.end);
    }
    if s.punch.is_valid() {
        s.punch.start = scale(s.punch.start);
        s.punch.end = scale(s.punch.end);
        if !s.punch.is_valid() {
            s.punch.clear();
        }
    }
    s.sections.retain(|section| section.end > section.start);
}

/// Shrink or grow the timeline, pulling everything inside it
fn set_timeline_length(s: &mut TimelineState, length: f64) {
    s.timeline_length = length;
    s.playhead.edit_position = s.playhead.edit_position.min(length);
    s.playhead.playback_position = s.playhead.playback_position.min(length);
    s.edit_cursor = s.edit_cursor.map(|t| t.min(length));

    if s.selection.is_active() {
        s.selection.end = s.selection.end.min(length);
        if !s.selection.is_active() {
            s.selection.clear();
        }
    }
    if s.loop_region.is_valid() {
        s.loop_region.end = s.loop_region.end.min(length);
        if !s.loop_region.is_valid() {
            s.loop_region.clear();
        }
    }
    if s.punch.is_valid() {
        s.punch.end = s.punch.end.min(length);
        if !s.punch.is_valid() {
            s.punch.clear();
        }
    }
    s.sections.retain(|section| section.start < length);
    for section in &mut s.sections {
        section.end = section.end.min(length);
    }
    if let Some(id) = s.selected_section {
        if s.section(id).is_none() {
            s.selected_section = None;
        }
    }
    clamp_scroll(s);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimeDisplayMode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller() -> TimelineController {
        TimelineController::new(TimelineConfig::default())
    }

    #[test]
    fn test_zoom_centered_on_time() {
        let mut c = controller();
        assert_eq!(c.state().zoom.viewport_width, 800);

        let changes = c.set_zoom_centered(40.0, 10.0);
        assert!(changes.contains(Topic::Zoom));
        assert!(changes.contains(Topic::Scroll));
        assert_eq!(c.state().zoom.horizontal_zoom, 40.0);
        assert_eq!(c.state().zoom.scroll_x, 18);
    }

    #[test]
    fn test_zoom_from_pointer_keeps_anchor() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(20.0));
        c.dispatch(TimelineEvent::SetScroll { x: 300, y: None });

        for &(zoom, px) in &[(55.5, 400), (31.0, 123), (120.0, 700)] {
            let anchor = c.state().pixel_to_time(px);
            c.set_zoom_from_pointer(zoom, px, 800);
            assert_eq!(c.state().time_to_pixel(anchor), px, "zoom={zoom} px={px}");
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(1e12));
        assert_eq!(c.state().zoom.horizontal_zoom, 10_000.0);
        c.dispatch(TimelineEvent::SetZoom(-4.0));
        assert_eq!(c.state().zoom.horizontal_zoom, 0.01);
        c.dispatch(TimelineEvent::SetZoom(f64::NAN));
        assert_eq!(c.state().zoom.horizontal_zoom, 0.01);
    }

    #[test]
    fn test_zoom_bounds_revalidate() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(500.0));
        let changes = c.dispatch(TimelineEvent::SetZoomBounds { min: 1.0, max: 100.0 });
        assert!(changes.contains(Topic::Zoom));
        assert_eq!(c.state().zoom.horizontal_zoom, 100.0);

        // Inverted bounds are ignored
        assert!(c.dispatch(TimelineEvent::SetZoomBounds { min: 50.0, max: 10.0 }).is_empty());
        assert_eq!(c.config().max_zoom, 100.0);
    }

    #[test]
    fn test_zoom_to_fit_and_reset() {
        let mut c = controller();
        c.dispatch(TimelineEvent::ZoomToFit { start: 10.0, end: 20.0, padding: 0.0 });
        // 782 usable pixels for 10 seconds
        assert!((c.state().zoom.horizontal_zoom - 78.2).abs() < 1e-9);
        assert_eq!(c.state().time_to_pixel(10.0), LEFT_PADDING);

        c.dispatch(TimelineEvent::ResetZoom);
        assert!((c.state().zoom.horizontal_zoom - 782.0 / 300.0).abs() < 1e-9);
        assert_eq!(c.state().zoom.scroll_x, 0);
        assert!(c.can_undo());
    }

    #[test]
    fn test_scroll_clamping() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(20.0));
        c.dispatch(TimelineEvent::SetScroll { x: 99_999, y: Some(-5) });
        assert_eq!(c.state().zoom.scroll_x, 5200);
        assert_eq!(c.state().zoom.scroll_y, 0);

        c.dispatch(TimelineEvent::ScrollBy { dx: -6000, dy: 30 });
        assert_eq!(c.state().zoom.scroll_x, 0);
        assert_eq!(c.state().zoom.scroll_y, 30);

        c.dispatch(TimelineEvent::ScrollToTime { time: 100.0, center: false });
        assert_eq!(c.state().time_to_pixel(100.0), LEFT_PADDING);
        c.dispatch(TimelineEvent::ScrollToTime { time: 100.0, center: true });
        assert_eq!(c.state().time_to_pixel(100.0), 400);
    }

    #[test]
    fn test_viewport_resize_clamps_scroll() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(20.0));
        c.dispatch(TimelineEvent::SetScroll { x: 5200, y: None });
        let changes = c.dispatch(TimelineEvent::SetViewportSize { width: 1200, height: 400 });
        assert!(changes.contains(Topic::Zoom));
        assert!(changes.contains(Topic::Scroll));
        assert_eq!(c.state().zoom.scroll_x, 4800);

        c.dispatch(TimelineEvent::SetViewportSize { width: -10, height: -10 });
        assert_eq!(c.state().zoom.viewport_width, 0);
    }

    #[test]
    fn test_playhead_clamped_and_noop_is_silent() {
        let mut c = controller();
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        c.on_playhead_changed(move |_| *h.borrow_mut() += 1);

        c.set_playhead(500.0);
        assert_eq!(c.state().playhead.position(), 300.0);
        let version = c.state().version;

        assert!(c.set_playhead(300.0).is_empty());
        assert_eq!(c.state().version, version);
        assert_eq!(*hits.borrow(), 1);

        c.dispatch(TimelineEvent::MovePlayheadBy(-1000.0));
        assert_eq!(c.state().playhead.position(), 0.0);
        c.dispatch(TimelineEvent::SetTransportState { playing: true, recording: false });
        assert!(c.state().playhead.is_playing);
        assert_eq!(*hits.borrow(), 3);
    }

    #[test]
    fn test_selection_normalized() {
        let mut c = controller();
        c.set_selection(8.0, 3.0, [2].into_iter().collect());
        let sel = &c.state().selection;
        assert_eq!((sel.start, sel.end), (3.0, 8.0));
        assert!(sel.includes_track(2));

        c.set_selection(-5.0, 400.0, BTreeSet::new());
        let sel = &c.state().selection;
        assert_eq!((sel.start, sel.end), (0.0, 300.0));
    }

    #[test]
    fn test_degenerate_selection_rejected() {
        let mut c = controller();
        c.set_selection(2.0, 4.0, BTreeSet::new());

        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        c.on_selection_changed(move |_| *h.borrow_mut() += 1);

        assert!(c.set_selection(5.0, 5.0, BTreeSet::new()).is_empty());
        assert!(c.set_selection(f64::NAN, 5.0, BTreeSet::new()).is_empty());
        assert_eq!(c.state().selection.start, 2.0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_loop_from_selection() {
        let mut c = controller();
        c.set_selection(4.0, 12.0, BTreeSet::new());
        let changes = c.dispatch(TimelineEvent::CreateLoopFromSelection);
        assert!(changes.contains(Topic::Loop));
        assert!(changes.contains(Topic::Selection));
        assert!(c.loop_region().enabled);
        assert_eq!(c.loop_region().start, 4.0);
        assert!(c.state().selection.is_active());
        assert!(!c.state().selection.is_visually_active());
    }

    #[test]
    fn test_loop_region_rules() {
        let mut c = controller();
        // A fresh loop is enabled
        c.set_loop_region(12.0, 4.0);
        assert_eq!((c.loop_region().start, c.loop_region().end), (4.0, 12.0));
        assert!(c.loop_region().enabled);

        // Editing an existing loop keeps its enabled flag
        c.dispatch(TimelineEvent::SetLoopEnabled(false));
        c.set_loop_region(5.0, 12.0);
        assert!(!c.loop_region().enabled);

        assert!(c.set_loop_region(7.0, 7.0).is_empty());

        c.dispatch(TimelineEvent::MoveLoopBy(1000.0));
        assert_eq!((c.loop_region().start, c.loop_region().end), (293.0, 300.0));

        c.dispatch(TimelineEvent::ClearLoop);
        assert!(!c.loop_region().is_valid());
        assert!(c.dispatch(TimelineEvent::SetLoopEnabled(true)).is_empty());
    }

    #[test]
    fn test_tempo_keeps_musical_positions() {
        let mut c = controller();
        c.set_playhead(4.0);
        c.set_loop_region(2.0, 6.0);
        let changes = c.dispatch(TimelineEvent::SetTempo(240.0));
        assert!(changes.contains(Topic::Tempo));
        assert!(changes.contains(Topic::Playhead));
        assert_eq!(c.state().playhead.position(), 2.0);
        assert_eq!((c.loop_region().start, c.loop_region().end), (1.0, 3.0));

        c.dispatch(TimelineEvent::SetTempo(5000.0));
        assert_eq!(c.tempo().bpm, 999.0);
        c.dispatch(TimelineEvent::SetTimeSignature { numerator: 0, denominator: 32 });
        assert_eq!((c.tempo().numerator, c.tempo().denominator), (1, 16));
    }

    #[test]
    fn test_punch_region_rules() {
        let mut c = controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&seen);
        c.on_punch_changed(move |p| l.borrow_mut().push((p.start, p.end)));

        // Reversed input is ordered and a fresh range arms both points
        let changes = c.set_punch_region(12.0, 4.0);
        assert_eq!(changes, Changes::NONE.with(Topic::Punch));
        let punch = c.state().punch.clone();
        assert_eq!((punch.start, punch.end), (4.0, 12.0));
        assert!(punch.punch_in_enabled && punch.punch_out_enabled);

        c.dispatch(TimelineEvent::SetPunchInEnabled(false));
        assert!(!c.state().punch.punch_in_enabled);

        // Moving an existing range keeps the flags; an empty one is widened
        c.set_punch_region(5.0, 5.0);
        let punch = c.state().punch.clone();
        assert_eq!(punch.start, 5.0);
        assert_eq!(punch.end, 5.0 + MIN_PUNCH_DURATION);
        assert!(!punch.punch_in_enabled && punch.punch_out_enabled);

        // Past the end it is widened backwards
        c.set_punch_region(400.0, 500.0);
        assert_eq!(c.state().punch.end, 300.0);
        assert!((c.state().punch.start - (300.0 - MIN_PUNCH_DURATION)).abs() < 1e-12);

        c.dispatch(TimelineEvent::ClearPunchRegion);
        assert!(!c.state().punch.is_valid());
        assert_eq!(c.dispatch(TimelineEvent::SetPunchOutEnabled(true)), Changes::NONE);
        assert_eq!(seen.borrow().len(), 5);

        assert_eq!(c.history().undo_description(), Some("Clear Punch"));
        c.undo().unwrap();
        assert_eq!(c.state().punch.end, 300.0);
        assert!(c.state().punch.punch_out_enabled);
    }

    #[test]
    fn test_punch_follows_tempo_and_length() {
        let mut c = controller();
        c.set_punch_region(4.0, 8.0);
        c.dispatch(TimelineEvent::SetTempo(60.0));
        assert_eq!((c.state().punch.start, c.state().punch.end), (8.0, 16.0));

        c.dispatch(TimelineEvent::SetTimelineLength(10.0));
        assert_eq!((c.state().punch.start, c.state().punch.end), (8.0, 10.0));
        c.dispatch(TimelineEvent::SetTimelineLength(5.0));
        assert!(!c.state().punch.is_valid());
    }

    #[test]
    fn test_edit_and_playback_positions() {
        let mut c = controller();
        c.set_playhead(10.0);
        assert_eq!(c.state().playhead.edit_position, 10.0);
        assert_eq!(c.state().playhead.playback_position, 10.0);

        c.dispatch(TimelineEvent::StartPlayback);
        c.dispatch(TimelineEvent::SetPlaybackPosition(14.0));
        assert_eq!(c.state().playhead.position(), 14.0);
        assert_eq!(c.state().playhead.edit_position, 10.0);

        // Moving the edit position while playing leaves the cursor running
        c.dispatch(TimelineEvent::SetEditPosition(20.0));
        assert_eq!(c.state().playhead.playback_position, 14.0);
        assert_eq!(c.dispatch(TimelineEvent::StartPlayback), Changes::NONE);

        c.dispatch(TimelineEvent::SetTransportState { playing: true, recording: true });
        assert!(c.state().playhead.is_recording);
        c.dispatch(TimelineEvent::StopPlayback);
        let playhead = c.state().playhead.clone();
        assert!(!playhead.is_playing && !playhead.is_recording);
        assert_eq!(playhead.playback_position, 20.0);
        assert_eq!(playhead.position(), 20.0);
        assert_eq!(c.dispatch(TimelineEvent::StopPlayback), Changes::NONE);

        c.dispatch(TimelineEvent::MovePlayheadBy(-25.0));
        assert_eq!(c.state().playhead.edit_position, 0.0);
        assert_eq!(c.state().playhead.playback_position, 0.0);
    }

    #[test]
    fn test_edit_cursor() {
        let mut c = controller();
        let changes = c.dispatch(TimelineEvent::SetEditCursor(Some(400.0)));
        assert!(changes.contains(Topic::Selection));
        assert_eq!(c.state().edit_cursor, Some(300.0));
        assert_eq!(c.state().playhead.position(), 0.0);

        // Undo brings the loop back but not the old cursor
        c.set_loop_region(1.0, 2.0);
        c.dispatch(TimelineEvent::SetEditCursor(Some(12.0)));
        c.undo().unwrap();
        assert!(!c.loop_region().is_valid());
        assert_eq!(c.state().edit_cursor, Some(12.0));

        c.dispatch(TimelineEvent::SetEditCursor(Some(-1.0)));
        assert_eq!(c.state().edit_cursor, None);
        c.dispatch(TimelineEvent::SetEditCursor(Some(12.0)));
        c.dispatch(TimelineEvent::SetEditCursor(None));
        assert_eq!(c.state().edit_cursor, None);
    }

    #[test]
    fn test_grid_quantize_overrides_snap() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(20.0));
        assert_eq!(c.state().snap_time_to_grid(10.3), 10.0);

        // 1/8 note at 120 bpm is a quarter second
        let changes = c.dispatch(TimelineEvent::SetGridQuantize(GridDivision::new(1, 8)));
        assert!(changes.contains(Topic::Display));
        assert_eq!(c.state().snap_interval(), 0.25);
        assert_eq!(c.state().snap_time_to_grid(10.3), 10.25);

        c.dispatch(TimelineEvent::SetGridQuantize(Some(GridDivision { numerator: 0, denominator: 4 })));
        assert_eq!(c.state().display.grid_quantize, None);
        assert_eq!(c.state().snap_time_to_grid(10.3), 10.0);
    }

    #[test]
    fn test_display_toggles() {
        let mut c = controller();
        let changes = c.dispatch(TimelineEvent::SetTimeDisplayMode(TimeDisplayMode::BarsBeats));
        assert!(changes.contains(Topic::Display));
        assert_eq!(c.state().format_time_position(2.0), "2.1.1");
        assert!(c.dispatch(TimelineEvent::SetTimeDisplayMode(TimeDisplayMode::BarsBeats)).is_empty());
    }

    #[test]
    fn test_sections() {
        let mut c = controller();
        let intro = c.add_section("Intro", 0.0, 8.0).unwrap();
        assert!(c.add_section("Blip", 3.0, 3.5).is_none());

        c.dispatch(TimelineEvent::SelectSection(Some(intro)));
        assert_eq!(c.state().selected_section, Some(intro));

        c.dispatch(TimelineEvent::MoveSection { id: intro, start: 296.0 });
        let section = c.state().section(intro).unwrap();
        assert_eq!((section.start, section.end), (292.0, 300.0));

        assert!(c.dispatch(TimelineEvent::ResizeSection { id: intro, start: 292.0, end: 292.5 }).is_empty());
        c.dispatch(TimelineEvent::ResizeSection { id: intro, start: 290.0, end: 295.0 });
        assert_eq!(c.state().section(intro).unwrap().duration(), 5.0);

        c.dispatch(TimelineEvent::RemoveSection(intro));
        assert!(c.state().sections.is_empty());
        assert_eq!(c.state().selected_section, None);
    }

    #[test]
    fn test_timeline_length_pulls_positions_in() {
        let mut c = controller();
        c.set_playhead(250.0);
        c.set_loop_region(100.0, 200.0);
        c.set_selection(150.0, 180.0, BTreeSet::new());

        let changes = c.dispatch(TimelineEvent::SetTimelineLength(160.0));
        assert!(changes.contains(Topic::Timeline));
        assert_eq!(c.state().playhead.position(), 160.0);
        assert_eq!(c.loop_region().end, 160.0);
        assert_eq!(c.state().selection.end, 160.0);

        c.dispatch(TimelineEvent::SetTimelineLength(120.0));
        assert!(!c.state().selection.is_active());

        assert!(c.dispatch(TimelineEvent::SetTimelineLength(0.0)).is_empty());
    }

    #[test]
    fn test_listeners_only_for_changed_topics() {
        let mut c = controller();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        c.on_zoom_changed(move |z| l.borrow_mut().push(format!("zoom {z}")));
        let l = Rc::clone(&log);
        let scroll_id = c.on_scroll_changed(move |x| l.borrow_mut().push(format!("scroll {x}")));
        let l = Rc::clone(&log);
        c.on_loop_changed(move |_| l.borrow_mut().push("loop".to_string()));

        c.set_zoom_centered(40.0, 10.0);
        assert_eq!(*log.borrow(), vec!["zoom 40".to_string(), "scroll 18".to_string()]);

        log.borrow_mut().clear();
        assert!(c.unsubscribe(scroll_id));
        assert!(!c.unsubscribe(scroll_id));
        c.dispatch(TimelineEvent::SetScroll { x: 100, y: None });
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut c = controller();
        let before = c.snapshot();
        c.set_playhead(12.0);
        assert_eq!(before.playhead.position(), 0.0);
        assert_eq!(c.snapshot().playhead.position(), 12.0);
        assert_eq!(c.snapshot().version, before.version + 1);
    }

    #[test]
    fn test_undo_redo() {
        let mut c = controller();
        c.set_loop_region(4.0, 12.0);
        c.set_loop_region(6.0, 12.0);
        // Playhead moves do not create undo points
        c.set_playhead(20.0);

        c.undo().unwrap();
        assert_eq!(c.loop_region().start, 4.0);
        c.undo().unwrap();
        assert!(!c.loop_region().is_valid());
        assert!(c.undo().is_err());

        c.redo().unwrap();
        assert_eq!(c.loop_region().start, 4.0);
        assert_eq!(c.history().redo_description(), Some("Set Loop"));
    }

    #[test]
    fn test_undo_keeps_playhead_and_view() {
        let mut c = controller();
        c.set_loop_region(4.0, 12.0);
        c.set_playhead(20.0);
        c.dispatch(TimelineEvent::SetZoom(55.0));
        c.dispatch(TimelineEvent::SetScroll { x: 300, y: None });
        c.set_selection(2.0, 3.0, BTreeSet::new());

        c.undo().unwrap();
        assert!(!c.loop_region().is_valid());
        assert_eq!(c.state().playhead.position(), 20.0);
        assert_eq!(c.state().zoom.horizontal_zoom, 55.0);
        assert_eq!(c.state().zoom.scroll_x, 300);
        assert_eq!(c.state().selection.start, 2.0);

        c.redo().unwrap();
        assert_eq!(c.loop_region().start, 4.0);
        assert_eq!(c.state().zoom.horizontal_zoom, 55.0);
    }

    #[test]
    fn test_undo_zoom_to_fit_restores_view() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetZoom(55.0));
        c.set_playhead(20.0);
        c.dispatch(TimelineEvent::ResetZoom);
        assert_ne!(c.state().zoom.horizontal_zoom, 55.0);

        c.undo().unwrap();
        assert_eq!(c.state().zoom.horizontal_zoom, 55.0);
        assert_eq!(c.state().playhead.position(), 20.0);
    }

    #[test]
    fn test_undo_clamps_playhead_into_restored_length() {
        let mut c = controller();
        c.dispatch(TimelineEvent::SetTimelineLength(600.0));
        c.set_playhead(500.0);

        c.undo().unwrap();
        assert_eq!(c.timeline_length(), 300.0);
        assert_eq!(c.state().playhead.position(), 300.0);
    }

    #[test]
    fn test_undo_group_collapses_drag() {
        let mut c = controller();
        c.set_loop_region(4.0, 12.0);

        c.begin_undo_group("Drag Loop");
        for start in [4.5, 5.0, 5.5, 6.0] {
            c.set_loop_region(start, 12.0);
        }
        c.end_undo_group();

        assert_eq!(c.history().undo_depth(), 2);
        assert_eq!(c.history().undo_description(), Some("Drag Loop"));
        c.undo().unwrap();
        assert_eq!(c.loop_region().start, 4.0);
    }

    #[test]
    fn test_undo_keeps_viewport_and_pointer() {
        let mut c = controller();
        c.set_loop_region(4.0, 12.0);
        c.dispatch(TimelineEvent::SetViewportSize { width: 1000, height: 300 });
        c.dispatch(TimelineEvent::SetCursorHint(CursorHint::IBeam));
        c.undo().unwrap();
        assert_eq!(c.state().zoom.viewport_width, 1000);
        assert_eq!(c.state().pointer.cursor, CursorHint::IBeam);
    }

    #[test]
    fn test_replace_state() {
        let mut c = controller();
        c.set_loop_region(1.0, 2.0);
        let mut loaded = TimelineState::default();
        loaded.timeline_length = 90.0;
        c.replace_state(loaded);
        assert_eq!(c.timeline_length(), 90.0);
        assert!(!c.can_undo());
    }
}
