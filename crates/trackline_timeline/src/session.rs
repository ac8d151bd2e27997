// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline session: one controller plus the surfaces that drive it.
//!
//! Hosts route raw input here by [`Surface`]; after every command the
//! session forwards the resulting state to the viewport synchronizer and
//! the zoom scrollbar so the views never drift from the controller.

use std::time::Instant;

use crate::config::TimelineConfig;
use crate::controller::TimelineController;
use crate::events::TimelineEvent;
use crate::gesture::{PointerEvent, RulerGesture, Surface, TrackLanes, TrackSelectionGesture};
use crate::history;
use crate::listeners::Changes;
use crate::state::TimelineState;
use crate::viewport::{SyncOutcome, ViewportSynchronizer};
use crate::zoom_bar::ZoomScrollBar;

/// Controller, gesture machines and view synchronization for one timeline
#[derive(Debug)]
pub struct TimelineSession {
    controller: TimelineController,
    ruler: RulerGesture,
    tracks: TrackSelectionGesture,
    zoom_bar: ZoomScrollBar,
    viewports: Option<ViewportSynchronizer>,
}

impl TimelineSession {
    /// Create a session with no track lanes and no attached viewports
    pub fn new(config: TimelineConfig) -> Self {
        let controller = TimelineController::new(config);
        let mut zoom_bar = ZoomScrollBar::new(controller.state().zoom.viewport_width);
        zoom_bar.sync(controller.state());

        tracing::info!(
            timeline_length = controller.timeline_length(),
            zoom = controller.state().zoom.horizontal_zoom,
            "Created timeline session"
        );

        Self {
            controller,
            ruler: RulerGesture::new(),
            tracks: TrackSelectionGesture::new(TrackLanes::default()),
            zoom_bar,
            viewports: None,
        }
    }

    /// Attach the host's scroll surfaces
    #[must_use]
    pub fn with_viewports(mut self, mut viewports: ViewportSynchronizer) -> Self {
        viewports.apply_state(self.controller.state());
        self.viewports = Some(viewports);
        self
    }

    /// The controller
    pub fn controller(&self) -> &TimelineController {
        &self.controller
    }

    /// Current state snapshot
    pub fn state(&self) -> &TimelineState {
        self.controller.state()
    }

    /// The zoom scrollbar model
    pub fn zoom_bar(&self) -> &ZoomScrollBar {
        &self.zoom_bar
    }

    /// The track selection machine
    pub fn track_gesture(&self) -> &TrackSelectionGesture {
        &self.tracks
    }

    /// The ruler machine
    pub fn ruler_gesture(&self) -> &RulerGesture {
        &self.ruler
    }

    /// Register a listener on the underlying controller
    pub fn controller_mut(&mut self) -> &mut TimelineController {
        &mut self.controller
    }

    /// Apply an event directly
    pub fn dispatch(&mut self, event: TimelineEvent) -> Changes {
        let changes = self.controller.dispatch(event);
        self.forward();
        changes
    }

    /// Undo the last undoable change
    pub fn undo(&mut self) -> history::Result<()> {
        self.controller.undo()?;
        self.forward();
        Ok(())
    }

    /// Redo the last undone change
    pub fn redo(&mut self) -> history::Result<()> {
        self.controller.redo()?;
        self.forward();
        Ok(())
    }

    /// The content viewport was resized
    pub fn set_viewport_size(&mut self, width: i32, height: i32) {
        self.zoom_bar.set_width(width);
        self.controller.dispatch(TimelineEvent::SetViewportSize { width, height });
        self.forward();
    }

    /// Replace the track lane layout (base heights, top to bottom)
    pub fn set_track_lanes(&mut self, heights: Vec<i32>) {
        tracing::debug!(lanes = heights.len(), "Track lanes changed");
        self.tracks.set_lanes(TrackLanes::new(heights));
    }

    /// Pointer pressed on `surface`
    pub fn begin_pointer_gesture(&mut self, surface: Surface, ev: &PointerEvent) {
        match surface {
            Surface::Ruler => self.ruler.pointer_down(ev, &mut self.controller),
            Surface::TrackContent => self.tracks.pointer_down(ev, &mut self.controller),
            Surface::ZoomBar => self.zoom_bar.pointer_down(ev, &mut self.controller),
        }
        self.forward();
    }

    /// Pointer moved with the button held on `surface`
    pub fn update_pointer_gesture(&mut self, surface: Surface, ev: &PointerEvent) {
        match surface {
            Surface::Ruler => self.ruler.pointer_drag(ev, &mut self.controller),
            Surface::TrackContent => self.tracks.pointer_drag(ev, &mut self.controller),
            Surface::ZoomBar => self.zoom_bar.pointer_drag(ev, &mut self.controller),
        }
        self.forward();
    }

    /// Pointer released on `surface`
    pub fn end_pointer_gesture(&mut self, surface: Surface, ev: &PointerEvent) {
        match surface {
            Surface::Ruler => self.ruler.pointer_up(ev, &mut self.controller),
            Surface::TrackContent => self.tracks.pointer_up(ev, &mut self.controller),
            Surface::ZoomBar => self.zoom_bar.pointer_up(&self.controller),
        }
        self.forward();
    }

    /// Pointer left `surface` or the gesture was interrupted
    pub fn cancel_pointer_gesture(&mut self, surface: Surface) {
        match surface {
            Surface::Ruler => self.ruler.cancel(&mut self.controller),
            Surface::TrackContent => self.tracks.cancel(),
            Surface::ZoomBar => self.zoom_bar.cancel(&self.controller),
        }
        self.forward();
    }

    /// Pointer moved without a button held
    pub fn hover(&mut self, surface: Surface, ev: &PointerEvent) {
        match surface {
            Surface::Ruler => self.ruler.hover(ev, &mut self.controller),
            Surface::TrackContent => self.tracks.hover(ev, &mut self.controller),
            Surface::ZoomBar => {}
        }
    }

    /// The content viewport's horizontal scrollbar moved
    pub fn content_scrolled(&mut self, x: i32) -> SyncOutcome {
        let outcome = match self.viewports.as_mut() {
            Some(viewports) => viewports.content_scrolled(x, &mut self.controller),
            None => {
                self.controller.dispatch(TimelineEvent::SetScroll { x, y: None });
                SyncOutcome::Applied
            }
        };
        self.zoom_bar.sync(self.controller.state());
        outcome
    }

    /// Fire deferred work whose deadline has passed. Returns `true` if
    /// anything fired.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        let fired = self.tracks.poll(now, &mut self.controller);
        if fired {
            self.forward();
        }
        fired
    }

    /// When the host should next call [`poll_timers`](Self::poll_timers)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tracks.next_deadline()
    }

    fn forward(&mut self) {
        let state = self.controller.state();
        if let Some(viewports) = self.viewports.as_mut() {
            viewports.apply_state(state);
        }
        self.zoom_bar.sync(state);
    }
}

impl Default for TimelineSession {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::Topic;
    use crate::viewport::ScrollSurface;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<i32>>>);

    impl ScrollSurface for Recorder {
        fn set_view_x(&mut self, x: i32) {
            self.0.borrow_mut().push(x);
        }
    }

    fn session() -> (TimelineSession, Recorder, Recorder) {
        let (ruler, content) = (Recorder::default(), Recorder::default());
        let sync = ViewportSynchronizer::new(Box::new(ruler.clone()), Box::new(content.clone()));
        let mut s = TimelineSession::default().with_viewports(sync);
        s.dispatch(TimelineEvent::SetZoom(20.0));
        s.set_track_lanes(vec![60, 60, 60, 60]);
        (s, ruler, content)
    }

    #[test]
    fn test_ruler_click_sets_playhead() {
        let (mut s, _, _) = session();
        let ev = PointerEvent::new(218, 30, Instant::now());
        s.begin_pointer_gesture(Surface::Ruler, &ev);
        s.end_pointer_gesture(Surface::Ruler, &ev);
        assert_eq!(s.state().playhead.position(), 10.0);
    }

    #[test]
    fn test_ruler_zoom_drag_moves_viewports() {
        let (mut s, ruler, content) = session();
        let now = Instant::now();
        s.begin_pointer_gesture(Surface::Ruler, &PointerEvent::new(218, 30, now));
        s.update_pointer_gesture(Surface::Ruler, &PointerEvent::new(218, -120, now));
        assert!(s.state().pointer.zoom_gesture_active);
        assert_eq!(s.state().zoom.horizontal_zoom, 40.0);
        assert_eq!(s.state().zoom.scroll_x, 200);
        assert_eq!(content.0.borrow().last(), Some(&200));
        assert_eq!(ruler.0.borrow().last(), Some(&200));

        // The content viewport echoes the write; nothing is dispatched
        let version = s.state().version;
        assert_eq!(s.content_scrolled(200), SyncOutcome::EchoSuppressed);
        assert_eq!(s.state().version, version);

        s.end_pointer_gesture(Surface::Ruler, &PointerEvent::new(218, -120, now));
        assert!(!s.state().pointer.zoom_gesture_active);
    }

    #[test]
    fn test_track_click_fires_after_window() {
        let (mut s, _, _) = session();
        let t0 = Instant::now();
        let ev = PointerEvent::new(218, 90, t0);
        s.begin_pointer_gesture(Surface::TrackContent, &ev);
        s.end_pointer_gesture(Surface::TrackContent, &ev);
        assert_eq!(s.state().playhead.position(), 0.0);

        let deadline = s.next_deadline();
        assert_eq!(deadline, Some(t0 + Duration::from_millis(250)));
        assert!(!s.poll_timers(t0 + Duration::from_millis(100)));
        assert!(s.poll_timers(t0 + Duration::from_millis(300)));
        assert_eq!(s.state().playhead.position(), 10.0);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_track_drag_selects_lanes() {
        let (mut s, _, _) = session();
        let now = Instant::now();
        s.begin_pointer_gesture(Surface::TrackContent, &PointerEvent::new(218, 70, now));
        s.update_pointer_gesture(Surface::TrackContent, &PointerEvent::new(418, 200, now));
        s.end_pointer_gesture(Surface::TrackContent, &PointerEvent::new(418, 200, now));

        let selection = &s.state().selection;
        assert_eq!(selection.start, 10.0);
        assert_eq!(selection.end, 20.0);
        assert_eq!(selection.track_indices, BTreeSet::from([1, 2, 3]));
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_zoom_bar_drag_scrolls_viewports() {
        let (mut s, _, content) = session();
        s.set_viewport_size(600, 400);
        // 300s at 20 px/s: the thumb covers the first tenth of a 600px bar
        assert_eq!(s.zoom_bar().thumb_px(), (0, 60));

        let now = Instant::now();
        s.begin_pointer_gesture(Surface::ZoomBar, &PointerEvent::new(30, 4, now));
        s.update_pointer_gesture(Surface::ZoomBar, &PointerEvent::new(150, 4, now));
        s.end_pointer_gesture(Surface::ZoomBar, &PointerEvent::new(150, 4, now));

        assert_eq!(s.state().zoom.scroll_x, 1200);
        assert_eq!(content.0.borrow().last(), Some(&1200));
        assert_eq!(s.zoom_bar().thumb_px(), (120, 180));
    }

    #[test]
    fn test_user_scroll_updates_zoom_bar() {
        let (mut s, ruler, _) = session();
        s.set_viewport_size(600, 400);
        let scrolled = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&scrolled);
        s.controller_mut().subscribe(Topic::Scroll, move |state| r.borrow_mut().push(state.zoom.scroll_x));

        assert_eq!(s.content_scrolled(3000), SyncOutcome::Applied);
        assert_eq!(*scrolled.borrow(), vec![3000]);
        assert_eq!(ruler.0.borrow().last(), Some(&3000));
        assert_eq!(s.zoom_bar().thumb_px(), (300, 360));
    }

    #[test]
    fn test_undo_restores_viewports() {
        let (mut s, _, content) = session();
        s.dispatch(TimelineEvent::ZoomToFit {
            start: 100.0,
            end: 200.0,
            padding: 0.0,
        });
        let fitted = s.state().zoom.scroll_x;
        assert!(fitted > 0);
        assert_eq!(content.0.borrow().last(), Some(&fitted));

        assert!(s.undo().is_ok());
        assert_eq!(s.state().zoom.horizontal_zoom, 20.0);
        assert_eq!(s.state().zoom.scroll_x, 0);
        assert_eq!(content.0.borrow().last(), Some(&0));
        assert!(s.redo().is_ok());
        assert_eq!(s.state().zoom.scroll_x, fitted);
    }
}
