// SPDX-License-Identifier: MIT OR Apache-2.0
//! Horizontal scroll synchronization between surfaces.
//!
//! The track content viewport owns the horizontal scrollbar. When the user
//! scrolls it, the ruler is mirrored and the controller is told; when the
//! controller changes the scroll (zoom, scroll-to-time, undo), both viewports
//! are moved to match.
//!
//! Writing a position into a viewport usually makes it report a scroll back.
//! That report is an echo of our own write and must not be dispatched again.
//! [`ViewportSynchronizer`] tracks the value it wrote and swallows the
//! matching report; the state version acts as a generation counter so a
//! snapshot is only ever applied once.

use crate::controller::TimelineController;
use crate::events::TimelineEvent;
use crate::state::TimelineState;

/// A host surface that scrolls horizontally with the timeline
pub trait ScrollSurface {
    /// Move the visible area to horizontal offset `x`
    fn set_view_x(&mut self, x: i32);

    /// Repaint after a scroll or zoom change
    fn refresh(&mut self) {}
}

/// Result of feeding a scroll position to the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The position was propagated
    Applied,
    /// The report was our own write coming back
    EchoSuppressed,
    /// Nothing to do
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EchoState {
    Idle,
    AwaitingEcho { x: i32, generation: u64 },
}

/// Keeps the ruler, the track content and the overlays horizontally aligned
pub struct ViewportSynchronizer {
    ruler: Box<dyn ScrollSurface>,
    content: Box<dyn ScrollSurface>,
    overlays: Vec<Box<dyn ScrollSurface>>,
    echo: EchoState,
    applied_generation: u64,
    last_x: i32,
}

impl ViewportSynchronizer {
    /// Create a synchronizer for the ruler and content viewports
    pub fn new(ruler: Box<dyn ScrollSurface>, content: Box<dyn ScrollSurface>) -> Self {
        Self {
            ruler,
            content,
            overlays: Vec::new(),
            echo: EchoState::Idle,
            applied_generation: 0,
            last_x: 0,
        }
    }

    /// Add an overlay (playhead, selection) that repaints on every change
    pub fn add_overlay(&mut self, overlay: Box<dyn ScrollSurface>) {
        self.overlays.push(overlay);
    }

    /// Whether a write is waiting for its echo
    pub fn awaiting_echo(&self) -> bool {
        matches!(self.echo, EchoState::AwaitingEcho { .. })
    }

    /// Last horizontal offset written to or reported by the viewports
    pub fn last_x(&self) -> i32 {
        self.last_x
    }

    /// The content scrollbar moved to `x`
    pub fn content_scrolled(&mut self, x: i32, c: &mut TimelineController) -> SyncOutcome {
        if let EchoState::AwaitingEcho { x: expected, generation } = self.echo {
            self.echo = EchoState::Idle;
            if expected == x {
                tracing::trace!(x, generation, "Suppressed scroll echo");
                return SyncOutcome::EchoSuppressed;
            }
        }

        self.last_x = x;
        self.ruler.set_view_x(x);
        c.dispatch(TimelineEvent::SetScroll { x, y: None });

        let state = c.state();
        self.applied_generation = state.version;
        if state.zoom.scroll_x != x {
            // Clamped by the controller: move the viewports to the real value
            self.push(state.zoom.scroll_x, state.version);
        }
        self.refresh_overlays();
        SyncOutcome::Applied
    }

    /// Bring the viewports in line with a new state snapshot
    pub fn apply_state(&mut self, state: &TimelineState) -> SyncOutcome {
        if state.version <= self.applied_generation {
            return SyncOutcome::Unchanged;
        }
        self.applied_generation = state.version;

        let outcome = if state.zoom.scroll_x != self.last_x {
            self.push(state.zoom.scroll_x, state.version);
            SyncOutcome::Applied
        } else {
            SyncOutcome::Unchanged
        };
        self.refresh_overlays();
        outcome
    }

    fn push(&mut self, x: i32, generation: u64) {
        self.last_x = x;
        self.echo = EchoState::AwaitingEcho { x, generation };
        self.content.set_view_x(x);
        self.ruler.set_view_x(x);
    }

    fn refresh_overlays(&mut self) {
        for overlay in &mut self.overlays {
            overlay.refresh();
        }
    }
}

impl std::fmt::Debug for ViewportSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportSynchronizer")
            .field("echo", &self.echo)
            .field("applied_generation", &self.applied_generation)
            .field("last_x", &self.last_x)
            .field("overlays", &self.overlays.len())
            .finish()
    }
}
