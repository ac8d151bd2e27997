// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer gesture disambiguation.
//!
//! The host forwards raw pointer coordinates; the machines in this module
//! decide what a press/drag/release sequence means and express it as
//! [`TimelineEvent`](crate::events::TimelineEvent)s on the controller.
//!
//! - [`RulerGesture`]: playhead click, drag-to-zoom, time selection, loop
//!   marker and section editing on the ruler surface
//! - [`TrackSelectionGesture`]: time-range selection across track lanes with
//!   a delayed single-click playhead move

pub mod ruler;
pub mod tracks;

pub use ruler::{RulerGesture, RulerHit};
pub use tracks::{TrackLanes, TrackSelectionGesture};

use crate::events::TimelineEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    /// Shift
    pub shift: bool,
    /// Alt / Option
    pub alt: bool,
    /// Ctrl / Command
    pub command: bool,
}

/// A pointer event in surface-local pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
    /// Held modifiers
    pub modifiers: Modifiers,
    /// Monotonic timestamp
    pub time: Instant,
}

impl PointerEvent {
    /// Create an event without modifiers
    pub fn new(x: i32, y: i32, time: Instant) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::default(),
            time,
        }
    }

    /// Same event with Shift held
    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// Surface a pointer event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surface {
    /// Time ruler (with the arrangement band above it)
    Ruler,
    /// Track content grid
    TrackContent,
    /// Zoom scrollbar under the tracks
    ZoomBar,
}

/// Whether a pointer moved further than `threshold` on either axis
fn beyond_threshold(down: (i32, i32), x: i32, y: i32, threshold: i32) -> bool {
    (x - down.0).abs() > threshold || (y - down.1).abs() > threshold
}

/// Selection command for a range resolved during a drag. An empty range
/// clears the selection instead of leaving the previous one in place.
fn resolved_selection(range: (f64, f64), tracks: BTreeSet<usize>) -> TimelineEvent {
    let (start, end) = range;
    if start == end {
        TimelineEvent::ClearSelection
    } else {
        TimelineEvent::SetSelection { start, end, tracks }
    }
}

/// Whether a drag's final range is too short to keep
fn below_min_selection(range: Option<(f64, f64)>, min_duration: f64) -> bool {
    range.map_or(true, |(start, end)| (end - start).abs() <= min_duration)
}
