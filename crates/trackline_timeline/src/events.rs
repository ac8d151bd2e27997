// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline mutations.
//!
//! Every change to [`TimelineState`](crate::state::TimelineState) is expressed
//! as a [`TimelineEvent`] and applied by the controller.

use crate::state::{CursorHint, GridDivision, SectionId, TimeDisplayMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default fraction of the fitted range added on each side by `ZoomToFit`
pub const DEFAULT_FIT_PADDING: f64 = 0.05;

/// A requested change to the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimelineEvent {
    // Zoom
    /// Set zoom, keeping the scroll offset (clamped)
    SetZoom(f64),
    /// Set zoom and center `time` in the viewport
    SetZoomCentered {
        /// Pixels per second
        zoom: f64,
        /// Time to center on
        time: f64,
    },
    /// Set zoom keeping `time` at viewport pixel `screen_x`
    SetZoomAnchored {
        /// Pixels per second
        zoom: f64,
        /// Anchored time
        time: f64,
        /// Viewport pixel the time stays under
        screen_x: i32,
    },
    /// Set zoom keeping the time under the pointer fixed
    SetZoomFromPointer {
        /// Pixels per second
        zoom: f64,
        /// Pointer x in viewport pixels
        pointer_x: i32,
        /// Current viewport width (ignored when not positive)
        viewport_width: i32,
    },
    /// Fit a time range into the viewport
    ZoomToFit {
        /// Range start
        start: f64,
        /// Range end
        end: f64,
        /// Fraction of the range added on each side
        padding: f64,
    },
    /// Fit the whole timeline and scroll to the start
    ResetZoom,
    /// Replace the zoom bounds and re-clamp
    SetZoomBounds {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// Set the lane height multiplier
    SetVerticalZoom(f64),

    // Scroll and viewport
    /// Set scroll offsets
    SetScroll {
        /// Horizontal offset
        x: i32,
        /// Vertical offset, unchanged when `None`
        y: Option<i32>,
    },
    /// Scroll relative to the current offsets
    ScrollBy {
        /// Horizontal delta
        dx: i32,
        /// Vertical delta
        dy: i32,
    },
    /// Bring a time into view
    ScrollToTime {
        /// Target time
        time: f64,
        /// Center it instead of placing it at the left edge
        center: bool,
    },
    /// The host resized the track content viewport
    SetViewportSize {
        /// Width in pixels
        width: i32,
        /// Height in pixels
        height: i32,
    },

    // Playhead
    /// Move the playhead; same as [`SetEditPosition`](Self::SetEditPosition)
    SetPlayhead(f64),
    /// Move the edit position. While stopped the playback position follows.
    SetEditPosition(f64),
    /// Move only the playback cursor, e.g. from the engine's position timer
    SetPlaybackPosition(f64),
    /// Move the edit position by a delta
    MovePlayheadBy(f64),
    /// Start the transport from the edit position
    StartPlayback,
    /// Stop the transport and return the cursor to the edit position
    StopPlayback,
    /// Transport flags reported by the playback engine
    SetTransportState {
        /// Playing
        playing: bool,
        /// Recording
        recording: bool,
    },
    /// Place or hide the edit cursor
    SetEditCursor(Option<f64>),

    // Selection
    /// Replace the time selection
    SetSelection {
        /// One end
        start: f64,
        /// Other end
        end: f64,
        /// Lane indices (empty = all tracks)
        tracks: BTreeSet<usize>,
    },
    /// Clear the time selection
    ClearSelection,
    /// Keep the selection but stop drawing it
    HideSelection,
    /// Turn the selection into an enabled loop
    CreateLoopFromSelection,

    // Loop
    /// Replace the loop range
    SetLoopRegion {
        /// One end
        start: f64,
        /// Other end
        end: f64,
    },
    /// Remove the loop
    ClearLoop,
    /// Enable or disable looping
    SetLoopEnabled(bool),
    /// Shift the loop keeping its length
    MoveLoopBy(f64),

    // Punch
    /// Replace the punch range
    SetPunchRegion {
        /// One end
        start: f64,
        /// Other end
        end: f64,
    },
    /// Remove the punch range
    ClearPunchRegion,
    /// Enable or disable punch-in
    SetPunchInEnabled(bool),
    /// Enable or disable punch-out
    SetPunchOutEnabled(bool),

    // Tempo and display
    /// Change the tempo, keeping musical positions
    SetTempo(f64),
    /// Change the time signature
    SetTimeSignature {
        /// Beats per bar
        numerator: u32,
        /// Beat unit
        denominator: u32,
    },
    /// Switch label/grid mode
    SetTimeDisplayMode(TimeDisplayMode),
    /// Toggle grid snapping
    SetSnapEnabled(bool),
    /// Lock or unlock arrangement editing
    SetArrangementLocked(bool),
    /// Fix the snap grid, or go back to the zoom-dependent grid with `None`
    SetGridQuantize(Option<GridDivision>),

    // Arrangement sections
    /// Append a section
    AddSection {
        /// ID for the new section
        id: SectionId,
        /// Display name
        name: String,
        /// Start time
        start: f64,
        /// End time
        end: f64,
    },
    /// Remove a section
    RemoveSection(SectionId),
    /// Move a section keeping its length
    MoveSection {
        /// Section
        id: SectionId,
        /// New start
        start: f64,
    },
    /// Change both edges of a section
    ResizeSection {
        /// Section
        id: SectionId,
        /// New start
        start: f64,
        /// New end
        end: f64,
    },
    /// Select a section, or clear the selection
    SelectSection(Option<SectionId>),

    // Timeline
    /// Change the timeline length
    SetTimelineLength(f64),

    // Pointer feedback
    /// Cursor requested by a gesture surface
    SetCursorHint(CursorHint),
    /// A drag-to-zoom gesture started or ended
    SetZoomGestureActive(bool),
}

impl TimelineEvent {
    /// Whether applying this event records an undo point
    pub fn is_undoable(&self) -> bool {
        matches!(
            self,
            Self::ZoomToFit { .. }
                | Self::ResetZoom
                | Self::CreateLoopFromSelection
                | Self::SetLoopRegion { .. }
                | Self::ClearLoop
                | Self::MoveLoopBy(_)
                | Self::SetPunchRegion { .. }
                | Self::ClearPunchRegion
                | Self::AddSection { .. }
                | Self::RemoveSection(_)
                | Self::MoveSection { .. }
                | Self::ResizeSection { .. }
                | Self::SetTimelineLength(_)
        )
    }

    /// Whether undoing this event also brings back the previous zoom and
    /// scroll
    pub fn restores_view(&self) -> bool {
        matches!(self, Self::ZoomToFit { .. } | Self::ResetZoom)
    }

    /// Short label for logs and undo menus
    pub fn description(&self) -> &'static str {
        match self {
            Self::SetZoom(_) => "Set Zoom",
            Self::SetZoomCentered { .. } => "Zoom Centered",
            Self::SetZoomAnchored { .. } => "Zoom Anchored",
            Self::SetZoomFromPointer { .. } => "Zoom From Pointer",
            Self::ZoomToFit { .. } => "Zoom To Fit",
            Self::ResetZoom => "Reset Zoom",
            Self::SetZoomBounds { .. } => "Set Zoom Bounds",
            Self::SetVerticalZoom(_) => "Vertical Zoom",
            Self::SetScroll { .. } => "Scroll",
            Self::ScrollBy { .. } => "Scroll By",
            Self::ScrollToTime { .. } => "Scroll To Time",
            Self::SetViewportSize { .. } => "Resize Viewport",
            Self::SetPlayhead(_) => "Set Playhead",
            Self::SetEditPosition(_) => "Set Edit Position",
            Self::SetPlaybackPosition(_) => "Set Playback Position",
            Self::MovePlayheadBy(_) => "Move Playhead",
            Self::StartPlayback => "Start Playback",
            Self::StopPlayback => "Stop Playback",
            Self::SetTransportState { .. } => "Transport State",
            Self::SetEditCursor(_) => "Set Edit Cursor",
            Self::SetSelection { .. } => "Set Selection",
            Self::ClearSelection => "Clear Selection",
            Self::HideSelection => "Hide Selection",
            Self::CreateLoopFromSelection => "Loop Selection",
            Self::SetLoopRegion { .. } => "Set Loop",
            Self::ClearLoop => "Clear Loop",
            Self::SetLoopEnabled(_) => "Toggle Loop",
            Self::MoveLoopBy(_) => "Move Loop",
            Self::SetPunchRegion { .. } => "Set Punch",
            Self::ClearPunchRegion => "Clear Punch",
            Self::SetPunchInEnabled(_) => "Toggle Punch In",
            Self::SetPunchOutEnabled(_) => "Toggle Punch Out",
            Self::SetTempo(_) => "Set Tempo",
            Self::SetTimeSignature { .. } => "Set Time Signature",
            Self::SetTimeDisplayMode(_) => "Display Mode",
            Self::SetSnapEnabled(_) => "Toggle Snap",
            Self::SetArrangementLocked(_) => "Lock Arrangement",
            Self::SetGridQuantize(_) => "Grid Quantize",
            Self::AddSection { .. } => "Add Section",
            Self::RemoveSection(_) => "Remove Section",
            Self::MoveSection { .. } => "Move Section",
            Self::ResizeSection { .. } => "Resize Section",
            Self::SelectSection(_) => "Select Section",
            Self::SetTimelineLength(_) => "Set Timeline Length",
            Self::SetCursorHint(_) => "Cursor Hint",
            Self::SetZoomGestureActive(_) => "Zoom Gesture",
        }
    }
}
