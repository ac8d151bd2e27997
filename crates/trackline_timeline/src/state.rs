// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline state.
//!
//! [`TimelineState`] is the single source of truth for everything drawn
//! against the time axis. It is only ever written by
//! [`TimelineController`](crate::controller::TimelineController); readers get
//! immutable snapshots.

use crate::config::TimelineConfig;
use crate::coords;
use crate::grid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Vertical zoom range (lane height multiplier)
pub const MIN_VERTICAL_ZOOM: f64 = 0.5;
/// See [`MIN_VERTICAL_ZOOM`]
pub const MAX_VERTICAL_ZOOM: f64 = 3.0;

/// Tempo range in beats per minute
pub const MIN_BPM: f64 = 20.0;
/// See [`MIN_BPM`]
pub const MAX_BPM: f64 = 999.0;

/// Time signature component range
pub const MIN_SIGNATURE: u32 = 1;
/// See [`MIN_SIGNATURE`]
pub const MAX_SIGNATURE: u32 = 16;

/// Shortest arrangement section, in seconds
pub const MIN_SECTION_DURATION: f64 = 1.0;

/// Shortest punch range, in seconds
pub const MIN_PUNCH_DURATION: f64 = 0.01;

/// Horizontal/vertical zoom and scroll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    /// Pixels per second
    pub horizontal_zoom: f64,
    /// Lane height multiplier
    pub vertical_zoom: f64,
    /// Horizontal scroll offset in pixels
    pub scroll_x: i32,
    /// Vertical scroll offset in pixels
    pub scroll_y: i32,
    /// Visible width of the track content
    pub viewport_width: i32,
    /// Visible height of the track content
    pub viewport_height: i32,
}

/// Playhead positions and transport flags.
///
/// The edit position is where playback starts and returns to; the playback
/// position is the moving cursor. They are equal while stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayheadState {
    /// Playback start point in seconds
    pub edit_position: f64,
    /// Moving cursor in seconds
    pub playback_position: f64,
    /// Transport is playing
    pub is_playing: bool,
    /// Transport is recording
    pub is_recording: bool,
}

impl PlayheadState {
    /// The position to draw: the moving cursor while playing, the edit
    /// position otherwise
    pub fn position(&self) -> f64 {
        if self.is_playing {
            self.playback_position
        } else {
            self.edit_position
        }
    }
}

/// A time range across a set of tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSelection {
    /// Start in seconds (negative when inactive)
    pub start: f64,
    /// End in seconds (negative when inactive)
    pub end: f64,
    /// Selected lane indices; empty means every track
    pub track_indices: BTreeSet<usize>,
    /// Selection is kept but not drawn (e.g. after it became a loop)
    pub visually_hidden: bool,
}

impl Default for TimeSelection {
    fn default() -> Self {
        Self {
            start: -1.0,
            end: -1.0,
            track_indices: BTreeSet::new(),
            visually_hidden: false,
        }
    }
}

impl TimeSelection {
    /// Whether the selection spans a non-empty range
    pub fn is_active(&self) -> bool {
        self.start >= 0.0 && self.end > self.start
    }

    /// Whether the selection should be drawn
    pub fn is_visually_active(&self) -> bool {
        self.is_active() && !self.visually_hidden
    }

    /// Whether the selection applies to every track
    pub fn is_all_tracks(&self) -> bool {
        self.track_indices.is_empty()
    }

    /// Whether lane `index` is part of the selection
    pub fn includes_track(&self, index: usize) -> bool {
        self.is_all_tracks() || self.track_indices.contains(&index)
    }

    /// Whether `time` lies within the selected range
    pub fn contains_time(&self, time: f64) -> bool {
        self.is_active() && time >= self.start && time <= self.end
    }

    /// Length in seconds, zero when inactive
    pub fn duration(&self) -> f64 {
        if self.is_active() {
            self.end - self.start
        } else {
            0.0
        }
    }

    /// Reset to the inactive state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Loop range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopRegion {
    /// Start in seconds (negative when unset)
    pub start: f64,
    /// End in seconds (negative when unset)
    pub end: f64,
    /// Playback loops over the range
    pub enabled: bool,
}

impl Default for LoopRegion {
    fn default() -> Self {
        Self {
            start: -1.0,
            end: -1.0,
            enabled: false,
        }
    }
}

impl LoopRegion {
    /// Whether the range is non-empty
    pub fn is_valid(&self) -> bool {
        self.start >= 0.0 && self.end > self.start
    }

    /// Length in seconds, zero when invalid
    pub fn duration(&self) -> f64 {
        if self.is_valid() {
            self.end - self.start
        } else {
            0.0
        }
    }

    /// Whether `time` lies inside the range
    pub fn contains(&self, time: f64) -> bool {
        self.is_valid() && time >= self.start && time <= self.end
    }

    /// Reset to the unset state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Punch-in/out recording range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunchRegion {
    /// Start in seconds (negative when unset)
    pub start: f64,
    /// End in seconds (negative when unset)
    pub end: f64,
    /// Recording starts at `start`
    pub punch_in_enabled: bool,
    /// Recording stops at `end`
    pub punch_out_enabled: bool,
}

impl Default for PunchRegion {
    fn default() -> Self {
        Self {
            start: -1.0,
            end: -1.0,
            punch_in_enabled: false,
            punch_out_enabled: false,
        }
    }
}

impl PunchRegion {
    /// Whether the range is non-empty
    pub fn is_valid(&self) -> bool {
        self.start >= 0.0 && self.end > self.start
    }

    /// Whether either punch point is active
    pub fn is_enabled(&self) -> bool {
        self.punch_in_enabled || self.punch_out_enabled
    }

    /// Length in seconds, zero when invalid
    pub fn duration(&self) -> f64 {
        if self.is_valid() {
            self.end - self.start
        } else {
            0.0
        }
    }

    /// Reset to the unset state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Tempo and time signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoState {
    /// Beats per minute
    pub bpm: f64,
    /// Beats per bar
    pub numerator: u32,
    /// Beat unit
    pub denominator: u32,
}

impl Default for TempoState {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TempoState {
    /// Length of one beat
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Length of one bar
    pub fn seconds_per_bar(&self) -> f64 {
        self.seconds_per_beat() * f64::from(self.numerator)
    }

    /// Seconds to (fractional) beats
    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.bpm / 60.0
    }

    /// Beats to seconds
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }

    /// Seconds to 1-indexed fractional bars
    pub fn time_to_bars(&self, seconds: f64) -> f64 {
        1.0 + seconds / self.seconds_per_bar()
    }

    /// 1-indexed fractional bars to seconds
    pub fn bars_to_time(&self, bars: f64) -> f64 {
        (bars - 1.0) * self.seconds_per_bar()
    }
}

/// How ruler labels and the snap grid are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeDisplayMode {
    /// Wall-clock seconds
    #[default]
    Seconds,
    /// Musical bars and beats
    BarsBeats,
}

/// Fixed snap grid as a fraction of a whole note (`1/16`, `3/8`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDivision {
    /// Notes per step
    pub numerator: u32,
    /// Note value
    pub denominator: u32,
}

impl GridDivision {
    /// Create a division; `None` when either part is zero
    pub fn new(numerator: u32, denominator: u32) -> Option<Self> {
        (numerator > 0 && denominator > 0).then_some(Self { numerator, denominator })
    }

    /// Step length in quarter-note beats
    pub fn beats(&self) -> f64 {
        4.0 * f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// Step length in seconds at the current tempo
    pub fn seconds(&self, tempo: &TempoState) -> f64 {
        tempo.beats_to_seconds(self.beats())
    }
}

/// Display and editing toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Label/grid mode
    pub time_display_mode: TimeDisplayMode,
    /// Snap positions to the grid
    pub snap_enabled: bool,
    /// Arrangement sections cannot be edited
    pub arrangement_locked: bool,
    /// Smallest legible grid spacing, in pixels
    pub min_grid_spacing_px: f64,
    /// Fixed grid overriding the zoom-dependent one
    #[serde(default)]
    pub grid_quantize: Option<GridDivision>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_display_mode: TimeDisplayMode::Seconds,
            snap_enabled: true,
            arrangement_locked: true,
            min_grid_spacing_px: 50.0,
            grid_quantize: None,
        }
    }
}

/// Unique identifier for an arrangement section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId(pub Uuid);

impl SectionId {
    /// Create a new random section ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Named span of the arrangement ("Intro", "Chorus", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrangementSection {
    /// Section ID
    pub id: SectionId,
    /// Display name
    pub name: String,
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
}

impl ArrangementSection {
    /// Create a section with a fresh ID
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: SectionId::new(),
            name: name.into(),
            start,
            end,
        }
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` lies inside the section
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Pointer cursor the host should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorHint {
    /// Default arrow
    #[default]
    Normal,
    /// Playhead click / zoom area
    Crosshair,
    /// Time selection area
    IBeam,
    /// Draggable horizontal edge
    LeftRightResize,
    /// Active zoom drag
    UpDownResize,
    /// Draggable body
    DraggingHand,
}

/// Feedback for the pointer, owned by the gesture machines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerFeedback {
    /// Requested cursor
    pub cursor: CursorHint,
    /// A drag-to-zoom gesture is in progress
    pub zoom_gesture_active: bool,
}

/// Complete timeline state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineState {
    /// Timeline length in seconds
    pub timeline_length: f64,
    /// Zoom and scroll
    pub zoom: ZoomState,
    /// Playhead
    pub playhead: PlayheadState,
    /// Time selection
    pub selection: TimeSelection,
    /// Loop region
    pub loop_region: LoopRegion,
    /// Punch-in/out region
    #[serde(default)]
    pub punch: PunchRegion,
    /// Edit cursor for split/edit operations, independent of the playhead
    #[serde(default)]
    pub edit_cursor: Option<f64>,
    /// Tempo and signature
    pub tempo: TempoState,
    /// Display toggles
    pub display: DisplayConfig,
    /// Arrangement sections, in insertion order
    pub sections: Vec<ArrangementSection>,
    /// Currently selected section
    pub selected_section: Option<SectionId>,
    /// Pointer feedback (not part of undo history)
    pub pointer: PointerFeedback,
    /// Snapshot generation, bumped on every applied change
    pub version: u64,
}

impl TimelineState {
    /// Create the initial state for a configuration
    pub fn new(config: &TimelineConfig) -> Self {
        let viewport_width = config.default_viewport_width;
        let initial_zoom = config.clamp_zoom(f64::from(viewport_width) / config.default_view_duration);

        Self {
            timeline_length: config.default_timeline_length,
            zoom: ZoomState {
                horizontal_zoom: initial_zoom,
                vertical_zoom: 1.0,
                scroll_x: 0,
                scroll_y: 0,
                viewport_width,
                viewport_height: config.default_viewport_height,
            },
            playhead: PlayheadState::default(),
            selection: TimeSelection::default(),
            loop_region: LoopRegion::default(),
            punch: PunchRegion::default(),
            edit_cursor: None,
            tempo: TempoState::default(),
            display: DisplayConfig {
                min_grid_spacing_px: config.min_grid_pixel_spacing,
                ..DisplayConfig::default()
            },
            sections: Vec::new(),
            selected_section: None,
            pointer: PointerFeedback::default(),
            version: 0,
        }
    }

    /// Viewport pixel to seconds
    pub fn pixel_to_time(&self, px: i32) -> f64 {
        coords::pixel_to_time(px, self.zoom.horizontal_zoom, self.zoom.scroll_x)
    }

    /// Content pixel to seconds
    pub fn pixel_to_time_local(&self, px: i32) -> f64 {
        coords::pixel_to_time_local(px, self.zoom.horizontal_zoom)
    }

    /// Seconds to viewport pixel
    pub fn time_to_pixel(&self, time: f64) -> i32 {
        coords::time_to_pixel(time, self.zoom.horizontal_zoom, self.zoom.scroll_x)
    }

    /// Seconds to content pixel
    pub fn time_to_pixel_local(&self, time: f64) -> i32 {
        coords::time_to_pixel_local(time, self.zoom.horizontal_zoom)
    }

    /// Pixel width of a duration
    pub fn duration_to_pixels(&self, duration: f64) -> i32 {
        coords::duration_to_pixels(duration, self.zoom.horizontal_zoom)
    }

    /// Width of the scrollable content
    pub fn content_width(&self) -> i32 {
        coords::content_width(self.timeline_length, self.zoom.horizontal_zoom, self.zoom.viewport_width)
    }

    /// Largest valid horizontal scroll
    pub fn max_scroll_x(&self) -> i32 {
        coords::max_scroll_x(self.timeline_length, self.zoom.horizontal_zoom, self.zoom.viewport_width)
    }

    /// Time range currently visible in the viewport
    pub fn visible_time_range(&self) -> (f64, f64) {
        let start = self.pixel_to_time(coords::LEFT_PADDING).max(0.0);
        let end = self.pixel_to_time(self.zoom.viewport_width);
        (start, end.max(start))
    }

    /// Grid interval for the current zoom and display mode, or the fixed
    /// grid when one is set
    pub fn snap_interval(&self) -> f64 {
        if let Some(division) = self.display.grid_quantize {
            return division.seconds(&self.tempo);
        }
        grid::snap_interval(
            self.zoom.horizontal_zoom,
            self.display.time_display_mode,
            &self.tempo,
            self.display.min_grid_spacing_px,
        )
    }

    /// Snap to the grid when snapping is enabled
    pub fn snap_time_to_grid(&self, time: f64) -> f64 {
        if !self.display.snap_enabled {
            return time;
        }
        grid::snap_to_interval(time, self.snap_interval())
    }

    /// Label for a time position
    pub fn format_time_position(&self, time: f64) -> String {
        grid::format_time_position(time, self.display.time_display_mode, &self.tempo)
    }

    /// Clamp a time into `[0, timeline_length]`
    pub fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.timeline_length)
    }

    /// Look up a section
    pub fn section(&self, id: SectionId) -> Option<&ArrangementSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Topmost section under `time`
    pub fn section_at(&self, time: f64) -> Option<&ArrangementSection> {
        self.sections.iter().rev().find(|s| s.contains(time))
    }
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(&TimelineConfig::default())
    }
}
