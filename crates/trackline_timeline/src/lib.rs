// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline engine for Trackline.
//!
//! This crate keeps a multi-track timeline's views in agreement:
//! - Time/pixel coordinate model with a fixed left inset
//! - Zoom, scroll, playhead, selection, loop, punch and tempo state
//! - Topic-targeted change notifications
//! - Undo/redo of structural edits
//! - Pointer gesture disambiguation for the ruler and track content
//! - Scroll synchronization between viewports
//!
//! ## Architecture
//!
//! The engine is built on:
//! - A single [`TimelineController`] that owns immutable state snapshots
//! - [`TimelineEvent`]s as the only way to change state
//! - Pure coordinate, grid and zoom math
//! - Gesture machines that translate pointer input into events
//!
//! Rendering, audio and track content are left to the host.

pub mod config;
pub mod controller;
pub mod coords;
pub mod events;
pub mod gesture;
pub mod grid;
pub mod history;
pub mod listeners;
pub mod session;
pub mod state;
pub mod viewport;
pub mod zoom;
pub mod zoom_bar;

pub use config::{ConfigError, RulerLayout, TimelineConfig};
pub use controller::TimelineController;
pub use coords::LEFT_PADDING;
pub use events::TimelineEvent;
pub use gesture::{Modifiers, PointerEvent, RulerGesture, RulerHit, Surface, TrackLanes, TrackSelectionGesture};
pub use history::{History, HistoryError};
pub use listeners::{Changes, SubscriptionId, Topic};
pub use session::TimelineSession;
pub use state::{
    ArrangementSection, CursorHint, DisplayConfig, GridDivision, LoopRegion, PlayheadState, PunchRegion,
    SectionId, TempoState, TimeDisplayMode, TimeSelection, TimelineState, ZoomState,
};
pub use viewport::{ScrollSurface, SyncOutcome, ViewportSynchronizer};
pub use zoom::ZoomDrag;
pub use zoom_bar::ZoomScrollBar;
