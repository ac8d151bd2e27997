// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted input sessions.
//!
//! A script is a RON document describing the viewport, the track lanes and
//! a list of steps (pointer presses, drags, releases, scrollbar moves, waits
//! and raw timeline events). Replaying it drives a [`TimelineSession`]
//! exactly as a host UI would, with a simulated clock for timers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use trackline_timeline::{ConfigError, Modifiers, PointerEvent, Surface, TimelineConfig, TimelineEvent, TimelineSession};

/// Script loading errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// RON parse error
    #[error("Failed to parse script: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// IO error
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    /// Embedded timeline config is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for script operations
pub type Result<T> = std::result::Result<T, ScriptError>;

/// One scripted input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Button pressed
    Press {
        /// Target surface
        surface: Surface,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
        /// Held modifiers
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Pointer moved with the button held
    Drag {
        /// Target surface
        surface: Surface,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
        /// Held modifiers
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Button released
    Release {
        /// Target surface
        surface: Surface,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
        /// Held modifiers
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Pointer moved without a button held
    Hover {
        /// Target surface
        surface: Surface,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
    },
    /// Pointer left the surface
    Cancel(Surface),
    /// Content scrollbar moved
    Scroll(i32),
    /// Advance the clock by this many milliseconds and fire due timers
    Wait(u64),
    /// Dispatch a timeline event directly
    Event(TimelineEvent),
    /// Undo the last undoable change
    Undo,
    /// Redo the last undone change
    Redo,
}

/// A replayable input session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Timeline configuration; defaults when absent
    pub config: Option<TimelineConfig>,
    /// Content viewport size `(width, height)`
    pub viewport: (i32, i32),
    /// Base track lane heights, top to bottom
    pub lanes: Vec<i32>,
    /// Inputs in order
    pub steps: Vec<Step>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            config: None,
            viewport: (800, 600),
            lanes: vec![60; 4],
            steps: Vec::new(),
        }
    }
}

impl Script {
    /// Parse a script from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let script: Self = ron::from_str(text)?;
        if let Some(config) = &script.config {
            config.validate()?;
        }
        Ok(script)
    }

    /// Load a script from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let script = Self::from_ron_str(&text)?;
        tracing::info!("Loaded script {:?} ({} steps)", path, script.steps.len());
        Ok(script)
    }

    /// Built-in walkthrough: playhead click, lane selection, loop, zoom drag,
    /// scroll and a delayed track click.
    pub fn demo() -> Self {
        let ruler = Surface::Ruler;
        let tracks = Surface::TrackContent;
        let m = Modifiers::default();
        Self {
            steps: vec![
                Step::Event(TimelineEvent::SetZoom(20.0)),
                Step::Press { surface: ruler, x: 218, y: 30, modifiers: m },
                Step::Release { surface: ruler, x: 218, y: 30, modifiers: m },
                Step::Press { surface: tracks, x: 218, y: 70, modifiers: m },
                Step::Drag { surface: tracks, x: 418, y: 200, modifiers: m },
                Step::Release { surface: tracks, x: 418, y: 200, modifiers: m },
                Step::Event(TimelineEvent::CreateLoopFromSelection),
                Step::Press { surface: ruler, x: 100, y: 30, modifiers: m },
                Step::Drag { surface: ruler, x: 100, y: -120, modifiers: m },
                Step::Release { surface: ruler, x: 100, y: -120, modifiers: m },
                Step::Scroll(400),
                Step::Press { surface: tracks, x: 658, y: 100, modifiers: m },
                Step::Release { surface: tracks, x: 658, y: 100, modifiers: m },
                Step::Wait(300),
            ],
            ..Self::default()
        }
    }

    /// Replay every step against a fresh session
    pub fn run(&self) -> TimelineSession {
        let config = self.config.clone().unwrap_or_default();
        let mut session = TimelineSession::new(config);
        session.set_viewport_size(self.viewport.0, self.viewport.1);
        session.set_track_lanes(self.lanes.clone());

        let mut clock = Instant::now();
        for (index, step) in self.steps.iter().enumerate() {
            tracing::debug!(index, ?step, "Replaying step");
            match step {
                Step::Press { surface, x, y, modifiers } => {
                    let ev = pointer(*x, *y, *modifiers, clock);
                    session.begin_pointer_gesture(*surface, &ev);
                }
                Step::Drag { surface, x, y, modifiers } => {
                    let ev = pointer(*x, *y, *modifiers, clock);
                    session.update_pointer_gesture(*surface, &ev);
                }
                Step::Release { surface, x, y, modifiers } => {
                    let ev = pointer(*x, *y, *modifiers, clock);
                    session.end_pointer_gesture(*surface, &ev);
                }
                Step::Hover { surface, x, y } => {
                    session.hover(*surface, &PointerEvent::new(*x, *y, clock));
                }
                Step::Cancel(surface) => session.cancel_pointer_gesture(*surface),
                Step::Scroll(x) => {
                    session.content_scrolled(*x);
                }
                Step::Wait(ms) => {
                    clock += Duration::from_millis(*ms);
                    session.poll_timers(clock);
                }
                Step::Event(event) => {
                    session.dispatch(event.clone());
                }
                Step::Undo => {
                    if let Err(e) = session.undo() {
                        tracing::warn!("Step {index}: {e}");
                    }
                }
                Step::Redo => {
                    if let Err(e) = session.redo() {
                        tracing::warn!("Step {index}: {e}");
                    }
                }
            }
        }
        session
    }
}

fn pointer(x: i32, y: i32, modifiers: Modifiers, time: Instant) -> PointerEvent {
    PointerEvent {
        x,
        y,
        modifiers,
        time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_demo_replay() {
        let session = Script::demo().run();
        let state = session.state();

        assert_eq!(state.loop_region.start, 10.0);
        assert_eq!(state.loop_region.end, 20.0);
        assert!(state.loop_region.enabled);
        assert_eq!(state.selection.track_indices, BTreeSet::from([1, 2, 3]));
        assert!(state.selection.visually_hidden);
        assert_eq!(state.zoom.horizontal_zoom, 40.0);
        assert_eq!(state.zoom.scroll_x, 400);
        assert_eq!(state.playhead.position(), 26.0);
        assert!(!state.pointer.zoom_gesture_active);
    }

    #[test]
    fn test_parse_script() {
        let text = r#"(
            viewport: (1000, 400),
            lanes: [80, 80],
            steps: [
                Event(SetZoom(20.0)),
                Press(surface: Ruler, x: 218, y: 30),
                Release(surface: Ruler, x: 218, y: 30),
                Wait(10),
            ],
        )"#;
        let script = Script::from_ron_str(text).unwrap();
        assert_eq!(script.viewport, (1000, 400));
        assert_eq!(script.lanes, vec![80, 80]);
        assert_eq!(script.steps.len(), 4);
        assert_eq!(script.config, None);

        let session = script.run();
        assert_eq!(session.state().playhead.position(), 10.0);
        assert_eq!(session.state().zoom.viewport_width, 1000);
    }

    #[test]
    fn test_undo_steps() {
        let script = Script {
            steps: vec![
                Step::Event(TimelineEvent::SetLoopRegion { start: 2.0, end: 6.0 }),
                Step::Undo,
                Step::Undo,
            ],
            ..Script::default()
        };
        let session = script.run();
        assert!(!session.state().loop_region.is_valid());
        assert!(session.controller().can_redo());
    }

    #[test]
    fn test_invalid_embedded_config_rejected() {
        let text = "(config: Some((min_zoom: 5.0, max_zoom: 1.0)))";
        assert!(matches!(Script::from_ron_str(text), Err(ScriptError::Config(_))));
        assert!(matches!(Script::from_ron_str("(steps: 3)"), Err(ScriptError::Parse(_))));
    }
}
