// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline configuration.
//!
//! A [`TimelineConfig`] is built once by the host (usually from a RON file)
//! and handed to the controller and gesture machines. Nothing in this crate
//! reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// RON parse error
    #[error("Failed to parse timeline config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// IO error
    #[error("Failed to read timeline config: {0}")]
    Io(#[from] std::io::Error),

    /// A value is out of its allowed range
    #[error("Invalid timeline config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Vertical layout of the ruler surface, in pixels from its top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulerLayout {
    /// Height of the arrangement-section band above the ruler
    pub section_band_height: i32,
    /// Height of the ruler band (zoom + selection areas)
    pub ruler_height: i32,
    /// Fraction of the ruler band used by the upper zoom/click area
    pub zoom_area_ratio: f64,
}

impl RulerLayout {
    /// Top of the ruler band
    pub fn ruler_top(&self) -> i32 {
        self.section_band_height
    }

    /// Boundary between the zoom area and the selection area
    pub fn zoom_area_bottom(&self) -> i32 {
        self.ruler_top() + (self.ruler_height as f64 * self.zoom_area_ratio) as i32
    }

    /// Bottom of the ruler band
    pub fn ruler_bottom(&self) -> i32 {
        self.ruler_top() + self.ruler_height
    }
}

impl Default for RulerLayout {
    fn default() -> Self {
        Self {
            section_band_height: 18,
            ruler_height: 52,
            zoom_area_ratio: 2.0 / 3.0,
        }
    }
}

/// Tuning values for the timeline engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Lowest horizontal zoom, in pixels per second
    pub min_zoom: f64,
    /// Highest horizontal zoom, in pixels per second
    pub max_zoom: f64,
    /// Length of a fresh timeline, in seconds
    pub default_timeline_length: f64,
    /// Seconds visible in the viewport of a fresh timeline
    pub default_view_duration: f64,
    /// Viewport size assumed before the host reports one
    pub default_viewport_width: i32,
    /// See `default_viewport_width`
    pub default_viewport_height: i32,

    /// Movement (px) that turns a ruler click into a drag
    pub ruler_drag_threshold: i32,
    /// Movement (px) that turns a track-content click into a drag
    pub track_drag_threshold: i32,
    /// Horizontal distance (px) at which a loop marker is grabbed
    pub loop_marker_hit_px: i32,
    /// Vertical tolerance (px) around the loop top border
    pub loop_border_hit_px: i32,
    /// Horizontal distance (px) at which a section edge is grabbed
    pub section_edge_hit_px: i32,
    /// Smallest on-screen grid spacing, in pixels
    pub min_grid_pixel_spacing: f64,
    /// Pixels of vertical drag per zoom octave
    pub zoom_drag_sensitivity: f64,
    /// Same as `zoom_drag_sensitivity` while Shift is held
    pub zoom_drag_sensitivity_fast: f64,
    /// Pixels kept free when computing the fit-to-window zoom floor
    pub zoom_fit_margin_px: i32,
    /// Window in which a second click counts as a double-click
    pub double_click_ms: u64,
    /// Shortest time selection (seconds) a gesture can commit
    pub min_selection_duration: f64,
    /// Ruler band geometry
    pub ruler: RulerLayout,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.01,
            max_zoom: 10_000.0,
            default_timeline_length: 300.0,
            default_view_duration: 60.0,
            default_viewport_width: 800,
            default_viewport_height: 600,
            ruler_drag_threshold: 5,
            track_drag_threshold: 3,
            loop_marker_hit_px: 8,
            loop_border_hit_px: 6,
            section_edge_hit_px: 5,
            min_grid_pixel_spacing: 50.0,
            zoom_drag_sensitivity: 150.0,
            zoom_drag_sensitivity_fast: 50.0,
            zoom_fit_margin_px: 50,
            double_click_ms: 250,
            min_selection_duration: 0.01,
            ruler: RulerLayout::default(),
        }
    }
}

impl TimelineConfig {
    /// Parse a configuration from RON text and validate it
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        tracing::info!("Loaded timeline config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> std::result::Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Check every value against its allowed range
    pub fn validate(&self) -> Result<()> {
        let finite_positive = |v: f64| v.is_finite() && v > 0.0;

        if !finite_positive(self.min_zoom) {
            return Err(ConfigError::Invalid(format!("min_zoom must be > 0, got {}", self.min_zoom)));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return Err(ConfigError::Invalid(format!(
                "max_zoom ({}) must be >= min_zoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }
        if !finite_positive(self.default_timeline_length) {
            return Err(ConfigError::Invalid("default_timeline_length must be > 0".into()));
        }
        if !finite_positive(self.default_view_duration) {
            return Err(ConfigError::Invalid("default_view_duration must be > 0".into()));
        }
        if !finite_positive(self.zoom_drag_sensitivity) || !finite_positive(self.zoom_drag_sensitivity_fast) {
            return Err(ConfigError::Invalid("zoom drag sensitivities must be > 0".into()));
        }
        let thresholds = [
            self.ruler_drag_threshold,
            self.track_drag_threshold,
            self.loop_marker_hit_px,
            self.loop_border_hit_px,
            self.section_edge_hit_px,
            self.zoom_fit_margin_px,
            self.default_viewport_width,
            self.default_viewport_height,
            self.ruler.section_band_height,
            self.ruler.ruler_height,
        ];
        if thresholds.iter().any(|&t| t < 0) {
            return Err(ConfigError::Invalid("pixel thresholds and sizes must be >= 0".into()));
        }
        if !(self.min_grid_pixel_spacing >= 0.0 && self.min_selection_duration >= 0.0) {
            return Err(ConfigError::Invalid("grid spacing and selection minimum must be >= 0".into()));
        }
        if !(self.ruler.zoom_area_ratio > 0.0 && self.ruler.zoom_area_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "ruler.zoom_area_ratio must be in (0, 1), got {}",
                self.ruler.zoom_area_ratio
            )));
        }
        Ok(())
    }

    /// Clamp a zoom value into the configured bounds
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Double-click window as a [`Duration`]
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}
