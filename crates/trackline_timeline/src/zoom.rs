// SPDX-License-Identifier: MIT OR Apache-2.0
//! Zoom coordination.
//!
//! Anchor math used by the controller's zoom events, the exponential
//! drag-to-zoom mapping, and the [`ZoomDrag`] state machine that turns a
//! vertical ruler drag into zoom steps.
//!
//! All anchoring goes through [`coords::time_to_pixel_local`] so that, as long
//! as the resulting scroll does not need clamping, the anchored time lands on
//! exactly the requested pixel.

use crate::config::TimelineConfig;
use crate::coords;

/// Scroll offset that places `time` in the middle of the viewport.
pub fn centered_scroll(time: f64, zoom: f64, viewport_width: i32) -> i32 {
    coords::time_to_pixel_local(time, zoom) - viewport_width / 2
}

/// Scroll offset that places `time` at viewport pixel `screen_x`.
pub fn anchored_scroll(time: f64, zoom: f64, screen_x: i32) -> i32 {
    coords::time_to_pixel_local(time, zoom) - screen_x
}

/// Lowest zoom a drag may reach: the whole timeline fits the viewport minus
/// the configured margin, never below `min_zoom`.
pub fn fit_zoom_floor(config: &TimelineConfig, viewport_width: i32, timeline_length: f64) -> f64 {
    let mut floor = config.min_zoom;
    if timeline_length > 0.0 {
        let usable = f64::from(viewport_width - config.zoom_fit_margin_px);
        if usable > 0.0 {
            floor = floor.max(usable / timeline_length);
        }
    }
    floor.min(config.max_zoom)
}

/// Map a vertical drag to a zoom level.
///
/// `delta_y` is positive when the pointer moved up. Each `sensitivity`
/// pixels doubles (or halves) the zoom.
pub fn drag_zoom(start_zoom: f64, delta_y: f64, sensitivity: f64, floor: f64, max_zoom: f64) -> f64 {
    let octaves = if sensitivity > 0.0 { delta_y / sensitivity } else { 0.0 };
    let zoom = start_zoom * 2f64.powf(octaves);
    if zoom.is_nan() || zoom < floor {
        floor
    } else if zoom > max_zoom {
        max_zoom
    } else {
        zoom
    }
}

/// Zoom and left-edge time that show `[start, end]` with `padding` (fraction
/// of the range) on each side. `None` for an empty range or viewport.
pub fn fit_range(start: f64, end: f64, padding: f64, viewport_width: i32) -> Option<(f64, f64)> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let duration = end - start;
    let usable = f64::from(viewport_width - coords::LEFT_PADDING);
    if !(duration > 0.0) || usable <= 0.0 {
        return None;
    }
    let pad = duration * padding.max(0.0);
    let zoom = usable / (duration + 2.0 * pad);
    Some((zoom, (start - pad).max(0.0)))
}

/// One zoom update produced by a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStep {
    /// New zoom in pixels per second
    pub zoom: f64,
    /// Time kept under the anchor pixel
    pub anchor_time: f64,
    /// Viewport pixel of the anchor
    pub anchor_x: i32,
    /// First step of the gesture
    pub began: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Armed,
    Zooming,
}

/// Vertical drag-to-zoom state machine
///
/// `Idle -> Armed` on pointer-down, `Armed -> Zooming` once the vertical
/// movement exceeds the drag threshold, back to `Idle` on release.
#[derive(Debug, Clone)]
pub struct ZoomDrag {
    phase: Phase,
    down_x: i32,
    down_y: i32,
    start_zoom: f64,
    anchor_time: f64,
}

impl ZoomDrag {
    /// Create an idle machine
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            down_x: 0,
            down_y: 0,
            start_zoom: 1.0,
            anchor_time: 0.0,
        }
    }

    /// Remember where the pointer went down and the zoom at that moment
    pub fn arm(&mut self, down_x: i32, down_y: i32, start_zoom: f64, anchor_time: f64) {
        self.phase = Phase::Armed;
        self.down_x = down_x;
        self.down_y = down_y;
        self.start_zoom = start_zoom;
        self.anchor_time = anchor_time;
    }

    /// Whether a zoom gesture is in progress
    pub fn is_zooming(&self) -> bool {
        self.phase == Phase::Zooming
    }

    /// Whether the machine is waiting for the threshold to be crossed
    pub fn is_armed(&self) -> bool {
        self.phase == Phase::Armed
    }

    /// Vertical distance from the pointer-down position
    pub fn exceeds_threshold(&self, y: i32, threshold: i32) -> bool {
        (y - self.down_y).abs() > threshold
    }

    /// Feed a pointer move. Returns a step once the gesture is zooming.
    pub fn update(&mut self, y: i32, threshold: i32, sensitivity: f64, floor: f64, max_zoom: f64) -> Option<ZoomStep> {
        let began = match self.phase {
            Phase::Idle => return None,
            Phase::Armed => {
                if !self.exceeds_threshold(y, threshold) {
                    return None;
                }
                self.phase = Phase::Zooming;
                true
            }
            Phase::Zooming => false,
        };

        let delta_y = f64::from(self.down_y - y);
        Some(ZoomStep {
            zoom: drag_zoom(self.start_zoom, delta_y, sensitivity, floor, max_zoom),
            anchor_time: self.anchor_time,
            anchor_x: self.down_x,
            began,
        })
    }

    /// Return to idle. `true` if a zoom gesture just ended.
    pub fn release(&mut self) -> bool {
        let was_zooming = self.is_zooming();
        self.phase = Phase::Idle;
        was_zooming
    }
}

impl Default for ZoomDrag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_scroll() {
        // 10s at 40 px/s = 400px + 18px padding, minus half of 800
        assert_eq!(centered_scroll(10.0, 40.0, 800), 18);
    }

    #[test]
    fn test_anchor_lands_on_pixel() {
        for &(time, zoom, x) in &[(12.34, 57.3, 300), (1.0, 1000.0, 650), (250.0, 3.3, 10)] {
            let scroll = anchored_scroll(time, zoom, x);
            assert_eq!(coords::time_to_pixel(time, zoom, scroll), x);
        }
    }

    #[test]
    fn test_drag_zoom_octaves() {
        assert_eq!(drag_zoom(100.0, 150.0, 150.0, 1.0, 10_000.0), 200.0);
        assert_eq!(drag_zoom(100.0, -150.0, 150.0, 1.0, 10_000.0), 50.0);
        assert_eq!(drag_zoom(100.0, 100.0, 50.0, 1.0, 10_000.0), 400.0);
        assert_eq!(drag_zoom(100.0, 0.0, 150.0, 1.0, 10_000.0), 100.0);
    }

    #[test]
    fn test_drag_zoom_clamps() {
        assert_eq!(drag_zoom(100.0, -5000.0, 150.0, 2.5, 10_000.0), 2.5);
        assert_eq!(drag_zoom(100.0, 5000.0, 150.0, 2.5, 10_000.0), 10_000.0);
        assert_eq!(drag_zoom(f64::NAN, 10.0, 150.0, 2.5, 10_000.0), 2.5);
    }

    #[test]
    fn test_fit_zoom_floor() {
        let config = TimelineConfig::default();
        // (800 - 50) / 300
        assert_eq!(fit_zoom_floor(&config, 800, 300.0), 2.5);
        assert_eq!(fit_zoom_floor(&config, 20, 300.0), config.min_zoom);
        assert_eq!(fit_zoom_floor(&config, 800, 0.0), config.min_zoom);
    }

    #[test]
    fn test_fit_range() {
        let (zoom, left) = fit_range(10.0, 20.0, 0.0, 818).unwrap();
        assert_eq!(zoom, 80.0);
        assert_eq!(left, 10.0);

        let (zoom, left) = fit_range(20.0, 10.0, 0.05, 818).unwrap();
        assert!((zoom - 800.0 / 11.0).abs() < 1e-9);
        assert!((left - 9.5).abs() < 1e-9);

        assert!(fit_range(5.0, 5.0, 0.05, 800).is_none());
        assert!(fit_range(0.0, 5.0, 0.05, 10).is_none());
    }

    #[test]
    fn test_zoom_drag_machine() {
        let mut drag = ZoomDrag::new();
        assert!(drag.update(0, 5, 150.0, 1.0, 100.0).is_none());

        drag.arm(300, 40, 20.0, 14.1);
        assert!(drag.is_armed());
        // Within threshold: nothing yet
        assert!(drag.update(37, 5, 150.0, 1.0, 10_000.0).is_none());

        let step = drag.update(30, 5, 150.0, 1.0, 10_000.0).unwrap();
        assert!(step.began);
        assert!(step.zoom > 20.0);
        assert_eq!(step.anchor_x, 300);
        assert_eq!(step.anchor_time, 14.1);

        let step = drag.update(190, 5, 150.0, 1.0, 10_000.0).unwrap();
        assert!(!step.began);
        assert_eq!(step.zoom, 10.0);

        assert!(drag.release());
        assert!(!drag.release());
    }
}
