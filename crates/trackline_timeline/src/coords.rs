// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pixel/time conversion.
//!
//! Every surface that draws against the time axis (ruler, track content,
//! playhead overlay) converts through these functions so that a given time
//! lands on the same pixel column everywhere.
//!
//! "Global" pixels are relative to the visible viewport's left edge and
//! include the scroll offset. "Local" pixels are relative to the start of the
//! scrollable content.

/// Fixed pixel inset before time zero on every time-axis surface.
pub const LEFT_PADDING: i32 = 18;

/// Convert a viewport pixel to seconds.
pub fn pixel_to_time(px: i32, zoom: f64, scroll_x: i32) -> f64 {
    if !(zoom > 0.0) {
        return 0.0;
    }
    f64::from(px + scroll_x - LEFT_PADDING) / zoom
}

/// Convert a content pixel to seconds.
pub fn pixel_to_time_local(px: i32, zoom: f64) -> f64 {
    pixel_to_time(px, zoom, 0)
}

/// Convert seconds to a viewport pixel.
pub fn time_to_pixel(time: f64, zoom: f64, scroll_x: i32) -> i32 {
    duration_to_pixels(time, zoom) + LEFT_PADDING - scroll_x
}

/// Convert seconds to a content pixel.
pub fn time_to_pixel_local(time: f64, zoom: f64) -> i32 {
    duration_to_pixels(time, zoom) + LEFT_PADDING
}

/// Width in pixels of a span of `duration` seconds.
pub fn duration_to_pixels(duration: f64, zoom: f64) -> i32 {
    if !(zoom > 0.0) {
        return 0;
    }
    // `as` saturates, so huge products cannot wrap
    (duration * zoom) as i32
}

/// Width of the scrollable content.
///
/// Never narrower than one and a half viewports so there is always room to
/// scroll past the end of a short timeline.
pub fn content_width(timeline_length: f64, zoom: f64, viewport_width: i32) -> i32 {
    let timeline_px = duration_to_pixels(timeline_length, zoom);
    timeline_px.max(viewport_width + viewport_width / 2)
}

/// Largest valid horizontal scroll offset.
pub fn max_scroll_x(timeline_length: f64, zoom: f64, viewport_width: i32) -> i32 {
    (content_width(timeline_length, zoom, viewport_width) - viewport_width).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_position_to_time() {
        // 218px with 18px padding at 20 px/s is 10 seconds
        assert_eq!(pixel_to_time(218, 20.0, 0), 10.0);
        assert_eq!(pixel_to_time(218, 20.0, 200), 20.0);
        assert_eq!(pixel_to_time_local(18, 20.0), 0.0);
    }

    #[test]
    fn test_time_to_pixel() {
        assert_eq!(time_to_pixel(10.0, 20.0, 0), 218);
        assert_eq!(time_to_pixel(10.0, 20.0, 100), 118);
        assert_eq!(time_to_pixel_local(0.0, 20.0), LEFT_PADDING);
        assert_eq!(duration_to_pixels(2.5, 40.0), 100);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        for &zoom in &[0.5, 3.7, 20.0, 123.45, 2000.0] {
            for &scroll in &[0, 17, 480] {
                let mut t = 0.0;
                while t < 120.0 {
                    let back = pixel_to_time(time_to_pixel(t, zoom, scroll), zoom, scroll);
                    assert!((back - t).abs() * zoom <= 1.0, "t={t} zoom={zoom} back={back}");
                    t += 0.731;
                }
            }
        }
    }

    #[test]
    fn test_non_positive_zoom_falls_back() {
        assert_eq!(pixel_to_time(500, 0.0, 0), 0.0);
        assert_eq!(pixel_to_time(500, -3.0, 0), 0.0);
        assert_eq!(pixel_to_time(500, f64::NAN, 0), 0.0);
        assert_eq!(duration_to_pixels(10.0, 0.0), 0);
    }

    #[test]
    fn test_content_width_and_max_scroll() {
        // 300s at 20 px/s = 6000px
        assert_eq!(content_width(300.0, 20.0, 800), 6000);
        assert_eq!(max_scroll_x(300.0, 20.0, 800), 5200);

        // Short timeline still leaves half a viewport of slack
        assert_eq!(content_width(10.0, 20.0, 800), 1200);
        assert_eq!(max_scroll_x(10.0, 20.0, 800), 400);

        assert_eq!(max_scroll_x(10.0, 20.0, 0), 200);
    }
}
