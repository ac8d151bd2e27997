// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grid snapping and time labels.

use crate::state::{TempoState, TimeDisplayMode};

/// Grid intervals (seconds) available in seconds mode, finest first.
pub const SECONDS_LADDER: &[f64] = &[
    0.000_001, 0.000_002, 0.000_005,
    0.000_01, 0.000_02, 0.000_05,
    0.000_1, 0.000_2, 0.000_5,
    0.001, 0.002, 0.005,
    0.01, 0.02, 0.05,
    0.1, 0.2, 0.25, 0.5,
    1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0,
];

/// Beat subdivisions tried before whole bars, finest first.
pub const BEAT_FRACTIONS: &[f64] = &[0.0625, 0.125, 0.25, 0.5, 1.0];

/// Bar multiples tried after whole beats.
pub const BAR_MULTIPLES: &[u32] = &[1, 2, 4, 8, 16, 32];

/// Pick the finest grid interval whose on-screen width is legible.
///
/// Falls back to the coarsest interval of the active ladder when nothing is
/// wide enough, so increasing the zoom can only make the grid finer.
pub fn snap_interval(
    zoom: f64,
    mode: TimeDisplayMode,
    tempo: &TempoState,
    min_pixel_spacing: f64,
) -> f64 {
    if !(zoom > 0.0) {
        return match mode {
            TimeDisplayMode::Seconds => SECONDS_LADDER[SECONDS_LADDER.len() - 1],
            TimeDisplayMode::BarsBeats => coarsest_bars_interval(tempo),
        };
    }

    let legible = |interval: f64| interval * zoom >= min_pixel_spacing;

    match mode {
        TimeDisplayMode::Seconds => SECONDS_LADDER
            .iter()
            .copied()
            .find(|&interval| legible(interval))
            .unwrap_or(SECONDS_LADDER[SECONDS_LADDER.len() - 1]),
        TimeDisplayMode::BarsBeats => {
            let beat = tempo.seconds_per_beat();
            let bar = tempo.seconds_per_bar();
            BEAT_FRACTIONS
                .iter()
                .map(|&fraction| fraction * beat)
                .chain(BAR_MULTIPLES.iter().map(|&bars| f64::from(bars) * bar))
                .find(|&interval| legible(interval))
                .unwrap_or_else(|| coarsest_bars_interval(tempo))
        }
    }
}

fn coarsest_bars_interval(tempo: &TempoState) -> f64 {
    let bars = BAR_MULTIPLES[BAR_MULTIPLES.len() - 1];
    f64::from(bars) * tempo.seconds_per_bar()
}

/// Round `time` to the nearest multiple of `interval`.
pub fn snap_to_interval(time: f64, interval: f64) -> f64 {
    if !(interval > 0.0) {
        return time;
    }
    (time / interval).round() * interval
}

/// Format a time position for display.
///
/// Seconds mode gives `"4.5s"` below a minute and `"M:SS"` from there on.
/// Bars mode gives a 1-indexed `"bar.beat.sub"` with quarter-beat subs.
pub fn format_time_position(time: f64, mode: TimeDisplayMode, tempo: &TempoState) -> String {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
    match mode {
        TimeDisplayMode::Seconds => {
            if time < 60.0 {
                format!("{time:.1}s")
            } else {
                let total = time as u64;
                format!("{}:{:02}", total / 60, total % 60)
            }
        }
        TimeDisplayMode::BarsBeats => {
            let beats_per_bar = f64::from(tempo.numerator);
            let total_beats = tempo.seconds_to_beats(time);
            let bar = (total_beats / beats_per_bar) as u64 + 1;
            let beat_in_bar = total_beats % beats_per_bar;
            let beat = beat_in_bar as u64 + 1;
            let sub = (beat_in_bar.fract() * 4.0) as u64 + 1;
            format!("{bar}.{beat}.{sub}")
        }
    }
}
