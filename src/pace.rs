//! Pace estimation from elapsed time and GPS samples.
//!
//! All pace figures are whole seconds per distance unit (`PaceConfig::unit`),
//! truncated. Every function returns `None` instead of a sentinel when no
//! meaningful pace can be derived yet, so "no data" never reads as "zero pace".
//!
//! ## Example
//! ```rust
//! use workout_tracker::config::{PaceConfig, METERS_PER_MILE};
//! use workout_tracker::pace::average_pace;
//!
//! let config = PaceConfig::default(); // seconds per mile
//! assert_eq!(average_pace(600, METERS_PER_MILE, &config), Some(600));
//! assert_eq!(average_pace(600, 5.0, &config), None); // too little distance yet
//! ```

use chrono::{DateTime, Utc};

use crate::config::PaceConfig;
use crate::geo_utils::haversine_distance;
use crate::TrackedPoint;

/// Average pace over the whole workout.
///
/// Returns `None` until `min_average_distance_units` have been covered.
pub fn average_pace(elapsed_seconds: u64, distance_meters: f64, config: &PaceConfig) -> Option<u32> {
    let units = config.unit.from_meters(distance_meters);
    if units < config.min_average_distance_units {
        return None;
    }
    Some((elapsed_seconds as f64 / units) as u32)
}

/// Pace right now, from the trailing window of points.
///
/// Uses the straight-line distance between the first and last point of the
/// window rather than the path length, which smooths short-term GPS jitter.
/// Returns `None` when:
/// - fewer than two points are available
/// - the window covers less than `min_window_distance_units`
/// - the implied pace is slower than `max_current_pace_seconds` (standing
///   still while the fix drifts)
pub fn current_pace(recent_points: &[TrackedPoint], config: &PaceConfig) -> Option<u32> {
    let window_start = recent_points.len().saturating_sub(config.window_size);
    let window = &recent_points[window_start..];
    if window.len() < 2 {
        return None;
    }

    let first = &window[0];
    let last = &window[window.len() - 1];

    let units = config.unit.from_meters(haversine_distance(first, last));
    if units < config.min_window_distance_units {
        return None;
    }

    let seconds = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
    if seconds <= 0.0 {
        return None;
    }

    let pace = seconds / units;
    if pace > config.max_current_pace_seconds as f64 {
        return None;
    }
    Some(pace as u32)
}

/// Pace over a closed interval such as a lap or phase.
///
/// Same distance floor as [`average_pace`]; no plausibility ceiling since the
/// interval is already settled rather than a live sample.
pub fn segment_pace(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    distance_meters: f64,
    config: &PaceConfig,
) -> Option<u32> {
    let units = config.unit.from_meters(distance_meters);
    if units < config.min_average_distance_units {
        return None;
    }
    let seconds = (end_time - start_time).num_milliseconds().max(0) as f64 / 1000.0;
    Some((seconds / units) as u32)
}
