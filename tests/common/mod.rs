//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use workout_tracker::{Clock, ManualClock, TrackedPoint, TrackerConfig, TrackingEngine, WorkoutTracker};

pub const BASE_LAT: f64 = 37.7749;
pub const BASE_LON: f64 = -122.4194;

/// Meters per degree of latitude on the haversine sphere.
pub const METERS_PER_DEGREE_LAT: f64 = 111_194.93;

/// A fixed, arbitrary start instant so tests never depend on wall time.
pub fn start_instant() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(19_800)
}

pub fn manual_clock() -> ManualClock {
    let _ = env_logger::builder().is_test(true).try_init();
    ManualClock::new(start_instant())
}

pub fn engine_with(config: TrackerConfig) -> (TrackingEngine, ManualClock) {
    let clock = manual_clock();
    let engine = TrackingEngine::with_clock(config, Arc::new(clock.clone()));
    (engine, clock)
}

pub fn tracker_with(config: TrackerConfig) -> (WorkoutTracker, ManualClock) {
    let clock = manual_clock();
    let tracker = WorkoutTracker::with_clock(config, Arc::new(clock.clone()));
    (tracker, clock)
}

/// Point `meters` due north of the base coordinate, stamped "now".
pub fn north_of_base(clock: &ManualClock, meters: f64) -> TrackedPoint {
    TrackedPoint::new(
        BASE_LAT + meters / METERS_PER_DEGREE_LAT,
        BASE_LON,
        clock.now(),
        4.0,
    )
}
