//! # Workout Tracker
//!
//! Live GPS workout tracking: phases, laps, pace and ghost-lap comparison.
//!
//! This library provides:
//! - A tracking state engine (warmup → laps → cooldown) fed by GPS samples
//! - Pace estimation with plausibility filtering
//! - Automatic ghost lap tracking and live ghost deltas
//! - Lap trend analysis for finished workouts
//! - A thread-safe tracker handle publishing snapshots via `tokio::sync::watch`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{DateTime, Utc};
//! use workout_tracker::{Clock, ManualClock, PhaseType, TrackedPoint, TrackerConfig, WorkoutTracker};
//!
//! let clock = ManualClock::new(DateTime::<Utc>::UNIX_EPOCH);
//! let tracker = WorkoutTracker::with_clock(TrackerConfig::default(), Arc::new(clock.clone()));
//!
//! tracker.start().unwrap();
//! for i in 0..5 {
//!     clock.advance_secs(6);
//!     let lat = 51.5074 + i as f64 * 0.0001;
//!     tracker.add_point(TrackedPoint::new(lat, -0.1278, clock.now(), 5.0));
//! }
//! tracker.update_elapsed();
//! assert_eq!(tracker.state().elapsed_seconds, 30);
//!
//! let record = tracker.stop().unwrap();
//! assert_eq!(record.phases.len(), 1);
//! assert_eq!(record.phases[0].phase_type, PhaseType::Warmup);
//! assert!((record.total_distance_meters - 44.5).abs() < 0.5);
//! ```

// Unified error handling
pub mod error;
pub use error::{Result, TrackerError};

// Engine configuration
pub mod config;
pub use config::{AutoLapConfig, AutoPauseConfig, DistanceUnit, PaceConfig, TrackerConfig};

// Injectable time source
pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

// Core data model (points, phases, laps, snapshots, records)
pub mod types;
pub use types::{
    ActivityType, Lap, PauseReason, Phase, PhaseType, TrackedPoint, TrackingState, WorkoutRecord,
};

// Geographic utilities (distance, bounds)
pub mod geo_utils;
pub use geo_utils::Bounds;

// Pace estimation
pub mod pace;

// Display formatting
pub mod format;

// Lap trend analysis for finished workouts
pub mod analysis;
pub use analysis::{LapAnalysis, LapTrend};

// Speed-based auto-pause recommendations
pub mod auto_pause;
pub use auto_pause::{AutoPauseDecision, AutoPauseDetector};

// Stateful workout engine
pub mod engine;
pub use engine::TrackingEngine;

// Thread-safe handle with snapshot publishing
pub mod tracker;
pub use tracker::{RouteView, WorkoutTracker};
