//! Data types shared by the engine, its subscribers and downstream consumers.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo_utils::Bounds;

// ============================================================================
// Points
// ============================================================================

/// A single location sample. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy reported by the location provider, in meters
    pub accuracy: f32,
    /// Ground speed in m/s, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl TrackedPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>, accuracy: f32) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Workout phase. Phases always occur in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseType {
    Warmup,
    Laps,
    Cooldown,
}

impl PhaseType {
    pub fn label(self) -> &'static str {
        match self {
            PhaseType::Warmup => "WARMUP",
            PhaseType::Laps => "LAPS",
            PhaseType::Cooldown => "COOLDOWN",
        }
    }
}

/// Kind of activity being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    #[default]
    Run,
    DogWalk,
}

/// Why the workout is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PauseReason {
    /// User pressed pause
    Manual,
    /// Speed-based detector saw the subject stand still
    Auto,
    /// Subject arrived back home
    HomeArrival,
}

// ============================================================================
// Laps & Phases
// ============================================================================

/// A closed lap inside the laps phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lap {
    /// 1-based, sequential
    pub lap_number: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub distance_meters: f64,
    pub step_count: u32,
    /// First point index (into the workout's point list) belonging to this lap.
    /// Both indices are 0 when the lap saw no points; use [`Lap::point_range`]
    /// rather than slicing with them directly.
    pub start_index: usize,
    /// Last point index belonging to this lap
    pub end_index: usize,
    /// Position of the last point when the lap was closed
    pub split_latitude: Option<f64>,
    pub split_longitude: Option<f64>,
}

impl Lap {
    pub fn duration_millis(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    /// Whole seconds, truncated.
    pub fn duration_seconds(&self) -> i64 {
        self.duration_millis() / 1000
    }

    /// Index range of this lap within a point list of `point_count` points.
    ///
    /// `None` if the range does not fit, e.g. a lap closed before any point
    /// was recorded.
    pub fn point_range(&self, point_count: usize) -> Option<RangeInclusive<usize>> {
        (self.start_index <= self.end_index && self.end_index < point_count)
            .then(|| self.start_index..=self.end_index)
    }
}

/// A closed workout phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub phase_type: PhaseType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub distance_meters: f64,
    pub step_count: u32,
    /// Only populated for the laps phase
    pub laps: Vec<Lap>,
}

impl Phase {
    pub fn duration_millis(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_millis() / 1000
    }
}

// ============================================================================
// Live snapshot
// ============================================================================

/// Observable snapshot of the engine, re-derived after every change.
///
/// Never the source of truth; a fresh value is published for each mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingState {
    pub is_active: bool,
    pub is_paused: bool,
    pub is_auto_paused: bool,
    pub is_home_arrival_paused: bool,
    /// Present only while a workout is active
    pub workout_id: Option<String>,
    pub activity_type: ActivityType,
    /// `None` while inactive
    pub phase: Option<PhaseType>,
    /// Active (non-paused) time, refreshed by `update_elapsed`
    pub elapsed_seconds: u64,
    /// Running total over all recorded points
    pub distance_meters: f64,
    /// Seconds per distance unit over the recent window
    pub current_pace_seconds: Option<u32>,
    /// Seconds per distance unit over the whole workout
    pub average_pace_seconds: Option<u32>,
    pub step_count: u32,
    /// Number of closed laps
    pub lap_count: u32,
    /// Number of the lap in progress, 0 outside the laps phase
    pub current_lap_number: u32,
    pub current_lap_elapsed_seconds: u64,
    /// Last closed lap minus the one before it; negative is faster
    pub last_lap_delta_seconds: Option<i64>,
    pub last_lap_duration_seconds: Option<i64>,
    pub last_lap_duration_formatted: Option<String>,
    pub ghost_lap_duration_seconds: Option<u32>,
    /// Current lap elapsed minus the ghost; negative means ahead
    pub ghost_delta_seconds: Option<i64>,
    pub auto_lap_anchor_set: bool,
}

// ============================================================================
// Terminal output
// ============================================================================

/// The complete, phase-segmented result of one workout, produced once by `stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub workout_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub points: Vec<TrackedPoint>,
    pub total_distance_meters: f64,
    pub total_paused_duration_millis: i64,
    pub phases: Vec<Phase>,
    pub activity_type: ActivityType,
    pub total_steps: u32,
}

impl WorkoutRecord {
    /// Wall-clock duration including pauses.
    pub fn duration_millis(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    /// Duration excluding paused time.
    pub fn active_duration_millis(&self) -> i64 {
        (self.duration_millis() - self.total_paused_duration_millis).max(0)
    }

    /// The phase of the given type, if the workout reached it.
    pub fn phase(&self, phase_type: PhaseType) -> Option<&Phase> {
        self.phases.iter().find(|p| p.phase_type == phase_type)
    }

    /// Laps from the laps phase, empty if laps never started.
    pub fn laps(&self) -> &[Lap] {
        self.phase(PhaseType::Laps)
            .map(|p| p.laps.as_slice())
            .unwrap_or(&[])
    }

    /// Points covered by `lap`, `None` if its range is not in this record.
    pub fn lap_points(&self, lap: &Lap) -> Option<&[TrackedPoint]> {
        self.points.get(lap.point_range(self.points.len())?)
    }

    /// Bounding box of the recorded track.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
