//! Tracker configuration.
//!
//! All thresholds that shape live tracking live here so that hosts can tune
//! them (or load them from JSON) without touching the engine. Every struct
//! has a `Default` matching the values the tracker was tuned with.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Distance unit that pace figures are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceUnit {
    /// Seconds per mile
    #[default]
    Miles,
    /// Seconds per kilometer
    Kilometers,
}

impl DistanceUnit {
    /// Convert meters to this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Miles => meters / METERS_PER_MILE,
            DistanceUnit::Kilometers => meters / 1000.0,
        }
    }

    /// Convert a value in this unit to meters.
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            DistanceUnit::Miles => value * METERS_PER_MILE,
            DistanceUnit::Kilometers => value * 1000.0,
        }
    }

    /// Short label used in formatted output ("mi", "km").
    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Configuration for pace estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaceConfig {
    /// Unit that pace is expressed per. Default: miles
    pub unit: DistanceUnit,

    /// Minimum distance (in `unit`) before average and segment pace are reported.
    /// Suppresses inflated numbers from GPS noise at startup. Default: 0.01
    pub min_average_distance_units: f64,

    /// Minimum straight-line distance (in `unit`) across the current-pace window.
    /// Smaller than the average floor because the window is short. Default: 0.005
    pub min_window_distance_units: f64,

    /// Plausibility ceiling for current pace in seconds per unit.
    /// Anything slower is treated as a stationary subject with drifting GPS.
    /// Default: 1800 (30:00 per unit)
    pub max_current_pace_seconds: u32,

    /// Number of trailing points used for current pace. Default: 10
    pub window_size: usize,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            unit: DistanceUnit::Miles,
            min_average_distance_units: 0.01,
            min_window_distance_units: 0.005,
            max_current_pace_seconds: 1800,
            window_size: 10,
        }
    }
}

/// Upper bound accepted for `AutoLapConfig::cooldown_seconds` (one day).
pub const MAX_AUTO_LAP_COOLDOWN_SECONDS: i64 = 86_400;

/// Configuration for GPS-anchored automatic laps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoLapConfig {
    /// Whether returning to the laps start point marks a lap. Default: false
    pub enabled: bool,

    /// Radius around the anchor that counts as "back at the start". Default: 15m
    pub anchor_radius_meters: f64,

    /// Minimum time between automatic laps, by point timestamps. Default: 30s
    pub cooldown_seconds: i64,
}

impl Default for AutoLapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            anchor_radius_meters: 15.0,
            cooldown_seconds: 30,
        }
    }
}

/// Configuration for the speed-based auto-pause detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoPauseConfig {
    /// Speeds below this are considered stationary. Default: 0.5 m/s (~1.1 mph)
    pub speed_threshold_mps: f32,

    /// Sustained stillness required before pausing. Default: 5000ms
    pub pause_window_ms: i64,

    /// Window searched for movement while auto-paused. Default: 3000ms
    pub resume_window_ms: i64,

    /// How long samples are retained. Default: 10000ms
    pub retention_ms: i64,

    /// Minimum samples with speed inside the pause window. Default: 3
    pub min_points_for_pause: usize,
}

impl Default for AutoPauseConfig {
    fn default() -> Self {
        Self {
            speed_threshold_mps: 0.5,
            pause_window_ms: 5_000,
            resume_window_ms: 3_000,
            retention_ms: 10_000,
            min_points_for_pause: 3,
        }
    }
}

/// Top-level tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    pub pace: PaceConfig,
    pub auto_lap: AutoLapConfig,
    pub auto_pause: AutoPauseConfig,

    /// A final lap shorter than this is folded into the previous lap when the
    /// laps phase closes. Default: 5000ms
    pub micro_lap_threshold_ms: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pace: PaceConfig::default(),
            auto_lap: AutoLapConfig::default(),
            auto_pause: AutoPauseConfig::default(),
            micro_lap_threshold_ms: 5_000,
        }
    }
}

impl TrackerConfig {
    /// Parse and validate a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        let pace = &self.pace;
        if !(pace.min_average_distance_units > 0.0) {
            return Err(TrackerError::invalid_config(
                "pace.minAverageDistanceUnits must be positive",
            ));
        }
        if !(pace.min_window_distance_units > 0.0) {
            return Err(TrackerError::invalid_config(
                "pace.minWindowDistanceUnits must be positive",
            ));
        }
        if pace.max_current_pace_seconds == 0 {
            return Err(TrackerError::invalid_config(
                "pace.maxCurrentPaceSeconds must be positive",
            ));
        }
        if pace.window_size < 2 {
            return Err(TrackerError::invalid_config(
                "pace.windowSize must be at least 2",
            ));
        }
        if !(self.auto_lap.anchor_radius_meters > 0.0) {
            return Err(TrackerError::invalid_config(
                "autoLap.anchorRadiusMeters must be positive",
            ));
        }
        if !(0..=MAX_AUTO_LAP_COOLDOWN_SECONDS).contains(&self.auto_lap.cooldown_seconds) {
            return Err(TrackerError::invalid_config(format!(
                "autoLap.cooldownSeconds must be between 0 and {}",
                MAX_AUTO_LAP_COOLDOWN_SECONDS
            )));
        }
        let auto_pause = &self.auto_pause;
        if auto_pause.pause_window_ms <= 0
            || auto_pause.resume_window_ms <= 0
            || auto_pause.retention_ms < auto_pause.pause_window_ms.max(auto_pause.resume_window_ms)
        {
            return Err(TrackerError::invalid_config(
                "autoPause windows must be positive and fit inside the retention window",
            ));
        }
        if self.micro_lap_threshold_ms < 0 {
            return Err(TrackerError::invalid_config(
                "microLapThresholdMs must not be negative",
            ));
        }
        Ok(())
    }
}
