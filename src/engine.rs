//! # Tracking Engine
//!
//! Stateful core that owns one in-progress workout: phase, pause status,
//! point ledger, lap ledger and ghost target.
//!
//! ## Architecture
//!
//! The engine is a plain `&mut self` state machine:
//!
//! ```text
//! INACTIVE --start--> WARMUP --start_laps--> LAPS --end_laps--> COOLDOWN
//!     ^                  |                     |                    |
//!     +------------------+--------stop---------+--------------------+
//! ```
//!
//! It does no locking and holds no timer. [`crate::WorkoutTracker`] wraps it
//! in a mutex for concurrent callers; an external ticker drives
//! [`TrackingEngine::update_elapsed`].
//!
//! Distance is only ever derived from the point stream. A phase or lap closes
//! with the increase in cumulative distance since it opened, so phase
//! distances always add up to the workout total.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::format::format_elapsed_time;
use crate::geo_utils::{distance_meters, haversine_distance};
use crate::pace;
use crate::{
    ActivityType, Lap, PauseReason, Phase, PhaseType, TrackedPoint, TrackingState, WorkoutRecord,
};

// ============================================================================
// Session State
// ============================================================================

/// A phase that has been opened but not yet closed.
#[derive(Debug, Clone)]
struct OpenPhase {
    phase_type: PhaseType,
    start_time: DateTime<Utc>,
    start_distance: f64,
    start_steps: u32,
}

/// The lap in progress during the laps phase.
#[derive(Debug, Clone)]
struct OpenLap {
    lap_number: u32,
    start_time: DateTime<Utc>,
    start_distance: f64,
    start_steps: u32,
    start_index: usize,
}

/// GPS anchor for automatic laps.
#[derive(Debug, Clone)]
struct AutoLapAnchor {
    latitude: f64,
    longitude: f64,
    has_left_radius: bool,
    last_lap_time: DateTime<Utc>,
}

/// Everything that exists between `start` and `stop`.
#[derive(Debug, Clone)]
struct Session {
    workout_id: String,
    activity_type: ActivityType,
    start_time: DateTime<Utc>,

    // Pause accounting
    pause: Option<(DateTime<Utc>, PauseReason)>,
    total_paused_ms: i64,

    // Point ledger
    points: Vec<TrackedPoint>,
    cumulative_distance: f64,

    // Steps
    step_baseline: Option<u32>,
    steps: u32,

    // Phases & laps
    open_phase: OpenPhase,
    completed_phases: Vec<Phase>,
    laps: Vec<Lap>,
    open_lap: Option<OpenLap>,
    auto_lap_anchor: Option<AutoLapAnchor>,

    // Ghost target
    ghost_seconds: Option<u32>,
    ghost_is_explicit: bool,

    // Figures refreshed by commands and ticks
    elapsed_seconds: u64,
    current_pace: Option<u32>,
    current_lap_elapsed_seconds: u64,
    ghost_delta_seconds: Option<i64>,
    last_lap_delta_seconds: Option<i64>,
    last_lap_duration_seconds: Option<i64>,
}

impl Session {
    fn new(activity_type: ActivityType, now: DateTime<Utc>) -> Self {
        Self {
            workout_id: Uuid::new_v4().to_string(),
            activity_type,
            start_time: now,
            pause: None,
            total_paused_ms: 0,
            points: Vec::new(),
            cumulative_distance: 0.0,
            step_baseline: None,
            steps: 0,
            open_phase: OpenPhase {
                phase_type: PhaseType::Warmup,
                start_time: now,
                start_distance: 0.0,
                start_steps: 0,
            },
            completed_phases: Vec::new(),
            laps: Vec::new(),
            open_lap: None,
            auto_lap_anchor: None,
            ghost_seconds: None,
            ghost_is_explicit: false,
            elapsed_seconds: 0,
            current_pace: None,
            current_lap_elapsed_seconds: 0,
            ghost_delta_seconds: None,
            last_lap_delta_seconds: None,
            last_lap_duration_seconds: None,
        }
    }

    fn phase(&self) -> PhaseType {
        self.open_phase.phase_type
    }

    fn is_paused(&self) -> bool {
        self.pause.is_some()
    }

    /// Index of the most recent point, 0 when there are none yet.
    fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Recompute active elapsed time, current-lap time and ghost delta.
    ///
    /// While paused the clock is frozen at the pause instant.
    fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        let effective_now = self.pause.map(|(since, _)| since).unwrap_or(now);

        let active_ms = (effective_now - self.start_time).num_milliseconds() - self.total_paused_ms;
        self.elapsed_seconds = (active_ms.max(0) / 1000) as u64;

        self.current_lap_elapsed_seconds = match (&self.open_lap, self.phase()) {
            (Some(lap), PhaseType::Laps) => {
                ((effective_now - lap.start_time).num_milliseconds().max(0) / 1000) as u64
            }
            _ => 0,
        };

        self.ghost_delta_seconds = match (self.phase(), self.ghost_seconds) {
            (PhaseType::Laps, Some(ghost)) => {
                Some(self.current_lap_elapsed_seconds as i64 - i64::from(ghost))
            }
            _ => None,
        };
    }

    fn open_lap(&mut self, lap_number: u32, now: DateTime<Utc>) {
        self.open_lap = Some(OpenLap {
            lap_number,
            start_time: now,
            start_distance: self.cumulative_distance,
            start_steps: self.steps,
            start_index: self.last_index(),
        });
        self.current_lap_elapsed_seconds = 0;
        self.ghost_delta_seconds = None;
    }

    /// Close the lap in progress, update the lap delta and auto ghost.
    ///
    /// Returns `false` if no lap was open.
    fn close_lap(&mut self, now: DateTime<Utc>) -> bool {
        let Some(open) = self.open_lap.take() else {
            return false;
        };

        let split = self.points.last().map(|p| (p.latitude, p.longitude));
        let lap = Lap {
            lap_number: open.lap_number,
            start_time: open.start_time,
            end_time: now,
            distance_meters: self.cumulative_distance - open.start_distance,
            step_count: self.steps.saturating_sub(open.start_steps),
            start_index: open.start_index,
            end_index: self.last_index().max(open.start_index),
            split_latitude: split.map(|(lat, _)| lat),
            split_longitude: split.map(|(_, lng)| lng),
        };

        self.laps.push(lap);
        self.refresh_lap_figures();
        self.ghost_delta_seconds = None;
        true
    }

    /// Re-derive last-lap figures and the auto ghost from the closed laps.
    fn refresh_lap_figures(&mut self) {
        let mut recent = self.laps.iter().rev();
        let last = recent.next();
        let previous = recent.next();

        self.last_lap_duration_seconds = last.map(Lap::duration_seconds);
        self.last_lap_delta_seconds = last
            .zip(previous)
            .map(|(last, prev)| (last.duration_millis() - prev.duration_millis()) / 1000);

        if !self.ghost_is_explicit {
            self.ghost_seconds = self
                .laps
                .iter()
                .map(|l| l.duration_seconds().max(0) as u32)
                .min();
        }
    }

    /// Fold a too-short final lap into the one before it.
    fn discard_micro_lap(&mut self, threshold_ms: i64) {
        if self.laps.len() < 2 {
            return;
        }
        let is_micro = self
            .laps
            .last()
            .is_some_and(|lap| lap.duration_millis() < threshold_ms);
        if !is_micro {
            return;
        }

        if let Some(micro) = self.laps.pop() {
            if let Some(prev) = self.laps.last_mut() {
                debug!(
                    "[WorkoutEngine] Merging {}ms micro-lap #{} into lap #{}",
                    micro.duration_millis(),
                    micro.lap_number,
                    prev.lap_number
                );
                prev.end_time = micro.end_time;
                prev.distance_meters += micro.distance_meters;
                prev.step_count += micro.step_count;
                prev.end_index = micro.end_index;
                prev.split_latitude = micro.split_latitude;
                prev.split_longitude = micro.split_longitude;
            }
            self.refresh_lap_figures();
        }
    }

    /// Close the open phase and open `next` (if any) at the same instant.
    fn close_phase(&mut self, now: DateTime<Utc>, next: Option<PhaseType>) {
        let laps = if self.phase() == PhaseType::Laps {
            self.laps.clone()
        } else {
            Vec::new()
        };

        self.completed_phases.push(Phase {
            phase_type: self.open_phase.phase_type,
            start_time: self.open_phase.start_time,
            end_time: now,
            distance_meters: self.cumulative_distance - self.open_phase.start_distance,
            step_count: self.steps.saturating_sub(self.open_phase.start_steps),
            laps,
        });

        if let Some(phase_type) = next {
            self.open_phase = OpenPhase {
                phase_type,
                start_time: now,
                start_distance: self.cumulative_distance,
                start_steps: self.steps,
            };
        }
    }
}

// ============================================================================
// Tracking Engine
// ============================================================================

/// The workout state machine.
///
/// Holds at most one workout. `stop` hands the finished workout out as a
/// [`WorkoutRecord`] and returns the engine to its idle baseline.
pub struct TrackingEngine {
    config: TrackerConfig,
    clock: Arc<dyn Clock>,
    session: Option<Session>,
}

impl TrackingEngine {
    /// Create an engine with default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Create an engine with custom configuration and the system clock.
    pub fn with_config(config: TrackerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an engine with custom configuration and time source.
    pub fn with_clock(config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            session: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect for subsequent commands.
    pub fn set_config(&mut self, config: TrackerConfig) {
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_paused)
    }

    /// Current phase, `None` while inactive.
    pub fn phase(&self) -> Option<PhaseType> {
        self.session.as_ref().map(Session::phase)
    }

    pub fn workout_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.workout_id.as_str())
    }

    /// Points recorded so far in the active workout.
    pub fn points(&self) -> &[TrackedPoint] {
        self.session
            .as_ref()
            .map(|s| s.points.as_slice())
            .unwrap_or(&[])
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start a run. See [`TrackingEngine::start_with`].
    pub fn start(&mut self) -> Result<String> {
        self.start_with(ActivityType::Run)
    }

    /// Start a new workout in the warmup phase and return its identifier.
    ///
    /// Fails with [`TrackerError::AlreadyActive`] if a workout is in progress;
    /// the running workout is left untouched.
    pub fn start_with(&mut self, activity_type: ActivityType) -> Result<String> {
        if let Some(session) = &self.session {
            warn!(
                "[WorkoutEngine] Rejected start: workout {} already active",
                session.workout_id
            );
            return Err(TrackerError::AlreadyActive {
                workout_id: session.workout_id.clone(),
            });
        }

        let session = Session::new(activity_type, self.clock.now());
        let id = session.workout_id.clone();
        info!("[WorkoutEngine] Started {:?} workout {}", activity_type, id);
        self.session = Some(session);
        Ok(id)
    }

    /// Finish the workout: close the open phase (and lap), assemble the
    /// record and reset to idle.
    pub fn stop(&mut self) -> Result<WorkoutRecord> {
        let mut session = self.session.take().ok_or(TrackerError::NotActive)?;
        let now = self.clock.now();

        // A pause still open at stop counts toward paused time
        if let Some((since, _)) = session.pause.take() {
            session.total_paused_ms += (now - since).num_milliseconds().max(0);
        }

        if session.phase() == PhaseType::Laps {
            session.close_lap(now);
            session.discard_micro_lap(self.config.micro_lap_threshold_ms);
        }
        session.close_phase(now, None);

        let record = WorkoutRecord {
            workout_id: session.workout_id,
            start_time: session.start_time,
            end_time: now,
            total_distance_meters: session.cumulative_distance,
            total_paused_duration_millis: session.total_paused_ms,
            phases: session.completed_phases,
            activity_type: session.activity_type,
            total_steps: session.steps,
            points: session.points,
        };

        info!(
            "[WorkoutEngine] Stopped workout {}: {:.0}m, {} points, {} phases, {}ms paused",
            record.workout_id,
            record.total_distance_meters,
            record.points.len(),
            record.phases.len(),
            record.total_paused_duration_millis
        );
        Ok(record)
    }

    // ========================================================================
    // Pause / Resume
    // ========================================================================

    /// Pause at the user's request.
    pub fn pause(&mut self) {
        self.pause_with(PauseReason::Manual);
    }

    /// Pause because the subject stopped moving.
    pub fn auto_pause(&mut self) {
        self.pause_with(PauseReason::Auto);
    }

    /// Pause because the subject arrived home.
    pub fn home_arrival_pause(&mut self) {
        self.pause_with(PauseReason::HomeArrival);
    }

    /// Enter the paused state.
    ///
    /// Pausing while already paused only updates the reason; the original
    /// pause instant is kept so paused time is counted once.
    pub fn pause_with(&mut self, reason: PauseReason) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            debug!("[WorkoutEngine] Ignoring pause: no active workout");
            return;
        };

        match session.pause.as_mut() {
            Some((_, current)) => *current = reason,
            None => {
                session.refresh_elapsed(now);
                session.pause = Some((now, reason));
                info!(
                    "[WorkoutEngine] Paused ({:?}) at {}s",
                    reason, session.elapsed_seconds
                );
            }
        }
    }

    /// Leave the paused state, whatever the reason was.
    pub fn resume(&mut self) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some((since, reason)) = session.pause.take() else {
            debug!("[WorkoutEngine] Ignoring resume: not paused");
            return;
        };

        let paused_ms = (now - since).num_milliseconds().max(0);
        session.total_paused_ms += paused_ms;
        session.refresh_elapsed(now);
        info!(
            "[WorkoutEngine] Resumed after {}ms ({:?}), {}ms paused in total",
            paused_ms, reason, session.total_paused_ms
        );
    }

    /// Resume triggered by the auto-pause detector.
    pub fn auto_resume(&mut self) {
        self.resume();
    }

    // ========================================================================
    // Points, Ticks & Steps
    // ========================================================================

    /// Append a location sample.
    ///
    /// Dropped (not queued) while paused or inactive. Returns whether the
    /// point was recorded.
    pub fn add_point(&mut self, point: TrackedPoint) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.is_paused() {
            debug!("[WorkoutEngine] Dropping point while paused");
            return false;
        }

        if let Some(prev) = session.points.last() {
            session.cumulative_distance += haversine_distance(prev, &point);
        }
        session.points.push(point);
        session.current_pace = pace::current_pace(&session.points, &self.config.pace);

        debug!(
            "[WorkoutEngine] Point #{}: {:.1}m total",
            session.points.len(),
            session.cumulative_distance
        );

        self.check_auto_lap();
        true
    }

    /// Refresh elapsed time and everything derived from it.
    ///
    /// Pull-based: an external ticker calls this periodically.
    pub fn update_elapsed(&mut self) {
        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.refresh_elapsed(now);
        }
    }

    /// Record the step sensor's reading at workout start.
    pub fn init_step_baseline(&mut self, sensor_steps: u32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.step_baseline = Some(sensor_steps);
        session.steps = 0;
        session.open_phase.start_steps = 0;
        if let Some(lap) = session.open_lap.as_mut() {
            lap.start_steps = 0;
        }
    }

    /// Update steps from a cumulative step sensor reading.
    pub fn update_step_count(&mut self, sensor_steps: u32) {
        if let Some(session) = self.session.as_mut() {
            session.steps = sensor_steps.saturating_sub(session.step_baseline.unwrap_or(0));
        }
    }

    // ========================================================================
    // Phases & Laps
    // ========================================================================

    /// Move from warmup into laps, opening lap #1. Ignored in any other phase.
    pub fn start_laps(&mut self) {
        let now = self.clock.now();
        let auto_lap = self.config.auto_lap.clone();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase() != PhaseType::Warmup {
            debug!(
                "[WorkoutEngine] Ignoring start_laps in {:?}",
                session.phase()
            );
            return;
        }

        session.close_phase(now, Some(PhaseType::Laps));
        session.last_lap_delta_seconds = None;
        session.open_lap(1, now);

        session.auto_lap_anchor = if auto_lap.enabled {
            session.points.last().map(|p| AutoLapAnchor {
                latitude: p.latitude,
                longitude: p.longitude,
                has_left_radius: false,
                last_lap_time: p.timestamp,
            })
        } else {
            None
        };

        info!(
            "[WorkoutEngine] Laps started at {:.0}m (auto-lap anchor: {})",
            session.cumulative_distance,
            session.auto_lap_anchor.is_some()
        );
    }

    /// Close the current lap and open the next. Ignored outside laps.
    pub fn mark_lap(&mut self) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase() != PhaseType::Laps {
            debug!("[WorkoutEngine] Ignoring mark_lap in {:?}", session.phase());
            return;
        }

        let next_number = session.open_lap.as_ref().map_or(1, |l| l.lap_number + 1);
        if session.close_lap(now) {
            if let Some(lap) = session.laps.last() {
                info!(
                    "[WorkoutEngine] Lap {} closed: {}s, {:.0}m (delta {:?}, ghost {:?})",
                    lap.lap_number,
                    lap.duration_seconds(),
                    lap.distance_meters,
                    session.last_lap_delta_seconds,
                    session.ghost_seconds
                );
            }
        }
        session.open_lap(next_number, now);
    }

    /// Close the final lap and the laps phase, then open cooldown. Ignored outside laps.
    pub fn end_laps(&mut self) {
        let now = self.clock.now();
        let threshold = self.config.micro_lap_threshold_ms;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase() != PhaseType::Laps {
            debug!("[WorkoutEngine] Ignoring end_laps in {:?}", session.phase());
            return;
        }

        session.close_lap(now);
        session.discard_micro_lap(threshold);
        session.close_phase(now, Some(PhaseType::Cooldown));
        session.auto_lap_anchor = None;
        session.current_lap_elapsed_seconds = 0;
        session.ghost_delta_seconds = None;

        info!(
            "[WorkoutEngine] Laps ended with {} laps, cooldown started",
            session.laps.len()
        );
    }

    /// Set or clear an explicit ghost lap duration.
    ///
    /// An explicit ghost is never replaced by the best-lap tracking. Clearing
    /// it hands control back to best-lap tracking from the next lap on.
    pub fn set_ghost_lap(&mut self, duration_seconds: Option<u32>) {
        let Some(session) = self.session.as_mut() else {
            debug!("[WorkoutEngine] Ignoring ghost: no active workout");
            return;
        };
        session.ghost_seconds = duration_seconds;
        session.ghost_is_explicit = duration_seconds.is_some();
        session.ghost_delta_seconds = None;
    }

    fn check_auto_lap(&mut self) {
        let radius = self.config.auto_lap.anchor_radius_meters;
        let cooldown_seconds = self.config.auto_lap.cooldown_seconds;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase() != PhaseType::Laps {
            return;
        }
        let Some(point) = session.points.last() else {
            return;
        };
        let point_time = point.timestamp;
        let Some(anchor) = session.auto_lap_anchor.as_mut() else {
            return;
        };

        let to_anchor =
            distance_meters(point.latitude, point.longitude, anchor.latitude, anchor.longitude);
        if to_anchor > radius {
            anchor.has_left_radius = true;
            return;
        }
        if !anchor.has_left_radius {
            return;
        }
        // Out-of-range cooldowns (unvalidated configs) never elapse
        let cooldown = Duration::try_seconds(cooldown_seconds).unwrap_or(Duration::MAX);
        if point_time - anchor.last_lap_time < cooldown {
            return;
        }

        anchor.has_left_radius = false;
        anchor.last_lap_time = point_time;
        debug!("[WorkoutEngine] Auto-lap: back at anchor");
        self.mark_lap();
    }

    // ========================================================================
    // Lap Queries
    // ========================================================================

    fn closed_laps(&self) -> &[Lap] {
        self.session
            .as_ref()
            .map(|s| s.laps.as_slice())
            .unwrap_or(&[])
    }

    /// Whole-second durations of all closed laps.
    pub fn lap_durations(&self) -> Vec<i64> {
        self.closed_laps().iter().map(Lap::duration_seconds).collect()
    }

    /// Fastest closed lap in seconds.
    pub fn best_lap_duration(&self) -> Option<i64> {
        self.closed_laps().iter().map(Lap::duration_seconds).min()
    }

    /// Number of the fastest closed lap (first one on ties).
    pub fn best_lap_number(&self) -> Option<u32> {
        self.closed_laps()
            .iter()
            .min_by_key(|l| l.duration_millis())
            .map(|l| l.lap_number)
    }

    /// Mean closed lap duration in whole seconds.
    pub fn average_lap_duration(&self) -> Option<i64> {
        let durations = self.lap_durations();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<i64>() / durations.len() as i64)
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// Derive the observable snapshot from current internal state.
    pub fn state(&self) -> TrackingState {
        let Some(session) = &self.session else {
            return TrackingState::default();
        };

        let (is_auto_paused, is_home_arrival_paused) = match session.pause {
            Some((_, PauseReason::Auto)) => (true, false),
            Some((_, PauseReason::HomeArrival)) => (false, true),
            _ => (false, false),
        };

        TrackingState {
            is_active: true,
            is_paused: session.is_paused(),
            is_auto_paused,
            is_home_arrival_paused,
            workout_id: Some(session.workout_id.clone()),
            activity_type: session.activity_type,
            phase: Some(session.phase()),
            elapsed_seconds: session.elapsed_seconds,
            distance_meters: session.cumulative_distance,
            current_pace_seconds: session.current_pace,
            average_pace_seconds: pace::average_pace(
                session.elapsed_seconds,
                session.cumulative_distance,
                &self.config.pace,
            ),
            step_count: session.steps,
            lap_count: session.laps.len() as u32,
            current_lap_number: session.open_lap.as_ref().map_or(0, |l| l.lap_number),
            current_lap_elapsed_seconds: session.current_lap_elapsed_seconds,
            last_lap_delta_seconds: session.last_lap_delta_seconds,
            last_lap_duration_seconds: session.last_lap_duration_seconds,
            last_lap_duration_formatted: session.last_lap_duration_seconds.map(format_elapsed_time),
            ghost_lap_duration_seconds: session.ghost_seconds,
            ghost_delta_seconds: session.ghost_delta_seconds,
            auto_lap_anchor_set: session.auto_lap_anchor.is_some(),
        }
    }

    /// Snapshot as JSON for hosts that consume strings.
    pub fn state_json(&self) -> String {
        serde_json::to_string(&self.state()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for TrackingEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
