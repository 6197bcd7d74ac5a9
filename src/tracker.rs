//! Thread-safe handle over a [`TrackingEngine`].
//!
//! Location callbacks, a periodic ticker and the UI can all hold a clone of
//! the same [`WorkoutTracker`]. Every command takes the engine lock, mutates,
//! and publishes the new snapshot before releasing it, so subscribers see
//! snapshots in exactly the order the commands were applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::info;
use tokio::sync::watch;

use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::engine::TrackingEngine;
use crate::error::Result;
use crate::{ActivityType, PhaseType, TrackedPoint, TrackingState, WorkoutRecord};

// ============================================================================
// Route View
// ============================================================================

/// The recorded route as of one published update.
///
/// Views of the same workout share one append-only ledger and differ only in
/// how many points they cover, so publishing a view per point is O(1). A new
/// workout starts a new ledger; older views keep the one they were cut from.
#[derive(Debug, Clone, Default)]
pub struct RouteView {
    ledger: Arc<RwLock<Vec<TrackedPoint>>>,
    workout_id: Option<String>,
    len: usize,
}

impl RouteView {
    fn fresh(engine: &TrackingEngine) -> Self {
        let points = engine.points().to_vec();
        Self {
            len: points.len(),
            ledger: Arc::new(RwLock::new(points)),
            workout_id: engine.workout_id().map(str::to_string),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Workout the route belongs to, `None` while idle.
    pub fn workout_id(&self) -> Option<&str> {
        self.workout_id.as_deref()
    }

    /// Run `f` over the points this view covers.
    pub fn with_points<R>(&self, f: impl FnOnce(&[TrackedPoint]) -> R) -> R {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        f(&ledger[..self.len])
    }

    pub fn last(&self) -> Option<TrackedPoint> {
        self.with_points(|points| points.last().cloned())
    }

    pub fn to_vec(&self) -> Vec<TrackedPoint> {
        self.with_points(<[TrackedPoint]>::to_vec)
    }
}

// ============================================================================
// Workout Tracker
// ============================================================================

struct Shared {
    engine: Mutex<TrackingEngine>,
    state_tx: watch::Sender<TrackingState>,
    route_tx: watch::Sender<RouteView>,
}

/// Cloneable, `Send + Sync` handle to one workout engine.
#[derive(Clone)]
pub struct WorkoutTracker {
    shared: Arc<Shared>,
}

impl WorkoutTracker {
    /// Tracker with default configuration and the system clock.
    pub fn new() -> Self {
        Self::from_engine(TrackingEngine::new())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self::from_engine(TrackingEngine::with_config(config))
    }

    pub fn with_clock(config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_engine(TrackingEngine::with_clock(config, clock))
    }

    pub fn from_engine(engine: TrackingEngine) -> Self {
        let (state_tx, _) = watch::channel(engine.state());
        let (route_tx, _) = watch::channel(RouteView::fresh(&engine));
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                state_tx,
                route_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackingEngine> {
        // Keep serving after a panicked command
        self.shared
            .engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a command against the engine and publish the resulting snapshot.
    ///
    /// Publishing happens while the lock is still held. The route is only
    /// republished when it changed.
    pub fn with_engine<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut TrackingEngine) -> R,
    {
        let mut engine = self.lock();
        let result = f(&mut engine);
        self.shared.state_tx.send_replace(engine.state());
        self.publish_route(&engine);
        result
    }

    /// Bring the published route in line with the engine's point ledger.
    ///
    /// Must be called with the engine lock held.
    fn publish_route(&self, engine: &TrackingEngine) {
        let current = self.shared.route_tx.borrow().clone();
        let points = engine.points();

        if current.workout_id() != engine.workout_id() || points.len() < current.len {
            self.shared.route_tx.send_replace(RouteView::fresh(engine));
            return;
        }
        if points.len() == current.len {
            return;
        }

        {
            let mut ledger = current.ledger.write().unwrap_or_else(PoisonError::into_inner);
            let recorded = ledger.len();
            ledger.extend_from_slice(points.get(recorded..).unwrap_or(&[]));
        }
        self.shared.route_tx.send_replace(RouteView {
            len: points.len(),
            ..current
        });
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn start(&self) -> Result<String> {
        self.start_with(ActivityType::Run)
    }

    pub fn start_with(&self, activity_type: ActivityType) -> Result<String> {
        self.with_engine(|e| e.start_with(activity_type))
    }

    pub fn stop(&self) -> Result<WorkoutRecord> {
        let record = self.with_engine(TrackingEngine::stop)?;
        info!(
            "[WorkoutTracker] Workout {} handed off ({} phases)",
            record.workout_id,
            record.phases.len()
        );
        Ok(record)
    }

    pub fn pause(&self) {
        self.with_engine(TrackingEngine::pause);
    }

    pub fn auto_pause(&self) {
        self.with_engine(TrackingEngine::auto_pause);
    }

    pub fn home_arrival_pause(&self) {
        self.with_engine(TrackingEngine::home_arrival_pause);
    }

    pub fn resume(&self) {
        self.with_engine(TrackingEngine::resume);
    }

    pub fn auto_resume(&self) {
        self.with_engine(TrackingEngine::auto_resume);
    }

    /// Returns whether the point was recorded.
    pub fn add_point(&self, point: TrackedPoint) -> bool {
        self.with_engine(|e| e.add_point(point))
    }

    pub fn update_elapsed(&self) {
        self.with_engine(TrackingEngine::update_elapsed);
    }

    pub fn start_laps(&self) {
        self.with_engine(TrackingEngine::start_laps);
    }

    pub fn mark_lap(&self) {
        self.with_engine(TrackingEngine::mark_lap);
    }

    pub fn end_laps(&self) {
        self.with_engine(TrackingEngine::end_laps);
    }

    pub fn set_ghost_lap(&self, duration_seconds: Option<u32>) {
        self.with_engine(|e| e.set_ghost_lap(duration_seconds));
    }

    pub fn init_step_baseline(&self, sensor_steps: u32) {
        self.with_engine(|e| e.init_step_baseline(sensor_steps));
    }

    pub fn update_step_count(&self, sensor_steps: u32) {
        self.with_engine(|e| e.update_step_count(sensor_steps));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Latest published snapshot.
    pub fn state(&self) -> TrackingState {
        self.shared.state_tx.borrow().clone()
    }

    /// Latest published route.
    pub fn points(&self) -> RouteView {
        self.shared.route_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<TrackingState> {
        self.shared.state_tx.subscribe()
    }

    pub fn subscribe_points(&self) -> watch::Receiver<RouteView> {
        self.shared.route_tx.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_active()
    }

    pub fn phase(&self) -> Option<PhaseType> {
        self.lock().phase()
    }

    pub fn config(&self) -> TrackerConfig {
        self.lock().config().clone()
    }

    pub fn lap_durations(&self) -> Vec<i64> {
        self.lock().lap_durations()
    }

    pub fn best_lap_duration(&self) -> Option<i64> {
        self.lock().best_lap_duration()
    }

    pub fn best_lap_number(&self) -> Option<u32> {
        self.lock().best_lap_number()
    }

    pub fn average_lap_duration(&self) -> Option<i64> {
        self.lock().average_lap_duration()
    }
}

impl Default for WorkoutTracker {
    fn default() -> Self {
        Self::new()
    }
}
