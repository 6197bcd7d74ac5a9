//! Speed-based auto-pause detection.
//!
//! The detector only recommends; the caller decides whether to call
//! `auto_pause` / `auto_resume` on the tracker. Pausing needs sustained
//! stillness, resuming needs a single moving sample, so resume is snappier.

use std::collections::VecDeque;

use log::debug;

use crate::config::AutoPauseConfig;
use crate::TrackedPoint;

/// Recommendation for a single analyzed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoPauseDecision {
    pub should_auto_pause: bool,
    pub should_auto_resume: bool,
}

#[derive(Debug, Clone, Copy)]
struct TimedSpeed {
    timestamp_ms: i64,
    speed: Option<f32>,
}

/// Sliding-window stillness detector.
#[derive(Debug, Clone)]
pub struct AutoPauseDetector {
    config: AutoPauseConfig,
    recent: VecDeque<TimedSpeed>,
}

impl AutoPauseDetector {
    pub fn new(config: AutoPauseConfig) -> Self {
        Self {
            config,
            recent: VecDeque::new(),
        }
    }

    /// Feed one point and get a recommendation.
    ///
    /// Points without a speed reading are retained but produce no decision.
    pub fn analyze_point(
        &mut self,
        point: &TrackedPoint,
        currently_auto_paused: bool,
    ) -> AutoPauseDecision {
        let now_ms = point.timestamp.timestamp_millis();

        self.recent.push_back(TimedSpeed {
            timestamp_ms: now_ms,
            speed: point.speed,
        });
        let retention = self.config.retention_ms;
        self.recent.retain(|s| now_ms - s.timestamp_ms <= retention);

        if point.speed.is_none() {
            return AutoPauseDecision::default();
        }

        let decision = if currently_auto_paused {
            self.analyze_for_resume(now_ms)
        } else {
            self.analyze_for_pause(now_ms)
        };

        if decision != AutoPauseDecision::default() {
            debug!(
                "[AutoPause] pause={} resume={} ({} samples retained)",
                decision.should_auto_pause,
                decision.should_auto_resume,
                self.recent.len()
            );
        }
        decision
    }

    fn analyze_for_pause(&self, now_ms: i64) -> AutoPauseDecision {
        let cutoff = now_ms - self.config.pause_window_ms;
        let speeds: Vec<f32> = self
            .recent
            .iter()
            .filter(|s| s.timestamp_ms >= cutoff)
            .filter_map(|s| s.speed)
            .collect();

        if speeds.len() < self.config.min_points_for_pause {
            return AutoPauseDecision::default();
        }

        AutoPauseDecision {
            should_auto_pause: speeds.iter().all(|&s| s < self.config.speed_threshold_mps),
            should_auto_resume: false,
        }
    }

    fn analyze_for_resume(&self, now_ms: i64) -> AutoPauseDecision {
        let cutoff = now_ms - self.config.resume_window_ms;
        let moving = self
            .recent
            .iter()
            .filter(|s| s.timestamp_ms >= cutoff)
            .any(|s| matches!(s.speed, Some(speed) if speed >= self.config.speed_threshold_mps));

        AutoPauseDecision {
            should_auto_pause: false,
            should_auto_resume: moving,
        }
    }

    /// Forget all retained samples (call when a workout starts or stops).
    pub fn reset(&mut self) {
        self.recent.clear();
    }
}

impl Default for AutoPauseDetector {
    fn default() -> Self {
        Self::new(AutoPauseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn sample(ms: i64, speed: Option<f32>) -> TrackedPoint {
        let mut p = TrackedPoint::new(
            40.0,
            -74.0,
            DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(ms),
            5.0,
        );
        p.speed = speed;
        p
    }

    #[test]
    fn test_needs_minimum_points_before_pausing() {
        let mut detector = AutoPauseDetector::default();
        assert!(!detector.analyze_point(&sample(0, Some(0.1)), false).should_auto_pause);
        assert!(!detector.analyze_point(&sample(1000, Some(0.1)), false).should_auto_pause);
        assert!(detector.analyze_point(&sample(2000, Some(0.1)), false).should_auto_pause);
    }

    #[test]
    fn test_one_moving_sample_blocks_pause() {
        let mut detector = AutoPauseDetector::default();
        detector.analyze_point(&sample(0, Some(0.1)), false);
        detector.analyze_point(&sample(1000, Some(2.0)), false);
        detector.analyze_point(&sample(2000, Some(0.1)), false);
        let decision = detector.analyze_point(&sample(3000, Some(0.1)), false);
        assert!(!decision.should_auto_pause);
    }

    #[test]
    fn test_old_movement_falls_out_of_pause_window() {
        let mut detector = AutoPauseDetector::default();
        detector.analyze_point(&sample(0, Some(3.0)), false);
        detector.analyze_point(&sample(6000, Some(0.1)), false);
        detector.analyze_point(&sample(7000, Some(0.1)), false);
        let decision = detector.analyze_point(&sample(8000, Some(0.1)), false);
        assert!(decision.should_auto_pause);
    }

    #[test]
    fn test_missing_speed_is_no_op() {
        let mut detector = AutoPauseDetector::default();
        detector.analyze_point(&sample(0, Some(0.1)), false);
        detector.analyze_point(&sample(1000, Some(0.1)), false);
        let decision = detector.analyze_point(&sample(2000, None), false);
        assert_eq!(decision, AutoPauseDecision::default());
    }

    #[test]
    fn test_resume_on_any_movement() {
        let mut detector = AutoPauseDetector::default();
        assert!(!detector.analyze_point(&sample(0, Some(0.2)), true).should_auto_resume);
        assert!(detector.analyze_point(&sample(1000, Some(1.5)), true).should_auto_resume);
    }

    #[test]
    fn test_reset_clears_window() {
        let mut detector = AutoPauseDetector::default();
        detector.analyze_point(&sample(0, Some(0.1)), false);
        detector.analyze_point(&sample(1000, Some(0.1)), false);
        detector.reset();
        let decision = detector.analyze_point(&sample(2000, Some(0.1)), false);
        assert!(!decision.should_auto_pause);
    }
}
