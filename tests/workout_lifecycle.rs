//! End-to-end workout scenarios through the engine.
//!
//! Time is driven by a `ManualClock`; nothing here sleeps.

mod common;

use common::{engine_with, north_of_base};
use workout_tracker::analysis::{self, LapTrend};
use workout_tracker::{PhaseType, TrackerConfig, WorkoutRecord};

// ============================================================================
// Warmup-only workout
// ============================================================================

#[test]
fn test_five_point_warmup_workout() {
    let (mut engine, clock) = engine_with(TrackerConfig::default());
    engine.start().unwrap();

    for i in 0..5 {
        engine.add_point(north_of_base(&clock, i as f64 * 12.5));
        clock.advance_secs(6);
    }
    engine.update_elapsed();
    assert_eq!(engine.state().elapsed_seconds, 30);

    let record = engine.stop().unwrap();
    assert_eq!(record.phases.len(), 1);
    assert_eq!(record.phases[0].phase_type, PhaseType::Warmup);
    assert!((record.total_distance_meters - 50.0).abs() < 0.1);
    assert_eq!(record.total_paused_duration_millis, 0);
    assert_eq!(record.points.len(), 5);
    assert!(!engine.is_active());
}

// ============================================================================
// Interval session
// ============================================================================

/// Warmup, six laps of decreasing duration, cooldown.
fn run_interval_session() -> WorkoutRecord {
    let (mut engine, clock) = engine_with(TrackerConfig::default());
    engine.start().unwrap();
    engine.init_step_baseline(2_000);

    let mut meters = 0.0;
    let mut steps = 2_000;

    // 5 minutes of warmup at ~3 m/s
    for _ in 0..60 {
        clock.advance_secs(5);
        meters += 15.0;
        steps += 14;
        engine.add_point(north_of_base(&clock, meters));
        engine.update_step_count(steps);
        engine.update_elapsed();
    }
    engine.start_laps();

    for lap in 0..6 {
        let samples = 24 - lap * 2;
        for _ in 0..samples {
            clock.advance_secs(5);
            meters += 20.0;
            steps += 16;
            engine.add_point(north_of_base(&clock, meters));
            engine.update_step_count(steps);
            engine.update_elapsed();
        }
        if lap < 5 {
            engine.mark_lap();
        }
    }
    engine.end_laps();

    for _ in 0..30 {
        clock.advance_secs(5);
        meters += 10.0;
        engine.add_point(north_of_base(&clock, meters));
        engine.update_elapsed();
    }
    engine.stop().unwrap()
}

#[test]
fn test_interval_session_phases() {
    let record = run_interval_session();

    let types: Vec<PhaseType> = record.phases.iter().map(|p| p.phase_type).collect();
    assert_eq!(
        types,
        vec![PhaseType::Warmup, PhaseType::Laps, PhaseType::Cooldown]
    );

    for pair in record.phases.windows(2) {
        assert_eq!(pair[0].end_time, pair[1].start_time, "phases are contiguous");
    }
    assert_eq!(record.phases[0].start_time, record.start_time);
    assert_eq!(record.phases[2].end_time, record.end_time);

    let phase_sum: f64 = record.phases.iter().map(|p| p.distance_meters).sum();
    let tolerance = 1e-6 * record.total_distance_meters;
    assert!((phase_sum - record.total_distance_meters).abs() <= tolerance);
}

#[test]
fn test_interval_session_laps() {
    let record = run_interval_session();
    let laps = record.laps();

    let numbers: Vec<u32> = laps.iter().map(|l| l.lap_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

    let durations: Vec<i64> = laps.iter().map(|l| l.duration_seconds()).collect();
    assert_eq!(durations, vec![120, 110, 100, 90, 80, 70]);

    let laps_phase = record.phase(PhaseType::Laps).unwrap();
    let lap_distance: f64 = laps.iter().map(|l| l.distance_meters).sum();
    assert!((lap_distance - laps_phase.distance_meters).abs() < 1e-6);
    assert_eq!(laps_phase.step_count, laps.iter().map(|l| l.step_count).sum::<u32>());
}

#[test]
fn test_interval_session_steps() {
    let record = run_interval_session();
    assert_eq!(record.total_steps, 60 * 14 + 114 * 16);
    assert_eq!(record.phases[0].step_count, 60 * 14);
    assert_eq!(record.phases[2].step_count, 0);
}

#[test]
fn test_interval_session_analysis() {
    let record = run_interval_session();
    let config = TrackerConfig::default();

    let analysis = analysis::analyze(record.laps(), &config.pace).unwrap();
    assert_eq!(analysis.lap_count, 6);
    assert_eq!(analysis.best_lap_number, 6);
    assert_eq!(analysis.slowest_lap_number, 1);
    assert_eq!(analysis.average_lap_seconds, 95);
    assert_eq!(analysis.trend, LapTrend::GettingFaster);

    let phases = analysis::analyze_phases(&record.phases, &config.pace);
    assert_eq!(phases[1].label, "LAPS (6)");
}

#[test]
fn test_record_json_export() {
    let record = run_interval_session();
    let json = record.to_json().unwrap();
    assert!(json.contains("\"phaseType\":\"LAPS\""));

    let parsed: WorkoutRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.workout_id, record.workout_id);
    assert_eq!(parsed.laps().len(), 6);
}

#[test]
fn test_record_bounds() {
    let record = run_interval_session();
    let bounds = record.bounds().unwrap();
    assert!(bounds.max_lat > bounds.min_lat);
    assert_eq!(bounds.min_lng, bounds.max_lng);
}

// ============================================================================
// Lap numbering under arbitrary command sequences
// ============================================================================

#[test]
fn test_lap_numbers_sequential_after_stop_or_end_laps() {
    for marks in 0..6 {
        for end_with_end_laps in [true, false] {
            let (mut engine, clock) = engine_with(TrackerConfig::default());
            engine.start().unwrap();
            engine.mark_lap(); // ignored in warmup
            engine.start_laps();
            for _ in 0..marks {
                clock.advance_secs(60);
                engine.mark_lap();
            }
            clock.advance_secs(60);
            if end_with_end_laps {
                engine.end_laps();
                engine.mark_lap(); // ignored in cooldown
            }
            let record = engine.stop().unwrap();

            let numbers: Vec<u32> = record.laps().iter().map(|l| l.lap_number).collect();
            let expected: Vec<u32> = (1..=marks as u32 + 1).collect();
            assert_eq!(numbers, expected, "marks={marks} end_laps={end_with_end_laps}");
        }
    }
}

#[test]
fn test_ghost_stays_at_best_lap() {
    let (mut engine, clock) = engine_with(TrackerConfig::default());
    engine.start().unwrap();
    engine.start_laps();

    clock.advance_secs(100);
    engine.mark_lap();
    clock.advance_secs(150);
    engine.mark_lap();

    assert_eq!(engine.state().ghost_lap_duration_seconds, Some(100));
    assert_eq!(engine.best_lap_duration(), Some(100));

    clock.advance_secs(40);
    engine.update_elapsed();
    assert_eq!(engine.state().ghost_delta_seconds, Some(-60));
}
