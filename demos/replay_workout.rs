//! Replay a synthetic 400 m track session through the tracker and print a summary.
//!
//! Run with: `RUST_LOG=info cargo run --example replay_workout`

use std::sync::Arc;

use chrono::{DateTime, Utc};
use workout_tracker::analysis;
use workout_tracker::format::{format_delta, format_distance, format_elapsed_time, format_optional_pace};
use workout_tracker::{
    AutoPauseDetector, Clock, ManualClock, TrackedPoint, TrackerConfig, WorkoutTracker,
};

const TRACK_CENTER: (f64, f64) = (51.4545, -0.9685);
const TRACK_RADIUS_METERS: f64 = 63.66; // ~400 m circumference
const METERS_PER_DEGREE_LAT: f64 = 111_194.93;

/// Position on the track after running `meters` from the start line.
fn track_position(meters: f64) -> (f64, f64) {
    let angle = meters / TRACK_RADIUS_METERS;
    let (lat0, lon0) = TRACK_CENTER;
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * lat0.to_radians().cos();
    (
        lat0 + TRACK_RADIUS_METERS * angle.cos() / METERS_PER_DEGREE_LAT,
        lon0 + TRACK_RADIUS_METERS * angle.sin() / meters_per_degree_lon,
    )
}

fn main() -> workout_tracker::Result<()> {
    env_logger::init();

    let mut config = TrackerConfig::default();
    config.auto_lap.enabled = true;
    config.validate()?;

    let clock = ManualClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_000));
    let tracker = WorkoutTracker::with_clock(config.clone(), Arc::new(clock.clone()));
    let mut detector = AutoPauseDetector::new(config.auto_pause.clone());

    tracker.start()?;
    let mut meters = 0.0;

    let mut run = |seconds: u32, speed_mps: f64| {
        for _ in 0..seconds {
            clock.advance_secs(1);
            meters += speed_mps;
            let (lat, lon) = track_position(meters);
            let point = TrackedPoint::new(lat, lon, clock.now(), 4.0).with_speed(speed_mps as f32);

            let decision = detector.analyze_point(&point, tracker.state().is_auto_paused);
            if decision.should_auto_pause {
                tracker.auto_pause();
            } else if decision.should_auto_resume {
                tracker.auto_resume();
            }
            tracker.add_point(point);
            tracker.update_elapsed();
        }
    };

    // Warmup: one easy lap, then a short standstill at the start line
    run(160, 2.5);
    run(20, 0.0);
    tracker.start_laps();

    // Six laps, each a little quicker; auto-lap marks them at the start line
    for lap in 0..6 {
        let speed = 4.6 + lap as f64 * 0.15;
        run((400.0 / speed).ceil() as u32, speed);
        let state = tracker.state();
        println!(
            "lap {:>2}  last {:>6}  delta {:>8}  ghost {:?}",
            state.lap_count,
            state.last_lap_duration_formatted.as_deref().unwrap_or("--"),
            state.last_lap_delta_seconds.map(format_delta).unwrap_or_default(),
            state.ghost_lap_duration_seconds,
        );
    }
    tracker.end_laps();

    // Cooldown jog
    run(200, 2.2);

    let record = tracker.stop()?;
    let unit = config.pace.unit;

    println!();
    println!("workout   {}", record.workout_id);
    println!("duration  {}", format_elapsed_time(record.active_duration_millis() / 1000));
    println!("paused    {}", format_elapsed_time(record.total_paused_duration_millis / 1000));
    println!("distance  {}", format_distance(record.total_distance_meters, unit));

    for phase in analysis::analyze_phases(&record.phases, &config.pace) {
        println!(
            "{:<10} {:>8}  {:>10}  {}",
            phase.label,
            format_elapsed_time(phase.duration_seconds),
            format_distance(phase.distance_meters, unit),
            format_optional_pace(phase.pace_seconds, unit),
        );
    }

    if let Some(laps) = analysis::analyze(record.laps(), &config.pace) {
        println!(
            "best lap #{} ({}), trend {:?}",
            laps.best_lap_number,
            format_elapsed_time(laps.best_lap_seconds),
            laps.trend
        );
    }

    println!("record    {} bytes of JSON", record.to_json()?.len());
    Ok(())
}
