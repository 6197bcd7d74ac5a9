//! Lap trend analysis and phase summaries for finished workouts.
//!
//! These work purely on the closed `Lap`/`Phase` lists of a `WorkoutRecord`
//! and never see the live engine.
//!
//! ## Example
//! ```rust
//! use workout_tracker::analysis::{calculate_trend, LapTrend};
//!
//! assert_eq!(calculate_trend(&[120, 115, 110]), LapTrend::GettingFaster);
//! assert_eq!(calculate_trend(&[120, 119, 121]), LapTrend::Consistent);
//! assert_eq!(calculate_trend(&[120, 115]), LapTrend::TooFewLaps);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PaceConfig;
use crate::format::format_delta;
use crate::pace::segment_pace;
use crate::{Lap, Phase, PhaseType};

/// Slope (seconds per lap) inside which lap times count as steady.
pub const CONSISTENCY_BAND_SECONDS: f64 = 2.0;

/// Minimum laps before a trend is classified.
pub const MIN_LAPS_FOR_TREND: usize = 3;

/// Direction lap times are moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LapTrend {
    /// Negative slope: laps are getting shorter
    GettingFaster,
    /// Positive slope: laps are getting longer
    GettingSlower,
    /// Slope within the consistency band
    Consistent,
    /// Fewer than three laps
    TooFewLaps,
}

/// One lap row of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapSummary {
    pub lap_number: u32,
    pub duration_seconds: i64,
    pub distance_meters: f64,
    pub pace_seconds: Option<u32>,
    /// This lap minus the previous one; absent for the first lap
    pub delta_seconds: Option<i64>,
    pub delta_formatted: Option<String>,
    pub is_fastest: bool,
    pub is_slowest: bool,
}

/// Chart point for plotting lap durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapChartPoint {
    pub lap_number: u32,
    pub duration_seconds: i64,
}

/// Everything derived from a finished lap list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapAnalysis {
    pub laps: Vec<LapSummary>,
    pub lap_count: u32,
    pub best_lap_number: u32,
    pub best_lap_seconds: i64,
    pub slowest_lap_number: u32,
    pub slowest_lap_seconds: i64,
    /// Mean lap duration, truncated to whole seconds
    pub average_lap_seconds: i64,
    pub trend: LapTrend,
    pub chart_points: Vec<LapChartPoint>,
}

/// Build a complete lap analysis. `None` for an empty lap list.
pub fn analyze(laps: &[Lap], config: &PaceConfig) -> Option<LapAnalysis> {
    let durations: Vec<i64> = laps.iter().map(Lap::duration_seconds).collect();

    let best = *durations.iter().min()?;
    let slowest = *durations.iter().max()?;
    // First occurrence wins on ties
    let best_index = durations.iter().position(|&d| d == best)?;
    let slowest_index = durations.iter().position(|&d| d == slowest)?;
    let average = (durations.iter().sum::<i64>() as f64 / durations.len() as f64) as i64;

    let summaries = laps
        .iter()
        .enumerate()
        .map(|(i, lap)| {
            let delta = (i > 0).then(|| durations[i] - durations[i - 1]);
            LapSummary {
                lap_number: lap.lap_number,
                duration_seconds: durations[i],
                distance_meters: lap.distance_meters,
                pace_seconds: segment_pace(lap.start_time, lap.end_time, lap.distance_meters, config),
                delta_seconds: delta,
                delta_formatted: delta.map(format_delta),
                is_fastest: i == best_index,
                is_slowest: i == slowest_index && laps.len() > 1,
            }
        })
        .collect();

    let chart_points = durations
        .iter()
        .enumerate()
        .map(|(i, &duration_seconds)| LapChartPoint {
            lap_number: i as u32 + 1,
            duration_seconds,
        })
        .collect();

    Some(LapAnalysis {
        laps: summaries,
        lap_count: laps.len() as u32,
        best_lap_number: best_index as u32 + 1,
        best_lap_seconds: best,
        slowest_lap_number: slowest_index as u32 + 1,
        slowest_lap_seconds: slowest,
        average_lap_seconds: average,
        trend: calculate_trend(&durations),
        chart_points,
    })
}

/// Classify lap durations by the least-squares slope against lap index.
///
/// x is the 0-based lap index, y the duration in seconds. A slope beyond
/// ±[`CONSISTENCY_BAND_SECONDS`] per lap is a trend; anything inside is steady.
pub fn calculate_trend(duration_seconds: &[i64]) -> LapTrend {
    if duration_seconds.len() < MIN_LAPS_FOR_TREND {
        return LapTrend::TooFewLaps;
    }

    let n = duration_seconds.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = duration_seconds.iter().sum::<i64>() as f64 / n;

    let (numerator, denominator) = duration_seconds.iter().enumerate().fold(
        (0.0, 0.0),
        |(num, den), (i, &duration)| {
            let x_diff = i as f64 - x_mean;
            (num + x_diff * (duration as f64 - y_mean), den + x_diff * x_diff)
        },
    );

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    if slope < -CONSISTENCY_BAND_SECONDS {
        LapTrend::GettingFaster
    } else if slope > CONSISTENCY_BAND_SECONDS {
        LapTrend::GettingSlower
    } else {
        LapTrend::Consistent
    }
}

/// Per-phase summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSummary {
    pub phase_type: PhaseType,
    /// `WARMUP`, `LAPS (n)` or `COOLDOWN`
    pub label: String,
    pub duration_seconds: i64,
    pub distance_meters: f64,
    pub pace_seconds: Option<u32>,
    pub lap_count: u32,
}

/// Summarize each closed phase.
pub fn analyze_phases(phases: &[Phase], config: &PaceConfig) -> Vec<PhaseSummary> {
    phases
        .iter()
        .map(|phase| {
            let label = match phase.phase_type {
                PhaseType::Laps => format!("LAPS ({})", phase.laps.len()),
                other => other.label().to_string(),
            };
            PhaseSummary {
                phase_type: phase.phase_type,
                label,
                duration_seconds: phase.duration_seconds(),
                distance_meters: phase.distance_meters,
                pace_seconds: segment_pace(
                    phase.start_time,
                    phase.end_time,
                    phase.distance_meters,
                    config,
                ),
                lap_count: phase.laps.len() as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn make_laps(durations: &[i64]) -> Vec<Lap> {
        let mut start = DateTime::<Utc>::UNIX_EPOCH;
        durations
            .iter()
            .enumerate()
            .map(|(i, &seconds)| {
                let end = start + Duration::seconds(seconds);
                let lap = Lap {
                    lap_number: i as u32 + 1,
                    start_time: start,
                    end_time: end,
                    distance_meters: 400.0,
                    step_count: 0,
                    start_index: 0,
                    end_index: 0,
                    split_latitude: None,
                    split_longitude: None,
                };
                start = end;
                lap
            })
            .collect()
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(calculate_trend(&[120, 115, 110]), LapTrend::GettingFaster);
        assert_eq!(calculate_trend(&[110, 115, 120]), LapTrend::GettingSlower);
        assert_eq!(calculate_trend(&[120, 119, 121]), LapTrend::Consistent);
        assert_eq!(calculate_trend(&[120]), LapTrend::TooFewLaps);
        assert_eq!(calculate_trend(&[120, 115]), LapTrend::TooFewLaps);
        assert_eq!(calculate_trend(&[]), LapTrend::TooFewLaps);
    }

    #[test]
    fn test_trend_band_edges() {
        // Slope of exactly 2 s/lap stays consistent
        assert_eq!(calculate_trend(&[100, 102, 104]), LapTrend::Consistent);
        assert_eq!(calculate_trend(&[104, 102, 100]), LapTrend::Consistent);
        assert_eq!(calculate_trend(&[100, 103, 106]), LapTrend::GettingSlower);
    }

    #[test]
    fn test_analyze_empty() {
        assert!(analyze(&[], &PaceConfig::default()).is_none());
    }

    #[test]
    fn test_analyze_single_lap() {
        let analysis = analyze(&make_laps(&[130]), &PaceConfig::default()).unwrap();
        assert_eq!(analysis.lap_count, 1);
        assert!(analysis.laps[0].is_fastest);
        assert!(!analysis.laps[0].is_slowest);
        assert_eq!(analysis.laps[0].delta_seconds, None);
        assert_eq!(analysis.trend, LapTrend::TooFewLaps);
    }

    #[test]
    fn test_analyze_best_slowest_and_deltas() {
        let analysis =
            analyze(&make_laps(&[135, 122, 142, 122, 128]), &PaceConfig::default()).unwrap();

        assert_eq!(analysis.best_lap_number, 2);
        assert_eq!(analysis.best_lap_seconds, 122);
        assert_eq!(analysis.slowest_lap_number, 3);
        assert_eq!(analysis.slowest_lap_seconds, 142);
        assert_eq!(analysis.average_lap_seconds, 129); // 649 / 5 = 129.8
        assert!(analysis.laps[1].is_fastest);
        assert!(!analysis.laps[3].is_fastest, "ties go to the first occurrence");
        assert!(analysis.laps[2].is_slowest);

        let deltas: Vec<Option<i64>> = analysis.laps.iter().map(|l| l.delta_seconds).collect();
        assert_eq!(deltas, vec![None, Some(-13), Some(20), Some(-20), Some(6)]);
        assert_eq!(analysis.laps[1].delta_formatted.as_deref(), Some("▲ -13s"));
        assert_eq!(analysis.laps[4].delta_formatted.as_deref(), Some("▼ +6s"));

        assert_eq!(analysis.chart_points.len(), 5);
        assert_eq!(analysis.chart_points[2].duration_seconds, 142);
    }

    #[test]
    fn test_analyze_lap_pace() {
        // 400 m in 120 s is 482 s/mi
        let analysis = analyze(&make_laps(&[120]), &PaceConfig::default()).unwrap();
        assert_eq!(analysis.laps[0].pace_seconds, Some(482));
    }

    #[test]
    fn test_analyze_phases_labels() {
        let start = DateTime::<Utc>::UNIX_EPOCH;
        let laps = make_laps(&[100, 110]);
        let phases = vec![
            Phase {
                phase_type: PhaseType::Warmup,
                start_time: start,
                end_time: start + Duration::seconds(300),
                distance_meters: 5.0,
                step_count: 0,
                laps: Vec::new(),
            },
            Phase {
                phase_type: PhaseType::Laps,
                start_time: start + Duration::seconds(300),
                end_time: start + Duration::seconds(510),
                distance_meters: 800.0,
                step_count: 0,
                laps,
            },
        ];

        let summaries = analyze_phases(&phases, &PaceConfig::default());
        assert_eq!(summaries[0].label, "WARMUP");
        assert_eq!(summaries[0].pace_seconds, None);
        assert_eq!(summaries[1].label, "LAPS (2)");
        assert_eq!(summaries[1].duration_seconds, 210);
        assert_eq!(summaries[1].lap_count, 2);
        assert!(summaries[1].pace_seconds.is_some());
    }
}
