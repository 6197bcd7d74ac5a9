//! Display formatting for durations, paces, distances and lap deltas.

use crate::config::DistanceUnit;

/// `MM:SS` below an hour, `H:MM:SS` above. Negative input is shown as zero.
pub fn format_elapsed_time(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// `M:SS /mi` (or `/km`).
pub fn format_pace(seconds_per_unit: u32, unit: DistanceUnit) -> String {
    format!(
        "{}:{:02} /{}",
        seconds_per_unit / 60,
        seconds_per_unit % 60,
        unit.label()
    )
}

/// Pace text with a placeholder for "no pace yet".
pub fn format_optional_pace(seconds_per_unit: Option<u32>, unit: DistanceUnit) -> String {
    match seconds_per_unit {
        Some(pace) => format_pace(pace, unit),
        None => format!("-- /{}", unit.label()),
    }
}

/// Distance in the given unit with two decimals, e.g. `0.42 mi`.
pub fn format_distance(meters: f64, unit: DistanceUnit) -> String {
    format!("{:.2} {}", unit.from_meters(meters), unit.label())
}

/// Lap delta with a direction marker. Negative means faster.
pub fn format_delta(delta_seconds: i64) -> String {
    match delta_seconds {
        d if d < 0 => format!("▲ {}s", d),
        d if d > 0 => format!("▼ +{}s", d),
        _ => "= 0s".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::METERS_PER_MILE;

    #[test]
    fn test_format_elapsed_time() {
        assert_eq!(format_elapsed_time(0), "00:00");
        assert_eq!(format_elapsed_time(65), "01:05");
        assert_eq!(format_elapsed_time(3599), "59:59");
        assert_eq!(format_elapsed_time(3661), "1:01:01");
        assert_eq!(format_elapsed_time(-5), "00:00");
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(519, DistanceUnit::Miles), "8:39 /mi");
        assert_eq!(format_pace(300, DistanceUnit::Kilometers), "5:00 /km");
        assert_eq!(format_optional_pace(None, DistanceUnit::Miles), "-- /mi");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(METERS_PER_MILE, DistanceUnit::Miles), "1.00 mi");
        assert_eq!(format_distance(2500.0, DistanceUnit::Kilometers), "2.50 km");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(-7), "▲ -7s");
        assert_eq!(format_delta(3), "▼ +3s");
        assert_eq!(format_delta(0), "= 0s");
    }
}
