//! Display formatting for distances and durations.

use serde::{Deserialize, Serialize};

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.344;

/// Unit used when showing a distance to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
    #[serde(rename = "m")]
    Meters,
}

/// Format a distance given in meters.
///
/// Kilometers and miles get one decimal, meters are rounded to an integer.
///
/// ```
/// use ride_core::geo::{DistanceUnit, format_distance};
///
/// assert_eq!(format_distance(12_345.0, DistanceUnit::Kilometers), "12.3 km");
/// assert_eq!(format_distance(949.6, DistanceUnit::Meters), "950 m");
/// ```
pub fn format_distance(meters: f64, unit: DistanceUnit) -> String {
    match unit {
        DistanceUnit::Kilometers => format!("{:.1} km", meters / METERS_PER_KILOMETER),
        DistanceUnit::Miles => format!("{:.1} mi", meters / METERS_PER_MILE),
        DistanceUnit::Meters => format!("{} m", meters.round() as i64),
    }
}

/// Meters below one kilometer, kilometers from there on.
pub fn format_distance_auto(meters: f64) -> String {
    if meters >= METERS_PER_KILOMETER {
        format_distance(meters, DistanceUnit::Kilometers)
    } else {
        format_distance(meters, DistanceUnit::Meters)
    }
}

/// Format a duration in seconds as hours and minutes.
///
/// Seconds are truncated; the hour part is dropped when zero.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours} h {minutes} min")
    } else {
        format!("{minutes} min")
    }
}
