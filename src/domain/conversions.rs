// Coordinate, temperature and time conversions shared by the providers
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Timelike, Utc};

/// Round a coordinate to the number of decimals a provider accepts.
pub fn round_coordinate(coordinate: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (coordinate * factor).round() / factor
}

/// Parse a coordinate query parameter. Returns `None` for non-numeric input.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) / 1.8
}

pub fn to_epoch_seconds(instant: DateTime<Utc>) -> i64 {
    instant.timestamp()
}

pub fn from_epoch_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

fn fixed_offset(utc_offset_minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)
}

/// Hour of day of `instant` once shifted by `utc_offset_minutes`.
/// Without an offset the UTC hour is used.
pub fn local_hour(instant: DateTime<Utc>, utc_offset_minutes: Option<i32>) -> u32 {
    match utc_offset_minutes.and_then(fixed_offset) {
        Some(offset) => offset.from_utc_datetime(&instant.naive_utc()).hour(),
        None => instant.hour(),
    }
}

/// Format an instant as local ISO-8601 time on the given offset,
/// e.g. `2024-05-01T18:00:00+02:00`.
pub fn format_local_iso(instant: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let offset = fixed_offset(utc_offset_minutes).unwrap_or_else(|| Utc.fix());
    instant
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Millisecond-precision UTC timestamp, the format the FMI API expects.
pub fn format_utc_millis(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
