// Public transit domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conversions::from_epoch_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RealtimeState {
    Scheduled,
    Updated,
    Canceled,
    Added,
    Modified,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Severe,
    #[serde(other)]
    UnknownSeverity,
}

impl AlertSeverity {
    pub fn is_above_info(&self) -> bool {
        matches!(self, Self::Warning | Self::Severe)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRoute {
    pub gtfs_id: String,
    pub mode: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStop {
    pub gtfs_id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub vehicle_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__typename")]
pub enum AlertEntity {
    Route(AlertRoute),
    Stop(AlertStop),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub alert_hash: Option<i64>,
    pub alert_header_text: Option<String>,
    pub alert_description_text: Option<String>,
    pub effective_start_date: Option<i64>,
    pub effective_end_date: Option<i64>,
    pub alert_severity_level: Option<AlertSeverity>,
    pub alert_cause: Option<String>,
    pub alert_effect: Option<String>,
    #[serde(default)]
    pub entities: Vec<AlertEntity>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub gtfs_id: String,
    pub mode: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub gtfs_id: String,
    pub trip_headsign: Option<String>,
    pub route: Route,
}

/// One departure of a trip from a stop. Departure fields are seconds
/// since the start of `service_day` (epoch seconds).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTime {
    pub scheduled_departure: i64,
    pub realtime_departure: i64,
    pub departure_delay: Option<i64>,
    #[serde(default)]
    pub realtime: bool,
    pub realtime_state: Option<RealtimeState>,
    pub service_day: i64,
    pub headsign: Option<String>,
    pub trip: Trip,
}

impl StopTime {
    pub fn realtime_departure_epoch(&self) -> i64 {
        self.service_day + self.realtime_departure
    }

    pub fn route_short_name(&self) -> Option<&str> {
        self.trip.route.short_name.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitStop {
    pub gtfs_id: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub platform_code: Option<String>,
    #[serde(default, rename = "stoptimesWithoutPatterns")]
    pub stoptimes: Vec<StopTime>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// A departure as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    pub stop_id: String,
    pub trip_id: String,
    pub route_id: String,
    pub line: Option<String>,
    pub mode: Option<String>,
    pub headsign: Option<String>,
    pub scheduled_departure: Option<DateTime<Utc>>,
    pub realtime_departure: Option<DateTime<Utc>>,
    pub realtime: bool,
    pub realtime_state: Option<RealtimeState>,
}

impl Departure {
    pub fn from_stop_time(stop_id: &str, stop_time: &StopTime) -> Self {
        Self {
            stop_id: stop_id.to_string(),
            trip_id: stop_time.trip.gtfs_id.clone(),
            route_id: stop_time.trip.route.gtfs_id.clone(),
            line: stop_time.trip.route.short_name.clone(),
            mode: stop_time.trip.route.mode.clone(),
            headsign: stop_time
                .trip
                .trip_headsign
                .clone()
                .or_else(|| stop_time.headsign.clone()),
            scheduled_departure: from_epoch_seconds(
                stop_time.service_day + stop_time.scheduled_departure,
            ),
            realtime_departure: from_epoch_seconds(stop_time.realtime_departure_epoch()),
            realtime: stop_time.realtime,
            realtime_state: stop_time.realtime_state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionDepartures {
    pub name: String,
    pub departures: Vec<Departure>,
}

/// Alerts sharing one content hash, with the affected entities unioned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedAlert {
    pub id: String,
    pub alert_hash: Option<i64>,
    pub header_text: Option<String>,
    pub description_text: Option<String>,
    pub effective_start: Option<DateTime<Utc>>,
    pub effective_end: Option<DateTime<Utc>>,
    pub severity: Option<AlertSeverity>,
    pub cause: Option<String>,
    pub effect: Option<String>,
    pub routes: Vec<AlertRoute>,
    pub stops: Vec<AlertStop>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TransitResponse {
    pub directions: Vec<DirectionDepartures>,
    pub alerts: Vec<MergedAlert>,
}
