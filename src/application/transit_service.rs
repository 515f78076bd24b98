// Transit service - Departures per direction and merged disruption alerts
use crate::application::error::AppError;
use crate::application::upstream::{StopQuery, TransitSource};
use crate::domain::conversions::{from_epoch_seconds, to_epoch_seconds};
use crate::domain::transit::{
    Alert, AlertEntity, Departure, DirectionDepartures, MergedAlert, StopTime, TransitResponse,
    TransitStop,
};
use crate::infrastructure::config::{DirectionConfig, StopConfig, TransportationConfig};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Extra departures requested per stop to survive line filtering.
const DEPARTURE_HEADROOM: usize = 5;
/// Upper bound for the walk time used as query offset.
const MAX_WALK_MINUTES: u32 = 60;
const ALERT_LOOKAHEAD_HOURS: i64 = 12;

pub struct TransitService {
    source: Arc<dyn TransitSource>,
    clock: Arc<dyn Clock>,
    config: TransportationConfig,
}

fn min_walk_minutes<'a>(stops: impl IntoIterator<Item = &'a StopConfig>) -> u32 {
    stops
        .into_iter()
        .map(|stop| stop.walk_in_minutes)
        .fold(MAX_WALK_MINUTES, u32::min)
}

fn line_allowed(stop: &StopConfig, stop_time: &StopTime) -> bool {
    let line = stop_time.route_short_name().unwrap_or_default();
    if let Some(include) = &stop.include_only_lines {
        return include.iter().any(|allowed| allowed == line);
    }
    if let Some(exclude) = &stop.exclude_lines {
        return !exclude.iter().any(|excluded| excluded == line);
    }
    true
}

/// Departures of a direction's stops after line filtering, ordered by
/// service day and realtime departure.
fn filtered_stop_times<'a>(
    direction: &DirectionConfig,
    stops: &'a [TransitStop],
) -> Vec<(&'a str, &'a StopTime)> {
    let mut stop_times: Vec<(&str, &StopTime)> = direction
        .stops
        .iter()
        .filter_map(|config| {
            stops
                .iter()
                .find(|stop| stop.gtfs_id == config.digitransit_id)
                .map(|stop| (config, stop))
        })
        .flat_map(|(config, stop)| {
            stop.stoptimes
                .iter()
                .filter(move |stop_time| line_allowed(config, stop_time))
                .map(move |stop_time| (stop.gtfs_id.as_str(), stop_time))
        })
        .collect();
    stop_times.sort_by_key(|(_, stop_time)| (stop_time.service_day, stop_time.realtime_departure));
    stop_times
}

fn direction_departures(
    direction: &DirectionConfig,
    stop_times: &[(&str, &StopTime)],
    now: DateTime<Utc>,
) -> Vec<Departure> {
    let min_walk = i64::from(min_walk_minutes(&direction.stops));
    let now = to_epoch_seconds(now);
    let mut seen_trips = HashSet::new();

    stop_times
        .iter()
        .filter(|(_, stop_time)| (stop_time.realtime_departure_epoch() - now) / 60 >= min_walk)
        .filter(|(_, stop_time)| seen_trips.insert(stop_time.trip.gtfs_id.as_str()))
        .take(direction.show)
        .map(|(stop_id, stop_time)| Departure::from_stop_time(stop_id, stop_time))
        .collect()
}

fn merge_key(alert: &Alert) -> String {
    match alert.alert_hash {
        Some(hash) => format!("hash:{hash}"),
        None => format!("id:{}", alert.id),
    }
}

/// Merge alerts sharing a content hash. The earliest id of a group carries
/// the texts; routes and stops are unioned and sorted by id, so the result
/// does not depend on input order.
fn merge_alerts<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Vec<MergedAlert> {
    let mut groups: BTreeMap<String, Vec<&Alert>> = BTreeMap::new();
    for alert in alerts {
        groups.entry(merge_key(alert)).or_default().push(alert);
    }

    let mut result: Vec<MergedAlert> = groups
        .into_values()
        .filter_map(|mut group| {
            group.sort_by(|a, b| a.id.cmp(&b.id));
            let first = group.first()?;
            let mut routes = BTreeMap::new();
            let mut stops = BTreeMap::new();
            for entity in group.iter().flat_map(|alert| &alert.entities) {
                match entity {
                    AlertEntity::Route(route) => {
                        routes.entry(route.gtfs_id.clone()).or_insert_with(|| route.clone());
                    }
                    AlertEntity::Stop(stop) => {
                        stops.entry(stop.gtfs_id.clone()).or_insert_with(|| stop.clone());
                    }
                    AlertEntity::Other => {}
                }
            }
            Some(MergedAlert {
                id: first.id.clone(),
                alert_hash: first.alert_hash,
                header_text: first.alert_header_text.clone(),
                description_text: first.alert_description_text.clone(),
                effective_start: first.effective_start_date.and_then(from_epoch_seconds),
                effective_end: first.effective_end_date.and_then(from_epoch_seconds),
                severity: first.alert_severity_level,
                cause: first.alert_cause.clone(),
                effect: first.alert_effect.clone(),
                routes: routes.into_values().collect(),
                stops: stops.into_values().collect(),
            })
        })
        .collect();
    result.sort_by_key(|alert| (alert.effective_start, alert.alert_hash));
    result
}

impl TransitService {
    pub fn new(source: Arc<dyn TransitSource>, clock: Arc<dyn Clock>, config: TransportationConfig) -> Self {
        Self { source, clock, config }
    }

    fn has_visible_stops(&self) -> bool {
        self.config
            .directions
            .iter()
            .any(|direction| direction.show > 0 && !direction.stops.is_empty())
    }

    fn stop_query(&self, now: DateTime<Utc>) -> StopQuery {
        let stop_configs: Vec<&StopConfig> = self
            .config
            .directions
            .iter()
            .flat_map(|direction| &direction.stops)
            .collect();

        let mut stop_ids: Vec<String> = Vec::new();
        for stop in &stop_configs {
            if !stop_ids.contains(&stop.digitransit_id) {
                stop_ids.push(stop.digitransit_id.clone());
            }
        }

        let max_show = self
            .config
            .directions
            .iter()
            .map(|direction| direction.show)
            .max()
            .unwrap_or(0);
        let min_walk = min_walk_minutes(stop_configs.iter().copied());

        StopQuery {
            stop_ids,
            start_time: to_epoch_seconds(now + TimeDelta::minutes(i64::from(min_walk))),
            number_of_departures: max_show + DEPARTURE_HEADROOM,
            language: self.config.language.clone(),
        }
    }

    pub async fn departures(&self) -> Result<TransitResponse, AppError> {
        if !self.has_visible_stops() {
            debug!("No transit stops configured, skipping departures query");
            return Ok(TransitResponse::default());
        }

        let now = self.clock.utc();
        let stops = self.source.fetch_stops(&self.stop_query(now)).await?;

        let mut alerts_by_id: BTreeMap<&str, &Alert> = BTreeMap::new();
        let mut directions = Vec::with_capacity(self.config.directions.len());
        for direction in &self.config.directions {
            let stop_times = filtered_stop_times(direction, &stops);
            for (_, stop_time) in &stop_times {
                for alert in &stop_time.trip.route.alerts {
                    alerts_by_id.insert(&alert.id, alert);
                }
            }
            directions.push(DirectionDepartures {
                name: direction.name.clone(),
                departures: direction_departures(direction, &stop_times, now),
            });
        }
        for alert in stops.iter().flat_map(|stop| &stop.alerts) {
            alerts_by_id.insert(&alert.id, alert);
        }

        let horizon = to_epoch_seconds(now + TimeDelta::hours(ALERT_LOOKAHEAD_HOURS));
        let relevant = alerts_by_id.into_values().filter(|alert| {
            alert.alert_severity_level.is_some_and(|severity| severity.is_above_info())
                && alert.effective_start_date.is_none_or(|start| start <= horizon)
        });

        Ok(TransitResponse {
            directions,
            alerts: merge_alerts(relevant),
        })
    }
}
