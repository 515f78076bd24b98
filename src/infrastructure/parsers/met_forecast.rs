// MET Norway locationforecast 2.0 (complete) -> ForecastResponse
use super::rounded_celsius;
use crate::application::error::AppError;
use crate::domain::conversions::{format_local_iso, local_hour};
use crate::domain::forecast::{
    ForecastLocation, ForecastMeta, ForecastPoint, ForecastResponse, ForecastType, Precipitation,
    Temperature, Wind,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

pub const PROVIDER: &str = "MET forecast";
const CREDIT_TEXT: &str = "MET Norway (CC-BY 4.0)";
const CREDIT_URL: &str = "https://developer.yr.no/";

#[derive(Debug, Deserialize)]
struct MetForecast {
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    meta: Meta,
    timeseries: Vec<Timestep>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    updated_at: Option<String>,
    #[serde(default)]
    units: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Timestep {
    time: String,
    data: TimestepData,
}

#[derive(Debug, Deserialize)]
struct TimestepData {
    instant: Instant,
    next_1_hours: Option<Period>,
    next_6_hours: Option<Period>,
}

#[derive(Debug, Deserialize)]
struct Instant {
    #[serde(default)]
    details: InstantDetails,
}

#[derive(Debug, Default, Deserialize)]
struct InstantDetails {
    air_temperature: Option<f64>,
    air_pressure_at_sea_level: Option<f64>,
    wind_speed: Option<f64>,
    wind_from_direction: Option<f64>,
    cloud_area_fraction: Option<f64>,
    relative_humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Period {
    summary: Summary,
    #[serde(default)]
    details: PeriodDetails,
}

#[derive(Debug, Deserialize)]
struct Summary {
    symbol_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PeriodDetails {
    air_temperature_min: Option<f64>,
    air_temperature_max: Option<f64>,
    precipitation_amount: Option<f64>,
    precipitation_amount_min: Option<f64>,
    precipitation_amount_max: Option<f64>,
    probability_of_precipitation: Option<f64>,
}

struct Converter<'a> {
    temperature_unit: &'a str,
}

impl Converter<'_> {
    fn point(&self, timestep: &Timestep, period: &Period, time_from: String, time_to: Option<String>) -> ForecastPoint {
        let instant = &timestep.data.instant.details;
        let details = &period.details;
        ForecastPoint {
            time_from,
            time_to,
            weather_code: period.summary.symbol_code.clone(),
            weather_text: period.summary.symbol_code.clone(),
            temperature: Temperature {
                value: instant
                    .air_temperature
                    .map(|value| rounded_celsius(value, self.temperature_unit, PROVIDER)),
                min_value: details.air_temperature_min,
                max_value: details.air_temperature_max,
                unit: "celsius".to_string(),
            },
            pressure_hpa: instant.air_pressure_at_sea_level,
            precipitation: Precipitation {
                value: details.precipitation_amount,
                min_value: details.precipitation_amount_min,
                max_value: details.precipitation_amount_max,
                probability: details.probability_of_precipitation,
            },
            wind: Wind {
                speed_meters_per_second: instant.wind_speed,
                direction_code: None,
                direction_degrees: instant.wind_from_direction,
            },
            cloud_percentage: instant.cloud_area_fraction,
            relative_humidity: instant.relative_humidity,
        }
    }
}

fn hourly(timeseries: &[Timestep], converter: &Converter<'_>) -> Vec<ForecastPoint> {
    timeseries
        .iter()
        .filter_map(|timestep| {
            let period = timestep.data.next_1_hours.as_ref()?;
            Some(converter.point(timestep, period, timestep.time.clone(), None))
        })
        .collect()
}

/// Keep timesteps on local hours divisible by six. Each point ends where the
/// next retained one begins.
fn six_hourly(
    timeseries: &[Timestep],
    converter: &Converter<'_>,
    utc_offset_minutes: Option<i32>,
) -> Result<Vec<ForecastPoint>, AppError> {
    let mut retained: Vec<(&Timestep, String)> = Vec::new();
    for timestep in timeseries {
        let instant = DateTime::parse_from_rfc3339(&timestep.time)
            .map_err(|e| AppError::parse(PROVIDER, format!("invalid timestep time '{}': {e}", timestep.time)))?
            .with_timezone(&Utc);
        if local_hour(instant, utc_offset_minutes) % 6 != 0 {
            continue;
        }
        let time = match utc_offset_minutes {
            Some(offset) => format_local_iso(instant, offset),
            None => timestep.time.clone(),
        };
        retained.push((timestep, time));
    }

    let next_times: Vec<Option<String>> = retained
        .iter()
        .skip(1)
        .map(|(_, time)| Some(time.clone()))
        .chain(std::iter::once(None))
        .collect();

    Ok(retained
        .into_iter()
        .zip(next_times)
        .filter_map(|((timestep, time_from), time_to)| {
            let period = timestep.data.next_6_hours.as_ref()?;
            Some(converter.point(timestep, period, time_from, time_to))
        })
        .collect())
}

pub fn parse_forecast(
    body: &[u8],
    forecast_type: ForecastType,
    utc_offset_minutes: Option<i32>,
) -> Result<ForecastResponse, AppError> {
    let data: MetForecast = serde_json::from_slice(body)
        .map_err(|e| AppError::parse(PROVIDER, format!("invalid forecast JSON: {e}")))?;

    let converter = Converter {
        temperature_unit: data
            .properties
            .meta
            .units
            .get("air_temperature")
            .map(String::as_str)
            .unwrap_or("celsius"),
    };
    let timeseries = &data.properties.timeseries;
    let forecast = match forecast_type {
        ForecastType::Hourly => hourly(timeseries, &converter),
        ForecastType::Overview => six_hourly(timeseries, &converter, utc_offset_minutes)?,
    };

    // GeoJSON order: longitude, latitude, altitude
    let coordinates = &data.geometry.coordinates;
    Ok(ForecastResponse {
        location: ForecastLocation {
            city: None,
            country: None,
            latitude: coordinates.get(1).copied(),
            longitude: coordinates.first().copied(),
            altitude: coordinates.get(2).copied(),
        },
        meta: ForecastMeta {
            last_update: data.properties.meta.updated_at.clone(),
            next_update: None,
            credit_text: CREDIT_TEXT.to_string(),
            credit_url: CREDIT_URL.to_string(),
        },
        sun: None,
        forecast,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::{json, Value};

    /// Hourly timesteps; every step carries both 1h and 6h summaries.
    pub fn forecast_json(start: DateTime<Utc>, hours: i64, unit: &str) -> Value {
        let timeseries: Vec<Value> = (0..hours)
            .map(|hour| {
                let time = start + Duration::hours(hour);
                json!({
                    "time": time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                    "data": {
                        "instant": { "details": {
                            "air_pressure_at_sea_level": 1012.5,
                            "air_temperature": 50.0 + hour as f64,
                            "cloud_area_fraction": 80.0,
                            "relative_humidity": 70.5,
                            "wind_from_direction": 190.0,
                            "wind_speed": 3.4
                        }},
                        "next_1_hours": {
                            "summary": { "symbol_code": "cloudy" },
                            "details": { "precipitation_amount": 0.1 }
                        },
                        "next_6_hours": {
                            "summary": { "symbol_code": "rain_polartwilight" },
                            "details": {
                                "air_temperature_max": 12.1,
                                "air_temperature_min": 9.4,
                                "precipitation_amount": 1.2,
                                "probability_of_precipitation": 40.0
                            }
                        }
                    }
                })
            })
            .collect();

        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [24.935, 60.17, 13] },
            "properties": {
                "meta": {
                    "updated_at": "2024-05-01T10:31:07Z",
                    "units": { "air_temperature": unit }
                },
                "timeseries": timeseries
            }
        })
    }
}
