// HTTP request handlers
use crate::application::error::AppError;
use crate::domain::conversions::parse_coordinate;
use crate::domain::forecast::ForecastType;
use crate::presentation::app_state::AppState;
use crate::presentation::views::{ForecastView, TransitView};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunriseQuery {
    pub date: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub utc_offset: Option<String>,
}

#[derive(Deserialize)]
pub struct LegacyForecastQuery {
    pub country: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub forecast_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    #[serde(rename = "type")]
    pub forecast_type: Option<String>,
    pub utc_offset: Option<String>,
}

#[derive(Deserialize)]
pub struct ObservationQuery {
    pub place: Option<String>,
}

fn coordinate(name: &str, raw: Option<&str>) -> Result<f64, AppError> {
    raw.and_then(parse_coordinate)
        .ok_or_else(|| AppError::InvalidRequest(format!("'{name}' must be a number")))
}

fn required<'a>(name: &str, raw: &'a Option<String>) -> Result<&'a str, AppError> {
    raw.as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::InvalidRequest(format!("'{name}' is required")))
}

fn forecast_type(raw: Option<&str>) -> Result<ForecastType, AppError> {
    ForecastType::parse(raw).ok_or_else(|| {
        AppError::InvalidRequest(format!("unknown forecast type '{}'", raw.unwrap_or_default()))
    })
}

const MAX_UTC_OFFSET_MINUTES: i64 = 24 * 60;

/// Leading integer of `raw` (`"120"`, `"-60min"`); non-numeric input is
/// ignored, offsets beyond a day are rejected.
fn utc_offset_minutes(raw: Option<&str>) -> Result<Option<i32>, AppError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    let digits_end = raw
        .char_indices()
        .find(|&(index, c)| !(c.is_ascii_digit() || (index == 0 && (c == '-' || c == '+'))))
        .map(|(index, _)| index)
        .unwrap_or(raw.len());
    let digits = &raw[..digits_end];
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return Ok(None);
    }

    digits
        .parse::<i64>()
        .ok()
        .filter(|minutes| minutes.abs() <= MAX_UTC_OFFSET_MINUTES)
        .and_then(|minutes| i32::try_from(minutes).ok())
        .map(Some)
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "'utcOffset' must be within ±{MAX_UTC_OFFSET_MINUTES} minutes"
            ))
        })
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Public part of the configuration for building the dashboard widgets
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.public_config.clone())
}

pub async fn get_sunrise(
    Query(query): Query<SunriseQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let lat = coordinate("lat", query.lat.as_deref())?;
    let lon = coordinate("lon", query.lon.as_deref())?;
    let times = state
        .sunrise_service
        .sunrise_times(query.date.as_deref(), lat, lon, query.utc_offset.as_deref())
        .await?;
    Ok(Json(times.as_ref()).into_response())
}

/// Legacy Yr place forecast
pub async fn get_weather_forecast(
    Query(query): Query<LegacyForecastQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let forecast_type = forecast_type(query.forecast_type.as_deref())?;
    let forecast = state
        .forecast_service
        .legacy_forecast(
            required("country", &query.country)?,
            required("county", &query.county)?,
            required("city", &query.city)?,
            forecast_type,
        )
        .await?;
    Ok(Json(ForecastView::legacy(&forecast)).into_response())
}

pub async fn get_weather_forecast_v2(
    Query(query): Query<ForecastQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let lat = coordinate("lat", query.lat.as_deref())?;
    let lon = coordinate("lon", query.lon.as_deref())?;
    let forecast_type = forecast_type(query.forecast_type.as_deref())?;
    let offset = utc_offset_minutes(query.utc_offset.as_deref())?;

    let forecast = state
        .forecast_service
        .forecast(lat, lon, forecast_type, offset)
        .await?;
    Ok(Json(ForecastView::met(&forecast)).into_response())
}

/// Latest FMI observations; `place` defaults to the configured one
pub async fn get_weather_observation(
    Query(query): Query<ObservationQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let place = query
        .place
        .clone()
        .filter(|place| !place.trim().is_empty())
        .or_else(|| state.public_config.weather.observation_place.clone())
        .ok_or_else(|| AppError::InvalidRequest("'place' is required".to_string()))?;

    let observation = state.observation_service.observation(&place).await?;
    Ok(Json(observation.as_ref()).into_response())
}

pub async fn get_sensor(
    Path(sensor_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let sensors = state
        .sensor_service
        .as_ref()
        .ok_or_else(|| AppError::Configuration("no MQTT broker URL set".to_string()))?;
    let reading = sensors.latest_reading(&sensor_id).await?;
    Ok(Json(reading).into_response())
}

pub async fn get_transportation(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let departures = state.transit_service.departures().await?;
    Ok(Json(TransitView::from(&departures)).into_response())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/config", get(get_config))
        .route("/api/sunrise", get(get_sunrise))
        .route("/api/weather-forecast", get(get_weather_forecast))
        .route("/api/weather-forecast-v2", get(get_weather_forecast_v2))
        .route("/api/weather-observation", get(get_weather_observation))
        .route("/api/sensor/:sensor_id", get(get_sensor))
        .route("/api/transportation", get(get_transportation))
        .with_state(state)
}
