// Response views - domain payloads decorated with icon names
use crate::domain::forecast::{ForecastLocation, ForecastMeta, ForecastPoint, ForecastResponse, SunTimes};
use crate::domain::transit::{Departure, MergedAlert, TransitResponse};
use crate::presentation::icons::{alert_effect_icon, legacy_weather_icon, transit_mode_icon, weather_icon};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPointView<'a> {
    #[serde(flatten)]
    pub point: &'a ForecastPoint,
    pub weather_symbol: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ForecastView<'a> {
    pub location: &'a ForecastLocation,
    pub meta: &'a ForecastMeta,
    pub sun: Option<&'a SunTimes>,
    pub forecast: Vec<ForecastPointView<'a>>,
}

impl<'a> ForecastView<'a> {
    fn with_symbols(response: &'a ForecastResponse, icon: fn(&str) -> String) -> Self {
        Self {
            location: &response.location,
            meta: &response.meta,
            sun: response.sun.as_ref(),
            forecast: response
                .forecast
                .iter()
                .map(|point| ForecastPointView {
                    point,
                    weather_symbol: point.weather_code.as_deref().map(icon),
                })
                .collect(),
        }
    }

    /// Legacy Yr XML forecast with numeric symbol codes.
    pub fn legacy(response: &'a ForecastResponse) -> Self {
        Self::with_symbols(response, legacy_weather_icon)
    }

    /// MET Norway 2.0 forecast with named symbol codes.
    pub fn met(response: &'a ForecastResponse) -> Self {
        Self::with_symbols(response, weather_icon)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureView<'a> {
    #[serde(flatten)]
    pub departure: &'a Departure,
    pub mode_icon: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DirectionView<'a> {
    pub name: &'a str,
    pub departures: Vec<DepartureView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView<'a> {
    #[serde(flatten)]
    pub alert: &'a MergedAlert,
    pub effect_icon: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TransitView<'a> {
    pub directions: Vec<DirectionView<'a>>,
    pub alerts: Vec<AlertView<'a>>,
}

impl<'a> From<&'a TransitResponse> for TransitView<'a> {
    fn from(response: &'a TransitResponse) -> Self {
        Self {
            directions: response
                .directions
                .iter()
                .map(|direction| DirectionView {
                    name: &direction.name,
                    departures: direction
                        .departures
                        .iter()
                        .map(|departure| DepartureView {
                            departure,
                            mode_icon: transit_mode_icon(departure.mode.as_deref()),
                        })
                        .collect(),
                })
                .collect(),
            alerts: response
                .alerts
                .iter()
                .map(|alert| AlertView {
                    alert,
                    effect_icon: alert_effect_icon(alert.effect.as_deref()),
                })
                .collect(),
        }
    }
}
