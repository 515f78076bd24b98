// Weather forecast domain models
use serde::Serialize;

/// Output granularity of a forecast series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastType {
    /// One point per hour.
    Hourly,
    /// One point per six local hours.
    Overview,
}

impl ForecastType {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.unwrap_or("hourly") {
            "hourly" => Some(Self::Hourly),
            "overview" => Some(Self::Overview),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Overview => "overview",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLocation {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMeta {
    pub last_update: Option<String>,
    pub next_update: Option<String>,
    pub credit_text: String,
    pub credit_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunTimes {
    pub rise: Option<String>,
    pub set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Temperature {
    pub value: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Precipitation {
    pub value: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wind {
    pub speed_meters_per_second: Option<f64>,
    pub direction_code: Option<String>,
    pub direction_degrees: Option<f64>,
}

/// One forecast time window. `weather_code` is the provider's own symbol
/// code; icon mapping happens at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub time_from: String,
    pub time_to: Option<String>,
    pub weather_code: Option<String>,
    pub weather_text: Option<String>,
    pub temperature: Temperature,
    #[serde(rename = "pressureHPa")]
    pub pressure_hpa: Option<f64>,
    pub precipitation: Precipitation,
    pub wind: Wind,
    pub cloud_percentage: Option<f64>,
    pub relative_humidity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub location: ForecastLocation,
    pub meta: ForecastMeta,
    pub sun: Option<SunTimes>,
    pub forecast: Vec<ForecastPoint>,
}
