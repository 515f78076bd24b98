use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/infoscreen";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub transportation: TransportationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            upstream_timeout_seconds: default_upstream_timeout(),
        }
    }
}

/// Upstream base URLs, without trailing slash.
#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_met_url")]
    pub met_base_url: String,
    #[serde(default = "default_yr_url")]
    pub yr_base_url: String,
    #[serde(default = "default_fmi_url")]
    pub fmi_base_url: String,
    #[serde(default = "default_digitransit_url")]
    pub digitransit_base_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            met_base_url: default_met_url(),
            yr_base_url: default_yr_url(),
            fmi_base_url: default_fmi_url(),
            digitransit_base_url: default_digitransit_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct WeatherConfig {
    pub forecast: Option<ForecastLocationConfig>,
    pub observation_place: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ForecastLocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_minutes: Option<i32>,
    pub country: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SensorsConfig {
    #[serde(skip_serializing)]
    pub broker_url: Option<String>,
    #[serde(skip_serializing, default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_response_timeout")]
    pub response_timeout_seconds: u64,
    #[serde(default = "default_unsubscribe_after")]
    pub unsubscribe_after_minutes: u64,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            broker_url: None,
            client_id: default_client_id(),
            response_timeout_seconds: default_response_timeout(),
            unsubscribe_after_minutes: default_unsubscribe_after(),
            sensors: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SensorConfig {
    pub id: String,
    pub title: Option<String>,
    pub topic: String,
    pub decimals: Option<u32>,
    pub unit_postfix: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct TransportationConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub directions: Vec<DirectionConfig>,
}

impl Default for TransportationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region: default_region(),
            language: default_language(),
            directions: Vec::new(),
        }
    }
}

/// A named group of stops shown as one departures list.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DirectionConfig {
    pub name: String,
    #[serde(default)]
    pub show: usize,
    #[serde(default)]
    pub stops: Vec<StopConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct StopConfig {
    pub digitransit_id: String,
    #[serde(default)]
    pub walk_in_minutes: u32,
    /// Takes precedence over `exclude_lines`.
    pub include_only_lines: Option<Vec<String>>,
    pub exclude_lines: Option<Vec<String>>,
}

/// The part of the configuration the dashboard client may see.
#[derive(Debug, Serialize, Clone)]
pub struct PublicConfig {
    pub weather: WeatherConfig,
    pub sensors: SensorsConfig,
    pub transportation: TransportationConfig,
}

impl AppConfig {
    pub fn public(&self) -> PublicConfig {
        PublicConfig {
            weather: self.weather.clone(),
            sensors: self.sensors.clone(),
            transportation: self.transportation.clone(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_upstream_timeout() -> u64 {
    20
}

fn default_met_url() -> String {
    "https://api.met.no".to_string()
}

fn default_yr_url() -> String {
    "https://www.yr.no".to_string()
}

fn default_fmi_url() -> String {
    "https://opendata.fmi.fi".to_string()
}

fn default_digitransit_url() -> String {
    "https://api.digitransit.fi".to_string()
}

fn default_client_id() -> String {
    "infoscreen-server".to_string()
}

fn default_response_timeout() -> u64 {
    30
}

fn default_unsubscribe_after() -> u64 {
    60
}

fn default_region() -> String {
    "hsl".to_string()
}

fn default_language() -> String {
    "fi".to_string()
}

/// Load `{path}.toml` (optional) overlaid with `INFOSCREEN__*` variables.
pub fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    let settings = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("INFOSCREEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
