// Weather observation domain models
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Observation parameters reported on the dashboard, paired with the
/// provider's parameter code.
pub const OBSERVATION_PARAMETERS: [(&str, &str); 7] = [
    ("temperature", "t2m"),
    ("rainAmount", "r_1h"),
    ("rainIntensity", "ri_10min"),
    ("relativeHumidity", "rh"),
    ("airPressure", "p_sea"),
    ("visibility", "vis"),
    ("clouds", "n_man"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Time-ordered samples of one parameter plus their summary values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationSeries {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub latest: Option<Sample>,
    pub history: Vec<Sample>,
}

impl ObservationSeries {
    /// Build a series from raw samples. Non-numeric (NaN) values are dropped
    /// and the history is sorted by time.
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut history: Vec<Sample> = samples
            .into_iter()
            .filter(|sample| !sample.value.is_nan())
            .collect();
        history.sort_by_key(|sample| sample.time);

        let min_value = history.iter().map(|s| s.value).reduce(f64::min);
        let max_value = history.iter().map(|s| s.value).reduce(f64::max);
        let latest = history.last().cloned();

        Self {
            min_value,
            max_value,
            latest,
            history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationLocation {
    pub place: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationMeta {
    pub timestamp: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub credit_text: String,
    pub credit_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationResponse {
    pub location: ObservationLocation,
    pub meta: ObservationMeta,
    #[serde(flatten)]
    pub series: BTreeMap<String, ObservationSeries>,
}
