// Sunrise domain model
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SunriseTimes {
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub license_url: Option<String>,
}
