// MET Norway sunrise 2.0 -> SunriseTimes
use crate::application::error::AppError;
use crate::domain::sunrise::SunriseTimes;
use serde::Deserialize;

pub const PROVIDER: &str = "Sunrise";

#[derive(Debug, Deserialize)]
struct SunriseDocument {
    location: SunriseLocation,
    #[serde(default)]
    meta: SunriseMeta,
}

#[derive(Debug, Default, Deserialize)]
struct SunriseMeta {
    licenseurl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SunriseLocation {
    #[serde(default)]
    time: Vec<SunriseDay>,
}

#[derive(Debug, Deserialize)]
struct SunriseDay {
    date: String,
    sunrise: Option<Event>,
    sunset: Option<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    time: String,
}

/// Pick the entry for `date` (`YYYY-MM-DD`). Polar days and nights have no
/// sunrise or sunset event, which is reported as `None`.
pub fn parse_sunrise(body: &[u8], date: &str) -> Result<SunriseTimes, AppError> {
    let document: SunriseDocument = serde_json::from_slice(body)
        .map_err(|e| AppError::parse(PROVIDER, format!("invalid sunrise JSON: {e}")))?;

    let day = document
        .location
        .time
        .into_iter()
        .find(|day| day.date == date)
        .ok_or_else(|| AppError::parse(PROVIDER, format!("no sunrise data for {date}")))?;

    Ok(SunriseTimes {
        sunrise: day.sunrise.map(|event| event.time),
        sunset: day.sunset.map(|event| event.time),
        license_url: document.meta.licenseurl,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const SUNRISE_JSON: &str = r#"{
      "location": {
        "height": "0",
        "latitude": "60.2",
        "longitude": "24.9",
        "time": [
          {
            "date": "2024-05-01",
            "sunrise": { "desc": "LOCAL DIURNAL SUN RISE", "time": "2024-05-01T05:13:41+03:00" },
            "sunset": { "desc": "LOCAL DIURNAL SUN SET", "time": "2024-05-01T21:26:05+03:00" }
          },
          { "date": "2024-05-02", "moonphase": { "value": "72.1" } }
        ]
      },
      "meta": { "licenseurl": "https://api.met.no/license_data.html" }
    }"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::SUNRISE_JSON;
    use super::*;

    #[test]
    fn test_parse_sunrise_for_date() {
        let times = parse_sunrise(SUNRISE_JSON.as_bytes(), "2024-05-01").unwrap();
        assert_eq!(times.sunrise.as_deref(), Some("2024-05-01T05:13:41+03:00"));
        assert_eq!(times.sunset.as_deref(), Some("2024-05-01T21:26:05+03:00"));
        assert_eq!(times.license_url.as_deref(), Some("https://api.met.no/license_data.html"));
    }

    #[test]
    fn test_day_without_events() {
        let times = parse_sunrise(SUNRISE_JSON.as_bytes(), "2024-05-02").unwrap();
        assert_eq!(times.sunrise, None);
        assert_eq!(times.sunset, None);
    }

    #[test]
    fn test_missing_date_is_parse_error() {
        let result = parse_sunrise(SUNRISE_JSON.as_bytes(), "2024-06-01");
        assert!(matches!(result, Err(AppError::Parse { .. })));
    }
}
