// Forecast service - Use cases for the MET v2 and legacy Yr forecasts
use crate::application::error::AppError;
use crate::domain::conversions::round_coordinate;
use crate::domain::forecast::{ForecastResponse, ForecastType};
use crate::infrastructure::cached_fetcher::CachedFetcher;
use crate::infrastructure::memory_cache::TtlCache;
use crate::infrastructure::parsers::{met_forecast, yr_legacy};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

const FORECAST_DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
const FORECAST_MAX_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const FORECAST_COORDINATE_DECIMALS: u32 = 3;

pub struct ForecastService {
    fetcher: Arc<CachedFetcher>,
    parsed: TtlCache<ForecastResponse>,
    met_base_url: String,
    yr_base_url: String,
}

fn place_segment(text: &str) -> String {
    urlencoding::encode(&text.trim().replace(' ', "_")).into_owned()
}

impl ForecastService {
    pub fn new(
        fetcher: Arc<CachedFetcher>,
        clock: Arc<dyn Clock>,
        met_base_url: impl Into<String>,
        yr_base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            parsed: TtlCache::new(clock),
            met_base_url: met_base_url.into(),
            yr_base_url: yr_base_url.into(),
        }
    }

    /// MET Norway locationforecast 2.0. The parsed series is cached per
    /// upstream payload, granularity and UTC offset.
    pub async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        forecast_type: ForecastType,
        utc_offset_minutes: Option<i32>,
    ) -> Result<Arc<ForecastResponse>, AppError> {
        let lat = round_coordinate(latitude, FORECAST_COORDINATE_DECIMALS);
        let lon = round_coordinate(longitude, FORECAST_COORDINATE_DECIMALS);
        let url = format!(
            "{}/weatherapi/locationforecast/2.0/complete?lat={lat}&lon={lon}",
            self.met_base_url
        );

        let entry = self
            .fetcher
            .fetch(&url, met_forecast::PROVIDER, FORECAST_DEFAULT_TTL, FORECAST_MAX_TTL)
            .await?;

        let key = format!(
            "{lat}:{lon}:{}:{}:{}",
            entry.data_timestamp(),
            forecast_type.as_str(),
            utc_offset_minutes.map(|offset| offset.to_string()).unwrap_or_default()
        );
        if let Some(parsed) = self.parsed.get(&key) {
            return Ok(parsed);
        }

        let parsed = met_forecast::parse_forecast(&entry.response.body, forecast_type, utc_offset_minutes)?;
        Ok(self.parsed.insert(key, parsed, FORECAST_MAX_TTL))
    }

    /// Legacy Yr place-based XML forecast.
    pub async fn legacy_forecast(
        &self,
        country: &str,
        county: &str,
        city: &str,
        forecast_type: ForecastType,
    ) -> Result<Arc<ForecastResponse>, AppError> {
        let document = match forecast_type {
            ForecastType::Hourly => "forecast_hour_by_hour",
            ForecastType::Overview => "forecast",
        };
        let url = format!(
            "{}/place/{}/{}/{}/{document}.xml",
            self.yr_base_url,
            place_segment(country),
            place_segment(county),
            place_segment(city)
        );

        let entry = self
            .fetcher
            .fetch(&url, yr_legacy::PROVIDER, FORECAST_DEFAULT_TTL, FORECAST_MAX_TTL)
            .await?;

        let key = format!("{url}:{}", entry.data_timestamp());
        if let Some(parsed) = self.parsed.get(&key) {
            return Ok(parsed);
        }

        let parsed = yr_legacy::parse_forecast(&entry.response.body)?;
        Ok(self.parsed.insert(key, parsed, FORECAST_MAX_TTL))
    }

    pub fn purge_expired(&self) -> usize {
        self.parsed.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_transport::fake_transport::FakeTransport;
    use crate::infrastructure::memory_cache::test_clock::MutableClock;
    use crate::infrastructure::parsers::met_forecast::fixtures::forecast_json;
    use crate::infrastructure::parsers::yr_legacy::fixtures::FORECAST_XML;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn setup() -> (Arc<FakeTransport>, Arc<MutableClock>, ForecastService) {
        let transport = Arc::new(FakeTransport::default());
        let clock = Arc::new(MutableClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
        let fetcher = Arc::new(CachedFetcher::new(transport.clone(), clock.clone()));
        let service = ForecastService::new(fetcher, clock.clone(), "https://met.test", "https://yr.test");
        (transport, clock, service)
    }

    fn met_body() -> String {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        forecast_json(start, 24, "celsius").to_string()
    }

    #[tokio::test]
    async fn test_forecast_rounds_coordinates_in_url() {
        let (transport, _clock, service) = setup();
        transport.push(200, &[], met_body());

        let response = service
            .forecast(60.169_52, 24.935_45, ForecastType::Hourly, None)
            .await
            .unwrap();

        assert_eq!(response.forecast.len(), 24);
        assert_eq!(
            transport.requests()[0].url,
            "https://met.test/weatherapi/locationforecast/2.0/complete?lat=60.17&lon=24.935"
        );
    }

    #[tokio::test]
    async fn test_parsed_forecast_is_reused_for_same_payload() {
        let (transport, clock, service) = setup();
        transport.push(200, &[], met_body());

        let first = service.forecast(60.17, 24.93, ForecastType::Overview, Some(120)).await.unwrap();
        clock.advance(TimeDelta::minutes(10));
        let second = service.forecast(60.17, 24.93, ForecastType::Overview, Some(120)).await.unwrap();

        assert_eq!(transport.request_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_granularity_and_offset_are_cached_separately() {
        let (transport, _clock, service) = setup();
        transport.push(200, &[], met_body());

        let hourly = service.forecast(60.17, 24.93, ForecastType::Hourly, None).await.unwrap();
        let overview = service.forecast(60.17, 24.93, ForecastType::Overview, Some(120)).await.unwrap();
        let overview_utc = service.forecast(60.17, 24.93, ForecastType::Overview, None).await.unwrap();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(hourly.forecast.len(), 24);
        assert_eq!(overview.forecast[0].time_from, "2024-05-01T18:00:00+02:00");
        assert_eq!(overview_utc.forecast[0].time_from, "2024-05-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_legacy_forecast_url_and_parse() {
        let (transport, _clock, service) = setup();
        transport.push(200, &[], FORECAST_XML);

        let response = service
            .legacy_forecast("Finland", "Uusimaa", "Helsinki Kallio", ForecastType::Hourly)
            .await
            .unwrap();

        assert_eq!(response.forecast.len(), 3);
        assert_eq!(
            transport.requests()[0].url,
            "https://yr.test/place/Finland/Uusimaa/Helsinki_Kallio/forecast_hour_by_hour.xml"
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_propagated() {
        let (transport, _clock, service) = setup();
        transport.push(500, &[], "boom");

        let result = service.forecast(60.17, 24.93, ForecastType::Hourly, None).await;
        assert!(matches!(result, Err(AppError::Upstream { status: Some(500), .. })));
    }
}
