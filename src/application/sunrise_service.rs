// Sunrise service - Use case for daily sunrise and sunset times
use crate::application::error::AppError;
use crate::domain::conversions::round_coordinate;
use crate::domain::sunrise::SunriseTimes;
use crate::infrastructure::cached_fetcher::CachedFetcher;
use crate::infrastructure::memory_cache::TtlCache;
use crate::infrastructure::parsers::met_sunrise;
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

const SUNRISE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
// The sunrise API truncates anything past one decimal.
const SUNRISE_COORDINATE_DECIMALS: u32 = 1;
const DEFAULT_UTC_OFFSET: &str = "+00:00";

pub struct SunriseService {
    fetcher: Arc<CachedFetcher>,
    parsed: TtlCache<SunriseTimes>,
    clock: Arc<dyn Clock>,
    met_base_url: String,
}

impl SunriseService {
    pub fn new(fetcher: Arc<CachedFetcher>, clock: Arc<dyn Clock>, met_base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            parsed: TtlCache::new(Arc::clone(&clock)),
            clock,
            met_base_url: met_base_url.into(),
        }
    }

    /// `date` is `YYYY-MM-DD` and defaults to today (UTC); `utc_offset` is
    /// `±HH:MM` and defaults to `+00:00`.
    pub async fn sunrise_times(
        &self,
        date: Option<&str>,
        latitude: f64,
        longitude: f64,
        utc_offset: Option<&str>,
    ) -> Result<Arc<SunriseTimes>, AppError> {
        let date = match date {
            Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| AppError::InvalidRequest(format!("invalid date '{date}', expected YYYY-MM-DD")))?,
            None => self.clock.utc().date_naive(),
        };
        let date = date.format("%Y-%m-%d").to_string();
        let lat = round_coordinate(latitude, SUNRISE_COORDINATE_DECIMALS);
        let lon = round_coordinate(longitude, SUNRISE_COORDINATE_DECIMALS);
        let offset = utc_offset.unwrap_or(DEFAULT_UTC_OFFSET);
        let url = format!(
            "{}/weatherapi/sunrise/2.0/.json?date={date}&lat={lat}&lon={lon}&offset={}",
            self.met_base_url,
            urlencoding::encode(offset)
        );

        if let Some(parsed) = self.parsed.get(&url) {
            return Ok(parsed);
        }

        let entry = self
            .fetcher
            .fetch(&url, met_sunrise::PROVIDER, SUNRISE_TTL, SUNRISE_TTL)
            .await?;
        let parsed = met_sunrise::parse_sunrise(&entry.response.body, &date)?;
        Ok(self.parsed.insert(url, parsed, SUNRISE_TTL))
    }

    pub fn purge_expired(&self) -> usize {
        self.parsed.purge_expired()
    }
}
