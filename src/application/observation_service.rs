// Observation service - Use case for the latest FMI weather observations
use crate::application::error::AppError;
use crate::domain::conversions::format_utc_millis;
use crate::domain::observation::ObservationResponse;
use crate::infrastructure::cached_fetcher::CachedFetcher;
use crate::infrastructure::memory_cache::TtlCache;
use crate::infrastructure::parsers::fmi_observation;
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

const OBSERVATION_TTL: Duration = Duration::from_secs(5 * 60);
/// Long enough to catch hourly parameters such as `r_1h`.
const HISTORY_LENGTH_MINUTES: i64 = 75;
const TIMESTEP_MINUTES: u32 = 10;

pub struct ObservationService {
    fetcher: Arc<CachedFetcher>,
    parsed: TtlCache<ObservationResponse>,
    clock: Arc<dyn Clock>,
    fmi_base_url: String,
}

impl ObservationService {
    pub fn new(fetcher: Arc<CachedFetcher>, clock: Arc<dyn Clock>, fmi_base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            parsed: TtlCache::new(Arc::clone(&clock)),
            clock,
            fmi_base_url: fmi_base_url.into(),
        }
    }

    fn base_url(&self, place: &str) -> String {
        let parameters: Vec<&str> = fmi_observation::parameter_codes().collect();
        format!(
            "{}/wfs?service=WFS&version=2.0.0&request=getFeature\
             &storedquery_id=fmi::observations::weather::timevaluepair\
             &place={}&timestep={TIMESTEP_MINUTES}&parameters={}",
            self.fmi_base_url,
            urlencoding::encode(place),
            parameters.join(",")
        )
    }

    pub async fn observation(&self, place: &str) -> Result<Arc<ObservationResponse>, AppError> {
        let base_url = self.base_url(place);
        if let Some(parsed) = self.parsed.get(&base_url) {
            return Ok(parsed);
        }

        let start_time = self.clock.utc() - TimeDelta::minutes(HISTORY_LENGTH_MINUTES);
        // The start time changes every call, so only the parsed result is cached
        let url = format!("{base_url}&starttime={}", format_utc_millis(start_time));
        let response = self.fetcher.fetch_uncached(&url, fmi_observation::PROVIDER).await?;

        let parsed = fmi_observation::parse_observations(&response.body)?;
        Ok(self.parsed.insert(base_url, parsed, OBSERVATION_TTL))
    }

    pub fn purge_expired(&self) -> usize {
        self.parsed.purge_expired()
    }
}
