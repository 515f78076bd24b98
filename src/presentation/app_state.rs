// Application state for HTTP handlers
use crate::application::forecast_service::ForecastService;
use crate::application::observation_service::ObservationService;
use crate::application::sensor_service::SensorService;
use crate::application::sunrise_service::SunriseService;
use crate::application::transit_service::TransitService;
use crate::infrastructure::cached_fetcher::CachedFetcher;
use crate::infrastructure::config::PublicConfig;
use std::sync::Arc;

pub struct AppState {
    pub fetcher: Arc<CachedFetcher>,
    pub forecast_service: ForecastService,
    pub observation_service: ObservationService,
    pub sunrise_service: SunriseService,
    pub transit_service: TransitService,
    /// `None` when no MQTT broker is configured.
    pub sensor_service: Option<Arc<SensorService>>,
    pub public_config: PublicConfig,
}

impl AppState {
    /// Drop every cache entry past its max TTL. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        self.fetcher.purge_expired()
            + self.forecast_service.purge_expired()
            + self.observation_service.purge_expired()
            + self.sunrise_service.purge_expired()
    }
}
