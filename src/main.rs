// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use mockable::{Clock, DefaultClock};
use tokio::sync::mpsc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::application::forecast_service::ForecastService;
use crate::application::observation_service::ObservationService;
use crate::application::sensor_service::SensorService;
use crate::application::sunrise_service::SunriseService;
use crate::application::transit_service::TransitService;
use crate::infrastructure::cached_fetcher::CachedFetcher;
use crate::infrastructure::config::{load_config, SensorsConfig, DEFAULT_CONFIG_PATH};
use crate::infrastructure::digitransit::DigitransitClient;
use crate::infrastructure::http_transport::ReqwestTransport;
use crate::infrastructure::mqtt_broker::{mqtt_options, MqttBroker};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const BROKER_EVENT_CAPACITY: usize = 64;

fn start_sensor_service(
    config: &SensorsConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Option<Arc<SensorService>>> {
    let Some(broker_url) = config.broker_url.as_deref() else {
        info!("No MQTT broker configured, sensor endpoint disabled");
        return Ok(None);
    };

    let (events_tx, events_rx) = mpsc::channel(BROKER_EVENT_CAPACITY);
    let broker = Arc::new(MqttBroker::new(mqtt_options(broker_url, &config.client_id)?, events_tx));
    let service = Arc::new(SensorService::new(
        broker,
        clock,
        config.sensors.clone(),
        Duration::from_secs(config.response_timeout_seconds),
        Duration::from_secs(config.unsubscribe_after_minutes * 60),
    ));
    tokio::spawn(Arc::clone(&service).run(events_rx));
    Ok(Some(service))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config(DEFAULT_CONFIG_PATH)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    // Create adapters (infrastructure layer)
    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
        config.server.upstream_timeout_seconds,
    ))?);
    let fetcher = Arc::new(CachedFetcher::new(transport.clone(), Arc::clone(&clock)));
    let transit_source = Arc::new(DigitransitClient::new(
        transport,
        config.providers.digitransit_base_url.clone(),
        config.transportation.region.clone(),
        config.transportation.api_key.clone(),
    ));

    // Create services (application layer)
    let forecast_service = ForecastService::new(
        Arc::clone(&fetcher),
        Arc::clone(&clock),
        config.providers.met_base_url.clone(),
        config.providers.yr_base_url.clone(),
    );
    let observation_service = ObservationService::new(
        Arc::clone(&fetcher),
        Arc::clone(&clock),
        config.providers.fmi_base_url.clone(),
    );
    let sunrise_service = SunriseService::new(
        Arc::clone(&fetcher),
        Arc::clone(&clock),
        config.providers.met_base_url.clone(),
    );
    let transit_service = TransitService::new(
        transit_source,
        Arc::clone(&clock),
        config.transportation.clone(),
    );
    let sensor_service = start_sensor_service(&config.sensors, Arc::clone(&clock))?;

    // Create application state
    let state = Arc::new(AppState {
        fetcher,
        forecast_service,
        observation_service,
        sunrise_service,
        transit_service,
        sensor_service,
        public_config: config.public(),
    });

    // Sweep caches so entries nobody reads again do not linger
    let sweep_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = sweep_state.purge_expired();
            info!("Purged {} expired cache entries", purged);
        }
    });

    // Build router (presentation layer)
    let router = router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server.bind_address.parse()?;
    info!("Starting infoscreen server on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
