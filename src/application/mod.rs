// Application layer - Services and the ports they depend on
pub mod error;
pub mod forecast_service;
pub mod observation_service;
pub mod sensor_service;
pub mod sunrise_service;
pub mod transit_service;
pub mod upstream;
