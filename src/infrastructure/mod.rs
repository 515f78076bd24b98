// Infrastructure layer - External dependencies and adapters
pub mod cached_fetcher;
pub mod config;
pub mod digitransit;
pub mod http_response;
pub mod http_transport;
pub mod memory_cache;
pub mod mqtt_broker;
pub mod parsers;
pub mod xml;
