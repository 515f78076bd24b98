// Ports to the upstream providers
use crate::application::error::AppError;
use crate::domain::transit::TransitStop;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Outbound HTTP request. Header names are lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET",
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: &serde_json::Value) -> Self {
        Self::get(url)
            .with_method("POST")
            .with_header("content-type", "application/json")
            .with_body(Bytes::from(body.to_string()))
    }

    pub fn with_method(mut self, method: &'static str) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw upstream response: body bytes exactly as received (possibly
/// content-encoded), header names lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request. Only transport failures are errors; any HTTP status
    /// is returned as a response.
    async fn send(&self, provider: &str, request: UpstreamRequest) -> Result<UpstreamResponse, AppError>;
}

/// Parameters of one departures query covering every configured stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopQuery {
    pub stop_ids: Vec<String>,
    pub start_time: i64,
    pub number_of_departures: usize,
    pub language: String,
}

#[async_trait]
pub trait TransitSource: Send + Sync {
    async fn fetch_stops(&self, query: &StopQuery) -> Result<Vec<TransitStop>, AppError>;
}

#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), AppError>;

    async fn unsubscribe(&self, topic: &str) -> Result<(), AppError>;
}
