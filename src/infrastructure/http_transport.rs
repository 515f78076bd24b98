// Reqwest-backed transport for every HTTP provider
use crate::application::error::AppError;
use crate::application::upstream::{HttpTransport, UpstreamRequest, UpstreamResponse};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Automatic decompression stays off: bodies are decoded by the
    /// cache-aware fetcher so 304 responses pass through untouched.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, provider: &str, request: UpstreamRequest) -> Result<UpstreamResponse, AppError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| AppError::transport(provider, request.method, &request.url, e))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::transport(provider, request.method, &request.url, e))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::transport(provider, request.method, &request.url, e))?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake_transport {
    use super::*;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued responses and records every request it receives.
    #[derive(Default)]
    pub struct FakeTransport {
        responses: Mutex<VecDeque<UpstreamResponse>>,
        requests: Mutex<Vec<UpstreamRequest>>,
    }

    impl FakeTransport {
        pub fn push(&self, status: u16, headers: &[(&str, &str)], body: impl Into<Bytes>) {
            let headers = headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            self.responses.lock().unwrap().push_back(UpstreamResponse {
                status,
                headers,
                body: body.into(),
            });
        }

        pub fn requests(&self) -> Vec<UpstreamRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn send(&self, provider: &str, request: UpstreamRequest) -> Result<UpstreamResponse, AppError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AppError::transport(provider, request.method, &request.url, "no response queued"))
        }
    }
}
