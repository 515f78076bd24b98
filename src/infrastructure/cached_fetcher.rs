// Cache-aware HTTP fetcher with conditional-request support
//
// A cached response is served without contacting the provider while it is
// fresh. Once stale it is revalidated with `If-Modified-Since`; a 304 keeps
// serving the cached copy until the cache drops it after `max_ttl`.
use crate::application::error::AppError;
use crate::application::upstream::{HttpTransport, UpstreamRequest, UpstreamResponse};
use crate::infrastructure::http_response::{decode_body, ContentEncoding};
use crate::infrastructure::memory_cache::TtlCache;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const USER_AGENT: &str = "infoscreen-server/0.1 (dashboard data aggregator)";
const NOT_MODIFIED: u16 = 304;

/// How long a cached response may be served without revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Provider sent an `Expires` header.
    Explicit { expires_at: DateTime<Utc> },
    /// No expiry from the provider: fresh for `default_ttl`, retained for `max_ttl`.
    Approximate {
        stored_at: DateTime<Utc>,
        default_ttl: TimeDelta,
        max_ttl: TimeDelta,
    },
}

impl Freshness {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match *self {
            Self::Explicit { expires_at } => now < expires_at,
            // Remaining retention (stored_at + max_ttl - now) minus the share
            // beyond the default TTL, i.e. the age must stay below default_ttl.
            Self::Approximate {
                stored_at,
                default_ttl,
                max_ttl: _,
            } => now - stored_at < default_ttl,
        }
    }
}

/// Slimmed provider response: body decoded, `content-encoding` removed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHttpResponse {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl NormalizedHttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn json<T: DeserializeOwned>(&self, provider: &str) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::parse(provider, format!("invalid JSON from '{}': {e}", self.url)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub response: NormalizedHttpResponse,
    pub freshness: Freshness,
    /// `Last-Modified` value to send back as `If-Modified-Since`.
    pub validator: Option<String>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Identifies the upstream payload version held by this entry.
    pub fn data_timestamp(&self) -> String {
        self.validator
            .clone()
            .unwrap_or_else(|| self.stored_at.to_rfc3339())
    }
}

pub struct CachedFetcher {
    transport: Arc<dyn HttpTransport>,
    cache: TtlCache<CacheEntry>,
    clock: Arc<dyn Clock>,
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

impl CachedFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            cache: TtlCache::new(Arc::clone(&clock)),
            clock,
        }
    }

    pub async fn fetch(
        &self,
        url: &str,
        provider: &str,
        default_ttl: Duration,
        max_ttl: Duration,
    ) -> Result<Arc<CacheEntry>, AppError> {
        let cached = self.cache.get(url);
        if let Some(entry) = &cached {
            if entry.freshness.is_fresh(self.clock.utc()) {
                return Ok(Arc::clone(entry));
            }
        }

        let validator = cached.as_ref().and_then(|entry| entry.validator.as_deref());
        let response = self.send(url, provider, validator).await?;
        if response.status == NOT_MODIFIED {
            return cached.ok_or_else(|| AppError::CacheConsistency {
                provider: provider.to_string(),
                url: url.to_string(),
            });
        }
        let response = normalize(url, provider, response).await?;

        let now = self.clock.utc();
        let entry = CacheEntry {
            freshness: freshness_from_headers(&response.headers, now, default_ttl, max_ttl),
            validator: response.headers.get("last-modified").cloned(),
            stored_at: now,
            response,
        };
        Ok(self.cache.insert(url, entry, max_ttl))
    }

    /// Plain GET for URLs that differ on every call and would only pile up
    /// in the response cache.
    pub async fn fetch_uncached(&self, url: &str, provider: &str) -> Result<NormalizedHttpResponse, AppError> {
        let response = self.send(url, provider, None).await?;
        normalize(url, provider, response).await
    }

    async fn send(&self, url: &str, provider: &str, validator: Option<&str>) -> Result<UpstreamResponse, AppError> {
        tracing::info!("Requesting new {} data from '{}'", provider, url);
        let mut request = UpstreamRequest::get(url)
            .with_header("accept-encoding", "gzip, deflate")
            .with_header("user-agent", USER_AGENT);
        if let Some(validator) = validator {
            request = request.with_header("if-modified-since", validator);
        }

        let response = self.transport.send(provider, request).await?;
        tracing::info!("{} API responded with status code {}", provider, response.status);
        Ok(response)
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }
}

async fn normalize(url: &str, provider: &str, response: UpstreamResponse) -> Result<NormalizedHttpResponse, AppError> {
    if !response.is_success() {
        return Err(AppError::status(provider, "GET", url, response.status, &response.body));
    }

    let mut headers = response.headers;
    let mut body = response.body;
    if let Some(encoding) = headers
        .get("content-encoding")
        .and_then(|value| ContentEncoding::from_header(value))
    {
        body = decode_body(body, encoding)
            .await
            .map_err(|e| AppError::parse(provider, format!("could not decode {encoding:?} body: {e}")))?;
        headers.remove("content-encoding");
    }

    Ok(NormalizedHttpResponse {
        method: "GET".to_string(),
        url: url.to_string(),
        status: response.status,
        headers,
        body,
    })
}

fn freshness_from_headers(
    headers: &BTreeMap<String, String>,
    now: DateTime<Utc>,
    default_ttl: Duration,
    max_ttl: Duration,
) -> Freshness {
    let approximate = Freshness::Approximate {
        stored_at: now,
        default_ttl: to_delta(default_ttl),
        max_ttl: to_delta(max_ttl),
    };
    let Some(expires) = headers.get("expires") else {
        return approximate;
    };
    match DateTime::parse_from_rfc2822(expires) {
        Ok(expires_at) => Freshness::Explicit {
            expires_at: expires_at.with_timezone(&Utc),
        },
        // An invalid date such as `0` means already expired
        Err(e) => {
            tracing::warn!("Treating unparseable Expires header '{}' as expired: {}", expires, e);
            Freshness::Explicit { expires_at: now }
        }
    }
}
