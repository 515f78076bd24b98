// Error taxonomy shared by the services and the HTTP layer
use thiserror::Error;

const MAX_LOGGED_BODY_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{provider} request {method} '{url}' failed{}: {message}", status_suffix(.status))]
    Upstream {
        provider: String,
        method: String,
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("could not parse {provider} response: {message}")]
    Parse { provider: String, message: String },

    #[error("{provider} responded 304 Not Modified for '{url}' but no previous response is cached")]
    CacheConsistency { provider: String, url: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" with status {status}"))
        .unwrap_or_default()
}

impl AppError {
    pub fn parse(provider: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn transport(provider: &str, method: &str, url: &str, error: impl std::fmt::Display) -> Self {
        Self::Upstream {
            provider: provider.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            status: None,
            message: error.to_string(),
        }
    }

    /// Non-success HTTP status; the body is kept (truncated) for diagnosis.
    pub fn status(provider: &str, method: &str, url: &str, status: u16, body: &[u8]) -> Self {
        Self::Upstream {
            provider: provider.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            status: Some(status),
            message: truncate_body(body),
        }
    }
}

pub fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut truncated: String = text.chars().take(MAX_LOGGED_BODY_CHARS).collect();
    if text.chars().count() > MAX_LOGGED_BODY_CHARS {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_message() {
        let error = AppError::status("Sunrise", "GET", "https://example.test/x", 503, b"down");
        assert_eq!(
            error.to_string(),
            "Sunrise request GET 'https://example.test/x' failed with status 503: down"
        );

        let error = AppError::transport("FMI", "GET", "https://example.test/y", "connection refused");
        assert_eq!(
            error.to_string(),
            "FMI request GET 'https://example.test/y' failed: connection refused"
        );
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(400);
        let truncated = truncate_body(long.as_bytes());
        assert_eq!(truncated.len(), 303);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body(b"short"), "short");
    }
}
