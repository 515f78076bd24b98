// Mapping of application errors onto HTTP responses
use crate::application::error::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } | AppError::Parse { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::CacheConsistency { .. } | AppError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!("Request failed with {}: {}", status, self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::InvalidRequest("lat".to_string()), StatusCode::BAD_REQUEST)]
    #[case(AppError::NotFound("sensor".to_string()), StatusCode::NOT_FOUND)]
    #[case(AppError::parse("FMI observation", "bad"), StatusCode::BAD_GATEWAY)]
    #[case(AppError::transport("Sunrise", "GET", "https://x.test", "refused"), StatusCode::BAD_GATEWAY)]
    #[case(AppError::Timeout("sensor".to_string()), StatusCode::GATEWAY_TIMEOUT)]
    #[case(AppError::Configuration("key".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(
        AppError::CacheConsistency { provider: "MET forecast".to_string(), url: "https://x.test".to_string() },
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_status_mapping(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.into_response().status(), expected);
    }
}
