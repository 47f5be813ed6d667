//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sieve::{FetchError, PipelineError};

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// The source could not be loaded.
    Fetch(FetchError),
    /// The cleaning run failed.
    Pipeline(PipelineError),
    /// Internal server error.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_output: Option<String>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Fetch(_) => (StatusCode::BAD_REQUEST, "fetch_error"),
            ApiError::Pipeline(PipelineError::Config(_)) => {
                (StatusCode::BAD_REQUEST, "config_error")
            }
            ApiError::Pipeline(PipelineError::Rule(_)) => (StatusCode::BAD_REQUEST, "rule_error"),
            ApiError::Pipeline(PipelineError::Generation { .. }) => {
                (StatusCode::BAD_GATEWAY, "generation_error")
            }
            ApiError::Pipeline(PipelineError::Assembly(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "assembly_error")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let raw_output = match &self {
            ApiError::Pipeline(e) => e.raw_output().map(str::to_string),
            _ => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message: self.to_string(),
                raw_output,
            }),
        )
            .into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Fetch(err)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Fetch(e) => write!(f, "{}", e),
            ApiError::Pipeline(e) => write!(f, "{}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve::{AssemblyError, AssemblyFailure, GenerationError};

    #[test]
    fn test_status_mapping() {
        let generation = ApiError::from(PipelineError::Generation {
            batch: 1,
            total: 1,
            attempts: 1,
            source: GenerationError::EmptyResponse,
        });
        assert_eq!(generation.status_and_code().0, StatusCode::BAD_GATEWAY);

        let fetch = ApiError::from(FetchError::UnsupportedFormat("xlsx".into()));
        assert_eq!(fetch.status_and_code(), (StatusCode::BAD_REQUEST, "fetch_error"));
    }

    #[test]
    fn test_assembly_error_carries_raw_output() {
        let err = ApiError::from(PipelineError::from(AssemblyError {
            failure: AssemblyFailure::Malformed("no header line in output".into()),
            batch: None,
            line: None,
            raw_text: "Sorry, I cannot help.".into(),
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
