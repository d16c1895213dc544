use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Failed to extract article: {0}")]
    Extraction(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Could not reach upstream: {0}")]
    Connection(String),

    #[error("LLM provider error: {0}")]
    Upstream(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Translate a reqwest error raised while fetching article content
    /// or images. Timeouts and connection failures keep their own
    /// variants so the route layer can answer 408/503.
    pub fn from_fetch(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_connect() {
            AppError::Connection(err.to_string())
        } else {
            AppError::Extraction(err.to_string())
        }
    }

    /// Same translation for errors raised while talking to the LLM
    /// provider; generic failures there are provider failures.
    pub fn from_llm(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_connect() {
            AppError::Connection(err.to_string())
        } else {
            AppError::Upstream(err.to_string())
        }
    }

    /// Whether a retry can plausibly help. Validation, extraction and
    /// rendering failures are deterministic and never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_) | AppError::Connection(_) | AppError::Upstream(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Extraction(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
