use thiserror::Error;

/// API-specific errors for lium-api
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Core domain error: {0}")]
    Core(#[from] lium_core::LiumError),

    #[error(transparent)]
    Utils(#[from] lium_utils::UtilsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Operation(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http(HttpError::NotFound(_)))
    }
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid API key")]
    AuthenticationFailed,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl HttpError {
    /// Transport failures, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::RateLimited | HttpError::ServerError(_) | HttpError::Timeout => true,
            HttpError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
