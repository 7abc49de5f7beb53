use thiserror::Error;

use crate::types::ApiErrorBody;

/// Structured error reported by the classification service
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: u16,
    pub error_type: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref error_type) = self.error_type {
            write!(f, " [type: {}]", error_type)?;
        }
        write!(f, " (HTTP {})", self.status)
    }
}

#[derive(Debug, Error)]
pub enum ComprehendError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limited: {0}")]
    RateLimited(ApiError),

    #[error("Resource not found: {0}")]
    NotFound(ApiError),

    #[error("Invalid request: {0}")]
    InvalidRequest(ApiError),

    #[error("Server error: {0}")]
    ServerError(ApiError),

    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ComprehendError {
    /// Classify a non-2xx response by error shape first, then by HTTP status.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
        let shape = parsed.as_ref().and_then(|b| b.shape()).map(str::to_string);
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| body.to_string());

        let error = ApiError {
            status,
            error_type: shape.clone(),
            message,
        };

        match (shape.as_deref(), status) {
            (Some("TooManyRequestsException" | "ThrottlingException"), _) | (_, 429) => {
                ComprehendError::RateLimited(error)
            }
            (Some("ResourceNotFoundException"), _) | (_, 404) => ComprehendError::NotFound(error),
            (_, 500..=599) => ComprehendError::ServerError(error),
            (_, 400) => ComprehendError::InvalidRequest(error),
            _ => ComprehendError::Api(error),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ComprehendError::RateLimited(_))
    }
}
