use derive_more::derive::Display;
use lib_comprehend::ComprehendError;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Display)]
pub enum AppError {
    #[display("Endpoint {endpoint} is unavailable (status: {status})")]
    EndpointUnavailable { endpoint: String, status: String },
    #[display("Endpoint is not ready")]
    EndpointNotReady,
    #[display("Service error: {_0}")]
    Service(String),
    #[display("Too many requests")]
    TooManyRequests,
    #[display("Operation cancelled")]
    Cancelled,
    #[display("Internal error: {_0}")]
    Internal(anyhow::Error),
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<ComprehendError> for AppError {
    fn from(error: ComprehendError) -> Self {
        match error {
            ComprehendError::RequestFailed(e) => {
                tracing::error!("Reqwest error: {:?}", e);
                AppError::Internal(e.into())
            }
            ComprehendError::RateLimited(_) => AppError::TooManyRequests,
            other => AppError::Service(other.to_string()),
        }
    }
}

/// Failure of a single classify call. The variant decides whether the call is retried.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service error: {0}")]
    Service(String),
}

impl ClassifyError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassifyError::RateLimited(_))
    }
}

impl From<ComprehendError> for ClassifyError {
    fn from(error: ComprehendError) -> Self {
        if error.is_rate_limited() {
            ClassifyError::RateLimited(error.to_string())
        } else {
            ClassifyError::Service(error.to_string())
        }
    }
}
