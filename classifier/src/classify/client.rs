use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    app_config::cfg,
    error::ClassifyError,
    rate_limiters::RateLimiters,
    service::{ClassificationResult, EndpointRef, SharedService},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed while the service keeps rate limiting
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            cfg.retry.max_retries,
            Duration::from_millis(cfg.retry.initial_backoff_ms),
        )
    }

    /// `initial_backoff * 2^attempt`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyOutcome {
    Classified(ClassificationResult),
    /// Still rate limited after every allowed attempt
    RateLimited { attempts: u32 },
    Fatal(String),
    Cancelled,
}

impl ClassifyOutcome {
    /// Callers only care whether a result came back
    pub fn into_result(self) -> Option<ClassificationResult> {
        match self {
            ClassifyOutcome::Classified(result) => Some(result),
            _ => None,
        }
    }
}

/// Submits single texts to an endpoint, backing off while rate limited
#[derive(Clone)]
pub struct ClassificationClient {
    service: SharedService,
    rate_limiters: RateLimiters,
    policy: RetryPolicy,
}

impl ClassificationClient {
    pub fn new(service: SharedService, rate_limiters: RateLimiters, policy: RetryPolicy) -> Self {
        Self {
            service,
            rate_limiters,
            policy,
        }
    }

    pub async fn classify(
        &self,
        text: &str,
        endpoint: &EndpointRef,
        cancel: &CancellationToken,
    ) -> ClassifyOutcome {
        let max_retries = self.policy.max_retries;
        let mut attempt = 0;

        while attempt < max_retries {
            if cancel.is_cancelled() {
                return ClassifyOutcome::Cancelled;
            }

            tokio::select! {
                _ = cancel.cancelled() => return ClassifyOutcome::Cancelled,
                _ = self.rate_limiters.acquire_one() => {}
            }

            match self.service.classify_document(text, endpoint).await {
                Ok(result) => return ClassifyOutcome::Classified(result),
                Err(ClassifyError::RateLimited(message)) => {
                    let backoff = self.policy.backoff_for(attempt);
                    attempt += 1;

                    if attempt >= max_retries {
                        tracing::debug!("Last attempt rate limited: {}", message);
                        break;
                    }

                    tracing::info!(
                        "[Retry {}/{}] Rate limit exceeded, retrying in {:?} ({})",
                        attempt,
                        max_retries,
                        backoff,
                        self.rate_limiters.get_status()
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return ClassifyOutcome::Cancelled,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(ClassifyError::Service(message)) => {
                    tracing::warn!("Error during document classification: {}", message);
                    return ClassifyOutcome::Fatal(message);
                }
            }
        }

        tracing::warn!(
            "Max retries ({}) reached, record left unclassified",
            max_retries
        );
        ClassifyOutcome::RateLimited { attempts: attempt }
    }
}
