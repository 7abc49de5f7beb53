use std::sync::Arc;
use tokio::time::Duration;

use leaky_bucket::RateLimiter;

use crate::app_config::cfg;

/// Request pacing shared by every classify call in a session.
#[derive(Clone)]
pub struct RateLimiters {
    requests: Arc<RateLimiter>,
}

impl RateLimiters {
    pub fn new(max_requests: usize, refill_interval_ms: usize, refill_amount: usize) -> Self {
        let requests = RateLimiter::builder()
            .initial(max_requests)
            .interval(Duration::from_millis(refill_interval_ms as u64))
            .max(max_requests)
            .refill(refill_amount)
            .build();

        Self {
            requests: Arc::new(requests),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            cfg.rate_limit.max_requests,
            cfg.rate_limit.refill_interval_ms,
            cfg.rate_limit.refill_amount,
        )
    }

    pub async fn acquire_one(&self) {
        self.requests.acquire_one().await;
    }

    pub fn get_status(&self) -> String {
        format!("requests: {}/{}", self.requests.balance(), self.requests.max())
    }
}
