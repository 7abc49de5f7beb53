use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    app_config::cfg,
    error::{AppError, AppResult},
    service::{EndpointRef, EndpointStatus, SharedService},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    /// Inference units requested for a newly created endpoint
    pub desired_capacity: u32,
    pub poll_interval: Duration,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            desired_capacity: 10,
            poll_interval: Duration::from_secs(30),
        }
    }
}

impl EndpointSettings {
    pub fn new(desired_capacity: u32, poll_interval: Duration) -> Self {
        Self {
            desired_capacity,
            poll_interval,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            cfg.endpoint.desired_inference_units,
            Duration::from_secs(cfg.endpoint.poll_interval_secs),
        )
    }
}

/// Finds or provisions the endpoint a session classifies against.
///
/// Errors from the service are returned as-is; nothing here retries.
#[derive(Clone)]
pub struct EndpointManager {
    service: SharedService,
    settings: EndpointSettings,
}

impl EndpointManager {
    pub fn new(service: SharedService, settings: EndpointSettings) -> Self {
        Self { service, settings }
    }

    /// First listed endpoint that is already in service
    pub async fn find_active(&self) -> AppResult<Option<EndpointRef>> {
        let endpoints = self.service.list_endpoints().await?;
        tracing::debug!("Found {} existing endpoints", endpoints.len());

        for endpoint in endpoints {
            let status = self.service.describe_endpoint(&endpoint).await?;
            if status == EndpointStatus::InService {
                return Ok(Some(endpoint));
            }
            tracing::debug!("Skipping endpoint {} ({})", endpoint, status);
        }

        Ok(None)
    }

    pub async fn ensure_endpoint(
        &self,
        model_handle: &str,
        cancel: &CancellationToken,
    ) -> AppResult<EndpointRef> {
        if let Some(endpoint) = self.find_active().await? {
            tracing::info!("Using existing endpoint {}", endpoint);
            return Ok(endpoint);
        }

        tracing::info!(
            "No endpoint in service, creating one for {} with {} inference units",
            model_handle,
            self.settings.desired_capacity
        );
        let endpoint = self
            .service
            .create_endpoint(model_handle, self.settings.desired_capacity)
            .await?;

        self.wait_until_ready(&endpoint, cancel).await?;
        Ok(endpoint)
    }

    /// Poll while the endpoint is `creating`. Any status other than
    /// `in_service` ends the wait with [`AppError::EndpointUnavailable`].
    pub async fn wait_until_ready(
        &self,
        endpoint: &EndpointRef,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let start = std::time::Instant::now();

        loop {
            let status = self.service.describe_endpoint(endpoint).await?;
            tracing::debug!("Endpoint {} status: {}", endpoint, status);

            match status {
                EndpointStatus::InService => {
                    tracing::info!(
                        "Endpoint {} in service after {:?}",
                        endpoint,
                        start.elapsed()
                    );
                    return Ok(());
                }
                EndpointStatus::Creating => {
                    tracing::info!(
                        "Endpoint {} is still being created, checking again in {:?}",
                        endpoint,
                        self.settings.poll_interval
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(AppError::Cancelled),
                        _ = tokio::time::sleep(self.settings.poll_interval) => {}
                    }
                }
                other => {
                    tracing::error!("Endpoint {} is unusable: {}", endpoint, other);
                    return Err(AppError::EndpointUnavailable {
                        endpoint: endpoint.to_string(),
                        status: other.to_string(),
                    });
                }
            }
        }
    }
}
