use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use lib_comprehend::{types::Tag, ComprehendClient, ComprehendError};

use crate::{
    app_config::cfg,
    error::{AppResult, ClassifyError},
    HttpClient,
};

use super::{ClassScore, ClassificationResult, ClassifierService, EndpointRef, EndpointStatus};

/// [`ClassifierService`] backed by the JSON 1.1 HTTP API
pub struct ComprehendService {
    client: ComprehendClient,
    endpoint_name_prefix: String,
    tags: Vec<(String, String)>,
}

impl ComprehendService {
    pub fn new(
        client: ComprehendClient,
        endpoint_name_prefix: impl Into<String>,
        tags: Vec<(String, String)>,
    ) -> Self {
        Self {
            client,
            endpoint_name_prefix: endpoint_name_prefix.into(),
            tags,
        }
    }

    pub fn from_env(http_client: HttpClient) -> anyhow::Result<Self> {
        let client = ComprehendClient::new(http_client, &cfg.service.base_url)
            .context(format!("Invalid service base url: {}", cfg.service.base_url))?;
        let tags = cfg
            .endpoint
            .tags
            .iter()
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect();

        Ok(Self::new(client, cfg.endpoint.name_prefix.clone(), tags))
    }

    fn endpoint_name(&self) -> String {
        format!(
            "{}-{}",
            self.endpoint_name_prefix,
            Utc::now().format("%Y%m%d%H%M%S")
        )
    }
}

#[async_trait]
impl ClassifierService for ComprehendService {
    async fn list_endpoints(&self) -> AppResult<Vec<EndpointRef>> {
        let endpoints = self.client.list_endpoints().await?;
        Ok(endpoints
            .into_iter()
            .map(|e| EndpointRef::new(e.endpoint_arn))
            .collect())
    }

    async fn describe_endpoint(&self, endpoint: &EndpointRef) -> AppResult<EndpointStatus> {
        match self.client.describe_endpoint(endpoint.as_str()).await {
            Ok(props) => {
                if let Some(message) = props.message.as_deref() {
                    tracing::debug!("Endpoint {} message: {}", endpoint, message);
                }
                Ok(props.status.into())
            }
            Err(ComprehendError::NotFound(_)) => Ok(EndpointStatus::Absent),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_endpoint(
        &self,
        model_handle: &str,
        desired_capacity: u32,
    ) -> AppResult<EndpointRef> {
        let name = self.endpoint_name();
        let tags = self
            .tags
            .iter()
            .map(|(key, value)| Tag {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();

        tracing::info!(
            "Creating endpoint {} for model {} ({} inference units)",
            name,
            model_handle,
            desired_capacity
        );
        let arn = self
            .client
            .create_endpoint(&name, model_handle, desired_capacity, tags)
            .await?;

        Ok(EndpointRef::new(arn))
    }

    async fn classify_document(
        &self,
        text: &str,
        endpoint: &EndpointRef,
    ) -> Result<ClassificationResult, ClassifyError> {
        let resp = self.client.classify_document(text, endpoint.as_str()).await?;

        Ok(ClassificationResult::new(
            resp.classes
                .into_iter()
                .map(|c| ClassScore {
                    name: c.name,
                    score: c.score,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ComprehendService {
        let client = ComprehendClient::new(HttpClient::new(), "http://localhost:4566").unwrap();
        ComprehendService::new(client, "frontend-endpoint", vec![])
    }

    #[test]
    fn test_endpoint_name_has_timestamp_suffix() {
        let name = service().endpoint_name();
        let suffix = name.strip_prefix("frontend-endpoint-").unwrap();

        assert_eq!(suffix.len(), 14);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_wire_status_mapping() {
        use lib_comprehend::types::EndpointStatus as Wire;

        assert_eq!(EndpointStatus::from(Wire::InService), EndpointStatus::InService);
        assert_eq!(EndpointStatus::from(Wire::Creating), EndpointStatus::Creating);
        assert_eq!(EndpointStatus::from(Wire::Failed), EndpointStatus::Failed);
        assert_eq!(EndpointStatus::InService.to_string(), "in_service");
    }
}
