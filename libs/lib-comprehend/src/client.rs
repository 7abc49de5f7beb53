use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    error::ComprehendError,
    types::{
        ClassifyDocumentRequest, ClassifyDocumentResponse, CreateEndpointRequest,
        CreateEndpointResponse, DescribeEndpointRequest, DescribeEndpointResponse,
        EndpointProperties, ListEndpointsRequest, ListEndpointsResponse, Tag,
    },
};

const TARGET_PREFIX: &str = "Comprehend_20171127";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Thin client for the document classification JSON 1.1 API.
///
/// Requests are sent unsigned to `base_url`; signing is expected to happen in
/// a proxy in front of the service.
#[derive(Debug, Clone)]
pub struct ComprehendClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ComprehendClient {
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    async fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, ComprehendError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let resp = self
            .http_client
            .post(self.base_url.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp.text().await.unwrap_or_default();
            let err = ComprehendError::from_response(status.as_u16(), &error_body);
            tracing::debug!("{} failed: {}", operation, err);
            return Err(err);
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// List all endpoints, following pagination tokens
    pub async fn list_endpoints(&self) -> Result<Vec<EndpointProperties>, ComprehendError> {
        let mut endpoints = Vec::new();
        let mut request = ListEndpointsRequest::default();

        loop {
            let page: ListEndpointsResponse = self.call("ListEndpoints", &request).await?;
            endpoints.extend(page.endpoint_properties_list);

            match page.next_token {
                Some(token) if !token.is_empty() => request.next_token = Some(token),
                _ => break,
            }
        }

        Ok(endpoints)
    }

    pub async fn describe_endpoint(
        &self,
        endpoint_arn: &str,
    ) -> Result<EndpointProperties, ComprehendError> {
        let resp: DescribeEndpointResponse = self
            .call(
                "DescribeEndpoint",
                &DescribeEndpointRequest {
                    endpoint_arn: endpoint_arn.to_string(),
                },
            )
            .await?;

        Ok(resp.endpoint_properties)
    }

    /// Request a new endpoint. Returns its ARN; the endpoint starts out `CREATING`.
    pub async fn create_endpoint(
        &self,
        endpoint_name: &str,
        model_arn: &str,
        desired_inference_units: u32,
        tags: Vec<Tag>,
    ) -> Result<String, ComprehendError> {
        let resp: CreateEndpointResponse = self
            .call(
                "CreateEndpoint",
                &CreateEndpointRequest {
                    endpoint_name: endpoint_name.to_string(),
                    model_arn: model_arn.to_string(),
                    desired_inference_units,
                    tags,
                },
            )
            .await?;

        Ok(resp.endpoint_arn)
    }

    pub async fn classify_document(
        &self,
        text: &str,
        endpoint_arn: &str,
    ) -> Result<ClassifyDocumentResponse, ComprehendError> {
        self.call(
            "ClassifyDocument",
            &ClassifyDocumentRequest {
                text: text.to_string(),
                endpoint_arn: endpoint_arn.to_string(),
            },
        )
        .await
    }
}
