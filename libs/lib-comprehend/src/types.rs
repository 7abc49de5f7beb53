//! Wire types for the document classification JSON 1.1 protocol.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointStatus {
    Creating,
    Deleting,
    Failed,
    InService,
    Updating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointProperties {
    pub endpoint_arn: String,
    pub status: EndpointStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_arn: Option<String>,
    #[serde(default)]
    pub desired_inference_units: Option<u32>,
    #[serde(default)]
    pub current_inference_units: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEndpointsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEndpointsResponse {
    #[serde(default)]
    pub endpoint_properties_list: Vec<EndpointProperties>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeEndpointRequest {
    pub endpoint_arn: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeEndpointResponse {
    pub endpoint_properties: EndpointProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointRequest {
    pub endpoint_name: String,
    pub model_arn: String,
    pub desired_inference_units: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointResponse {
    pub endpoint_arn: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassifyDocumentRequest {
    pub text: String,
    pub endpoint_arn: String,
}

/// A single ranked class. Score is in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentClass {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassifyDocumentResponse {
    #[serde(default)]
    pub classes: Vec<DocumentClass>,
}

/// Error body returned alongside non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Error shape name without the namespace prefix, e.g.
    /// `com.amazonaws.comprehend#TooManyRequestsException` -> `TooManyRequestsException`.
    pub fn shape(&self) -> Option<&str> {
        self.error_type
            .as_deref()
            .map(|t| t.rsplit('#').next().unwrap_or(t))
    }
}
