//! Capability interface to the remote classification service.
//!
//! Everything above this module talks to [`ClassifierService`]; the HTTP
//! transport in [`comprehend`] is one implementation, the scripted mock used in
//! tests is another.

pub mod comprehend;

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::derive::Display;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::error::{AppResult, ClassifyError};

pub use comprehend::ComprehendService;

pub type SharedService = Arc<dyn ClassifierService>;

/// Opaque endpoint handle (an ARN for the HTTP transport)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct EndpointRef(String);

impl EndpointRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EndpointStatus {
    Absent,
    Creating,
    InService,
    Updating,
    Deleting,
    Failed,
}

impl From<lib_comprehend::types::EndpointStatus> for EndpointStatus {
    fn from(status: lib_comprehend::types::EndpointStatus) -> Self {
        use lib_comprehend::types::EndpointStatus as Wire;
        match status {
            Wire::Creating => EndpointStatus::Creating,
            Wire::InService => EndpointStatus::InService,
            Wire::Updating => EndpointStatus::Updating,
            Wire::Deleting => EndpointStatus::Deleting,
            Wire::Failed => EndpointStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub name: String,
    /// In `[0, 1]`
    pub score: f64,
}

/// Ranked classes as returned by the service. Rank 0 is the primary class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classes: Vec<ClassScore>,
}

impl ClassificationResult {
    pub fn new(classes: Vec<ClassScore>) -> Self {
        Self { classes }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[async_trait]
pub trait ClassifierService: Send + Sync {
    async fn list_endpoints(&self) -> AppResult<Vec<EndpointRef>>;

    /// `EndpointStatus::Absent` when the service does not know the endpoint
    async fn describe_endpoint(&self, endpoint: &EndpointRef) -> AppResult<EndpointStatus>;

    async fn create_endpoint(
        &self,
        model_handle: &str,
        desired_capacity: u32,
    ) -> AppResult<EndpointRef>;

    async fn classify_document(
        &self,
        text: &str,
        endpoint: &EndpointRef,
    ) -> Result<ClassificationResult, ClassifyError>;
}
