use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::{
    error::{AppResult, ClassifyError},
    service::{ClassScore, ClassificationResult, ClassifierService, EndpointRef, EndpointStatus},
};

/// Scripted reply to a classify call
#[derive(Debug, Clone)]
pub enum Reply {
    Classes(Vec<(String, f64)>),
    Empty,
    RateLimited,
    ServiceError,
}

impl Reply {
    pub fn classes(classes: &[(&str, f64)]) -> Self {
        Reply::Classes(
            classes
                .iter()
                .map(|(name, score)| (name.to_string(), *score))
                .collect(),
        )
    }
}

/// In-memory [`ClassifierService`] with scripted endpoint statuses and replies.
///
/// Status queues are consumed one value per describe call; the last value sticks.
/// Texts without a script (or with an exhausted one) classify as `class-{text}`.
#[derive(Default)]
pub struct MockService {
    endpoints: Mutex<Vec<EndpointRef>>,
    statuses: Mutex<HashMap<EndpointRef, VecDeque<EndpointStatus>>>,
    created_statuses: Mutex<VecDeque<EndpointStatus>>,
    fail_listing: AtomicBool,
    create_calls: Mutex<Vec<(String, u32)>>,
    describe_calls: AtomicUsize,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    classify_calls: Mutex<Vec<String>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(self, handle: &str, statuses: Vec<EndpointStatus>) -> Self {
        let endpoint = EndpointRef::new(handle);
        self.endpoints.lock().unwrap().push(endpoint.clone());
        self.statuses
            .lock()
            .unwrap()
            .insert(endpoint, statuses.into());
        self
    }

    /// Statuses reported for the endpoint created by the next `create_endpoint`
    pub fn on_create(self, statuses: Vec<EndpointStatus>) -> Self {
        *self.created_statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn fail_listing(self) -> Self {
        self.fail_listing.store(true, Ordering::SeqCst);
        self
    }

    pub fn script_classify(&self, text: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(text.to_string(), replies.into());
    }

    pub fn create_calls(&self) -> Vec<(String, u32)> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.lock().unwrap().len()
    }

    pub fn classify_calls_for(&self, text: &str) -> usize {
        self.classify_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.as_str() == text)
            .count()
    }
}

#[async_trait]
impl ClassifierService for MockService {
    async fn list_endpoints(&self) -> AppResult<Vec<EndpointRef>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(anyhow!("Error listing endpoints: connection reset").into());
        }
        Ok(self.endpoints.lock().unwrap().clone())
    }

    async fn describe_endpoint(&self, endpoint: &EndpointRef) -> AppResult<EndpointStatus> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);

        let mut statuses = self.statuses.lock().unwrap();
        let Some(queue) = statuses.get_mut(endpoint) else {
            return Ok(EndpointStatus::Absent);
        };
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        };

        Ok(status.unwrap_or(EndpointStatus::Absent))
    }

    async fn create_endpoint(
        &self,
        model_handle: &str,
        desired_capacity: u32,
    ) -> AppResult<EndpointRef> {
        let mut calls = self.create_calls.lock().unwrap();
        calls.push((model_handle.to_string(), desired_capacity));

        let endpoint = EndpointRef::new(format!("arn:endpoint/created-{}", calls.len()));
        let statuses = std::mem::take(&mut *self.created_statuses.lock().unwrap());
        self.statuses
            .lock()
            .unwrap()
            .insert(endpoint.clone(), statuses);
        self.endpoints.lock().unwrap().push(endpoint.clone());

        Ok(endpoint)
    }

    async fn classify_document(
        &self,
        text: &str,
        _endpoint: &EndpointRef,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.classify_calls.lock().unwrap().push(text.to_string());

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(text)
            .and_then(|replies| replies.pop_front())
            .unwrap_or_else(|| {
                let name = format!("class-{text}");
                Reply::classes(&[(name.as_str(), 0.9), ("other", 0.1)])
            });

        match reply {
            Reply::Classes(classes) => Ok(ClassificationResult::new(
                classes
                    .into_iter()
                    .map(|(name, score)| ClassScore { name, score })
                    .collect(),
            )),
            Reply::Empty => Ok(ClassificationResult::default()),
            Reply::RateLimited => Err(ClassifyError::RateLimited(
                "TooManyRequestsException".to_string(),
            )),
            Reply::ServiceError => Err(ClassifyError::Service(
                "InvalidRequestException".to_string(),
            )),
        }
    }
}
