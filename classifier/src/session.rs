//! Session state for one classification run.
//!
//! A [`ClassificationSession`] owns the endpoint it resolved, the shared rate
//! limiter and the cancellation token every wait in the run listens to.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::{
    classify::{
        assemble, AssembledResult, BatchDispatcher, ClassificationClient, ClassifyOutcome,
        DispatchSettings, DispatchStats, ReconcileReport, ReconcileSettings, Reconciler,
        RetryPolicy,
    },
    endpoint::{EndpointManager, EndpointSettings},
    error::{AppError, AppResult},
    model::{
        summary::{class_counts, ClassSummary},
        Record,
    },
    observability::{format_elapsed_secs, TrackFn},
    rate_limiters::RateLimiters,
    service::{ClassificationResult, EndpointRef, SharedService},
};

#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub endpoint: EndpointSettings,
    pub retry: RetryPolicy,
    pub dispatch: DispatchSettings,
    pub reconcile: ReconcileSettings,
}

impl SessionSettings {
    pub fn from_env() -> Self {
        Self {
            endpoint: EndpointSettings::from_env(),
            retry: RetryPolicy::from_env(),
            dispatch: DispatchSettings::from_env(),
            reconcile: ReconcileSettings::from_env(),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// Same length and order as the input
    pub records: Vec<Record>,
    pub dispatch: DispatchStats,
    pub reconcile: ReconcileReport,
    pub summary: ClassSummary,
}

pub struct ClassificationSession {
    manager: EndpointManager,
    dispatcher: BatchDispatcher,
    reconciler: Reconciler,
    endpoint: Option<EndpointRef>,
    cancel: CancellationToken,
}

impl ClassificationSession {
    pub fn new(
        service: SharedService,
        rate_limiters: RateLimiters,
        settings: SessionSettings,
        cancel: CancellationToken,
    ) -> Self {
        let client = ClassificationClient::new(service.clone(), rate_limiters, settings.retry);
        let dispatcher = BatchDispatcher::new(client, settings.dispatch);

        Self {
            manager: EndpointManager::new(service, settings.endpoint),
            reconciler: Reconciler::new(dispatcher.clone(), settings.reconcile),
            dispatcher,
            endpoint: None,
            cancel,
        }
    }

    pub fn from_env(service: SharedService, cancel: CancellationToken) -> Self {
        Self::new(
            service,
            RateLimiters::from_env(),
            SessionSettings::from_env(),
            cancel,
        )
    }

    pub fn endpoint(&self) -> Option<&EndpointRef> {
        self.endpoint.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Resolve the session endpoint. A previously resolved endpoint is checked
    /// again and dropped from the session if it is no longer in service.
    pub async fn ensure_endpoint(&mut self, model_handle: &str) -> AppResult<EndpointRef> {
        if let Some(endpoint) = self.endpoint.clone() {
            return match self.manager.wait_until_ready(&endpoint, &self.cancel).await {
                Ok(()) => Ok(endpoint),
                Err(e) => {
                    self.endpoint = None;
                    Err(e)
                }
            };
        }

        let endpoint = self
            .manager
            .ensure_endpoint(model_handle, &self.cancel)
            .await?;
        self.endpoint = Some(endpoint.clone());
        Ok(endpoint)
    }

    pub async fn classify_batch(
        &self,
        texts: &[&str],
        endpoint: &EndpointRef,
    ) -> Vec<Option<ClassificationResult>> {
        self.dispatcher
            .classify_batch(texts, endpoint, &self.cancel)
            .await
    }

    pub async fn reconcile_all(
        &self,
        mut records: Vec<Record>,
        endpoint: &EndpointRef,
    ) -> Vec<Record> {
        let report = self
            .reconciler
            .run(&mut records, endpoint, &self.cancel, None)
            .await;
        tracing::debug!("Reconciliation finished: {:?}", report);
        records
    }

    /// Classify one free-text input against the ready endpoint
    pub async fn classify_single(&self, text: &str) -> AppResult<Option<AssembledResult>> {
        let endpoint = self.endpoint.as_ref().ok_or(AppError::EndpointNotReady)?;

        match self
            .dispatcher
            .client()
            .classify(text, endpoint, &self.cancel)
            .await
        {
            ClassifyOutcome::Classified(raw) => Ok(assemble(&raw)),
            ClassifyOutcome::RateLimited { .. } => Err(AppError::TooManyRequests),
            ClassifyOutcome::Fatal(message) => Err(AppError::Service(message)),
            ClassifyOutcome::Cancelled => Err(AppError::Cancelled),
        }
    }

    /// Ensure an endpoint, dispatch every record, then reconcile the gaps.
    ///
    /// Only endpoint errors fail the run. Records that never got a response
    /// come back pending.
    pub async fn run(
        &mut self,
        model_handle: &str,
        mut records: Vec<Record>,
        track: Option<&TrackFn>,
    ) -> AppResult<RunReport> {
        let start = Instant::now();
        let endpoint = self.ensure_endpoint(model_handle).await?;

        tracing::info!(
            "Classifying {} records against {} ({} per batch)",
            records.len(),
            endpoint,
            self.dispatcher.settings().batch_size
        );
        let dispatch = self
            .dispatcher
            .dispatch(&mut records, &endpoint, &self.cancel, track)
            .await;
        tracing::info!("Initial pass: {:?}", dispatch);

        let reconcile = self
            .reconciler
            .run(&mut records, &endpoint, &self.cancel, track)
            .await;

        let summary = class_counts(&records);
        tracing::info!(
            "Run finished in {}: {} resolved, {} without class, {} unresolved\n{}",
            format_elapsed_secs(start.elapsed().as_secs()),
            summary.resolved(),
            summary.no_class,
            summary.unresolved,
            summary.to_table()
        );

        Ok(RunReport {
            records,
            dispatch,
            reconcile,
            summary,
        })
    }
}
