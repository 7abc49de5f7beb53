use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    app_config::cfg,
    model::Record,
    observability::{Progress, ProgressStage, TrackFn},
    service::EndpointRef,
};

use super::dispatcher::BatchDispatcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub max_iterations: u32,
    /// Wait before iteration `n` (n >= 1) is `initial_backoff * 2^n`
    pub initial_backoff: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl ReconcileSettings {
    pub fn new(max_iterations: u32, initial_backoff: Duration) -> Self {
        Self {
            max_iterations,
            initial_backoff,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            cfg.retry.max_reconcile_iterations,
            Duration::from_millis(cfg.retry.initial_backoff_ms),
        )
    }

    pub fn wait_before(&self, iteration: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(iteration))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// Every record has a response
    Complete,
    /// Iteration ceiling hit with records still pending
    Exhausted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub status: ReconcileStatus,
    pub iterations: u32,
    pub unresolved: usize,
}

/// Re-submits pending records until none remain or the iteration ceiling is hit
pub struct Reconciler {
    dispatcher: BatchDispatcher,
    settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(dispatcher: BatchDispatcher, settings: ReconcileSettings) -> Self {
        Self {
            dispatcher,
            settings,
        }
    }

    pub async fn run(
        &self,
        records: &mut [Record],
        endpoint: &EndpointRef,
        cancel: &CancellationToken,
        track: Option<&TrackFn>,
    ) -> ReconcileReport {
        let max_iterations = self.settings.max_iterations;
        let mut iteration = 0;

        loop {
            let pending = records.iter().filter(|r| r.is_pending()).count();
            let report = |status| ReconcileReport {
                status,
                iterations: iteration,
                unresolved: pending,
            };

            if pending == 0 {
                tracing::info!("All rows have been successfully predicted");
                return report(ReconcileStatus::Complete);
            }

            if iteration >= max_iterations {
                tracing::warn!(
                    "{} rows still unresolved after {} reconciliation attempts",
                    pending,
                    iteration
                );
                return report(ReconcileStatus::Exhausted);
            }

            if iteration > 0 {
                let wait = self.settings.wait_before(iteration);
                tracing::debug!("Waiting {:?} before next reconciliation attempt", wait);
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(wait) => {}
                }
            }

            if cancel.is_cancelled() {
                tracing::info!("Reconciliation cancelled with {} rows unresolved", pending);
                return report(ReconcileStatus::Cancelled);
            }

            iteration += 1;
            tracing::info!(
                "Attempting to predict {} missing entries, attempt {}/{}",
                pending,
                iteration,
                max_iterations
            );

            let stats = self
                .dispatcher
                .dispatch(records, endpoint, cancel, None)
                .await;
            tracing::debug!("Reconciliation attempt {}: {:?}", iteration, stats);

            if let Some(track) = track {
                track(Progress {
                    stage: ProgressStage::Reconcile,
                    current: iteration as usize,
                    total: max_iterations as usize,
                });
            }
        }
    }
}
