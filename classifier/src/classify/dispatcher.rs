use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    app_config::cfg,
    model::Record,
    observability::{Progress, ProgressStage, TrackFn},
    service::{ClassificationResult, EndpointRef},
};

use super::client::{ClassificationClient, ClassifyOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub batch_size: usize,
    /// Concurrent classify calls within one batch
    pub max_concurrency: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_concurrency: 1,
        }
    }
}

impl DispatchSettings {
    pub fn new(batch_size: usize, max_concurrency: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_env() -> Self {
        Self::new(cfg.dispatch.batch_size, cfg.dispatch.max_concurrency)
    }
}

/// Counts for one pass over a record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub submitted: usize,
    pub resolved: usize,
    pub no_class: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct BatchDispatcher {
    client: ClassificationClient,
    settings: DispatchSettings,
}

impl BatchDispatcher {
    pub fn new(client: ClassificationClient, settings: DispatchSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &ClassificationClient {
        &self.client
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Classify `texts` with bounded concurrency. Outcomes are in input order.
    pub async fn classify_texts(
        &self,
        texts: &[&str],
        endpoint: &EndpointRef,
        cancel: &CancellationToken,
    ) -> Vec<ClassifyOutcome> {
        stream::iter(texts.iter())
            .map(|text| self.client.classify(text, endpoint, cancel))
            .buffered(self.settings.max_concurrency)
            .collect()
            .await
    }

    /// Raw results for a single batch of texts; `None` where no result came back
    pub async fn classify_batch(
        &self,
        texts: &[&str],
        endpoint: &EndpointRef,
        cancel: &CancellationToken,
    ) -> Vec<Option<ClassificationResult>> {
        self.classify_texts(texts, endpoint, cancel)
            .await
            .into_iter()
            .map(ClassifyOutcome::into_result)
            .collect()
    }

    /// Submit every pending record, batch by batch, writing results into each
    /// record's own slot. Records that already have a response are skipped.
    pub async fn dispatch(
        &self,
        records: &mut [Record],
        endpoint: &EndpointRef,
        cancel: &CancellationToken,
        track: Option<&TrackFn>,
    ) -> DispatchStats {
        let batch_size = self.settings.batch_size;
        let total_batches = records.len().div_ceil(batch_size);
        let mut stats = DispatchStats::default();

        for (batch_num, batch) in records.chunks_mut(batch_size).enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    "Dispatch cancelled before batch {}/{}",
                    batch_num + 1,
                    total_batches
                );
                break;
            }

            let pending: Vec<usize> = batch
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_pending())
                .map(|(i, _)| i)
                .collect();

            if !pending.is_empty() {
                let texts: Vec<&str> = pending.iter().map(|&i| batch[i].text.as_str()).collect();
                let outcomes = self.classify_texts(&texts, endpoint, cancel).await;

                let batch_stats = apply_outcomes(batch, &pending, outcomes);
                stats.submitted += batch_stats.submitted;
                stats.resolved += batch_stats.resolved;
                stats.no_class += batch_stats.no_class;
                stats.failed += batch_stats.failed;

                if batch_stats.failed > 0 {
                    tracing::warn!(
                        "Batch {}/{}: {} of {} records left unresolved",
                        batch_num + 1,
                        total_batches,
                        batch_stats.failed,
                        batch_stats.submitted
                    );
                }
            }

            let progress = Progress {
                stage: ProgressStage::Dispatch,
                current: batch_num + 1,
                total: total_batches,
            };
            tracing::info!(
                "Batch progress: {} ({:.0}%)",
                progress.format_progress(),
                progress.percentage()
            );
            if let Some(track) = track {
                track(progress);
            }
        }

        stats
    }
}

fn apply_outcomes(
    batch: &mut [Record],
    pending: &[usize],
    outcomes: Vec<ClassifyOutcome>,
) -> DispatchStats {
    let mut stats = DispatchStats {
        submitted: pending.len(),
        ..Default::default()
    };

    for (&i, outcome) in pending.iter().zip(outcomes) {
        let record = &mut batch[i];
        match outcome.into_result() {
            Some(raw) => {
                record.apply(&raw);
                if record.is_resolved() {
                    stats.resolved += 1;
                } else {
                    stats.no_class += 1;
                }
            }
            None => stats.failed += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::client::RetryPolicy,
        rate_limiters::RateLimiters,
        testing::{MockService, Reply},
    };
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    fn dispatcher(
        service: Arc<MockService>,
        batch_size: usize,
        max_concurrency: usize,
    ) -> BatchDispatcher {
        let client = ClassificationClient::new(
            service,
            RateLimiters::new(10_000, 1_000, 10_000),
            RetryPolicy::new(3, Duration::from_millis(10)),
        );
        BatchDispatcher::new(client, DispatchSettings::new(batch_size, max_concurrency))
    }

    fn endpoint() -> EndpointRef {
        EndpointRef::new("arn:endpoint/a")
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_failure() {
        let service = Arc::new(MockService::new());
        service.script_classify("b", vec![Reply::ServiceError]);
        service.script_classify("d", vec![Reply::RateLimited; 3]);
        service.script_classify("e", vec![Reply::Empty]);

        let mut records = Record::from_texts(["a", "b", "c", "d", "e"]);
        let stats = dispatcher(service.clone(), 2, 2)
            .dispatch(&mut records, &endpoint(), &CancellationToken::new(), None)
            .await;

        assert_eq!(
            stats,
            DispatchStats {
                submitted: 5,
                resolved: 2,
                no_class: 1,
                failed: 2,
            }
        );
        let classes: Vec<_> = records.iter().map(|r| r.primary_class()).collect();
        assert_eq!(
            classes,
            vec![Some("class-a"), None, Some("class-c"), None, None]
        );
        assert!(records[1].is_pending());
        assert!(records[3].is_pending());
        assert!(!records[4].is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved_under_concurrency() {
        let service = Arc::new(MockService::new());
        // Early records are slow, later ones answer first
        service.script_classify("t0", vec![Reply::RateLimited, Reply::RateLimited]);
        service.script_classify("t1", vec![Reply::RateLimited]);

        let texts: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
        let mut records = Record::from_texts(texts.clone());

        dispatcher(service, 4, 4)
            .dispatch(&mut records, &endpoint(), &CancellationToken::new(), None)
            .await;

        assert_eq!(records.len(), 7);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.id, i);
            assert_eq!(record.primary_class(), Some(format!("class-t{i}").as_str()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_records_with_responses() {
        let service = Arc::new(MockService::new());
        let mut records = Record::from_texts(["a", "b", "c"]);
        records[1].apply(&ClassificationResult::default());

        let stats = dispatcher(service.clone(), 10, 1)
            .dispatch(&mut records, &endpoint(), &CancellationToken::new(), None)
            .await;

        assert_eq!(stats.submitted, 2);
        assert_eq!(service.classify_calls_for("b"), 0);
        assert_eq!(service.classify_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_progress_per_batch() {
        let service = Arc::new(MockService::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let track = {
            let seen = seen.clone();
            move |p: Progress| seen.lock().unwrap().push(p.format_progress())
        };

        let mut records = Record::from_texts(["a", "b", "c", "d", "e"]);
        dispatcher(service, 2, 1)
            .dispatch(&mut records, &endpoint(), &CancellationToken::new(), Some(&track))
            .await;

        assert_eq!(*seen.lock().unwrap(), vec!["1 / 3", "2 / 3", "3 / 3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classify_batch_aligns_results() {
        let service = Arc::new(MockService::new());
        service.script_classify("bad", vec![Reply::ServiceError]);

        let results = dispatcher(service, 10, 3)
            .classify_batch(&["ok", "bad", "fine"], &endpoint(), &CancellationToken::new())
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().classes[0].name, "class-ok");
        assert!(results[1].is_none());
        assert_eq!(results[2].as_ref().unwrap().classes[0].name, "class-fine");
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_leaves_records_pending() {
        let service = Arc::new(MockService::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut records = Record::from_texts(["a", "b"]);
        let stats = dispatcher(service.clone(), 1, 1)
            .dispatch(&mut records, &endpoint(), &cancel, None)
            .await;

        assert_eq!(stats, DispatchStats::default());
        assert_eq!(service.classify_calls(), 0);
        assert!(records.iter().all(Record::is_pending));
    }
}
