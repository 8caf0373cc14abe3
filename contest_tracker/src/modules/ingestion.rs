use crate::modules::{
    clock::Clock,
    providers::{fetch_or_empty, ContestProvider},
    reconciler::Reconciler,
};
use contest_tracker_libs::{
    contest::{Contest, ContestDraft},
    page::ContestReader,
    store::ContestStore,
};
use futures::future::join_all;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionOutcome {
    Completed { fetched: usize, ingested: usize },
    /// Another pass was still running.
    Skipped,
}

/// One ingestion pass: fetch from every provider, normalize, save, invalidate cached pages.
pub struct Ingestion {
    providers: Vec<Arc<dyn ContestProvider>>,
    reconciler: Reconciler,
    reader: Arc<ContestReader>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    running: Mutex<()>,
}

impl Ingestion {
    pub fn new(
        providers: Vec<Arc<dyn ContestProvider>>,
        store: Arc<dyn ContestStore>,
        reader: Arc<ContestReader>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            reconciler: Reconciler::new(store),
            reader,
            clock,
            timeout,
            running: Mutex::new(()),
        }
    }

    pub async fn run(&self) -> IngestionOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::info!("ingestion is already running, skipped");
            return IngestionOutcome::Skipped;
        };
        tracing::info!("Start to ingest contests from {} providers.", self.providers.len());

        let drafts = self.fetch_all().await;
        let fetched = drafts.len();

        let now = self.clock.now();
        let contests: Vec<Contest> = drafts
            .into_iter()
            .filter_map(|draft| match draft.normalize(now) {
                Ok(contest) => Some(contest),
                Err(e) => {
                    tracing::warn!("skip contest that could not be normalized: {}", e);
                    None
                }
            })
            .collect();

        let ingested = self.reconciler.reconcile(&contests).await;
        self.reader.invalidate().await;

        tracing::info!(
            "Ingestion finished: {} fetched, {} saved.",
            fetched,
            ingested
        );
        IngestionOutcome::Completed { fetched, ingested }
    }

    async fn fetch_all(&self) -> Vec<ContestDraft> {
        let tasks = self.providers.iter().map(|provider| {
            let provider = provider.clone();
            let timeout = self.timeout;
            tokio::spawn(async move { fetch_or_empty(provider.as_ref(), timeout).await })
        });

        join_all(tasks)
            .await
            .into_iter()
            .flat_map(|result| match result {
                Ok(drafts) => drafts,
                Err(e) => {
                    tracing::error!("provider task failed: {}", e);
                    Vec::new()
                }
            })
            .collect()
    }
}
