use crate::modules::ingestion::{Ingestion, IngestionOutcome};
use std::{sync::Arc, time::Duration};
use tokio::time::{self, MissedTickBehavior};

/// Runs an ingestion pass right away and then once every `period`. Never returns.
pub async fn run_periodically(ingestion: Arc<Ingestion>, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        match ingestion.run().await {
            IngestionOutcome::Completed { fetched, ingested } => {
                tracing::info!(
                    "scheduled ingestion finished: {} fetched, {} saved",
                    fetched,
                    ingested
                );
            }
            IngestionOutcome::Skipped => {
                tracing::info!("scheduled ingestion skipped, previous pass still running");
            }
        }
    }
}
