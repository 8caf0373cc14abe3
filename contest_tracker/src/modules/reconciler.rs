use contest_tracker_libs::{contest::Contest, store::ContestStore};
use futures::{future, stream, StreamExt};
use std::sync::Arc;

const MAX_IN_FLIGHT: usize = 8;

/// Writes normalized contests into the store, one upsert per record.
pub struct Reconciler {
    store: Arc<dyn ContestStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ContestStore>) -> Self {
        Self { store }
    }

    /// Returns the number of records written. Failed records are logged and skipped.
    pub async fn reconcile(&self, contests: &[Contest]) -> usize {
        tracing::info!("Start to save {} contests.", contests.len());

        let writes: Vec<_> = contests.iter().map(|contest| self.write(contest)).collect();
        let written = stream::iter(writes)
            .buffer_unordered(MAX_IN_FLIGHT)
            .filter(|written| future::ready(*written))
            .count()
            .await;

        tracing::info!(
            "{} of {} contests successfully saved.",
            written,
            contests.len()
        );
        written
    }

    async fn write(&self, contest: &Contest) -> bool {
        if let Err(e) = contest.validate() {
            tracing::warn!("skip invalid contest: {}", e);
            return false;
        }

        match self.store.upsert(contest).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("failed to save contest {}: {:?}", contest.contest_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use contest_tracker_libs::{
        contest::{ContestStatus, Platform},
        memory::InMemoryContestStore,
        store::{self, SolutionUpdate, StoreError},
    };

    /// Rejects writes of a single contest id.
    struct RejectingStore {
        inner: InMemoryContestStore,
        rejected_id: &'static str,
    }

    #[async_trait]
    impl ContestStore for RejectingStore {
        async fn ping(&self) -> store::Result<()> {
            self.inner.ping().await
        }
        async fn upsert(&self, contest: &Contest) -> store::Result<()> {
            if contest.contest_id == self.rejected_id {
                return Err(StoreError::UnexpectedError(String::from("write rejected")));
            }
            self.inner.upsert(contest).await
        }
        async fn find(&self, contest_id: &str) -> store::Result<Option<Contest>> {
            self.inner.find(contest_id).await
        }
        async fn find_page(&self, offset: u32, limit: u32) -> store::Result<Vec<Contest>> {
            self.inner.find_page(offset, limit).await
        }
        async fn count(&self) -> store::Result<u64> {
            self.inner.count().await
        }
        async fn find_unsolved(&self) -> store::Result<Vec<Contest>> {
            self.inner.find_unsolved().await
        }
        async fn set_solution(&self, contest_id: &str, url: &str) -> store::Result<Option<Contest>> {
            self.inner.set_solution(contest_id, url).await
        }
        async fn set_solutions(&self, updates: &[SolutionUpdate]) -> store::Result<Vec<String>> {
            self.inner.set_solutions(updates).await
        }
    }

    fn contest(id: u32, name: &str) -> Contest {
        let start_time = Utc.with_ymd_and_hms(2024, 2, 1, 14, 35, 0).unwrap();
        Contest {
            contest_id: format!("cf_{}", id),
            name: name.to_string(),
            platform: Platform::Codeforces,
            url: format!("https://codeforces.com/contest/{}", id),
            start_time,
            end_time: start_time + Duration::seconds(7200),
            duration: 7200,
            status: ContestStatus::Completed,
            youtube_video: None,
        }
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let store = Arc::new(InMemoryContestStore::new());
        let reconciler = Reconciler::new(store.clone());
        let batch: Vec<Contest> = (1..=20).map(|i| contest(i, "Round")).collect();

        assert_eq!(reconciler.reconcile(&batch).await, 20);
        let once = store.snapshot();
        assert_eq!(reconciler.reconcile(&batch).await, 20);

        assert_eq!(store.snapshot(), once);
    }

    #[tokio::test]
    async fn solution_video_survives_reingestion() {
        let store = Arc::new(InMemoryContestStore::new());
        let reconciler = Reconciler::new(store.clone());
        reconciler.reconcile(&[contest(1, "Round 1")]).await;
        store
            .set_solution("cf_1", "https://www.youtube.com/watch?v=abc")
            .await
            .unwrap();

        let mut changed = contest(1, "Round 1 (Div. 2)");
        changed.status = ContestStatus::Ongoing;
        reconciler.reconcile(&[changed]).await;

        let stored = store.find("cf_1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Round 1 (Div. 2)");
        assert_eq!(stored.status, ContestStatus::Ongoing);
        assert_eq!(
            stored.youtube_video.as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[tokio::test]
    async fn invalid_records_are_skipped() {
        let store = Arc::new(InMemoryContestStore::new());
        let reconciler = Reconciler::new(store.clone());

        let mut inconsistent = contest(2, "Round 2");
        inconsistent.duration = 60;
        let mut misplaced = contest(3, "Round 3");
        misplaced.platform = Platform::Leetcode;

        let written = reconciler
            .reconcile(&[contest(1, "Round 1"), inconsistent, misplaced])
            .await;

        assert_eq!(written, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_writes_are_not_counted() {
        let store = Arc::new(RejectingStore {
            inner: InMemoryContestStore::new(),
            rejected_id: "cf_2",
        });
        let reconciler = Reconciler::new(store.clone());
        let batch: Vec<Contest> = (1..=3).map(|i| contest(i, "Round")).collect();

        assert_eq!(reconciler.reconcile(&batch).await, 2);
        assert_eq!(store.count().await.unwrap(), 2);
        assert!(store.find("cf_1").await.unwrap().is_some());
        assert!(store.find("cf_2").await.unwrap().is_none());
        assert!(store.find("cf_3").await.unwrap().is_some());
    }
}
