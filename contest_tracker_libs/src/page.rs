use crate::{
    cache::PageCache,
    contest::Contest,
    store::{self, ContestStore},
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

pub const PAGE_KEY_NAMESPACE: &str = "contests";
pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const DEFAULT_CACHE_EXPIRY: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestPage {
    pub contests: Vec<Contest>,
    pub has_more: bool,
}

pub fn page_key(offset: u32, limit: u32) -> String {
    format!("{}:{}:{}", PAGE_KEY_NAMESPACE, offset, limit)
}

pub fn page_key_pattern() -> String {
    format!("{}:*", PAGE_KEY_NAMESPACE)
}

pub fn has_more(offset: u32, limit: u32, total: u64) -> bool {
    u64::from(offset) + u64::from(limit) < total
}

/// Cache-aside reader of contest listings.
///
/// Cache failures never reach the caller: reads fall back to the store and invalidation
/// failures leave stale pages to expire on their own, so `expiry` bounds staleness.
pub struct ContestReader {
    store: Arc<dyn ContestStore>,
    cache: Arc<dyn PageCache>,
    expiry: Duration,
}

impl ContestReader {
    pub fn new(store: Arc<dyn ContestStore>, cache: Arc<dyn PageCache>, expiry: Duration) -> Self {
        Self {
            store,
            cache,
            expiry,
        }
    }

    pub async fn get_page(&self, offset: u32, limit: u32) -> store::Result<ContestPage> {
        let key = page_key(offset, limit);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<ContestPage>(&cached) {
                Ok(page) => return Ok(page),
                Err(e) => tracing::warn!("discard undecodable cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("cache lookup of {} failed, reading from store: {}", key, e),
        }

        let (contests, total) = tokio::try_join!(
            self.store.find_page(offset, limit),
            self.store.count()
        )?;
        let page = ContestPage {
            contests,
            has_more: has_more(offset, limit, total),
        };

        match serde_json::to_string(&page) {
            Ok(serialized) => {
                if let Err(e) = self.cache.set(&key, &serialized, self.expiry).await {
                    tracing::warn!("failed to populate cache entry {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize page {}: {}", key, e),
        }

        Ok(page)
    }

    /// Drops every cached page. Returns the number of entries removed.
    pub async fn invalidate(&self) -> u64 {
        let pattern = page_key_pattern();
        let keys = match self.cache.keys(&pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("failed to list cached pages, they will expire on their own: {}", e);
                return 0;
            }
        };
        if keys.is_empty() {
            return 0;
        }

        match self.cache.delete(&keys).await {
            Ok(deleted) => {
                tracing::info!("{} cached pages invalidated", deleted);
                deleted
            }
            Err(e) => {
                tracing::warn!("failed to delete cached pages, they will expire on their own: {}", e);
                0
            }
        }
    }
}
