use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::{
    future::Future,
    sync::Mutex,
    time::{Duration, Instant},
};
use thiserror::Error;

type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache request failed")]
    RedisError(#[from] redis::RedisError),
    #[error("cache request timed out")]
    Timeout,
    #[error("cache is unavailable, next connection attempt in {0:?}")]
    Unavailable(Duration),
}

/// Key-value store holding serialized page snapshots.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, expiry: Duration) -> Result<()>;
    /// Keys matching a glob pattern such as `contests:*`.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    async fn delete(&self, keys: &[String]) -> Result<u64>;
}

/// Delay before the next connection attempt after `failures` consecutive failures.
pub fn reconnect_delay(failures: u32) -> Duration {
    Duration::from_millis(50u64.saturating_mul(u64::from(failures))).min(Duration::from_secs(2))
}

#[derive(Default)]
struct ConnectionState {
    manager: Option<ConnectionManager>,
    failures: u32,
    retry_at: Option<Instant>,
}

/// Redis backed page cache.
///
/// The connection is opened lazily. Once established, `ConnectionManager` reconnects on its own;
/// until then every failed attempt pushes the next one back by `reconnect_delay`, and requests
/// made in between fail fast with `CacheError::Unavailable`.
pub struct RedisPageCache {
    client: Client,
    timeout: Duration,
    state: Mutex<ConnectionState>,
}

impl RedisPageCache {
    pub fn new(redis_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::open(redis_url)?,
            timeout,
            state: Mutex::new(ConnectionState::default()),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(manager) = &state.manager {
                return Ok(manager.clone());
            }
            if let Some(retry_at) = state.retry_at {
                let now = Instant::now();
                if now < retry_at {
                    return Err(CacheError::Unavailable(retry_at - now));
                }
            }
        }

        let connected = self
            .bounded(async {
                self.client
                    .get_tokio_connection_manager()
                    .await
                    .map_err(CacheError::from)
            })
            .await;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match connected {
            Ok(manager) => {
                if state.failures > 0 {
                    tracing::info!("cache connection re-established after {} attempts", state.failures);
                }
                state.failures = 0;
                state.retry_at = None;
                let manager = state.manager.get_or_insert(manager).clone();
                Ok(manager)
            }
            Err(e) => {
                state.failures = state.failures.saturating_add(1);
                let delay = reconnect_delay(state.failures);
                state.retry_at = Some(Instant::now() + delay);
                tracing::warn!(
                    "failed to connect to cache (attempt {}), retrying in {:?}: {}",
                    state.failures,
                    delay,
                    e
                );
                Err(e)
            }
        }
    }

    async fn bounded<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        self.bounded(async {
            redis::cmd("PING")
                .query_async::<_, String>(&mut conn)
                .await
                .map_err(CacheError::from)
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        self.bounded(async { conn.get(key).await.map_err(CacheError::from) })
            .await
    }

    async fn set(&self, key: &str, value: &str, expiry: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let seconds = expiry.as_secs().max(1) as usize;
        self.bounded(async {
            conn.set_ex(key, value, seconds)
                .await
                .map_err(CacheError::from)
        })
        .await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        self.bounded(async {
            let mut keys: Vec<String> = Vec::new();
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            Ok::<_, CacheError>(keys)
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection().await?;
        self.bounded(async { conn.del(keys).await.map_err(CacheError::from) })
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reconnect_delay_grows_linearly_up_to_cap() {
        assert_eq!(reconnect_delay(0), Duration::ZERO);
        assert_eq!(reconnect_delay(1), Duration::from_millis(50));
        assert_eq!(reconnect_delay(10), Duration::from_millis(500));
        assert_eq!(reconnect_delay(40), Duration::from_secs(2));
        assert_eq!(reconnect_delay(u32::MAX), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unreachable_cache_backs_off() {
        // Nothing listens on port 1.
        let cache = RedisPageCache::new("redis://127.0.0.1:1", Duration::from_secs(2)).unwrap();

        assert!(cache.get("contests:0:30").await.is_err());
        assert!(matches!(
            cache.get("contests:0:30").await,
            Err(CacheError::Unavailable(_))
        ));
    }

    /// System test of the basic cache operations.
    ///
    /// Run this test with the Docker container started with the following command.
    ///
    /// ```ignore
    /// docker run --rm -d -p 6379:6379 redis:7
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_set_get_and_delete() {
        let cache = RedisPageCache::new("redis://127.0.0.1:6379", Duration::from_secs(2)).unwrap();
        cache.ping().await.unwrap();

        cache
            .set("contests:0:30", "{}", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("contests:30:30", "{}", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get("contests:0:30").await.unwrap(),
            Some(String::from("{}"))
        );

        let mut keys = cache.keys("contests:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["contests:0:30", "contests:30:30"]);

        assert_eq!(cache.delete(&keys).await.unwrap(), 2);
        assert_eq!(cache.get("contests:0:30").await.unwrap(), None);
    }
}
