pub mod crawl;
pub mod server;
pub mod solve;

use crate::{
    modules::{
        clock::SystemClock,
        ingestion::Ingestion,
        providers::{self, CodechefProvider, CodeforcesProvider, ContestProvider, LeetcodeProvider},
        solutions::{youtube::YoutubeClient, PlaylistSource, SolutionMatcher},
    },
    settings::Settings,
};
use anyhow::{Context, Result};
use contest_tracker_libs::{
    cache::{reconnect_delay, RedisPageCache},
    page::ContestReader,
    store::{ContestStore, PgContestStore},
};
use std::{sync::Arc, time::Duration};

const MAX_DATABASE_CONNECTIONS: u32 = 5;
const CACHE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Long-lived handles shared by every command.
pub struct Services {
    pub store: Arc<dyn ContestStore>,
    pub reader: Arc<ContestReader>,
    pub ingestion: Arc<Ingestion>,
    pub matcher: Arc<SolutionMatcher>,
    pub playlists: Arc<dyn PlaylistSource>,
}

impl Services {
    pub async fn build(settings: &Settings) -> Result<Self> {
        let store = PgContestStore::connect_lazy(&settings.database_url, MAX_DATABASE_CONNECTIONS)
            .with_context(|| {
                let message = "Failed to create database connection pool.";
                tracing::error!(message);
                message
            })?;
        let store: Arc<dyn ContestStore> = Arc::new(store);

        let cache = RedisPageCache::new(&settings.redis_url, CACHE_REQUEST_TIMEOUT).with_context(|| {
            let message = format!("invalid REDIS_URL: {}", settings.redis_url);
            tracing::error!(message);
            message
        })?;
        let reader = Arc::new(ContestReader::new(
            store.clone(),
            Arc::new(cache),
            settings.cache_expiry,
        ));

        let client = providers::http_client().with_context(|| {
            let message = "Failed to build http client.";
            tracing::error!(message);
            message
        })?;
        let contest_providers: Vec<Arc<dyn ContestProvider>> = vec![
            Arc::new(CodeforcesProvider::new(
                client.clone(),
                settings.codeforces_api_url.clone(),
            )),
            Arc::new(CodechefProvider::new(
                client.clone(),
                settings.codechef_api_url.clone(),
            )),
            Arc::new(LeetcodeProvider::new(
                client.clone(),
                settings.leetcode_api_url.clone(),
            )),
        ];
        let ingestion = Arc::new(Ingestion::new(
            contest_providers,
            store.clone(),
            reader.clone(),
            Arc::new(SystemClock),
            settings.provider_timeout,
        ));

        let playlists: Arc<dyn PlaylistSource> = Arc::new(YoutubeClient::new(
            client,
            settings.youtube_api_url.clone(),
            settings.youtube_api_key.clone(),
            settings.playlists.clone(),
            settings.provider_timeout,
        ));

        Ok(Self {
            matcher: Arc::new(SolutionMatcher::new(store.clone())),
            store,
            reader,
            ingestion,
            playlists,
        })
    }

    /// Migrates the schema once, failing when the database cannot be reached.
    pub async fn migrate(&self) -> Result<()> {
        self.store.migrate().await.with_context(|| {
            let message = "Failed to migrate database schema.";
            tracing::error!(message);
            message
        })
    }
}

/// Retries the schema migration until the database answers, backing off between attempts.
pub async fn migrate_until_ready(store: Arc<dyn ContestStore>) {
    let mut failures: u32 = 0;
    loop {
        match store.migrate().await {
            Ok(()) => {
                tracing::info!("database schema is up to date");
                return;
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = reconnect_delay(failures);
                tracing::warn!(
                    "failed to migrate database schema (attempt {}), retrying in {:?}: {:?}",
                    failures,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
