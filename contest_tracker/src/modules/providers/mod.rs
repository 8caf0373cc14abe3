pub mod codechef;
pub mod codeforces;
pub mod leetcode;

use async_trait::async_trait;
use contest_tracker_libs::contest::{ContestDraft, Platform};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub use codechef::CodechefProvider;
pub use codeforces::CodeforcesProvider;
pub use leetcode::LeetcodeProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("unexpected response status {0}")]
    StatusError(StatusCode),
    #[error("malformed payload: {0}")]
    PayloadError(String),
}

/// A remote listing of contests of one platform.
#[async_trait]
pub trait ContestProvider: Send + Sync {
    fn platform(&self) -> Platform;
    async fn fetch(&self) -> Result<Vec<ContestDraft>, ProviderError>;
}

pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .gzip(true)
        .user_agent(concat!("contest_tracker/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Sends the request and decodes a successful JSON answer.
pub(crate) async fn receive<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::StatusError(status));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ProviderError::PayloadError(e.to_string()))
}

/// Decodes each listing entry on its own. Entries that do not fit `T` are logged and skipped.
pub(crate) fn decode_entries<T: DeserializeOwned>(
    platform: Platform,
    entries: Vec<serde_json::Value>,
) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(contest) => Some(contest),
            Err(e) => {
                tracing::warn!("skip malformed {} contest entry: {}", platform, e);
                None
            }
        })
        .collect()
}

/// Fetches from the provider, turning every failure (including running past `timeout`) into an
/// empty result.
pub async fn fetch_or_empty(provider: &dyn ContestProvider, timeout: Duration) -> Vec<ContestDraft> {
    let platform = provider.platform();
    match tokio::time::timeout(timeout, provider.fetch()).await {
        Ok(Ok(drafts)) => {
            tracing::info!("{} contests fetched from {}", drafts.len(), platform);
            drafts
        }
        Ok(Err(e)) => {
            tracing::error!("failed to fetch contests from {}: {}", platform, e);
            Vec::new()
        }
        Err(_) => {
            tracing::error!(
                "fetching contests from {} timed out after {:?}",
                platform,
                timeout
            );
            Vec::new()
        }
    }
}
