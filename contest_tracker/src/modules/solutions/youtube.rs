use super::{PlaylistSet, PlaylistSource, Video};
use crate::modules::providers::{receive, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistIds {
    pub codeforces: String,
    pub codechef: String,
    pub leetcode: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemsResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: String,
}

impl From<PlaylistItem> for Video {
    fn from(item: PlaylistItem) -> Self {
        Video {
            url: format!(
                "https://www.youtube.com/watch?v={}",
                item.snippet.resource_id.video_id
            ),
            title: item.snippet.title,
        }
    }
}

/// Reads the solution playlists through the YouTube Data API.
pub struct YoutubeClient {
    client: Client,
    url: Url,
    api_key: Option<String>,
    playlists: PlaylistIds,
    timeout: Duration,
}

impl YoutubeClient {
    pub fn new(
        client: Client,
        url: Url,
        api_key: Option<String>,
        playlists: PlaylistIds,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url,
            api_key,
            playlists,
            timeout,
        }
    }

    pub async fn fetch_playlist(&self, api_key: &str, playlist_id: &str) -> Result<Vec<Video>, ProviderError> {
        let request = self.client.get(self.url.clone()).query(&[
            ("part", "snippet"),
            ("fields", "items(snippet(title,resourceId/videoId))"),
            ("maxResults", "50"),
            ("key", api_key),
            ("playlistId", playlist_id),
        ]);
        let response: PlaylistItemsResponse = receive(request).await?;

        Ok(response.items.into_iter().map(Video::from).collect())
    }

    async fn fetch_or_empty(&self, api_key: &str, playlist_id: &str) -> Vec<Video> {
        match tokio::time::timeout(self.timeout, self.fetch_playlist(api_key, playlist_id)).await {
            Ok(Ok(videos)) => {
                tracing::info!("{} videos fetched from playlist {}", videos.len(), playlist_id);
                videos
            }
            Ok(Err(e)) => {
                tracing::error!("failed to fetch playlist {}: {}", playlist_id, e);
                Vec::new()
            }
            Err(_) => {
                tracing::error!(
                    "fetching playlist {} timed out after {:?}",
                    playlist_id,
                    self.timeout
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PlaylistSource for YoutubeClient {
    async fn fetch_all(&self) -> PlaylistSet {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("YOUTUBE_API_KEY is not set, solution playlists are not fetched");
            return PlaylistSet::default();
        };

        let (codeforces, codechef, leetcode) = tokio::join!(
            self.fetch_or_empty(api_key, &self.playlists.codeforces),
            self.fetch_or_empty(api_key, &self.playlists.codechef),
            self.fetch_or_empty(api_key, &self.playlists.leetcode),
        );

        PlaylistSet {
            codeforces,
            codechef,
            leetcode,
        }
    }
}
