use super::{decode_entries, receive, ContestProvider, ProviderError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use contest_tracker_libs::contest::{ContestDraft, Platform};
use reqwest::{header::REFERER, Client, Url};
use serde::Deserialize;
use serde_json::json;

const ALL_CONTESTS_QUERY: &str = "{ allContests { title titleSlug startTime duration } }";

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse {
    pub data: Option<AllContests>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllContests {
    pub all_contests: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestJson {
    pub title: String,
    pub title_slug: String,
    pub start_time: i64,
    pub duration: i64,
}

/// LeetCode reports no phase, so drafts carry no status hint.
pub fn parse_contests(response: GraphQLResponse) -> Result<Vec<ContestDraft>, ProviderError> {
    let Some(data) = response.data else {
        return Err(ProviderError::PayloadError(String::from(
            "no data in graphql response",
        )));
    };

    let drafts = decode_entries::<ContestJson>(Platform::Leetcode, data.all_contests)
        .into_iter()
        .filter_map(|contest| {
            let Some(start_time) = Utc.timestamp_opt(contest.start_time, 0).single() else {
                tracing::warn!("skip leetcode contest {} with invalid start time", contest.title_slug);
                return None;
            };

            Some(ContestDraft {
                platform: Platform::Leetcode,
                url: format!("https://leetcode.com/contest/{}", contest.title_slug),
                native_id: contest.title_slug,
                name: contest.title,
                start_time,
                duration: contest.duration,
                phase: None,
            })
        })
        .collect();

    Ok(drafts)
}

pub struct LeetcodeProvider {
    client: Client,
    url: Url,
}

impl LeetcodeProvider {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ContestProvider for LeetcodeProvider {
    fn platform(&self) -> Platform {
        Platform::Leetcode
    }

    async fn fetch(&self) -> Result<Vec<ContestDraft>, ProviderError> {
        let request = self
            .client
            .post(self.url.clone())
            .header(REFERER, "https://leetcode.com/")
            .json(&json!({ "query": ALL_CONTESTS_QUERY }));
        let response: GraphQLResponse = receive(request).await?;
        parse_contests(response)
    }
}
