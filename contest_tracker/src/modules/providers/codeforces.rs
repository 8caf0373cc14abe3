use super::{decode_entries, receive, ContestProvider, ProviderError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use contest_tracker_libs::contest::{ContestDraft, ContestStatus, Platform};
use reqwest::{Client, Url};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ContestListResponse {
    pub status: String,
    pub comment: Option<String>,
    pub result: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestJson {
    pub id: i64,
    pub name: String,
    pub phase: String,
    pub duration_seconds: i64,
    pub start_time_seconds: Option<i64>,
}

/// Maps a Codeforces phase onto a status. Unknown phases are treated as upcoming.
pub fn status_of(phase: &str) -> ContestStatus {
    match phase {
        "BEFORE" => ContestStatus::Upcoming,
        "CODING" | "SYSTEM_TEST" => ContestStatus::Ongoing,
        "FINISHED" => ContestStatus::Completed,
        _ => ContestStatus::Upcoming,
    }
}

pub fn parse_contests(response: ContestListResponse) -> Result<Vec<ContestDraft>, ProviderError> {
    let Some(contests) = response.result else {
        return Err(ProviderError::PayloadError(format!(
            "no result in response with status {}: {}",
            response.status,
            response.comment.unwrap_or_default()
        )));
    };

    let drafts = decode_entries::<ContestJson>(Platform::Codeforces, contests)
        .into_iter()
        .filter(|contest| contest.phase != "PENDING_SYSTEM_TEST")
        .filter_map(|contest| {
            let start_time = contest
                .start_time_seconds
                .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single());
            let Some(start_time) = start_time else {
                tracing::warn!("skip codeforces contest {} without start time", contest.id);
                return None;
            };

            Some(ContestDraft {
                platform: Platform::Codeforces,
                native_id: contest.id.to_string(),
                url: format!("https://codeforces.com/contest/{}", contest.id),
                name: contest.name,
                start_time,
                duration: contest.duration_seconds,
                phase: Some(status_of(&contest.phase)),
            })
        })
        .collect();

    Ok(drafts)
}

pub struct CodeforcesProvider {
    client: Client,
    url: Url,
}

impl CodeforcesProvider {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ContestProvider for CodeforcesProvider {
    fn platform(&self) -> Platform {
        Platform::Codeforces
    }

    async fn fetch(&self) -> Result<Vec<ContestDraft>, ProviderError> {
        let response: ContestListResponse = receive(self.client.get(self.url.clone())).await?;
        parse_contests(response)
    }
}
