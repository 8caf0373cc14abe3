use super::{decode_entries, receive, ContestProvider, ProviderError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contest_tracker_libs::contest::{ContestDraft, ContestStatus, Platform};
use reqwest::{Client, Url};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ContestListResponse {
    pub future_contests: Option<Vec<serde_json::Value>>,
    pub present_contests: Option<Vec<serde_json::Value>>,
    pub past_contests: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ContestJson {
    pub contest_code: Option<String>,
    pub contest_name: Option<String>,
    pub contest_start_date_iso: Option<String>,
    pub contest_end_date_iso: Option<String>,
}

fn parse_instant(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

fn to_draft(contest: ContestJson, status: ContestStatus) -> Option<ContestDraft> {
    let (Some(code), Some(name)) = (contest.contest_code, contest.contest_name) else {
        tracing::warn!("skip codechef contest without code or name");
        return None;
    };
    let start_time = parse_instant(contest.contest_start_date_iso.as_deref());
    let end_time = parse_instant(contest.contest_end_date_iso.as_deref());
    let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
        tracing::warn!("skip codechef contest {} with unreadable schedule", code);
        return None;
    };

    Some(ContestDraft {
        platform: Platform::Codechef,
        url: format!("https://www.codechef.com/{}", code),
        native_id: code,
        name,
        start_time,
        duration: (end_time - start_time).num_seconds(),
        phase: Some(status),
    })
}

/// Flattens the three listing buckets. The bucket a contest comes from decides its status.
pub fn parse_contests(response: ContestListResponse) -> Vec<ContestDraft> {
    [
        (response.future_contests, ContestStatus::Upcoming),
        (response.present_contests, ContestStatus::Ongoing),
        (response.past_contests, ContestStatus::Completed),
    ]
    .into_iter()
    .flat_map(|(contests, status)| {
        decode_entries::<ContestJson>(Platform::Codechef, contests.unwrap_or_default())
            .into_iter()
            .filter_map(move |contest| to_draft(contest, status))
    })
    .collect()
}

pub struct CodechefProvider {
    client: Client,
    url: Url,
}

impl CodechefProvider {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ContestProvider for CodechefProvider {
    fn platform(&self) -> Platform {
        Platform::Codechef
    }

    async fn fetch(&self) -> Result<Vec<ContestDraft>, ProviderError> {
        let response: ContestListResponse = receive(self.client.get(self.url.clone())).await?;
        Ok(parse_contests(response))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn provider(server: &MockServer) -> CodechefProvider {
        let url = Url::parse(&format!("{}/api/list/contests/all", server.uri())).unwrap();
        CodechefProvider::new(Client::new(), url)
    }

    #[test]
    fn buckets_decide_status() {
        let response: ContestListResponse = serde_json::from_value(json!({
            "status": "success",
            "future_contests": [{
                "contest_code": "START125",
                "contest_name": "Starters 125",
                "contest_start_date_iso": "2024-03-13T20:00:00+05:30",
                "contest_end_date_iso": "2024-03-13T22:00:00+05:30"
            }],
            "past_contests": [
                {
                    "contest_code": "START124",
                    "contest_name": "Starters 124",
                    "contest_start_date_iso": "2024-03-06T20:00:00+05:30",
                    "contest_end_date_iso": "2024-03-06T22:00:00+05:30"
                },
                {"contest_code": "BROKEN", "contest_start_date_iso": "2024-03-06T20:00:00+05:30"},
                {
                    "contest_code": 4242,
                    "contest_name": "Numeric code",
                    "contest_start_date_iso": "2024-03-06T20:00:00+05:30",
                    "contest_end_date_iso": "2024-03-06T22:00:00+05:30"
                },
                {
                    "contest_code": "BADDATE",
                    "contest_name": "Bad date",
                    "contest_start_date_iso": "yesterday",
                    "contest_end_date_iso": "2024-03-06T22:00:00+05:30"
                }
            ]
        }))
        .unwrap();

        let drafts = parse_contests(response);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].native_id, "START125");
        assert_eq!(drafts[0].phase, Some(ContestStatus::Upcoming));
        assert_eq!(drafts[0].url, "https://www.codechef.com/START125");
        assert_eq!(drafts[0].duration, 7200);
        assert_eq!(
            drafts[0].start_time,
            Utc.with_ymd_and_hms(2024, 3, 13, 14, 30, 0).unwrap()
        );
        assert_eq!(drafts[1].native_id, "START124");
        assert_eq!(drafts[1].phase, Some(ContestStatus::Completed));
    }

    #[tokio::test]
    async fn fetch_contest_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/list/contests/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "present_contests": [{
                    "contest_code": "LTIME130",
                    "contest_name": "Lunchtime",
                    "contest_start_date_iso": "2024-03-01T10:00:00Z",
                    "contest_end_date_iso": "2024-03-01T13:00:00Z"
                }]
            })))
            .mount(&server)
            .await;

        let drafts = provider(&server).await.fetch().await.unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].phase, Some(ContestStatus::Ongoing));
        assert_eq!(drafts[0].duration, 3 * 60 * 60);
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = provider(&server).await.fetch().await;
        assert!(matches!(result, Err(ProviderError::StatusError(_))));
    }

    #[tokio::test]
    async fn malformed_payload_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
            .mount(&server)
            .await;

        let result = provider(&server).await.fetch().await;
        assert!(matches!(result, Err(ProviderError::PayloadError(_))));
    }
}
