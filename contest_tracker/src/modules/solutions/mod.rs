pub mod youtube;

use async_trait::async_trait;
use contest_tracker_libs::{
    contest::{Contest, Platform},
    store::{self, ContestStore, SolutionUpdate},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::HashSet, sync::Arc};

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub title: String,
    pub url: String,
}

/// Solution videos of every platform, in playlist order.
#[derive(Debug, Clone, Default)]
pub struct PlaylistSet {
    pub codeforces: Vec<Video>,
    pub codechef: Vec<Video>,
    pub leetcode: Vec<Video>,
}

impl PlaylistSet {
    pub fn videos(&self, platform: Platform) -> &[Video] {
        match platform {
            Platform::Codeforces => &self.codeforces,
            Platform::Codechef => &self.codechef,
            Platform::Leetcode => &self.leetcode,
        }
    }

    pub fn len(&self) -> usize {
        self.codeforces.len() + self.codechef.len() + self.leetcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn fetch_all(&self) -> PlaylistSet;
}

/// Lowercases, cuts at the first `(`, trims, then drops everything outside `[a-z0-9 ]`.
pub fn normalize_title(text: &str) -> String {
    let lowered = text.to_lowercase();
    let head = lowered.split('(').next().unwrap_or_default();
    DISALLOWED.replace_all(head.trim(), "").into_owned()
}

/// First video whose normalized title contains the normalized contest name.
pub fn find_match<'a>(contest_name: &str, videos: &'a [Video]) -> Option<&'a Video> {
    let name = normalize_title(contest_name);
    // An empty name would be contained in every title.
    if name.trim().is_empty() {
        return None;
    }

    videos
        .iter()
        .find(|video| normalize_title(&video.title).contains(&name))
}

pub struct SolutionMatcher {
    store: Arc<dyn ContestStore>,
}

impl SolutionMatcher {
    pub fn new(store: Arc<dyn ContestStore>) -> Self {
        Self { store }
    }

    /// Attaches videos to completed contests that have none. Returns the contests that got one.
    pub async fn run(&self, playlists: &PlaylistSet) -> store::Result<Vec<Contest>> {
        let unsolved = self.store.find_unsolved().await?;
        tracing::info!(
            "{} completed contests without solution, {} videos to match against",
            unsolved.len(),
            playlists.len()
        );

        let matched: Vec<Contest> = unsolved
            .into_iter()
            .filter_map(|mut contest| {
                let video = find_match(&contest.name, playlists.videos(contest.platform))?;
                contest.youtube_video = Some(video.url.clone());
                Some(contest)
            })
            .collect();
        if matched.is_empty() {
            return Ok(matched);
        }

        let updates: Vec<SolutionUpdate> = matched
            .iter()
            .filter_map(|contest| {
                contest.youtube_video.as_ref().map(|url| SolutionUpdate {
                    contest_id: contest.contest_id.clone(),
                    url: url.clone(),
                })
            })
            .collect();
        let updated = self.store.set_solutions(&updates).await?;
        tracing::info!(
            "{} of {} matched contests updated with solution videos",
            updated.len(),
            matched.len()
        );

        let updated: HashSet<String> = updated.into_iter().collect();
        Ok(matched
            .into_iter()
            .filter(|contest| updated.contains(&contest.contest_id))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use contest_tracker_libs::{contest::ContestStatus, memory::InMemoryContestStore};

    /// Attaches a manual solution right after the unsolved contests are read.
    struct ConcurrentEditStore {
        inner: InMemoryContestStore,
        edited_id: String,
        manual_url: String,
    }

    #[async_trait]
    impl ContestStore for ConcurrentEditStore {
        async fn ping(&self) -> store::Result<()> {
            self.inner.ping().await
        }
        async fn upsert(&self, contest: &Contest) -> store::Result<()> {
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
            let unsolved = self.inner.find_unsolved().await?;
            self.inner
                .set_solution(&self.edited_id, &self.manual_url)
                .await?;
            Ok(unsolved)
        }
        async fn set_solution(&self, contest_id: &str, url: &str) -> store::Result<Option<Contest>> {
            self.inner.set_solution(contest_id, url).await
        }
        async fn set_solutions(&self, updates: &[SolutionUpdate]) -> store::Result<Vec<String>> {
            self.inner.set_solutions(updates).await
        }
    }

    fn video(title: &str, id: &str) -> Video {
        Video {
            title: title.to_string(),
            url: format!("https://www.youtube.com/watch?v={}", id),
        }
    }

    fn contest(contest_id: &str, name: &str, platform: Platform, status: ContestStatus) -> Contest {
        let start_time = Utc.with_ymd_and_hms(2024, 3, 3, 2, 30, 0).unwrap();
        Contest {
            contest_id: contest_id.to_string(),
            name: name.to_string(),
            platform,
            url: String::from("https://example.com"),
            start_time,
            end_time: start_time + Duration::seconds(5400),
            duration: 5400,
            status,
            youtube_video: None,
        }
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_title("Weekly Contest 10 (Rated)"), "weekly contest 10");
        assert_eq!(
            normalize_title("Codeforces Round #925 | Div. 3"),
            "codeforces round 925  div 3"
        );
        assert_eq!(normalize_title("  Starters 124  "), "starters 124");
        assert_eq!(normalize_title("(Unrated) Round"), "");
    }

    #[test]
    fn contest_name_must_be_inside_video_title() {
        let videos = vec![
            video("Weekly Contest 1 | Solutions", "one"),
            video("LeetCode Weekly Contest 10 Solutions", "ten"),
        ];

        let found = find_match("Weekly Contest 10 (Rated)", &videos).unwrap();
        assert_eq!(found.url, "https://www.youtube.com/watch?v=ten");

        assert_eq!(find_match("LeetCode Weekly Contest 10 Solutions Extended", &videos), None);
    }

    #[test]
    fn first_video_in_playlist_order_wins() {
        let videos = vec![
            video("Starters 124 Div 2 Solutions", "first"),
            video("Starters 124 Div 1 Solutions", "second"),
        ];

        assert_eq!(find_match("Starters 124", &videos).unwrap().url, videos[0].url);
    }

    #[test]
    fn empty_names_never_match() {
        let videos = vec![video("Anything", "x")];

        assert_eq!(find_match("(Unrated)", &videos), None);
        assert_eq!(find_match("!!!", &videos), None);
    }

    #[tokio::test]
    async fn run_updates_matching_completed_contests() {
        let store = Arc::new(InMemoryContestStore::new());
        for record in [
            contest("lc_weekly-contest-10", "Weekly Contest 10", Platform::Leetcode, ContestStatus::Completed),
            contest("lc_weekly-contest-11", "Weekly Contest 11", Platform::Leetcode, ContestStatus::Upcoming),
            contest("lc_weekly-contest-12", "Weekly Contest 12", Platform::Leetcode, ContestStatus::Completed),
            contest("cc_START10", "Weekly Contest 10", Platform::Codechef, ContestStatus::Completed),
        ] {
            store.upsert(&record).await.unwrap();
        }
        let playlists = PlaylistSet {
            leetcode: vec![
                video("Weekly Contest 10 | All Solutions", "ten"),
                video("Weekly Contest 11 | All Solutions", "eleven"),
            ],
            ..PlaylistSet::default()
        };
        let matcher = SolutionMatcher::new(store.clone());

        let updated = matcher.run(&playlists).await.unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].contest_id, "lc_weekly-contest-10");
        let stored = store.find("lc_weekly-contest-10").await.unwrap().unwrap();
        assert_eq!(
            stored.youtube_video.as_deref(),
            Some("https://www.youtube.com/watch?v=ten")
        );
        for untouched in ["lc_weekly-contest-11", "lc_weekly-contest-12", "cc_START10"] {
            let stored = store.find(untouched).await.unwrap().unwrap();
            assert_eq!(stored.youtube_video, None);
        }

        assert!(matcher.run(&playlists).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_reports_only_contests_it_changed() {
        let store = Arc::new(ConcurrentEditStore {
            inner: InMemoryContestStore::new(),
            edited_id: String::from("lc_weekly-contest-10"),
            manual_url: String::from("https://www.youtube.com/watch?v=manual"),
        });
        for record in [
            contest("lc_weekly-contest-10", "Weekly Contest 10", Platform::Leetcode, ContestStatus::Completed),
            contest("lc_weekly-contest-11", "Weekly Contest 11", Platform::Leetcode, ContestStatus::Completed),
        ] {
            store.upsert(&record).await.unwrap();
        }
        let playlists = PlaylistSet {
            leetcode: vec![
                video("Weekly Contest 10 | All Solutions", "ten"),
                video("Weekly Contest 11 | All Solutions", "eleven"),
            ],
            ..PlaylistSet::default()
        };

        let updated = SolutionMatcher::new(store.clone())
            .run(&playlists)
            .await
            .unwrap();

        let ids: Vec<&str> = updated.iter().map(|c| c.contest_id.as_str()).collect();
        assert_eq!(ids, vec!["lc_weekly-contest-11"]);
        let edited = store.find("lc_weekly-contest-10").await.unwrap().unwrap();
        assert_eq!(
            edited.youtube_video.as_deref(),
            Some("https://www.youtube.com/watch?v=manual")
        );
    }
}
