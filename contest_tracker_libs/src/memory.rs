//! In-process implementations of the store and cache, used by tests and local runs without
//! Postgres or Redis.

use crate::{
    cache::{self, PageCache},
    contest::{Contest, ContestStatus},
    store::{self, ContestStore, SolutionUpdate},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, RwLock},
    time::{Duration, Instant},
};

#[derive(Default)]
pub struct InMemoryContestStore {
    contests: RwLock<HashMap<String, Contest>>,
}

impl InMemoryContestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored contest, most recently started first.
    pub fn snapshot(&self) -> Vec<Contest> {
        let contests = self.contests.read().unwrap_or_else(|e| e.into_inner());
        let mut contests: Vec<Contest> = contests.values().cloned().collect();
        sort_for_listing(&mut contests);
        contests
    }
}

fn sort_for_listing(contests: &mut [Contest]) {
    contests.sort_by(|a, b| {
        b.start_time
            .cmp(&a.start_time)
            .then_with(|| a.contest_id.cmp(&b.contest_id))
    });
}

#[async_trait]
impl ContestStore for InMemoryContestStore {
    async fn ping(&self) -> store::Result<()> {
        Ok(())
    }

    async fn upsert(&self, contest: &Contest) -> store::Result<()> {
        let mut contests = self.contests.write().unwrap_or_else(|e| e.into_inner());
        let youtube_video = contests
            .get(&contest.contest_id)
            .and_then(|existing| existing.youtube_video.clone());
        contests.insert(
            contest.contest_id.clone(),
            Contest {
                youtube_video,
                ..contest.clone()
            },
        );
        Ok(())
    }

    async fn find(&self, contest_id: &str) -> store::Result<Option<Contest>> {
        let contests = self.contests.read().unwrap_or_else(|e| e.into_inner());
        Ok(contests.get(contest_id).cloned())
    }

    async fn find_page(&self, offset: u32, limit: u32) -> store::Result<Vec<Contest>> {
        Ok(self
            .snapshot()
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> store::Result<u64> {
        let contests = self.contests.read().unwrap_or_else(|e| e.into_inner());
        Ok(contests.len() as u64)
    }

    async fn find_unsolved(&self) -> store::Result<Vec<Contest>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|contest| {
                contest.status == ContestStatus::Completed && contest.youtube_video.is_none()
            })
            .collect())
    }

    async fn set_solution(&self, contest_id: &str, url: &str) -> store::Result<Option<Contest>> {
        let mut contests = self.contests.write().unwrap_or_else(|e| e.into_inner());
        Ok(contests.get_mut(contest_id).map(|contest| {
            contest.youtube_video = Some(url.to_string());
            contest.clone()
        }))
    }

    async fn set_solutions(&self, updates: &[SolutionUpdate]) -> store::Result<Vec<String>> {
        let mut contests = self.contests.write().unwrap_or_else(|e| e.into_inner());
        let mut updated = Vec::new();
        for update in updates.iter() {
            if let Some(contest) = contests.get_mut(&update.contest_id) {
                if contest.youtube_video.is_none() {
                    contest.youtube_video = Some(update.url.clone());
                    updated.push(update.contest_id.clone());
                }
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryPageCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Glob matching limited to `*` wildcards, which is all the page key namespace needs.
fn matches_pattern(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    if parts.is_empty() {
        return rest.is_empty();
    }
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 {
            return rest.ends_with(part);
        }
        match rest.find(part) {
            Some(position) => rest = &rest[position + part.len()..],
            None => return false,
        }
    }
    true
}

#[async_trait]
impl PageCache for InMemoryPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>, cache::CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => {
                return Ok(Some(value.clone()))
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, expiry: Duration) -> Result<(), cache::CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + expiry));
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, cache::CacheError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .keys()
            .filter(|key| matches_pattern(pattern, key))
            .cloned()
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, cache::CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(keys
            .iter()
            .filter(|key| entries.remove(key.as_str()).is_some())
            .count() as u64)
    }
}
