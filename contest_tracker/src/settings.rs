use crate::modules::solutions::youtube::PlaylistIds;
use anyhow::{Context, Result};
use std::{env, fmt::Display, str::FromStr, time::Duration};
use url::Url;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_CODEFORCES_API_URL: &str = "https://codeforces.com/api/contest.list";
const DEFAULT_CODECHEF_API_URL: &str = "https://www.codechef.com/api/list/contests/all";
const DEFAULT_LEETCODE_API_URL: &str = "https://leetcode.com/graphql";
const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";
const DEFAULT_CODEFORCES_PLAYLIST_ID: &str = "PLcXpkI9A-RZLUfBSNp-YQBCOezZKbDSgB";
const DEFAULT_CODECHEF_PLAYLIST_ID: &str = "PLcXpkI9A-RZIZ6lsE0KCcLWeKNoG45fYr";
const DEFAULT_LEETCODE_PLAYLIST_ID: &str = "PLcXpkI9A-RZI6FhydNz3JBt_-p_i25Cbr";

/// Runtime configuration read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub redis_url: String,
    pub provider_timeout: Duration,
    pub cache_expiry: Duration,
    pub ingestion_interval: Duration,
    pub codeforces_api_url: Url,
    pub codechef_api_url: Url,
    pub leetcode_api_url: Url,
    pub youtube_api_url: Url,
    pub youtube_api_key: Option<String>,
    pub playlists: PlaylistIds,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").with_context(|| {
            let message = "DATABASE_URL must be configured.";
            tracing::error!(message);
            message
        })?;
        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| {
            tracing::warn!(
                "REDIS_URL environment variable is not set. Default value `{}` will be used.",
                DEFAULT_REDIS_URL
            );
            String::from(DEFAULT_REDIS_URL)
        });

        let provider_timeout = Duration::from_secs(parse(&lookup, "PROVIDER_TIMEOUT_SECS", 5u64)?);
        let cache_expiry = Duration::from_secs(parse(&lookup, "CACHE_EXPIRY_SECS", 21600u64)?);
        let interval_hours: u64 = parse(&lookup, "INGESTION_INTERVAL_HOURS", 6u64)?;
        if interval_hours == 0 {
            let message = "INGESTION_INTERVAL_HOURS must be greater than 0.";
            tracing::error!(message);
            anyhow::bail!(message);
        }

        Ok(Self {
            database_url,
            redis_url,
            provider_timeout,
            cache_expiry,
            ingestion_interval: Duration::from_secs(interval_hours * 60 * 60),
            codeforces_api_url: parse_url(&lookup, "CODEFORCES_API_URL", DEFAULT_CODEFORCES_API_URL)?,
            codechef_api_url: parse_url(&lookup, "CODECHEF_API_URL", DEFAULT_CODECHEF_API_URL)?,
            leetcode_api_url: parse_url(&lookup, "LEETCODE_API_URL", DEFAULT_LEETCODE_API_URL)?,
            youtube_api_url: parse_url(&lookup, "YOUTUBE_API_URL", DEFAULT_YOUTUBE_API_URL)?,
            youtube_api_key: lookup("YOUTUBE_API_KEY").filter(|key| !key.trim().is_empty()),
            playlists: PlaylistIds {
                codeforces: lookup("CODEFORCES_PLAYLIST_ID")
                    .unwrap_or_else(|| String::from(DEFAULT_CODEFORCES_PLAYLIST_ID)),
                codechef: lookup("CODECHEF_PLAYLIST_ID")
                    .unwrap_or_else(|| String::from(DEFAULT_CODECHEF_PLAYLIST_ID)),
                leetcode: lookup("LEETCODE_PLAYLIST_ID")
                    .unwrap_or_else(|| String::from(DEFAULT_LEETCODE_PLAYLIST_ID)),
            },
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|e| {
            let message = format!("invalid value `{}` for {}: {}", value, name, e);
            tracing::error!(message);
            anyhow::anyhow!(message)
        }),
        None => Ok(default),
    }
}

fn parse_url(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> Result<Url> {
    let value = lookup(name).unwrap_or_else(|| String::from(default));
    Url::parse(&value).with_context(|| {
        let message = format!("{} is not a valid url: {}", name, value);
        tracing::error!(message);
        message
    })
}
