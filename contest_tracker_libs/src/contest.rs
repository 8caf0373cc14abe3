use crate::status;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContestError {
    #[error("contest id must not be empty")]
    EmptyId,
    #[error("contest {0} has no name")]
    EmptyName(String),
    #[error("contest id {contest_id} does not belong to platform {platform}")]
    PlatformMismatch {
        contest_id: String,
        platform: Platform,
    },
    #[error("contest {contest_id} has negative duration {duration}")]
    NegativeDuration { contest_id: String, duration: i64 },
    #[error("contest {contest_id} lasts {duration} seconds, which is out of range")]
    DurationOutOfRange { contest_id: String, duration: i64 },
    #[error("contest {contest_id} ends {actual} seconds after start but lasts {duration} seconds")]
    InconsistentDuration {
        contest_id: String,
        duration: i64,
        actual: i64,
    },
    #[error("unknown platform {0}")]
    UnknownPlatform(String),
    #[error("unknown contest status {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Codeforces,
    Codechef,
    Leetcode,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Codeforces, Platform::Codechef, Platform::Leetcode];

    /// Prefix of every contest id issued for this platform.
    pub fn prefix(&self) -> &'static str {
        match self {
            Platform::Codeforces => "cf",
            Platform::Codechef => "cc",
            Platform::Leetcode => "lc",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Codeforces => "codeforces",
            Platform::Codechef => "codechef",
            Platform::Leetcode => "leetcode",
        }
    }

    pub fn contest_id(&self, native_id: &str) -> String {
        format!("{}_{}", self.prefix(), native_id)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ContestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "codeforces" => Ok(Platform::Codeforces),
            "codechef" => Ok(Platform::Codechef),
            "leetcode" => Ok(Platform::Leetcode),
            other => Err(ContestError::UnknownPlatform(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ContestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContestStatus::Upcoming => "UPCOMING",
            ContestStatus::Ongoing => "ONGOING",
            ContestStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for ContestStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContestStatus {
    type Err = ContestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPCOMING" => Ok(ContestStatus::Upcoming),
            "ONGOING" => Ok(ContestStatus::Ongoing),
            "COMPLETED" => Ok(ContestStatus::Completed),
            other => Err(ContestError::UnknownStatus(other.to_string())),
        }
    }
}

/// A contest as it is persisted and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub contest_id: String,
    pub name: String,
    pub platform: Platform,
    pub url: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub status: ContestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_video: Option<String>,
}

impl Contest {
    /// Checks the invariants a record must satisfy before it is written.
    pub fn validate(&self) -> Result<(), ContestError> {
        if self.contest_id.is_empty() {
            return Err(ContestError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ContestError::EmptyName(self.contest_id.clone()));
        }
        let expected_prefix = format!("{}_", self.platform.prefix());
        if !self.contest_id.starts_with(&expected_prefix) || self.contest_id == expected_prefix {
            return Err(ContestError::PlatformMismatch {
                contest_id: self.contest_id.clone(),
                platform: self.platform,
            });
        }
        if self.duration < 0 {
            return Err(ContestError::NegativeDuration {
                contest_id: self.contest_id.clone(),
                duration: self.duration,
            });
        }
        let actual = (self.end_time - self.start_time).num_seconds();
        if actual != self.duration {
            return Err(ContestError::InconsistentDuration {
                contest_id: self.contest_id.clone(),
                duration: self.duration,
                actual,
            });
        }

        Ok(())
    }
}

/// A contest as reported by a provider, before its status is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestDraft {
    pub platform: Platform,
    pub native_id: String,
    pub name: String,
    pub url: String,
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    /// Lifecycle phase reported by the provider, if it reports one.
    pub phase: Option<ContestStatus>,
}

impl ContestDraft {
    pub fn normalize(self, now: DateTime<Utc>) -> Result<Contest, ContestError> {
        let contest_id = self.platform.contest_id(&self.native_id);
        if self.duration < 0 {
            return Err(ContestError::NegativeDuration {
                contest_id,
                duration: self.duration,
            });
        }

        // chrono durations are limited to i64::MAX milliseconds.
        let end_time = (self.duration <= i64::MAX / 1000)
            .then(|| Duration::seconds(self.duration))
            .and_then(|duration| self.start_time.checked_add_signed(duration))
            .ok_or_else(|| ContestError::DurationOutOfRange {
                contest_id: contest_id.clone(),
                duration: self.duration,
            })?;
        let contest = Contest {
            contest_id,
            name: self.name.trim().to_string(),
            platform: self.platform,
            url: self.url,
            start_time: self.start_time,
            end_time,
            duration: self.duration,
            status: status::classify(now, self.start_time, end_time, self.phase),
            youtube_video: None,
        };
        contest.validate()?;

        Ok(contest)
    }
}
