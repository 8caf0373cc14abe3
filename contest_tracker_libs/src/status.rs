use crate::contest::ContestStatus;
use chrono::{DateTime, Utc};

/// Derives the lifecycle status of a contest.
///
/// A phase reported by the provider wins over the clock.
/// Providers without a phase are classified by time alone.
pub fn classify(
    now: DateTime<Utc>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    phase: Option<ContestStatus>,
) -> ContestStatus {
    match phase {
        Some(phase) => phase,
        None => classify_by_clock(now, start_time, end_time),
    }
}

pub fn classify_by_clock(
    now: DateTime<Utc>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> ContestStatus {
    if now < start_time {
        ContestStatus::Upcoming
    } else if now <= end_time {
        ContestStatus::Ongoing
    } else {
        ContestStatus::Completed
    }
}
