//! Retention policy arithmetic.
//!
//! Pure functions over timestamps; all persistence-side effects live in the
//! db crate. Keeping the policy here lets the scheduling rules be tested
//! without a database.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::TranscriptionStatus;

/// Deletion schedule for a freshly uploaded file: full retention window.
pub fn initial_deletion_schedule(uploaded_at: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    uploaded_at + Duration::days(retention_days)
}

/// Deletion schedule after a transcription completes: the file is no longer
/// needed, so the window collapses to a short grace period. Never extends an
/// already-earlier schedule.
pub fn completed_deletion_schedule(
    current_schedule: DateTime<Utc>,
    now: DateTime<Utc>,
    grace_minutes: i64,
) -> DateTime<Utc> {
    let grace = now + Duration::minutes(grace_minutes);
    grace.min(current_schedule)
}

/// Whether a failed transcription is still retryable under the cap.
pub fn can_retry(status: TranscriptionStatus, retry_count: i32, max_retries: i32) -> bool {
    status == TranscriptionStatus::Failed && retry_count < max_retries
}

/// Whether a file with exhausted retries should have its schedule collapsed.
/// A file that can never be transcribed has no reason to sit out the full
/// retention period.
pub fn retries_exhausted(retry_count: i32, max_retries: i32) -> bool {
    retry_count >= max_retries
}

/// Deletion schedule once the retry budget is spent: the file is eligible
/// immediately, with no grace window. Never extends an already-earlier
/// schedule.
pub fn exhausted_deletion_schedule(
    current_schedule: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    now.min(current_schedule)
}

/// Time remaining until scheduled deletion, floor-truncated per unit.
/// All fields are zero once the schedule has passed; the countdown never
/// goes negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeletionCountdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_seconds: i64,
}

impl DeletionCountdown {
    pub fn until(deletion_scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total_seconds = (deletion_scheduled_at - now).num_seconds().max(0);
        Self {
            days: total_seconds / 86_400,
            hours: (total_seconds % 86_400) / 3_600,
            minutes: (total_seconds % 3_600) / 60,
            seconds: total_seconds % 60,
            total_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.total_seconds == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_initial_schedule_uses_full_retention() {
        let uploaded = at(0);
        let scheduled = initial_deletion_schedule(uploaded, 7);
        assert_eq!(scheduled - uploaded, Duration::days(7));
    }

    #[test]
    fn test_completed_schedule_collapses_to_grace() {
        let now = at(0);
        let current = now + Duration::days(6);
        let collapsed = completed_deletion_schedule(current, now, 30);
        assert_eq!(collapsed, now + Duration::minutes(30));
    }

    #[test]
    fn test_completed_schedule_never_extends() {
        let now = at(0);
        let current = now + Duration::minutes(5);
        let collapsed = completed_deletion_schedule(current, now, 30);
        assert_eq!(collapsed, current);
    }

    #[test]
    fn test_can_retry_gating() {
        assert!(can_retry(TranscriptionStatus::Failed, 0, 3));
        assert!(can_retry(TranscriptionStatus::Failed, 2, 3));
        assert!(!can_retry(TranscriptionStatus::Failed, 3, 3));
        assert!(!can_retry(TranscriptionStatus::Completed, 0, 3));
        assert!(!can_retry(TranscriptionStatus::Processing, 0, 3));
    }

    #[test]
    fn test_retries_exhausted() {
        assert!(!retries_exhausted(2, 3));
        assert!(retries_exhausted(3, 3));
    }

    #[test]
    fn test_exhausted_schedule_collapses_to_now() {
        let now = at(0);
        let current = now + Duration::days(5);
        assert_eq!(exhausted_deletion_schedule(current, now), now);
    }

    #[test]
    fn test_exhausted_schedule_never_extends() {
        let now = at(0);
        let current = now - Duration::hours(2);
        assert_eq!(exhausted_deletion_schedule(current, now), current);
    }

    #[test]
    fn test_countdown_breakdown() {
        let now = at(0);
        let scheduled = now + Duration::days(2) + Duration::hours(3) + Duration::minutes(4) + Duration::seconds(5);
        let c = DeletionCountdown::until(scheduled, now);
        assert_eq!(c.days, 2);
        assert_eq!(c.hours, 3);
        assert_eq!(c.minutes, 4);
        assert_eq!(c.seconds, 5);
        assert_eq!(c.total_seconds, 2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
        assert!(!c.is_expired());
    }

    #[test]
    fn test_countdown_clamps_at_zero_when_past() {
        let now = at(0);
        let scheduled = now - Duration::hours(1);
        let c = DeletionCountdown::until(scheduled, now);
        assert_eq!(c.total_seconds, 0);
        assert_eq!(c.days, 0);
        assert_eq!(c.seconds, 0);
        assert!(c.is_expired());
    }
}
