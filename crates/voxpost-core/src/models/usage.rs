use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::user::SubscriptionTier;

/// Which daily counter an operation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UsageAction {
    Recording,
    Transcription,
    Export,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageAction::Recording => "recording",
            UsageAction::Transcription => "transcription",
            UsageAction::Export => "export",
        }
    }
}

/// Daily quota caps for a subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TierLimits {
    pub recordings_per_day: i32,
    pub transcriptions_per_day: i32,
    pub exports_per_day: i32,
}

impl TierLimits {
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self {
                recordings_per_day: 5,
                transcriptions_per_day: 5,
                exports_per_day: 3,
            },
            SubscriptionTier::Middle => Self {
                recordings_per_day: 50,
                transcriptions_per_day: 50,
                exports_per_day: 25,
            },
            SubscriptionTier::Pro => Self {
                recordings_per_day: 200,
                transcriptions_per_day: 200,
                exports_per_day: 100,
            },
        }
    }

    pub fn limit_for(&self, action: UsageAction) -> i32 {
        match action {
            UsageAction::Recording => self.recordings_per_day,
            UsageAction::Transcription => self.transcriptions_per_day,
            UsageAction::Export => self.exports_per_day,
        }
    }
}

/// One row per user per day, counters bumped atomically via upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct UsageTracking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub recordings_count: i32,
    pub transcriptions_count: i32,
    pub exports_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UsageTracking {
    pub fn count_for(&self, action: UsageAction) -> i32 {
        match action {
            UsageAction::Recording => self.recordings_count,
            UsageAction::Transcription => self.transcriptions_count,
            UsageAction::Export => self.exports_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    pub date: NaiveDate,
    pub tier: SubscriptionTier,
    pub recordings_used: i32,
    pub recordings_limit: i32,
    pub transcriptions_used: i32,
    pub transcriptions_limit: i32,
    pub exports_used: i32,
    pub exports_limit: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits() {
        let free = TierLimits::for_tier(SubscriptionTier::Free);
        assert_eq!(free.recordings_per_day, 5);
        assert_eq!(free.exports_per_day, 3);

        let middle = TierLimits::for_tier(SubscriptionTier::Middle);
        assert_eq!(middle.transcriptions_per_day, 50);

        let pro = TierLimits::for_tier(SubscriptionTier::Pro);
        assert_eq!(pro.exports_per_day, 100);
    }

    #[test]
    fn test_limit_for_action() {
        let limits = TierLimits::for_tier(SubscriptionTier::Free);
        assert_eq!(limits.limit_for(UsageAction::Recording), 5);
        assert_eq!(limits.limit_for(UsageAction::Export), 3);
    }
}
