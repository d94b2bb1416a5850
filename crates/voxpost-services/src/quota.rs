//! Daily quota enforcement.

use chrono::Utc;
use voxpost_core::models::{
    TierLimits, UsageAction, UsageResponse, UsageTracking, User,
};
use voxpost_core::AppError;
use voxpost_db::UsageRepository;

#[derive(Clone)]
pub struct QuotaService {
    usage: UsageRepository,
}

impl QuotaService {
    pub fn new(usage: UsageRepository) -> Self {
        Self { usage }
    }

    /// Consume one unit of today's quota, or fail with the limit details.
    /// The check and increment are a single conditional upsert, so two
    /// concurrent requests cannot both take the last slot.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id, action = action.as_str()))]
    pub async fn consume(
        &self,
        user: &User,
        action: UsageAction,
    ) -> Result<UsageTracking, AppError> {
        let limits = TierLimits::for_tier(user.subscription_tier);
        let today = Utc::now().date_naive();

        match self.usage.try_consume(user.id, today, action, &limits).await? {
            Some(usage) => Ok(usage),
            None => {
                let (recordings, transcriptions, exports) =
                    self.usage.current(user.id, today).await?;
                let used = match action {
                    UsageAction::Recording => recordings,
                    UsageAction::Transcription => transcriptions,
                    UsageAction::Export => exports,
                };
                Err(AppError::LimitExceeded {
                    resource: action.as_str().to_string(),
                    used: i64::from(used),
                    limit: i64::from(limits.limit_for(action)),
                })
            }
        }
    }

    /// Today's usage against the user's tier limits.
    pub async fn usage_for(&self, user: &User) -> Result<UsageResponse, AppError> {
        let limits = TierLimits::for_tier(user.subscription_tier);
        let today = Utc::now().date_naive();
        let (recordings, transcriptions, exports) = self.usage.current(user.id, today).await?;

        Ok(UsageResponse {
            date: today,
            tier: user.subscription_tier,
            recordings_used: recordings,
            recordings_limit: limits.recordings_per_day,
            transcriptions_used: transcriptions,
            transcriptions_limit: limits.transcriptions_per_day,
            exports_used: exports,
            exports_limit: limits.exports_per_day,
        })
    }
}
