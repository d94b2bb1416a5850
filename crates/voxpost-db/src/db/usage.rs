use chrono::NaiveDate;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use voxpost_core::models::{TierLimits, UsageAction, UsageTracking};
use voxpost_core::AppError;

/// Usage tracking repository
///
/// One row per (user, day); counters bump through an upsert so the first
/// action of the day and every later one are the same statement.
#[derive(Clone)]
pub struct UsageRepository {
    pool: PgPool,
}

impl UsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<UsageTracking>, AppError> {
        let usage = sqlx::query_as::<Postgres, UsageTracking>(
            "SELECT * FROM usage_tracking WHERE user_id = $1 AND date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(usage)
    }

    /// Consume one unit of quota if the day's counter is still under the
    /// limit. The check and the increment are one statement, so two
    /// concurrent requests cannot both squeeze past the cap. Returns the
    /// updated row, or `None` when the limit is already spent.
    #[tracing::instrument(skip(self, limits), fields(db.table = "usage_tracking", db.operation = "upsert"))]
    pub async fn try_consume(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        action: UsageAction,
        limits: &TierLimits,
    ) -> Result<Option<UsageTracking>, AppError> {
        let column = match action {
            UsageAction::Recording => "recordings_count",
            UsageAction::Transcription => "transcriptions_count",
            UsageAction::Export => "exports_count",
        };
        let limit = limits.limit_for(action);

        // Column name comes from the enum above, never from user input.
        let sql = format!(
            r#"
            INSERT INTO usage_tracking (user_id, date, {column})
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, date)
            DO UPDATE SET {column} = usage_tracking.{column} + 1, updated_at = NOW()
            WHERE usage_tracking.{column} < $3
            RETURNING *
            "#
        );

        let usage = sqlx::query_as::<Postgres, UsageTracking>(&sql)
            .bind(user_id)
            .bind(date)
            .bind(limit)
            .fetch_optional(&self.pool)
            .await?;

        Ok(usage)
    }

    /// Current counters for a user, or zeros when nothing happened today.
    pub async fn current(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<(i32, i32, i32), AppError> {
        let usage = self.get_for_date(user_id, date).await?;
        Ok(usage
            .map(|u| (u.recordings_count, u.transcriptions_count, u.exports_count))
            .unwrap_or((0, 0, 0)))
    }
}
