use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use voxpost_core::models::{PageQuery, Transcription, TranscriptionStatus};
use voxpost_core::AppError;

use super::lifecycle::FileLifecycleRepository;
use super::transaction::TransactionGuard;

/// Transcription repository
///
/// Status changes fan out to the lifecycle row in the same transaction:
/// a transcript can never read `completed` while its file's retention record
/// still says `processing`, and vice versa.
#[derive(Clone)]
pub struct TranscriptionRepository {
    pool: PgPool,
    lifecycle: FileLifecycleRepository,
}

impl TranscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            lifecycle: FileLifecycleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Insert a `processing` transcription and flip the lifecycle row to
    /// `processing` atomically.
    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.operation = "insert"))]
    pub async fn create_processing(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
        ai_service: &str,
        language: &str,
    ) -> Result<Transcription, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let transcription = sqlx::query_as::<Postgres, Transcription>(
            r#"
            INSERT INTO transcriptions (recording_id, user_id, ai_service, language, status)
            VALUES ($1, $2, $3, $4, 'processing')
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .bind(user_id)
        .bind(ai_service)
        .bind(language)
        .fetch_one(&mut **tx)
        .await?;

        self.lifecycle
            .mark_processing_tx(&mut tx, recording_id, transcription.id)
            .await?;

        tx.commit().await?;
        Ok(transcription)
    }

    /// Store the transcript and mark both rows `completed`. Collapses the
    /// file's deletion schedule to the grace window.
    #[tracing::instrument(skip(self, text), fields(db.table = "transcriptions", db.operation = "update"))]
    pub async fn complete_with_lifecycle(
        &self,
        id: Uuid,
        text: &str,
        confidence_score: Option<f64>,
        language: &str,
        word_count: i32,
        grace_minutes: i64,
    ) -> Result<Option<Transcription>, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let transcription = sqlx::query_as::<Postgres, Transcription>(
            r#"
            UPDATE transcriptions
            SET status = 'completed',
                text = $2,
                confidence_score = $3,
                language = $4,
                word_count = $5,
                error_message = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(confidence_score)
        .bind(language)
        .bind(word_count)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(transcription) = transcription else {
            tx.rollback().await?;
            return Ok(None);
        };

        self.lifecycle
            .mark_completed_tx(&mut tx, transcription.recording_id, grace_minutes)
            .await?;

        tx.commit().await?;
        Ok(Some(transcription))
    }

    /// Record a provider failure on both rows and consume one lifecycle
    /// retry. Atomic with the lifecycle increment.
    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.operation = "update"))]
    pub async fn fail_with_lifecycle(
        &self,
        id: Uuid,
        error_message: &str,
    ) -> Result<Option<Transcription>, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let transcription = sqlx::query_as::<Postgres, Transcription>(
            r#"
            UPDATE transcriptions
            SET status = 'failed',
                error_message = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(error_message)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(transcription) = transcription else {
            tx.rollback().await?;
            return Ok(None);
        };

        self.lifecycle
            .mark_failed_tx(&mut tx, transcription.recording_id)
            .await?;

        tx.commit().await?;
        Ok(Some(transcription))
    }

    /// Retry a failed transcription. The transcription's own `retry_count`
    /// tracks retries requested, so it only moves here, not on failure. The
    /// lifecycle claim is the gate: if it matches no row (already retried,
    /// retries exhausted, or file gone) the whole operation rolls back and
    /// `Ok(None)` is returned.
    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.operation = "update"))]
    pub async fn retry_with_lifecycle(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Transcription>, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let transcription = sqlx::query_as::<Postgres, Transcription>(
            r#"
            UPDATE transcriptions
            SET status = 'processing',
                retry_count = retry_count + 1,
                error_message = NULL,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'failed'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(transcription) = transcription else {
            tx.rollback().await?;
            return Ok(None);
        };

        let claimed = self
            .lifecycle
            .claim_retry_tx(&mut tx, transcription.recording_id)
            .await?;

        if claimed.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        // The retry is live again; lifecycle goes back to processing with the
        // same transcription row.
        self.lifecycle
            .mark_processing_tx(&mut tx, transcription.recording_id, transcription.id)
            .await?;

        tx.commit().await?;
        Ok(Some(transcription))
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<Transcription>, AppError> {
        let transcription = sqlx::query_as::<Postgres, Transcription>(
            "SELECT * FROM transcriptions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transcription)
    }

    pub async fn get_by_recording(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Transcription>, AppError> {
        let transcription = sqlx::query_as::<Postgres, Transcription>(
            r#"
            SELECT * FROM transcriptions
            WHERE recording_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(recording_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transcription)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        page: &PageQuery,
        status: Option<TranscriptionStatus>,
    ) -> Result<(Vec<Transcription>, i64), AppError> {
        let (limit, offset) = page.limit_offset();

        let transcriptions = sqlx::query_as::<Postgres, Transcription>(
            r#"
            SELECT * FROM transcriptions
            WHERE user_id = $1 AND ($2::transcription_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM transcriptions
            WHERE user_id = $1 AND ($2::transcription_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((transcriptions, total.0))
    }

    /// Fail transcriptions stuck in `processing` past the watchdog timeout.
    /// Covers provider tasks that died without reporting back. Each one goes
    /// through the normal failure fan-out so retry accounting stays correct.
    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.operation = "update"))]
    pub async fn reap_stale_processing(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Transcription>, AppError> {
        let stale = sqlx::query_as::<Postgres, Transcription>(
            r#"
            SELECT * FROM transcriptions
            WHERE status = 'processing' AND updated_at < $1
            "#,
        )
        .bind(stale_before)
        .fetch_all(&self.pool)
        .await?;

        let mut reaped = Vec::with_capacity(stale.len());
        for t in stale {
            match self
                .fail_with_lifecycle(t.id, "Transcription timed out")
                .await
            {
                Ok(Some(failed)) => reaped.push(failed),
                // Raced with a real completion/failure; nothing to do.
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(transcription_id = %t.id, error = %e, "Failed to reap stale transcription");
                }
            }
        }

        Ok(reaped)
    }
}
