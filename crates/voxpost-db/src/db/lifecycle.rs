use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use voxpost_core::models::{FileLifecycleRecord, FileType};
use voxpost_core::AppError;

/// File lifecycle repository
///
/// One row per recording, tracking the deletion schedule and transcription
/// retry budget. Rows are never removed while the recording exists: after
/// physical deletion the row stays behind with `file_path` nulled and
/// `deleted_at` stamped.
#[derive(Clone)]
pub struct FileLifecycleRepository {
    pool: PgPool,
}

impl FileLifecycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_lifecycle", db.operation = "insert"))]
    pub async fn create(
        &self,
        recording_id: Uuid,
        file_path: &str,
        file_type: FileType,
        file_size: i64,
        deletion_scheduled_at: DateTime<Utc>,
        max_retries: i32,
    ) -> Result<FileLifecycleRecord, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            INSERT INTO file_lifecycle
                (recording_id, file_path, file_type, file_size, deletion_scheduled_at, max_retries)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .bind(file_path)
        .bind(file_type)
        .bind(file_size)
        .bind(deletion_scheduled_at)
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn get_by_recording(
        &self,
        recording_id: Uuid,
    ) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            "SELECT * FROM file_lifecycle WHERE recording_id = $1",
        )
        .bind(recording_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Mark the transcription as started. Runs inside the caller's
    /// transaction alongside the transcription insert.
    pub async fn mark_processing_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        recording_id: Uuid,
        transcription_id: Uuid,
    ) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            UPDATE file_lifecycle
            SET transcription_status = 'processing',
                transcription_id = $2,
                updated_at = NOW()
            WHERE recording_id = $1
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .bind(transcription_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Mark the transcription completed and collapse the deletion schedule to
    /// the grace window. The schedule only ever moves earlier.
    pub async fn mark_completed_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        recording_id: Uuid,
        grace_minutes: i64,
    ) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            UPDATE file_lifecycle
            SET transcription_status = 'completed',
                deletion_scheduled_at = LEAST(deletion_scheduled_at, NOW() + $2 * INTERVAL '1 minute'),
                updated_at = NOW()
            WHERE recording_id = $1
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .bind(grace_minutes)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Mark the transcription failed and consume one retry, in a single
    /// statement so concurrent failures cannot double-increment past the cap.
    /// Once the cap is hit the file can never be transcribed, so the deletion
    /// schedule collapses to now and the next sweep picks the file up.
    pub async fn mark_failed_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        recording_id: Uuid,
    ) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            UPDATE file_lifecycle
            SET transcription_status = 'failed',
                retry_count = LEAST(retry_count + 1, max_retries),
                deletion_scheduled_at = CASE
                    WHEN LEAST(retry_count + 1, max_retries) >= max_retries
                    THEN LEAST(deletion_scheduled_at, NOW())
                    ELSE deletion_scheduled_at
                END,
                updated_at = NOW()
            WHERE recording_id = $1
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Reserve a retry slot. The WHERE clause is the whole gate: only a
    /// failed record with budget left and a file still on disk matches, so
    /// two concurrent retry requests cannot both win.
    pub async fn claim_retry_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        recording_id: Uuid,
    ) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            UPDATE file_lifecycle
            SET transcription_status = 'pending',
                updated_at = NOW()
            WHERE recording_id = $1
              AND transcription_status = 'failed'
              AND retry_count < max_retries
              AND file_path IS NOT NULL
              AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Records whose file is still on disk and whose schedule has passed.
    pub async fn list_deletion_eligible(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileLifecycleRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            SELECT * FROM file_lifecycle
            WHERE file_path IS NOT NULL
              AND deleted_at IS NULL
              AND deletion_scheduled_at <= $1
            ORDER BY deletion_scheduled_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Record that the physical file is gone. Idempotent: a second call
    /// leaves the original `deleted_at` untouched.
    #[tracing::instrument(skip(self), fields(db.table = "file_lifecycle", db.operation = "update"))]
    pub async fn mark_deleted(&self, id: Uuid) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            UPDATE file_lifecycle
            SET file_path = NULL,
                deleted_at = COALESCE(deleted_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Immediate user-requested file deletion: pull the schedule to now so a
    /// crashed sweep can still pick the row up.
    #[tracing::instrument(skip(self), fields(db.table = "file_lifecycle", db.operation = "update"))]
    pub async fn schedule_immediate(
        &self,
        recording_id: Uuid,
    ) -> Result<Option<FileLifecycleRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileLifecycleRecord>(
            r#"
            UPDATE file_lifecycle
            SET deletion_scheduled_at = NOW(), updated_at = NOW()
            WHERE recording_id = $1 AND file_path IS NOT NULL AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
