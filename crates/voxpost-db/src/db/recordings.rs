use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use voxpost_core::models::{PageQuery, Recording, RecordingStatus};
use voxpost_core::AppError;

/// Recording repository
///
/// All lookups are scoped by `user_id`; a recording owned by someone else is
/// indistinguishable from a missing one.
#[derive(Clone)]
pub struct RecordingRepository {
    pool: PgPool,
}

impl RecordingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "insert"))]
    pub async fn create(
        &self,
        user_id: Uuid,
        title: &str,
        file_name: &str,
        file_size: i64,
        format: &str,
    ) -> Result<Recording, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            r#"
            INSERT INTO recordings (user_id, title, file_name, file_size, format, status)
            VALUES ($1, $2, $3, $4, $5, 'uploading')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(file_name)
        .bind(file_size)
        .bind(format)
        .fetch_one(&self.pool)
        .await?;

        Ok(recording)
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            "SELECT * FROM recordings WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    /// Unscoped lookup for internal workers.
    pub async fn get_any(&self, id: Uuid) -> Result<Option<Recording>, AppError> {
        let recording =
            sqlx::query_as::<Postgres, Recording>("SELECT * FROM recordings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(recording)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        page: &PageQuery,
        status: Option<RecordingStatus>,
    ) -> Result<(Vec<Recording>, i64), AppError> {
        let (limit, offset) = page.limit_offset();

        let recordings = sqlx::query_as::<Postgres, Recording>(
            r#"
            SELECT * FROM recordings
            WHERE user_id = $1 AND ($2::recording_status IS NULL OR status = $2)
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
            SELECT COUNT(*) FROM recordings
            WHERE user_id = $1 AND ($2::recording_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((recordings, total.0))
    }

    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "update"))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: RecordingStatus,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            r#"
            UPDATE recordings
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "update"))]
    pub async fn update_title(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: &str,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            r#"
            UPDATE recordings
            SET title = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    /// Delete the row. The lifecycle row goes with it via ON DELETE CASCADE;
    /// callers must remove the physical file first.
    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "delete"))]
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recordings WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
