use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use voxpost_core::models::{Export, ExportFormat, PageQuery};
use voxpost_core::AppError;

/// Export repository
#[derive(Clone)]
pub struct ExportRepository {
    pool: PgPool,
}

impl ExportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert per (transcription, format): regenerating an export replaces
    /// the previous content instead of piling up rows.
    #[tracing::instrument(skip(self, content, metadata), fields(db.table = "exports", db.operation = "upsert"))]
    pub async fn upsert(
        &self,
        transcription_id: Uuid,
        user_id: Uuid,
        format: ExportFormat,
        content: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<Export, AppError> {
        let export = sqlx::query_as::<Postgres, Export>(
            r#"
            INSERT INTO exports (transcription_id, user_id, format, content, metadata)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (transcription_id, format)
            DO UPDATE SET content = EXCLUDED.content,
                          metadata = EXCLUDED.metadata,
                          updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(transcription_id)
        .bind(user_id)
        .bind(format)
        .bind(content)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(export)
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<Export>, AppError> {
        let export = sqlx::query_as::<Postgres, Export>(
            "SELECT * FROM exports WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(export)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        page: &PageQuery,
        format: Option<ExportFormat>,
        transcription_id: Option<Uuid>,
    ) -> Result<(Vec<Export>, i64), AppError> {
        let (limit, offset) = page.limit_offset();

        let exports = sqlx::query_as::<Postgres, Export>(
            r#"
            SELECT * FROM exports
            WHERE user_id = $1
              AND ($2::export_format IS NULL OR format = $2)
              AND ($3::uuid IS NULL OR transcription_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(format)
        .bind(transcription_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM exports
            WHERE user_id = $1
              AND ($2::export_format IS NULL OR format = $2)
              AND ($3::uuid IS NULL OR transcription_id = $3)
            "#,
        )
        .bind(user_id)
        .bind(format)
        .bind(transcription_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((exports, total.0))
    }
}
