use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use voxpost_core::models::{SubscriptionStatus, SubscriptionTier, User};
use voxpost_core::AppError;

/// User repository
///
/// Users are mirrored from the external identity provider. `upsert` runs on
/// every authenticated request so the local row tracks the latest email.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "upsert"))]
    pub async fn upsert(&self, external_user_id: &str, email: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (external_user_id, email)
            VALUES ($1, $2)
            ON CONFLICT (external_user_id)
            DO UPDATE SET email = EXCLUDED.email, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(external_user_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_external_id(&self, external_user_id: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE external_user_id = $1")
                .bind(external_user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Apply a billing event from the payment provider webhook.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update"))]
    pub async fn update_subscription(
        &self,
        external_user_id: &str,
        tier: SubscriptionTier,
        status: SubscriptionStatus,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            UPDATE users
            SET subscription_tier = $2, subscription_status = $3, updated_at = NOW()
            WHERE external_user_id = $1
            RETURNING *
            "#,
        )
        .bind(external_user_id)
        .bind(tier)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
