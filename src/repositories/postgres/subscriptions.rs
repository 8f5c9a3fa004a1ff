use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{Result, map_unique_violation},
    models::{ChannelSummary, Subscription},
    repositories::SubscriptionRepository,
};

#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    #[instrument(skip(self))]
    async fn create(&self, user_id: Uuid, channel_id: Uuid) -> Result<Subscription> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, channel_id, created_at)
            VALUES ($1, $2, NOW())
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Already subscribed to this channel"))
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND channel_id = $2")
                .bind(user_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn exists(&self, user_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND channel_id = $2)",
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn channel_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT channel_id FROM subscriptions WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn list_channels(&self, user_id: Uuid) -> Result<Vec<ChannelSummary>> {
        let channels = sqlx::query_as::<_, ChannelSummary>(
            r#"
            SELECT u.id, u.name, u.avatar, u.email, u.description
            FROM subscriptions s
            JOIN users u ON u.id = s.channel_id
            WHERE s.user_id = $1
            ORDER BY s.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    #[instrument(skip(self))]
    async fn count_subscribers(&self, channel_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
