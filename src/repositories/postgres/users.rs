use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{Result, map_unique_violation},
    models::{
        DEFAULT_AVATAR, DEFAULT_BACKGROUND, DEFAULT_DESCRIPTION, NewUser, ProfileUpdate, User,
        WatchedVideo,
    },
    repositories::UserRepository,
};

/// Escapes `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role,
                avatar, background, description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(DEFAULT_AVATAR)
        .bind(DEFAULT_BACKGROUND)
        .bind(DEFAULT_DESCRIPTION)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Email already exists!"))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<User>> {
        let pattern = format!("%{}%", escape_like(term));

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE name ILIKE $1
            ORDER BY name ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self, update))]
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                avatar = COALESCE($3, avatar),
                background = COALESCE($4, background),
                description = COALESCE($5, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.avatar)
        .bind(update.background)
        .bind(update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn record_watch(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        watch_time: Option<f64>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watch_history (id, user_id, video_id, watch_time, watched_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(video_id)
        .bind(watch_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn watch_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<WatchedVideo>> {
        let history = sqlx::query_as::<_, WatchedVideo>(
            r#"
            SELECT video_id, watch_time, watched_at
            FROM watch_history
            WHERE user_id = $1
            ORDER BY watched_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }
}
