use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{NewVideo, Page, Video, VideoType},
    repositories::VideoRepository,
};

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[instrument(skip(self, video), fields(owner_id = %video.owner_id))]
    async fn create(&self, video: NewVideo) -> Result<Video> {
        let now = Utc::now();

        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (
                id, title, description, video_url, is_public, owner_id,
                category_id, playlist_id, tags, thumbnail_url, published_at,
                allow_comments, video_type, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(video.is_public)
        .bind(video.owner_id)
        .bind(video.category_id)
        .bind(video.playlist_id)
        .bind(&video.tags)
        .bind(&video.thumbnail_url)
        .bind(now)
        .bind(video.allow_comments)
        .bind(video.video_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        include_private: bool,
        page: Page,
    ) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE owner_id = $1 AND (is_public OR $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(owner_id)
        .bind(include_private)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn count_by_owner(&self, owner_id: Uuid, include_private: bool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM videos WHERE owner_id = $1 AND (is_public OR $2)",
        )
        .bind(owner_id)
        .bind(include_private)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self, owner_ids), fields(owners = owner_ids.len()))]
    async fn list_public_by_owners(&self, owner_ids: &[Uuid]) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE owner_id = ANY($1) AND is_public
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn list_liked_by(
        &self,
        user_id: Uuid,
        video_type: Option<VideoType>,
    ) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT v.* FROM reactions r
            JOIN videos v ON v.id = r.video_id
            WHERE r.user_id = $1
              AND r.kind = 'like'
              AND ($2::video_type IS NULL OR v.video_type = $2)
            ORDER BY r.updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(video_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<bool> {
        // comments and reactions cascade
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE videos SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(views)
    }
}
