use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Comment, NewComment, ThreadComment},
    repositories::CommentRepository,
};

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    #[instrument(skip(self, comment), fields(video_id = %comment.video_id))]
    async fn create(&self, comment: NewComment) -> Result<Comment> {
        let now = Utc::now();
        let mut transaction = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, user_id, video_id, parent_id, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(comment.user_id)
        .bind(comment.video_id)
        .bind(comment.parent_id)
        .bind(&comment.comment)
        .bind(now)
        .fetch_one(&mut *transaction)
        .await?;

        sqlx::query("UPDATE videos SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.video_id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        Ok(comment)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    #[instrument(skip(self, text))]
    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET comment = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    #[instrument(skip(self))]
    async fn delete_subtree(&self, id: Uuid) -> Result<u64> {
        let mut transaction = self.pool.begin().await?;

        let video_id =
            sqlx::query_scalar::<_, Uuid>("SELECT video_id FROM comments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *transaction)
                .await?;
        let Some(video_id) = video_id else {
            return Ok(0);
        };

        // reactions on the removed comments cascade
        let removed = sqlx::query(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM comments WHERE id = $1
                UNION ALL
                SELECT c.id FROM comments c
                JOIN subtree s ON c.parent_id = s.id
            )
            DELETE FROM comments WHERE id IN (SELECT id FROM subtree)
            "#,
        )
        .bind(id)
        .execute(&mut *transaction)
        .await?
        .rows_affected();

        sqlx::query(
            "UPDATE videos SET comment_count = GREATEST(comment_count - $2, 0) WHERE id = $1",
        )
        .bind(video_id)
        .bind(i64::try_from(removed).unwrap_or(i64::MAX))
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn list_thread(&self, video_id: Uuid) -> Result<Vec<ThreadComment>> {
        let rows = sqlx::query_as::<_, ThreadComment>(
            r#"
            SELECT
                c.id, c.video_id, c.parent_id, c.comment, c.created_at, c.updated_at,
                u.id AS author_id, u.name AS author_name, u.avatar AS author_avatar
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.video_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn count_by_video(&self, video_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE video_id = $1")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
