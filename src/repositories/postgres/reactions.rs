use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{AppError, Result, map_unique_violation},
    models::{
        CommentReactionTally, Reaction, ReactionCounts, ReactionKind, ReactionTarget,
        ReactionTransition,
    },
    repositories::ReactionRepository,
};

const CHANGED_CONCURRENTLY: &str = "Reaction was changed concurrently, try again";

fn find_query(target: ReactionTarget) -> &'static str {
    match target {
        ReactionTarget::Video(_) => "SELECT * FROM reactions WHERE user_id = $1 AND video_id = $2",
        ReactionTarget::Comment(_) => {
            "SELECT * FROM reactions WHERE user_id = $1 AND comment_id = $2"
        }
    }
}

#[derive(Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: Uuid, target: ReactionTarget) -> Result<Option<Reaction>> {
        let reaction = sqlx::query_as::<_, Reaction>(find_query(target))
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(reaction)
    }

    #[instrument(skip(self))]
    async fn toggle(
        &self,
        user_id: Uuid,
        target: ReactionTarget,
        desired: ReactionKind,
    ) -> Result<Option<(ReactionTransition, ReactionCounts)>> {
        let mut transaction = self.pool.begin().await?;

        // the target row lock serializes toggles across server processes
        let lock_query = match target {
            ReactionTarget::Video(_) => "SELECT id FROM videos WHERE id = $1 FOR UPDATE",
            ReactionTarget::Comment(_) => "SELECT id FROM comments WHERE id = $1 FOR UPDATE",
        };
        let locked = sqlx::query_scalar::<_, Uuid>(lock_query)
            .bind(target.id())
            .fetch_optional(&mut *transaction)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let existing = sqlx::query_as::<_, Reaction>(find_query(target))
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&mut *transaction)
            .await?;

        let transition = ReactionTransition::decide(existing.as_ref().map(|r| r.kind), desired);

        let written = match (&existing, transition) {
            (None, ReactionTransition::Created(kind)) => {
                sqlx::query(
                    r#"
                    INSERT INTO reactions (id, user_id, video_id, comment_id, kind, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(target.video_id())
                .bind(target.comment_id())
                .bind(kind)
                .bind(Utc::now())
                .execute(&mut *transaction)
                .await
                .map_err(|e| map_unique_violation(e, CHANGED_CONCURRENTLY))?
                .rows_affected()
            }
            (Some(reaction), ReactionTransition::Removed(kind)) => {
                sqlx::query("DELETE FROM reactions WHERE id = $1 AND kind = $2")
                    .bind(reaction.id)
                    .bind(kind)
                    .execute(&mut *transaction)
                    .await?
                    .rows_affected()
            }
            (Some(reaction), ReactionTransition::Switched { from, to }) => {
                sqlx::query(
                    "UPDATE reactions SET kind = $3, updated_at = NOW() WHERE id = $1 AND kind = $2",
                )
                .bind(reaction.id)
                .bind(from)
                .bind(to)
                .execute(&mut *transaction)
                .await?
                .rows_affected()
            }
            _ => 0,
        };

        // dropping the transaction rolls it back
        if written != 1 {
            return Err(AppError::Conflict(CHANGED_CONCURRENTLY.to_string()));
        }

        let delta = transition.delta();
        let counter_query = match target {
            ReactionTarget::Video(_) => {
                r#"
                UPDATE videos
                SET like_count = GREATEST(like_count + $2, 0),
                    dislike_count = GREATEST(dislike_count + $3, 0),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING like_count, dislike_count
                "#
            }
            ReactionTarget::Comment(_) => {
                r#"
                UPDATE comments
                SET like_count = GREATEST(like_count + $2, 0),
                    dislike_count = GREATEST(dislike_count + $3, 0)
                WHERE id = $1
                RETURNING like_count, dislike_count
                "#
            }
        };
        let counts = sqlx::query_as::<_, ReactionCounts>(counter_query)
            .bind(target.id())
            .bind(delta.likes)
            .bind(delta.dislikes)
            .fetch_one(&mut *transaction)
            .await?;

        transaction.commit().await?;

        Ok(Some((transition, counts)))
    }

    #[instrument(skip(self))]
    async fn tally_comments_of_video(&self, video_id: Uuid) -> Result<Vec<CommentReactionTally>> {
        let tallies = sqlx::query_as::<_, CommentReactionTally>(
            r#"
            SELECT
                r.comment_id AS comment_id,
                COUNT(*) FILTER (WHERE r.kind = 'like') AS like_count,
                COUNT(*) FILTER (WHERE r.kind = 'dislike') AS dislike_count
            FROM reactions r
            JOIN comments c ON c.id = r.comment_id
            WHERE c.video_id = $1
            GROUP BY r.comment_id
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tallies)
    }
}
