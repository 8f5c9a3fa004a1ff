use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{NewPlaylist, Page, Playlist, PlaylistRow},
    repositories::PlaylistRepository,
};

#[derive(Clone)]
pub struct PgPlaylistRepository {
    pool: PgPool,
}

impl PgPlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaylistRepository for PgPlaylistRepository {
    #[instrument(skip(self, playlist), fields(writer_id = %playlist.writer_id))]
    async fn create(&self, playlist: NewPlaylist) -> Result<Playlist> {
        let playlist = sqlx::query_as::<_, Playlist>(
            r#"
            INSERT INTO playlists (id, writer_id, title, description, is_public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(playlist.writer_id)
        .bind(&playlist.title)
        .bind(&playlist.description)
        .bind(playlist.is_public)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(playlist)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Playlist>> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    #[instrument(skip(self))]
    async fn list_by_writer(
        &self,
        writer_id: Uuid,
        is_public: bool,
        page: Page,
    ) -> Result<Vec<PlaylistRow>> {
        let rows = sqlx::query_as::<_, PlaylistRow>(
            r#"
            SELECT
                p.id, p.title, p.description, p.is_public, p.created_at, p.updated_at,
                u.id AS writer_id, u.name AS writer_name,
                COALESCE(
                    ARRAY_AGG(v.id ORDER BY v.created_at, v.id) FILTER (WHERE v.id IS NOT NULL),
                    '{}'
                ) AS videos
            FROM playlists p
            JOIN users u ON u.id = p.writer_id
            LEFT JOIN videos v ON v.playlist_id = p.id
            WHERE p.writer_id = $1 AND p.is_public = $2
            GROUP BY p.id, u.id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(writer_id)
        .bind(is_public)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn count_by_writer(&self, writer_id: Uuid, is_public: bool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM playlists WHERE writer_id = $1 AND is_public = $2",
        )
        .bind(writer_id)
        .bind(is_public)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
