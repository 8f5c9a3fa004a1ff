use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{PageQuery, User};

/// Public profile of a channel with its headline numbers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub background: String,
    pub description: String,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ChannelInfo {
    pub fn new(user: User, subscriber_count: i64, video_count: i64) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            background: user.background,
            description: user.description,
            subscriber_count,
            video_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChannelSearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// Profile fields a channel owner may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
    #[validate(url(message = "Background must be a valid URL"))]
    pub background: Option<String>,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.avatar.is_none()
            && self.background.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub writer_id: Uuid,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub writer_id: Uuid,
    pub title: String,
    pub description: String,
    pub is_public: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub is_public: Option<bool>,
}

/// Playlist row joined with its writer and the ids of its videos.
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub writer_id: Uuid,
    pub writer_name: String,
    pub videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistWriter {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub writer: PlaylistWriter,
    pub videos: Vec<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlaylistRow> for PlaylistView {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            writer: PlaylistWriter {
                id: row.writer_id,
                name: row.writer_name,
            },
            videos: row.videos,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistQuery {
    pub is_public: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PlaylistQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
