use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "video_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Short,
    Long,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub is_public: bool,
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
    pub playlist_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub allow_comments: bool,
    pub video_type: VideoType,
    pub like_count: i32,
    pub dislike_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn visible_to(&self, viewer_id: Option<Uuid>) -> bool {
        self.is_public || viewer_id == Some(self.owner_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub is_public: bool,
    pub video_type: VideoType,
    pub category_id: Option<Uuid>,
    pub playlist_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub allow_comments: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(url(message = "A valid video URL is required"))]
    pub video_url: String,
    pub is_public: Option<bool>,
    pub video_type: VideoType,
    pub category_id: Option<Uuid>,
    pub playlist_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub allow_comments: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordViewRequest {
    pub watch_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideosQuery {
    pub video_type: Option<VideoType>,
}
