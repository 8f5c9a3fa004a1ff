use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub video_id: Uuid,
    #[serde(rename = "parent_id")]
    pub parent_id: Option<Uuid>,
    pub comment: String,
    pub like_count: i32,
    pub dislike_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub comment: String,
}

/// Comment row joined with its author projection, as read for thread assembly.
#[derive(Debug, Clone, FromRow)]
pub struct ThreadComment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar: String,
}

// Create / reply / update share the same body
#[derive(Debug, Deserialize, Validate)]
pub struct CommentTextRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 10000, message = "Missing parameter comment text"))]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

// Nested node of a reply forest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: Uuid,
    pub comment: String,
    pub user: CommentAuthor,
    #[serde(rename = "parent_id")]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub dislike_count: i64,
    #[serde(rename = "is_owner")]
    pub is_owner: bool,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        let mut len = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            len += 1;
            stack.extend(node.replies.iter());
        }
        len
    }
}

#[derive(Debug, Serialize)]
pub struct CommentThread {
    pub comments: Vec<CommentNode>,
    pub total_comments: i64,
}
