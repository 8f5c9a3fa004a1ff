use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_AVATAR: &str =
    "https://res.cloudinary.com/dkbothcn5/image/upload/v1727074201/images.jpg";
pub const DEFAULT_BACKGROUND: &str =
    "https://res.cloudinary.com/dkbothcn5/image/upload/v1727019261/background.jpg";
pub const DEFAULT_DESCRIPTION: &str = "This is the user description.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub avatar: String,
    pub background: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideo {
    pub video_id: Uuid,
    pub watch_time: Option<f64>,
    pub watched_at: DateTime<Utc>,
}

/// Row handed to the user repository at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Missing parameters!"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please fill a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing parameters!"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing parameters!"))]
    pub password: String,
}

/// Public projection of a user, as returned by login and `/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: String,
    pub background: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            avatar: user.avatar,
            background: user.background,
            description: user.description,
            created_at: user.created_at,
        }
    }
}

/// Channel projection used by subscription listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChannelSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub email: String,
    pub description: String,
}

impl From<&User> for ChannelSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            email: user.email.clone(),
            description: user.description.clone(),
        }
    }
}
