use uuid::Uuid;

use crate::{
    models::{NewUser, NewVideo, User, UserRole, Video, VideoType},
    repositories::Repositories,
};

pub async fn user(repos: &Repositories, name: &str) -> User {
    repos
        .users
        .create(NewUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        })
        .await
        .unwrap()
}

pub async fn video(repos: &Repositories, owner_id: Uuid, allow_comments: bool) -> Video {
    repos
        .videos
        .create(NewVideo {
            owner_id,
            title: "Launch day".to_string(),
            description: "walkthrough".to_string(),
            video_url: "https://cdn.example.com/launch.mp4".to_string(),
            is_public: true,
            video_type: VideoType::Long,
            category_id: None,
            playlist_id: None,
            tags: vec!["launch".to_string()],
            thumbnail_url: None,
            allow_comments,
        })
        .await
        .unwrap()
}
