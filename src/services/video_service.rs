use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{CreateVideoRequest, NewVideo, UserRole, Video},
    repositories::Repositories,
};

fn video_not_found() -> AppError {
    AppError::NotFound("Video not found.".to_string())
}

#[instrument(skip(repos, request), fields(title = %request.title))]
pub async fn create_video(
    repos: &Repositories,
    owner_id: Uuid,
    request: CreateVideoRequest,
) -> Result<Video> {
    if let Some(playlist_id) = request.playlist_id {
        let owned = repos
            .playlists
            .find_by_id(playlist_id)
            .await?
            .is_some_and(|playlist| playlist.writer_id == owner_id);
        if !owned {
            return Err(AppError::BadRequest("Playlist not found".to_string()));
        }
    }

    let video = repos
        .videos
        .create(NewVideo {
            owner_id,
            title: request.title.trim().to_string(),
            description: request.description,
            video_url: request.video_url,
            is_public: request.is_public.unwrap_or(true),
            video_type: request.video_type,
            category_id: request.category_id,
            playlist_id: request.playlist_id,
            tags: request.tags,
            thumbnail_url: request.thumbnail_url,
            allow_comments: request.allow_comments.unwrap_or(true),
        })
        .await?;

    info!(video_id = %video.id, owner_id = %owner_id, "Video created");
    Ok(video)
}

/// Private videos are only visible to their owner.
#[instrument(skip(repos))]
pub async fn get_video(repos: &Repositories, video_id: Uuid, viewer: Option<Uuid>) -> Result<Video> {
    repos
        .videos
        .find_by_id(video_id)
        .await?
        .filter(|video| video.visible_to(viewer))
        .ok_or_else(video_not_found)
}

#[instrument(skip(repos))]
pub async fn delete_video(
    repos: &Repositories,
    user_id: Uuid,
    role: UserRole,
    video_id: Uuid,
) -> Result<()> {
    let video = repos
        .videos
        .find_by_id(video_id)
        .await?
        .ok_or_else(video_not_found)?;

    if video.owner_id != user_id && role != UserRole::Admin {
        return Err(AppError::Authorization(
            "User unauthorized to delete this video".to_string(),
        ));
    }

    if !repos.videos.delete(video_id).await? {
        return Err(video_not_found());
    }

    info!(video_id = %video_id, "Video deleted");
    Ok(())
}

/// Counts a view and, for a signed-in viewer, records it in their history.
#[instrument(skip(repos))]
pub async fn record_view(
    repos: &Repositories,
    video_id: Uuid,
    viewer: Option<Uuid>,
    watch_time: Option<f64>,
) -> Result<i64> {
    get_video(repos, video_id, viewer).await?;

    let views = repos
        .videos
        .increment_views(video_id)
        .await?
        .ok_or_else(video_not_found)?;

    if let Some(user_id) = viewer {
        repos.users.record_watch(user_id, video_id, watch_time).await?;
    }

    Ok(views)
}
