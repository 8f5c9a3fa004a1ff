use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    extractors::{AppJson, AppQuery},
    handlers::parse_id,
    models::{
        CommentReactionRequest, LikedVideosQuery, ReactionKind, ReactionTarget,
        VideoReactionRequest,
    },
    services::reaction_service,
};

const MISSING_VIDEO_ID: &str = "Video ID and User ID are required.";
const MISSING_COMMENT_ID: &str = "Comment ID and User ID are required.";

async fn react_to_video(
    state: &AppState,
    auth_user: &AuthUser,
    payload: VideoReactionRequest,
    kind: ReactionKind,
) -> Result<Json<Value>> {
    let video_id = parse_id(payload.video_id.as_deref(), MISSING_VIDEO_ID)?;

    let outcome = reaction_service::apply_reaction(
        &state.repos,
        &state.reaction_locks,
        auth_user.user_id,
        ReactionTarget::Video(video_id),
        kind,
    )
    .await?;

    let message = match kind {
        ReactionKind::Like => "Video liked successfully.",
        ReactionKind::Dislike => "Video disliked successfully.",
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "likeCount": outcome.counts.like_count,
        "dislikeCount": outcome.counts.dislike_count
    })))
}

async fn react_to_comment(
    state: &AppState,
    auth_user: &AuthUser,
    payload: CommentReactionRequest,
    kind: ReactionKind,
) -> Result<Json<Value>> {
    let comment_id = parse_id(payload.comment_id.as_deref(), MISSING_COMMENT_ID)?;

    let outcome = reaction_service::apply_reaction(
        &state.repos,
        &state.reaction_locks,
        auth_user.user_id,
        ReactionTarget::Comment(comment_id),
        kind,
    )
    .await?;

    let message = match kind {
        ReactionKind::Like => "Comment liked successfully.",
        ReactionKind::Dislike => "Comment disliked successfully.",
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "commentId": comment_id,
        "likeCount": outcome.counts.like_count,
        "dislikeCount": outcome.counts.dislike_count
    })))
}

pub async fn like_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<VideoReactionRequest>,
) -> Result<Json<Value>> {
    react_to_video(&state, &auth_user, payload, ReactionKind::Like).await
}

pub async fn dislike_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<VideoReactionRequest>,
) -> Result<Json<Value>> {
    react_to_video(&state, &auth_user, payload, ReactionKind::Dislike).await
}

pub async fn like_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CommentReactionRequest>,
) -> Result<Json<Value>> {
    react_to_comment(&state, &auth_user, payload, ReactionKind::Like).await
}

pub async fn dislike_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CommentReactionRequest>,
) -> Result<Json<Value>> {
    react_to_comment(&state, &auth_user, payload, ReactionKind::Dislike).await
}

pub async fn check_like(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<String>,
) -> Result<Json<Value>> {
    let video_id = parse_id(Some(&video_id), MISSING_VIDEO_ID)?;
    let status = reaction_service::reaction_status(
        &state.repos,
        auth_user.user_id,
        ReactionTarget::Video(video_id),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "isLiked": status == Some(ReactionKind::Like)
    })))
}

pub async fn check_dislike(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<String>,
) -> Result<Json<Value>> {
    let video_id = parse_id(Some(&video_id), MISSING_VIDEO_ID)?;
    let status = reaction_service::reaction_status(
        &state.repos,
        auth_user.user_id,
        ReactionTarget::Video(video_id),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "isDisliked": status == Some(ReactionKind::Dislike)
    })))
}

pub async fn check_comment_reaction(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>> {
    let comment_id = parse_id(Some(&comment_id), MISSING_COMMENT_ID)?;
    let status = reaction_service::reaction_status(
        &state.repos,
        auth_user.user_id,
        ReactionTarget::Comment(comment_id),
    )
    .await?;

    let message = if status.is_some() {
        "Like status retrieved successfully."
    } else {
        "User has not liked or disliked this comment."
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "status": status
    })))
}

pub async fn liked_videos(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppQuery(params): AppQuery<LikedVideosQuery>,
) -> Result<Json<Value>> {
    let videos =
        reaction_service::liked_videos(&state.repos, auth_user.user_id, params.video_type).await?;

    Ok(Json(json!({
        "success": true,
        "data": videos
    })))
}
