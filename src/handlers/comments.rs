use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::Result,
    extractors::AppJson,
    handlers::parse_id,
    models::CommentTextRequest,
    services::comment_service,
};

pub async fn get_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Value>> {
    let video_id = parse_id(Some(&video_id), "Missing parameter videoId")?;

    let thread = comment_service::list_comments(&state.repos, video_id, auth_user.user_id()).await?;

    Ok(Json(json!({
        "success": true,
        "data": thread.comments,
        "totalComments": thread.total_comments
    })))
}

pub async fn get_replies(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Value>> {
    let comment_id = parse_id(Some(&comment_id), "Missing parameter commentId")?;

    let replies =
        comment_service::build_reply_tree(&state.repos, comment_id, auth_user.user_id()).await?;

    Ok(Json(json!({
        "success": true,
        "data": replies
    })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<String>,
    AppJson(payload): AppJson<CommentTextRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let video_id = parse_id(Some(&video_id), "Missing parameter videoId")?;
    payload.validate()?;

    let comment =
        comment_service::create_comment(&state.repos, auth_user.user_id, video_id, &payload.comment)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "comment": comment
        })),
    ))
}

pub async fn reply_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<String>,
    AppJson(payload): AppJson<CommentTextRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let parent_id = parse_id(Some(&comment_id), "Missing parameter parent comment ID")?;
    payload.validate()?;

    let reply =
        comment_service::reply_comment(&state.repos, auth_user.user_id, parent_id, &payload.comment)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "reply": reply
        })),
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<String>,
    AppJson(payload): AppJson<CommentTextRequest>,
) -> Result<Json<Value>> {
    let comment_id = parse_id(Some(&comment_id), "Missing parameter commentId")?;
    payload.validate()?;

    let comment = comment_service::update_comment(
        &state.repos,
        auth_user.user_id,
        comment_id,
        &payload.comment,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment updated successfully",
        "comment": comment
    })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>> {
    let comment_id = parse_id(Some(&comment_id), "Missing parameter commentId")?;

    comment_service::delete_comment(&state.repos, auth_user.user_id, comment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
