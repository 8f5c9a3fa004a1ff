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
    extractors::{AppJson, OptionalAppJson},
    handlers::parse_id,
    models::{CreateVideoRequest, RecordViewRequest},
    services::video_service,
};

const MISSING_VIDEO_ID: &str = "Missing parameter videoId";

pub async fn create_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let video = video_service::create_video(&state.repos, auth_user.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": video
        })),
    ))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Value>> {
    let video_id = parse_id(Some(&video_id), MISSING_VIDEO_ID)?;

    let video = video_service::get_video(&state.repos, video_id, auth_user.user_id()).await?;

    Ok(Json(json!({
        "success": true,
        "data": video
    })))
}

pub async fn delete_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<String>,
) -> Result<Json<Value>> {
    let video_id = parse_id(Some(&video_id), MISSING_VIDEO_ID)?;

    video_service::delete_video(&state.repos, auth_user.user_id, auth_user.role, video_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Video deleted successfully"
    })))
}

// The body is optional; a bare POST counts an anonymous view
pub async fn record_view(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    auth_user: OptionalAuthUser,
    OptionalAppJson(payload): OptionalAppJson<RecordViewRequest>,
) -> Result<Json<Value>> {
    let video_id = parse_id(Some(&video_id), MISSING_VIDEO_ID)?;
    let payload = payload.unwrap_or_default();

    let views = video_service::record_view(
        &state.repos,
        video_id,
        auth_user.user_id(),
        payload.watch_time,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "viewCount": views
    })))
}
