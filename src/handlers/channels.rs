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
    extractors::{AppJson, AppQuery},
    handlers::parse_id,
    models::{ChannelSearchQuery, CreatePlaylistRequest, PageQuery, PlaylistQuery, ProfileUpdate},
    services::channel_service,
};

const MISSING_CHANNEL_ID: &str = "Missing parameter channelId";
const VIDEOS_PER_PAGE: i64 = 4;
const PLAYLISTS_PER_PAGE: i64 = 12;

pub async fn search_channels(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ChannelSearchQuery>,
) -> Result<Json<Value>> {
    let channels =
        channel_service::search(&state.repos, params.q.as_deref(), params.limit).await?;

    Ok(Json(json!({
        "success": true,
        "data": channels
    })))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>> {
    let channel_id = parse_id(Some(&channel_id), MISSING_CHANNEL_ID)?;

    let channel = channel_service::channel_info(&state.repos, channel_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": channel
    })))
}

pub async fn update_channel(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(channel_id): Path<String>,
    AppJson(payload): AppJson<ProfileUpdate>,
) -> Result<Json<Value>> {
    let channel_id = parse_id(Some(&channel_id), MISSING_CHANNEL_ID)?;
    payload.validate()?;

    let user = channel_service::update_channel(
        &state.repos,
        auth_user.user_id,
        auth_user.role,
        channel_id,
        payload,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Channel updated successfully",
        "data": user
    })))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    auth_user: OptionalAuthUser,
    AppQuery(params): AppQuery<PageQuery>,
) -> Result<Json<Value>> {
    let channel_id = parse_id(Some(&channel_id), MISSING_CHANNEL_ID)?;
    let page = params.resolve(VIDEOS_PER_PAGE);

    let videos =
        channel_service::channel_videos(&state.repos, channel_id, auth_user.user_id(), page)
            .await?;

    Ok(Json(json!({
        "success": true,
        "videos": videos.items,
        "totalPage": videos.total_page,
        "total": videos.total
    })))
}

pub async fn channel_playlists(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    auth_user: OptionalAuthUser,
    AppQuery(params): AppQuery<PlaylistQuery>,
) -> Result<Json<Value>> {
    let channel_id = parse_id(Some(&channel_id), MISSING_CHANNEL_ID)?;
    let page = params.page_query().resolve(PLAYLISTS_PER_PAGE);

    let playlists = channel_service::channel_playlists(
        &state.repos,
        channel_id,
        auth_user.user_id(),
        params.is_public.unwrap_or(true),
        page,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "playlists": playlists.items,
        "totalPage": playlists.total_page,
        "total": playlists.total
    })))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let playlist =
        channel_service::create_playlist(&state.repos, auth_user.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": playlist
        })),
    ))
}
