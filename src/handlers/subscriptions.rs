use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    extractors::AppJson,
    handlers::parse_id,
    models::SubscriptionRequest,
    services::subscription_service,
};

const MISSING_CHANNEL_ID: &str = "Missing parameter channelId";

pub async fn subscribe(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<SubscriptionRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let channel_id = parse_id(payload.channel_id.as_deref(), MISSING_CHANNEL_ID)?;

    let subscription =
        subscription_service::subscribe(&state.repos, auth_user.user_id, channel_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Subscribed successfully",
            "data": subscription
        })),
    ))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<SubscriptionRequest>,
) -> Result<Json<Value>> {
    let channel_id = parse_id(payload.channel_id.as_deref(), MISSING_CHANNEL_ID)?;

    subscription_service::unsubscribe(&state.repos, auth_user.user_id, channel_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Unsubscribed successfully"
    })))
}

pub async fn list_channels(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let channels = subscription_service::channels(&state.repos, auth_user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": channels
    })))
}

pub async fn check_subscription(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>> {
    let channel_id = parse_id(Some(&channel_id), MISSING_CHANNEL_ID)?;

    let subscribed =
        subscription_service::is_subscribed(&state.repos, auth_user.user_id, channel_id).await?;

    Ok(Json(json!({
        "success": true,
        "subscribed": subscribed
    })))
}

pub async fn subscription_feed(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let videos = subscription_service::feed(&state.repos, auth_user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": videos
    })))
}
