use axum::{extract::State, http::StatusCode, response::Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, TOKEN_COOKIE},
    error::Result,
    extractors::AppJson,
    models::{LoginRequest, RegisterRequest, UserResponse},
    services::user_service,
};

fn token_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.config.token_ttl_hours))
        .build()
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let issued = user_service::register(
        &state.repos,
        state.sessions.as_ref(),
        &state.config,
        payload,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Register success!",
            "token": issued.token
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<Value>)> {
    payload.validate()?;

    let issued =
        user_service::login(&state.repos, state.sessions.as_ref(), &state.config, payload).await?;

    let jar = jar.add(token_cookie(&state, issued.token.clone()));

    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login success!",
            "token": issued.token,
            "data": UserResponse::from(issued.user)
        })),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>)> {
    user_service::logout(state.sessions.as_ref(), &auth_user.jti).await?;

    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));

    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Logout successful!"
        })),
    ))
}

pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> Result<Json<Value>> {
    let (user, watched_videos) = user_service::profile(&state.repos, auth_user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserResponse::from(user),
        "watchedVideos": watched_videos
    })))
}
