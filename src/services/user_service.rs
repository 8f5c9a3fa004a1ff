use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{Claims, hash_password, verify_password},
    config::Config,
    error::{AppError, Result},
    models::{LoginRequest, NewUser, RegisterRequest, User, UserRole, WatchedVideo},
    repositories::Repositories,
    session::SessionStore,
};

const WATCH_HISTORY_LIMIT: i64 = 50;

/// A signed token bound to a live session.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub user: User,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn issue_token(sessions: &dyn SessionStore, config: &Config, user: User) -> Result<IssuedToken> {
    let (token, claims) = Claims::new(
        user.id,
        user.role,
        &config.jwt_secret,
        config.token_ttl_hours,
    )?;

    sessions
        .store_session(&claims.jti, &user.id.to_string(), config.token_ttl_seconds())
        .await?;

    Ok(IssuedToken { token, user })
}

#[instrument(skip(repos, sessions, config, request), fields(email = %request.email))]
pub async fn register(
    repos: &Repositories,
    sessions: &dyn SessionStore,
    config: &Config,
    request: RegisterRequest,
) -> Result<IssuedToken> {
    let email = normalize_email(&request.email);

    if repos.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email already exists!".to_string()));
    }

    let password_hash = hash_password(&request.password, config.bcrypt_cost)?;

    let user = repos
        .users
        .create(NewUser {
            name: request.name.trim().to_string(),
            email,
            password_hash,
            role: UserRole::User,
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::BadRequest("Email already exists!".to_string()),
            other => other,
        })?;

    info!(user_id = %user.id, "User registered");
    issue_token(sessions, config, user).await
}

#[instrument(skip(repos, sessions, config, request), fields(email = %request.email))]
pub async fn login(
    repos: &Repositories,
    sessions: &dyn SessionStore,
    config: &Config,
    request: LoginRequest,
) -> Result<IssuedToken> {
    let user = repos
        .users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| AppError::BadRequest("User not exists!".to_string()))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Password is incorrect!".to_string()));
    }

    info!(user_id = %user.id, "User logged in");
    issue_token(sessions, config, user).await
}

pub async fn logout(sessions: &dyn SessionStore, jti: &str) -> Result<()> {
    sessions.delete_session(jti).await
}

/// The user with the most recent entries of their watch history.
#[instrument(skip(repos))]
pub async fn profile(repos: &Repositories, user_id: Uuid) -> Result<(User, Vec<WatchedVideo>)> {
    let user = repos
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found!".to_string()))?;

    let history = repos
        .users
        .watch_history(user_id, WATCH_HISTORY_LIMIT)
        .await?;

    Ok((user, history))
}
