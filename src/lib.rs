pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod locks;
pub mod models;
pub mod redis;
pub mod repositories;
pub mod services;
pub mod session;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config, repositories::Repositories, services::reaction_service::ReactionLocks,
    session::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub sessions: Arc<dyn SessionStore>,
    pub reaction_locks: Arc<ReactionLocks>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repos: Repositories, sessions: Arc<dyn SessionStore>, config: Config) -> Self {
        Self {
            repos,
            sessions,
            reaction_locks: Arc::new(ReactionLocks::new()),
            config: Arc::new(config),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me));

    let like_routes = Router::new()
        .route("/like", post(handlers::likes::like_video))
        .route("/dislike", post(handlers::likes::dislike_video))
        .route("/check-like/{id}", get(handlers::likes::check_like))
        .route("/check-dislike/{id}", get(handlers::likes::check_dislike))
        .route("/like-comment", post(handlers::likes::like_comment))
        .route("/dislike-comment", post(handlers::likes::dislike_comment))
        .route(
            "/check-like-comment/{id}",
            get(handlers::likes::check_comment_reaction),
        )
        .route("/video-like", get(handlers::likes::liked_videos));

    // `{id}` is a video id for GET/POST and a comment id for PUT/DELETE
    let comment_routes = Router::new()
        .route(
            "/{id}",
            get(handlers::comments::get_comments)
                .post(handlers::comments::create_comment)
                .put(handlers::comments::update_comment)
                .delete(handlers::comments::delete_comment),
        )
        .route("/{id}/replies", get(handlers::comments::get_replies))
        .route("/{id}/reply", post(handlers::comments::reply_comment));

    let video_routes = Router::new()
        .route("/", post(handlers::videos::create_video))
        .route(
            "/{id}",
            get(handlers::videos::get_video).delete(handlers::videos::delete_video),
        )
        .route("/{id}/view", post(handlers::videos::record_view));

    let channel_routes = Router::new()
        .route("/search", get(handlers::channels::search_channels))
        .route("/playlist", post(handlers::channels::create_playlist))
        .route(
            "/{id}",
            get(handlers::channels::get_channel).put(handlers::channels::update_channel),
        )
        .route("/video/{id}", get(handlers::channels::channel_videos))
        .route("/playlist/{id}", get(handlers::channels::channel_playlists));

    let subscription_routes = Router::new()
        .route(
            "/",
            get(handlers::subscriptions::list_channels)
                .post(handlers::subscriptions::subscribe)
                .delete(handlers::subscriptions::unsubscribe),
        )
        .route(
            "/check/{channel_id}",
            get(handlers::subscriptions::check_subscription),
        )
        .route("/videos", get(handlers::subscriptions::subscription_feed));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/likes", like_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/videos", video_routes)
        .nest("/api/channels", channel_routes)
        .nest("/api/subscriptions", subscription_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
