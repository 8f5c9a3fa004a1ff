//! Storage seams.
//!
//! One trait per aggregate, each implemented for PostgreSQL and for an
//! in-process store used by the test suite.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        ChannelSummary, Comment, CommentReactionTally, NewComment, NewPlaylist, NewUser,
        NewVideo, Page, Playlist, PlaylistRow, ProfileUpdate, Reaction, ReactionCounts,
        ReactionKind, ReactionTarget, ReactionTransition, Subscription, ThreadComment, User,
        Video, VideoType, WatchedVideo,
    },
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Case-insensitive substring match on the name, ordered by name.
    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<User>>;

    /// `None` when the user does not exist.
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>>;

    async fn record_watch(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        watch_time: Option<f64>,
    ) -> Result<()>;

    /// Most recent first.
    async fn watch_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<WatchedVideo>>;
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, video: NewVideo) -> Result<Video>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>>;

    /// Newest first. Private videos only when `include_private` is set.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        include_private: bool,
        page: Page,
    ) -> Result<Vec<Video>>;

    async fn count_by_owner(&self, owner_id: Uuid, include_private: bool) -> Result<i64>;

    /// Public videos of any of the given owners, newest first.
    async fn list_public_by_owners(&self, owner_ids: &[Uuid]) -> Result<Vec<Video>>;

    /// Videos the user currently likes, optionally filtered by type.
    async fn list_liked_by(&self, user_id: Uuid, video_type: Option<VideoType>)
    -> Result<Vec<Video>>;

    /// Removes the video with its comments and every reaction on either.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Inserts the comment and bumps the video's `comment_count` in the same
    /// transaction.
    async fn create(&self, comment: NewComment) -> Result<Comment>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>>;

    /// Deletes the comment, every reply beneath it and their reactions, and
    /// lowers the video's `comment_count` by the same amount, atomically.
    /// Returns how many comments were removed.
    async fn delete_subtree(&self, id: Uuid) -> Result<u64>;

    /// Every comment of a video joined with its author, ordered by
    /// `(created_at, id)`.
    async fn list_thread(&self, video_id: Uuid) -> Result<Vec<ThreadComment>>;

    async fn count_by_video(&self, video_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, target: ReactionTarget) -> Result<Option<Reaction>>;

    /// Toggles the user's reaction on `target` towards `desired` and moves the
    /// target's counters by the matching delta (floored at zero). The row
    /// write and the counter update commit together. `None` when the target
    /// does not exist.
    async fn toggle(
        &self,
        user_id: Uuid,
        target: ReactionTarget,
        desired: ReactionKind,
    ) -> Result<Option<(ReactionTransition, ReactionCounts)>>;

    /// Like/dislike tallies for every reacted comment of a video.
    async fn tally_comments_of_video(&self, video_id: Uuid) -> Result<Vec<CommentReactionTally>>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Fails with `Conflict` when the pair already exists.
    async fn create(&self, user_id: Uuid, channel_id: Uuid) -> Result<Subscription>;

    async fn delete(&self, user_id: Uuid, channel_id: Uuid) -> Result<bool>;

    async fn exists(&self, user_id: Uuid, channel_id: Uuid) -> Result<bool>;

    async fn channel_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    async fn list_channels(&self, user_id: Uuid) -> Result<Vec<ChannelSummary>>;

    async fn count_subscribers(&self, channel_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn create(&self, playlist: NewPlaylist) -> Result<Playlist>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Playlist>>;

    /// Playlists of a writer with the given visibility, newest first.
    async fn list_by_writer(
        &self,
        writer_id: Uuid,
        is_public: bool,
        page: Page,
    ) -> Result<Vec<PlaylistRow>>;

    async fn count_by_writer(&self, writer_id: Uuid, is_public: bool) -> Result<i64>;
}

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub videos: Arc<dyn VideoRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            videos: Arc::new(postgres::PgVideoRepository::new(pool.clone())),
            comments: Arc::new(postgres::PgCommentRepository::new(pool.clone())),
            reactions: Arc::new(postgres::PgReactionRepository::new(pool.clone())),
            subscriptions: Arc::new(postgres::PgSubscriptionRepository::new(pool.clone())),
            playlists: Arc::new(postgres::PgPlaylistRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            users: Arc::new(store.clone()),
            videos: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            reactions: Arc::new(store.clone()),
            subscriptions: Arc::new(store.clone()),
            playlists: Arc::new(store),
        }
    }
}

/// Indexes tallies by comment id.
pub fn tallies_by_comment(
    tallies: Vec<CommentReactionTally>,
) -> HashMap<Uuid, CommentReactionTally> {
    tallies.into_iter().map(|t| (t.comment_id, t)).collect()
}
