//! In-process store backing every repository trait.
//!
//! Enforces the same uniqueness rules and cascades as the PostgreSQL schema.
//! Rows live in insertion order; sorts are stable so ties keep that order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        ChannelSummary, Comment, CommentReactionTally, DEFAULT_AVATAR, DEFAULT_BACKGROUND,
        DEFAULT_DESCRIPTION, NewComment, NewPlaylist, NewUser, NewVideo, Page, Playlist,
        PlaylistRow, ProfileUpdate, Reaction, ReactionCounts, ReactionKind, ReactionTarget,
        ReactionTransition, Subscription, ThreadComment, User, Video, VideoType, WatchedVideo,
    },
    repositories::{
        CommentRepository, PlaylistRepository, ReactionRepository, SubscriptionRepository,
        UserRepository, VideoRepository,
    },
};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    watch_history: Vec<(Uuid, WatchedVideo)>,
    videos: Vec<Video>,
    comments: Vec<Comment>,
    reactions: Vec<Reaction>,
    subscriptions: Vec<Subscription>,
    playlists: Vec<Playlist>,
}

impl MemoryState {
    fn remove_comments(&mut self, doomed: &HashSet<Uuid>) {
        self.comments.retain(|c| !doomed.contains(&c.id));
        self.reactions
            .retain(|r| r.comment_id.is_none_or(|id| !doomed.contains(&id)));
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

fn clamp_add(value: i32, delta: i32) -> i32 {
    value.saturating_add(delta).max(0)
}

fn page_of<T>(items: Vec<T>, page: Page) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already exists!".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            avatar: DEFAULT_AVATAR.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let term = term.to_lowercase();
        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| u.name.to_lowercase().contains(&term))
            .cloned()
            .collect();
        users.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        Ok(state.users.iter_mut().find(|u| u.id == id).map(|user| {
            if let Some(name) = update.name {
                user.name = name;
            }
            if let Some(avatar) = update.avatar {
                user.avatar = avatar;
            }
            if let Some(background) = update.background {
                user.background = background;
            }
            if let Some(description) = update.description {
                user.description = description;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn record_watch(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        watch_time: Option<f64>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.watch_history.push((
            user_id,
            WatchedVideo {
                video_id,
                watch_time,
                watched_at: Utc::now(),
            },
        ));
        Ok(())
    }

    async fn watch_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<WatchedVideo>> {
        let state = self.state.read().await;
        Ok(state
            .watch_history
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == user_id)
            .take(limit.max(0) as usize)
            .map(|(_, watched)| watched.clone())
            .collect())
    }
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn create(&self, video: NewVideo) -> Result<Video> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            is_public: video.is_public,
            owner_id: video.owner_id,
            category_id: video.category_id,
            playlist_id: video.playlist_id,
            tags: video.tags,
            thumbnail_url: video.thumbnail_url,
            view_count: 0,
            published_at: Some(now),
            allow_comments: video.allow_comments,
            video_type: video.video_type,
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.videos.push(video.clone());
        Ok(video)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        let state = self.state.read().await;
        Ok(state.videos.iter().find(|v| v.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        include_private: bool,
        page: Page,
    ) -> Result<Vec<Video>> {
        let state = self.state.read().await;
        let mut videos: Vec<Video> = state
            .videos
            .iter()
            .filter(|v| v.owner_id == owner_id && (v.is_public || include_private))
            .cloned()
            .collect();
        newest_first(&mut videos, |v| (v.created_at, v.id));
        Ok(page_of(videos, page))
    }

    async fn count_by_owner(&self, owner_id: Uuid, include_private: bool) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .videos
            .iter()
            .filter(|v| v.owner_id == owner_id && (v.is_public || include_private))
            .count() as i64)
    }

    async fn list_public_by_owners(&self, owner_ids: &[Uuid]) -> Result<Vec<Video>> {
        let state = self.state.read().await;
        let mut videos: Vec<Video> = state
            .videos
            .iter()
            .filter(|v| v.is_public && owner_ids.contains(&v.owner_id))
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn list_liked_by(
        &self,
        user_id: Uuid,
        video_type: Option<VideoType>,
    ) -> Result<Vec<Video>> {
        let state = self.state.read().await;
        let mut liked: Vec<&Reaction> = state
            .reactions
            .iter()
            .filter(|r| r.user_id == user_id && r.kind == ReactionKind::Like)
            .filter(|r| r.video_id.is_some())
            .collect();
        liked.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(liked
            .into_iter()
            .filter_map(|r| state.videos.iter().find(|v| Some(v.id) == r.video_id))
            .filter(|v| video_type.is_none_or(|t| v.video_type == t))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.videos.len();
        state.videos.retain(|v| v.id != id);
        if state.videos.len() == before {
            return Ok(false);
        }

        let doomed: HashSet<Uuid> = state
            .comments
            .iter()
            .filter(|c| c.video_id == id)
            .map(|c| c.id)
            .collect();
        state.remove_comments(&doomed);
        state.reactions.retain(|r| r.video_id != Some(id));
        state.watch_history.retain(|(_, w)| w.video_id != id);
        Ok(true)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
        let mut state = self.state.write().await;
        Ok(state.videos.iter_mut().find(|v| v.id == id).map(|v| {
            v.view_count += 1;
            v.view_count
        }))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        if !state.videos.iter().any(|v| v.id == comment.video_id) {
            return Err(AppError::Internal(format!(
                "comment references missing video {}",
                comment.video_id
            )));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: comment.user_id,
            video_id: comment.video_id,
            parent_id: comment.parent_id,
            comment: comment.comment,
            like_count: 0,
            dislike_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.comments.push(comment.clone());
        if let Some(video) = state.videos.iter_mut().find(|v| v.id == comment.video_id) {
            video.comment_count = clamp_add(video.comment_count, 1);
        }
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.comment = text.to_string();
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_subtree(&self, id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let Some(video_id) = state.comments.iter().find(|c| c.id == id).map(|c| c.video_id) else {
            return Ok(0);
        };

        let mut doomed = HashSet::from([id]);
        let mut frontier = vec![id];
        while let Some(parent) = frontier.pop() {
            for child in state.comments.iter().filter(|c| c.parent_id == Some(parent)) {
                if doomed.insert(child.id) {
                    frontier.push(child.id);
                }
            }
        }

        state.remove_comments(&doomed);
        let removed = i32::try_from(doomed.len()).unwrap_or(i32::MAX);
        if let Some(video) = state.videos.iter_mut().find(|v| v.id == video_id) {
            video.comment_count = clamp_add(video.comment_count, -removed);
        }
        Ok(doomed.len() as u64)
    }

    async fn list_thread(&self, video_id: Uuid) -> Result<Vec<ThreadComment>> {
        let state = self.state.read().await;
        let authors: HashMap<Uuid, &User> = state.users.iter().map(|u| (u.id, u)).collect();

        let mut rows: Vec<ThreadComment> = state
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .filter_map(|c| {
                authors.get(&c.user_id).map(|author| ThreadComment {
                    id: c.id,
                    video_id: c.video_id,
                    parent_id: c.parent_id,
                    comment: c.comment.clone(),
                    created_at: c.created_at,
                    updated_at: c.updated_at,
                    author_id: author.id,
                    author_name: author.name.clone(),
                    author_avatar: author.avatar.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn count_by_video(&self, video_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.comments.iter().filter(|c| c.video_id == video_id).count() as i64)
    }
}

#[async_trait]
impl ReactionRepository for MemoryStore {
    async fn find(&self, user_id: Uuid, target: ReactionTarget) -> Result<Option<Reaction>> {
        let state = self.state.read().await;
        Ok(state
            .reactions
            .iter()
            .find(|r| r.user_id == user_id && r.target() == Some(target))
            .cloned())
    }

    async fn toggle(
        &self,
        user_id: Uuid,
        target: ReactionTarget,
        desired: ReactionKind,
    ) -> Result<Option<(ReactionTransition, ReactionCounts)>> {
        let mut state = self.state.write().await;
        let target_exists = match target {
            ReactionTarget::Video(id) => state.videos.iter().any(|v| v.id == id),
            ReactionTarget::Comment(id) => state.comments.iter().any(|c| c.id == id),
        };
        if !target_exists {
            return Ok(None);
        }

        let position = state
            .reactions
            .iter()
            .position(|r| r.user_id == user_id && r.target() == Some(target));
        let transition =
            ReactionTransition::decide(position.map(|i| state.reactions[i].kind), desired);
        let now = Utc::now();

        match (position, transition) {
            (None, ReactionTransition::Created(kind)) => state.reactions.push(Reaction {
                id: Uuid::new_v4(),
                user_id,
                video_id: target.video_id(),
                comment_id: target.comment_id(),
                kind,
                created_at: now,
                updated_at: now,
            }),
            (Some(i), ReactionTransition::Removed(_)) => {
                state.reactions.remove(i);
            }
            (Some(i), ReactionTransition::Switched { to, .. }) => {
                let reaction = &mut state.reactions[i];
                reaction.kind = to;
                reaction.updated_at = now;
            }
            _ => {
                return Err(AppError::Conflict(
                    "Reaction was changed concurrently, try again".to_string(),
                ));
            }
        }

        let delta = transition.delta();
        let counts = match target {
            ReactionTarget::Video(id) => state.videos.iter_mut().find(|v| v.id == id).map(|v| {
                v.like_count = clamp_add(v.like_count, delta.likes);
                v.dislike_count = clamp_add(v.dislike_count, delta.dislikes);
                v.updated_at = now;
                ReactionCounts {
                    like_count: v.like_count,
                    dislike_count: v.dislike_count,
                }
            }),
            ReactionTarget::Comment(id) => {
                state.comments.iter_mut().find(|c| c.id == id).map(|c| {
                    c.like_count = clamp_add(c.like_count, delta.likes);
                    c.dislike_count = clamp_add(c.dislike_count, delta.dislikes);
                    ReactionCounts {
                        like_count: c.like_count,
                        dislike_count: c.dislike_count,
                    }
                })
            }
        };

        Ok(counts.map(|counts| (transition, counts)))
    }

    async fn tally_comments_of_video(&self, video_id: Uuid) -> Result<Vec<CommentReactionTally>> {
        let state = self.state.read().await;
        let comment_ids: HashSet<Uuid> = state
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .map(|c| c.id)
            .collect();

        let mut tallies: HashMap<Uuid, CommentReactionTally> = HashMap::new();
        for reaction in &state.reactions {
            let Some(comment_id) = reaction.comment_id else {
                continue;
            };
            if !comment_ids.contains(&comment_id) {
                continue;
            }

            let tally = tallies
                .entry(comment_id)
                .or_insert_with(|| CommentReactionTally {
                    comment_id,
                    like_count: 0,
                    dislike_count: 0,
                });
            match reaction.kind {
                ReactionKind::Like => tally.like_count += 1,
                ReactionKind::Dislike => tally.dislike_count += 1,
            }
        }

        Ok(tallies.into_values().collect())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn create(&self, user_id: Uuid, channel_id: Uuid) -> Result<Subscription> {
        let mut state = self.state.write().await;
        if state
            .subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.channel_id == channel_id)
        {
            return Err(AppError::Conflict(
                "Already subscribed to this channel".to_string(),
            ));
        }

        let subscription = Subscription {
            user_id,
            channel_id,
            created_at: Utc::now(),
        };
        state.subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn delete(&self, user_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.subscriptions.len();
        state
            .subscriptions
            .retain(|s| !(s.user_id == user_id && s.channel_id == channel_id));
        Ok(state.subscriptions.len() != before)
    }

    async fn exists(&self, user_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.channel_id == channel_id))
    }

    async fn channel_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.channel_id)
            .collect())
    }

    async fn list_channels(&self, user_id: Uuid) -> Result<Vec<ChannelSummary>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| state.users.iter().find(|u| u.id == s.channel_id))
            .map(ChannelSummary::from)
            .collect())
    }

    async fn count_subscribers(&self, channel_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.channel_id == channel_id)
            .count() as i64)
    }
}

#[async_trait]
impl PlaylistRepository for MemoryStore {
    async fn create(&self, playlist: NewPlaylist) -> Result<Playlist> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let playlist = Playlist {
            id: Uuid::new_v4(),
            writer_id: playlist.writer_id,
            title: playlist.title,
            description: playlist.description,
            is_public: playlist.is_public,
            created_at: now,
            updated_at: now,
        };
        state.playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Playlist>> {
        let state = self.state.read().await;
        Ok(state.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_writer(
        &self,
        writer_id: Uuid,
        is_public: bool,
        page: Page,
    ) -> Result<Vec<PlaylistRow>> {
        let state = self.state.read().await;
        let Some(writer) = state.users.iter().find(|u| u.id == writer_id) else {
            return Ok(Vec::new());
        };

        let mut playlists: Vec<&Playlist> = state
            .playlists
            .iter()
            .filter(|p| p.writer_id == writer_id && p.is_public == is_public)
            .collect();
        newest_first(&mut playlists, |p| (p.created_at, p.id));

        let rows = page_of(playlists, page)
            .into_iter()
            .map(|p| {
                let mut videos: Vec<&Video> = state
                    .videos
                    .iter()
                    .filter(|v| v.playlist_id == Some(p.id))
                    .collect();
                videos.sort_by_key(|v| (v.created_at, v.id));

                PlaylistRow {
                    id: p.id,
                    title: p.title.clone(),
                    description: p.description.clone(),
                    is_public: p.is_public,
                    writer_id: writer.id,
                    writer_name: writer.name.clone(),
                    videos: videos.into_iter().map(|v| v.id).collect(),
                    created_at: p.created_at,
                    updated_at: p.updated_at,
                }
            })
            .collect();
        Ok(rows)
    }

    async fn count_by_writer(&self, writer_id: Uuid, is_public: bool) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .playlists
            .iter()
            .filter(|p| p.writer_id == writer_id && p.is_public == is_public)
            .count() as i64)
    }
}
