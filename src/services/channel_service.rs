use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        ChannelInfo, ChannelSummary, CreatePlaylistRequest, NewPlaylist, Page, Paged, Playlist,
        PlaylistView, ProfileUpdate, User, UserRole, Video,
    },
    repositories::Repositories,
};

pub const DEFAULT_SEARCH_LIMIT: i64 = 12;
const MAX_SEARCH_LIMIT: i64 = 50;

fn channel_not_found() -> AppError {
    AppError::NotFound("Channel not found".to_string())
}

async fn require_channel(repos: &Repositories, channel_id: Uuid) -> Result<User> {
    repos
        .users
        .find_by_id(channel_id)
        .await?
        .ok_or_else(channel_not_found)
}

/// Case-insensitive substring match on channel names.
#[instrument(skip(repos))]
pub async fn search(
    repos: &Repositories,
    term: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<ChannelSummary>> {
    let term = term
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing parameter q".to_string()))?;
    let limit = limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let users = repos.users.search_by_name(term, limit).await?;
    Ok(users.iter().map(ChannelSummary::from).collect())
}

/// `video_count` only counts public videos, whoever is asking.
#[instrument(skip(repos))]
pub async fn channel_info(repos: &Repositories, channel_id: Uuid) -> Result<ChannelInfo> {
    let user = require_channel(repos, channel_id).await?;
    let subscribers = repos.subscriptions.count_subscribers(channel_id).await?;
    let videos = repos.videos.count_by_owner(channel_id, false).await?;

    Ok(ChannelInfo::new(user, subscribers, videos))
}

/// Newest first. Private videos are listed only for the channel owner.
#[instrument(skip(repos))]
pub async fn channel_videos(
    repos: &Repositories,
    channel_id: Uuid,
    viewer: Option<Uuid>,
    page: Page,
) -> Result<Paged<Video>> {
    require_channel(repos, channel_id).await?;

    let include_private = viewer == Some(channel_id);
    let total = repos
        .videos
        .count_by_owner(channel_id, include_private)
        .await?;
    let videos = repos
        .videos
        .list_by_owner(channel_id, include_private, page)
        .await?;

    Ok(Paged::new(videos, total, page))
}

#[instrument(skip(repos))]
pub async fn channel_playlists(
    repos: &Repositories,
    channel_id: Uuid,
    viewer: Option<Uuid>,
    is_public: bool,
    page: Page,
) -> Result<Paged<PlaylistView>> {
    require_channel(repos, channel_id).await?;

    if !is_public && viewer != Some(channel_id) {
        return Err(AppError::Authorization(
            "Private playlists are only visible to their owner".to_string(),
        ));
    }

    let total = repos.playlists.count_by_writer(channel_id, is_public).await?;
    let rows = repos
        .playlists
        .list_by_writer(channel_id, is_public, page)
        .await?;

    Ok(Paged::new(
        rows.into_iter().map(PlaylistView::from).collect(),
        total,
        page,
    ))
}

#[instrument(skip(repos, request), fields(title = %request.title))]
pub async fn create_playlist(
    repos: &Repositories,
    writer_id: Uuid,
    request: CreatePlaylistRequest,
) -> Result<Playlist> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Missing parameter title".to_string()));
    }

    let playlist = repos
        .playlists
        .create(NewPlaylist {
            writer_id,
            title: title.to_string(),
            description: request.description,
            is_public: request.is_public.unwrap_or(true),
        })
        .await?;

    info!(playlist_id = %playlist.id, writer_id = %writer_id, "Playlist created");
    Ok(playlist)
}

/// Owners edit their own channel; admins may edit any.
#[instrument(skip(repos, update))]
pub async fn update_channel(
    repos: &Repositories,
    user_id: Uuid,
    role: UserRole,
    channel_id: Uuid,
    update: ProfileUpdate,
) -> Result<User> {
    if user_id != channel_id && role != UserRole::Admin {
        return Err(AppError::Authorization(
            "You can only update your own channel".to_string(),
        ));
    }

    if update.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("Name cannot be blank".to_string()));
    }

    let user = repos
        .users
        .update_profile(channel_id, update)
        .await?
        .ok_or_else(channel_not_found)?;

    info!(channel_id = %channel_id, "Channel updated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateVideoRequest, PageQuery, VideoType};
    use crate::services::{fixtures, subscription_service, video_service};

    fn playlist_request(title: &str, is_public: bool) -> CreatePlaylistRequest {
        CreatePlaylistRequest {
            title: title.to_string(),
            description: String::new(),
            is_public: Some(is_public),
        }
    }

    #[tokio::test]
    async fn search_matches_names_and_rejects_blank_terms() {
        let repos = Repositories::in_memory();
        fixtures::user(&repos, "alice").await;
        fixtures::user(&repos, "malice").await;
        fixtures::user(&repos, "bob").await;

        let found = search(&repos, Some("ALI"), None).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alice", "malice"]);

        let capped = search(&repos, Some("li"), Some(1)).await.unwrap();
        assert_eq!(capped.len(), 1);

        assert!(matches!(
            search(&repos, Some("   "), None).await,
            Err(AppError::BadRequest(m)) if m == "Missing parameter q"
        ));
        assert!(matches!(
            search(&repos, None, None).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn info_counts_subscribers_and_public_videos() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        fixtures::video(&repos, alice.id, true).await;
        fixtures::video(&repos, alice.id, false).await;
        subscription_service::subscribe(&repos, bob.id, alice.id)
            .await
            .unwrap();

        let info = channel_info(&repos, alice.id).await.unwrap();
        assert_eq!(info.subscriber_count, 1);
        assert_eq!(info.video_count, 2);
        assert_eq!(info.name, "alice");

        assert!(matches!(
            channel_info(&repos, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn private_videos_are_listed_for_the_owner_only() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        fixtures::video(&repos, alice.id, true).await;
        video_service::create_video(
            &repos,
            alice.id,
            CreateVideoRequest {
                title: "draft".to_string(),
                description: String::new(),
                video_url: "https://cdn.example.com/draft.mp4".to_string(),
                is_public: Some(false),
                video_type: VideoType::Short,
                category_id: None,
                playlist_id: None,
                tags: Vec::new(),
                thumbnail_url: None,
                allow_comments: None,
            },
        )
        .await
        .unwrap();

        let page = PageQuery::default().resolve(4);
        let own = channel_videos(&repos, alice.id, Some(alice.id), page)
            .await
            .unwrap();
        assert_eq!(own.total, 2);

        let other = channel_videos(&repos, alice.id, Some(bob.id), page)
            .await
            .unwrap();
        assert_eq!(other.total, 1);
        assert_eq!(other.items.len(), 1);
        assert!(other.items.iter().all(|v| v.is_public));

        let info = channel_info(&repos, alice.id).await.unwrap();
        assert_eq!(info.video_count, 1);
    }

    #[tokio::test]
    async fn private_playlists_are_hidden_from_other_viewers() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        create_playlist(&repos, alice.id, playlist_request("Favourites", true))
            .await
            .unwrap();
        create_playlist(&repos, alice.id, playlist_request("Drafts", false))
            .await
            .unwrap();

        let page = PageQuery::default().resolve(12);
        let public = channel_playlists(&repos, alice.id, None, true, page)
            .await
            .unwrap();
        assert_eq!(public.total, 1);
        assert_eq!(public.items[0].title, "Favourites");
        assert_eq!(public.items[0].writer.name, "alice");

        assert!(matches!(
            channel_playlists(&repos, alice.id, Some(bob.id), false, page).await,
            Err(AppError::Authorization(_))
        ));
        let private = channel_playlists(&repos, alice.id, Some(alice.id), false, page)
            .await
            .unwrap();
        assert_eq!(private.total, 1);
        assert_eq!(private.items[0].title, "Drafts");
    }

    #[tokio::test]
    async fn playlists_collect_their_videos() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        let playlist = create_playlist(&repos, alice.id, playlist_request("Series", true))
            .await
            .unwrap();

        let request = |playlist_id| CreateVideoRequest {
            title: "episode".to_string(),
            description: String::new(),
            video_url: "https://cdn.example.com/ep.mp4".to_string(),
            is_public: None,
            video_type: VideoType::Long,
            category_id: None,
            playlist_id: Some(playlist_id),
            tags: Vec::new(),
            thumbnail_url: None,
            allow_comments: None,
        };
        let episode = video_service::create_video(&repos, alice.id, request(playlist.id))
            .await
            .unwrap();

        assert!(matches!(
            video_service::create_video(&repos, bob.id, request(playlist.id)).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            video_service::create_video(&repos, alice.id, request(Uuid::new_v4())).await,
            Err(AppError::BadRequest(_))
        ));

        let page = PageQuery::default().resolve(12);
        let listed = channel_playlists(&repos, alice.id, None, true, page)
            .await
            .unwrap();
        assert_eq!(listed.items[0].videos, vec![episode.id]);
    }

    #[tokio::test]
    async fn only_the_owner_or_an_admin_updates_a_channel() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        let update = ProfileUpdate {
            description: Some("cooking every sunday".to_string()),
            ..ProfileUpdate::default()
        };

        assert!(matches!(
            update_channel(&repos, bob.id, UserRole::User, alice.id, update.clone()).await,
            Err(AppError::Authorization(_))
        ));

        let updated = update_channel(&repos, alice.id, UserRole::User, alice.id, update.clone())
            .await
            .unwrap();
        assert_eq!(updated.description, "cooking every sunday");
        assert_eq!(updated.name, "alice");

        update_channel(&repos, bob.id, UserRole::Admin, alice.id, update)
            .await
            .unwrap();

        assert!(matches!(
            update_channel(&repos, alice.id, UserRole::User, alice.id, ProfileUpdate::default())
                .await,
            Err(AppError::BadRequest(_))
        ));
        let blank_name = ProfileUpdate {
            name: Some("  ".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            update_channel(&repos, alice.id, UserRole::User, alice.id, blank_name).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
