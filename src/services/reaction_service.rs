use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    locks::KeyedLocks,
    models::{ReactionCounts, ReactionKind, ReactionTarget, ReactionTransition, Video, VideoType},
    repositories::Repositories,
};

/// Serializes toggles per (user, target) within this process.
pub type ReactionLocks = KeyedLocks<(Uuid, ReactionTarget)>;

#[derive(Debug, Clone, Copy)]
pub struct ReactionOutcome {
    pub transition: ReactionTransition,
    pub counts: ReactionCounts,
}

impl ReactionOutcome {
    /// Reaction the user holds on the target after the toggle.
    pub fn status(&self) -> Option<ReactionKind> {
        self.transition.resulting_kind()
    }
}

/// Applies the like/dislike toggle of `user_id` on `target`.
///
/// * no reaction yet: a reaction of `desired` is recorded
/// * same kind already present: the reaction is withdrawn
/// * other kind present: the reaction switches to `desired`
///
/// The counters on the target move by the matching delta in the same
/// storage transaction and the stored values are returned.
#[instrument(skip(repos, locks))]
pub async fn apply_reaction(
    repos: &Repositories,
    locks: &ReactionLocks,
    user_id: Uuid,
    target: ReactionTarget,
    desired: ReactionKind,
) -> Result<ReactionOutcome> {
    let _guard = locks.lock((user_id, target)).await;

    let (transition, counts) = repos
        .reactions
        .toggle(user_id, target, desired)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found.", target.label())))?;

    info!(
        user_id = %user_id,
        target = ?target,
        transition = ?transition,
        like_count = counts.like_count,
        dislike_count = counts.dislike_count,
        "Reaction applied"
    );

    Ok(ReactionOutcome { transition, counts })
}

#[instrument(skip(repos))]
pub async fn reaction_status(
    repos: &Repositories,
    user_id: Uuid,
    target: ReactionTarget,
) -> Result<Option<ReactionKind>> {
    let reaction = repos.reactions.find(user_id, target).await?;
    Ok(reaction.map(|r| r.kind))
}

#[instrument(skip(repos))]
pub async fn liked_videos(
    repos: &Repositories,
    user_id: Uuid,
    video_type: Option<VideoType>,
) -> Result<Vec<Video>> {
    repos.videos.list_liked_by(user_id, video_type).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewComment;
    use crate::services::fixtures;
    use std::sync::Arc;

    #[tokio::test]
    async fn toggling_the_same_kind_twice_restores_the_counters() {
        let repos = Repositories::in_memory();
        let locks = ReactionLocks::new();
        let owner = fixtures::user(&repos, "owner").await;
        let video = fixtures::video(&repos, owner.id, true).await;
        let target = ReactionTarget::Video(video.id);

        let first = apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Like)
            .await
            .unwrap();
        assert_eq!(first.counts.like_count, 1);
        assert_eq!(first.status(), Some(ReactionKind::Like));

        let second = apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Like)
            .await
            .unwrap();
        assert_eq!(second.counts, ReactionCounts::default());
        assert_eq!(second.status(), None);
        assert_eq!(reaction_status(&repos, owner.id, target).await.unwrap(), None);
    }

    #[tokio::test]
    async fn switching_moves_one_count_across() {
        let repos = Repositories::in_memory();
        let locks = ReactionLocks::new();
        let owner = fixtures::user(&repos, "owner").await;
        let video = fixtures::video(&repos, owner.id, true).await;
        let comment = repos
            .comments
            .create(NewComment {
                user_id: owner.id,
                video_id: video.id,
                parent_id: None,
                comment: "first!".to_string(),
            })
            .await
            .unwrap();
        let target = ReactionTarget::Comment(comment.id);

        apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Like)
            .await
            .unwrap();
        let switched = apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Dislike)
            .await
            .unwrap();

        assert_eq!(
            switched.counts,
            ReactionCounts {
                like_count: 0,
                dislike_count: 1
            }
        );
        assert_eq!(
            reaction_status(&repos, owner.id, target).await.unwrap(),
            Some(ReactionKind::Dislike)
        );
    }

    #[tokio::test]
    async fn concurrent_toggles_keep_one_row_and_matching_counters() {
        let repos = Repositories::in_memory();
        let locks = Arc::new(ReactionLocks::new());
        let owner = fixtures::user(&repos, "owner").await;
        let video = fixtures::video(&repos, owner.id, true).await;
        let target = ReactionTarget::Video(video.id);

        let mut handles = Vec::new();
        for _ in 0..7 {
            let repos = repos.clone();
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Like).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // an odd number of toggles leaves exactly one like behind
        let stored = repos.videos.find_by_id(video.id).await.unwrap().unwrap();
        assert_eq!((stored.like_count, stored.dislike_count), (1, 0));
        assert_eq!(
            reaction_status(&repos, owner.id, target).await.unwrap(),
            Some(ReactionKind::Like)
        );
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn toggles_behind_separate_lock_tables_keep_counters_in_step() {
        // one lock table per server process, all sharing the same storage
        let repos = Repositories::in_memory();
        let owner = fixtures::user(&repos, "owner").await;
        let video = fixtures::video(&repos, owner.id, true).await;
        let target = ReactionTarget::Video(video.id);

        let mut handles = Vec::new();
        for n in 0..6 {
            let repos = repos.clone();
            let desired = if n % 3 == 0 {
                ReactionKind::Dislike
            } else {
                ReactionKind::Like
            };
            handles.push(tokio::spawn(async move {
                let locks = ReactionLocks::new();
                apply_reaction(&repos, &locks, owner.id, target, desired).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = repos.videos.find_by_id(video.id).await.unwrap().unwrap();
        let expected = match reaction_status(&repos, owner.id, target).await.unwrap() {
            None => (0, 0),
            Some(ReactionKind::Like) => (1, 0),
            Some(ReactionKind::Dislike) => (0, 1),
        };
        assert_eq!((stored.like_count, stored.dislike_count), expected);
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let repos = Repositories::in_memory();
        let locks = ReactionLocks::new();
        let err = apply_reaction(
            &repos,
            &locks,
            Uuid::new_v4(),
            ReactionTarget::Comment(Uuid::new_v4()),
            ReactionKind::Like,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref m) if m == "Comment not found."));
    }

    #[tokio::test]
    async fn liked_videos_follow_the_current_reaction() {
        let repos = Repositories::in_memory();
        let locks = ReactionLocks::new();
        let owner = fixtures::user(&repos, "owner").await;
        let video = fixtures::video(&repos, owner.id, true).await;
        let target = ReactionTarget::Video(video.id);

        apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Like)
            .await
            .unwrap();
        let liked = liked_videos(&repos, owner.id, None).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert!(
            liked_videos(&repos, owner.id, Some(VideoType::Short))
                .await
                .unwrap()
                .is_empty()
        );

        apply_reaction(&repos, &locks, owner.id, target, ReactionKind::Dislike)
            .await
            .unwrap();
        assert!(liked_videos(&repos, owner.id, None).await.unwrap().is_empty());
    }
}
