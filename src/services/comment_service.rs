use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Comment, CommentNode, CommentThread, NewComment},
    repositories::{Repositories, tallies_by_comment},
    services::comment_tree,
};

/// Rejects blank text. The text itself is stored as sent.
fn require_text(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing parameter comment text".to_string(),
        ));
    }
    Ok(text)
}

async fn find_comment(repos: &Repositories, comment_id: Uuid) -> Result<Comment> {
    repos
        .comments
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

#[instrument(skip(repos, text))]
pub async fn create_comment(
    repos: &Repositories,
    user_id: Uuid,
    video_id: Uuid,
    text: &str,
) -> Result<Comment> {
    let text = require_text(text)?;

    let video = repos
        .videos
        .find_by_id(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found.".to_string()))?;

    if !video.allow_comments {
        return Err(AppError::BadRequest(
            "Comments are disabled for this video".to_string(),
        ));
    }

    let comment = repos
        .comments
        .create(NewComment {
            user_id,
            video_id,
            parent_id: None,
            comment: text.to_string(),
        })
        .await?;

    info!(comment_id = %comment.id, video_id = %video_id, "Comment created");
    Ok(comment)
}

#[instrument(skip(repos, text))]
pub async fn reply_comment(
    repos: &Repositories,
    user_id: Uuid,
    parent_id: Uuid,
    text: &str,
) -> Result<Comment> {
    let text = require_text(text)?;

    let parent = repos
        .comments
        .find_by_id(parent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

    let reply = repos
        .comments
        .create(NewComment {
            user_id,
            video_id: parent.video_id,
            parent_id: Some(parent.id),
            comment: text.to_string(),
        })
        .await?;

    info!(comment_id = %reply.id, parent_id = %parent.id, "Reply created");
    Ok(reply)
}

#[instrument(skip(repos, text))]
pub async fn update_comment(
    repos: &Repositories,
    user_id: Uuid,
    comment_id: Uuid,
    text: &str,
) -> Result<Comment> {
    let text = require_text(text)?;
    let existing = find_comment(repos, comment_id).await?;

    if existing.user_id != user_id {
        return Err(AppError::Authorization(
            "User unauthorized to update this comment".to_string(),
        ));
    }

    repos
        .comments
        .update_text(comment_id, text)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// Deletes the comment together with all replies beneath it.
#[instrument(skip(repos))]
pub async fn delete_comment(repos: &Repositories, user_id: Uuid, comment_id: Uuid) -> Result<()> {
    let existing = find_comment(repos, comment_id).await?;

    if existing.user_id != user_id {
        return Err(AppError::Authorization(
            "User unauthorized to delete this comment".to_string(),
        ));
    }

    let removed = repos.comments.delete_subtree(comment_id).await?;

    info!(comment_id = %comment_id, removed, "Comment deleted");
    Ok(())
}

/// Top-level comments of a video with their nested replies.
#[instrument(skip(repos))]
pub async fn list_comments(
    repos: &Repositories,
    video_id: Uuid,
    requester: Option<Uuid>,
) -> Result<CommentThread> {
    let rows = repos.comments.list_thread(video_id).await?;
    let tallies = tallies_by_comment(repos.reactions.tally_comments_of_video(video_id).await?);
    let total_comments = repos.comments.count_by_video(video_id).await?;

    let comments = comment_tree::build_forest(rows, &tallies, requester, None);

    Ok(CommentThread {
        comments,
        total_comments,
    })
}

/// Every reply below `comment_id`, nested.
#[instrument(skip(repos))]
pub async fn build_reply_tree(
    repos: &Repositories,
    comment_id: Uuid,
    requester: Option<Uuid>,
) -> Result<Vec<CommentNode>> {
    let comment = find_comment(repos, comment_id).await?;

    let rows = repos.comments.list_thread(comment.video_id).await?;
    let tallies = tallies_by_comment(
        repos
            .reactions
            .tally_comments_of_video(comment.video_id)
            .await?,
    );

    Ok(comment_tree::build_forest(
        rows,
        &tallies,
        requester,
        Some(comment_id),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReactionKind, ReactionTarget};
    use crate::services::{fixtures, reaction_service};

    #[tokio::test]
    async fn comments_and_replies_keep_comment_count_in_step() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        let video = fixtures::video(&repos, alice.id, true).await;

        let top = create_comment(&repos, alice.id, video.id, "first!")
            .await
            .unwrap();
        let reply = reply_comment(&repos, bob.id, top.id, "nice").await.unwrap();
        reply_comment(&repos, alice.id, reply.id, "thanks")
            .await
            .unwrap();

        assert_eq!(reply.video_id, video.id);
        assert_eq!(reply.parent_id, Some(top.id));
        let stored = repos.videos.find_by_id(video.id).await.unwrap().unwrap();
        assert_eq!(stored.comment_count, 3);

        delete_comment(&repos, bob.id, reply.id).await.unwrap();
        let stored = repos.videos.find_by_id(video.id).await.unwrap().unwrap();
        assert_eq!(stored.comment_count, 1);

        let thread = list_comments(&repos, video.id, None).await.unwrap();
        assert_eq!(thread.total_comments, 1);
        assert!(thread.comments[0].replies.is_empty());
    }

    #[tokio::test]
    async fn disabled_comments_and_blank_text_are_rejected() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let closed = fixtures::video(&repos, alice.id, false).await;
        let open = fixtures::video(&repos, alice.id, true).await;

        let err = create_comment(&repos, alice.id, closed.id, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = create_comment(&repos, alice.id, open.id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing parameter comment text"));

        let err = create_comment(&repos, alice.id, Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn comment_text_is_stored_as_sent() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let video = fixtures::video(&repos, alice.id, true).await;

        let comment = create_comment(&repos, alice.id, video.id, "  spaced out \n")
            .await
            .unwrap();
        assert_eq!(comment.comment, "  spaced out \n");

        let reply = reply_comment(&repos, alice.id, comment.id, " indented")
            .await
            .unwrap();
        assert_eq!(reply.comment, " indented");

        let updated = update_comment(&repos, alice.id, comment.id, "\tedited ")
            .await
            .unwrap();
        assert_eq!(updated.comment, "\tedited ");
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete() {
        let repos = Repositories::in_memory();
        let alice = fixtures::user(&repos, "alice").await;
        let mallory = fixtures::user(&repos, "mallory").await;
        let video = fixtures::video(&repos, alice.id, true).await;
        let comment = create_comment(&repos, alice.id, video.id, "original")
            .await
            .unwrap();

        let err = update_comment(&repos, mallory.id, comment.id, "defaced")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        let err = delete_comment(&repos, mallory.id, comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let stored = repos.comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored.comment, "original");

        let updated = update_comment(&repos, alice.id, comment.id, "edited")
            .await
            .unwrap();
        assert_eq!(updated.comment, "edited");
    }

    #[tokio::test]
    async fn thread_carries_reaction_tallies_and_ownership() {
        let repos = Repositories::in_memory();
        let locks = reaction_service::ReactionLocks::new();
        let alice = fixtures::user(&repos, "alice").await;
        let bob = fixtures::user(&repos, "bob").await;
        let video = fixtures::video(&repos, alice.id, true).await;

        let top = create_comment(&repos, alice.id, video.id, "first!")
            .await
            .unwrap();
        reply_comment(&repos, bob.id, top.id, "nice").await.unwrap();
        let target = ReactionTarget::Comment(top.id);
        reaction_service::apply_reaction(&repos, &locks, alice.id, target, ReactionKind::Like)
            .await
            .unwrap();
        reaction_service::apply_reaction(&repos, &locks, alice.id, target, ReactionKind::Dislike)
            .await
            .unwrap();

        let thread = list_comments(&repos, video.id, Some(alice.id)).await.unwrap();
        assert_eq!(thread.total_comments, 2);
        assert_eq!(thread.comments.len(), 1);
        let outer = &thread.comments[0];
        assert_eq!((outer.like_count, outer.dislike_count), (0, 1));
        assert!(outer.is_owner);
        assert_eq!(outer.replies.len(), 1);
        assert!(!outer.replies[0].is_owner);

        let replies = build_reply_tree(&repos, top.id, None).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].comment, "nice");
    }

    #[tokio::test]
    async fn reply_tree_of_unknown_comment_is_not_found() {
        let repos = Repositories::in_memory();
        let err = build_reply_tree(&repos, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
