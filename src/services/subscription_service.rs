use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{ChannelSummary, Subscription, Video},
    repositories::Repositories,
};

fn already_subscribed() -> AppError {
    AppError::BadRequest("Already subscribed".to_string())
}

#[instrument(skip(repos))]
pub async fn subscribe(repos: &Repositories, user_id: Uuid, channel_id: Uuid) -> Result<Subscription> {
    if user_id == channel_id {
        return Err(AppError::BadRequest(
            "You cannot subscribe to yourself".to_string(),
        ));
    }

    if repos.users.find_by_id(channel_id).await?.is_none() {
        return Err(AppError::NotFound("Channel not found".to_string()));
    }

    if repos.subscriptions.exists(user_id, channel_id).await? {
        return Err(already_subscribed());
    }

    let subscription = repos
        .subscriptions
        .create(user_id, channel_id)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => already_subscribed(),
            other => other,
        })?;

    info!(user_id = %user_id, channel_id = %channel_id, "Subscribed");
    Ok(subscription)
}

#[instrument(skip(repos))]
pub async fn unsubscribe(repos: &Repositories, user_id: Uuid, channel_id: Uuid) -> Result<()> {
    if !repos.subscriptions.delete(user_id, channel_id).await? {
        return Err(AppError::NotFound("Subscription not found".to_string()));
    }

    info!(user_id = %user_id, channel_id = %channel_id, "Unsubscribed");
    Ok(())
}

pub async fn is_subscribed(repos: &Repositories, user_id: Uuid, channel_id: Uuid) -> Result<bool> {
    repos.subscriptions.exists(user_id, channel_id).await
}

pub async fn channels(repos: &Repositories, user_id: Uuid) -> Result<Vec<ChannelSummary>> {
    repos.subscriptions.list_channels(user_id).await
}

/// Public videos of every subscribed channel, newest first.
#[instrument(skip(repos))]
pub async fn feed(repos: &Repositories, user_id: Uuid) -> Result<Vec<Video>> {
    let channel_ids = repos.subscriptions.channel_ids(user_id).await?;
    if channel_ids.is_empty() {
        return Err(AppError::NotFound("No subscriptions found".to_string()));
    }

    repos.videos.list_public_by_owners(&channel_ids).await
}
