pub mod channel_service;
pub mod comment_service;
pub mod comment_tree;
pub mod reaction_service;
pub mod subscription_service;
pub mod user_service;
pub mod video_service;

#[cfg(test)]
pub(crate) mod fixtures;
