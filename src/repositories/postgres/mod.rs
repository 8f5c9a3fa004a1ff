//! PostgreSQL implementations of the repository traits.

mod comments;
mod playlists;
mod reactions;
mod subscriptions;
mod users;
mod videos;

pub use comments::PgCommentRepository;
pub use playlists::PgPlaylistRepository;
pub use reactions::PgReactionRepository;
pub use subscriptions::PgSubscriptionRepository;
pub use users::PgUserRepository;
pub use videos::PgVideoRepository;
