pub mod channel;
pub mod comment;
pub mod pagination;
pub mod reaction;
pub mod subscription;
pub mod user;
pub mod video;

pub use channel::*;
pub use comment::*;
pub use pagination::*;
pub use reaction::*;
pub use subscription::*;
pub use user::*;
pub use video::*;
