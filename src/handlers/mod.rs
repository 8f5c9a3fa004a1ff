pub mod auth;
pub mod channels;
pub mod comments;
pub mod health;
pub mod likes;
pub mod subscriptions;
pub mod videos;

use uuid::Uuid;

use crate::error::{AppError, Result};

/// Parses an identifier taken from a path or body, rejecting blanks and
/// malformed values with a 400.
pub(crate) fn parse_id(raw: Option<&str>, missing: &str) -> Result<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::BadRequest(missing.to_string()))?;

    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid identifier: {raw}")))
}
