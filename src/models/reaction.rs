use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// Signed change applied to a target's like/dislike counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub likes: i32,
    pub dislikes: i32,
}

impl CounterDelta {
    fn unit(kind: ReactionKind, step: i32) -> Self {
        match kind {
            ReactionKind::Like => CounterDelta {
                likes: step,
                dislikes: 0,
            },
            ReactionKind::Dislike => CounterDelta {
                likes: 0,
                dislikes: step,
            },
        }
    }
}

/// What a toggle does to a (user, target) reaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    Created(ReactionKind),
    Removed(ReactionKind),
    Switched { from: ReactionKind, to: ReactionKind },
}

impl ReactionTransition {
    /// Decides the transition from the current row state and the requested kind.
    pub fn decide(existing: Option<ReactionKind>, desired: ReactionKind) -> Self {
        match existing {
            None => ReactionTransition::Created(desired),
            Some(kind) if kind == desired => ReactionTransition::Removed(kind),
            Some(kind) => ReactionTransition::Switched {
                from: kind,
                to: desired,
            },
        }
    }

    pub fn delta(self) -> CounterDelta {
        match self {
            ReactionTransition::Created(kind) => CounterDelta::unit(kind, 1),
            ReactionTransition::Removed(kind) => CounterDelta::unit(kind, -1),
            ReactionTransition::Switched { from, to } => {
                let up = CounterDelta::unit(to, 1);
                let down = CounterDelta::unit(from, -1);
                CounterDelta {
                    likes: up.likes + down.likes,
                    dislikes: up.dislikes + down.dislikes,
                }
            }
        }
    }

    /// Kind of reaction left on the target after the transition.
    pub fn resulting_kind(self) -> Option<ReactionKind> {
        match self {
            ReactionTransition::Created(kind) => Some(kind),
            ReactionTransition::Removed(_) => None,
            ReactionTransition::Switched { to, .. } => Some(to),
        }
    }
}

/// Entity a reaction points at. Exactly one per reaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionTarget {
    Video(Uuid),
    Comment(Uuid),
}

impl ReactionTarget {
    pub fn id(&self) -> Uuid {
        match self {
            ReactionTarget::Video(id) | ReactionTarget::Comment(id) => *id,
        }
    }

    pub fn video_id(&self) -> Option<Uuid> {
        match self {
            ReactionTarget::Video(id) => Some(*id),
            ReactionTarget::Comment(_) => None,
        }
    }

    pub fn comment_id(&self) -> Option<Uuid> {
        match self {
            ReactionTarget::Comment(id) => Some(*id),
            ReactionTarget::Video(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionTarget::Video(_) => "Video",
            ReactionTarget::Comment(_) => "Comment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub video_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reaction {
    pub fn target(&self) -> Option<ReactionTarget> {
        match (self.video_id, self.comment_id) {
            (Some(video_id), None) => Some(ReactionTarget::Video(video_id)),
            (None, Some(comment_id)) => Some(ReactionTarget::Comment(comment_id)),
            _ => None,
        }
    }
}

/// Denormalized counters of a target, as stored after an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCounts {
    pub like_count: i32,
    pub dislike_count: i32,
}

/// Per-comment counts aggregated from the reaction rows.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CommentReactionTally {
    pub comment_id: Uuid,
    pub like_count: i64,
    pub dislike_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoReactionRequest {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReactionRequest {
    pub comment_id: Option<String>,
}
