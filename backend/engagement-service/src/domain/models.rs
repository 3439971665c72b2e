use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reaction::ReactionSet;

/// Display fields of a comment or rating author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub user_id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

impl AuthorProfile {
    /// Placeholder used when the author's profile has been removed
    pub fn unknown(user_id: Uuid) -> Self {
        Self {
            user_id,
            username: "unknown".to_string(),
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: String,
    pub content_name: String,
    pub content_thumb: Option<String>,
    pub body: String,
    pub is_spoiler: bool,
    pub parent_id: Option<Uuid>,
    /// Direct replies in insertion order
    pub reply_ids: Vec<Uuid>,
    pub reactions: ReactionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: Uuid, input: NewComment) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: author,
            content_id: input.content_id,
            content_name: input.content_name,
            content_thumb: input.content_thumb,
            body: input.body,
            is_spoiler: input.is_spoiler.unwrap_or(true),
            parent_id: input.parent_id,
            reply_ids: Vec::new(),
            reactions: ReactionSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Likes plus direct replies
    pub fn engagement_score(&self) -> u64 {
        self.reactions.like_count() + self.reply_ids.len() as u64
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content_id: String,
    pub content_name: String,
    #[serde(default)]
    pub content_thumb: Option<String>,
    pub body: String,
    #[serde(default)]
    pub is_spoiler: Option<bool>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: String,
    pub body: String,
    pub score: u8,
    pub reactions: ReactionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(author: Uuid, input: NewRating) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: author,
            content_id: input.content_id,
            body: input.body,
            score: input.score,
            reactions: ReactionSet::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
    pub content_id: String,
    pub body: String,
    pub score: u8,
}

/// Rating joined with its author's display fields
#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    pub author: AuthorProfile,
}

/// Playback position of one user on one title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchProgress {
    pub user_id: Uuid,
    pub slug: String,
    pub content_id: String,
    pub name: String,
    pub thumb_url: Option<String>,
    pub poster_url: Option<String>,
    pub lang: Option<String>,
    pub current_time_secs: f64,
    pub duration_secs: f64,
    pub progress_percent: f64,
    pub episode: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchProgressInput {
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thumb_url: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub current_time_secs: Option<f64>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    #[serde(default)]
    pub episode: Option<serde_json::Value>,
}
