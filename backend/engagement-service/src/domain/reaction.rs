//! Like/dislike toggle semantics shared by comments and ratings
//!
//! A user holds at most one reaction per target. Requesting the reaction the
//! user already holds clears it; requesting the opposite one replaces it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Reaction requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }
}

/// Reaction a single user currently holds on a single target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    #[default]
    None,
    Liked,
    Disliked,
}

impl ReactionState {
    /// Next state after the caller requests `requested`
    pub fn toggle(self, requested: Reaction) -> ReactionState {
        match (self, requested) {
            (ReactionState::Liked, Reaction::Like) => ReactionState::None,
            (ReactionState::Disliked, Reaction::Dislike) => ReactionState::None,
            (_, Reaction::Like) => ReactionState::Liked,
            (_, Reaction::Dislike) => ReactionState::Disliked,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionState::None => "none",
            ReactionState::Liked => "liked",
            ReactionState::Disliked => "disliked",
        }
    }
}

/// Target of a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionTarget {
    Comment(Uuid),
    Rating(Uuid),
}

impl ReactionTarget {
    pub fn id(&self) -> Uuid {
        match self {
            ReactionTarget::Comment(id) | ReactionTarget::Rating(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReactionTarget::Comment(_) => "comment",
            ReactionTarget::Rating(_) => "rating",
        }
    }

    /// Backing table for the PostgreSQL store
    pub fn table(&self) -> &'static str {
        match self {
            ReactionTarget::Comment(_) => "comments",
            ReactionTarget::Rating(_) => "ratings",
        }
    }

    /// Message used when the target does not exist
    pub fn not_found_message(&self) -> &'static str {
        match self {
            ReactionTarget::Comment(_) => "Comment not found",
            ReactionTarget::Rating(_) => "Rating not found",
        }
    }
}

impl fmt::Display for ReactionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Counts and caller flags returned after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSnapshot {
    pub like_count: u64,
    pub dislike_count: u64,
    pub is_liked: bool,
    pub is_disliked: bool,
}

/// Per-target reaction membership
///
/// Counts are derived from the set sizes, so they cannot drift from the
/// membership and a user can never be in both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ReactionSetRepr", from = "ReactionSetRepr")]
pub struct ReactionSet {
    liked_by: BTreeSet<Uuid>,
    disliked_by: BTreeSet<Uuid>,
}

impl ReactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored membership lists; a user present in both lists
    /// keeps only the like.
    pub fn from_members(
        liked_by: impl IntoIterator<Item = Uuid>,
        disliked_by: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        let liked_by: BTreeSet<Uuid> = liked_by.into_iter().collect();
        let disliked_by = disliked_by
            .into_iter()
            .filter(|id| !liked_by.contains(id))
            .collect();
        Self {
            liked_by,
            disliked_by,
        }
    }

    pub fn state_of(&self, user_id: Uuid) -> ReactionState {
        if self.liked_by.contains(&user_id) {
            ReactionState::Liked
        } else if self.disliked_by.contains(&user_id) {
            ReactionState::Disliked
        } else {
            ReactionState::None
        }
    }

    /// Apply a requested reaction for `user_id` and return the resulting view
    pub fn apply(&mut self, user_id: Uuid, requested: Reaction) -> ReactionSnapshot {
        let next = self.state_of(user_id).toggle(requested);

        self.liked_by.remove(&user_id);
        self.disliked_by.remove(&user_id);
        match next {
            ReactionState::Liked => {
                self.liked_by.insert(user_id);
            }
            ReactionState::Disliked => {
                self.disliked_by.insert(user_id);
            }
            ReactionState::None => {}
        }

        self.snapshot_for(user_id)
    }

    pub fn snapshot_for(&self, user_id: Uuid) -> ReactionSnapshot {
        ReactionSnapshot {
            like_count: self.like_count(),
            dislike_count: self.dislike_count(),
            is_liked: self.liked_by.contains(&user_id),
            is_disliked: self.disliked_by.contains(&user_id),
        }
    }

    pub fn like_count(&self) -> u64 {
        self.liked_by.len() as u64
    }

    pub fn dislike_count(&self) -> u64 {
        self.disliked_by.len() as u64
    }

    pub fn liked_by(&self) -> impl Iterator<Item = &Uuid> {
        self.liked_by.iter()
    }

    pub fn disliked_by(&self) -> impl Iterator<Item = &Uuid> {
        self.disliked_by.iter()
    }

    pub fn liked_vec(&self) -> Vec<Uuid> {
        self.liked_by.iter().copied().collect()
    }

    pub fn disliked_vec(&self) -> Vec<Uuid> {
        self.disliked_by.iter().copied().collect()
    }
}

#[derive(Serialize, Deserialize)]
struct ReactionSetRepr {
    like_count: u64,
    dislike_count: u64,
    #[serde(default)]
    liked_by: Vec<Uuid>,
    #[serde(default)]
    disliked_by: Vec<Uuid>,
}

impl From<ReactionSet> for ReactionSetRepr {
    fn from(set: ReactionSet) -> Self {
        Self {
            like_count: set.like_count(),
            dislike_count: set.dislike_count(),
            liked_by: set.liked_by.into_iter().collect(),
            disliked_by: set.disliked_by.into_iter().collect(),
        }
    }
}

impl From<ReactionSetRepr> for ReactionSet {
    // Stored counts are ignored; membership is authoritative.
    fn from(repr: ReactionSetRepr) -> Self {
        ReactionSet::from_members(repr.liked_by, repr.disliked_by)
    }
}
