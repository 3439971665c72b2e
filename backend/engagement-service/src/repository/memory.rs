//! In-process stores backed by `DashMap`
//!
//! Used when `STORAGE_BACKEND=memory` and by the test suite. Reaction toggles
//! run while holding the target entry's shard lock, which serializes writers
//! on the same target.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

use super::{CommentStore, RatingStore, ReactionStore, UserDirectory, WatchHistoryStore};
use crate::domain::{
    AuthorProfile, Comment, Rating, Reaction, ReactionSnapshot, ReactionTarget, WatchProgress,
};
use crate::error::{AppError, Result};

#[derive(Default)]
pub struct MemoryStore {
    profiles: DashMap<Uuid, AuthorProfile>,
    comments: DashMap<Uuid, Comment>,
    ratings: DashMap<Uuid, Rating>,
    history: DashMap<(Uuid, String), WatchProgress>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a user's display profile
    pub fn put_profile(&self, profile: AuthorProfile) {
        self.profiles.insert(profile.user_id, profile);
    }

    pub fn remove_profile(&self, user_id: Uuid) {
        self.profiles.remove(&user_id);
    }

    /// Drop a comment without touching its parent or replies
    pub fn remove_comment(&self, id: Uuid) -> Option<Comment> {
        self.comments.remove(&id).map(|(_, comment)| comment)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>> {
        Ok(self.profiles.get(&user_id).map(|p| p.clone()))
    }

    async fn profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorProfile>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.profiles.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        if let Some(parent_id) = comment.parent_id {
            // Parent guard must be released before inserting the child;
            // both keys may live in the same shard.
            let mut parent = self
                .comments
                .get_mut(&parent_id)
                .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
            parent.reply_ids.push(comment.id);
            parent.updated_at = chrono::Utc::now();
        }

        self.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.clone()))
    }

    async fn top_level_for_content(&self, content_id: &str) -> Result<Vec<Comment>> {
        let mut top: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.parent_id.is_none() && c.content_id == content_id)
            .map(|c| c.clone())
            .collect();
        top.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(top)
    }

    async fn children_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.parent_id.map_or(false, |p| parent_ids.contains(&p)))
            .map(|c| c.clone())
            .collect())
    }

    async fn ranking_candidates(&self, _limit: usize) -> Result<Vec<Comment>> {
        Ok(self.comments.iter().map(|c| c.clone()).collect())
    }

    async fn newest(&self, limit: usize) -> Result<Vec<Comment>> {
        let mut all: Vec<Comment> = self.comments.iter().map(|c| c.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        all.truncate(limit);
        Ok(all)
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn insert_rating(&self, rating: &Rating) -> Result<()> {
        self.ratings.insert(rating.id, rating.clone());
        Ok(())
    }

    async fn get_rating(&self, id: Uuid) -> Result<Option<Rating>> {
        Ok(self.ratings.get(&id).map(|r| r.clone()))
    }

    async fn ratings_for_content(&self, content_id: &str) -> Result<Vec<Rating>> {
        let mut ratings: Vec<Rating> = self
            .ratings
            .iter()
            .filter(|r| r.content_id == content_id)
            .map(|r| r.clone())
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }
}

#[async_trait]
impl ReactionStore for MemoryStore {
    async fn apply_reaction(
        &self,
        target: ReactionTarget,
        user_id: Uuid,
        reaction: Reaction,
    ) -> Result<Option<ReactionSnapshot>> {
        let now = chrono::Utc::now();
        let snapshot = match target {
            ReactionTarget::Comment(id) => self.comments.get_mut(&id).map(|mut comment| {
                comment.updated_at = now;
                comment.reactions.apply(user_id, reaction)
            }),
            ReactionTarget::Rating(id) => self.ratings.get_mut(&id).map(|mut rating| {
                rating.updated_at = now;
                rating.reactions.apply(user_id, reaction)
            }),
        };
        Ok(snapshot)
    }
}

#[async_trait]
impl WatchHistoryStore for MemoryStore {
    async fn upsert(&self, progress: &WatchProgress) -> Result<WatchProgress> {
        self.history
            .insert((progress.user_id, progress.slug.clone()), progress.clone());
        Ok(progress.clone())
    }

    async fn recent(&self, user_id: Uuid, limit: usize) -> Result<Vec<WatchProgress>> {
        let mut entries: Vec<WatchProgress> = self
            .history
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn remove(&self, user_id: Uuid, slug: &str) -> Result<bool> {
        Ok(self.history.remove(&(user_id, slug.to_string())).is_some())
    }
}
