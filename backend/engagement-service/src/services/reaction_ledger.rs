use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Reaction, ReactionSnapshot, ReactionTarget};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::repository::{ReactionStore, UserDirectory};

/// Like/dislike toggles on comments and ratings
#[derive(Clone)]
pub struct ReactionLedger {
    users: Arc<dyn UserDirectory>,
    reactions: Arc<dyn ReactionStore>,
}

impl ReactionLedger {
    pub fn new(users: Arc<dyn UserDirectory>, reactions: Arc<dyn ReactionStore>) -> Self {
        Self { users, reactions }
    }

    pub async fn toggle_like(&self, caller: Uuid, target: ReactionTarget) -> Result<ReactionSnapshot> {
        self.toggle(caller, target, Reaction::Like).await
    }

    pub async fn toggle_dislike(
        &self,
        caller: Uuid,
        target: ReactionTarget,
    ) -> Result<ReactionSnapshot> {
        self.toggle(caller, target, Reaction::Dislike).await
    }

    async fn toggle(
        &self,
        caller: Uuid,
        target: ReactionTarget,
        reaction: Reaction,
    ) -> Result<ReactionSnapshot> {
        if self.users.profile(caller).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let snapshot = self
            .reactions
            .apply_reaction(target, caller, reaction)
            .await?
            .ok_or_else(|| AppError::NotFound(target.not_found_message().to_string()))?;

        metrics::record_reaction(target.kind(), reaction.as_str());
        debug!(
            target = %target,
            user_id = %caller,
            reaction = reaction.as_str(),
            is_liked = snapshot.is_liked,
            is_disliked = snapshot.is_disliked,
            like_count = snapshot.like_count,
            dislike_count = snapshot.dislike_count,
            "Reaction toggled"
        );

        Ok(snapshot)
    }
}
