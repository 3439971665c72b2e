use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::{Reaction, ReactionSet, ReactionSnapshot, ReactionTarget};
use crate::error::Result;

/// Atomic read-modify-write of a target's reaction sets
#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Apply `reaction` for `user_id` on `target`.
    ///
    /// Returns `None` when the target does not exist. Concurrent calls on the
    /// same target are serialized by the store; calls on different targets
    /// never wait on each other.
    async fn apply_reaction(
        &self,
        target: ReactionTarget,
        user_id: Uuid,
        reaction: Reaction,
    ) -> Result<Option<ReactionSnapshot>>;
}

pub struct PgReactionStore {
    pool: PgPool,
}

impl PgReactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionStore for PgReactionStore {
    async fn apply_reaction(
        &self,
        target: ReactionTarget,
        user_id: Uuid,
        reaction: Reaction,
    ) -> Result<Option<ReactionSnapshot>> {
        let table = target.table();
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit
        let row = sqlx::query(&format!(
            "SELECT liked_by, disliked_by FROM {table} WHERE id = $1 FOR UPDATE"
        ))
        .bind(target.id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let liked_by: Vec<Uuid> = row.try_get("liked_by")?;
        let disliked_by: Vec<Uuid> = row.try_get("disliked_by")?;
        let mut set = ReactionSet::from_members(liked_by, disliked_by);
        let snapshot = set.apply(user_id, reaction);

        sqlx::query(&format!(
            "UPDATE {table} \
             SET liked_by = $2, disliked_by = $3, like_count = $4, dislike_count = $5, updated_at = NOW() \
             WHERE id = $1"
        ))
        .bind(target.id())
        .bind(set.liked_vec())
        .bind(set.disliked_vec())
        .bind(set.like_count() as i64)
        .bind(set.dislike_count() as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(snapshot))
    }
}
