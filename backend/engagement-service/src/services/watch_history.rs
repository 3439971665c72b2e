use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{WatchProgress, WatchProgressInput};
use crate::error::{AppError, Result};
use crate::repository::WatchHistoryStore;

/// Entries returned by [`WatchHistoryService::recent`]
pub const RECENT_LIMIT: usize = 20;

#[derive(Clone)]
pub struct WatchHistoryService {
    history: Arc<dyn WatchHistoryStore>,
}

impl WatchHistoryService {
    pub fn new(history: Arc<dyn WatchHistoryStore>) -> Self {
        Self { history }
    }

    /// Record the caller's position; the latest write for a slug wins
    pub async fn upsert_progress(
        &self,
        caller: Uuid,
        input: WatchProgressInput,
    ) -> Result<WatchProgress> {
        let content_id = non_empty(input.content_id);
        let slug = non_empty(input.slug);
        let (Some(content_id), Some(slug)) = (content_id, slug) else {
            return Err(AppError::Validation(
                "Content id and slug are required".to_string(),
            ));
        };

        let progress = WatchProgress {
            user_id: caller,
            slug,
            content_id,
            name: input.name.unwrap_or_default(),
            thumb_url: input.thumb_url,
            poster_url: input.poster_url,
            lang: input.lang,
            current_time_secs: input.current_time_secs.unwrap_or(0.0).max(0.0),
            duration_secs: input.duration_secs.unwrap_or(0.0).max(0.0),
            progress_percent: input.progress_percent.unwrap_or(0.0).clamp(0.0, 100.0),
            episode: input.episode,
            updated_at: Utc::now(),
        };

        let saved = self.history.upsert(&progress).await?;
        debug!(user_id = %caller, slug = %saved.slug, "Watch progress saved");
        Ok(saved)
    }

    pub async fn recent(&self, caller: Uuid) -> Result<Vec<WatchProgress>> {
        self.history.recent(caller, RECENT_LIMIT).await
    }

    pub async fn remove(&self, caller: Uuid, slug: &str) -> Result<bool> {
        self.history.remove(caller, slug).await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
