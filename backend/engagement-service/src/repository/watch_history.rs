use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::WatchProgress;
use crate::error::Result;

/// Last-write-wins progress records keyed by `(user_id, slug)`
#[async_trait]
pub trait WatchHistoryStore: Send + Sync {
    async fn upsert(&self, progress: &WatchProgress) -> Result<WatchProgress>;

    /// Most recently updated entries first
    async fn recent(&self, user_id: Uuid, limit: usize) -> Result<Vec<WatchProgress>>;

    /// Returns whether an entry was removed
    async fn remove(&self, user_id: Uuid, slug: &str) -> Result<bool>;
}

pub struct PgWatchHistoryStore {
    pool: PgPool,
}

impl PgWatchHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const HISTORY_COLUMNS: &str = "user_id, slug, content_id, name, thumb_url, poster_url, lang, \
     current_time_secs, duration_secs, progress_percent, episode, updated_at";

fn progress_from_row(row: &PgRow) -> std::result::Result<WatchProgress, sqlx::Error> {
    Ok(WatchProgress {
        user_id: row.try_get("user_id")?,
        slug: row.try_get("slug")?,
        content_id: row.try_get("content_id")?,
        name: row.try_get("name")?,
        thumb_url: row.try_get("thumb_url")?,
        poster_url: row.try_get("poster_url")?,
        lang: row.try_get("lang")?,
        current_time_secs: row.try_get("current_time_secs")?,
        duration_secs: row.try_get("duration_secs")?,
        progress_percent: row.try_get("progress_percent")?,
        episode: row.try_get("episode")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl WatchHistoryStore for PgWatchHistoryStore {
    async fn upsert(&self, progress: &WatchProgress) -> Result<WatchProgress> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO watch_history (
                user_id, slug, content_id, name, thumb_url, poster_url, lang,
                current_time_secs, duration_secs, progress_percent, episode, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id, slug) DO UPDATE SET
                content_id = EXCLUDED.content_id,
                name = EXCLUDED.name,
                thumb_url = EXCLUDED.thumb_url,
                poster_url = EXCLUDED.poster_url,
                lang = EXCLUDED.lang,
                current_time_secs = EXCLUDED.current_time_secs,
                duration_secs = EXCLUDED.duration_secs,
                progress_percent = EXCLUDED.progress_percent,
                episode = EXCLUDED.episode,
                updated_at = EXCLUDED.updated_at
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(progress.user_id)
        .bind(&progress.slug)
        .bind(&progress.content_id)
        .bind(&progress.name)
        .bind(&progress.thumb_url)
        .bind(&progress.poster_url)
        .bind(&progress.lang)
        .bind(progress.current_time_secs)
        .bind(progress.duration_secs)
        .bind(progress.progress_percent)
        .bind(&progress.episode)
        .bind(progress.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(progress_from_row(&row)?)
    }

    async fn recent(&self, user_id: Uuid, limit: usize) -> Result<Vec<WatchProgress>> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM watch_history \
             WHERE user_id = $1 ORDER BY updated_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(progress_from_row(row)?);
        }
        Ok(entries)
    }

    async fn remove(&self, user_id: Uuid, slug: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM watch_history WHERE user_id = $1 AND slug = $2")
            .bind(user_id)
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
