use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Comment, ReactionSet};
use crate::error::{AppError, Result};

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Store a new comment; a reply is appended to its parent's `reply_ids`
    /// in the same write.
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Top-level comments of a content item, newest first
    async fn top_level_for_content(&self, content_id: &str) -> Result<Vec<Comment>>;

    /// Direct children of any of `parent_ids`, in no particular order
    async fn children_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>>;

    /// Comments eligible for the engagement ranking; at least the top
    /// `limit` by score must be present.
    async fn ranking_candidates(&self, limit: usize) -> Result<Vec<Comment>>;

    /// Most recently created comments system-wide
    async fn newest(&self, limit: usize) -> Result<Vec<Comment>>;
}

pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COMMENT_COLUMNS: &str = "id, user_id, content_id, content_name, content_thumb, body, \
     is_spoiler, parent_id, reply_ids, liked_by, disliked_by, created_at, updated_at";

pub(crate) fn comment_from_row(row: &PgRow) -> std::result::Result<Comment, sqlx::Error> {
    let liked_by: Vec<Uuid> = row.try_get("liked_by")?;
    let disliked_by: Vec<Uuid> = row.try_get("disliked_by")?;

    Ok(Comment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        content_id: row.try_get("content_id")?,
        content_name: row.try_get("content_name")?,
        content_thumb: row.try_get("content_thumb")?,
        body: row.try_get("body")?,
        is_spoiler: row.try_get("is_spoiler")?,
        parent_id: row.try_get("parent_id")?,
        reply_ids: row.try_get("reply_ids")?,
        reactions: ReactionSet::from_members(liked_by, disliked_by),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comments_from_rows(rows: &[PgRow]) -> Result<Vec<Comment>> {
    rows.iter()
        .map(|row| comment_from_row(row).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO comments (
                id, user_id, content_id, content_name, content_thumb, body,
                is_spoiler, parent_id, reply_ids, liked_by, disliked_by,
                like_count, dislike_count, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '{}', '{}', '{}', 0, 0, $9, $9)
            "#,
        )
        .bind(comment.id)
        .bind(comment.user_id)
        .bind(&comment.content_id)
        .bind(&comment.content_name)
        .bind(&comment.content_thumb)
        .bind(&comment.body)
        .bind(comment.is_spoiler)
        .bind(comment.parent_id)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(parent_id) = comment.parent_id {
            let updated = sqlx::query(
                r#"
                UPDATE comments
                SET reply_ids = array_append(reply_ids, $2), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(parent_id)
            .bind(comment.id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(AppError::NotFound("Comment not found".to_string()));
            }
        }

        tx.commit().await?;

        debug!(
            comment_id = %comment.id,
            parent_id = ?comment.parent_id,
            content_id = %comment.content_id,
            "Comment stored"
        );
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(comment_from_row).transpose()?)
    }

    async fn top_level_for_content(&self, content_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE content_id = $1 AND parent_id IS NULL \
             ORDER BY created_at DESC"
        ))
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        comments_from_rows(&rows)
    }

    async fn children_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_id = ANY($1)"
        ))
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await?;

        comments_from_rows(&rows)
    }

    async fn ranking_candidates(&self, limit: usize) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             ORDER BY (like_count + cardinality(reply_ids)) DESC, created_at ASC \
             LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        comments_from_rows(&rows)
    }

    async fn newest(&self, limit: usize) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        comments_from_rows(&rows)
    }
}
