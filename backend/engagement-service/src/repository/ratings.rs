use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::{Rating, ReactionSet};
use crate::error::Result;

#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn insert_rating(&self, rating: &Rating) -> Result<()>;

    async fn get_rating(&self, id: Uuid) -> Result<Option<Rating>>;

    /// Ratings of a content item, newest first
    async fn ratings_for_content(&self, content_id: &str) -> Result<Vec<Rating>>;
}

pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn rating_from_row(row: &PgRow) -> std::result::Result<Rating, sqlx::Error> {
    let liked_by: Vec<Uuid> = row.try_get("liked_by")?;
    let disliked_by: Vec<Uuid> = row.try_get("disliked_by")?;
    let score: i16 = row.try_get("score")?;

    Ok(Rating {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        content_id: row.try_get("content_id")?,
        body: row.try_get("body")?,
        score: score.clamp(0, u8::MAX as i16) as u8,
        reactions: ReactionSet::from_members(liked_by, disliked_by),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl RatingStore for PgRatingStore {
    async fn insert_rating(&self, rating: &Rating) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ratings (
                id, user_id, content_id, body, score,
                liked_by, disliked_by, like_count, dislike_count, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, '{}', '{}', 0, 0, $6, $6)
            "#,
        )
        .bind(rating.id)
        .bind(rating.user_id)
        .bind(&rating.content_id)
        .bind(&rating.body)
        .bind(rating.score as i16)
        .bind(rating.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_rating(&self, id: Uuid) -> Result<Option<Rating>> {
        let row = sqlx::query(
            "SELECT id, user_id, content_id, body, score, liked_by, disliked_by, created_at, updated_at \
             FROM ratings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(rating_from_row).transpose()?)
    }

    async fn ratings_for_content(&self, content_id: &str) -> Result<Vec<Rating>> {
        let rows = sqlx::query(
            "SELECT id, user_id, content_id, body, score, liked_by, disliked_by, created_at, updated_at \
             FROM ratings WHERE content_id = $1 ORDER BY created_at DESC",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ratings = Vec::with_capacity(rows.len());
        for row in &rows {
            ratings.push(rating_from_row(row)?);
        }
        Ok(ratings)
    }
}
