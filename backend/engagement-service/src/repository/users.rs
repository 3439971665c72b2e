use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::AuthorProfile;
use crate::error::Result;

/// Read-only view of user display data
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>>;

    /// Profiles for every id that still exists; missing ids are absent
    async fn profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorProfile>>;
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>> {
        let row = sqlx::query("SELECT id, username, avatar FROM user_profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(profile_from_row).transpose()?)
    }

    async fn profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorProfile>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query("SELECT id, username, avatar FROM user_profiles WHERE id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut profiles = HashMap::with_capacity(rows.len());
        for row in &rows {
            let profile = profile_from_row(row)?;
            profiles.insert(profile.user_id, profile);
        }
        Ok(profiles)
    }
}

fn profile_from_row(row: &PgRow) -> std::result::Result<AuthorProfile, sqlx::Error> {
    Ok(AuthorProfile {
        user_id: row.try_get("id")?,
        username: row.try_get("username")?,
        avatar: row.try_get("avatar")?,
    })
}
