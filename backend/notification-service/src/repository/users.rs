use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    AdminProfile, ChannelPreferences, UserAccount, UserFilter, UserRole, UserStatus,
};

/// Managed accounts whose changes trigger admin notifications
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    /// Username lookup; `exclude` skips the account being edited
    async fn find_by_username(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<UserAccount>>;

    async fn count_admins(&self) -> Result<i64>;

    /// Persist a new account; admin accounts may carry initial preferences
    async fn insert(
        &self,
        user: &UserAccount,
        preferences: Option<ChannelPreferences>,
    ) -> Result<()>;

    async fn update(&self, user: &UserAccount) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// One page of matching accounts, oldest first
    async fn search_users(
        &self,
        filter: &UserFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<UserAccount>>;

    async fn count_users(&self, filter: &UserFilter) -> Result<u64>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, status, avatar, phone, gender, admin_profile, created_at, updated_at";

const USER_FILTER: &str = "($1::text IS NULL OR status = $1) \
     AND ($2::text IS NULL OR role = $2) \
     AND ($3::text IS NULL OR gender = $3) \
     AND ($4::text IS NULL OR username ILIKE $4 OR email ILIKE $4)";

fn conflict() -> AppError {
    AppError::Conflict("User with this email or username already exists".to_string())
}

/// `%keyword%` with LIKE wildcards in the keyword taken literally
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn bind_filter<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    filter: &UserFilter,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.gender.clone())
        .bind(filter.keyword_lowercase().map(|k| like_pattern(&k)))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<UserAccount>> {
        let query = format!(
            "SELECT {} FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1",
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(username)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn count_admins(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(
        &self,
        user: &UserAccount,
        preferences: Option<ChannelPreferences>,
    ) -> Result<()> {
        let admin_profile = user
            .admin_profile
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, status, avatar, phone, gender, admin_profile, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(&user.avatar)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(admin_profile)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.is_unique_violation() {
                return Err(conflict());
            }
        }
        inserted?;

        if let Some(prefs) = preferences {
            sqlx::query(
                r#"
                INSERT INTO admin_notification_preferences (admin_id, push, email, sms)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user.id)
            .bind(prefs.push)
            .bind(prefs.email)
            .bind(prefs.sms)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, user: &UserAccount) -> Result<()> {
        let admin_profile = user
            .admin_profile
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, role = $5, status = $6,
                avatar = $7, phone = $8, gender = $9, admin_profile = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(&user.avatar)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(admin_profile)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        let result = match result {
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(conflict());
            }
            other => other?,
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_users(
        &self,
        filter: &UserFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<UserAccount>> {
        let query = format!(
            "SELECT {} FROM users WHERE {} ORDER BY created_at ASC, id ASC LIMIT $5 OFFSET $6",
            USER_COLUMNS, USER_FILTER
        );
        let rows = bind_filter(sqlx::query(&query), filter)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM users WHERE {}", USER_FILTER);
        let row = bind_filter(sqlx::query(&query), filter)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }
}

fn user_from_row(row: &PgRow) -> Result<UserAccount> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    let admin_profile: Option<serde_json::Value> = row.try_get("admin_profile")?;
    let admin_profile = admin_profile
        .map(serde_json::from_value::<AdminProfile>)
        .transpose()?;

    Ok(UserAccount {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse::<UserRole>().map_err(AppError::Internal)?,
        status: status.parse::<UserStatus>().map_err(AppError::Internal)?,
        avatar: row.try_get("avatar")?,
        phone: row.try_get("phone")?,
        gender: row.try_get("gender")?,
        admin_profile,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
