use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{AdminAccount, ChannelPreferences, NotificationKind, NotificationRecord};

/// Admin recipients and their independent mailboxes
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn list_admins(&self) -> Result<Vec<AdminAccount>>;

    async fn find_admin(&self, admin_id: Uuid) -> Result<Option<AdminAccount>>;

    /// Append one copy of `record` to a single admin's mailbox
    async fn append_notification(&self, admin_id: Uuid, record: &NotificationRecord)
        -> Result<()>;

    /// Mailbox entries in append order
    async fn mailbox(&self, admin_id: Uuid) -> Result<Vec<NotificationRecord>>;

    /// Returns false when the entry does not exist
    async fn mark_read(&self, admin_id: Uuid, notification_id: Uuid) -> Result<bool>;

    /// Returns the number of entries that flipped to read
    async fn mark_all_read(&self, admin_id: Uuid) -> Result<u64>;

    async fn save_preferences(&self, admin_id: Uuid, prefs: ChannelPreferences) -> Result<()>;
}

pub struct PgAdminDirectory {
    pool: PgPool,
}

impl PgAdminDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ADMIN_SELECT: &str = r#"
    SELECT u.id, u.username, u.email,
           p.push AS pref_push, p.email AS pref_email, p.sms AS pref_sms
    FROM users u
    LEFT JOIN admin_notification_preferences p ON p.admin_id = u.id
    WHERE u.role = 'admin'
"#;

#[async_trait]
impl AdminDirectory for PgAdminDirectory {
    async fn list_admins(&self) -> Result<Vec<AdminAccount>> {
        let query = format!("{} ORDER BY u.created_at ASC", ADMIN_SELECT);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut admins = Vec::with_capacity(rows.len());
        for row in &rows {
            admins.push(admin_from_row(row)?);
        }
        Ok(admins)
    }

    async fn find_admin(&self, admin_id: Uuid) -> Result<Option<AdminAccount>> {
        let query = format!("{} AND u.id = $1", ADMIN_SELECT);
        let row = sqlx::query(&query)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(admin_from_row).transpose()?)
    }

    async fn append_notification(
        &self,
        admin_id: Uuid,
        record: &NotificationRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_notifications (admin_id, notification_id, kind, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (admin_id, notification_id) DO NOTHING
            "#,
        )
        .bind(admin_id)
        .bind(record.id)
        .bind(record.kind.as_str())
        .bind(&record.message)
        .bind(record.read)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mailbox(&self, admin_id: Uuid) -> Result<Vec<NotificationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT notification_id, kind, message, read, created_at
            FROM admin_notifications
            WHERE admin_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }

    async fn mark_read(&self, admin_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE admin_notifications SET read = TRUE WHERE admin_id = $1 AND notification_id = $2",
        )
        .bind(admin_id)
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, admin_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE admin_notifications SET read = TRUE WHERE admin_id = $1 AND read = FALSE",
        )
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn save_preferences(&self, admin_id: Uuid, prefs: ChannelPreferences) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_notification_preferences (admin_id, push, email, sms, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (admin_id) DO UPDATE
            SET push = EXCLUDED.push,
                email = EXCLUDED.email,
                sms = EXCLUDED.sms,
                updated_at = NOW()
            "#,
        )
        .bind(admin_id)
        .bind(prefs.push)
        .bind(prefs.email)
        .bind(prefs.sms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn admin_from_row(row: &PgRow) -> std::result::Result<AdminAccount, sqlx::Error> {
    let push: Option<bool> = row.try_get("pref_push")?;
    let email: Option<bool> = row.try_get("pref_email")?;
    let sms: Option<bool> = row.try_get("pref_sms")?;

    // LEFT JOIN miss: no stored preferences yet
    let preferences = match (push, email, sms) {
        (Some(push), Some(email), Some(sms)) => Some(ChannelPreferences { push, email, sms }),
        _ => None,
    };

    Ok(AdminAccount {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        preferences,
    })
}

fn record_from_row(row: &PgRow) -> Result<NotificationRecord> {
    let kind: String = row.try_get("kind")?;
    let kind = kind
        .parse::<NotificationKind>()
        .map_err(AppError::Internal)?;

    Ok(NotificationRecord {
        id: row.try_get("notification_id")?,
        kind,
        message: row.try_get("message")?,
        read: row.try_get("read")?,
        created_at: row.try_get("created_at")?,
    })
}
