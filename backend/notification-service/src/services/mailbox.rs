//! Per-admin notification mailboxes
//!
//! Every admin owns an independent copy of each record. Appends for
//! different admins run concurrently and a failed write for one admin is
//! logged and counted without touching the others.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    AdminAccount, ChannelPreferences, NotificationKind, NotificationRecord, PreferencesPatch,
};
use crate::repository::AdminDirectory;

/// Result of appending one record to every admin mailbox
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    pub updated: usize,
    pub failed: usize,
    /// First persistence error seen, if any
    pub first_error: Option<String>,
}

#[derive(Clone)]
pub struct MailboxService {
    directory: Arc<dyn AdminDirectory>,
}

impl MailboxService {
    pub fn new(directory: Arc<dyn AdminDirectory>) -> Self {
        Self { directory }
    }

    pub fn record_event(kind: NotificationKind, message: impl Into<String>) -> NotificationRecord {
        NotificationRecord::new(kind, message)
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminAccount>> {
        self.directory.list_admins().await
    }

    /// Append `record` to each of `admins` independently
    pub async fn append_to(
        &self,
        admins: &[AdminAccount],
        record: &NotificationRecord,
    ) -> AppendOutcome {
        let writes = admins.iter().map(|admin| async move {
            let result = self.directory.append_notification(admin.id, record).await;
            (admin.id, result)
        });

        let mut outcome = AppendOutcome::default();
        for (admin_id, result) in join_all(writes).await {
            match result {
                Ok(()) => {
                    metrics::record_delivery("mailbox", true);
                    outcome.updated += 1;
                }
                Err(e) => {
                    metrics::record_delivery("mailbox", false);
                    warn!(
                        admin_id = %admin_id,
                        notification_id = %record.id,
                        error = %e,
                        "failed to append notification to admin mailbox"
                    );
                    outcome.failed += 1;
                    if outcome.first_error.is_none() {
                        outcome.first_error = Some(e.to_string());
                    }
                }
            }
        }
        outcome
    }

    /// Append `record` to every admin's mailbox
    pub async fn append_to_all_admins(&self, record: &NotificationRecord) -> Result<AppendOutcome> {
        let admins = self.directory.list_admins().await?;
        Ok(self.append_to(&admins, record).await)
    }

    /// Mailbox contents in insertion order
    pub async fn list(&self, admin_id: Uuid) -> Result<Vec<NotificationRecord>> {
        self.require_admin(admin_id).await?;
        self.directory.mailbox(admin_id).await
    }

    pub async fn mark_read(&self, admin_id: Uuid, notification_id: Uuid) -> Result<()> {
        self.require_admin(admin_id).await?;
        if !self.directory.mark_read(admin_id, notification_id).await? {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        debug!(admin_id = %admin_id, notification_id = %notification_id, "notification marked read");
        Ok(())
    }

    /// Marks every entry read; an empty mailbox is not an error
    pub async fn mark_all_read(&self, admin_id: Uuid) -> Result<u64> {
        self.require_admin(admin_id).await?;
        let changed = self.directory.mark_all_read(admin_id).await?;
        debug!(admin_id = %admin_id, changed, "mailbox marked read");
        Ok(changed)
    }

    /// Current preferences, storing the defaults on first access
    pub async fn preferences(&self, admin_id: Uuid) -> Result<ChannelPreferences> {
        let admin = self.require_admin(admin_id).await?;
        match admin.preferences {
            Some(prefs) => Ok(prefs),
            None => {
                let prefs = ChannelPreferences::default();
                self.directory.save_preferences(admin_id, prefs).await?;
                Ok(prefs)
            }
        }
    }

    pub async fn update_preferences(
        &self,
        admin_id: Uuid,
        patch: PreferencesPatch,
    ) -> Result<ChannelPreferences> {
        if patch.is_empty() {
            return Err(AppError::Validation(
                "At least one notification setting must be provided".to_string(),
            ));
        }

        let admin = self.require_admin(admin_id).await?;
        let updated = patch.apply(admin.effective_preferences());
        self.directory.save_preferences(admin_id, updated).await?;
        Ok(updated)
    }

    async fn require_admin(&self, admin_id: Uuid) -> Result<AdminAccount> {
        self.directory
            .find_admin(admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserAccount, UserRole, UserStatus};
    use crate::repository::{MemoryDirectory, UserRepository};
    use chrono::Utc;

    async fn seeded(admins: usize) -> (Arc<MemoryDirectory>, Vec<Uuid>) {
        let dir = Arc::new(MemoryDirectory::new());
        let mut ids = Vec::new();
        for i in 0..admins {
            let now = Utc::now();
            let user = UserAccount {
                id: Uuid::new_v4(),
                username: format!("admin{}", i),
                email: format!("admin{}@example.com", i),
                password_hash: None,
                role: UserRole::Admin,
                status: UserStatus::Active,
                avatar: None,
                phone: None,
                gender: None,
                admin_profile: None,
                created_at: now,
                updated_at: now,
            };
            dir.insert(&user, None).await.unwrap();
            ids.push(user.id);
        }
        (dir, ids)
    }

    #[tokio::test]
    async fn test_append_reaches_every_admin() {
        let (dir, ids) = seeded(3).await;
        let service = MailboxService::new(dir.clone());
        let record = MailboxService::record_event(NotificationKind::Added, "hi");

        let outcome = service.append_to_all_admins(&record).await.unwrap();
        assert_eq!(outcome.updated, 3);
        assert_eq!(outcome.failed, 0);

        for id in ids {
            let mailbox = service.list(id).await.unwrap();
            assert_eq!(mailbox, vec![record.clone()]);
        }
    }

    #[tokio::test]
    async fn test_mark_read_unknown_entry_is_not_found() {
        let (dir, ids) = seeded(1).await;
        let service = MailboxService::new(dir);

        let err = service.mark_read(ids[0], Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Notification not found"));

        let err = service
            .mark_read(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Admin not found"));
    }

    #[tokio::test]
    async fn test_mark_all_read_on_empty_mailbox() {
        let (dir, ids) = seeded(1).await;
        let service = MailboxService::new(dir);
        assert_eq!(service.mark_all_read(ids[0]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preferences_materialize_defaults() {
        let (dir, ids) = seeded(1).await;
        let service = MailboxService::new(dir.clone());

        assert_eq!(
            service.preferences(ids[0]).await.unwrap(),
            ChannelPreferences::default()
        );
        let stored = dir.find_admin(ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.preferences, Some(ChannelPreferences::default()));
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected() {
        let (dir, ids) = seeded(1).await;
        let service = MailboxService::new(dir);

        let err = service
            .update_preferences(ids[0], PreferencesPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_patch_keeps_unspecified_fields() {
        let (dir, ids) = seeded(1).await;
        let service = MailboxService::new(dir);

        let prefs = service
            .update_preferences(
                ids[0],
                PreferencesPatch {
                    push: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!prefs.push);
        assert!(!prefs.email);
        assert!(!prefs.sms);
    }
}
