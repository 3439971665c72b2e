//! In-process directory backed by `DashMap`
//!
//! Each admin's mailbox is its own map entry, so appends for different
//! admins never contend on the same guard.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{AdminDirectory, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{
    AdminAccount, ChannelPreferences, NotificationRecord, UserAccount, UserFilter,
};

#[derive(Default)]
pub struct MemoryDirectory {
    users: DashMap<Uuid, UserAccount>,
    /// Unique keys owned by an account id
    emails: DashMap<String, Uuid>,
    usernames: DashMap<String, Uuid>,
    preferences: DashMap<Uuid, ChannelPreferences>,
    mailboxes: DashMap<Uuid, Vec<NotificationRecord>>,
}

fn conflict() -> AppError {
    AppError::Conflict("User with this email or username already exists".to_string())
}

/// Take `key` for `owner` under the shard guard; false when someone else holds it
fn claim(index: &DashMap<String, Uuid>, key: &str, owner: Uuid) -> bool {
    match index.entry(key.to_string()) {
        Entry::Occupied(entry) => *entry.get() == owner,
        Entry::Vacant(entry) => {
            entry.insert(owner);
            true
        }
    }
}

fn release(index: &DashMap<String, Uuid>, key: &str, owner: Uuid) {
    index.remove_if(key, |_, held_by| *held_by == owner);
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn admin_account(&self, user: &UserAccount) -> AdminAccount {
        AdminAccount {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            preferences: self.preferences.get(&user.id).map(|p| *p),
        }
    }
}

#[async_trait]
impl AdminDirectory for MemoryDirectory {
    async fn list_admins(&self) -> Result<Vec<AdminAccount>> {
        let mut admins: Vec<UserAccount> = self
            .users
            .iter()
            .filter(|entry| entry.is_admin())
            .map(|entry| entry.value().clone())
            .collect();
        admins.sort_by_key(|u| u.created_at);

        Ok(admins.iter().map(|u| self.admin_account(u)).collect())
    }

    async fn find_admin(&self, admin_id: Uuid) -> Result<Option<AdminAccount>> {
        let user = match self.users.get(&admin_id) {
            Some(user) if user.is_admin() => user.clone(),
            _ => return Ok(None),
        };
        Ok(Some(self.admin_account(&user)))
    }

    async fn append_notification(
        &self,
        admin_id: Uuid,
        record: &NotificationRecord,
    ) -> Result<()> {
        if !self.users.contains_key(&admin_id) {
            return Err(AppError::NotFound("Admin not found".to_string()));
        }

        let mut mailbox = self.mailboxes.entry(admin_id).or_default();
        if !mailbox.iter().any(|entry| entry.id == record.id) {
            mailbox.push(record.clone());
        }
        Ok(())
    }

    async fn mailbox(&self, admin_id: Uuid) -> Result<Vec<NotificationRecord>> {
        Ok(self
            .mailboxes
            .get(&admin_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }

    async fn mark_read(&self, admin_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let Some(mut mailbox) = self.mailboxes.get_mut(&admin_id) else {
            return Ok(false);
        };
        match mailbox.iter_mut().find(|entry| entry.id == notification_id) {
            Some(entry) => {
                entry.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, admin_id: Uuid) -> Result<u64> {
        let Some(mut mailbox) = self.mailboxes.get_mut(&admin_id) else {
            return Ok(0);
        };
        let mut changed = 0;
        for entry in mailbox.iter_mut().filter(|entry| !entry.read) {
            entry.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn save_preferences(&self, admin_id: Uuid, prefs: ChannelPreferences) -> Result<()> {
        self.preferences.insert(admin_id, prefs);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let Some(id) = self.emails.get(email).map(|owner| *owner) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_username(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<UserAccount>> {
        let Some(id) = self.usernames.get(username).map(|owner| *owner) else {
            return Ok(None);
        };
        if Some(id) == exclude {
            return Ok(None);
        }
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn count_admins(&self) -> Result<i64> {
        Ok(self.users.iter().filter(|entry| entry.is_admin()).count() as i64)
    }

    async fn insert(
        &self,
        user: &UserAccount,
        preferences: Option<ChannelPreferences>,
    ) -> Result<()> {
        if !claim(&self.emails, &user.email, user.id) {
            return Err(conflict());
        }
        if !claim(&self.usernames, &user.username, user.id) {
            release(&self.emails, &user.email, user.id);
            return Err(conflict());
        }

        if let Some(prefs) = preferences {
            self.preferences.insert(user.id, prefs);
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &UserAccount) -> Result<()> {
        let previous = self
            .users
            .get(&user.id)
            .map(|u| u.clone())
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let email_changed = previous.email != user.email;
        let username_changed = previous.username != user.username;

        if email_changed && !claim(&self.emails, &user.email, user.id) {
            return Err(conflict());
        }
        if username_changed && !claim(&self.usernames, &user.username, user.id) {
            if email_changed {
                release(&self.emails, &user.email, user.id);
            }
            return Err(conflict());
        }

        match self.users.get_mut(&user.id) {
            Some(mut existing) => *existing = user.clone(),
            None => return Err(AppError::NotFound("User not found".to_string())),
        }

        if email_changed {
            release(&self.emails, &previous.email, user.id);
        }
        if username_changed {
            release(&self.usernames, &previous.username, user.id);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let Some((_, user)) = self.users.remove(&id) else {
            return Ok(false);
        };
        release(&self.emails, &user.email, id);
        release(&self.usernames, &user.username, id);
        self.preferences.remove(&id);
        self.mailboxes.remove(&id);
        Ok(true)
    }

    async fn search_users(
        &self,
        filter: &UserFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<UserAccount>> {
        let mut matching: Vec<UserAccount> = self
            .users
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<u64> {
        Ok(self
            .users
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count() as u64)
    }
}
