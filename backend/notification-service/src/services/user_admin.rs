//! Admin-side account management
//!
//! Every successful add/update/delete fans out a notification to all admins.
//! Fan-out problems are logged and never change the operation's result.

use chrono::Utc;
use futures::try_join;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::fanout::FanoutDispatcher;
use super::password::hash_password;
use crate::error::{AppError, Result};
use crate::models::{
    AdminProfile, ChannelPreferences, NewUser, NotificationKind, NotificationRecord, PageRequest,
    Pagination, UserAccount, UserFilter, UserPage, UserRole, UserStats, UserStatus, UserUpdate,
};
use crate::repository::UserRepository;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct UserAdminService {
    users: Arc<dyn UserRepository>,
    fanout: FanoutDispatcher,
}

impl UserAdminService {
    pub fn new(users: Arc<dyn UserRepository>, fanout: FanoutDispatcher) -> Self {
        Self { users, fanout }
    }

    pub async fn add_user(&self, input: NewUser) -> Result<UserAccount> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();
        validate_username(&username)?;
        validate_email(&email)?;
        if let Some(password) = &input.password {
            validate_password(password)?;
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        if self.users.find_by_username(&username, None).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let role = input.role.unwrap_or(UserRole::User);
        let mut status = input.status.unwrap_or(UserStatus::Inactive);

        let (admin_profile, preferences) = if role == UserRole::Admin {
            let defaults = AdminProfile::default();
            let mut profile = AdminProfile {
                position: non_blank(input.position).unwrap_or(defaults.position),
                department: non_blank(input.department).unwrap_or(defaults.department),
                permissions: input
                    .permissions
                    .filter(|p| !p.is_empty())
                    .unwrap_or(defaults.permissions),
                is_super: false,
                notes: input.notes.unwrap_or_default(),
            };

            // First admin bootstraps the console
            if self.users.count_admins().await? == 0 {
                profile.is_super = true;
                profile.permissions = vec!["all".to_string()];
                status = UserStatus::Active;
            }
            (Some(profile), Some(ChannelPreferences::for_new_admin()))
        } else {
            (None, None)
        };

        let now = Utc::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role,
            status,
            avatar: input.avatar,
            phone: input.phone,
            gender: input.gender,
            admin_profile,
            created_at: now,
            updated_at: now,
        };

        self.users.insert(&user, preferences).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "user added");

        self.notify(NotificationKind::Added, &user).await;
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<UserAccount> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(username) = update.username {
            let username = username.trim().to_string();
            validate_username(&username)?;
            if self
                .users
                .find_by_username(&username, Some(id))
                .await?
                .is_some()
            {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
            user.username = username;
        }

        if let Some(email) = update.email {
            let email = email.trim().to_lowercase();
            validate_email(&email)?;
            if let Some(other) = self.users.find_by_email(&email).await? {
                if other.id != id {
                    return Err(AppError::Conflict(
                        "User with this email already exists".to_string(),
                    ));
                }
            }
            user.email = email;
        }

        if let Some(password) = update.password {
            validate_password(&password)?;
            user.password_hash = Some(hash_password(&password)?);
        }

        if let Some(role) = update.role {
            user.role = role;
            user.admin_profile = match role {
                UserRole::Admin => user.admin_profile.or_else(|| Some(AdminProfile::default())),
                UserRole::User => None,
            };
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        if update.avatar.is_some() {
            user.avatar = update.avatar;
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if update.gender.is_some() {
            user.gender = update.gender;
        }
        user.updated_at = Utc::now();

        self.users.update(&user).await?;
        info!(user_id = %user.id, "user updated");

        self.notify(NotificationKind::Updated, &user).await;
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<UserAccount> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.is_admin() {
            return Err(AppError::Validation(
                "Admin accounts cannot be deleted".to_string(),
            ));
        }
        if user.status == UserStatus::Active {
            return Err(AppError::Validation(
                "Active users cannot be deleted".to_string(),
            ));
        }

        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        info!(user_id = %id, "user deleted");

        self.notify(NotificationKind::Deleted, &user).await;
        Ok(user)
    }

    /// Paged listing; the keyword only applies when present
    pub async fn search_users(&self, filter: UserFilter, page: PageRequest) -> Result<UserPage> {
        let (users, total) = try_join!(
            self.users.search_users(&filter, page.offset(), page.limit()),
            self.users.count_users(&filter),
        )?;

        Ok(UserPage {
            users,
            pagination: Pagination::new(&page, total),
        })
    }

    /// Exact-match filtering without keyword search
    pub async fn filter_users(&self, filter: UserFilter, page: PageRequest) -> Result<UserPage> {
        self.search_users(
            UserFilter {
                keyword: None,
                ..filter
            },
            page,
        )
        .await
    }

    pub async fn count_users(&self, filter: &UserFilter) -> Result<u64> {
        self.users.count_users(filter).await
    }

    pub async fn user_stats(&self) -> Result<UserStats> {
        let all = UserFilter::default();
        let active = UserFilter::with_status(UserStatus::Active);
        let male = UserFilter::with_gender("male");
        let female = UserFilter::with_gender("female");

        let (total, active, male, female) = try_join!(
            self.users.count_users(&all),
            self.users.count_users(&active),
            self.users.count_users(&male),
            self.users.count_users(&female),
        )?;

        Ok(UserStats {
            total,
            active,
            male,
            female,
        })
    }

    async fn notify(&self, kind: NotificationKind, subject: &UserAccount) {
        let record = NotificationRecord::for_user_event(kind, subject.id);
        match self.fanout.dispatch(&record, subject).await {
            Ok(report) if report.is_aborted() => {
                warn!(
                    user_id = %subject.id,
                    notification_id = %record.id,
                    error = report.error.as_deref().unwrap_or("unknown"),
                    "admin notification fan-out aborted"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    user_id = %subject.id,
                    notification_id = %record.id,
                    error = %e,
                    "admin notification fan-out failed"
                );
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
