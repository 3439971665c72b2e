use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Administrative event kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Added,
    Updated,
    Deleted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Added => "added",
            NotificationKind::Updated => "updated",
            NotificationKind::Deleted => "deleted",
        }
    }

    /// Name of the real-time event carrying this kind
    pub fn event_name(&self) -> &'static str {
        match self {
            NotificationKind::Added => "userAdded",
            NotificationKind::Updated => "userUpdated",
            NotificationKind::Deleted => "userDeleted",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(NotificationKind::Added),
            "updated" => Ok(NotificationKind::Updated),
            "deleted" => Ok(NotificationKind::Deleted),
            other => Err(format!("unknown notification kind: {}", other)),
        }
    }
}

/// One administrative event as stored in an admin's mailbox
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Record announcing a change to the user `subject_id`
    pub fn for_user_event(kind: NotificationKind, subject_id: Uuid) -> Self {
        Self::new(
            kind,
            format!("User <strong>{}</strong> has been {}", subject_id, kind.as_str()),
        )
    }
}

/// Delivery channels an admin has opted into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelPreferences {
    pub push: bool,
    pub email: bool,
    /// Stored but not delivered
    pub sms: bool,
}

impl Default for ChannelPreferences {
    fn default() -> Self {
        Self {
            push: true,
            email: false,
            sms: false,
        }
    }
}

impl ChannelPreferences {
    /// Preferences granted to newly created admin accounts
    pub fn for_new_admin() -> Self {
        Self {
            push: true,
            email: true,
            sms: false,
        }
    }
}

/// Partial preference update; omitted fields keep their value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub push: Option<bool>,
    #[serde(default)]
    pub email: Option<bool>,
    #[serde(default)]
    pub sms: Option<bool>,
}

impl PreferencesPatch {
    pub fn is_empty(&self) -> bool {
        self.push.is_none() && self.email.is_none() && self.sms.is_none()
    }

    pub fn apply(&self, prefs: ChannelPreferences) -> ChannelPreferences {
        ChannelPreferences {
            push: self.push.unwrap_or(prefs.push),
            email: self.email.unwrap_or(prefs.email),
            sms: self.sms.unwrap_or(prefs.sms),
        }
    }
}

/// Fan-out recipient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// `None` until the admin first touches their settings
    pub preferences: Option<ChannelPreferences>,
}

impl AdminAccount {
    pub fn effective_preferences(&self) -> ChannelPreferences {
        self.preferences.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Banned => "banned",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "banned" => Ok(UserStatus::Banned),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff details carried by admin accounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminProfile {
    pub position: String,
    pub department: String,
    pub permissions: Vec<String>,
    pub is_super: bool,
    #[serde(default)]
    pub notes: String,
}

impl Default for AdminProfile {
    fn default() -> Self {
        Self {
            position: "Staff".to_string(),
            department: "General".to_string(),
            permissions: vec!["view".to_string(), "edit".to_string()],
            is_super: false,
            notes: String::new(),
        }
    }
}

/// Managed user account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub admin_profile: Option<AdminProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Exact-match criteria plus an optional case-insensitive keyword on
/// username or email
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &UserAccount) -> bool {
        if self.status.is_some_and(|status| status != user.status) {
            return false;
        }
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        if let Some(gender) = &self.gender {
            if user.gender.as_deref() != Some(gender.as_str()) {
                return false;
            }
        }
        match self.keyword_lowercase() {
            Some(keyword) => {
                user.username.to_lowercase().contains(&keyword)
                    || user.email.to_lowercase().contains(&keyword)
            }
            None => true,
        }
    }

    /// Trimmed lowercase keyword; blank keywords match everything
    pub fn keyword_lowercase(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }

    pub fn with_status(status: UserStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_gender(gender: &str) -> Self {
        Self {
            gender: Some(gender.to_string()),
            ..Default::default()
        }
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
}

impl Pagination {
    pub fn new(request: &PageRequest, total: u64) -> Self {
        Self {
            current_page: request.page(),
            total_pages: total.div_ceil(u64::from(request.limit())),
            total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<UserAccount>,
    pub pagination: Pagination,
}

/// Head counts shown on the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub male: u64,
    pub female: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        let request = PageRequest {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), MAX_PAGE_SIZE);
        assert_eq!(request.offset(), 0);

        let request = PageRequest {
            page: Some(3),
            limit: Some(4),
        };
        assert_eq!(request.offset(), 8);
        assert_eq!(Pagination::new(&request, 9).total_pages, 3);
        assert_eq!(Pagination::new(&PageRequest::default(), 0).total_pages, 0);
    }

    #[test]
    fn test_filter_keyword_is_case_insensitive() {
        let now = Utc::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            username: "TrinityX".to_string(),
            email: "trin@Zion.io".to_string(),
            password_hash: None,
            role: UserRole::User,
            status: UserStatus::Active,
            avatar: None,
            phone: None,
            gender: Some("female".to_string()),
            admin_profile: None,
            created_at: now,
            updated_at: now,
        };

        let by_name = UserFilter {
            keyword: Some("trinity".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&user));

        let by_mail = UserFilter {
            keyword: Some(" ZION ".to_string()),
            gender: Some("female".to_string()),
            ..Default::default()
        };
        assert!(by_mail.matches(&user));

        assert!(!UserFilter::with_status(UserStatus::Banned).matches(&user));
        assert!(!UserFilter::with_gender("male").matches(&user));
    }

    #[test]
    fn test_record_defaults_to_unread() {
        let subject = Uuid::new_v4();
        let record = NotificationRecord::for_user_event(NotificationKind::Deleted, subject);

        assert!(!record.read);
        assert_eq!(
            record.message,
            format!("User <strong>{}</strong> has been deleted", subject)
        );
        assert_eq!(record.kind.event_name(), "userDeleted");
    }

    #[test]
    fn test_default_preferences_push_only() {
        let prefs = ChannelPreferences::default();
        assert!(prefs.push);
        assert!(!prefs.email);
        assert!(!prefs.sms);
    }

    #[test]
    fn test_patch_only_touches_provided_fields() {
        let patch = PreferencesPatch {
            email: Some(true),
            ..Default::default()
        };
        let prefs = patch.apply(ChannelPreferences::default());
        assert_eq!(
            prefs,
            ChannelPreferences {
                push: true,
                email: true,
                sms: false
            }
        );
        assert!(PreferencesPatch::default().is_empty());
    }

    #[test]
    fn test_patch_rejects_non_boolean_values() {
        let parsed: Result<PreferencesPatch, _> =
            serde_json::from_value(serde_json::json!({ "push": "yes" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let now = Utc::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            username: "neo".to_string(),
            email: "neo@example.com".to_string(),
            password_hash: Some("secret-hash".to_string()),
            role: UserRole::User,
            status: UserStatus::Inactive,
            avatar: None,
            phone: None,
            gender: None,
            admin_profile: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
