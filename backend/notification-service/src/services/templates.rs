//! HTML bodies for admin notification emails

use chrono::{DateTime, Utc};

use crate::models::{NotificationKind, UserAccount};

pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Escape text interpolated into HTML bodies
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn subject_for(kind: NotificationKind, subject_is_admin: bool) -> String {
    let who = if subject_is_admin { "admin" } else { "user" };
    match kind {
        NotificationKind::Added => format!("New {} added", who),
        NotificationKind::Updated => format!("{} updated", capitalize(who)),
        NotificationKind::Deleted => format!("{} deleted", capitalize(who)),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Email sent to `admin_username` about a change to `subject`
pub fn render_user_event(
    kind: NotificationKind,
    admin_username: &str,
    subject: &UserAccount,
    at: DateTime<Utc>,
) -> RenderedEmail {
    let mut details = format!(
        "<li><strong>Username:</strong> {}</li>\n        <li><strong>Email:</strong> {}</li>\n        <li><strong>Role:</strong> {}</li>",
        escape_html(&subject.username),
        escape_html(&subject.email),
        subject.role.as_str(),
    );
    if let Some(profile) = &subject.admin_profile {
        details.push_str(&format!(
            "\n        <li><strong>Department:</strong> {}</li>\n        <li><strong>Position:</strong> {}</li>",
            escape_html(&profile.department),
            escape_html(&profile.position),
        ));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <h2>Hello {admin},</h2>
    <p>An account has been {action}:</p>
    <ul>
        {details}
    </ul>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">{timestamp}</p>
</body>
</html>"#,
        admin = escape_html(admin_username),
        action = kind.as_str(),
        details = details,
        timestamp = at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    RenderedEmail {
        subject: subject_for(kind, subject.is_admin()),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminProfile, UserRole, UserStatus};
    use uuid::Uuid;

    fn subject(role: UserRole) -> UserAccount {
        let now = Utc::now();
        UserAccount {
            id: Uuid::new_v4(),
            username: "<script>".to_string(),
            email: "mallory@example.com".to_string(),
            password_hash: None,
            role,
            status: UserStatus::Inactive,
            avatar: None,
            phone: None,
            gender: None,
            admin_profile: (role == UserRole::Admin).then(AdminProfile::default),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_username_is_escaped() {
        let email = render_user_event(
            NotificationKind::Added,
            "root",
            &subject(UserRole::User),
            Utc::now(),
        );
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert_eq!(email.subject, "New user added");
    }

    #[test]
    fn test_admin_details_included() {
        let email = render_user_event(
            NotificationKind::Updated,
            "root",
            &subject(UserRole::Admin),
            Utc::now(),
        );
        assert!(email.html.contains("General"));
        assert!(email.html.contains("Staff"));
        assert_eq!(email.subject, "Admin updated");
    }
}
