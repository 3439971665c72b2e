//! PostgreSQL store tests
//!
//! Run against a scratch database:
//! DATABASE_URL=postgres://... cargo test --test pg_store_tests -- --ignored

use chrono::{Duration, Utc};
use notification_service::models::{
    ChannelPreferences, NotificationKind, NotificationRecord, UserAccount, UserFilter, UserRole,
    UserStatus,
};
use notification_service::repository::{
    AdminDirectory, PgAdminDirectory, PgUserRepository, UserRepository,
};
use notification_service::AppError;
use sqlx::PgPool;
use uuid::Uuid;

fn account(name: &str, role: UserRole, offset_secs: i64) -> UserAccount {
    let created = Utc::now() + Duration::seconds(offset_secs);
    UserAccount {
        id: Uuid::new_v4(),
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password_hash: None,
        role,
        status: UserStatus::Inactive,
        avatar: None,
        phone: None,
        gender: None,
        admin_profile: None,
        created_at: created,
        updated_at: created,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // Requires DATABASE_URL
async fn test_mailbox_keeps_append_order_and_read_flags(pool: PgPool) {
    let users = PgUserRepository::new(pool.clone());
    let directory = PgAdminDirectory::new(pool.clone());

    let admin = account("morpheus", UserRole::Admin, 0);
    users
        .insert(&admin, Some(ChannelPreferences::for_new_admin()))
        .await
        .unwrap();

    let records: Vec<NotificationRecord> = (0..4)
        .map(|i| NotificationRecord::new(NotificationKind::Updated, format!("event {}", i)))
        .collect();
    for record in &records {
        directory.append_notification(admin.id, record).await.unwrap();
    }
    // Same record again is a no-op
    directory
        .append_notification(admin.id, &records[1])
        .await
        .unwrap();

    let mailbox = directory.mailbox(admin.id).await.unwrap();
    let ids: Vec<Uuid> = mailbox.iter().map(|n| n.id).collect();
    let expected: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, expected);
    assert!(mailbox.iter().all(|n| !n.read));

    assert!(directory.mark_read(admin.id, records[2].id).await.unwrap());
    assert!(!directory.mark_read(admin.id, Uuid::new_v4()).await.unwrap());
    assert_eq!(directory.mark_all_read(admin.id).await.unwrap(), 3);

    let late = NotificationRecord::new(NotificationKind::Deleted, "late");
    directory.append_notification(admin.id, &late).await.unwrap();

    let mailbox = directory.mailbox(admin.id).await.unwrap();
    assert_eq!(mailbox.len(), 5);
    assert!(mailbox[..4].iter().all(|n| n.read));
    assert_eq!(mailbox[4].id, late.id);
    assert!(!mailbox[4].read);

    let stored = directory.find_admin(admin.id).await.unwrap().unwrap();
    assert_eq!(stored.preferences, Some(ChannelPreferences::for_new_admin()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // Requires DATABASE_URL
async fn test_unique_violations_map_to_conflict(pool: PgPool) {
    let users = PgUserRepository::new(pool);

    let neo = account("neo", UserRole::User, 0);
    users.insert(&neo, None).await.unwrap();

    let mut same_email = account("thomas", UserRole::User, 1);
    same_email.email = neo.email.clone();
    let err = users.insert(&same_email, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let smith = account("smith", UserRole::User, 2);
    users.insert(&smith, None).await.unwrap();

    let mut clash = smith.clone();
    clash.username = "neo".to_string();
    let err = users.update(&clash).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let missing = account("ghost", UserRole::User, 3);
    let err = users.update(&missing).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // Requires DATABASE_URL
async fn test_search_filters_and_pages(pool: PgPool) {
    let users = PgUserRepository::new(pool);

    let mut trinity = account("Trinity", UserRole::User, 0);
    trinity.gender = Some("female".to_string());
    trinity.status = UserStatus::Active;
    let mut niobe = account("niobe", UserRole::Admin, 1);
    niobe.gender = Some("female".to_string());
    niobe.email = "captain@TRINITY-fleet.io".to_string();
    let mut tank = account("tank_op", UserRole::User, 2);
    tank.gender = Some("male".to_string());
    for user in [&trinity, &niobe, &tank] {
        users.insert(user, None).await.unwrap();
    }

    let keyword = UserFilter {
        keyword: Some("trinity".to_string()),
        ..Default::default()
    };
    assert_eq!(users.count_users(&keyword).await.unwrap(), 2);
    let page: Vec<Uuid> = users
        .search_users(&keyword, 0, 10)
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(page, vec![trinity.id, niobe.id]);

    let second_page = users.search_users(&keyword, 1, 1).await.unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].id, niobe.id);

    // LIKE wildcards in the keyword match literally
    let underscore = UserFilter {
        keyword: Some("_".to_string()),
        ..Default::default()
    };
    assert_eq!(users.count_users(&underscore).await.unwrap(), 1);

    let female_users = UserFilter {
        role: Some(UserRole::User),
        gender: Some("female".to_string()),
        ..Default::default()
    };
    assert_eq!(users.count_users(&female_users).await.unwrap(), 1);

    assert_eq!(
        users
            .count_users(&UserFilter::with_status(UserStatus::Active))
            .await
            .unwrap(),
        1
    );
    assert_eq!(users.count_users(&UserFilter::default()).await.unwrap(), 3);
}
