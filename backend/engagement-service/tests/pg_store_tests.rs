//! PostgreSQL store tests
//!
//! Run against a scratch database:
//! DATABASE_URL=postgres://... cargo test --test pg_store_tests -- --ignored

use engagement_service::domain::{NewComment, ReactionTarget};
use engagement_service::repository::{CommentStore, PgCommentStore, Stores};
use engagement_service::AppState;
use futures::future::join_all;
use sqlx::{PgPool, Row};
use uuid::Uuid;

async fn add_profile(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO user_profiles (id, username, avatar) VALUES ($1, $2, NULL)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .expect("Failed to create profile");
    id
}

fn new_comment(body: &str, parent_id: Option<Uuid>) -> NewComment {
    NewComment {
        content_id: "movie".to_string(),
        content_name: "Movie".to_string(),
        content_thumb: None,
        body: body.to_string(),
        is_spoiler: Some(false),
        parent_id,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // Requires DATABASE_URL
async fn test_concurrent_toggles_keep_counts_equal_to_sets(pool: PgPool) {
    let state = AppState::new(Stores::postgres(pool.clone()));
    let author = add_profile(&pool, "author").await;
    let comment = state
        .threads
        .create_comment(author, new_comment("A", None))
        .await
        .unwrap();

    let mut users = Vec::new();
    for i in 0..12 {
        users.push(add_profile(&pool, &format!("user{i}")).await);
    }

    let target = ReactionTarget::Comment(comment.id);
    let toggles = users.iter().enumerate().map(|(i, user)| {
        let ledger = state.ledger.clone();
        let user = *user;
        async move {
            if i % 3 == 0 {
                ledger.toggle_dislike(user, target).await
            } else {
                ledger.toggle_like(user, target).await
            }
        }
    });
    for result in join_all(toggles).await {
        result.unwrap();
    }

    let row = sqlx::query(
        "SELECT like_count, dislike_count, cardinality(liked_by) AS likes, \
         cardinality(disliked_by) AS dislikes FROM comments WHERE id = $1",
    )
    .bind(comment.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let like_count: i64 = row.get("like_count");
    let dislike_count: i64 = row.get("dislike_count");
    assert_eq!(like_count, 8);
    assert_eq!(dislike_count, 4);
    assert_eq!(like_count, i64::from(row.get::<i32, _>("likes")));
    assert_eq!(dislike_count, i64::from(row.get::<i32, _>("dislikes")));

    // Switching a like to a dislike moves the user between sets
    let snapshot = state.ledger.toggle_dislike(users[1], target).await.unwrap();
    assert_eq!(snapshot.like_count, 7);
    assert_eq!(snapshot.dislike_count, 5);
    assert!(snapshot.is_disliked && !snapshot.is_liked);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // Requires DATABASE_URL
async fn test_reply_is_linked_from_parent(pool: PgPool) {
    let state = AppState::new(Stores::postgres(pool.clone()));
    let alice = add_profile(&pool, "alice").await;

    let root = state.threads.create_comment(alice, new_comment("A", None)).await.unwrap();
    let first = state
        .threads
        .create_comment(alice, new_comment("B", Some(root.id)))
        .await
        .unwrap();
    let second = state
        .threads
        .create_comment(alice, new_comment("C", Some(root.id)))
        .await
        .unwrap();

    let store = PgCommentStore::new(pool.clone());
    let parent = store.get_comment(root.id).await.unwrap().unwrap();
    assert_eq!(parent.reply_ids, vec![first.id, second.id]);

    let missing_parent = state
        .threads
        .create_comment(alice, new_comment("D", Some(Uuid::new_v4())))
        .await;
    assert!(missing_parent.is_err());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // Requires DATABASE_URL
async fn test_reply_of_deleted_parent_is_not_promoted(pool: PgPool) {
    let state = AppState::new(Stores::postgres(pool.clone()));
    let alice = add_profile(&pool, "alice").await;

    let a = state.threads.create_comment(alice, new_comment("A", None)).await.unwrap();
    let b = state
        .threads
        .create_comment(alice, new_comment("B", Some(a.id)))
        .await
        .unwrap();
    state
        .threads
        .create_comment(alice, new_comment("C", Some(b.id)))
        .await
        .unwrap();
    let other = state.threads.create_comment(alice, new_comment("D", None)).await.unwrap();

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(a.id)
        .execute(&pool)
        .await
        .unwrap();

    let parent_id: Option<Uuid> = sqlx::query_scalar("SELECT parent_id FROM comments WHERE id = $1")
        .bind(b.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(parent_id, Some(a.id));

    let threads = state.threads.list_top_level("movie").await.unwrap();
    let ids: Vec<Uuid> = threads.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![other.id]);
}
