use actix_web::{test, web, App};
use engagement_service::domain::{AuthorProfile, NewComment, ReactionTarget};
use engagement_service::repository::{MemoryStore, Stores};
use engagement_service::{handlers, AppError, AppState};
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(Stores::memory(store.clone()));
    (store, state)
}

fn add_user(store: &MemoryStore, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    store.put_profile(AuthorProfile {
        user_id: id,
        username: name.to_string(),
        avatar: Some(format!("{name}.png")),
    });
    id
}

fn new_comment(body: &str, parent_id: Option<Uuid>) -> NewComment {
    NewComment {
        content_id: "movie-1".to_string(),
        content_name: "Movie One".to_string(),
        content_thumb: Some("thumb.jpg".to_string()),
        body: body.to_string(),
        is_spoiler: None,
        parent_id,
    }
}

#[tokio::test]
async fn test_nested_replies_are_assembled() {
    let (store, state) = setup();
    let alice = add_user(&store, "alice");
    let bob = add_user(&store, "bob");
    let carol = add_user(&store, "carol");

    let a = state.threads.create_comment(alice, new_comment("A", None)).await.unwrap();
    let b = state
        .threads
        .create_comment(bob, new_comment("B", Some(a.id)))
        .await
        .unwrap();
    let c = state
        .threads
        .create_comment(carol, new_comment("C", Some(b.id)))
        .await
        .unwrap();

    let threads = state.threads.list_top_level("movie-1").await.unwrap();
    assert_eq!(threads.len(), 1);

    let root = &threads[0];
    assert_eq!(root.id, a.id);
    assert!(root.is_spoiler);
    assert_eq!(root.replies.len(), 1);
    assert_eq!(root.replies[0].id, b.id);
    assert_eq!(root.replies[0].replies.len(), 1);

    let nested = &root.replies[0].replies[0];
    assert_eq!(nested.id, c.id);
    assert_eq!(nested.author.username, "carol");

    let json = serde_json::to_value(nested).unwrap();
    let author_keys: Vec<&String> = json["author"].as_object().unwrap().keys().collect();
    assert_eq!(author_keys.len(), 3);
    assert!(json["author"].get("email").is_none());
    assert!(json["author"].get("password").is_none());
}

#[tokio::test]
async fn test_top_level_newest_first_and_replies_in_insertion_order() {
    let (store, state) = setup();
    let user = add_user(&store, "user");

    let first = state.threads.create_comment(user, new_comment("1", None)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let second = state.threads.create_comment(user, new_comment("2", None)).await.unwrap();
    let r1 = state
        .threads
        .create_comment(user, new_comment("r1", Some(first.id)))
        .await
        .unwrap();
    let r2 = state
        .threads
        .create_comment(user, new_comment("r2", Some(first.id)))
        .await
        .unwrap();

    let threads = state.threads.list_top_level("movie-1").await.unwrap();
    let ids: Vec<Uuid> = threads.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let reply_ids: Vec<Uuid> = threads[1].replies.iter().map(|r| r.id).collect();
    assert_eq!(reply_ids, vec![r1.id, r2.id]);
}

#[tokio::test]
async fn test_orphaned_reply_is_omitted() {
    let (store, state) = setup();
    let user = add_user(&store, "user");

    let root = state.threads.create_comment(user, new_comment("root", None)).await.unwrap();
    let doomed = state
        .threads
        .create_comment(user, new_comment("doomed", Some(root.id)))
        .await
        .unwrap();
    state
        .threads
        .create_comment(user, new_comment("orphan", Some(doomed.id)))
        .await
        .unwrap();

    store.remove_comment(doomed.id);

    let threads = state.threads.list_top_level("movie-1").await.unwrap();
    assert_eq!(threads.len(), 1);
    assert!(threads[0].replies.is_empty());
}

#[tokio::test]
async fn test_reply_validation() {
    let (store, state) = setup();
    let user = add_user(&store, "user");

    let err = state
        .threads
        .create_comment(user, new_comment("x", Some(Uuid::new_v4())))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let root = state.threads.create_comment(user, new_comment("root", None)).await.unwrap();
    let mut cross = new_comment("x", Some(root.id));
    cross.content_id = "movie-2".to_string();
    let err = state.threads.create_comment(user, cross).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .threads
        .create_comment(user, new_comment("   ", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_rank_by_engagement_prefers_earliest_on_tie() {
    let (store, state) = setup();
    let author = add_user(&store, "author");
    let voters: Vec<Uuid> = (0..5).map(|i| add_user(&store, &format!("v{i}"))).collect();

    // (likes, direct replies) per top-level comment, oldest first
    let shape = [(5usize, 2usize), (3, 1), (5, 2)];
    let mut ids = Vec::new();
    for (i, (likes, replies)) in shape.iter().enumerate() {
        let comment = state
            .threads
            .create_comment(author, new_comment(&format!("c{i}"), None))
            .await
            .unwrap();
        for voter in voters.iter().take(*likes) {
            state
                .ledger
                .toggle_like(*voter, ReactionTarget::Comment(comment.id))
                .await
                .unwrap();
        }
        for r in 0..*replies {
            state
                .threads
                .create_comment(author, new_comment(&format!("c{i}-r{r}"), Some(comment.id)))
                .await
                .unwrap();
        }
        ids.push(comment.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let ranked = state.threads.rank_by_engagement(Some(2)).await.unwrap();
    let ranked_ids: Vec<Uuid> = ranked.iter().map(|r| r.comment.id).collect();
    assert_eq!(ranked_ids, vec![ids[0], ids[2]]);
    assert!(ranked.iter().all(|r| r.engagement_score == 7));
}

#[tokio::test]
async fn test_newest_defaults_to_ten() {
    let (store, state) = setup();
    let user = add_user(&store, "user");
    for i in 0..12 {
        state
            .threads
            .create_comment(user, new_comment(&format!("c{i}"), None))
            .await
            .unwrap();
    }

    let newest = state.threads.newest(None).await.unwrap();
    assert_eq!(newest.len(), 10);
    assert!(newest.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[actix_web::test]
async fn test_http_comment_flow() {
    let (store, state) = setup();
    let user = add_user(&store, "user");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::register_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/comments")
        .insert_header(("x-user-id", user.to_string()))
        .set_json(serde_json::json!({
            "content_id": "movie-1",
            "content_name": "Movie One",
            "body": "hello"
        }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["success"], true);
    let id = resp["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/comments/{id}/like"))
        .insert_header(("x-user-id", user.to_string()))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["like_count"], 1);
    assert_eq!(resp["data"]["is_liked"], true);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/comments/{id}/like"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/comments/content/movie-1")
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);
    assert_eq!(resp["data"][0]["like_count"], 1);
}
