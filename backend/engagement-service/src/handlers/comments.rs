use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResponse, Caller};
use crate::domain::{NewComment, ReactionTarget};
use crate::error::Result;
use crate::services::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// POST /api/v1/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let comment = state
        .threads
        .create_comment(caller.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(comment)))
}

/// GET /api/v1/comments/content/{content_id}
pub async fn list_for_content(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let threads = state.threads.list_top_level(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(threads)))
}

/// GET /api/v1/comments/top
pub async fn top_comments(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let ranked = state.threads.rank_by_engagement(query.limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(ranked)))
}

/// GET /api/v1/comments/newest
pub async fn newest_comments(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let comments = state.threads.newest(query.limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comments)))
}

/// PUT /api/v1/comments/{id}/like
pub async fn like_comment(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let snapshot = state
        .ledger
        .toggle_like(caller.user_id, ReactionTarget::Comment(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(snapshot)))
}

/// PUT /api/v1/comments/{id}/dislike
pub async fn dislike_comment(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let snapshot = state
        .ledger
        .toggle_dislike(caller.user_id, ReactionTarget::Comment(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(snapshot)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/comments")
            .route("", web::post().to(create_comment))
            .route("/top", web::get().to(top_comments))
            .route("/newest", web::get().to(newest_comments))
            .route("/content/{content_id}", web::get().to(list_for_content))
            .route("/{id}/like", web::put().to(like_comment))
            .route("/{id}/dislike", web::put().to(dislike_comment)),
    );
}
