use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::{ApiResponse, Caller};
use crate::domain::{NewRating, ReactionTarget};
use crate::error::Result;
use crate::services::AppState;

/// POST /api/v1/ratings
pub async fn create_rating(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<NewRating>,
) -> Result<HttpResponse> {
    let rating = state
        .ratings
        .create_rating(caller.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(rating)))
}

/// GET /api/v1/ratings/content/{content_id}
pub async fn list_for_content(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let ratings = state.ratings.list_for_content(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(ratings)))
}

/// PUT /api/v1/ratings/{id}/like
pub async fn like_rating(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let snapshot = state
        .ledger
        .toggle_like(caller.user_id, ReactionTarget::Rating(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(snapshot)))
}

/// PUT /api/v1/ratings/{id}/dislike
pub async fn dislike_rating(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let snapshot = state
        .ledger
        .toggle_dislike(caller.user_id, ReactionTarget::Rating(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(snapshot)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/ratings")
            .route("", web::post().to(create_rating))
            .route("/content/{content_id}", web::get().to(list_for_content))
            .route("/{id}/like", web::put().to(like_rating))
            .route("/{id}/dislike", web::put().to(dislike_rating)),
    );
}
