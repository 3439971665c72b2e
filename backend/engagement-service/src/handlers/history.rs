use actix_web::{web, HttpResponse};

use super::{ApiResponse, Caller};
use crate::domain::WatchProgressInput;
use crate::error::Result;
use crate::services::AppState;

/// GET /api/v1/history
pub async fn recent(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    let entries = state.history.recent(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(entries)))
}

/// PUT /api/v1/history
pub async fn upsert(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<WatchProgressInput>,
) -> Result<HttpResponse> {
    let saved = state
        .history
        .upsert_progress(caller.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(saved)))
}

/// DELETE /api/v1/history/{slug}
pub async fn remove(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let removed = state.history.remove(caller.user_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "removed": removed }))))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/history")
            .route("", web::get().to(recent))
            .route("", web::put().to(upsert))
            .route("/{slug}", web::delete().to(remove)),
    );
}
