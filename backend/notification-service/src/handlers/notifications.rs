/// Admin mailbox handlers
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::{ApiResponse, Caller};
use crate::error::Result;
use crate::services::AppState;

/// GET /api/v1/notifications
pub async fn list(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let entries = state.mailbox.list(admin_id).await?;
    let unread = entries.iter().filter(|n| !n.read).count();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
        "notifications": entries,
        "unread_count": unread,
    }))))
}

/// POST /api/v1/notifications/{id}/read
pub async fn mark_read(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let notification_id = path.into_inner();
    state.mailbox.mark_read(admin_id, notification_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
        "id": notification_id,
        "read": true,
    }))))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let updated = state.mailbox.mark_all_read(admin_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "updated": updated }))))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications")
            .route("", web::get().to(list))
            .route("/read-all", web::post().to(mark_all_read))
            .route("/{id}/read", web::post().to(mark_read)),
    );
}
