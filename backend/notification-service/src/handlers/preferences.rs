/// Admin channel preference handlers
use actix_web::{web, HttpResponse};

use super::{ApiResponse, Caller};
use crate::error::Result;
use crate::models::PreferencesPatch;
use crate::services::AppState;

/// GET /api/v1/notifications/preferences
pub async fn get_preferences(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let prefs = state.mailbox.preferences(admin_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(prefs)))
}

/// POST /api/v1/notifications/preferences
///
/// Only the provided fields change.
pub async fn update_preferences(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<PreferencesPatch>,
) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let prefs = state
        .mailbox
        .update_preferences(admin_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(prefs)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/v1/notifications/preferences")
            .route(web::get().to(get_preferences))
            .route(web::post().to(update_preferences)),
    );
}
