use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{ApiResponse, Caller};
use crate::error::Result;
use crate::models::{UserFilter, UserStatus};
use crate::services::AppState;

/// GET /api/v1/admin/analytics/users
pub async fn user_stats(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    caller.require_admin()?;
    let stats = state.users.user_stats().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

async fn count(state: &AppState, caller: Caller, filter: UserFilter) -> Result<HttpResponse> {
    caller.require_admin()?;
    let count = state.users.count_users(&filter).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "count": count }))))
}

/// GET /api/v1/admin/analytics/active-users
pub async fn active_users(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    count(&state, caller, UserFilter::with_status(UserStatus::Active)).await
}

/// GET /api/v1/admin/analytics/male-users
pub async fn male_users(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    count(&state, caller, UserFilter::with_gender("male")).await
}

/// GET /api/v1/admin/analytics/female-users
pub async fn female_users(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    count(&state, caller, UserFilter::with_gender("female")).await
}

/// GET /api/v1/admin/analytics/total-users
pub async fn total_users(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    count(&state, caller, UserFilter::default()).await
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin/analytics")
            .route("/users", web::get().to(user_stats))
            .route("/active-users", web::get().to(active_users))
            .route("/male-users", web::get().to(male_users))
            .route("/female-users", web::get().to(female_users))
            .route("/total-users", web::get().to(total_users)),
    );
}
