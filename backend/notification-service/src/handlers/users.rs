use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResponse, Caller};
use crate::error::Result;
use crate::models::{NewUser, PageRequest, UserFilter, UserRole, UserStatus, UserUpdate};
use crate::services::AppState;

/// Query string shared by the filter and search listings
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
    pub gender: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserListQuery {
    fn into_parts(self) -> (UserFilter, PageRequest) {
        let filter = UserFilter {
            status: self.status,
            role: self.role,
            gender: self.gender.filter(|g| !g.trim().is_empty()),
            keyword: self.keyword,
        };
        let page = PageRequest {
            page: self.page,
            limit: self.limit,
        };
        (filter, page)
    }
}

/// GET /api/v1/admin/users/filter
pub async fn filter_users(
    state: web::Data<AppState>,
    caller: Caller,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    caller.require_admin()?;
    let (filter, page) = query.into_inner().into_parts();
    let listing = state.users.filter_users(filter, page).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(listing)))
}

/// GET /api/v1/admin/users/search
pub async fn search_users(
    state: web::Data<AppState>,
    caller: Caller,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    caller.require_admin()?;
    let (filter, page) = query.into_inner().into_parts();
    let listing = state.users.search_users(filter, page).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(listing)))
}

/// POST /api/v1/admin/users
pub async fn add_user(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<NewUser>,
) -> Result<HttpResponse> {
    caller.require_admin()?;
    let user = state.users.add_user(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(user)))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<UserUpdate>,
) -> Result<HttpResponse> {
    caller.require_admin()?;
    let user = state
        .users
        .update_user(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    caller.require_admin()?;
    let user = state.users.delete_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "id": user.id }))))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin/users")
            .route("", web::post().to(add_user))
            .route("/filter", web::get().to(filter_users))
            .route("/search", web::get().to(search_users))
            .route("/{id}", web::put().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
