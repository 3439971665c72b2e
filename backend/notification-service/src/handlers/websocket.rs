/// WebSocket endpoints for admin dashboards
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde_json::json;

use super::{ApiResponse, Caller};
use crate::error::{AppError, Result};
use crate::websocket::{AdminSession, ConnectionManager};

/// WebSocket frame size limit (256 KB)
const WS_MESSAGE_SIZE_LIMIT: usize = 256_000;

/// Upgrade to an admin push session
///
/// Endpoint: GET /ws/admin
pub async fn ws_admin(
    req: HttpRequest,
    stream: web::Payload,
    caller: Caller,
    manager: web::Data<ConnectionManager>,
) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let session = AdminSession::new(admin_id, manager.get_ref().clone());

    ws::WsResponseBuilder::new(session, &req, stream)
        .frame_size(WS_MESSAGE_SIZE_LIMIT)
        .start()
        .map_err(|e| AppError::Validation(format!("WebSocket handshake failed: {}", e)))
}

/// Connection status for the calling admin plus totals
///
/// Endpoint: GET /api/v1/ws/status
pub async fn ws_status(
    caller: Caller,
    manager: web::Data<ConnectionManager>,
) -> Result<HttpResponse> {
    let admin_id = caller.require_admin()?;
    let own = manager.connection_count(admin_id).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "admin_id": admin_id,
        "connected": own > 0,
        "connection_count": own,
        "total_connections": manager.total_connections().await,
        "connected_admins": manager.connected_admins_count().await,
    }))))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws/admin", web::get().to(ws_admin))
        .route("/api/v1/ws/status", web::get().to(ws_status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use uuid::Uuid;

    #[actix_rt::test]
    async fn test_status_requires_admin() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ConnectionManager::new()))
                .configure(register_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/ws/status")
            .insert_header(("x-user-id", Uuid::new_v4().to_string()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn test_status_reports_counts() {
        let manager = ConnectionManager::new();
        let admin = Uuid::new_v4();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        manager.subscribe(admin, tx).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(manager))
                .configure(register_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/ws/status")
            .insert_header(("x-user-id", admin.to_string()))
            .insert_header(("x-user-role", "admin"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["connected"], true);
        assert_eq!(body["data"]["connection_count"], 1);
    }

    #[actix_rt::test]
    async fn test_upgrade_rejects_non_admin() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ConnectionManager::new()))
                .configure(register_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ws/admin")
            .insert_header(("x-user-id", Uuid::new_v4().to_string()))
            .insert_header(("x-user-role", "user"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
