/// HTTP handlers for notification-service API
pub mod analytics;
pub mod notifications;
pub mod preferences;
pub mod users;
pub mod websocket;

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller as propagated by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Caller {
    fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let value = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".into()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))?;

        let user_id = Uuid::parse_str(value)
            .map_err(|_| AppError::Unauthorized("Invalid x-user-id header value".into()))?;

        let is_admin = req
            .headers()
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|role| role.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);

        Ok(Self { user_id, is_admin })
    }

    /// Admin identity or `Forbidden`
    pub fn require_admin(&self) -> Result<Uuid, AppError> {
        if self.is_admin {
            Ok(self.user_id)
        } else {
            Err(AppError::Forbidden("Admin access required".into()))
        }
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Caller::from_headers(req))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

pub fn register_routes(cfg: &mut actix_web::web::ServiceConfig) {
    // Must precede the notifications scope, which would otherwise claim the prefix
    preferences::register_routes(cfg);
    notifications::register_routes(cfg);
    users::register_routes(cfg);
    analytics::register_routes(cfg);
    websocket::register_routes(cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_non_admin_is_forbidden() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .insert_header((USER_ROLE_HEADER, "user"))
            .to_http_request();

        let caller = Caller::from_headers(&req).unwrap();
        assert!(matches!(
            caller.require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            Caller::from_headers(&req),
            Err(AppError::Unauthorized(_))
        ));
    }
}
