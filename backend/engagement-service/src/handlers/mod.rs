/// HTTP handlers for engagement-service API
pub mod comments;
pub mod history;
pub mod ratings;

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
    comments::register_routes(cfg);
    ratings::register_routes(cfg);
    history::register_routes(cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_caller_from_headers() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .insert_header((USER_ROLE_HEADER, "Admin"))
            .to_http_request();

        let caller = Caller::from_headers(&req).unwrap();
        assert_eq!(caller.user_id, id);
        assert!(caller.is_admin);
    }

    #[test]
    fn test_caller_requires_valid_id() {
        let missing = TestRequest::default().to_http_request();
        assert!(matches!(
            Caller::from_headers(&missing),
            Err(AppError::Unauthorized(_))
        ));

        let garbage = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(Caller::from_headers(&garbage).is_err());
    }
}
