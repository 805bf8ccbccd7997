use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Header naming the calling user. Identity is asserted by the fronting proxy.
pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller, taken from the `x-user-id` header.
///
/// A missing, blank, or non-ASCII header rejects the request with 401.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller(pub String);

impl Caller {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or("");
        if value.is_empty() {
            return Err(AppError::unauthorized(format!("missing {USER_HEADER} header")));
        }
        Ok(Caller(value.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(caller: Caller) -> String {
        caller.0
    }

    fn test_app() -> Router {
        Router::new().route("/api/whoami", get(whoami))
    }

    #[tokio::test]
    async fn header_identifies_caller() {
        let resp = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/whoami")
                    .header(USER_HEADER, " lo-42 ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = http_body_util::BodyExt::collect(resp.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], b"lo-42");
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        let resp = test_app()
            .oneshot(Request::builder().uri("/api/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blank_header_is_401() {
        let resp = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/whoami")
                    .header(USER_HEADER, "   ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
