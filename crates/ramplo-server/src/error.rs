use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ramplo_core::error::RampError;

// ---------------------------------------------------------------------------
// Internal sentinel for missing caller identity
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 401 through the `anyhow::Error` chain.
#[derive(Debug)]
struct UnauthorizedError(String);

impl std::fmt::Display for UnauthorizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnauthorizedError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(RampError::Validation(msg.into()).into())
    }

    /// Construct a 401 Unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(UnauthorizedError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<UnauthorizedError>().is_some() {
            return StatusCode::UNAUTHORIZED;
        }
        match self.0.downcast_ref::<RampError>() {
            Some(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Some(RampError::AlreadyCompleted(_) | RampError::AlreadyOnboarded(_)) => {
                StatusCode::CONFLICT
            }
            Some(RampError::Validation(_) | RampError::InvalidCursor { .. }) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn task_not_found_maps_to_404() {
        let err = AppError(RampError::TaskNotFound("t-1".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn progress_not_found_maps_to_404() {
        let err = AppError(RampError::ProgressNotFound("u1".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn sprint_not_found_maps_to_404() {
        let err = AppError(RampError::SprintNotFound("nope".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn already_completed_maps_to_409() {
        let err = AppError(RampError::AlreadyCompleted("t-1".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn already_onboarded_maps_to_409() {
        let err = AppError(RampError::AlreadyOnboarded("u1".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_cursor_maps_to_400() {
        let err = AppError(RampError::InvalidCursor { week: 14, day: 1 }.into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_request_helper_maps_to_400() {
        assert_eq!(
            AppError::bad_request("limit too large").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_catalog_maps_to_500() {
        let err = AppError(RampError::InvalidCatalog("empty".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unauthorized_renders_json_body() {
        let response = AppError::unauthorized("missing x-user-id header").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "missing x-user-id header");
    }
}
