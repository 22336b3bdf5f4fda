use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::DomainError;
use crate::email::EmailError;
use crate::middleware::{diagnostics::render_error_page, ErrorReport};

/// Handler-level error; maps domain failures onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl From<EmailError> for ApiError {
    fn from(e: EmailError) -> Self {
        ApiError(DomainError::External(e.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            DomainError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            DomainError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            DomainError::External(msg) => {
                tracing::error!("External service failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream service unavailable".to_string(),
                )
            }
            DomainError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                return ErrorReport::database(msg).into_response();
            }
            DomainError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                return ErrorReport::unhandled(msg).into_response();
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Generic error page, also rendered by the production exception handler
pub async fn error_page() -> Html<String> {
    let request_id = uuid::Uuid::new_v4().to_string();
    Html(render_error_page(&request_id))
}
