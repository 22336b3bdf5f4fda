use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::identity::{SessionIssuer, SESSION_COOKIE};

/// Identity established for the current request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub security_stamp: String,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "error": "Authentication required" })),
    )
        .into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(unauthorized)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Attaches a [`Principal`] when the request carries a valid session token.
/// Anonymous requests pass through unchanged.
pub async fn authenticate(
    State(sessions): State<SessionIssuer>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers())
        .or_else(|| cookie_value(req.headers(), SESSION_COOKIE))
        .map(str::to_owned);

    if let Some(claims) = token.and_then(|t| sessions.validate(&t)) {
        req.extensions_mut().insert(Principal {
            user_id: claims.sub,
            email: claims.email,
            security_stamp: claims.stamp,
        });
    }

    next.run(req).await
}

/// Rejects anonymous requests before they reach the handler
pub async fn require_authenticated(req: Request, next: Next) -> Response {
    if req.extensions().get::<Principal>().is_none() {
        tracing::debug!("Rejected anonymous request to {}", req.uri().path());
        return unauthorized();
    }
    next.run(req).await
}
