pub mod account;
pub mod error;
pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs::ApiDoc;
use crate::infrastructure::AppState;
use crate::middleware::require_authenticated;

pub use error::ApiError;

/// Routing layer: every endpoint of the application, bound to its state
pub fn api_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/account/me", get(account::me))
        .route_layer(middleware::from_fn(require_authenticated));

    Router::new()
        // Health check
        .route("/api/health", get(health::health_check))
        // Account
        .route("/api/account/register", post(account::register))
        .route("/api/account/confirm-email", get(account::confirm_email))
        .route(
            "/api/account/resend-confirmation",
            post(account::resend_confirmation),
        )
        .route("/api/account/login", post(account::login))
        .route("/api/account/logout", post(account::logout))
        .route("/api/account/forgot-password", post(account::forgot_password))
        .route("/api/account/reset-password", post(account::reset_password))
        .merge(protected)
        // Generic error page
        .route("/Error", get(error::error_page))
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
