//! Account endpoints: registration, email confirmation, sign-in and password recovery

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use super::error::ApiError;
use crate::domain::{DomainError, User};
use crate::identity::{SignInResult, SESSION_COOKIE};
use crate::infrastructure::AppState;
use crate::middleware::Principal;
use crate::utils::html::escape;

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmEmailQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub email_confirmed: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            email_confirmed: user.email_confirmed,
        }
    }
}

fn confirmation_link(public_url: &str, user_id: &str, code: &str) -> String {
    format!(
        "{}/api/account/confirm-email?userId={}&code={}",
        public_url.trim_end_matches('/'),
        urlencoding::encode(user_id),
        urlencoding::encode(code)
    )
}

fn reset_link(public_url: &str, code: &str) -> String {
    format!(
        "{}/api/account/reset-password?code={}",
        public_url.trim_end_matches('/'),
        urlencoding::encode(code)
    )
}

async fn send_confirmation(state: &AppState, user: &User) -> Result<(), ApiError> {
    let code = state.user_manager.generate_email_confirmation_token(user);
    let link = confirmation_link(&state.public_url, &user.id, &code);
    state
        .email_sender
        .send_email(
            &user.email,
            "Confirm your email",
            &format!(
                "Please confirm your account by <a href=\"{}\">clicking here</a>.",
                escape(&link)
            ),
        )
        .await?;
    Ok(())
}

fn passwords_match(password: &str, confirm_password: &str) -> Result<(), ApiError> {
    if password != confirm_password {
        return Err(DomainError::Validation(
            "The password and confirmation password do not match.".to_string(),
        )
        .into());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/account/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, confirmation email sent", body = UserProfile),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered"),
        (status = 502, description = "Confirmation email could not be sent")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    passwords_match(&payload.password, &payload.confirm_password)?;

    let user = state
        .user_manager
        .create(&payload.email, &payload.password)
        .await?;
    send_confirmation(&state, &user).await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/account/confirm-email",
    params(ConfirmEmailQuery),
    responses(
        (status = 200, description = "Email confirmed"),
        (status = 400, description = "Invalid or expired code"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_manager
        .find_by_id(&query.user_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    state.user_manager.confirm_email(&user, &query.code).await?;

    Ok(Json(json!({ "message": "Thank you for confirming your email." })))
}

#[utoipa::path(
    post,
    path = "/api/account/resend-confirmation",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Confirmation email sent if the account is awaiting confirmation")
    )
)]
pub async fn resend_confirmation(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.user_manager.find_by_email(&payload.email).await? {
        Some(user) if !user.email_confirmed => {
            if let Err(e) = send_confirmation(&state, &user).await {
                tracing::error!("Failed to resend confirmation to user {}: {:?}", user.id, e);
            }
        }
        _ => tracing::debug!("Confirmation resend skipped"),
    }

    Ok(Json(json!({
        "message": "Verification email sent. Please check your email."
    })))
}

#[utoipa::path(
    post,
    path = "/api/account/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not confirmed")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Login attempt for: {}", payload.email);

    let user = match state
        .sign_in_manager
        .password_sign_in(&payload.email, &payload.password)
        .await?
    {
        SignInResult::Succeeded(user) => user,
        SignInResult::NotAllowed => {
            return Ok((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Email not confirmed" })),
            )
                .into_response());
        }
        SignInResult::Failed => {
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid login attempt." })),
            )
                .into_response());
        }
    };

    let token = state.sessions.issue(&user)?;
    let max_age = state.sessions.lifetime().num_seconds();
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            expires_in: max_age,
        }),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/account/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    )
)]
pub async fn logout() -> impl IntoResponse {
    let cookie = format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    );
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

#[utoipa::path(
    post,
    path = "/api/account/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists and is confirmed")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.user_manager.find_by_email(&payload.email).await? {
        Some(user) if user.email_confirmed => {
            let code = state.user_manager.generate_password_reset_token(&user);
            let link = reset_link(&state.public_url, &code);
            let sent = state
                .email_sender
                .send_email(
                    &user.email,
                    "Reset Password",
                    &format!(
                        "Please reset your password by <a href=\"{}\">clicking here</a>.",
                        escape(&link)
                    ),
                )
                .await;
            if let Err(e) = sent {
                tracing::error!("Failed to send reset email to user {}: {}", user.id, e);
            }
        }
        // Unknown and unconfirmed accounts get the same answer
        _ => tracing::debug!("Password reset skipped"),
    }

    Ok(Json(json!({
        "message": "Please check your email to reset your password."
    })))
}

#[utoipa::path(
    post,
    path = "/api/account/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid code or password")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    passwords_match(&payload.password, &payload.confirm_password)?;

    let response = Json(json!({ "message": "Your password has been reset." }));

    let Some(user) = state.user_manager.find_by_email(&payload.email).await? else {
        return Ok(response);
    };

    state
        .user_manager
        .reset_password(&user, &payload.code, &payload.password)
        .await?;

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/account/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_manager.find_by_id(&principal.user_id).await?;

    match user {
        Some(user) if user.security_stamp == principal.security_stamp => {
            Ok(Json(UserProfile::from(user)).into_response())
        }
        _ => {
            tracing::debug!("Session for user {} is no longer valid", principal.user_id);
            Ok((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response())
        }
    }
}
