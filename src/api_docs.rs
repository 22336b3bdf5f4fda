use crate::api;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::account::register,
        api::account::confirm_email,
        api::account::resend_confirmation,
        api::account::login,
        api::account::logout,
        api::account::forgot_password,
        api::account::reset_password,
        api::account::me,
    ),
    components(
        schemas(
            api::account::RegisterRequest,
            api::account::EmailRequest,
            api::account::LoginRequest,
            api::account::LoginResponse,
            api::account::ResetPasswordRequest,
            api::account::UserProfile,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "webpwrecover", description = "Account and password recovery API")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
