//! The two startup hooks: service registration and pipeline assembly

use std::fmt;
use std::sync::Arc;

use axum::Router;
use sea_orm::DbErr;
use secrecy::ExposeSecret;

use crate::api;
use crate::email::{EmailSender, SendGridEmailSender};
use crate::identity::{
    CustomEmailConfirmationTokenProvider, CustomPasswordResetTokenProvider, DataProtectionKey,
    IdentityBuilder, IdentityError, SessionIssuer, CUSTOM_EMAIL_CONFIRMATION,
    CUSTOM_PASSWORD_RESET,
};
use crate::infrastructure::config::{Config, ConfigError};
use crate::infrastructure::{db, AppState, SeaOrmUserRepository};
use crate::middleware::{self, PipelineOptions};

#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Database(DbErr),
    Identity(IdentityError),
    Io(std::io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(e) => write!(f, "Configuration error: {}", e),
            StartupError::Database(e) => write!(f, "Database initialization failed: {}", e),
            StartupError::Identity(e) => write!(f, "Identity configuration error: {}", e),
            StartupError::Io(e) => write!(f, "Server I/O error: {}", e),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl From<DbErr> for StartupError {
    fn from(e: DbErr) -> Self {
        StartupError::Database(e)
    }
}

impl From<IdentityError> for StartupError {
    fn from(e: IdentityError) -> Self {
        StartupError::Identity(e)
    }
}

impl From<std::io::Error> for StartupError {
    fn from(e: std::io::Error) -> Self {
        StartupError::Io(e)
    }
}

pub struct Startup {
    config: Config,
}

impl Startup {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers every service with the SendGrid sender bound from configuration
    pub async fn configure_services(&self) -> Result<AppState, StartupError> {
        let sender = SendGridEmailSender::new(self.config.email.clone());
        self.configure_services_with(Arc::new(sender)).await
    }

    /// Registers every service around the given email sender
    pub async fn configure_services_with(
        &self,
        email_sender: Arc<dyn EmailSender>,
    ) -> Result<AppState, StartupError> {
        let config = &self.config;

        let db = db::init_db(&config.default_connection).await?;
        tracing::info!("Database initialized");

        let key = match &config.data_protection_key {
            Some(secret) => DataProtectionKey::new(secret.expose_secret().as_bytes().to_vec()),
            None => {
                tracing::warn!(
                    "DATA_PROTECTION_KEY is not set; using an ephemeral key. \
                     Tokens and sessions will not survive a restart."
                );
                DataProtectionKey::generate()
            }
        };

        let email_confirmation = Arc::new(CustomEmailConfirmationTokenProvider::new(
            &key,
            config.email_confirmation_token_lifespan,
        ));
        let password_reset = Arc::new(CustomPasswordResetTokenProvider::new(
            &key,
            config.password_reset_token_lifespan,
        ));

        let identity = IdentityBuilder::new(Arc::new(SeaOrmUserRepository::new(db.clone())))
            .add_default_token_providers(&key)
            .configure(|options| {
                options.sign_in.require_confirmed_email = true;

                options
                    .tokens
                    .add_provider(CUSTOM_EMAIL_CONFIRMATION, email_confirmation);
                options.tokens.email_confirmation_token_provider =
                    CUSTOM_EMAIL_CONFIRMATION.to_string();

                options
                    .tokens
                    .add_provider(CUSTOM_PASSWORD_RESET, password_reset);
                options.tokens.password_reset_token_provider = CUSTOM_PASSWORD_RESET.to_string();
            })
            .build()?;

        Ok(AppState::new(
            db,
            identity,
            email_sender,
            SessionIssuer::new(&key),
            config.public_url.clone(),
        ))
    }

    /// Builds the routing layer and wraps it in the request pipeline
    pub fn configure(&self, state: AppState) -> Router {
        let sessions = state.sessions.clone();
        let routes = api::api_router(state);

        tracing::info!("Hosting environment: {}", self.config.environment);
        middleware::pipeline(routes, sessions, &PipelineOptions::from_config(&self.config))
    }
}
