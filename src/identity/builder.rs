use std::fmt;
use std::sync::Arc;

use super::options::{IdentityOptions, DEFAULT_TOKEN_PROVIDER};
use super::sign_in::SignInManager;
use super::tokens::{
    DataProtectionKey, DataProtectionTokenProviderOptions, DataProtectorTokenProvider,
    UserTokenProvider,
};
use super::user_manager::UserManager;
use crate::domain::UserRepository;

#[derive(Debug)]
pub enum IdentityError {
    /// A token slot names a provider that was never registered
    UnknownTokenProvider { slot: &'static str, name: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::UnknownTokenProvider { slot, name } => write!(
                f,
                "No token provider named '{}' is registered for {}",
                name, slot
            ),
        }
    }
}

impl std::error::Error for IdentityError {}

/// The identity services handed to the rest of the application
#[derive(Clone)]
pub struct Identity {
    pub user_manager: Arc<UserManager>,
    pub sign_in_manager: Arc<SignInManager>,
}

/// Assembles the identity services from a store, options, and token providers
pub struct IdentityBuilder {
    store: Arc<dyn UserRepository>,
    options: IdentityOptions,
}

impl IdentityBuilder {
    pub fn new(store: Arc<dyn UserRepository>) -> Self {
        Self {
            store,
            options: IdentityOptions::default(),
        }
    }

    pub fn configure(mut self, configure: impl FnOnce(&mut IdentityOptions)) -> Self {
        configure(&mut self.options);
        self
    }

    /// Registers the stock data-protector provider under the default name
    pub fn add_default_token_providers(mut self, key: &DataProtectionKey) -> Self {
        let provider = DataProtectorTokenProvider::new(key, DataProtectionTokenProviderOptions::default());
        self.options
            .tokens
            .add_provider(DEFAULT_TOKEN_PROVIDER, Arc::new(provider));
        self
    }

    pub fn build(self) -> Result<Identity, IdentityError> {
        let tokens = &self.options.tokens;
        let email_confirmation = resolve(
            tokens,
            "email confirmation",
            &tokens.email_confirmation_token_provider,
        )?;
        let password_reset = resolve(
            tokens,
            "password reset",
            &tokens.password_reset_token_provider,
        )?;

        tracing::debug!(
            "Identity token slots: email confirmation -> {}, password reset -> {}",
            tokens.email_confirmation_token_provider,
            tokens.password_reset_token_provider
        );

        let user_manager = Arc::new(UserManager::new(
            self.store,
            self.options,
            email_confirmation,
            password_reset,
        ));
        let sign_in_manager = Arc::new(SignInManager::new(user_manager.clone()));

        Ok(Identity {
            user_manager,
            sign_in_manager,
        })
    }
}

fn resolve(
    tokens: &super::options::TokenOptions,
    slot: &'static str,
    name: &str,
) -> Result<Arc<dyn UserTokenProvider>, IdentityError> {
    tokens
        .provider_map
        .get(name)
        .cloned()
        .ok_or_else(|| IdentityError::UnknownTokenProvider {
            slot,
            name: name.to_string(),
        })
}
