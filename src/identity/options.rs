use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::tokens::UserTokenProvider;

/// Name under which the stock data-protector provider is registered
pub const DEFAULT_TOKEN_PROVIDER: &str = "Default";

#[derive(Clone, Debug, Default)]
pub struct IdentityOptions {
    pub sign_in: SignInOptions,
    pub password: PasswordOptions,
    pub tokens: TokenOptions,
}

#[derive(Clone, Debug, Default)]
pub struct SignInOptions {
    /// Refuse sign-in until the email address has been confirmed
    pub require_confirmed_email: bool,
}

#[derive(Clone, Debug)]
pub struct PasswordOptions {
    pub required_length: usize,
    pub required_unique_chars: usize,
    pub require_non_alphanumeric: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digit: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            required_length: 6,
            required_unique_chars: 1,
            require_non_alphanumeric: true,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
        }
    }
}

/// Named token-provider slots and the providers that can fill them
#[derive(Clone)]
pub struct TokenOptions {
    pub provider_map: HashMap<String, Arc<dyn UserTokenProvider>>,
    pub email_confirmation_token_provider: String,
    pub password_reset_token_provider: String,
}

impl TokenOptions {
    pub fn add_provider(&mut self, name: impl Into<String>, provider: Arc<dyn UserTokenProvider>) {
        self.provider_map.insert(name.into(), provider);
    }
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            provider_map: HashMap::new(),
            email_confirmation_token_provider: DEFAULT_TOKEN_PROVIDER.to_string(),
            password_reset_token_provider: DEFAULT_TOKEN_PROVIDER.to_string(),
        }
    }
}

impl fmt::Debug for TokenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&String> = self.provider_map.keys().collect();
        providers.sort();
        f.debug_struct("TokenOptions")
            .field("provider_map", &providers)
            .field(
                "email_confirmation_token_provider",
                &self.email_confirmation_token_provider,
            )
            .field(
                "password_reset_token_provider",
                &self.password_reset_token_provider,
            )
            .finish()
    }
}
