//! Token providers that fill the email-confirmation and password-reset slots.
//!
//! Both are data-protector providers with their own name (and therefore their
//! own derived key) and their own lifespan, so a reset code can never confirm
//! an email and vice versa.

use chrono::Duration;

use super::tokens::{
    DataProtectionKey, DataProtectionTokenProviderOptions, DataProtectorTokenProvider,
    UserTokenProvider,
};
use crate::domain::User;

pub const CUSTOM_EMAIL_CONFIRMATION: &str = "CustomEmailConfirmation";
pub const CUSTOM_PASSWORD_RESET: &str = "CustomPasswordReset";

pub struct EmailConfirmationTokenProviderOptions;

impl EmailConfirmationTokenProviderOptions {
    pub fn with_lifespan(lifespan: Duration) -> DataProtectionTokenProviderOptions {
        DataProtectionTokenProviderOptions {
            name: "EmailDataProtectorTokenProvider".to_string(),
            token_lifespan: lifespan,
        }
    }

    pub fn default_lifespan() -> Duration {
        Duration::hours(4)
    }
}

pub struct PasswordResetTokenProviderOptions;

impl PasswordResetTokenProviderOptions {
    pub fn with_lifespan(lifespan: Duration) -> DataProtectionTokenProviderOptions {
        DataProtectionTokenProviderOptions {
            name: "PasswordResetDataProtectorTokenProvider".to_string(),
            token_lifespan: lifespan,
        }
    }

    pub fn default_lifespan() -> Duration {
        Duration::hours(3)
    }
}

pub struct CustomEmailConfirmationTokenProvider {
    inner: DataProtectorTokenProvider,
}

impl CustomEmailConfirmationTokenProvider {
    pub fn new(key: &DataProtectionKey, lifespan: Option<Duration>) -> Self {
        let lifespan = lifespan.unwrap_or_else(EmailConfirmationTokenProviderOptions::default_lifespan);
        Self {
            inner: DataProtectorTokenProvider::new(
                key,
                EmailConfirmationTokenProviderOptions::with_lifespan(lifespan),
            ),
        }
    }
}

impl UserTokenProvider for CustomEmailConfirmationTokenProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate(&self, purpose: &str, user: &User) -> String {
        self.inner.generate(purpose, user)
    }

    fn validate(&self, purpose: &str, token: &str, user: &User) -> bool {
        self.inner.validate(purpose, token, user)
    }

    fn token_lifespan(&self) -> Duration {
        self.inner.token_lifespan()
    }
}

pub struct CustomPasswordResetTokenProvider {
    inner: DataProtectorTokenProvider,
}

impl CustomPasswordResetTokenProvider {
    pub fn new(key: &DataProtectionKey, lifespan: Option<Duration>) -> Self {
        let lifespan = lifespan.unwrap_or_else(PasswordResetTokenProviderOptions::default_lifespan);
        Self {
            inner: DataProtectorTokenProvider::new(
                key,
                PasswordResetTokenProviderOptions::with_lifespan(lifespan),
            ),
        }
    }
}

impl UserTokenProvider for CustomPasswordResetTokenProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate(&self, purpose: &str, user: &User) -> String {
        self.inner.generate(purpose, user)
    }

    fn validate(&self, purpose: &str, token: &str, user: &User) -> bool {
        self.inner.validate(purpose, token, user)
    }

    fn token_lifespan(&self) -> Duration {
        self.inner.token_lifespan()
    }
}
