use std::sync::Arc;

use super::options::IdentityOptions;
use super::password::{hash_password, validate_password, verify_password};
use super::tokens::UserTokenProvider;
use crate::domain::{normalize_key, DomainError, NewUser, User, UserRepository};

const RESET_PASSWORD_PURPOSE: &str = "ResetPassword";

/// Account operations on top of the user store and the configured token slots
pub struct UserManager {
    store: Arc<dyn UserRepository>,
    options: IdentityOptions,
    email_confirmation_provider: Arc<dyn UserTokenProvider>,
    password_reset_provider: Arc<dyn UserTokenProvider>,
}

impl UserManager {
    pub(crate) fn new(
        store: Arc<dyn UserRepository>,
        options: IdentityOptions,
        email_confirmation_provider: Arc<dyn UserTokenProvider>,
        password_reset_provider: Arc<dyn UserTokenProvider>,
    ) -> Self {
        Self {
            store,
            options,
            email_confirmation_provider,
            password_reset_provider,
        }
    }

    pub fn options(&self) -> &IdentityOptions {
        &self.options
    }

    pub fn email_confirmation_provider(&self) -> &dyn UserTokenProvider {
        self.email_confirmation_provider.as_ref()
    }

    pub fn password_reset_provider(&self) -> &dyn UserTokenProvider {
        self.password_reset_provider.as_ref()
    }

    pub async fn create(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = email.trim();
        validate_email(email)?;
        validate_password(&self.options.password, password)
            .map_err(|errors| DomainError::Validation(errors.join(" ")))?;

        if self.store.find_by_email(email).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Email '{}' is already taken.",
                email
            )));
        }

        let password_hash = hash_password(password).map_err(DomainError::Internal)?;
        let user = self
            .store
            .create(NewUser {
                user_name: email.to_string(),
                email: email.to_string(),
                password_hash,
                security_stamp: new_security_stamp(),
            })
            .await?;

        tracing::info!("User {} created a new account", user.id);
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, DomainError> {
        self.store.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.store.find_by_email(email).await
    }

    pub fn check_password(&self, user: &User, password: &str) -> bool {
        match verify_password(password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Stored password hash for user {} is unreadable: {}", user.id, e);
                false
            }
        }
    }

    pub fn generate_email_confirmation_token(&self, user: &User) -> String {
        self.email_confirmation_provider
            .generate(&email_confirmation_purpose(user), user)
    }

    pub async fn confirm_email(&self, user: &User, token: &str) -> Result<User, DomainError> {
        if !self
            .email_confirmation_provider
            .validate(&email_confirmation_purpose(user), token, user)
        {
            tracing::warn!("Invalid email confirmation token for user {}", user.id);
            return Err(DomainError::Validation("Invalid token.".to_string()));
        }

        let user = self.store.set_email_confirmed(&user.id).await?;
        tracing::info!("User {} confirmed their email", user.id);
        Ok(user)
    }

    pub fn generate_password_reset_token(&self, user: &User) -> String {
        self.password_reset_provider
            .generate(RESET_PASSWORD_PURPOSE, user)
    }

    /// Sets a new password if `token` is a valid reset code.
    /// Rotates the security stamp so outstanding codes and sessions die.
    pub async fn reset_password(
        &self,
        user: &User,
        token: &str,
        new_password: &str,
    ) -> Result<User, DomainError> {
        if !self
            .password_reset_provider
            .validate(RESET_PASSWORD_PURPOSE, token, user)
        {
            tracing::warn!("Invalid password reset token for user {}", user.id);
            return Err(DomainError::Validation("Invalid token.".to_string()));
        }

        validate_password(&self.options.password, new_password)
            .map_err(|errors| DomainError::Validation(errors.join(" ")))?;

        let password_hash = hash_password(new_password).map_err(DomainError::Internal)?;
        let user = self
            .store
            .update_password(&user.id, password_hash, new_security_stamp())
            .await?;

        tracing::info!("User {} reset their password", user.id);
        Ok(user)
    }
}

fn email_confirmation_purpose(user: &User) -> String {
    format!("EmailConfirmation:{}", normalize_key(&user.email))
}

fn new_security_stamp() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::Validation(format!("Email '{}' is invalid.", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_email;

    #[test]
    fn email_shape() {
        assert!(validate_email("joe@contoso.com").is_ok());
        assert!(validate_email("joe@localhost").is_ok());
        assert!(validate_email("joe").is_err());
        assert!(validate_email("@contoso.com").is_err());
        assert!(validate_email("joe@").is_err());
        assert!(validate_email("joe@a@b").is_err());
        assert!(validate_email("jo e@contoso.com").is_err());
    }
}
