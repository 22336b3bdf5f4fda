use std::sync::Arc;

use super::user_manager::UserManager;
use crate::domain::{DomainError, User};

#[derive(Debug, Clone, PartialEq)]
pub enum SignInResult {
    Succeeded(User),
    /// Credentials are right but a sign-in policy refuses the account
    NotAllowed,
    Failed,
}

pub struct SignInManager {
    users: Arc<UserManager>,
}

impl SignInManager {
    pub fn new(users: Arc<UserManager>) -> Self {
        Self { users }
    }

    /// Whether sign-in policies allow this account in.
    pub fn can_sign_in(&self, user: &User) -> bool {
        if self.users.options().sign_in.require_confirmed_email && !user.email_confirmed {
            tracing::debug!("User {} cannot sign in without a confirmed email", user.id);
            return false;
        }
        true
    }

    /// `NotAllowed` is only returned once the password has been verified.
    pub async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResult, DomainError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Sign-in attempt for unknown email");
            return Ok(SignInResult::Failed);
        };

        if !self.users.check_password(&user, password) {
            tracing::warn!("Invalid password for user {}", user.id);
            return Ok(SignInResult::Failed);
        }

        if !self.can_sign_in(&user) {
            return Ok(SignInResult::NotAllowed);
        }

        tracing::info!("User {} logged in", user.id);
        Ok(SignInResult::Succeeded(user))
    }
}
