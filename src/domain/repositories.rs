//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::Serialize;

use super::DomainError;

/// User account as seen by the identity layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub email_confirmed: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub security_stamp: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a user. Hashing and stamping happen before this point.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub security_stamp: String,
}

/// Normalizes user names and emails for lookups and uniqueness checks
pub fn normalize_key(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Repository trait for the user store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by email, case-insensitively
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new, unconfirmed user
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;

    /// Mark the user's email as confirmed
    async fn set_email_confirmed(&self, id: &str) -> Result<User, DomainError>;

    /// Replace the password hash and rotate the security stamp
    async fn update_password(
        &self,
        id: &str,
        password_hash: String,
        security_stamp: String,
    ) -> Result<User, DomainError>;
}
