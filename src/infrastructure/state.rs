//! Application state: the service registry handed to every handler

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::email::EmailSender;
use crate::identity::{Identity, SessionIssuer, SignInManager, UserManager};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence context
    db: DatabaseConnection,
    pub user_manager: Arc<UserManager>,
    pub sign_in_manager: Arc<SignInManager>,
    pub email_sender: Arc<dyn EmailSender>,
    pub sessions: SessionIssuer,
    /// Base URL used to build links in outgoing mail
    pub public_url: String,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        identity: Identity,
        email_sender: Arc<dyn EmailSender>,
        sessions: SessionIssuer,
        public_url: String,
    ) -> Self {
        Self {
            db,
            user_manager: identity.user_manager,
            sign_in_manager: identity.sign_in_manager,
            email_sender,
            sessions,
            public_url,
        }
    }

    /// Get the database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
