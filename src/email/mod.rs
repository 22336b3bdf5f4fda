//! Outgoing mail used by the identity flows (confirmation and reset links)

pub mod sendgrid;

use std::fmt;

use async_trait::async_trait;
use secrecy::SecretString;

pub use sendgrid::SendGridEmailSender;

/// Options bound from the email configuration section
#[derive(Clone, Debug)]
pub struct AuthMessageSenderOptions {
    /// Display name on outgoing mail
    pub send_grid_user: String,
    pub send_grid_key: SecretString,
    pub from_address: String,
    /// Base URL of the SendGrid API, without trailing slash
    pub api_url: String,
}

#[derive(Debug)]
pub enum EmailError {
    /// The request never produced a response
    Transport(String),
    /// The provider answered with a non-success status
    Rejected { status: u16, body: String },
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailError::Transport(msg) => write!(f, "Email transport failed: {}", msg),
            EmailError::Rejected { status, body } => {
                write!(f, "Email provider rejected message ({}): {}", status, body)
            }
        }
    }
}

impl std::error::Error for EmailError {}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, email: &str, subject: &str, html_message: &str)
        -> Result<(), EmailError>;
}
