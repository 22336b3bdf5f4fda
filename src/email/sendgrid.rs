use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::json;

use super::{AuthMessageSenderOptions, EmailError, EmailSender};

/// Sends mail through the SendGrid v3 HTTP API
pub struct SendGridEmailSender {
    client: reqwest::Client,
    options: AuthMessageSenderOptions,
}

impl SendGridEmailSender {
    pub fn new(options: AuthMessageSenderOptions) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, options }
    }
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    async fn send_email(
        &self,
        email: &str,
        subject: &str,
        html_message: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/v3/mail/send", self.options.api_url);

        // Click tracking would rewrite the confirmation and reset links
        let payload = json!({
            "personalizations": [{ "to": [{ "email": email }] }],
            "from": {
                "email": self.options.from_address,
                "name": self.options.send_grid_user,
            },
            "subject": subject,
            "content": [
                { "type": "text/plain", "value": html_message },
                { "type": "text/html", "value": html_message },
            ],
            "tracking_settings": {
                "click_tracking": { "enable": false, "enable_text": false }
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.options.send_grid_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("SendGrid rejected message to {}: {} {}", email, status, body);
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Email '{}' queued for delivery to {}", subject, email);
        Ok(())
    }
}
