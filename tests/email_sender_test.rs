use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webpwrecover::email::{AuthMessageSenderOptions, EmailError, EmailSender, SendGridEmailSender};

fn sender(api_url: String) -> SendGridEmailSender {
    SendGridEmailSender::new(AuthMessageSenderOptions {
        send_grid_user: "Contoso Accounts".to_string(),
        send_grid_key: SecretString::new("SG.test-key".to_string()),
        from_address: "accounts@contoso.com".to_string(),
        api_url,
    })
}

#[tokio::test]
async fn test_sendgrid_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.test-key"))
        .and(body_partial_json(json!({
            "personalizations": [{ "to": [{ "email": "jane@example.com" }] }],
            "from": { "email": "accounts@contoso.com", "name": "Contoso Accounts" },
            "subject": "Confirm your email",
            "tracking_settings": { "click_tracking": { "enable": false } }
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    sender(mock_server.uri())
        .send_email(
            "jane@example.com",
            "Confirm your email",
            "<a href=\"https://example.com\">clicking here</a>",
        )
        .await
        .expect("accepted by provider");
}

#[tokio::test]
async fn test_sendgrid_rejection_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&mock_server)
        .await;

    let result = sender(mock_server.uri())
        .send_email("jane@example.com", "Reset Password", "<p>reset</p>")
        .await;

    match result {
        Err(EmailError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_provider_is_a_transport_error() {
    // Nothing listens on the discard port
    let result = sender("http://127.0.0.1:9".to_string())
        .send_email("jane@example.com", "Reset Password", "<p>reset</p>")
        .await;

    assert!(matches!(result, Err(EmailError::Transport(_))));
}
