mod common;

use std::sync::Arc;

use chrono::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{test_config, RecordingEmailSender};
use webpwrecover::config::{Config, ConfigError};
use webpwrecover::identity::{CUSTOM_EMAIL_CONFIRMATION, CUSTOM_PASSWORD_RESET};
use webpwrecover::infrastructure::{Startup, StartupError};

#[tokio::test]
async fn test_services_resolve_from_valid_configuration() {
    let startup = Startup::new(test_config(&[]));
    let state = startup
        .configure_services_with(Arc::new(RecordingEmailSender::default()))
        .await
        .expect("services configured");

    // Persistence
    state.db().ping().await.expect("database reachable");

    // Identity
    let options = state.user_manager.options();
    assert!(options.sign_in.require_confirmed_email);
    assert_eq!(
        options.tokens.email_confirmation_token_provider,
        CUSTOM_EMAIL_CONFIRMATION
    );
    assert_eq!(
        options.tokens.password_reset_token_provider,
        CUSTOM_PASSWORD_RESET
    );
    assert_eq!(
        state.user_manager.email_confirmation_provider().name(),
        "EmailDataProtectorTokenProvider"
    );
    assert_eq!(
        state.user_manager.password_reset_provider().name(),
        "PasswordResetDataProtectorTokenProvider"
    );

    // Mail
    state
        .email_sender
        .send_email("someone@example.com", "Hi", "<p>Hi</p>")
        .await
        .expect("sender resolvable");
}

#[tokio::test]
async fn test_sendgrid_sender_is_registered_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.test-key"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let startup = Startup::new(test_config(&[("SENDGRID_API_URL", uri.as_str())]));
    let state = startup
        .configure_services()
        .await
        .expect("services configured");

    state
        .email_sender
        .send_email("someone@example.com", "Hi", "<p>Hi</p>")
        .await
        .expect("delivered through SendGrid");
}

#[test]
fn test_missing_connection_string_fails_before_startup() {
    let result = Config::from_lookup(|key| match key {
        "SENDGRID_USER" => Some("user".to_string()),
        "SENDGRID_KEY" => Some("key".to_string()),
        _ => None,
    });

    match result {
        Err(ConfigError::Missing(key)) => assert_eq!(key, "DEFAULT_CONNECTION"),
        other => panic!("expected missing connection string, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_unreachable_database_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}/missing/dir/app.db?mode=rwc",
        dir.path().display()
    );
    let startup = Startup::new(test_config(&[("DEFAULT_CONNECTION", url.as_str())]));

    let result = startup
        .configure_services_with(Arc::new(RecordingEmailSender::default()))
        .await;

    assert!(matches!(result, Err(StartupError::Database(_))));
}

#[tokio::test]
async fn test_lifespan_overrides_reach_the_providers() {
    let config = test_config(&[
        ("EMAIL_CONFIRMATION_TOKEN_LIFESPAN_HOURS", "12"),
        ("PASSWORD_RESET_TOKEN_LIFESPAN_HOURS", "1"),
    ]);
    assert_eq!(config.email_confirmation_token_lifespan, Some(Duration::hours(12)));
    assert_eq!(config.password_reset_token_lifespan, Some(Duration::hours(1)));

    let state = Startup::new(config)
        .configure_services_with(Arc::new(RecordingEmailSender::default()))
        .await
        .expect("services configured");

    assert_eq!(
        state.user_manager.email_confirmation_provider().token_lifespan(),
        Duration::hours(12)
    );
    assert_eq!(
        state.user_manager.password_reset_provider().token_lifespan(),
        Duration::hours(1)
    );
}

#[tokio::test]
async fn test_providers_keep_default_lifespans() {
    let state = Startup::new(test_config(&[]))
        .configure_services_with(Arc::new(RecordingEmailSender::default()))
        .await
        .expect("services configured");

    assert_eq!(
        state.user_manager.email_confirmation_provider().token_lifespan(),
        Duration::hours(4)
    );
    assert_eq!(
        state.user_manager.password_reset_provider().token_lifespan(),
        Duration::hours(3)
    );
}
