use serial_test::serial;

use webpwrecover::config::{Config, ConfigError, Environment};

const KEYS: [&str; 5] = [
    "DEFAULT_CONNECTION",
    "SENDGRID_USER",
    "SENDGRID_KEY",
    "APP_ENVIRONMENT",
    "HTTPS_PORT",
];

fn clear() {
    for key in KEYS {
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::remove_var(key) };
    }
}

fn set(key: &str, value: &str) {
    // SAFETY: tests touching the environment are serialized
    unsafe { std::env::set_var(key, value) };
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    clear();
    set("DEFAULT_CONNECTION", "sqlite::memory:");
    set("SENDGRID_USER", "contoso");
    set("SENDGRID_KEY", "SG.key");
    set("APP_ENVIRONMENT", "Development");
    set("HTTPS_PORT", "5001");

    let config = Config::from_env().expect("configuration loads");

    assert_eq!(config.default_connection, "sqlite::memory:");
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.https_port, Some(5001));
    assert_eq!(config.email.send_grid_user, "contoso");
    clear();
}

#[test]
#[serial]
fn test_from_env_requires_email_options() {
    clear();
    set("DEFAULT_CONNECTION", "sqlite::memory:");

    let err = Config::from_env().unwrap_err();

    assert!(matches!(err, ConfigError::Missing("SENDGRID_USER")));
    clear();
}
