use std::env;
use std::fmt;
use std::path::PathBuf;

use chrono::Duration;
use secrecy::SecretString;

use crate::email::AuthMessageSenderOptions;

/// Connection string entry the persistence context is built from
pub const DEFAULT_CONNECTION: &str = "DEFAULT_CONNECTION";

const DEFAULT_SENDGRID_API_URL: &str = "https://api.sendgrid.com";
const DEFAULT_FROM_ADDRESS: &str = "no-reply@localhost";
const MIN_DATA_PROTECTION_KEY_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" => Some(Environment::Production),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "Development"),
            Environment::Staging => write!(f, "Staging"),
            Environment::Production => write!(f, "Production"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A required key is absent or empty
    Missing(&'static str),
    /// A key is present but cannot be parsed
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required configuration key {}", key),
            ConfigError::Invalid { key, reason } => {
                write!(f, "Invalid value for configuration key {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub default_connection: String,
    pub port: u16,
    pub https_port: Option<u16>,
    pub static_dir: PathBuf,
    pub public_url: String,
    pub data_protection_key: Option<SecretString>,
    pub email: AuthMessageSenderOptions,
    pub email_confirmation_token_lifespan: Option<Duration>,
    pub password_reset_token_lifespan: Option<Duration>,
    /// Honor `X-Forwarded-Proto` from a TLS-terminating proxy
    pub trust_forwarded_proto: bool,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key source.
    /// Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let environment = match get("APP_ENVIRONMENT") {
            Some(value) => Environment::parse(&value).ok_or_else(|| ConfigError::Invalid {
                key: "APP_ENVIRONMENT",
                reason: format!("unknown environment '{}'", value),
            })?,
            None => Environment::Production,
        };

        let default_connection = require(DEFAULT_CONNECTION)?;

        let email = AuthMessageSenderOptions {
            send_grid_user: require("SENDGRID_USER")?,
            send_grid_key: SecretString::new(require("SENDGRID_KEY")?),
            from_address: get("SENDGRID_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            api_url: get("SENDGRID_API_URL")
                .unwrap_or_else(|| DEFAULT_SENDGRID_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        let port = parse_opt::<u16>(get("PORT"), "PORT")?.unwrap_or(8000);
        let https_port = parse_opt::<u16>(get("HTTPS_PORT"), "HTTPS_PORT")?;

        let data_protection_key = match get("DATA_PROTECTION_KEY") {
            Some(key) if key.len() < MIN_DATA_PROTECTION_KEY_LEN => {
                return Err(ConfigError::Invalid {
                    key: "DATA_PROTECTION_KEY",
                    reason: format!("must be at least {} bytes", MIN_DATA_PROTECTION_KEY_LEN),
                });
            }
            Some(key) => Some(SecretString::new(key)),
            None => None,
        };

        Ok(Self {
            environment,
            default_connection,
            port,
            https_port,
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("wwwroot")),
            public_url: get("PUBLIC_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),
            data_protection_key,
            email,
            email_confirmation_token_lifespan: parse_lifespan(
                get("EMAIL_CONFIRMATION_TOKEN_LIFESPAN_HOURS"),
                "EMAIL_CONFIRMATION_TOKEN_LIFESPAN_HOURS",
            )?,
            password_reset_token_lifespan: parse_lifespan(
                get("PASSWORD_RESET_TOKEN_LIFESPAN_HOURS"),
                "PASSWORD_RESET_TOKEN_LIFESPAN_HOURS",
            )?,
            trust_forwarded_proto: parse_flag(get("TRUST_FORWARDED_PROTO"), "TRUST_FORWARDED_PROTO")?,
            hsts_include_subdomains: parse_flag(
                get("HSTS_INCLUDE_SUBDOMAINS"),
                "HSTS_INCLUDE_SUBDOMAINS",
            )?,
            hsts_preload: parse_flag(get("HSTS_PRELOAD"), "HSTS_PRELOAD")?,
        })
    }
}

fn parse_opt<T>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_lifespan(
    value: Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(hours) = parse_opt::<i64>(value, key)? else {
        return Ok(None);
    };
    if hours <= 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "lifespan must be a positive number of hours".to_string(),
        });
    }
    Duration::try_hours(hours)
        .map(Some)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            reason: format!("{} hours is out of range", hours),
        })
}

fn parse_flag(value: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                reason: format!("expected true or false, got '{}'", v),
            }),
        },
    }
}
