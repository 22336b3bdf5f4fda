use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::tokens::DataProtectionKey;
use crate::domain::{DomainError, User};

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "identity";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub stamp: String,
    pub exp: usize,
}

/// Issues and validates the bearer/cookie session tokens
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl SessionIssuer {
    pub fn new(key: &DataProtectionKey) -> Self {
        let secret = key.derive_session_secret();
        Self {
            encoding: EncodingKey::from_secret(&secret[..]),
            decoding: DecodingKey::from_secret(&secret[..]),
            lifetime: Duration::days(14),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, user: &User) -> Result<String, DomainError> {
        let expiration = Utc::now()
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| DomainError::Internal("Session expiry overflow".to_string()))?
            .timestamp();

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            stamp: user.security_stamp.clone(),
            exp: expiration as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| tracing::debug!("Rejected session token: {}", e))
            .ok()
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
