//! Short-lived verification codes bound to a user, a purpose, and the user's
//! current security stamp.
//!
//! A token is `base64url(payload) "." base64url(mac)` where the payload is
//! `issued_at|user_id|security_stamp|purpose` and the MAC is HMAC-SHA256 under
//! a key derived from the process data-protection key and the provider name.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::domain::User;

type HmacSha256 = Hmac<Sha256>;

/// Generates and validates verification codes for one kind of flow
pub trait UserTokenProvider: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, purpose: &str, user: &User) -> String;

    fn validate(&self, purpose: &str, token: &str, user: &User) -> bool;

    /// How long a generated token stays valid
    fn token_lifespan(&self) -> Duration;
}

/// Root secret every token provider derives its own key from
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataProtectionKey {
    bytes: Vec<u8>,
}

impl DataProtectionKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Random key for this process only; tokens die with the process
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    fn derive(&self, purpose: &str) -> Zeroizing<[u8; 32]> {
        let hk = Hkdf::<Sha256>::new(None, &self.bytes);
        let mut okm = Zeroizing::new([0u8; 32]);
        // 32 bytes is always within the HKDF-SHA256 output limit
        hk.expand(purpose.as_bytes(), &mut okm[..]).unwrap_or_default();
        okm
    }

    pub(crate) fn derive_session_secret(&self) -> Zeroizing<[u8; 32]> {
        self.derive("session")
    }
}

impl std::fmt::Debug for DataProtectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataProtectionKey([REDACTED])")
    }
}

#[derive(Clone, Debug)]
pub struct DataProtectionTokenProviderOptions {
    pub name: String,
    pub token_lifespan: Duration,
}

impl Default for DataProtectionTokenProviderOptions {
    fn default() -> Self {
        Self {
            name: super::options::DEFAULT_TOKEN_PROVIDER.to_string(),
            token_lifespan: Duration::days(1),
        }
    }
}

#[derive(Debug)]
struct TokenPayload {
    issued_at: i64,
    user_id: String,
    security_stamp: String,
    purpose: String,
}

/// Stateless HMAC-protected token provider
pub struct DataProtectorTokenProvider {
    options: DataProtectionTokenProviderOptions,
    key: Zeroizing<[u8; 32]>,
}

impl DataProtectorTokenProvider {
    pub fn new(key: &DataProtectionKey, options: DataProtectionTokenProviderOptions) -> Self {
        let derived = key.derive(&format!("token-provider:{}", options.name));
        Self {
            options,
            key: derived,
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        <HmacSha256 as Mac>::new_from_slice(&self.key[..])
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"))
    }

    /// Generates a token as if issued at `issued_at`
    pub fn generate_at(&self, purpose: &str, user: &User, issued_at: DateTime<Utc>) -> String {
        let payload = format!(
            "{}|{}|{}|{}",
            issued_at.timestamp(),
            user.id,
            user.security_stamp,
            purpose
        );

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let tag = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(tag)
        )
    }

    /// Validates a token against the clock reading `now`
    pub fn validate_at(&self, purpose: &str, token: &str, user: &User, now: DateTime<Utc>) -> bool {
        let Some(payload) = self.unprotect(token) else {
            tracing::debug!(provider = %self.options.name, "Token failed integrity check");
            return false;
        };

        let expires_at = payload.issued_at + self.options.token_lifespan.num_seconds();
        if now.timestamp() > expires_at {
            tracing::debug!(provider = %self.options.name, "Token expired");
            return false;
        }
        if payload.user_id != user.id || payload.purpose != purpose {
            tracing::debug!(provider = %self.options.name, "Token issued for another user or purpose");
            return false;
        }
        if payload.security_stamp != user.security_stamp {
            tracing::debug!(provider = %self.options.name, "Security stamp changed since token was issued");
            return false;
        }

        true
    }

    fn unprotect(&self, token: &str) -> Option<TokenPayload> {
        let (encoded_payload, encoded_tag) = token.trim().split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(encoded_payload).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(encoded_tag).ok()?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;

        let payload = String::from_utf8(payload).ok()?;
        let mut parts = payload.splitn(4, '|');
        let issued_at = parts.next()?.parse().ok()?;
        let user_id = parts.next()?.to_string();
        let security_stamp = parts.next()?.to_string();
        let purpose = parts.next()?.to_string();

        Some(TokenPayload {
            issued_at,
            user_id,
            security_stamp,
            purpose,
        })
    }
}

impl UserTokenProvider for DataProtectorTokenProvider {
    fn name(&self) -> &str {
        &self.options.name
    }

    fn generate(&self, purpose: &str, user: &User) -> String {
        self.generate_at(purpose, user, Utc::now())
    }

    fn validate(&self, purpose: &str, token: &str, user: &User) -> bool {
        self.validate_at(purpose, token, user, Utc::now())
    }

    fn token_lifespan(&self) -> Duration {
        self.options.token_lifespan
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn user(id: &str, stamp: &str) -> User {
        User {
            id: id.to_string(),
            user_name: "joe@contoso.com".to_string(),
            email: "joe@contoso.com".to_string(),
            email_confirmed: false,
            password_hash: String::new(),
            security_stamp: stamp.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn provider(name: &str) -> DataProtectorTokenProvider {
        DataProtectorTokenProvider::new(
            &DataProtectionKey::new(b"0123456789abcdef0123456789abcdef".to_vec()),
            DataProtectionTokenProviderOptions {
                name: name.to_string(),
                token_lifespan: Duration::hours(3),
            },
        )
    }

    #[test]
    fn fresh_token_validates() {
        let p = provider("Default");
        let u = user("u1", "stamp-1");
        let token = p.generate("ResetPassword", &u);
        assert!(p.validate("ResetPassword", &token, &u));
    }

    #[test]
    fn wrong_purpose_or_user_is_rejected() {
        let p = provider("Default");
        let u = user("u1", "stamp-1");
        let token = p.generate("ResetPassword", &u);

        assert!(!p.validate("EmailConfirmation:JOE@CONTOSO.COM", &token, &u));
        assert!(!p.validate("ResetPassword", &token, &user("u2", "stamp-1")));
    }

    #[test]
    fn rotated_security_stamp_invalidates_token() {
        let p = provider("Default");
        let token = p.generate("ResetPassword", &user("u1", "stamp-1"));
        assert!(!p.validate("ResetPassword", &token, &user("u1", "stamp-2")));
    }

    #[test]
    fn expiry_is_enforced() {
        let p = provider("Default");
        let u = user("u1", "stamp-1");
        let issued = Utc::now() - Duration::hours(4);
        let token = p.generate_at("ResetPassword", &u, issued);

        assert!(!p.validate("ResetPassword", &token, &u));
        assert!(p.validate_at("ResetPassword", &token, &u, issued + Duration::hours(2)));
    }

    #[test]
    fn tampered_or_garbage_tokens_are_rejected() {
        let p = provider("Default");
        let u = user("u1", "stamp-1");
        let token = p.generate("ResetPassword", &u);

        let (payload, tag) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            format!("{}|u1|stamp-1|ResetPassword", Utc::now().timestamp() + 86_400).as_bytes(),
        );
        assert!(!p.validate("ResetPassword", &format!("{}.{}", forged_payload, tag), &u));
        assert!(!p.validate("ResetPassword", payload, &u));
        assert!(!p.validate("ResetPassword", "not a token", &u));
        assert!(!p.validate("ResetPassword", "", &u));
    }

    #[test]
    fn providers_with_different_names_do_not_share_keys() {
        let u = user("u1", "stamp-1");
        let token = provider("CustomPasswordReset").generate("ResetPassword", &u);
        assert!(!provider("Default").validate("ResetPassword", &token, &u));
    }
}
