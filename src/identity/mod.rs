//! Identity layer - accounts, sign-in, and verification tokens
//!
//! - Options and named token-provider slots (options)
//! - Password hashing and policy (password)
//! - Token providers (tokens, custom_tokens)
//! - Account and sign-in managers (user_manager, sign_in)
//! - Session tokens for authenticated requests (session)
//! - Wiring of all of the above (builder)

pub mod builder;
pub mod custom_tokens;
pub mod options;
pub mod password;
pub mod session;
pub mod sign_in;
pub mod tokens;
pub mod user_manager;

pub use builder::{Identity, IdentityBuilder, IdentityError};
pub use custom_tokens::{
    CustomEmailConfirmationTokenProvider, CustomPasswordResetTokenProvider,
    CUSTOM_EMAIL_CONFIRMATION, CUSTOM_PASSWORD_RESET,
};
pub use options::{IdentityOptions, DEFAULT_TOKEN_PROVIDER};
pub use session::{Claims, SessionIssuer, SESSION_COOKIE};
pub use sign_in::{SignInManager, SignInResult};
pub use tokens::{DataProtectionKey, UserTokenProvider};
pub use user_manager::UserManager;
