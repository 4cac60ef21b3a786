//! Driving port for login and token resolution use-cases.
//!
//! Inbound adapters call this to exchange credentials for a token and to turn
//! a presented token back into the account it names, without knowing which
//! hashing or signing scheme backs it.

use async_trait::async_trait;

use crate::domain::{BearerToken, Error, IssuedToken, LoginCredentials, User};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify credentials and mint an access token.
    async fn issue_token(&self, credentials: &LoginCredentials) -> Result<IssuedToken, Error>;

    /// Verify a token and return the account it names.
    ///
    /// Fails with `Unauthorized` when the token is invalid, expired, or names
    /// an account that no longer exists.
    async fn resolve_token(&self, token: &BearerToken) -> Result<User, Error>;
}
