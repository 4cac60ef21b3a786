//! Port for minting and verifying signed access tokens.
use crate::domain::{IssuedToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Failures raised while issuing or verifying tokens.
    pub enum TokenIssuerError {
        /// Signature, encoding or claim shape is wrong.
        Invalid { message: String } => "token rejected: {message}",
        /// Token was well formed but its expiry has passed.
        Expired => "token expired",
        /// Token could not be signed.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Claims recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Id of the user the token was issued to.
    pub user_id: UserId,
    /// Username at issue time.
    pub username: String,
}

/// Token minting and verification.
///
/// Expiry is judged against the issuer's own clock.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    /// Mint a token for `user_id`.
    fn issue(&self, user_id: UserId, username: &str) -> Result<IssuedToken, TokenIssuerError>;

    /// Check signature and expiry and return the embedded claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenIssuerError>;
}
