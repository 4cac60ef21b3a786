//! Port for turning a bearer token into an authenticated principal.
//!
//! The delivery service implements this by asking the users service over
//! HTTP; the users service implements it in-process. Either way the result is
//! never cached: every request revalidates.

use async_trait::async_trait;

use crate::domain::{BearerToken, Error, Principal};

use super::define_port_error;

define_port_error! {
    /// Authentication failures, in the order a request can hit them.
    pub enum AuthError {
        /// No usable `Authorization: Bearer` header was presented.
        Unauthenticated => "not authenticated",
        /// The authority rejected the token.
        InvalidCredentials => "invalid authentication credentials",
        /// The authority could not be reached or answered unusably.
        AuthorityUnavailable { message: String } => "authentication service unavailable: {message}",
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Unauthenticated => Error::unauthorized("Not authenticated"),
            AuthError::InvalidCredentials => {
                Error::unauthorized("Invalid authentication credentials")
            }
            AuthError::AuthorityUnavailable { .. } => {
                Error::service_unavailable("Authentication service unavailable")
            }
        }
    }
}

/// Resolve a bearer token to a principal.
///
/// Implementations perform at most one authority round trip per call and
/// never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Resolve `token`, or say why it cannot be resolved.
    async fn validate(&self, token: &BearerToken) -> Result<Principal, AuthError>;
}
