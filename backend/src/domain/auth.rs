//! Authentication primitives: login credentials, bearer tokens and principals.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` must be non-empty and retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use courier::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("admin", "password").unwrap();
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Error raised when a bearer token is blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bearer token must not be empty")]
pub struct EmptyBearerToken;

/// Opaque bearer token presented by a caller.
///
/// Consumers never inspect or cache the token; they forward it to the
/// authority on every request. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wrap a raw token, rejecting blank input.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::BearerToken;
    ///
    /// let token = BearerToken::new("abc.def.ghi").unwrap();
    /// assert_eq!(token.as_str(), "abc.def.ghi");
    /// assert!(BearerToken::new("  ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyBearerToken> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyBearerToken);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Borrow the raw token text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Identity named by a validated token.
///
/// Deployments disagree on whether the authority's username or numeric id is
/// the subject, so both shapes are representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// Subject is the account's username.
    Username(String),
    /// Subject is the account's numeric identifier.
    UserId(i64),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(name) => f.write_str(name),
            Self::UserId(id) => write!(f, "{id}"),
        }
    }
}

/// Authenticated identity resolved once per request.
///
/// # Examples
/// ```
/// use courier::domain::{Principal, Subject};
///
/// let principal = Principal::new(Subject::UserId(7));
/// assert_eq!(principal.owner(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: Subject,
}

impl Principal {
    /// Build a principal around a subject.
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    /// Subject named by the token.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Textual owner stamp recorded against records this principal creates.
    pub fn owner(&self) -> String {
        self.subject.to_string()
    }
}

/// Access token minted by the users service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded token handed to the client.
    pub access_token: String,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
}
