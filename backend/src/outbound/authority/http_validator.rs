//! Reqwest-backed `TokenValidator` that asks the users service.
//!
//! Exactly one `POST {authority}/validate-token` per call, carrying the
//! caller's bearer token and no body. The client timeout bounds the whole
//! exchange. Nothing is retried and nothing is cached.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::dto::ValidatedSubjectDto;
use crate::domain::ports::{AuthError, TokenValidator};
use crate::domain::{BearerToken, Principal, Subject};

const VALIDATE_PATH: &str = "validate-token";

/// Which field of the authority's response names the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectField {
    /// `username`, as a textual subject.
    Username,
    /// `user_id`, as a numeric subject.
    #[default]
    UserId,
}

/// What to do when the authority answers 200 with an unusable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectFallback {
    /// Treat the response as an authority failure.
    #[default]
    Strict,
    /// Use the raw token text as the subject.
    EchoToken,
}

/// Error raised when a policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownPolicy {
    kind: &'static str,
    value: String,
}

impl FromStr for SubjectField {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "username" => Ok(Self::Username),
            "user_id" => Ok(Self::UserId),
            other => Err(UnknownPolicy {
                kind: "subject field",
                value: other.to_owned(),
            }),
        }
    }
}

impl FromStr for SubjectFallback {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "strict" => Ok(Self::Strict),
            "echo_token" => Ok(Self::EchoToken),
            other => Err(UnknownPolicy {
                kind: "subject fallback",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SubjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Username => "username",
            Self::UserId => "user_id",
        })
    }
}

/// Token validator that delegates to a remote authority over HTTP.
pub struct HttpTokenValidator {
    client: Client,
    endpoint: Url,
    subject_field: SubjectField,
    fallback: SubjectFallback,
}

impl HttpTokenValidator {
    /// Build a validator for the authority rooted at `authority`.
    ///
    /// Redirects are not followed; a 3xx answer counts as a rejection.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        authority: &Url,
        timeout: Duration,
        subject_field: SubjectField,
        fallback: SubjectFallback,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: validate_endpoint(authority),
            subject_field,
            fallback,
        })
    }

    /// Fully resolved validation endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn resolve_body(&self, body: &[u8], token: &BearerToken) -> Result<Principal, AuthError> {
        match parse_subject(body, self.subject_field) {
            Ok(subject) => Ok(Principal::new(subject)),
            Err(reason) => match self.fallback {
                SubjectFallback::Strict => {
                    warn!(%reason, field = %self.subject_field, "authority returned unusable body");
                    Err(AuthError::authority_unavailable(reason))
                }
                SubjectFallback::EchoToken => {
                    warn!(%reason, "authority body unusable; echoing token as subject");
                    Ok(Principal::new(Subject::Username(token.as_str().to_owned())))
                }
            },
        }
    }
}

/// Append `validate-token` to the authority root, keeping any base path.
fn validate_endpoint(authority: &Url) -> Url {
    let mut endpoint = authority.clone();
    let base = endpoint.path().trim_end_matches('/').to_owned();
    endpoint.set_path(&format!("{base}/{VALIDATE_PATH}"));
    endpoint.set_query(None);
    endpoint
}

fn parse_subject(body: &[u8], field: SubjectField) -> Result<Subject, String> {
    let decoded: ValidatedSubjectDto = serde_json::from_slice(body)
        .map_err(|err| format!("invalid validation payload: {err}"))?;
    decoded
        .into_subject(field)
        .ok_or_else(|| format!("validation payload is missing `{field}`"))
}

fn map_transport_error(error: reqwest::Error) -> AuthError {
    if error.is_timeout() {
        warn!(%error, "authority call timed out");
        return AuthError::authority_unavailable(format!("authority timed out: {error}"));
    }
    warn!(%error, "authority call failed");
    AuthError::authority_unavailable(format!("authority transport error: {error}"))
}

fn map_status(status: StatusCode) -> AuthError {
    debug!(status = status.as_u16(), "authority rejected token");
    AuthError::invalid_credentials()
}

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn validate(&self, token: &BearerToken) -> Result<Principal, AuthError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status));
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        self.resolve_body(body.as_ref(), token)
    }
}
