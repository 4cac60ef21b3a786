//! HS256 JWT `TokenIssuer`.
//!
//! Tokens carry `sub` (username), `uid` (numeric user id), `iat` and `exp`.
//! Expiry is checked against the injected clock rather than the library's
//! wall-clock check so tests can move time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenClaims, TokenIssuer, TokenIssuerError};
use crate::domain::{IssuedToken, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    uid: i64,
    iat: i64,
    exp: i64,
}

/// Signs and verifies access tokens with a shared secret.
pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    /// Build an issuer for `secret` whose tokens live for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `TokenIssuerError::Signing` when `ttl` is out of range.
    pub fn new(
        secret: &[u8],
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenIssuerError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|err| TokenIssuerError::signing(format!("token ttl out of range: {err}")))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            clock,
        })
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user_id: UserId, username: &str) -> Result<IssuedToken, TokenIssuerError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.ttl;
        let claims = AccessClaims {
            sub: username.to_owned(),
            uid: user_id.get(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenIssuerError::signing(err.to_string()))?;
        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenIssuerError> {
        let data = decode::<AccessClaims>(token, &self.decoding, &Self::validation())
            .map_err(|err| TokenIssuerError::invalid(err.to_string()))?;
        let claims = data.claims;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenIssuerError::invalid("exp out of range"))?;
        if expires_at <= self.clock.utc() {
            return Err(TokenIssuerError::expired());
        }
        let user_id =
            UserId::new(claims.uid).map_err(|err| TokenIssuerError::invalid(err.to_string()))?;
        Ok(TokenClaims {
            user_id,
            username: claims.sub,
        })
    }
}
