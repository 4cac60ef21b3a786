//! Service settings loaded via OrthoConfig.
//!
//! Each binary owns one settings struct. Values come from CLI flags,
//! environment variables (`USERS_SERVICE_*`, `DELIVERY_SERVICE_*`) and config
//! files; absent values fall back to the defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::outbound::authority::{SubjectFallback, SubjectField};

const DEFAULT_USERS_BIND_ADDR: &str = "0.0.0.0:8082";
const DEFAULT_DELIVERY_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_AUTHORITY_URL: &str = "http://users-service:8082";
const DEFAULT_AUTHORITY_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_TOKEN_TTL_SECONDS: u64 = 1_800;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A value is present but unusable.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Setting name.
        field: &'static str,
        /// Parser complaint.
        message: String,
    },

    /// A required value is absent.
    #[error("{field} must be set")]
    Missing {
        /// Setting name.
        field: &'static str,
    },
}

impl SettingsError {
    fn invalid(field: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            field,
            message: message.to_string(),
        }
    }
}

fn parse_bind_addr(raw: Option<&str>, default: &str) -> Result<SocketAddr, SettingsError> {
    raw.unwrap_or(default)
        .trim()
        .parse()
        .map_err(|err| SettingsError::invalid("bind_addr", err))
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

/// Settings for the users service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USERS_SERVICE")]
pub struct UsersServiceSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory repository is used when absent.
    pub database_url: Option<String>,
    /// Redis URL; the in-memory cache is used when absent.
    pub redis_url: Option<String>,
    /// Lifetime of cached user entries.
    pub cache_ttl_seconds: Option<u64>,
    /// HS256 signing secret for access tokens.
    pub token_secret: Option<String>,
    /// Lifetime of issued access tokens.
    pub token_ttl_seconds: Option<u64>,
}

impl UsersServiceSettings {
    /// Address to bind, defaulting to `0.0.0.0:8082`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        parse_bind_addr(self.bind_addr.as_deref(), DEFAULT_USERS_BIND_ADDR)
    }

    /// PostgreSQL URL; `None` selects the in-memory repository.
    pub fn database_url(&self) -> Option<&str> {
        non_empty(self.database_url.as_deref())
    }

    /// Redis URL; `None` selects the in-process cache.
    pub fn redis_url(&self) -> Option<&str> {
        non_empty(self.redis_url.as_deref())
    }

    /// Lifetime of cached user entries; 300 s unless configured.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Lifetime of issued tokens; 1800 s unless configured.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds.unwrap_or(DEFAULT_TOKEN_TTL_SECONDS))
    }

    /// Token signing secret.
    ///
    /// Debug builds fall back to a random per-process secret, so tokens do
    /// not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Missing` in release builds when no secret is
    /// configured.
    pub fn token_secret(&self) -> Result<String, SettingsError> {
        if let Some(secret) = non_empty(self.token_secret.as_deref()) {
            return Ok(secret.to_owned());
        }
        if cfg!(debug_assertions) {
            warn!("using temporary token secret (dev only)");
            return Ok(format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()));
        }
        Err(SettingsError::Missing {
            field: "token_secret",
        })
    }
}

/// Settings for the delivery service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DELIVERY_SERVICE")]
pub struct DeliveryServiceSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory repository is used when absent.
    pub database_url: Option<String>,
    /// Root URL of the token authority.
    pub authority_url: Option<String>,
    /// Upper bound on one authority round trip.
    pub authority_timeout_ms: Option<u64>,
    /// `username` or `user_id`.
    pub subject_field: Option<String>,
    /// `strict` or `echo_token`.
    pub subject_fallback: Option<String>,
}

impl DeliveryServiceSettings {
    /// Address to bind, defaulting to `0.0.0.0:8081`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        parse_bind_addr(self.bind_addr.as_deref(), DEFAULT_DELIVERY_BIND_ADDR)
    }

    /// PostgreSQL URL; `None` selects the in-memory repository.
    pub fn database_url(&self) -> Option<&str> {
        non_empty(self.database_url.as_deref())
    }

    /// Authority root URL.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` when the URL does not parse.
    pub fn authority_url(&self) -> Result<Url, SettingsError> {
        let raw = non_empty(self.authority_url.as_deref()).unwrap_or(DEFAULT_AUTHORITY_URL);
        Url::parse(raw).map_err(|err| SettingsError::invalid("authority_url", err))
    }

    /// Budget for one validation call; 2000 ms unless configured.
    pub fn authority_timeout(&self) -> Duration {
        Duration::from_millis(
            self.authority_timeout_ms
                .unwrap_or(DEFAULT_AUTHORITY_TIMEOUT_MS),
        )
    }

    /// Which field of the authority's answer becomes the subject.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` for unknown field names.
    pub fn subject_field(&self) -> Result<SubjectField, SettingsError> {
        non_empty(self.subject_field.as_deref())
            .map_or(Ok(SubjectField::default()), str::parse)
            .map_err(|err| SettingsError::invalid("subject_field", err))
    }

    /// What to do with a 200 answer that names no usable subject.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` for unknown policy names.
    pub fn subject_fallback(&self) -> Result<SubjectFallback, SettingsError> {
        non_empty(self.subject_fallback.as_deref())
            .map_or(Ok(SubjectFallback::default()), str::parse)
            .map_err(|err| SettingsError::invalid("subject_fallback", err))
    }
}
