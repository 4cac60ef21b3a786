//! Server construction for the users and delivery binaries.
//!
//! Each service resolves its adapters from settings, builds the actix `App`
//! and serves it on a caller-supplied listener so tests can bind an
//! ephemeral port.

mod config;
mod delivery;
mod telemetry;
mod users;

pub use config::{DeliveryServiceSettings, SettingsError, UsersServiceSettings};
pub use delivery::create_delivery_server;
pub use telemetry::init_tracing;
pub use users::create_users_server;

use tracing::info;

use crate::domain::ports::{CacheStoreError, TokenIssuerError};
use crate::outbound::persistence::{DbPool, PoolConfig, PoolError, run_pending_migrations};

/// Failures that stop a service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration could not be interpreted.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Migrations or pool construction failed.
    #[error("database setup failed: {0}")]
    Database(#[from] PoolError),

    /// Redis pool could not be built.
    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheStoreError),

    /// The signing key was rejected.
    #[error("token issuer setup failed: {0}")]
    TokenIssuer(#[from] TokenIssuerError),

    /// The HTTP client for the authority could not be built.
    #[error("authority client setup failed: {0}")]
    AuthorityClient(#[from] reqwest::Error),

    /// Binding or spawning the HTTP server failed.
    #[error("server setup failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StartupError> for std::io::Error {
    fn from(value: StartupError) -> Self {
        match value {
            StartupError::Io(err) => err,
            other => std::io::Error::other(other.to_string()),
        }
    }
}

/// Apply migrations, then open the shared pool.
async fn connect_database(database_url: &str) -> Result<DbPool, PoolError> {
    run_pending_migrations(database_url).await?;
    let pool = DbPool::new(PoolConfig::new(database_url)).await?;
    info!("connected to PostgreSQL");
    Ok(pool)
}
