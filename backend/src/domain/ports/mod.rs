//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`CacheStore`, `UserRepository`, `DeliveryRepository`,
//! `TokenValidator`, `TokenIssuer`, `PasswordHasher`) are implemented by
//! outbound adapters. Driving ports (`LoginService`, `UserDirectory`,
//! `DeliveryService`) are implemented by domain services and called by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod cache_store;
mod delivery_repository;
mod delivery_service;
mod login_service;
mod password_hasher;
mod token_issuer;
mod token_validator;
mod user_directory;
mod user_repository;

pub use cache_key::{CacheKey, CacheKeyValidationError, USER_GET_PREFIX, USER_LIST_PREFIX};
pub use cache_store::{CacheStore, CacheStoreError};
#[cfg(test)]
pub use delivery_repository::MockDeliveryRepository;
pub use delivery_repository::{DeliveryPersistenceError, DeliveryRepository};
pub use delivery_service::DeliveryService;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use token_issuer::MockTokenIssuer;
pub use token_issuer::{TokenClaims, TokenIssuer, TokenIssuerError};
#[cfg(test)]
pub use token_validator::MockTokenValidator;
pub use token_validator::{AuthError, TokenValidator};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    StoredCredentials, UserPersistenceError, UserRegistration, UserRepository,
};
