//! Port abstraction for durable user storage and its errors.
use async_trait::async_trait;

use crate::domain::{Email, PageRequest, User, UserChanges, UserFilter, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique column (`username` or `email`) already holds the value.
        Conflict { field: String } => "user repository uniqueness violation on {field}",
    }
}

/// Insert payload carrying an already-hashed password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistration {
    /// Unique login name.
    pub username: Username,
    /// Unique contact address.
    pub email: Email,
    /// PHC-formatted password hash.
    pub password_hash: String,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Age in years, if given.
    pub age: Option<i32>,
}

/// Stored credential material looked up at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// The account the credentials belong to.
    pub user: User,
    /// PHC-formatted password hash to verify against.
    pub password_hash: String,
}

/// Durable user store.
///
/// Mutations are atomic: a uniqueness violation leaves the store unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user, returning the stored record with its assigned id.
    async fn insert(&self, registration: &UserRegistration) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch users matching `filter`, ordered by id, within `page`.
    async fn find_many(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Vec<User>, UserPersistenceError>;

    /// Apply `changes` in one transaction; `None` when the id is unknown.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Remove a user, returning the pre-delete snapshot; `None` when absent.
    async fn delete(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Look up credential material by username.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;
}
